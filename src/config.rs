//! Service Configuration
//!
//! Runtime configuration for the strength service. Values come from an
//! optional JSON file and are then overridden by command-line flags.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use crate::metrics::MetricsConfig;

/// Default listen address
pub const DEFAULT_BIND: &str = "127.0.0.1:5000";

/// Default model artifact location
pub const DEFAULT_MODEL_PATH: &str = "model/model.json";

/// Service configuration
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceConfig {
    /// Address the HTTP listener binds to
    pub bind: SocketAddr,
    /// Path to the forest artifact
    pub model_path: PathBuf,
    /// Maximum accepted request body size in bytes
    pub max_body_size: usize,
    /// Metrics configuration
    pub metrics: MetricsConfig,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            model_path: PathBuf::from(DEFAULT_MODEL_PATH),
            max_body_size: default_max_body(),
            metrics: MetricsConfig::default(),
        }
    }
}

impl ServiceConfig {
    /// Load a JSON configuration file
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        Self::from_json(&raw).with_context(|| format!("invalid config file {}", path.display()))
    }

    /// Parse a JSON configuration document
    pub fn from_json(raw: &str) -> Result<Self> {
        let json: ServiceConfigJson = serde_json::from_str(raw)?;
        Ok(json.into())
    }
}

/// JSON representation of [`ServiceConfig`]
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ServiceConfigJson {
    #[serde(default = "default_bind")]
    pub bind: SocketAddr,
    #[serde(default = "default_model_path")]
    pub model_path: PathBuf,
    #[serde(default = "default_max_body")]
    pub max_body_size: usize,
    #[serde(default)]
    pub metrics: Option<MetricsConfig>,
}

fn default_bind() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 5000))
}

fn default_model_path() -> PathBuf {
    PathBuf::from(DEFAULT_MODEL_PATH)
}

fn default_max_body() -> usize {
    16 * 1024
}

impl From<ServiceConfigJson> for ServiceConfig {
    fn from(json: ServiceConfigJson) -> Self {
        Self {
            bind: json.bind,
            model_path: json.model_path,
            max_body_size: json.max_body_size,
            metrics: json.metrics.unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = ServiceConfig::default();
        assert_eq!(config.bind.to_string(), DEFAULT_BIND);
        assert_eq!(config.model_path, PathBuf::from("model/model.json"));
        assert_eq!(config.max_body_size, 16 * 1024);
        assert!(config.metrics.enabled);
    }

    #[test]
    fn test_empty_json_uses_defaults() {
        let config = ServiceConfig::from_json("{}").unwrap();
        assert_eq!(config, ServiceConfig::default());
    }

    #[test]
    fn test_json_overrides() {
        let config = ServiceConfig::from_json(
            r#"{
                "bind": "0.0.0.0:8080",
                "model-path": "/srv/models/forest.json",
                "max-body-size": 1024,
                "metrics": { "latency-histograms": false }
            }"#,
        )
        .unwrap();

        assert_eq!(config.bind.port(), 8080);
        assert_eq!(config.model_path, PathBuf::from("/srv/models/forest.json"));
        assert_eq!(config.max_body_size, 1024);
        assert!(config.metrics.enabled);
        assert!(!config.metrics.latency_histograms);
        assert!(!config.metrics.histogram_buckets.is_empty());
    }

    #[test]
    fn test_invalid_bind_rejected() {
        assert!(ServiceConfig::from_json(r#"{ "bind": "not-an-address" }"#).is_err());
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(br#"{ "bind": "127.0.0.1:9000" }"#).unwrap();

        let config = ServiceConfig::from_file(file.path()).unwrap();
        assert_eq!(config.bind.port(), 9000);
    }

    #[test]
    fn test_missing_file_has_context() {
        let err = ServiceConfig::from_file(Path::new("/nonexistent/pwstrength.json")).unwrap_err();
        assert!(err.to_string().contains("failed to read config file"));
    }
}
