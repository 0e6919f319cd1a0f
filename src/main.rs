//! Zentinel Password Strength CLI
//!
//! Starts the HTTP password strength service.

use anyhow::{Context, Result};
use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing::{error, info};

use zentinel_password_strength::server::{self, AppState};
use zentinel_password_strength::{
    FeatureExtractor, ModelHandle, ServiceConfig, StrengthEngine, StrengthMetrics,
};

/// Version information
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Command line arguments
#[derive(Parser, Debug)]
#[command(name = "zentinel-password-strength")]
#[command(about = "Password strength classification service")]
struct Args {
    /// JSON configuration file
    #[arg(short, long, env = "PWSTRENGTH_CONFIG")]
    config: Option<PathBuf>,

    /// Listen address (default 127.0.0.1:5000)
    #[arg(long, env = "PWSTRENGTH_BIND")]
    bind: Option<SocketAddr>,

    /// Path to the forest artifact (default model/model.json)
    #[arg(long, env = "PWSTRENGTH_MODEL")]
    model: Option<PathBuf>,

    /// Maximum request body size in bytes
    #[arg(long, env = "PWSTRENGTH_MAX_BODY_SIZE")]
    max_body_size: Option<usize>,

    /// Disable metrics collection
    #[arg(long, env = "PWSTRENGTH_NO_METRICS")]
    no_metrics: bool,

    /// Enable verbose logging
    #[arg(short, long, env = "PWSTRENGTH_VERBOSE")]
    verbose: bool,
}

impl Args {
    fn to_config(&self) -> Result<ServiceConfig> {
        let mut config = match &self.config {
            Some(path) => ServiceConfig::from_file(path)?,
            None => ServiceConfig::default(),
        };

        if let Some(bind) = self.bind {
            config.bind = bind;
        }
        if let Some(model) = &self.model {
            config.model_path = model.clone();
        }
        if let Some(max_body_size) = self.max_body_size {
            config.max_body_size = max_body_size;
        }
        if self.no_metrics {
            config.metrics.enabled = false;
        }

        Ok(config)
    }
}

/// Route panics through the JSON log before the default hook runs
fn install_panic_hook() {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let message = info
            .payload()
            .downcast_ref::<&str>()
            .copied()
            .or_else(|| info.payload().downcast_ref::<String>().map(String::as_str))
            .unwrap_or("<non-string payload>");
        let at = info
            .location()
            .map(|l| format!("{}:{}", l.file(), l.line()))
            .unwrap_or_default();

        error!(panic = %message, location = %at, "panic");
        default_hook(info);
    }));
}

/// Resolves on SIGINT or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for SIGINT");
            std::future::pending::<()>().await;
        }
        info!("Received SIGINT, initiating graceful shutdown");
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
                info!("Received SIGTERM, initiating graceful shutdown");
            }
            Err(e) => {
                error!(error = %e, "Failed to register SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    install_panic_hook();

    let args = Args::parse();

    let log_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(format!("{}={}", env!("CARGO_CRATE_NAME"), log_level))
        .json()
        .init();

    info!(version = VERSION, "Starting password strength service");

    let config = args.to_config().context("failed to build configuration")?;

    info!(
        bind = %config.bind,
        model = ?config.model_path,
        max_body_size = config.max_body_size,
        metrics = config.metrics.enabled,
        "Configuration loaded"
    );

    // Load once, before accepting traffic
    let model = ModelHandle::load(&config.model_path);
    let extractor = FeatureExtractor::new();

    info!(
        model_ready = model.is_ready(),
        patterns = extractor.dictionary().pattern_count(),
        "Strength engine initialized"
    );

    let engine = StrengthEngine::new(extractor, model);
    let state = AppState::new(engine, StrengthMetrics::new(config.metrics.clone()));
    let router = server::router(state, config.max_body_size);

    match server::serve(config.bind, router, shutdown_signal()).await {
        Ok(()) => {
            info!("Password strength service shutdown complete");
            Ok(())
        }
        Err(e) => {
            error!(error = %e, "Password strength service error");
            Err(e)
        }
    }
}
