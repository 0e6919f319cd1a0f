//! Service Metrics
//!
//! Request counters, per-label counts and an evaluation latency histogram.
//!
//! `GET /metrics` serves Prometheus text; `GET /metrics?format=json` serves
//! [`StrengthMetrics::json`].

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::label::StrengthLabel;

/// Metrics configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct MetricsConfig {
    /// Enable metrics collection
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Enable latency histograms
    #[serde(default = "default_true")]
    pub latency_histograms: bool,
    /// Histogram bucket boundaries (ms)
    #[serde(default = "default_buckets")]
    pub histogram_buckets: Vec<f64>,
}

fn default_true() -> bool {
    true
}

fn default_buckets() -> Vec<f64> {
    vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            latency_histograms: true,
            histogram_buckets: default_buckets(),
        }
    }
}

/// Outcome of one predict request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestOutcome {
    Classified(StrengthLabel),
    EmptyInput,
    BadRequest,
    ModelUnavailable,
    InvalidClassifierOutput,
}

impl RequestOutcome {
    fn error_type(&self) -> Option<&'static str> {
        match self {
            RequestOutcome::BadRequest => Some("bad_request"),
            RequestOutcome::ModelUnavailable => Some("model_unavailable"),
            RequestOutcome::InvalidClassifierOutput => Some("invalid_classifier_output"),
            _ => None,
        }
    }
}

/// Metrics collector
pub struct StrengthMetrics {
    config: MetricsConfig,

    requests_total: AtomicU64,
    requests_empty: AtomicU64,
    classified_weak: AtomicU64,
    classified_medium: AtomicU64,
    classified_strong: AtomicU64,

    errors_total: AtomicU64,
    errors_by_type: RwLock<HashMap<&'static str, u64>>,

    latency: RwLock<LatencyHistogram>,

    start_time: Instant,
}

impl StrengthMetrics {
    /// Create a new metrics collector
    pub fn new(config: MetricsConfig) -> Self {
        let latency = LatencyHistogram::new(&config.histogram_buckets);
        Self {
            config,
            requests_total: AtomicU64::new(0),
            requests_empty: AtomicU64::new(0),
            classified_weak: AtomicU64::new(0),
            classified_medium: AtomicU64::new(0),
            classified_strong: AtomicU64::new(0),
            errors_total: AtomicU64::new(0),
            errors_by_type: RwLock::new(HashMap::new()),
            latency: RwLock::new(latency),
            start_time: Instant::now(),
        }
    }

    /// Whether collection is enabled
    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    /// Record a request outcome
    pub fn record_request(&self, outcome: RequestOutcome) {
        if !self.config.enabled {
            return;
        }

        self.requests_total.fetch_add(1, Ordering::Relaxed);

        match outcome {
            RequestOutcome::Classified(label) => {
                self.label_counter(label).fetch_add(1, Ordering::Relaxed);
            }
            RequestOutcome::EmptyInput => {
                self.requests_empty.fetch_add(1, Ordering::Relaxed);
            }
            _ => {}
        }

        if let Some(error_type) = outcome.error_type() {
            self.errors_total.fetch_add(1, Ordering::Relaxed);
            *self.errors_by_type.write().entry(error_type).or_insert(0) += 1;
        }
    }

    /// Record evaluation latency
    pub fn record_latency(&self, duration: Duration) {
        if self.config.enabled && self.config.latency_histograms {
            self.latency.write().observe(duration.as_secs_f64() * 1000.0);
        }
    }

    fn label_counter(&self, label: StrengthLabel) -> &AtomicU64 {
        match label {
            StrengthLabel::Weak => &self.classified_weak,
            StrengthLabel::Medium => &self.classified_medium,
            StrengthLabel::Strong => &self.classified_strong,
        }
    }

    /// Get uptime in seconds
    pub fn uptime_secs(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    /// Export metrics in Prometheus text format
    pub fn prometheus(&self) -> String {
        let mut output = String::new();

        output.push_str("# HELP pwstrength_requests_total Total number of predict requests\n");
        output.push_str("# TYPE pwstrength_requests_total counter\n");
        output.push_str(&format!(
            "pwstrength_requests_total {}\n",
            self.requests_total.load(Ordering::Relaxed)
        ));

        output.push_str("# HELP pwstrength_requests_empty Requests without a password\n");
        output.push_str("# TYPE pwstrength_requests_empty counter\n");
        output.push_str(&format!(
            "pwstrength_requests_empty {}\n",
            self.requests_empty.load(Ordering::Relaxed)
        ));

        output.push_str("# HELP pwstrength_classified_total Passwords classified by label\n");
        output.push_str("# TYPE pwstrength_classified_total counter\n");
        for label in StrengthLabel::ALL {
            output.push_str(&format!(
                "pwstrength_classified_total{{label=\"{}\"}} {}\n",
                label.as_str(),
                self.label_counter(label).load(Ordering::Relaxed)
            ));
        }

        if self.config.latency_histograms {
            output.push_str(
                "# HELP pwstrength_evaluation_latency_ms Evaluation latency in milliseconds\n",
            );
            output.push_str("# TYPE pwstrength_evaluation_latency_ms histogram\n");
            let histogram = self.latency.read();
            for (bound, count) in histogram.buckets() {
                output.push_str(&format!(
                    "pwstrength_evaluation_latency_ms_bucket{{le=\"{}\"}} {}\n",
                    bound, count
                ));
            }
            output.push_str(&format!(
                "pwstrength_evaluation_latency_ms_bucket{{le=\"+Inf\"}} {}\n",
                histogram.observed
            ));
            output.push_str(&format!(
                "pwstrength_evaluation_latency_ms_sum {}\n",
                histogram.sum_ms
            ));
            output.push_str(&format!(
                "pwstrength_evaluation_latency_ms_count {}\n",
                histogram.observed
            ));
        }

        output.push_str("# HELP pwstrength_errors_total Total number of failed requests\n");
        output.push_str("# TYPE pwstrength_errors_total counter\n");
        output.push_str(&format!(
            "pwstrength_errors_total {}\n",
            self.errors_total.load(Ordering::Relaxed)
        ));
        let errors = self.errors_by_type.read();
        let mut error_types: Vec<_> = errors.iter().collect();
        error_types.sort();
        for (error_type, count) in error_types {
            output.push_str(&format!(
                "pwstrength_errors_by_type{{type=\"{}\"}} {}\n",
                error_type, count
            ));
        }

        output.push_str("# HELP pwstrength_uptime_seconds Seconds since the service started\n");
        output.push_str("# TYPE pwstrength_uptime_seconds gauge\n");
        output.push_str(&format!("pwstrength_uptime_seconds {}\n", self.uptime_secs()));

        output
    }

    /// Export metrics as JSON
    pub fn json(&self) -> serde_json::Value {
        let latency = self.latency.read();
        let errors = self.errors_by_type.read();

        serde_json::json!({
            "requests": {
                "total": self.requests_total.load(Ordering::Relaxed),
                "empty": self.requests_empty.load(Ordering::Relaxed),
            },
            "classified": {
                "weak": self.classified_weak.load(Ordering::Relaxed),
                "medium": self.classified_medium.load(Ordering::Relaxed),
                "strong": self.classified_strong.load(Ordering::Relaxed),
            },
            "latency": {
                "p50_ms": latency.quantile(0.50),
                "p99_ms": latency.quantile(0.99),
                "mean_ms": latency.mean(),
                "count": latency.observed,
            },
            "errors": {
                "total": self.errors_total.load(Ordering::Relaxed),
                "by_type": errors.clone(),
            },
            "uptime_seconds": self.uptime_secs(),
        })
    }
}

impl Default for StrengthMetrics {
    fn default() -> Self {
        Self::new(MetricsConfig::default())
    }
}

/// Latency samples kept for quantiles
const LATENCY_WINDOW: usize = 4096;

/// Cumulative bucket counts over every observation, quantiles over the most
/// recent [`LATENCY_WINDOW`] samples
struct LatencyHistogram {
    bounds: Vec<f64>,
    counts: Vec<u64>,
    sum_ms: f64,
    observed: u64,
    window: VecDeque<f64>,
}

impl LatencyHistogram {
    fn new(bounds: &[f64]) -> Self {
        let mut bounds = bounds.to_vec();
        bounds.sort_by(f64::total_cmp);
        Self {
            counts: vec![0; bounds.len()],
            bounds,
            sum_ms: 0.0,
            observed: 0,
            window: VecDeque::with_capacity(LATENCY_WINDOW),
        }
    }

    fn observe(&mut self, ms: f64) {
        self.sum_ms += ms;
        self.observed += 1;

        if self.window.len() == LATENCY_WINDOW {
            self.window.pop_front();
        }
        self.window.push_back(ms);

        // Bounds are sorted, so every bucket from the first match up counts it
        if let Some(first) = self.bounds.iter().position(|&bound| ms <= bound) {
            for count in &mut self.counts[first..] {
                *count += 1;
            }
        }
    }

    fn buckets(&self) -> impl Iterator<Item = (f64, u64)> + '_ {
        self.bounds.iter().copied().zip(self.counts.iter().copied())
    }

    fn mean(&self) -> f64 {
        if self.observed == 0 {
            0.0
        } else {
            self.sum_ms / self.observed as f64
        }
    }

    /// Nearest-rank quantile over the window, `q` in `0.0..=1.0`
    fn quantile(&self, q: f64) -> f64 {
        if self.window.is_empty() {
            return 0.0;
        }

        let mut sorted: Vec<f64> = self.window.iter().copied().collect();
        sorted.sort_by(f64::total_cmp);

        let rank = (q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64).round() as usize;
        sorted[rank]
    }
}
