//! HTTP Surface
//!
//! Routes:
//!
//! - `GET /` static interface
//! - `POST /predict_strength` password classification
//! - `GET /health` readiness probe
//! - `GET /metrics` Prometheus metrics, or JSON with `?format=json`

use anyhow::{Context, Result};
use axum::body::Bytes;
use axum::extract::rejection::BytesRejection;
use axum::extract::{DefaultBodyLimit, Query, State};
use axum::http::{header, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

use crate::engine::{Evaluation, StrengthEngine};
use crate::error::PredictError;
use crate::metrics::{RequestOutcome, StrengthMetrics};

const INDEX_HTML: &str = include_str!("../static/index.html");

pub const EMPTY_INPUT_MESSAGE: &str = "Enter a password.";
pub const MODEL_NOT_LOADED_MESSAGE: &str = "Model not loaded.";
pub const INVALID_BODY_MESSAGE: &str = "Invalid request body.";
pub const BODY_TOO_LARGE_MESSAGE: &str = "Request body too large.";
pub const INVALID_CLASS_MESSAGE: &str = "Classifier returned an invalid class.";

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    engine: Arc<StrengthEngine>,
    metrics: Arc<StrengthMetrics>,
}

impl AppState {
    pub fn new(engine: StrengthEngine, metrics: StrengthMetrics) -> Self {
        Self {
            engine: Arc::new(engine),
            metrics: Arc::new(metrics),
        }
    }

    pub fn engine(&self) -> &StrengthEngine {
        &self.engine
    }

    pub fn metrics(&self) -> &StrengthMetrics {
        &self.metrics
    }
}

/// `POST /predict_strength` body
#[derive(Debug, Deserialize)]
struct PredictRequest {
    #[serde(default)]
    password: Option<String>,
}

/// `GET /metrics` query
#[derive(Debug, Deserialize)]
struct MetricsQuery {
    format: Option<String>,
}

/// Build the router
pub fn router(state: AppState, max_body_size: usize) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/predict_strength", post(predict_strength))
        .route("/health", get(health))
        .route("/metrics", get(metrics))
        .layer(DefaultBodyLimit::max(max_body_size))
        .with_state(state)
}

/// Bind and serve until `shutdown` resolves
pub async fn serve<F>(bind: SocketAddr, router: Router, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let listener = tokio::net::TcpListener::bind(bind)
        .await
        .with_context(|| format!("failed to bind listener to {}", bind))?;

    info!(address = %bind, "Listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown)
        .await
        .context("server error")?;

    Ok(())
}

async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

async fn predict_strength(
    State(state): State<AppState>,
    body: Result<Bytes, BytesRejection>,
) -> Response {
    // Readiness is reported ahead of any body rejection
    if !state.engine.model().is_ready() {
        state.metrics.record_request(RequestOutcome::ModelUnavailable);
        return error_response(StatusCode::INTERNAL_SERVER_ERROR, MODEL_NOT_LOADED_MESSAGE);
    }

    let body = match body {
        Ok(body) => body,
        Err(rejection) => {
            debug!(error = %rejection, "Failed to read predict body");
            state.metrics.record_request(RequestOutcome::BadRequest);
            return if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
                error_response(StatusCode::PAYLOAD_TOO_LARGE, BODY_TOO_LARGE_MESSAGE)
            } else {
                error_response(StatusCode::BAD_REQUEST, INVALID_BODY_MESSAGE)
            };
        }
    };

    let request: PredictRequest = match serde_json::from_slice(&body) {
        Ok(request) => request,
        Err(e) => {
            debug!(error = %e, body_len = body.len(), "Rejected predict body");
            state.metrics.record_request(RequestOutcome::BadRequest);
            return error_response(StatusCode::BAD_REQUEST, INVALID_BODY_MESSAGE);
        }
    };
    let password = request.password.unwrap_or_default();

    let started = Instant::now();
    let evaluation = state.engine.evaluate(&password);
    state.metrics.record_latency(started.elapsed());

    match evaluation {
        Ok(Evaluation::EmptyInput) => {
            state.metrics.record_request(RequestOutcome::EmptyInput);
            Json(json!({ "strength": EMPTY_INPUT_MESSAGE })).into_response()
        }
        Ok(Evaluation::Classified { result, .. }) => {
            state
                .metrics
                .record_request(RequestOutcome::Classified(result.label));
            Json(json!({
                "strength": result.label.display(),
                "entropy": result.entropy,
                "classes": result.classes.to_string(),
            }))
            .into_response()
        }
        Err(PredictError::ModelUnavailable) => {
            state.metrics.record_request(RequestOutcome::ModelUnavailable);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, MODEL_NOT_LOADED_MESSAGE)
        }
        Err(PredictError::InvalidClassifierOutput(index)) => {
            warn!(index, "Refusing to label invalid classifier output");
            state
                .metrics
                .record_request(RequestOutcome::InvalidClassifierOutput);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, INVALID_CLASS_MESSAGE)
        }
    }
}

async fn health(State(state): State<AppState>) -> Response {
    let model = state.engine.model();
    if model.is_ready() {
        Json(json!({ "status": "ok", "model_loaded": true })).into_response()
    } else {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({
                "status": "degraded",
                "model_loaded": false,
                "reason": model.unavailable_reason(),
            })),
        )
            .into_response()
    }
}

async fn metrics(State(state): State<AppState>, Query(query): Query<MetricsQuery>) -> Response {
    if !state.metrics.is_enabled() {
        return StatusCode::NOT_FOUND.into_response();
    }
    if query.format.as_deref() == Some("json") {
        return Json(state.metrics.json()).into_response();
    }
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.prometheus(),
    )
        .into_response()
}

fn error_response(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}
