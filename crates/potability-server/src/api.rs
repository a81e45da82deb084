//! HTTP API for predictions, health checks and Prometheus metrics

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use potability_lib::{
    ArtifactBundle, FeatureRow, PotabilityError, PotabilityPredictor, ServiceMetrics,
    StructuredLogger,
};
use prometheus::{Encoder, TextEncoder};
use serde::Serialize;
use serde_json::{json, Map, Value};
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info};

/// Loaded bundle plus the handles every request needs.
///
/// Built once at startup and shared read-only through `Arc`.
pub struct ServingContext {
    predictor: PotabilityPredictor,
    metrics: ServiceMetrics,
    logger: StructuredLogger,
}

impl ServingContext {
    pub fn new(bundle: ArtifactBundle, metrics: ServiceMetrics, logger: StructuredLogger) -> Self {
        metrics.set_bundle(&bundle);
        logger.log_bundle_loaded(&bundle);
        Self {
            predictor: PotabilityPredictor::new(bundle),
            metrics,
            logger,
        }
    }

    pub fn predictor(&self) -> &PotabilityPredictor {
        &self.predictor
    }

    pub fn logger(&self) -> &StructuredLogger {
        &self.logger
    }
}

/// Body of a successful `POST /predict`
#[derive(Debug, Serialize)]
pub struct PredictResponse {
    pub prediction: u8,
    pub result: &'static str,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub profile: String,
    pub model: String,
    pub polynomial: bool,
    pub features_out: usize,
    pub variant: Option<String>,
    pub predictions_served: u64,
}

/// Error surfaced to clients as `{"error": ...}`
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

async fn home() -> &'static str {
    "Potability classifier is running"
}

async fn healthz(State(ctx): State<Arc<ServingContext>>) -> Json<HealthResponse> {
    let bundle = ctx.predictor.bundle();
    Json(HealthResponse {
        status: "ok",
        profile: bundle.profile().to_string(),
        model: bundle.model().name().to_string(),
        polynomial: bundle.has_polynomial(),
        features_out: bundle.pipeline().n_features_out(),
        variant: bundle.metadata().map(|m| m.variant.clone()),
        predictions_served: ctx.predictor.stats().rows_scored,
    })
}

/// Prometheus metrics endpoint
async fn metrics() -> Response {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();

    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        error!(error = %e, "Failed to encode metrics");
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    }

    (
        StatusCode::OK,
        [("content-type", "text/plain; charset=utf-8")],
        buffer,
    )
        .into_response()
}

async fn predict(
    State(ctx): State<Arc<ServingContext>>,
    body: Result<Json<Map<String, Value>>, JsonRejection>,
) -> Result<Json<PredictResponse>, ApiError> {
    let start = Instant::now();

    let Json(fields) = body.map_err(|rejection| {
        let message = rejection.body_text();
        ctx.metrics.inc_rejected_requests();
        ctx.logger.log_rejected(&message);
        ApiError {
            status: StatusCode::BAD_REQUEST,
            message,
        }
    })?;

    let row = FeatureRow::from_named(&fields).map_err(|mismatch| {
        let message = mismatch.to_string();
        ctx.metrics.inc_rejected_requests();
        ctx.logger.log_rejected(&message);
        ApiError {
            status: StatusCode::UNPROCESSABLE_ENTITY,
            message,
        }
    })?;

    let prediction = ctx.predictor.predict_row(&row).map_err(|e| prediction_failed(&ctx, e))?;

    let elapsed = start.elapsed();
    ctx.metrics.observe_prediction_latency(elapsed.as_secs_f64());
    ctx.metrics.add_rows_scored(1);
    ctx.logger.log_prediction(&prediction, elapsed.as_micros() as u64);

    Ok(Json(PredictResponse {
        prediction: prediction.label.label(),
        result: prediction.label.as_str(),
    }))
}

fn prediction_failed(ctx: &ServingContext, e: PotabilityError) -> ApiError {
    if e.is_client_error() {
        ctx.metrics.inc_rejected_requests();
        ctx.logger.log_rejected(&e.to_string());
        return ApiError {
            status: StatusCode::UNPROCESSABLE_ENTITY,
            message: e.to_string(),
        };
    }
    ctx.metrics.inc_prediction_errors();
    error!(error = %e, "Prediction failed");
    ApiError {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        message: "prediction failed".to_string(),
    }
}

/// Create the API router
pub fn create_router(ctx: Arc<ServingContext>) -> Router {
    Router::new()
        .route("/", get(home))
        .route("/predict", post(predict))
        .route("/healthz", get(healthz))
        .route("/metrics", get(metrics))
        .with_state(ctx)
}

/// Serve until `shutdown` resolves
pub async fn serve<F>(addr: &str, ctx: Arc<ServingContext>, shutdown: F) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let app = create_router(ctx);

    info!(addr = %addr, "Starting API server");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;

    Ok(())
}
