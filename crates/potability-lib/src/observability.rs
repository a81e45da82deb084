//! Observability infrastructure for the potability service
//!
//! Provides:
//! - Prometheus metrics (prediction latency, rows scored, rejected requests, loaded bundle)
//! - Event-tagged structured logging with tracing

use crate::artifacts::ArtifactBundle;
use crate::models::Prediction;
use prometheus::{
    register_gauge_vec, register_histogram, register_int_counter, GaugeVec, Histogram, IntCounter,
};
use std::sync::OnceLock;
use tracing::{info, warn};

/// Default histogram buckets for latency measurements (in seconds)
const LATENCY_BUCKETS: &[f64] = &[
    0.00005, 0.0001, 0.00025, 0.0005, 0.001, 0.0025, 0.005, 0.01, 0.025, 0.05, 0.1, 0.5,
];

/// Global metrics instance (registered once)
static GLOBAL_METRICS: OnceLock<ServiceMetricsInner> = OnceLock::new();

struct ServiceMetricsInner {
    prediction_latency_seconds: Histogram,
    rows_scored: IntCounter,
    rejected_requests: IntCounter,
    prediction_errors: IntCounter,
    bundle_info: GaugeVec,
}

impl ServiceMetricsInner {
    fn new() -> Self {
        Self {
            prediction_latency_seconds: register_histogram!(
                "potability_prediction_latency_seconds",
                "Time spent preprocessing and scoring one request",
                LATENCY_BUCKETS.to_vec()
            )
            .expect("Failed to register prediction_latency_seconds"),

            rows_scored: register_int_counter!(
                "potability_rows_scored_total",
                "Total number of feature rows scored"
            )
            .expect("Failed to register rows_scored"),

            rejected_requests: register_int_counter!(
                "potability_rejected_requests_total",
                "Requests rejected for not matching the feature schema"
            )
            .expect("Failed to register rejected_requests"),

            prediction_errors: register_int_counter!(
                "potability_prediction_errors_total",
                "Predictions that failed after passing schema validation"
            )
            .expect("Failed to register prediction_errors"),

            bundle_info: register_gauge_vec!(
                "potability_bundle_info",
                "Information about the loaded artifact bundle",
                &["profile", "model", "polynomial"]
            )
            .expect("Failed to register bundle_info"),
        }
    }
}

/// Service metrics for Prometheus exposition
///
/// A lightweight handle to the global metrics instance.
/// Clones share the same underlying metrics.
#[derive(Clone)]
pub struct ServiceMetrics {
    _private: (),
}

impl Default for ServiceMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl ServiceMetrics {
    pub fn new() -> Self {
        GLOBAL_METRICS.get_or_init(ServiceMetricsInner::new);
        Self { _private: () }
    }

    fn inner(&self) -> &ServiceMetricsInner {
        GLOBAL_METRICS.get_or_init(ServiceMetricsInner::new)
    }

    pub fn observe_prediction_latency(&self, duration_secs: f64) {
        self.inner().prediction_latency_seconds.observe(duration_secs);
    }

    pub fn add_rows_scored(&self, rows: u64) {
        self.inner().rows_scored.inc_by(rows);
    }

    pub fn inc_rejected_requests(&self) {
        self.inner().rejected_requests.inc();
    }

    pub fn inc_prediction_errors(&self) {
        self.inner().prediction_errors.inc();
    }

    /// Publish the loaded bundle as a single info series
    pub fn set_bundle(&self, bundle: &ArtifactBundle) {
        let polynomial = if bundle.has_polynomial() { "true" } else { "false" };
        self.inner().bundle_info.reset();
        self.inner()
            .bundle_info
            .with_label_values(&[bundle.profile().as_str(), bundle.model().name(), polynomial])
            .set(1.0);
    }

    pub fn rows_scored(&self) -> u64 {
        self.inner().rows_scored.get()
    }

    pub fn rejected_requests(&self) -> u64 {
        self.inner().rejected_requests.get()
    }
}

/// Structured logger for service events
///
/// Every record carries an `event` field so log pipelines can filter on it.
#[derive(Clone)]
pub struct StructuredLogger {
    service_name: String,
}

impl StructuredLogger {
    pub fn new(service_name: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
        }
    }

    pub fn log_startup(&self, version: &str, addr: &str) {
        info!(
            event = "service_started",
            service = %self.service_name,
            version = %version,
            addr = %addr,
            "Potability service started"
        );
    }

    pub fn log_bundle_loaded(&self, bundle: &ArtifactBundle) {
        let (variant, accuracy) = bundle
            .metadata()
            .map(|m| (m.variant.as_str(), m.accuracy))
            .unwrap_or(("unknown", f64::NAN));
        info!(
            event = "bundle_loaded",
            service = %self.service_name,
            profile = %bundle.profile(),
            model = %bundle.model().name(),
            polynomial = bundle.has_polynomial(),
            features_out = bundle.pipeline().n_features_out(),
            variant = %variant,
            accuracy = accuracy,
            "Artifact bundle loaded"
        );
    }

    pub fn log_prediction(&self, prediction: &Prediction, elapsed_us: u64) {
        info!(
            event = "prediction_served",
            service = %self.service_name,
            prediction = prediction.label.label(),
            result = %prediction.label,
            confidence = prediction.confidence,
            elapsed_us = elapsed_us,
            "Served potability prediction"
        );
    }

    pub fn log_rejected(&self, reason: &str) {
        warn!(
            event = "request_rejected",
            service = %self.service_name,
            reason = %reason,
            "Rejected prediction request"
        );
    }

    pub fn log_shutdown(&self, reason: &str) {
        info!(
            event = "service_shutdown",
            service = %self.service_name,
            reason = %reason,
            "Potability service shutting down"
        );
    }

    pub fn log_artifacts_written(&self, profile: &str, variant: &str, accuracy: f64, dir: &str) {
        info!(
            event = "artifacts_written",
            service = %self.service_name,
            profile = %profile,
            variant = %variant,
            accuracy = accuracy,
            dir = %dir,
            "Training artifacts written"
        );
    }
}
