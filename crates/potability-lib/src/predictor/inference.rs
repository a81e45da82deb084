//! Batch scoring against a loaded artifact bundle

use super::output::OutputFormatter;
use crate::artifacts::ArtifactBundle;
use crate::error::{PotabilityError, Result};
use crate::models::Prediction;
use crate::schema::{rows_to_matrix, FeatureRow};
use ndarray::ArrayView2;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Batch latency above which a warning is logged
pub const SLOW_BATCH_THRESHOLD: Duration = Duration::from_millis(50);

/// Scores raw feature matrices with an immutable bundle
pub struct PotabilityPredictor {
    bundle: ArtifactBundle,
    output_formatter: OutputFormatter,
    call_count: AtomicU64,
    row_count: AtomicU64,
    slow_call_count: AtomicU64,
}

impl PotabilityPredictor {
    pub fn new(bundle: ArtifactBundle) -> Self {
        Self {
            bundle,
            output_formatter: OutputFormatter::new(),
            call_count: AtomicU64::new(0),
            row_count: AtomicU64::new(0),
            slow_call_count: AtomicU64::new(0),
        }
    }

    pub fn bundle(&self) -> &ArtifactBundle {
        &self.bundle
    }

    pub fn output_formatter(&self) -> &OutputFormatter {
        &self.output_formatter
    }

    /// Score every row of `raw` (schema order, NaN for missing).
    ///
    /// Returns one prediction per input row in input order. A matrix that
    /// is not schema width fails before the model runs.
    pub fn predict(&self, raw: ArrayView2<'_, f64>) -> Result<Vec<Prediction>> {
        let start = Instant::now();

        let transformed = self.bundle.pipeline().transform(raw)?;
        let model = self.bundle.model();
        let labels = model.predict(transformed.view())?;
        let proba = model.predict_proba(transformed.view())?.to_vec();
        let predictions = self.output_formatter.format(&labels, &proba)?;

        let elapsed = start.elapsed();
        self.call_count.fetch_add(1, Ordering::Relaxed);
        self.row_count
            .fetch_add(predictions.len() as u64, Ordering::Relaxed);

        if elapsed > SLOW_BATCH_THRESHOLD {
            self.slow_call_count.fetch_add(1, Ordering::Relaxed);
            warn!(
                elapsed_ms = elapsed.as_millis() as u64,
                rows = predictions.len(),
                "Prediction batch exceeded {}ms target",
                SLOW_BATCH_THRESHOLD.as_millis()
            );
        } else {
            debug!(
                elapsed_us = elapsed.as_micros() as u64,
                rows = predictions.len(),
                "Prediction batch completed"
            );
        }

        Ok(predictions)
    }

    /// Score a single record
    pub fn predict_row(&self, row: &FeatureRow) -> Result<Prediction> {
        let matrix = rows_to_matrix(std::slice::from_ref(row));
        self.predict(matrix.view())?
            .into_iter()
            .next()
            .ok_or_else(|| PotabilityError::InvalidData("model returned no prediction".to_string()))
    }

    pub fn stats(&self) -> InferenceStats {
        InferenceStats {
            total_calls: self.call_count.load(Ordering::Relaxed),
            rows_scored: self.row_count.load(Ordering::Relaxed),
            slow_calls: self.slow_call_count.load(Ordering::Relaxed),
        }
    }
}

/// Inference statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InferenceStats {
    pub total_calls: u64,
    pub rows_scored: u64,
    pub slow_calls: u64,
}
