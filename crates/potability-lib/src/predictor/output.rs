//! Pairing model outputs into prediction records

use crate::error::{PotabilityError, Result};
use crate::models::{Potability, Prediction};

/// Distance from 0.5 under which a confidence counts as borderline
pub const BORDERLINE_MARGIN: f64 = 0.1;

/// Configuration for output formatting
#[derive(Debug, Clone)]
pub struct OutputConfig {
    pub borderline_margin: f64,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            borderline_margin: BORDERLINE_MARGIN,
        }
    }
}

/// Combines labels and potable-class probabilities row by row
#[derive(Debug, Clone, Default)]
pub struct OutputFormatter {
    config: OutputConfig,
}

impl OutputFormatter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: OutputConfig) -> Self {
        Self { config }
    }

    /// Zip labels with probabilities, keeping input order.
    ///
    /// Confidence is the probability of the potable class as the model
    /// reported it; it is not flipped for non-potable labels.
    pub fn format(&self, labels: &[Potability], proba_potable: &[f64]) -> Result<Vec<Prediction>> {
        if labels.len() != proba_potable.len() {
            return Err(PotabilityError::InvalidData(format!(
                "model returned {} labels but {} probabilities",
                labels.len(),
                proba_potable.len()
            )));
        }
        Ok(labels
            .iter()
            .zip(proba_potable)
            .map(|(&label, &p)| Prediction {
                label,
                confidence: p.clamp(0.0, 1.0),
            })
            .collect())
    }

    /// True when the potable probability sits close to the decision boundary
    pub fn is_borderline(&self, prediction: &Prediction) -> bool {
        (prediction.confidence - 0.5).abs() < self.config.borderline_margin
    }
}
