//! Inference service

mod inference;
mod output;

pub use inference::{InferenceStats, PotabilityPredictor, SLOW_BATCH_THRESHOLD};
pub use output::{OutputConfig, OutputFormatter, BORDERLINE_MARGIN};
