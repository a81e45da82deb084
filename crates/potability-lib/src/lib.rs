//! Library for water potability classification
//!
//! This crate provides the core functionality for:
//! - Mapping raw water-quality measurements onto the feature schema
//! - Fitting and replaying the preprocessing pipeline
//! - Persisting and resolving artifact bundles
//! - Scoring samples with a loaded bundle
//! - Training the bundles in the first place

pub mod artifacts;
pub mod classifier;
pub mod error;
pub mod models;
pub mod observability;
pub mod predictor;
pub mod preprocessing;
pub mod schema;
pub mod training;

pub use artifacts::{resolve, ArtifactBundle, Profile};
pub use error::{PotabilityError, Result, SchemaMismatch};
pub use models::*;
pub use observability::{ServiceMetrics, StructuredLogger};
pub use predictor::PotabilityPredictor;
pub use schema::{FeatureRow, FEATURE_NAMES, NUM_FEATURES};
