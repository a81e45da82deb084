//! Persisted artifact bundles
//!
//! A bundle is the model plus the fitted preprocessing stages of one training
//! run, stored under a profile name in the models directory:
//!
//! ```text
//! best_model_<profile>.json
//! scaler_<profile>.json
//! imputer_<profile>.json
//! poly_<profile>.json        (optional)
//! ```

mod resolver;
mod store;

pub use resolver::{load_profile, resolve};
pub use store::ArtifactWriter;

use crate::classifier::{Classifier, SavedModel};
use crate::error::{PotabilityError, Result};
use crate::preprocessing::FittedPipeline;
use crate::schema::NUM_FEATURES;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Named artifact set, in resolver preference order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Profile {
    Deep,
    Advanced,
}

impl Profile {
    /// Resolver preference: strict and total
    pub const PREFERENCE: [Profile; 2] = [Profile::Deep, Profile::Advanced];

    pub fn as_str(self) -> &'static str {
        match self {
            Profile::Deep => "deep",
            Profile::Advanced => "advanced",
        }
    }

    /// Whether a polynomial stage may be loaded for this profile
    pub fn supports_polynomial(self) -> bool {
        matches!(self, Profile::Deep)
    }
}

impl fmt::Display for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Profile {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "deep" => Ok(Profile::Deep),
            "advanced" => Ok(Profile::Advanced),
            other => Err(format!("unknown profile `{}`", other)),
        }
    }
}

/// File locations of one profile's artifacts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    pub model: PathBuf,
    pub scaler: PathBuf,
    pub imputer: PathBuf,
    pub poly: PathBuf,
}

impl ArtifactPaths {
    pub fn new(dir: &Path, profile: Profile) -> Self {
        let p = profile.as_str();
        Self {
            model: dir.join(format!("best_model_{}.json", p)),
            scaler: dir.join(format!("scaler_{}.json", p)),
            imputer: dir.join(format!("imputer_{}.json", p)),
            poly: dir.join(format!("poly_{}.json", p)),
        }
    }
}

/// Training provenance stored next to the model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelMetadata {
    /// Training variant that produced the bundle (demo, advanced, deep)
    pub variant: String,
    pub trained_at: i64,
    /// Accuracy on the held-out split, or on the training data when the
    /// variant does not split
    pub accuracy: f64,
    pub evaluated_on_training_data: bool,
}

/// Contents of a `best_model_<profile>.json` file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub model: SavedModel,
    pub metadata: ModelMetadata,
}

/// A complete, internally consistent pipeline loaded for inference
pub struct ArtifactBundle {
    profile: Profile,
    model: Box<dyn Classifier>,
    pipeline: FittedPipeline,
    metadata: Option<ModelMetadata>,
}

impl fmt::Debug for ArtifactBundle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArtifactBundle")
            .field("profile", &self.profile)
            .field("model", &self.model.name())
            .field("pipeline", &self.pipeline)
            .field("metadata", &self.metadata)
            .finish()
    }
}

impl ArtifactBundle {
    /// Assemble a bundle, checking that stage widths chain into the model
    pub fn new(profile: Profile, model: Box<dyn Classifier>, pipeline: FittedPipeline) -> Result<Self> {
        let invalid = |reason: String| PotabilityError::InvalidBundle {
            profile: profile.to_string(),
            reason,
        };

        if pipeline.n_features_in() != NUM_FEATURES {
            return Err(invalid(format!(
                "imputer fitted on {} columns, schema has {}",
                pipeline.n_features_in(),
                NUM_FEATURES
            )));
        }
        if pipeline.poly.is_some() && !profile.supports_polynomial() {
            return Err(invalid("profile cannot carry a polynomial stage".to_string()));
        }
        pipeline.validate().map_err(invalid)?;
        if model.n_features() != pipeline.n_features_out() {
            return Err(invalid(format!(
                "model expects {} columns, scaler produces {}",
                model.n_features(),
                pipeline.n_features_out()
            )));
        }

        Ok(Self {
            profile,
            model,
            pipeline,
            metadata: None,
        })
    }

    pub fn with_metadata(mut self, metadata: ModelMetadata) -> Self {
        self.metadata = Some(metadata);
        self
    }

    pub fn profile(&self) -> Profile {
        self.profile
    }

    pub fn model(&self) -> &dyn Classifier {
        self.model.as_ref()
    }

    pub fn pipeline(&self) -> &FittedPipeline {
        &self.pipeline
    }

    pub fn metadata(&self) -> Option<&ModelMetadata> {
        self.metadata.as_ref()
    }

    pub fn has_polynomial(&self) -> bool {
        self.pipeline.poly.is_some()
    }
}
