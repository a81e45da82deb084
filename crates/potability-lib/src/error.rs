//! Error types for the potability pipeline

use std::path::PathBuf;
use thiserror::Error;

/// Result alias used across the library
pub type Result<T> = std::result::Result<T, PotabilityError>;

/// Errors raised while loading artifacts, preprocessing or scoring
#[derive(Debug, Error)]
pub enum PotabilityError {
    /// No usable bundle for any known profile, or a profile is missing a
    /// required stage file.
    #[error("no usable artifact bundle in {}: {reason}", dir.display())]
    ArtifactsNotFound { dir: PathBuf, reason: String },

    /// Input does not match the feature schema or the width a stage expects.
    #[error("schema mismatch: {0}")]
    SchemaMismatch(#[from] SchemaMismatch),

    /// An artifact file exists but could not be decoded.
    #[error("invalid artifact {}: {source}", path.display())]
    ArtifactFormat {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Stages of a bundle disagree on their widths.
    #[error("inconsistent {profile} bundle: {reason}")]
    InvalidBundle { profile: String, reason: String },

    #[error("cannot fit {0} on empty data")]
    EmptyData(&'static str),

    #[error("invalid training data: {0}")]
    InvalidData(String),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl PotabilityError {
    /// True for per-request failures that must not take the process down
    pub fn is_client_error(&self) -> bool {
        matches!(self, PotabilityError::SchemaMismatch(_))
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        PotabilityError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Details of a schema violation, naming the offending column where possible
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SchemaMismatch {
    #[error("{stage} expects {expected} columns, got {got}")]
    Width {
        stage: &'static str,
        expected: usize,
        got: usize,
    },

    #[error("unknown column `{0}`")]
    UnknownColumn(String),

    #[error("missing column `{0}`")]
    MissingColumn(String),

    #[error("duplicate column `{0}`")]
    DuplicateColumn(String),

    #[error("row {row}: column `{column}` has non-numeric value `{value}`")]
    NotNumeric {
        row: usize,
        column: String,
        value: String,
    },
}
