//! Core data models for potability predictions

use serde::{Deserialize, Serialize};
use std::fmt;

/// Predicted class of a water sample
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum Potability {
    NotPotable = 0,
    Potable = 1,
}

impl Potability {
    pub fn from_label(label: u8) -> Option<Self> {
        match label {
            0 => Some(Potability::NotPotable),
            1 => Some(Potability::Potable),
            _ => None,
        }
    }

    pub fn label(self) -> u8 {
        self as u8
    }

    /// Human-readable result used by the HTTP surface
    pub fn as_str(self) -> &'static str {
        match self {
            Potability::NotPotable => "Not Potable",
            Potability::Potable => "Potable",
        }
    }
}

impl From<Potability> for u8 {
    fn from(p: Potability) -> u8 {
        p.label()
    }
}

impl TryFrom<u8> for Potability {
    type Error = String;

    fn try_from(label: u8) -> Result<Self, Self::Error> {
        Potability::from_label(label).ok_or_else(|| format!("invalid potability label {}", label))
    }
}

impl fmt::Display for Potability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Scoring result for one input row
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub label: Potability,
    /// Probability of the potable class, whatever the label
    pub confidence: f64,
}
