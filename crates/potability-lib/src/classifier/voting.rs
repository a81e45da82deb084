//! Soft-voting ensemble: weighted average of member probabilities

use super::{check_model_width, Classifier, SavedModel};
use crate::error::{PotabilityError, Result};
use ndarray::{Array1, ArrayView2};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "StoredEnsemble")]
pub struct SoftVotingEnsemble {
    members: Vec<SavedModel>,
    /// Normalized to sum to 1
    weights: Vec<f64>,
}

/// Ensemble as read from disk, before its invariants are checked
#[derive(Deserialize)]
struct StoredEnsemble {
    members: Vec<SavedModel>,
    weights: Vec<f64>,
}

impl TryFrom<StoredEnsemble> for SoftVotingEnsemble {
    type Error = PotabilityError;

    /// Stored weights are already normalized and are kept bit for bit
    fn try_from(stored: StoredEnsemble) -> Result<Self> {
        let total = check_parts(&stored.members, &stored.weights)?;
        if (total - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(PotabilityError::InvalidData(format!(
                "stored ensemble weights sum to {}, expected 1",
                total
            )));
        }
        Ok(Self {
            members: stored.members,
            weights: stored.weights,
        })
    }
}

const WEIGHT_SUM_TOLERANCE: f64 = 1e-9;

/// Check members and weights agree and return the weight total
fn check_parts(members: &[SavedModel], weights: &[f64]) -> Result<f64> {
    if members.is_empty() {
        return Err(PotabilityError::InvalidData(
            "voting ensemble needs at least one member".to_string(),
        ));
    }
    if weights.len() != members.len() {
        return Err(PotabilityError::InvalidData(format!(
            "{} weights for {} members",
            weights.len(),
            members.len()
        )));
    }
    let width = members[0].n_features();
    if let Some(other) = members.iter().find(|m| m.n_features() != width) {
        return Err(PotabilityError::InvalidData(format!(
            "ensemble member {} expects {} columns, first member expects {}",
            other.name(),
            other.n_features(),
            width
        )));
    }

    let total: f64 = weights.iter().sum();
    if !(total > 0.0) || weights.iter().any(|w| !w.is_finite() || *w < 0.0) {
        return Err(PotabilityError::InvalidData(
            "ensemble weights must be non-negative with a positive sum".to_string(),
        ));
    }
    Ok(total)
}

impl SoftVotingEnsemble {
    /// Equal-weight ensemble. Members must share an input width.
    pub fn new(members: Vec<SavedModel>) -> Result<Self> {
        let weights = vec![1.0; members.len()];
        Self::with_weights(members, weights)
    }

    pub fn with_weights(members: Vec<SavedModel>, weights: Vec<f64>) -> Result<Self> {
        let total = check_parts(&members, &weights)?;
        let weights = weights.iter().map(|w| w / total).collect();
        Ok(Self { members, weights })
    }
}

impl Classifier for SoftVotingEnsemble {
    fn name(&self) -> &str {
        "soft_voting"
    }

    fn n_features(&self) -> usize {
        self.members.first().map(|m| m.n_features()).unwrap_or(0)
    }

    fn predict_proba(&self, x: ArrayView2<'_, f64>) -> Result<Array1<f64>> {
        check_model_width(self.n_features(), x)?;
        let mut combined = Array1::<f64>::zeros(x.nrows());
        for (member, &weight) in self.members.iter().zip(&self.weights) {
            combined = combined + weight * member.predict_proba(x)?;
        }
        Ok(combined)
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::separable;
    use super::super::{GaussianNaiveBayes, LogisticRegression, ModelSpec};
    use super::*;

    fn fitted_members() -> (ndarray::Array2<f64>, SavedModel, SavedModel) {
        let (x, y) = separable();
        let lr = ModelSpec::Logistic(LogisticRegression::new())
            .fit(x.view(), &y)
            .unwrap();
        let nb = ModelSpec::NaiveBayes(GaussianNaiveBayes::new())
            .fit(x.view(), &y)
            .unwrap();
        (x, lr, nb)
    }

    #[test]
    fn test_average_of_members() {
        let (x, lr, nb) = fitted_members();
        let expected = (lr.predict_proba(x.view()).unwrap() + nb.predict_proba(x.view()).unwrap()) / 2.0;
        let ensemble = SoftVotingEnsemble::new(vec![lr, nb]).unwrap();
        let proba = ensemble.predict_proba(x.view()).unwrap();
        for (a, b) in proba.iter().zip(expected.iter()) {
            assert!((a - b).abs() < 1e-12);
        }
    }

    #[test]
    fn test_weights_normalized() {
        let (x, lr, nb) = fitted_members();
        let lr_only = lr.predict_proba(x.view()).unwrap();
        let ensemble = SoftVotingEnsemble::with_weights(vec![lr, nb], vec![4.0, 0.0]).unwrap();
        let proba = ensemble.predict_proba(x.view()).unwrap();
        for (a, b) in proba.iter().zip(lr_only.iter()) {
            assert!((a - b).abs() < 1e-12);
        }
    }

    #[test]
    fn test_empty_ensemble_rejected() {
        assert!(SoftVotingEnsemble::new(Vec::new()).is_err());
    }

    fn stored_ensemble() -> (ndarray::Array2<f64>, Array1<f64>, serde_json::Value) {
        let (x, lr, nb) = fitted_members();
        let ensemble = SavedModel::SoftVoting(SoftVotingEnsemble::new(vec![lr, nb]).unwrap());
        let proba = ensemble.predict_proba(x.view()).unwrap();
        (x, proba, serde_json::to_value(&ensemble).unwrap())
    }

    #[test]
    fn test_decoded_ensemble_scores_like_original() {
        let (x, expected, json) = stored_ensemble();
        let restored: SavedModel = serde_json::from_value(json).unwrap();
        assert_eq!(restored.predict_proba(x.view()).unwrap(), expected);
    }

    #[test]
    fn test_decode_rejects_weight_count_drift() {
        let (_, _, mut json) = stored_ensemble();
        json["weights"] = serde_json::json!([0.25]);
        let err = serde_json::from_value::<SavedModel>(json).unwrap_err();
        assert!(err.to_string().contains("1 weights for 2 members"), "{}", err);
    }

    #[test]
    fn test_decode_rejects_unnormalized_weights() {
        let (_, _, mut json) = stored_ensemble();
        json["weights"] = serde_json::json!([0.25, 0.25]);
        assert!(serde_json::from_value::<SavedModel>(json).is_err());
    }

    #[test]
    fn test_decode_rejects_empty_members() {
        let (_, _, mut json) = stored_ensemble();
        json["members"] = serde_json::json!([]);
        json["weights"] = serde_json::json!([]);
        assert!(serde_json::from_value::<SavedModel>(json).is_err());
    }
}
