//! Classifier capability and the serializable models behind it
//!
//! Inference only ever sees [`Classifier`]. Which estimator produced an
//! artifact is a training-time decision recorded in [`SavedModel`].

mod logistic;
mod naive_bayes;
mod voting;

pub use logistic::LogisticRegression;
pub use naive_bayes::GaussianNaiveBayes;
pub use voting::SoftVotingEnsemble;

use crate::error::{PotabilityError, Result, SchemaMismatch};
use crate::models::Potability;
use ndarray::{Array1, ArrayView2};
use serde::{Deserialize, Serialize};

/// Trait for trained binary classifiers
pub trait Classifier: Send + Sync {
    /// Human-readable model name
    fn name(&self) -> &str;

    /// Width of the matrix the model was trained on
    fn n_features(&self) -> usize;

    /// Probability of the potable class for each row
    fn predict_proba(&self, x: ArrayView2<'_, f64>) -> Result<Array1<f64>>;

    /// Discrete label for each row
    fn predict(&self, x: ArrayView2<'_, f64>) -> Result<Vec<Potability>> {
        Ok(self
            .predict_proba(x)?
            .iter()
            .map(|&p| {
                if p > 0.5 {
                    Potability::Potable
                } else {
                    Potability::NotPotable
                }
            })
            .collect())
    }
}

pub(crate) fn check_model_width(n_features: usize, x: ArrayView2<'_, f64>) -> Result<()> {
    if x.ncols() != n_features {
        return Err(SchemaMismatch::Width {
            stage: "model",
            expected: n_features,
            got: x.ncols(),
        }
        .into());
    }
    Ok(())
}

/// Check labels before fitting: same length as `x`, both classes present
pub(crate) fn check_labels(x: ArrayView2<'_, f64>, y: &[Potability]) -> Result<()> {
    if x.nrows() == 0 {
        return Err(PotabilityError::EmptyData("classifier"));
    }
    if x.nrows() != y.len() {
        return Err(PotabilityError::InvalidData(format!(
            "{} rows but {} labels",
            x.nrows(),
            y.len()
        )));
    }
    if !y.contains(&Potability::Potable) || !y.contains(&Potability::NotPotable) {
        return Err(PotabilityError::InvalidData(
            "training labels must contain both classes".to_string(),
        ));
    }
    Ok(())
}

/// A trained model as persisted in an artifact file
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SavedModel {
    Logistic(LogisticRegression),
    NaiveBayes(GaussianNaiveBayes),
    SoftVoting(SoftVotingEnsemble),
}

impl SavedModel {
    fn inner(&self) -> &dyn Classifier {
        match self {
            SavedModel::Logistic(m) => m,
            SavedModel::NaiveBayes(m) => m,
            SavedModel::SoftVoting(m) => m,
        }
    }
}

impl Classifier for SavedModel {
    fn name(&self) -> &str {
        self.inner().name()
    }

    fn n_features(&self) -> usize {
        self.inner().n_features()
    }

    fn predict_proba(&self, x: ArrayView2<'_, f64>) -> Result<Array1<f64>> {
        self.inner().predict_proba(x)
    }
}

/// Untrained model description chosen by a training variant
#[derive(Debug, Clone)]
pub enum ModelSpec {
    Logistic(LogisticRegression),
    NaiveBayes(GaussianNaiveBayes),
    SoftVoting(Vec<ModelSpec>),
}

impl ModelSpec {
    pub fn name(&self) -> String {
        match self {
            ModelSpec::Logistic(_) => "logistic_regression".to_string(),
            ModelSpec::NaiveBayes(_) => "gaussian_naive_bayes".to_string(),
            ModelSpec::SoftVoting(members) => {
                let names: Vec<String> = members.iter().map(|m| m.name()).collect();
                format!("soft_voting({})", names.join(","))
            }
        }
    }

    /// Train on a preprocessed matrix
    pub fn fit(&self, x: ArrayView2<'_, f64>, y: &[Potability]) -> Result<SavedModel> {
        check_labels(x, y)?;
        match self {
            ModelSpec::Logistic(template) => {
                let mut model = template.clone();
                model.fit(x, y)?;
                Ok(SavedModel::Logistic(model))
            }
            ModelSpec::NaiveBayes(template) => {
                let mut model = template.clone();
                model.fit(x, y)?;
                Ok(SavedModel::NaiveBayes(model))
            }
            ModelSpec::SoftVoting(members) => {
                let fitted = members
                    .iter()
                    .map(|spec| spec.fit(x, y))
                    .collect::<Result<Vec<_>>>()?;
                Ok(SavedModel::SoftVoting(SoftVotingEnsemble::new(fitted)?))
            }
        }
    }
}
