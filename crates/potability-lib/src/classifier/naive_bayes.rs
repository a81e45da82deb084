//! Gaussian naive Bayes for the two potability classes

use super::{check_model_width, Classifier};
use crate::error::{PotabilityError, Result};
use crate::models::Potability;
use ndarray::{Array1, ArrayView1, ArrayView2};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "StoredNaiveBayes")]
pub struct GaussianNaiveBayes {
    /// Per-class feature means, indexed by label
    means: [Vec<f64>; 2],
    variances: [Vec<f64>; 2],
    priors: [f64; 2],
    var_smoothing: f64,
}

#[derive(Deserialize)]
struct StoredNaiveBayes {
    means: [Vec<f64>; 2],
    variances: [Vec<f64>; 2],
    priors: [f64; 2],
    var_smoothing: f64,
}

impl TryFrom<StoredNaiveBayes> for GaussianNaiveBayes {
    type Error = PotabilityError;

    fn try_from(stored: StoredNaiveBayes) -> Result<Self> {
        let width = stored.means[0].len();
        let widths = [
            stored.means[1].len(),
            stored.variances[0].len(),
            stored.variances[1].len(),
        ];
        if widths.iter().any(|&w| w != width) {
            return Err(PotabilityError::InvalidData(format!(
                "naive bayes statistics disagree on width: means {} and {}, variances {} and {}",
                width, widths[0], widths[1], widths[2]
            )));
        }
        if stored
            .variances
            .iter()
            .flatten()
            .any(|v| !(v.is_finite() && *v > 0.0))
        {
            return Err(PotabilityError::InvalidData(
                "naive bayes variances must be positive and finite".to_string(),
            ));
        }
        if stored.priors.iter().any(|p| !(p.is_finite() && *p > 0.0)) {
            return Err(PotabilityError::InvalidData(
                "naive bayes priors must be positive".to_string(),
            ));
        }
        Ok(Self {
            means: stored.means,
            variances: stored.variances,
            priors: stored.priors,
            var_smoothing: stored.var_smoothing,
        })
    }
}

impl Default for GaussianNaiveBayes {
    fn default() -> Self {
        Self::new()
    }
}

impl GaussianNaiveBayes {
    pub fn new() -> Self {
        Self {
            means: [Vec::new(), Vec::new()],
            variances: [Vec::new(), Vec::new()],
            priors: [0.5, 0.5],
            var_smoothing: 1e-9,
        }
    }

    pub(crate) fn fit(&mut self, x: ArrayView2<'_, f64>, y: &[Potability]) -> Result<()> {
        let n_features = x.ncols();

        // Largest feature variance, used to scale the smoothing term
        let max_var = x
            .columns()
            .into_iter()
            .map(|c| {
                let m = c.mean().unwrap_or(0.0);
                c.iter().map(|v| (v - m).powi(2)).sum::<f64>() / c.len() as f64
            })
            .fold(0.0, f64::max);
        let epsilon = self.var_smoothing * max_var.max(1.0);

        for class in [Potability::NotPotable, Potability::Potable] {
            let idx = class.label() as usize;

            // Welford's single-pass mean and variance
            let mut means = vec![0.0; n_features];
            let mut m2 = vec![0.0; n_features];
            let mut count = 0usize;
            for (row, _) in x.rows().into_iter().zip(y).filter(|(_, &label)| label == class) {
                count += 1;
                for (j, &val) in row.iter().enumerate() {
                    let delta = val - means[j];
                    means[j] += delta / count as f64;
                    m2[j] += delta * (val - means[j]);
                }
            }

            self.variances[idx] = m2.iter().map(|&m| m / count as f64 + epsilon).collect();
            self.means[idx] = means;
            self.priors[idx] = count as f64 / y.len() as f64;
        }
        Ok(())
    }

    fn joint_log_likelihood(&self, row: ArrayView1<'_, f64>, class: usize) -> f64 {
        let log_prior = self.priors[class].ln();
        let log_likelihood: f64 = row
            .iter()
            .zip(&self.means[class])
            .zip(&self.variances[class])
            .map(|((&xi, &mean), &var)| -0.5 * ((xi - mean).powi(2) / var + (2.0 * PI * var).ln()))
            .sum();
        log_prior + log_likelihood
    }
}

impl Classifier for GaussianNaiveBayes {
    fn name(&self) -> &str {
        "gaussian_naive_bayes"
    }

    fn n_features(&self) -> usize {
        self.means[0].len()
    }

    fn predict_proba(&self, x: ArrayView2<'_, f64>) -> Result<Array1<f64>> {
        check_model_width(self.n_features(), x)?;
        Ok(x.rows()
            .into_iter()
            .map(|row| {
                let neg = self.joint_log_likelihood(row, 0);
                let pos = self.joint_log_likelihood(row, 1);
                // log-sum-exp normalization
                let max = neg.max(pos);
                let pos_w = (pos - max).exp();
                pos_w / ((neg - max).exp() + pos_w)
            })
            .collect())
    }
}
