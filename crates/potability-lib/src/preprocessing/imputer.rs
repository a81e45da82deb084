//! Missing-value imputation
//!
//! NaN is the missing-value marker. Statistics are computed per column over
//! observed values only; a column with nothing observed fills with 0.0.

use super::{check_width, FittedStage};
use crate::error::{PotabilityError, Result};
use ndarray::{Array2, ArrayView2, Axis};
use serde::{Deserialize, Serialize};

/// Statistic used to fill missing values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImputeStrategy {
    Mean,
    /// Used by every training variant
    #[default]
    Median,
}

/// Imputer with one learned fill value per column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FittedImputer {
    strategy: ImputeStrategy,
    statistics: Vec<f64>,
}

impl FittedImputer {
    /// Learn fill values from training data
    pub fn fit(data: ArrayView2<'_, f64>, strategy: ImputeStrategy) -> Result<Self> {
        if data.nrows() == 0 {
            return Err(PotabilityError::EmptyData("imputer"));
        }

        let statistics = data
            .axis_iter(Axis(1))
            .map(|column| {
                let observed: Vec<f64> = column.iter().copied().filter(|v| !v.is_nan()).collect();
                column_statistic(observed, strategy)
            })
            .collect();

        Ok(Self {
            strategy,
            statistics,
        })
    }

    pub fn strategy(&self) -> ImputeStrategy {
        self.strategy
    }

    /// Fill values, one per column
    pub fn statistics(&self) -> &[f64] {
        &self.statistics
    }
}

fn column_statistic(mut observed: Vec<f64>, strategy: ImputeStrategy) -> f64 {
    if observed.is_empty() {
        return 0.0;
    }
    match strategy {
        ImputeStrategy::Mean => observed.iter().sum::<f64>() / observed.len() as f64,
        ImputeStrategy::Median => {
            observed.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
            let n = observed.len();
            if n % 2 == 0 {
                (observed[n / 2 - 1] + observed[n / 2]) / 2.0
            } else {
                observed[n / 2]
            }
        }
    }
}

impl FittedStage for FittedImputer {
    fn name(&self) -> &'static str {
        "imputer"
    }

    fn n_features_in(&self) -> usize {
        self.statistics.len()
    }

    fn n_features_out(&self) -> usize {
        self.statistics.len()
    }

    fn transform(&self, data: ArrayView2<'_, f64>) -> Result<Array2<f64>> {
        check_width(self, data)?;
        let mut out = data.to_owned();
        for mut row in out.rows_mut() {
            for (value, fill) in row.iter_mut().zip(&self.statistics) {
                if value.is_nan() {
                    *value = *fill;
                }
            }
        }
        Ok(out)
    }
}
