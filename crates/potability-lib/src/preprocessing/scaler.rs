//! Standardization to zero mean and unit variance

use super::{check_width, FittedStage};
use crate::error::{PotabilityError, Result};
use ndarray::{Array2, ArrayView2, Axis};
use serde::{Deserialize, Serialize};

/// Scaler with per-column mean and population standard deviation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FittedScaler {
    mean: Vec<f64>,
    /// Divisor per column; 1.0 where the column was constant
    scale: Vec<f64>,
}

impl FittedScaler {
    pub fn fit(data: ArrayView2<'_, f64>) -> Result<Self> {
        let n = data.nrows();
        if n == 0 {
            return Err(PotabilityError::EmptyData("scaler"));
        }

        let mut mean = Vec::with_capacity(data.ncols());
        let mut scale = Vec::with_capacity(data.ncols());
        for column in data.axis_iter(Axis(1)) {
            let m = column.sum() / n as f64;
            let var = column.iter().map(|v| (v - m).powi(2)).sum::<f64>() / n as f64;
            let std = var.sqrt();
            mean.push(m);
            scale.push(if std > 0.0 && std.is_finite() { std } else { 1.0 });
        }

        Ok(Self { mean, scale })
    }

    pub fn mean(&self) -> &[f64] {
        &self.mean
    }

    pub fn scale(&self) -> &[f64] {
        &self.scale
    }

    pub(crate) fn validate(&self) -> std::result::Result<(), String> {
        if self.mean.len() != self.scale.len() {
            return Err(format!(
                "scaler has {} means but {} scales",
                self.mean.len(),
                self.scale.len()
            ));
        }
        if let Some((column, s)) = self
            .scale
            .iter()
            .enumerate()
            .find(|(_, s)| !(s.is_finite() && **s > 0.0))
        {
            return Err(format!("scaler column {} has divisor {}", column, s));
        }
        if let Some(column) = self.mean.iter().position(|m| !m.is_finite()) {
            return Err(format!("scaler column {} has a non-finite mean", column));
        }
        Ok(())
    }
}

impl FittedStage for FittedScaler {
    fn name(&self) -> &'static str {
        "scaler"
    }

    fn n_features_in(&self) -> usize {
        self.mean.len()
    }

    fn n_features_out(&self) -> usize {
        self.mean.len()
    }

    fn transform(&self, data: ArrayView2<'_, f64>) -> Result<Array2<f64>> {
        check_width(self, data)?;
        let mut out = data.to_owned();
        for mut row in out.rows_mut() {
            for ((value, m), s) in row.iter_mut().zip(&self.mean).zip(&self.scale) {
                *value = (*value - m) / s;
            }
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_fit_population_std() {
        let data = array![[1.0, 10.0], [3.0, 10.0]];
        let scaler = FittedScaler::fit(data.view()).unwrap();
        assert_eq!(scaler.mean(), &[2.0, 10.0]);
        assert_eq!(scaler.scale(), &[1.0, 1.0]);
    }

    #[test]
    fn test_transform_standardizes() {
        let data = array![[0.0], [2.0], [4.0], [6.0]];
        let scaler = FittedScaler::fit(data.view()).unwrap();
        let out = scaler.transform(data.view()).unwrap();
        let mean = out.sum() / 4.0;
        let var = out.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / 4.0;
        assert!(mean.abs() < 1e-12);
        assert!((var - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_constant_column_is_centered_not_divided() {
        let data = array![[5.0], [5.0]];
        let scaler = FittedScaler::fit(data.view()).unwrap();
        let out = scaler.transform(array![[7.0]].view()).unwrap();
        assert_eq!(out[[0, 0]], 2.0);
    }

    #[test]
    fn test_validate_rejects_unusable_divisors() {
        let scaler = FittedScaler::fit(array![[1.0, 2.0], [3.0, 5.0]].view()).unwrap();
        assert!(scaler.validate().is_ok());

        for bad in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            let mut tampered = scaler.clone();
            tampered.scale[1] = bad;
            let err = tampered.validate().unwrap_err();
            assert!(err.contains("column 1"), "{}", err);
        }

        let mut tampered = scaler.clone();
        tampered.mean[0] = f64::NAN;
        assert!(tampered.validate().is_err());
    }

    #[test]
    fn test_width_mismatch() {
        let scaler = FittedScaler::fit(array![[1.0, 2.0]].view()).unwrap();
        assert!(scaler.transform(array![[1.0]].view()).is_err());
    }
}
