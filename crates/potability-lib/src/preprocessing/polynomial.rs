//! Degree-2 polynomial feature expansion
//!
//! For inputs `[a, b]` the expanded row is `[a, b, a^2, ab, b^2]`: the
//! original features first, then every product `xi * xj` with `i <= j` in
//! lexicographic order. No bias column.

use super::{check_width, FittedStage};
use crate::error::{PotabilityError, Result};
use ndarray::{Array2, ArrayView2};
use serde::{Deserialize, Serialize};

/// Expander holding the fixed mapping from input columns to output terms
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FittedPolynomial {
    n_features_in: usize,
    /// Each output column is the product of the listed input columns
    terms: Vec<Vec<usize>>,
}

impl FittedPolynomial {
    /// Build the degree-2 mapping for the width of `data`
    pub fn fit(data: ArrayView2<'_, f64>) -> Result<Self> {
        if data.nrows() == 0 {
            return Err(PotabilityError::EmptyData("polynomial expander"));
        }
        Self::for_width(data.ncols())
    }

    /// Mapping for `n` input columns. Output width is `n + n(n+1)/2`.
    pub fn for_width(n: usize) -> Result<Self> {
        if n == 0 {
            return Err(PotabilityError::EmptyData("polynomial expander"));
        }
        let mut terms: Vec<Vec<usize>> = (0..n).map(|i| vec![i]).collect();
        for i in 0..n {
            for j in i..n {
                terms.push(vec![i, j]);
            }
        }
        Ok(Self {
            n_features_in: n,
            terms,
        })
    }

    pub fn terms(&self) -> &[Vec<usize>] {
        &self.terms
    }

    /// Check that every term only references input columns
    pub(crate) fn validate(&self) -> std::result::Result<(), String> {
        match self
            .terms
            .iter()
            .flatten()
            .find(|&&idx| idx >= self.n_features_in)
        {
            Some(idx) => Err(format!(
                "polynomial term references column {} of {}",
                idx, self.n_features_in
            )),
            None => Ok(()),
        }
    }
}

impl FittedStage for FittedPolynomial {
    fn name(&self) -> &'static str {
        "polynomial expander"
    }

    fn n_features_in(&self) -> usize {
        self.n_features_in
    }

    fn n_features_out(&self) -> usize {
        self.terms.len()
    }

    fn transform(&self, data: ArrayView2<'_, f64>) -> Result<Array2<f64>> {
        check_width(self, data)?;
        let mut out = Array2::zeros((data.nrows(), self.terms.len()));
        for (input, mut output) in data.rows().into_iter().zip(out.rows_mut()) {
            for (cell, term) in output.iter_mut().zip(&self.terms) {
                *cell = term.iter().map(|&idx| input[idx]).product();
            }
        }
        Ok(out)
    }
}
