//! Preprocessing pipeline
//!
//! Stages always run in the order imputation, optional polynomial
//! expansion, scaling. The expander never sees NaN and the scaler's
//! statistics describe the space it is fed.

mod imputer;
mod polynomial;
mod scaler;

pub use imputer::{FittedImputer, ImputeStrategy};
pub use polynomial::FittedPolynomial;
pub use scaler::FittedScaler;

use crate::error::{Result, SchemaMismatch};
use ndarray::{Array2, ArrayView2};

/// A fitted, immutable preprocessing stage
pub trait FittedStage: Send + Sync {
    /// Stage name used in error messages
    fn name(&self) -> &'static str;

    /// Width the stage was fitted on
    fn n_features_in(&self) -> usize;

    fn n_features_out(&self) -> usize;

    /// Apply learned parameters to new data
    fn transform(&self, data: ArrayView2<'_, f64>) -> Result<Array2<f64>>;
}

pub(crate) fn check_width(stage: &dyn FittedStage, data: ArrayView2<'_, f64>) -> Result<()> {
    if data.ncols() != stage.n_features_in() {
        return Err(SchemaMismatch::Width {
            stage: stage.name(),
            expected: stage.n_features_in(),
            got: data.ncols(),
        }
        .into());
    }
    Ok(())
}

/// Options chosen by a training variant
#[derive(Debug, Clone, Copy, Default)]
pub struct PipelineOptions {
    pub impute: ImputeStrategy,
    pub polynomial: bool,
}

/// The fitted stages of one pipeline
#[derive(Debug, Clone, PartialEq)]
pub struct FittedPipeline {
    pub imputer: FittedImputer,
    pub poly: Option<FittedPolynomial>,
    pub scaler: FittedScaler,
}

impl FittedPipeline {
    /// Fit every stage on `raw` and return the stages plus the transformed
    /// training matrix.
    pub fn fit(raw: ArrayView2<'_, f64>, options: PipelineOptions) -> Result<(Self, Array2<f64>)> {
        let imputer = FittedImputer::fit(raw, options.impute)?;
        let imputed = imputer.transform(raw)?;

        let poly = if options.polynomial {
            Some(FittedPolynomial::fit(imputed.view())?)
        } else {
            None
        };
        let expanded = match &poly {
            Some(p) => p.transform(imputed.view())?,
            None => imputed,
        };

        let scaler = FittedScaler::fit(expanded.view())?;
        let transformed = scaler.transform(expanded.view())?;

        tracing::debug!(
            rows = raw.nrows(),
            width_in = raw.ncols(),
            width_out = transformed.ncols(),
            polynomial = poly.is_some(),
            "Fitted preprocessing pipeline"
        );

        Ok((
            Self {
                imputer,
                poly,
                scaler,
            },
            transformed,
        ))
    }

    /// Replay the fitted stages on new data
    pub fn transform(&self, raw: ArrayView2<'_, f64>) -> Result<Array2<f64>> {
        transform(raw, &self.imputer, self.poly.as_ref(), &self.scaler)
    }

    /// Stages in application order: two or three
    pub fn stages(&self) -> Vec<&dyn FittedStage> {
        let mut stages: Vec<&dyn FittedStage> = vec![&self.imputer];
        if let Some(poly) = &self.poly {
            stages.push(poly);
        }
        stages.push(&self.scaler);
        stages
    }

    pub fn n_features_in(&self) -> usize {
        self.imputer.n_features_in()
    }

    pub fn n_features_out(&self) -> usize {
        self.scaler.n_features_out()
    }

    /// Check that each stage's output width feeds the next stage
    pub fn validate(&self) -> std::result::Result<(), String> {
        if let Some(poly) = &self.poly {
            poly.validate()?;
        }
        self.scaler.validate()?;
        for pair in self.stages().windows(2) {
            let (from, to) = (pair[0], pair[1]);
            if from.n_features_out() != to.n_features_in() {
                return Err(format!(
                    "{} produces {} columns but {} expects {}",
                    from.name(),
                    from.n_features_out(),
                    to.name(),
                    to.n_features_in()
                ));
            }
        }
        Ok(())
    }
}

/// Replay imputation, optional expansion and scaling with fitted statistics
pub fn transform(
    raw: ArrayView2<'_, f64>,
    imputer: &FittedImputer,
    poly: Option<&FittedPolynomial>,
    scaler: &FittedScaler,
) -> Result<Array2<f64>> {
    let imputed = imputer.transform(raw)?;
    let expanded = match poly {
        Some(p) => p.transform(imputed.view())?,
        None => imputed,
    };
    scaler.transform(expanded.view())
}
