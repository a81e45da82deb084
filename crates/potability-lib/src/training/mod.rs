//! Training variants that produce artifact bundles
//!
//! Every variant follows the same steps: fit the preprocessing pipeline on
//! the full dataset, optionally hold out a seeded test split, train the
//! candidate models, keep the most accurate one and write it together with
//! the fitted stages under the variant's profile.

mod dataset;
mod evaluation;

pub use dataset::{default_data_path, take_rows, Dataset, Split, DEFAULT_DATA_PATHS, SPLIT_SEED};
pub use evaluation::{ClassScores, ClassificationReport};

use crate::artifacts::{ArtifactPaths, ArtifactWriter, ModelArtifact, ModelMetadata, Profile};
use crate::classifier::{Classifier, GaussianNaiveBayes, LogisticRegression, ModelSpec, SavedModel};
use crate::error::{PotabilityError, Result};
use crate::models::Potability;
use crate::preprocessing::{FittedPipeline, ImputeStrategy, PipelineOptions};
use ndarray::{Array2, ArrayView2};
use serde::Serialize;
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use tracing::{debug, info};

/// How a bundle is produced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TrainingVariant {
    /// Fit on every row and report training accuracy; writes the deep profile
    Demo,
    Advanced,
    Deep,
}

impl TrainingVariant {
    pub const ALL: [TrainingVariant; 3] = [
        TrainingVariant::Demo,
        TrainingVariant::Advanced,
        TrainingVariant::Deep,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            TrainingVariant::Demo => "demo",
            TrainingVariant::Advanced => "advanced",
            TrainingVariant::Deep => "deep",
        }
    }

    /// Profile whose files this variant writes
    pub fn profile(self) -> Profile {
        match self {
            TrainingVariant::Demo | TrainingVariant::Deep => Profile::Deep,
            TrainingVariant::Advanced => Profile::Advanced,
        }
    }

    /// Held-out share of rows, `None` when evaluating on the training data
    pub fn test_fraction(self) -> Option<f64> {
        match self {
            TrainingVariant::Demo => None,
            TrainingVariant::Advanced => Some(0.15),
            TrainingVariant::Deep => Some(0.10),
        }
    }

    pub fn pipeline_options(self) -> PipelineOptions {
        PipelineOptions {
            impute: ImputeStrategy::Median,
            polynomial: matches!(self, TrainingVariant::Deep),
        }
    }

    pub fn candidates(self) -> Vec<ModelSpec> {
        match self {
            TrainingVariant::Demo => vec![ModelSpec::Logistic(LogisticRegression::new())],
            TrainingVariant::Advanced => vec![
                ModelSpec::Logistic(LogisticRegression::new()),
                ModelSpec::NaiveBayes(GaussianNaiveBayes::new()),
                ModelSpec::SoftVoting(vec![
                    ModelSpec::Logistic(LogisticRegression::new()),
                    ModelSpec::NaiveBayes(GaussianNaiveBayes::new()),
                ]),
            ],
            TrainingVariant::Deep => vec![
                ModelSpec::Logistic(LogisticRegression::new().with_alpha(0.05)),
                ModelSpec::NaiveBayes(GaussianNaiveBayes::new()),
            ],
        }
    }
}

impl fmt::Display for TrainingVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TrainingVariant {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|v| v.as_str() == s)
            .ok_or_else(|| format!("unknown training variant `{}`", s))
    }
}

/// Accuracy of one candidate on the evaluation rows
#[derive(Debug, Clone, Serialize)]
pub struct CandidateScore {
    pub model: String,
    pub accuracy: f64,
    /// The candidate whose model was written
    pub selected: bool,
}

/// Outcome of a training run
#[derive(Debug, Clone, Serialize)]
pub struct TrainingReport {
    pub variant: TrainingVariant,
    pub profile: Profile,
    pub model: String,
    pub accuracy: f64,
    pub evaluated_on_training_data: bool,
    pub train_rows: usize,
    pub test_rows: usize,
    pub features_out: usize,
    pub candidates: Vec<CandidateScore>,
    pub report: ClassificationReport,
    #[serde(skip)]
    pub paths: ArtifactPaths,
}

/// Train `variant` on `dataset` and write the winning bundle to `models_dir`
pub fn train(variant: TrainingVariant, dataset: &Dataset, models_dir: &Path) -> Result<TrainingReport> {
    info!(variant = %variant, rows = dataset.len(), "Starting training run");

    let (pipeline, transformed) = FittedPipeline::fit(dataset.features(), variant.pipeline_options())?;
    debug!(features_out = pipeline.n_features_out(), "Pipeline fitted");

    let (train_x, train_y, test_x, test_y) = match variant.test_fraction() {
        Some(fraction) => {
            let split = Split::shuffled(dataset.len(), fraction, SPLIT_SEED)?;
            let (train_x, train_y) = take_rows(transformed.view(), dataset.labels(), &split.train);
            let (test_x, test_y) = take_rows(transformed.view(), dataset.labels(), &split.test);
            (train_x, train_y, test_x, test_y)
        }
        None => (
            transformed.clone(),
            dataset.labels().to_vec(),
            transformed,
            dataset.labels().to_vec(),
        ),
    };

    let (best, candidates) = select_best(&variant.candidates(), &train_x, &train_y, test_x.view(), &test_y)?;
    let predicted = best.predict(test_x.view())?;
    let report = ClassificationReport::compute(&test_y, &predicted);

    let metadata = ModelMetadata {
        variant: variant.to_string(),
        trained_at: chrono::Utc::now().timestamp(),
        accuracy: report.accuracy,
        evaluated_on_training_data: variant.test_fraction().is_none(),
    };
    let model_name = best.name().to_string();
    let features_out = pipeline.n_features_out();
    let artifact = ModelArtifact {
        model: best,
        metadata,
    };

    let writer = ArtifactWriter::new(models_dir)?;
    let paths = writer.write(variant.profile(), &artifact, &pipeline)?;

    info!(
        variant = %variant,
        profile = %variant.profile(),
        model = %model_name,
        accuracy = report.accuracy,
        "Training run complete"
    );

    Ok(TrainingReport {
        variant,
        profile: variant.profile(),
        model: model_name,
        accuracy: report.accuracy,
        evaluated_on_training_data: artifact.metadata.evaluated_on_training_data,
        train_rows: train_y.len(),
        test_rows: test_y.len(),
        features_out,
        candidates,
        report,
        paths,
    })
}

/// Fit every candidate and keep the most accurate; ties keep the earlier one
fn select_best(
    specs: &[ModelSpec],
    train_x: &Array2<f64>,
    train_y: &[Potability],
    test_x: ArrayView2<'_, f64>,
    test_y: &[Potability],
) -> Result<(SavedModel, Vec<CandidateScore>)> {
    let mut best: Option<(usize, SavedModel, f64)> = None;
    let mut scores = Vec::with_capacity(specs.len());

    for (index, spec) in specs.iter().enumerate() {
        let model = spec.fit(train_x.view(), train_y)?;
        let predicted = model.predict(test_x)?;
        let accuracy = ClassificationReport::compute(test_y, &predicted).accuracy;
        info!(model = %spec.name(), accuracy, "Candidate evaluated");
        scores.push(CandidateScore {
            model: spec.name(),
            accuracy,
            selected: false,
        });

        if best.as_ref().map_or(true, |(_, _, top)| accuracy > *top) {
            best = Some((index, model, accuracy));
        }
    }

    let (index, model, _) = best.ok_or(PotabilityError::EmptyData("candidate models"))?;
    scores[index].selected = true;
    Ok((model, scores))
}
