//! Scoring samples with the best available bundle

use anyhow::{Context, Result};
use potability_lib::schema::{read_feature_csv, rows_to_matrix};
use potability_lib::{resolve, FeatureRow, PotabilityPredictor, Prediction};
use serde::Serialize;
use std::fs::File;
use std::path::Path;
use tabled::Tabled;
use tracing::debug;

use crate::output::{
    color_confidence, color_result, print_info, print_json, print_table, OutputFormat,
};

/// Sample scored when neither a CSV nor feature values are given
pub const EXAMPLE_FEATURES: [f64; 9] = [7.0, 200.0, 20000.0, 7.0, 300.0, 400.0, 10.0, 60.0, 4.0];

#[derive(Tabled)]
struct PredictionRow {
    #[tabled(rename = "Row")]
    row: usize,
    #[tabled(rename = "Prediction")]
    prediction: u8,
    #[tabled(rename = "Result")]
    result: String,
    #[tabled(rename = "P(potable)")]
    confidence: String,
}

#[derive(Serialize)]
struct PredictionRecord {
    row: usize,
    prediction: u8,
    result: &'static str,
    confidence: f64,
}

/// Score a CSV batch, explicit feature values, or the example sample
pub fn run(
    models_dir: &Path,
    input_csv: Option<&Path>,
    features: Option<&[f64]>,
    format: OutputFormat,
) -> Result<()> {
    let bundle = resolve(models_dir)
        .with_context(|| format!("Failed to load artifacts from {}", models_dir.display()))?;
    debug!(profile = %bundle.profile(), model = %bundle.model().name(), "Bundle resolved");
    let profile = bundle.profile();
    let predictor = PotabilityPredictor::new(bundle);

    let matrix = match input_csv {
        Some(path) => {
            let file = File::open(path)
                .with_context(|| format!("Failed to open {}", path.display()))?;
            read_feature_csv(file)
                .with_context(|| format!("Failed to read features from {}", path.display()))?
        }
        None => {
            let values = features.unwrap_or(&EXAMPLE_FEATURES);
            let row = FeatureRow::from_values(values).context("Invalid feature values")?;
            rows_to_matrix(&[row])
        }
    };

    let predictions = predictor.predict(matrix.view())?;
    render(&predictor, &predictions, format)?;

    if matches!(format, OutputFormat::Table) {
        print_info(&format!(
            "Scored {} sample(s) with the {} bundle",
            predictions.len(),
            profile
        ));
    }
    Ok(())
}

fn render(predictor: &PotabilityPredictor, predictions: &[Prediction], format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            let records: Vec<PredictionRecord> = predictions
                .iter()
                .enumerate()
                .map(|(row, p)| PredictionRecord {
                    row,
                    prediction: p.label.label(),
                    result: p.label.as_str(),
                    confidence: p.confidence,
                })
                .collect();
            print_json(&records)
        }
        OutputFormat::Table => {
            let formatter = predictor.output_formatter();
            let rows = predictions
                .iter()
                .enumerate()
                .map(|(row, p)| PredictionRow {
                    row,
                    prediction: p.label.label(),
                    result: color_result(p.label),
                    confidence: color_confidence(p.confidence, formatter.is_borderline(p)),
                })
                .collect();
            print_table(rows);
            Ok(())
        }
    }
}
