//! Training a bundle from a labelled dataset

use anyhow::{Context, Result};
use colored::Colorize;
use potability_lib::training::{default_data_path, train, Dataset, TrainingVariant};
use potability_lib::StructuredLogger;
use std::path::{Path, PathBuf};
use tabled::Tabled;

use crate::output::{format_confidence, print_json, print_success, print_table, print_warning, OutputFormat};

#[derive(Tabled)]
struct CandidateRow {
    #[tabled(rename = "Model")]
    model: String,
    #[tabled(rename = "Accuracy")]
    accuracy: String,
    #[tabled(rename = "Selected")]
    selected: String,
}

pub fn run(
    models_dir: &Path,
    variant: TrainingVariant,
    data: Option<PathBuf>,
    format: OutputFormat,
) -> Result<()> {
    let data_path = data.unwrap_or_else(default_data_path);
    let dataset = Dataset::load_csv(&data_path)
        .with_context(|| format!("Failed to load dataset from {}", data_path.display()))?;

    let report = train(variant, &dataset, models_dir)
        .with_context(|| format!("Training variant {} failed", variant))?;

    StructuredLogger::new("potability-cli").log_artifacts_written(
        report.profile.as_str(),
        variant.as_str(),
        report.accuracy,
        &models_dir.display().to_string(),
    );

    match format {
        OutputFormat::Json => print_json(&report)?,
        OutputFormat::Table => {
            println!("{}", format!("Training variant: {}", variant).bold());
            println!("{}", "=".repeat(60));
            println!(
                "Rows: {} train / {} evaluated, {} features after preprocessing",
                report.train_rows, report.test_rows, report.features_out
            );
            println!();

            let rows = report
                .candidates
                .iter()
                .map(|c| CandidateRow {
                    model: c.model.clone(),
                    accuracy: format_confidence(c.accuracy),
                    selected: if c.selected { "*".green().to_string() } else { String::new() },
                })
                .collect();
            print_table(rows);
            println!();
            println!("{}", report.report);
            println!();

            if report.evaluated_on_training_data {
                print_warning("Accuracy was measured on the training data");
            }
            print_success(&format!(
                "Wrote {} profile to {}",
                report.profile,
                models_dir.display()
            ));
        }
    }
    Ok(())
}
