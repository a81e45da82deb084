//! Showing which bundle the resolver would serve

use anyhow::{Context, Result};
use colored::Colorize;
use potability_lib::resolve;
use serde::Serialize;
use std::path::Path;
use tabled::Tabled;

use crate::output::{format_confidence, format_timestamp, print_json, print_table, print_warning, OutputFormat};

#[derive(Tabled)]
struct StageRow {
    #[tabled(rename = "Stage")]
    stage: String,
    #[tabled(rename = "In")]
    n_in: usize,
    #[tabled(rename = "Out")]
    n_out: usize,
}

#[derive(Serialize)]
struct StageInfo {
    stage: String,
    n_features_in: usize,
    n_features_out: usize,
}

#[derive(Serialize)]
struct BundleInfo {
    profile: String,
    model: String,
    polynomial: bool,
    stages: Vec<StageInfo>,
    variant: Option<String>,
    trained_at: Option<i64>,
    accuracy: Option<f64>,
    evaluated_on_training_data: Option<bool>,
}

pub fn run(models_dir: &Path, format: OutputFormat) -> Result<()> {
    let bundle = resolve(models_dir)
        .with_context(|| format!("Failed to load artifacts from {}", models_dir.display()))?;

    let metadata = bundle.metadata();
    let info = BundleInfo {
        profile: bundle.profile().to_string(),
        model: bundle.model().name().to_string(),
        polynomial: bundle.has_polynomial(),
        stages: bundle
            .pipeline()
            .stages()
            .iter()
            .map(|s| StageInfo {
                stage: s.name().to_string(),
                n_features_in: s.n_features_in(),
                n_features_out: s.n_features_out(),
            })
            .chain(std::iter::once(StageInfo {
                stage: "model".to_string(),
                n_features_in: bundle.model().n_features(),
                n_features_out: 1,
            }))
            .collect(),
        variant: metadata.map(|m| m.variant.clone()),
        trained_at: metadata.map(|m| m.trained_at),
        accuracy: metadata.map(|m| m.accuracy),
        evaluated_on_training_data: metadata.map(|m| m.evaluated_on_training_data),
    };

    match format {
        OutputFormat::Json => print_json(&info)?,
        OutputFormat::Table => {
            println!("{}", "Artifact Bundle".bold());
            println!("{}", "=".repeat(60));
            println!("Directory:  {}", models_dir.display().to_string().cyan());
            println!("Profile:    {}", info.profile.cyan());
            println!("Model:      {}", info.model);
            match (&info.variant, info.trained_at, info.accuracy) {
                (Some(variant), Some(trained_at), Some(accuracy)) => {
                    println!("Variant:    {}", variant);
                    println!("Trained:    {}", format_timestamp(trained_at));
                    println!("Accuracy:   {}", format_confidence(accuracy));
                }
                _ => print_warning("Bundle carries no training metadata"),
            }
            println!();

            let rows = info
                .stages
                .iter()
                .map(|s| StageRow {
                    stage: s.stage.clone(),
                    n_in: s.n_features_in,
                    n_out: s.n_features_out,
                })
                .collect();
            print_table(rows);

            if info.evaluated_on_training_data == Some(true) {
                print_warning("Accuracy was measured on the training data");
            }
        }
    }
    Ok(())
}
