//! CLI integration tests

use std::fmt::Write as _;
use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

const HEADER: &str =
    "ph,Hardness,Solids,Chloramines,Sulfate,Conductivity,Organic_carbon,Trihalomethanes,Turbidity";

fn potability(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_potability"))
        .args(args)
        .env_remove("POTABILITY_MODELS_DIR")
        .output()
        .expect("Failed to execute command")
}

/// Labelled CSV: potable when pH is close to neutral
fn write_training_csv(path: &Path, rows: usize) {
    let mut csv = format!("{},Potability\n", HEADER);
    for i in 0..rows {
        let t = i as f64 / rows as f64;
        let ph = 4.0 + 6.0 * t;
        let sulfate = if i % 7 == 0 {
            String::new()
        } else {
            format!("{:.2}", 320.0 + (i % 5) as f64)
        };
        let label = u8::from((6.5..=8.5).contains(&ph));
        writeln!(
            csv,
            "{:.3},{:.1},{:.1},7.0,{},{:.1},14.0,66.0,{:.2},{}",
            ph,
            200.0 + (i % 3) as f64,
            20000.0 - 300.0 * t,
            sulfate,
            420.0 + (i % 4) as f64,
            3.5 + (i % 6) as f64 * 0.1,
            label
        )
        .unwrap();
    }
    std::fs::write(path, csv).unwrap();
}

fn trained_models_dir(variant: &str) -> TempDir {
    let dir = TempDir::new().unwrap();
    let data = dir.path().join("water.csv");
    write_training_csv(&data, 80);
    let models = dir.path().join("models");

    let output = potability(&[
        "--models-dir",
        models.to_str().unwrap(),
        "train",
        "--variant",
        variant,
        "--data",
        data.to_str().unwrap(),
    ]);
    assert!(
        output.status.success(),
        "training should succeed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    dir
}

/// Test that the CLI shows help
#[test]
fn test_cli_help() {
    let output = potability(&["--help"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "CLI help should succeed");
    assert!(stdout.contains("predict"), "Should show predict command");
    assert!(stdout.contains("train"), "Should show train command");
    assert!(stdout.contains("inspect"), "Should show inspect command");
    assert!(stdout.contains("--models-dir"), "Should show models dir option");
}

/// Test that the CLI shows version
#[test]
fn test_cli_version() {
    let output = potability(&["--version"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "CLI version should succeed");
    assert!(stdout.contains("potability"), "Should show binary name");
}

#[test]
fn test_predict_without_artifacts_fails() {
    let dir = TempDir::new().unwrap();
    let output = potability(&["--models-dir", dir.path().to_str().unwrap(), "predict"]);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("no usable artifact bundle"), "{}", stderr);
}

#[test]
fn test_train_then_predict_example_row() {
    let dir = trained_models_dir("advanced");
    let models = dir.path().join("models");

    let output = potability(&[
        "--models-dir",
        models.to_str().unwrap(),
        "--format",
        "json",
        "predict",
    ]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let records: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let records = records.as_array().unwrap();
    assert_eq!(records.len(), 1);
    let confidence = records[0]["confidence"].as_f64().unwrap();
    assert!((0.0..=1.0).contains(&confidence));
    let expected = if confidence > 0.5 { 1 } else { 0 };
    assert_eq!(records[0]["prediction"], expected);
}

#[test]
fn test_predict_batch_keeps_row_order() {
    let dir = trained_models_dir("deep");
    let models = dir.path().join("models");
    let batch = dir.path().join("batch.csv");
    std::fs::write(
        &batch,
        "Turbidity,Trihalomethanes,Organic_carbon,Conductivity,Sulfate,Chloramines,Solids,Hardness,ph\n\
         4.0,66.0,14.0,420.0,320.0,7.0,20000.0,200.0,7.5\n\
         4.0,66.0,14.0,420.0,,7.0,20000.0,200.0,4.1\n\
         4.0,66.0,14.0,420.0,320.0,7.0,20000.0,200.0,9.9\n",
    )
    .unwrap();

    let output = potability(&[
        "--models-dir",
        models.to_str().unwrap(),
        "-f",
        "json",
        "predict",
        "--input-csv",
        batch.to_str().unwrap(),
    ]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let records: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let rows: Vec<u64> = records
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["row"].as_u64().unwrap())
        .collect();
    assert_eq!(rows, vec![0, 1, 2]);
}

#[test]
fn test_predict_rejects_eight_features() {
    let dir = trained_models_dir("advanced");
    let models = dir.path().join("models");

    let output = potability(&[
        "--models-dir",
        models.to_str().unwrap(),
        "predict",
        "--features",
        "7.0",
        "200.0",
        "20000.0",
        "7.0",
        "300.0",
        "400.0",
        "10.0",
        "60.0",
    ]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("expects 9 columns, got 8"), "{}", stderr);
}

#[test]
fn test_inspect_reports_resolved_profile() {
    let dir = trained_models_dir("deep");
    let models = dir.path().join("models");

    let output = potability(&["--models-dir", models.to_str().unwrap(), "-f", "json", "inspect"]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let info: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(info["profile"], "deep");
    assert_eq!(info["polynomial"], true);
    assert_eq!(info["variant"], "deep");
    assert_eq!(info["stages"].as_array().unwrap().len(), 4);
}
