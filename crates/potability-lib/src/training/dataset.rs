//! Labelled training data and the train/test split

use crate::error::{PotabilityError, Result, SchemaMismatch};
use crate::models::Potability;
use crate::schema::{locate_columns, parse_cell, FEATURE_NAMES, NUM_FEATURES, TARGET_COLUMN};
use ndarray::{Array2, ArrayView2, Axis};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::info;

/// Dataset locations tried in order when no path is given
pub const DEFAULT_DATA_PATHS: [&str; 2] = [
    "data/cleaned/cleaned water potability.csv",
    "data/kaggle/water potability.csv",
];

/// Seed for every shuffle in training
pub const SPLIT_SEED: u64 = 42;

/// First existing default dataset path, or the preferred one when none exists
pub fn default_data_path() -> PathBuf {
    DEFAULT_DATA_PATHS
        .iter()
        .map(PathBuf::from)
        .find(|p| p.exists())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_PATHS[0]))
}

/// Raw feature matrix in schema order plus one label per row
#[derive(Debug, Clone)]
pub struct Dataset {
    features: Array2<f64>,
    labels: Vec<Potability>,
}

impl Dataset {
    pub fn new(features: Array2<f64>, labels: Vec<Potability>) -> Result<Self> {
        if features.ncols() != NUM_FEATURES {
            return Err(SchemaMismatch::Width {
                stage: "dataset",
                expected: NUM_FEATURES,
                got: features.ncols(),
            }
            .into());
        }
        if features.nrows() != labels.len() {
            return Err(PotabilityError::InvalidData(format!(
                "{} feature rows but {} labels",
                features.nrows(),
                labels.len()
            )));
        }
        Ok(Self { features, labels })
    }

    pub fn load_csv(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|e| PotabilityError::io(path, e))?;
        let dataset = Self::from_reader(file)?;
        let [not_potable, potable] = dataset.class_counts();
        info!(
            path = %path.display(),
            rows = dataset.len(),
            potable,
            not_potable,
            "Loaded training dataset"
        );
        Ok(dataset)
    }

    /// Read a CSV with the nine feature columns and a `Potability` column.
    /// Features may be missing; labels may not.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut rdr = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);
        let headers = rdr.headers()?.clone();
        let header_refs: Vec<&str> = headers.iter().collect();
        let positions = locate_columns(&header_refs, &[TARGET_COLUMN])?;
        let target = header_refs
            .iter()
            .position(|h| *h == TARGET_COLUMN)
            .ok_or_else(|| SchemaMismatch::MissingColumn(TARGET_COLUMN.to_string()))?;

        let mut values = Vec::new();
        let mut labels = Vec::new();
        for (row, record) in rdr.records().enumerate() {
            let record = record?;
            for (name, &idx) in FEATURE_NAMES.iter().zip(positions.iter()) {
                values.push(parse_cell(&record[idx], row, name)?);
            }
            labels.push(parse_label(&record[target], row)?);
        }

        if labels.is_empty() {
            return Err(PotabilityError::EmptyData("dataset"));
        }
        let features = Array2::from_shape_vec((labels.len(), NUM_FEATURES), values)
            .map_err(|e| PotabilityError::InvalidData(e.to_string()))?;
        Self::new(features, labels)
    }

    pub fn features(&self) -> ArrayView2<'_, f64> {
        self.features.view()
    }

    pub fn labels(&self) -> &[Potability] {
        &self.labels
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Row counts as `[not potable, potable]`
    pub fn class_counts(&self) -> [usize; 2] {
        let potable = self.labels.iter().filter(|l| **l == Potability::Potable).count();
        [self.labels.len() - potable, potable]
    }
}

fn parse_label(raw: &str, row: usize) -> Result<Potability> {
    let invalid = || SchemaMismatch::NotNumeric {
        row,
        column: TARGET_COLUMN.to_string(),
        value: raw.to_string(),
    };
    let value: f64 = raw.trim().parse().map_err(|_| invalid())?;
    if value == 0.0 {
        Ok(Potability::NotPotable)
    } else if value == 1.0 {
        Ok(Potability::Potable)
    } else {
        Err(invalid().into())
    }
}

/// Row indices of a shuffled train/test split
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Split {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

impl Split {
    /// Shuffle `0..n_rows` with `seed` and hold out `ceil(n_rows * test_fraction)` rows
    pub fn shuffled(n_rows: usize, test_fraction: f64, seed: u64) -> Result<Self> {
        if !(0.0..1.0).contains(&test_fraction) || test_fraction == 0.0 {
            return Err(PotabilityError::InvalidData(format!(
                "test fraction must be in (0, 1), got {}",
                test_fraction
            )));
        }
        let n_test = (n_rows as f64 * test_fraction).ceil() as usize;
        if n_test == 0 || n_test >= n_rows {
            return Err(PotabilityError::InvalidData(format!(
                "cannot hold out {} of {} rows",
                n_test, n_rows
            )));
        }

        let mut indices: Vec<usize> = (0..n_rows).collect();
        let mut rng = StdRng::seed_from_u64(seed);
        indices.shuffle(&mut rng);
        let train = indices.split_off(n_test);
        Ok(Self {
            train,
            test: indices,
        })
    }
}

/// Select rows of `x` and the matching labels
pub fn take_rows(
    x: ArrayView2<'_, f64>,
    y: &[Potability],
    indices: &[usize],
) -> (Array2<f64>, Vec<Potability>) {
    let rows = x.select(Axis(0), indices);
    let labels = indices.iter().map(|&i| y[i]).collect();
    (rows, labels)
}
