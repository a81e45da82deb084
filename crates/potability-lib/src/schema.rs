//! Feature schema for water-quality measurements
//!
//! Every fitted stage is trained on columns in [`FEATURE_NAMES`] order.
//! Input arriving in any other shape (positional values, named JSON fields,
//! CSV with shuffled headers) is mapped onto that order here, before it
//! reaches the preprocessing pipeline.

use crate::error::{PotabilityError, Result, SchemaMismatch};
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::io::Read;

/// Number of raw input features
pub const NUM_FEATURES: usize = 9;

/// Canonical column names, in training order
pub const FEATURE_NAMES: [&str; NUM_FEATURES] = [
    "ph",
    "Hardness",
    "Solids",
    "Chloramines",
    "Sulfate",
    "Conductivity",
    "Organic_carbon",
    "Trihalomethanes",
    "Turbidity",
];

/// Target column of the training dataset
pub const TARGET_COLUMN: &str = "Potability";

/// One water sample. `NaN` marks a missing measurement.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureRow {
    pub ph: f64,
    #[serde(rename = "Hardness")]
    pub hardness: f64,
    #[serde(rename = "Solids")]
    pub solids: f64,
    #[serde(rename = "Chloramines")]
    pub chloramines: f64,
    #[serde(rename = "Sulfate")]
    pub sulfate: f64,
    #[serde(rename = "Conductivity")]
    pub conductivity: f64,
    #[serde(rename = "Organic_carbon")]
    pub organic_carbon: f64,
    #[serde(rename = "Trihalomethanes")]
    pub trihalomethanes: f64,
    #[serde(rename = "Turbidity")]
    pub turbidity: f64,
}

impl FeatureRow {
    /// Build a row from positional values in canonical order
    pub fn from_values(values: &[f64]) -> std::result::Result<Self, SchemaMismatch> {
        let v: [f64; NUM_FEATURES] = values.try_into().map_err(|_| SchemaMismatch::Width {
            stage: "feature schema",
            expected: NUM_FEATURES,
            got: values.len(),
        })?;
        Ok(Self::from_array(v))
    }

    /// Build a row from a JSON object keyed by column name.
    ///
    /// `null` is accepted as a missing value; unknown, absent or non-numeric
    /// fields are rejected with the offending column name.
    pub fn from_named(fields: &Map<String, Value>) -> std::result::Result<Self, SchemaMismatch> {
        if let Some(unknown) = fields.keys().find(|k| !FEATURE_NAMES.contains(&k.as_str())) {
            return Err(SchemaMismatch::UnknownColumn(unknown.clone()));
        }

        let mut values = [f64::NAN; NUM_FEATURES];
        for (slot, name) in values.iter_mut().zip(FEATURE_NAMES) {
            *slot = match fields.get(name) {
                None => return Err(SchemaMismatch::MissingColumn(name.to_string())),
                Some(Value::Null) => f64::NAN,
                Some(Value::Number(n)) => n.as_f64().unwrap_or(f64::NAN),
                Some(other) => {
                    return Err(SchemaMismatch::NotNumeric {
                        row: 0,
                        column: name.to_string(),
                        value: other.to_string(),
                    })
                }
            };
        }
        Ok(Self::from_array(values))
    }

    fn from_array(v: [f64; NUM_FEATURES]) -> Self {
        Self {
            ph: v[0],
            hardness: v[1],
            solids: v[2],
            chloramines: v[3],
            sulfate: v[4],
            conductivity: v[5],
            organic_carbon: v[6],
            trihalomethanes: v[7],
            turbidity: v[8],
        }
    }

    /// Values in canonical order
    pub fn to_array(&self) -> [f64; NUM_FEATURES] {
        [
            self.ph,
            self.hardness,
            self.solids,
            self.chloramines,
            self.sulfate,
            self.conductivity,
            self.organic_carbon,
            self.trihalomethanes,
            self.turbidity,
        ]
    }
}

/// Stack rows into a feature matrix
pub fn rows_to_matrix(rows: &[FeatureRow]) -> Array2<f64> {
    let mut matrix = Array2::from_elem((rows.len(), NUM_FEATURES), f64::NAN);
    for (mut out, row) in matrix.rows_mut().into_iter().zip(rows) {
        for (cell, value) in out.iter_mut().zip(row.to_array()) {
            *cell = value;
        }
    }
    matrix
}

/// Map a header onto canonical order.
///
/// Returns, for each entry of [`FEATURE_NAMES`], the index of that column in
/// `headers`. Columns listed in `allowed_extra` are skipped; any other
/// unknown column is an error.
pub fn locate_columns(
    headers: &[&str],
    allowed_extra: &[&str],
) -> std::result::Result<[usize; NUM_FEATURES], SchemaMismatch> {
    let mut positions: [Option<usize>; NUM_FEATURES] = [None; NUM_FEATURES];

    for (idx, header) in headers.iter().enumerate() {
        let header = header.trim();
        match FEATURE_NAMES.iter().position(|name| *name == header) {
            Some(slot) => {
                if positions[slot].is_some() {
                    return Err(SchemaMismatch::DuplicateColumn(header.to_string()));
                }
                positions[slot] = Some(idx);
            }
            None if allowed_extra.contains(&header) => {}
            None => return Err(SchemaMismatch::UnknownColumn(header.to_string())),
        }
    }

    let mut located = [0usize; NUM_FEATURES];
    for (slot, position) in positions.iter().enumerate() {
        located[slot] =
            position.ok_or_else(|| SchemaMismatch::MissingColumn(FEATURE_NAMES[slot].to_string()))?;
    }
    Ok(located)
}

/// Parse one CSV cell. Empty cells and NaN spellings are missing values.
pub fn parse_cell(raw: &str, row: usize, column: &str) -> std::result::Result<f64, SchemaMismatch> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("nan") || trimmed == "NA" {
        return Ok(f64::NAN);
    }
    trimmed.parse::<f64>().map_err(|_| SchemaMismatch::NotNumeric {
        row,
        column: column.to_string(),
        value: trimmed.to_string(),
    })
}

/// Read a CSV of raw features into a matrix in canonical column order
pub fn read_feature_csv<R: Read>(reader: R) -> Result<Array2<f64>> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);
    let headers = rdr.headers()?.clone();
    let header_refs: Vec<&str> = headers.iter().collect();
    let positions = locate_columns(&header_refs, &[])?;

    let mut values = Vec::new();
    let mut n_rows = 0;
    for (row, record) in rdr.records().enumerate() {
        let record = record?;
        if record.len() != headers.len() {
            return Err(SchemaMismatch::Width {
                stage: "csv row",
                expected: headers.len(),
                got: record.len(),
            }
            .into());
        }
        for (name, &idx) in FEATURE_NAMES.iter().zip(positions.iter()) {
            values.push(parse_cell(&record[idx], row, name)?);
        }
        n_rows += 1;
    }

    Array2::from_shape_vec((n_rows, NUM_FEATURES), values)
        .map_err(|e| PotabilityError::InvalidData(e.to_string()))
}
