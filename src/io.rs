//! Labeled dense-feature CSV loading and saving.
//!
//! The on-disk layout is one example per row: a label column followed by
//! the feature columns. In memory the examples become the COLUMNS of the
//! feature matrix, matching the convention of the learning modules.

use std::path::Path;

use anyhow::{anyhow, Context, Result};
use ndarray::Array2;

/// Parsed dataset ready for model training or evaluation.
#[derive(Debug, Clone)]
pub struct LabeledData {
    /// Feature matrix with examples as columns (dimension × count).
    pub x: Array2<f64>,
    /// Integer label per example.
    pub y: Vec<i32>,
    /// Feature column names from the header.
    pub feature_names: Vec<String>,
}

/// Configuration for reading labeled CSV files.
#[derive(Debug, Clone)]
pub struct CsvReaderConfig {
    /// Column holding the integer label.
    pub label_column: String,
    /// Field delimiter.
    pub delimiter: u8,
}

impl Default for CsvReaderConfig {
    fn default() -> Self {
        Self {
            label_column: "label".to_string(),
            delimiter: b',',
        }
    }
}

/// Read a labeled feature CSV with the default configuration.
pub fn read_labeled_csv<P: AsRef<Path>>(path: P) -> Result<LabeledData> {
    read_labeled_csv_with_config(path, &CsvReaderConfig::default())
}

/// Read a labeled feature CSV.
///
/// # Arguments
///
/// * `path` - File to read; must carry a header row.
/// * `config` - Label column name and delimiter.
pub fn read_labeled_csv_with_config<P: AsRef<Path>>(
    path: P,
    config: &CsvReaderConfig,
) -> Result<LabeledData> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(config.delimiter)
        .has_headers(true)
        .from_path(&path)
        .with_context(|| format!("failed to open CSV file: {}", path.as_ref().display()))?;

    let headers = reader.headers().context("failed to read header row")?.clone();
    let label_idx = headers
        .iter()
        .position(|h| h == config.label_column)
        .ok_or_else(|| anyhow!("missing label column '{}'", config.label_column))?;

    let feature_names: Vec<String> = headers
        .iter()
        .enumerate()
        .filter(|&(i, _)| i != label_idx)
        .map(|(_, h)| h.to_string())
        .collect();

    let mut rows: Vec<Vec<f64>> = Vec::new();
    let mut labels = Vec::new();
    for (row_idx, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("failed to read row {}", row_idx + 1))?;
        let label: i32 = record
            .get(label_idx)
            .ok_or_else(|| anyhow!("row {} is missing the label field", row_idx + 1))?
            .trim()
            .parse()
            .with_context(|| format!("invalid label in row {}", row_idx + 1))?;
        labels.push(label);

        let mut features = Vec::with_capacity(feature_names.len());
        for (i, field) in record.iter().enumerate() {
            if i == label_idx {
                continue;
            }
            let value: f64 = field
                .trim()
                .parse()
                .with_context(|| format!("invalid feature value '{}' in row {}", field, row_idx + 1))?;
            features.push(value);
        }
        if features.len() != feature_names.len() {
            return Err(anyhow!(
                "row {} has {} features, expected {}",
                row_idx + 1,
                features.len(),
                feature_names.len()
            ));
        }
        rows.push(features);
    }

    let dim = feature_names.len();
    let mut x = Array2::zeros((dim, rows.len()));
    for (j, row) in rows.iter().enumerate() {
        for (i, &v) in row.iter().enumerate() {
            x[(i, j)] = v;
        }
    }
    Ok(LabeledData {
        x,
        y: labels,
        feature_names,
    })
}

/// Write a labeled dataset as CSV, one example per row.
pub fn write_labeled_csv<P: AsRef<Path>>(
    path: P,
    x: &Array2<f64>,
    y: &[i32],
    feature_names: &[String],
) -> Result<()> {
    if x.ncols() != y.len() {
        return Err(anyhow!(
            "matrix has {} columns but {} labels were given",
            x.ncols(),
            y.len()
        ));
    }
    if x.nrows() != feature_names.len() {
        return Err(anyhow!(
            "matrix has {} rows but {} feature names were given",
            x.nrows(),
            feature_names.len()
        ));
    }
    let mut writer = csv::Writer::from_path(&path)
        .with_context(|| format!("failed to create CSV file: {}", path.as_ref().display()))?;

    let mut header = vec!["label".to_string()];
    header.extend(feature_names.iter().cloned());
    writer.write_record(&header)?;

    for (j, &label) in y.iter().enumerate() {
        let mut record = vec![label.to_string()];
        for i in 0..x.nrows() {
            record.push(x[(i, j)].to_string());
        }
        writer.write_record(&record)?;
    }
    writer.flush().context("failed to flush CSV writer")?;
    Ok(())
}
