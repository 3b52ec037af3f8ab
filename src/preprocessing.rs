//! Label and feature preprocessing helpers shared by the learning modules.
//!
//! `Binarizer` turns arbitrary label sequences into the ±1 target vectors
//! the binary models train on; `apply_model` scores every column of a
//! feature matrix through a fitted model; `standardize` rescales feature
//! rows to zero mean and unit variance.

use ndarray::{Array1, Array2};
use statrs::statistics::Statistics;

use crate::error::Result;
use crate::models::BinaryModel;

/// Transforms label sequences into numeric vectors for binary classifiers.
///
/// Labels equal to the configured positive label map to `positive_id`
/// (default +1), all others to `negative_id` (default -1).
#[derive(Clone, Debug)]
pub struct Binarizer<L> {
    positive_label: L,
    positive_id: f64,
    negative_id: f64,
}

impl<L: PartialEq> Binarizer<L> {
    pub fn new(positive_label: L) -> Self {
        Self {
            positive_label,
            positive_id: 1.0,
            negative_id: -1.0,
        }
    }

    /// Override the values emitted for matching and non-matching labels.
    pub fn with_ids(positive_label: L, positive_id: f64, negative_id: f64) -> Self {
        Self {
            positive_label,
            positive_id,
            negative_id,
        }
    }

    /// Transform a slice of labels into a ±1 (by default) target vector.
    pub fn transform(&self, labels: &[L]) -> Array1<f64> {
        labels
            .iter()
            .map(|l| {
                if *l == self.positive_label {
                    self.positive_id
                } else {
                    self.negative_id
                }
            })
            .collect()
    }
}

/// Apply a model's decision function to each column of `x` and collect the
/// scores into a dense vector.
pub fn apply_model<M: BinaryModel + ?Sized>(model: &M, x: &Array2<f64>) -> Result<Array1<f64>> {
    let mut scores = Array1::zeros(x.ncols());
    for (j, col) in x.columns().into_iter().enumerate() {
        scores[j] = model.decision_function(col)?;
    }
    Ok(scores)
}

/// Standardize each row (feature) of a column-example matrix to zero mean
/// and unit variance. Constant features are left centered only.
pub fn standardize(x: &mut Array2<f64>) {
    for mut row in x.rows_mut() {
        let values: Vec<f64> = row.iter().copied().collect();
        let mean = (&values).mean();
        let std = (&values).std_dev();
        if std.is_finite() && std > 0.0 {
            row.mapv_inplace(|v| (v - mean) / std);
        } else {
            row.mapv_inplace(|v| v - mean);
        }
    }
}
