//! Nearest-neighbor anomaly detection.
//!
//! The detector keeps a reference set of known examples and flags a query
//! as anomalous when its squared distance to the nearest reference point
//! exceeds a threshold. The threshold is the `(1 - rate)` quantile of the
//! reference set's own nearest-neighbor distances, so `rate` is the
//! expected fraction of emitted anomalies.

use std::io::{Read, Write};

use ndarray::{Array1, Array2, ArrayView1};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::math::pairwise_sq_distances;

/// Per-feature breakdown of the distance to the nearest reference point.
#[derive(Clone, Debug)]
pub struct AnomalyExplanation {
    /// Column index of the nearest reference example.
    pub nearest: usize,
    /// Feature indices sorted by their contribution, largest first.
    pub feature_ids: Vec<usize>,
    /// Matching contribution weights; they sum to 1.
    pub feature_contributions: Vec<f64>,
}

/// Anomaly detector that checks whether a test point is too far from the
/// nearest known point.
#[derive(Deserialize, Serialize, Clone, Debug)]
pub struct NearestNeighborAD {
    rate: f64,
    threshold: f64,
    references: Option<Array2<f64>>,
}

impl NearestNeighborAD {
    /// # Arguments
    ///
    /// * `rate` - Expected anomaly fraction, in `(0, 1]`.
    pub fn new(rate: f64) -> Result<Self> {
        if !(rate > 0.0 && rate <= 1.0) {
            return Err(Error::Config(format!(
                "rate parameter {} not in range (0,1]",
                rate
            )));
        }
        Ok(Self {
            rate,
            threshold: 0.0,
            references: None,
        })
    }

    pub fn rate(&self) -> f64 {
        self.rate
    }

    /// The fitted decision threshold (a squared distance).
    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Analyze the nearest-neighbor distances of the columns of `a` and set
    /// the detector threshold from the rate parameter. The matrix is kept
    /// as the reference set.
    pub fn fit(&mut self, a: Array2<f64>) -> Result<()> {
        if a.ncols() == 0 {
            return Err(Error::Config(
                "reference set must contain at least one column".into(),
            ));
        }
        let mut d = pairwise_sq_distances(&a.view(), &a.view());
        // inflate the diagonal with each row's distance sum so a point can
        // never be its own nearest neighbor
        for i in 0..d.nrows() {
            let row_sum: f64 = d.row(i).sum();
            d[(i, i)] += row_sum;
        }
        let mut neighbor_distances: Vec<f64> = (0..d.nrows())
            .map(|i| d.row(i).iter().cloned().fold(f64::INFINITY, f64::min))
            .collect();
        self.threshold = quantile_threshold(&mut neighbor_distances, self.rate);
        self.references = Some(a);
        Ok(())
    }

    fn references(&self) -> Result<&Array2<f64>> {
        self.references
            .as_ref()
            .ok_or(Error::NotFitted("NearestNeighborAD"))
    }

    /// Squared distance from `x` to its nearest reference point.
    pub fn decision_function(&self, x: ArrayView1<f64>) -> Result<f64> {
        let refs = self.references()?;
        if x.len() != refs.nrows() {
            return Err(Error::InvalidShape {
                what: "NearestNeighborAD::decision_function input",
                expected: refs.nrows(),
                found: x.len(),
            });
        }
        let query = x.to_owned().insert_axis(ndarray::Axis(1));
        let d = pairwise_sq_distances(&refs.view(), &query.view());
        Ok(d.column(0).iter().cloned().fold(f64::INFINITY, f64::min))
    }

    /// 1 when `x` is farther from every reference point than the fitted
    /// threshold, 0 otherwise.
    pub fn predict(&self, x: ArrayView1<f64>) -> Result<u8> {
        let nearest = self.decision_function(x)?;
        Ok(if nearest > self.threshold { 1 } else { 0 })
    }

    /// Append one or more columns to the reference set and recompute the
    /// detector from scratch. Intentionally simple and quadratic in the
    /// reference-set size.
    pub fn update(&mut self, x: &Array2<f64>) -> Result<()> {
        let refs = self.references()?;
        if x.nrows() != refs.nrows() {
            return Err(Error::InvalidShape {
                what: "NearestNeighborAD::update input",
                expected: refs.nrows(),
                found: x.nrows(),
            });
        }
        let mut extended = Array2::zeros((refs.nrows(), refs.ncols() + x.ncols()));
        for (j, col) in refs.columns().into_iter().enumerate() {
            extended.column_mut(j).assign(&col);
        }
        for (j, col) in x.columns().into_iter().enumerate() {
            extended.column_mut(refs.ncols() + j).assign(&col);
        }
        self.fit(extended)
    }

    /// [`NearestNeighborAD::update`] with a single example.
    pub fn update_one(&mut self, x: ArrayView1<f64>) -> Result<()> {
        let column = x.to_owned().insert_axis(ndarray::Axis(1));
        self.update(&column)
    }

    /// Nearest reference column and the per-feature contributions to the
    /// squared distance.
    pub fn explain(&self, x: ArrayView1<f64>) -> Result<AnomalyExplanation> {
        let refs = self.references()?;
        let query = x.to_owned().insert_axis(ndarray::Axis(1));
        let d = pairwise_sq_distances(&refs.view(), &query.view());
        let mut nearest = 0;
        for i in 0..d.nrows() {
            if d[(i, 0)] < d[(nearest, 0)] {
                nearest = i;
            }
        }
        let diff = &x.to_owned() - &refs.column(nearest);
        let total: f64 = diff.iter().map(|v| v * v).sum();
        let contributions: Vec<f64> = if total > 0.0 {
            diff.iter().map(|v| v * v / total).collect()
        } else {
            vec![0.0; diff.len()]
        };
        let (sorted, perm) = crate::math::sort_perm(&contributions, false);
        Ok(AnomalyExplanation {
            nearest,
            feature_ids: perm,
            feature_contributions: sorted,
        })
    }

    /// Serialize the detector (rate, threshold and reference set).
    pub fn save<W: Write>(&self, out: &mut W) -> Result<()> {
        serde_json::to_writer(out, self)?;
        Ok(())
    }

    /// Restore a detector previously written with [`NearestNeighborAD::save`].
    pub fn load<R: Read>(input: R) -> Result<Self> {
        Ok(serde_json::from_reader(input)?)
    }
}

/// The `100 * (1 - rate)` percentile of the given distances.
fn quantile_threshold(distances: &mut [f64], rate: f64) -> f64 {
    distances.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let idx = ((1.0 - rate) * distances.len() as f64).floor() as usize;
    distances[idx.min(distances.len() - 1)]
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{arr1, arr2};

    fn fitted_detector() -> NearestNeighborAD {
        let refs = arr2(&[[1.0, -2.0, -1.0], [1.0, 1.0, -3.0]]);
        let mut detector = NearestNeighborAD::new(0.34).unwrap();
        detector.fit(refs).unwrap();
        detector
    }

    #[test]
    fn invalid_rate_is_rejected() {
        assert!(NearestNeighborAD::new(0.0).is_err());
        assert!(NearestNeighborAD::new(1.5).is_err());
        assert!(NearestNeighborAD::new(1.0).is_ok());
    }

    #[test]
    fn far_point_is_anomalous() {
        let detector = fitted_detector();
        assert_eq!(detector.predict(arr1(&[20.0, 20.0]).view()).unwrap(), 1);
    }

    #[test]
    fn near_point_is_normal() {
        let detector = fitted_detector();
        assert_eq!(detector.predict(arr1(&[1.1, 0.9]).view()).unwrap(), 0);
    }

    #[test]
    fn update_extends_reference_set() {
        let mut detector = fitted_detector();
        // after learning the far region it is no longer anomalous
        detector
            .update(&arr2(&[[20.0, 21.0], [20.0, 21.0]]))
            .unwrap();
        assert_eq!(detector.predict(arr1(&[20.5, 20.5]).view()).unwrap(), 0);
    }

    #[test]
    fn single_example_update_recomputes_threshold() {
        let mut detector = fitted_detector();
        let before = detector.threshold();
        detector.update_one(arr1(&[1.1, 1.0]).view()).unwrap();
        assert!(detector.threshold() <= before);
    }

    #[test]
    fn predict_before_fit_errors() {
        let detector = NearestNeighborAD::new(0.5).unwrap();
        assert!(detector.predict(arr1(&[0.0, 0.0]).view()).is_err());
    }

    #[test]
    fn explain_ranks_feature_contributions() {
        let detector = fitted_detector();
        let explanation = detector.explain(arr1(&[1.0, 5.0]).view()).unwrap();
        assert_eq!(explanation.nearest, 0);
        assert_eq!(explanation.feature_ids[0], 1);
        let sum: f64 = explanation.feature_contributions.iter().sum();
        assert!((sum - 1.0).abs() < 1e-12);
    }
}
