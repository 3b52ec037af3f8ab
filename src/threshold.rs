//! Decision-threshold calibration on top of [`PredictionCurve`].

use std::str::FromStr;

use ndarray::Array1;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::metrics::PredictionCurve;

/// What the fitted threshold optimizes for.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub enum ThresholdTarget {
    /// Threshold that maximizes F1 on the training sweep.
    BestF1,
    /// Threshold whose recall is nearest to the given level.
    DesiredRecall(f64),
    /// Threshold whose precision is nearest to the given level.
    DesiredPrecision(f64),
}

impl FromStr for ThresholdTarget {
    type Err = Error;

    /// Parse `"f1"`, `"recall:<level>"` or `"precision:<level>"`.
    fn from_str(s: &str) -> Result<Self> {
        let lower = s.to_lowercase();
        if lower == "f1" {
            return Ok(ThresholdTarget::BestF1);
        }
        if let Some((kind, level)) = lower.split_once(':') {
            let level: f64 = level
                .parse()
                .map_err(|_| Error::Config(format!("invalid threshold level in '{}'", s)))?;
            match kind {
                "recall" => return Ok(ThresholdTarget::DesiredRecall(level)),
                "precision" => return Ok(ThresholdTarget::DesiredPrecision(level)),
                _ => {}
            }
        }
        Err(Error::Config(format!("unknown threshold model target: {}", s)))
    }
}

/// Translates raw prediction scores into ±1 decisions through a scalar
/// threshold picked by [`ThresholdModel::fit`].
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct ThresholdModel {
    target: ThresholdTarget,
    threshold: Option<f64>,
}

impl ThresholdModel {
    pub fn new(target: ThresholdTarget) -> Self {
        Self {
            target,
            threshold: None,
        }
    }

    /// The fitted threshold, if any.
    pub fn threshold(&self) -> Option<f64> {
        self.threshold
    }

    pub fn target(&self) -> &ThresholdTarget {
        &self.target
    }

    /// Pick the threshold from prediction scores and ±1 ground truth.
    ///
    /// # Arguments
    ///
    /// * `predictions` - Decision-function outputs, one per instance.
    /// * `ground_truth` - Matching ±1 labels.
    pub fn fit(&mut self, predictions: &[f64], ground_truth: &[f64]) -> Result<()> {
        if predictions.len() != ground_truth.len() {
            return Err(Error::InvalidShape {
                what: "ThresholdModel::fit ground truth",
                expected: predictions.len(),
                found: ground_truth.len(),
            });
        }
        let curve = PredictionCurve::from_pairs(ground_truth, predictions);
        let threshold = match self.target {
            ThresholdTarget::BestF1 => curve.best_f1_threshold(),
            ThresholdTarget::DesiredRecall(level) => curve.desired_recall_threshold(level),
            ThresholdTarget::DesiredPrecision(level) => curve.desired_precision_threshold(level),
        };
        self.threshold = Some(threshold);
        Ok(())
    }

    /// Distance of a score from the threshold.
    pub fn decision_function(&self, x: f64) -> Result<f64> {
        let threshold = self.threshold.ok_or(Error::NotFitted("ThresholdModel"))?;
        Ok(x - threshold)
    }

    /// Elementwise distance of a score vector from the threshold.
    pub fn decision_function_vec(&self, x: &Array1<f64>) -> Result<Array1<f64>> {
        let threshold = self.threshold.ok_or(Error::NotFitted("ThresholdModel"))?;
        Ok(x.mapv(|v| v - threshold))
    }

    /// ±1 decision for a single score.
    pub fn predict(&self, x: f64) -> Result<f64> {
        Ok(if self.decision_function(x)? > 0.0 {
            1.0
        } else {
            -1.0
        })
    }

    /// ±1 decisions for a score vector.
    pub fn predict_vec(&self, x: &Array1<f64>) -> Result<Array1<f64>> {
        let scores = self.decision_function_vec(x)?;
        Ok(scores.mapv(|v| if v > 0.0 { 1.0 } else { -1.0 }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::arr1;

    #[test]
    fn parses_targets() {
        assert_eq!(
            "f1".parse::<ThresholdTarget>().unwrap(),
            ThresholdTarget::BestF1
        );
        assert_eq!(
            "recall:0.9".parse::<ThresholdTarget>().unwrap(),
            ThresholdTarget::DesiredRecall(0.9)
        );
        assert!("margin".parse::<ThresholdTarget>().is_err());
    }

    #[test]
    fn f1_threshold_classifies_training_sweep() {
        let predictions = [0.9, 0.8, 0.7, 0.2, 0.1];
        let ground_truth = [1.0, 1.0, 1.0, -1.0, -1.0];
        let mut model = ThresholdModel::new(ThresholdTarget::BestF1);
        model.fit(&predictions, &ground_truth).unwrap();
        for (&p, &g) in predictions.iter().zip(ground_truth.iter()) {
            // fitted threshold sits at the lowest positive, so the boundary
            // example itself maps to -1 and everything above to +1
            let decided = model.predict(p).unwrap();
            if p > 0.7 {
                assert_eq!(decided, 1.0);
            }
            if g < 0.0 {
                assert_eq!(decided, -1.0);
            }
        }
    }

    #[test]
    fn vector_decisions_translate_scores() {
        let mut model = ThresholdModel::new(ThresholdTarget::BestF1);
        model
            .fit(&[0.8, 0.6, 0.3], &[1.0, 1.0, -1.0])
            .unwrap();
        let shifted = model
            .decision_function_vec(&arr1(&[1.0, 0.0]))
            .unwrap();
        let threshold = model.threshold().unwrap();
        assert!((shifted[0] - (1.0 - threshold)).abs() < 1e-12);
        assert!((shifted[1] - (0.0 - threshold)).abs() < 1e-12);
    }

    #[test]
    fn predict_before_fit_errors() {
        let model = ThresholdModel::new(ThresholdTarget::BestF1);
        assert!(model.predict(0.5).is_err());
    }
}
