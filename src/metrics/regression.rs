//! Online regression metrics with batch convenience wrappers.
//!
//! Each metric keeps a small running state, updates it on `push` and
//! reports the current error. States are serializable so long-running
//! consumers can checkpoint them.

use std::io::{Read, Write};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Contract shared by the online regression metrics.
pub trait OnlineMetric {
    /// Update the metric with a ground-truth/estimate pair and return the
    /// refreshed error value.
    fn push(&mut self, y_true: f64, y_pred: f64) -> f64;

    /// Current error value; -1 before the first push.
    fn error(&self) -> f64;

    fn name(&self) -> &'static str;
}

/// Persist a metric state to an output stream.
pub fn save_metric<M: Serialize, W: Write>(metric: &M, out: &mut W) -> Result<()> {
    serde_json::to_writer(out, metric)?;
    Ok(())
}

/// Restore a metric state previously written with [`save_metric`].
pub fn load_metric<M: DeserializeOwned, R: Read>(input: R) -> Result<M> {
    Ok(serde_json::from_reader(input)?)
}

macro_rules! mean_style_metric {
    ($(#[$doc:meta])* $name:ident, $short:expr, $term:expr, $final:expr) => {
        $(#[$doc])*
        #[derive(Clone, Debug, Deserialize, Serialize)]
        pub struct $name {
            sum_err: f64,
            count: usize,
            error: f64,
        }

        impl $name {
            pub fn new() -> Self {
                Self { sum_err: 0.0, count: 0, error: -1.0 }
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl OnlineMetric for $name {
            fn push(&mut self, y_true: f64, y_pred: f64) -> f64 {
                let term: fn(f64, f64) -> Option<f64> = $term;
                if let Some(t) = term(y_true, y_pred) {
                    self.sum_err += t;
                }
                self.count += 1;
                let finish: fn(f64, usize) -> f64 = $final;
                self.error = finish(self.sum_err, self.count);
                self.error
            }

            fn error(&self) -> f64 {
                self.error
            }

            fn name(&self) -> &'static str {
                $short
            }
        }
    };
}

mean_style_metric!(
    /// Online mean error (ME).
    MeanError,
    "ME",
    |y_true, y_pred| Some(y_true - y_pred),
    |sum, count| sum / count as f64
);

mean_style_metric!(
    /// Online mean absolute error (MAE).
    MeanAbsoluteError,
    "MAE",
    |y_true, y_pred| Some((y_true - y_pred).abs()),
    |sum, count| sum / count as f64
);

mean_style_metric!(
    /// Online mean square error (MSE).
    MeanSquareError,
    "MSE",
    |y_true, y_pred| Some((y_true - y_pred) * (y_true - y_pred)),
    |sum, count| sum / count as f64
);

mean_style_metric!(
    /// Online root mean square error (RMSE).
    RootMeanSquareError,
    "RMSE",
    |y_true, y_pred| Some((y_true - y_pred) * (y_true - y_pred)),
    |sum, count| (sum / count as f64).sqrt()
);

mean_style_metric!(
    /// Online mean absolute percentage error (MAPE). Terms with a zero
    /// ground truth are skipped to avoid division by zero.
    MeanAbsolutePercentageError,
    "MAPE",
    |y_true, y_pred| {
        if y_true != 0.0 {
            Some(((y_true - y_pred) / y_true).abs() * 100.0)
        } else {
            None
        }
    },
    |sum, count| sum / count as f64
);

/// Online R² (coefficient of determination). Best score is 1.0; when the
/// ground truth is constant (zero total variance) the score is 1.0 for a
/// perfect fit and 0.0 otherwise.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct R2Score {
    sse: f64,
    sum_true: f64,
    sum_true_sq: f64,
    count: usize,
    error: f64,
}

impl R2Score {
    pub fn new() -> Self {
        Self {
            sse: 0.0,
            sum_true: 0.0,
            sum_true_sq: 0.0,
            count: 0,
            error: -1.0,
        }
    }
}

impl Default for R2Score {
    fn default() -> Self {
        Self::new()
    }
}

impl OnlineMetric for R2Score {
    fn push(&mut self, y_true: f64, y_pred: f64) -> f64 {
        self.count += 1;
        self.sum_true += y_true;
        self.sum_true_sq += y_true * y_true;
        self.sse += (y_true - y_pred) * (y_true - y_pred);
        let mean = self.sum_true / self.count as f64;
        let sst = self.sum_true_sq - self.count as f64 * mean * mean;
        self.error = if sst == 0.0 {
            if self.sse == 0.0 {
                1.0
            } else {
                0.0
            }
        } else {
            1.0 - self.sse / sst
        };
        self.error
    }

    fn error(&self) -> f64 {
        self.error
    }

    fn name(&self) -> &'static str {
        "R2"
    }
}

fn batch_error<M: OnlineMetric>(mut metric: M, y_true: &[f64], y_pred: &[f64]) -> f64 {
    assert_eq!(
        y_true.len(),
        y_pred.len(),
        "ground truth and predictions must have equal lengths"
    );
    for (&t, &p) in y_true.iter().zip(y_pred.iter()) {
        metric.push(t, p);
    }
    metric.error()
}

/// Mean error regression loss.
pub fn mean_error(y_true: &[f64], y_pred: &[f64]) -> f64 {
    batch_error(MeanError::new(), y_true, y_pred)
}

/// Mean absolute error regression loss.
pub fn mean_absolute_error(y_true: &[f64], y_pred: &[f64]) -> f64 {
    batch_error(MeanAbsoluteError::new(), y_true, y_pred)
}

/// Mean square error regression loss.
pub fn mean_square_error(y_true: &[f64], y_pred: &[f64]) -> f64 {
    batch_error(MeanSquareError::new(), y_true, y_pred)
}

/// Root mean square error regression loss.
pub fn root_mean_square_error(y_true: &[f64], y_pred: &[f64]) -> f64 {
    batch_error(RootMeanSquareError::new(), y_true, y_pred)
}

/// Mean absolute percentage error regression loss.
pub fn mean_absolute_percentage_error(y_true: &[f64], y_pred: &[f64]) -> f64 {
    batch_error(MeanAbsolutePercentageError::new(), y_true, y_pred)
}

/// R² (coefficient of determination) regression score.
pub fn r2_score(y_true: &[f64], y_pred: &[f64]) -> f64 {
    batch_error(R2Score::new(), y_true, y_pred)
}
