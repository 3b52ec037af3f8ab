//! Classification, ranking and regression evaluation.
//!
//! The classification half accumulates (ground truth, prediction) pairs and
//! derives confusion-count metrics and ranking curves (ROC, AUC,
//! precision-recall, break-even point, threshold search). The regression
//! half provides online error metrics with batch convenience wrappers.
pub mod classification;
pub mod regression;

pub use classification::{ClassificationScore, PredictionCurve};
pub use regression::{
    MeanAbsoluteError, MeanAbsolutePercentageError, MeanError, MeanSquareError, OnlineMetric,
    R2Score, RootMeanSquareError,
};
