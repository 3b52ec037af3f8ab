//! strata-analytics: reusable machine-learning building blocks.
//!
//! This crate provides supervised and unsupervised learning components over
//! dense `ndarray` linear algebra: one-vs-all multiclass dispatch,
//! decision-threshold calibration, classification/ranking metrics (ROC,
//! AUC, precision-recall), nearest-neighbor anomaly detection, PCA,
//! K-means with an empty-cluster-avoiding update, windowed ridge
//! regression and an interactive active-learning controller. Binary
//! classifiers are consumed through a small trait contract so heavier
//! solvers can be plugged in from outside (see the optional `svm`
//! feature).
//!
//! The design favors small, testable modules; every component is
//! single-threaded and synchronous, and fitted models serialize to opaque
//! byte streams.
pub mod active_learning;
pub mod anomaly;
pub mod batch;
pub mod cluster;
pub mod decomposition;
pub mod error;
pub mod features;
pub mod io;
pub mod math;
pub mod metrics;
pub mod models;
pub mod multiclass;
pub mod preprocessing;
pub mod regression;
pub mod report;
pub mod threshold;

pub use error::{Error, Result};
