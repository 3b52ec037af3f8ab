//! Linear support-vector classifier trained by batch subgradient descent.
//!
//! This is the crate's default implementation of the [`BinaryModel`]
//! contract: a regularized hinge-loss linear model with a decaying step
//! size. It is deliberately simple; consumers with heavier needs can plug
//! any other model through the contract (see the optional `svm` feature).

use std::io::{Read, Write};

use ndarray::{Array1, Array2, ArrayView1};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::models::BinaryModel;

/// Hyperparameters for [`LinearSvc`].
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct LinearSvcParams {
    /// Regularization trade-off; larger `c` fits the data more closely.
    pub c: f64,
    /// Initial step size for the subgradient updates.
    pub learning_rate: f64,
    /// Maximum number of epochs over the training set.
    pub max_iter: usize,
    /// Stop early once the weight change between epochs drops below this.
    pub tol: f64,
}

impl Default for LinearSvcParams {
    fn default() -> Self {
        Self {
            c: 1.0,
            learning_rate: 0.01,
            max_iter: 1000,
            tol: 1e-6,
        }
    }
}

/// Linear SVM over column examples, decision function `w·x + b`.
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct LinearSvc {
    params: LinearSvcParams,
    weights: Option<Array1<f64>>,
    bias: f64,
}

impl LinearSvc {
    pub fn new(params: LinearSvcParams) -> Self {
        Self {
            params,
            weights: None,
            bias: 0.0,
        }
    }

    /// The fitted weight vector and bias.
    pub fn model(&self) -> Result<(&Array1<f64>, f64)> {
        match &self.weights {
            Some(w) => Ok((w, self.bias)),
            None => Err(Error::NotFitted("LinearSvc")),
        }
    }

    /// Serialize the model state to an output stream.
    pub fn save<W: Write>(&self, out: &mut W) -> Result<()> {
        serde_json::to_writer(out, self)?;
        Ok(())
    }

    /// Restore a model previously written with [`LinearSvc::save`].
    pub fn load<R: Read>(input: R) -> Result<Self> {
        Ok(serde_json::from_reader(input)?)
    }
}

impl Default for LinearSvc {
    fn default() -> Self {
        Self::new(LinearSvcParams::default())
    }
}

impl BinaryModel for LinearSvc {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        if x.ncols() != y.len() {
            return Err(Error::InvalidShape {
                what: "LinearSvc::fit targets",
                expected: x.ncols(),
                found: y.len(),
            });
        }
        if x.ncols() == 0 {
            return Err(Error::Config("cannot fit on an empty training set".into()));
        }

        let n = x.ncols() as f64;
        let dim = x.nrows();
        let lambda = 1.0 / (2.0 * n * self.params.c);

        let mut w = Array1::<f64>::zeros(dim);
        let mut b = 0.0;

        for epoch in 0..self.params.max_iter {
            let eta = self.params.learning_rate / (1.0 + epoch as f64 * 0.01);
            let prev_w = w.clone();
            let prev_b = b;

            for (i, col) in x.columns().into_iter().enumerate() {
                let margin = y[i] * (w.dot(&col) + b);
                if margin < 1.0 {
                    // inside the margin: hinge subgradient plus regularization
                    for (wj, xj) in w.iter_mut().zip(col.iter()) {
                        *wj -= eta * (2.0 * lambda * *wj - y[i] * xj);
                    }
                    b += eta * y[i];
                } else {
                    for wj in w.iter_mut() {
                        *wj -= eta * 2.0 * lambda * *wj;
                    }
                }
            }

            let mut change = (b - prev_b) * (b - prev_b);
            for (new, old) in w.iter().zip(prev_w.iter()) {
                change += (new - old) * (new - old);
            }
            if change.sqrt() < self.params.tol {
                log::trace!("LinearSvc converged after {} epochs", epoch + 1);
                break;
            }
        }

        self.weights = Some(w);
        self.bias = b;
        Ok(())
    }

    fn decision_function(&self, x: ArrayView1<f64>) -> Result<f64> {
        let w = self.weights.as_ref().ok_or(Error::NotFitted("LinearSvc"))?;
        if w.len() != x.len() {
            return Err(Error::InvalidShape {
                what: "LinearSvc::decision_function input",
                expected: w.len(),
                found: x.len(),
            });
        }
        Ok(w.dot(&x) + self.bias)
    }

    fn name(&self) -> &str {
        "linear-svc"
    }
}
