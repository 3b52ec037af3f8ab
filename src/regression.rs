//! Incremental ridge regression over a sliding window of examples.
//!
//! `add` collects `(x, y)` pairs (evicting the oldest beyond the window),
//! `update` re-solves the regularized normal equations
//! `(AᵀA + kappa·I) w = Aᵀ b`, and `predict` scores with the current
//! weights. Before the first `update` the weights are zero, so predictions
//! are defined (and zero) from the start.

use std::io::{Read, Write};

use ndarray::{Array1, Array2, ArrayView1};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::math::cholesky_solve;

/// Windowed ridge regression solving `min_w |Aw - b|² + kappa·|w|²`.
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct RidgeRegression {
    kappa: f64,
    dim: usize,
    /// Window size; examples beyond it are forgotten. `None` is unbounded.
    buffer: Option<usize>,
    examples: Vec<Vec<f64>>,
    targets: Vec<f64>,
    weights: Array1<f64>,
}

impl RidgeRegression {
    /// # Arguments
    ///
    /// * `kappa` - Regularization strength (0 disables regularization).
    /// * `dim` - Feature dimension of the examples.
    /// * `buffer` - Optional window length; `Some(0)` or `None` means
    ///   unbounded.
    pub fn new(kappa: f64, dim: usize, buffer: Option<usize>) -> Result<Self> {
        if kappa < 0.0 {
            return Err(Error::Config(format!(
                "kappa must be non-negative, got {}",
                kappa
            )));
        }
        if dim == 0 {
            return Err(Error::Config("dim must be positive".into()));
        }
        Ok(Self {
            kappa,
            dim,
            buffer: buffer.filter(|&b| b > 0),
            examples: Vec::new(),
            targets: Vec::new(),
            weights: Array1::zeros(dim),
        })
    }

    /// Number of examples currently in the window.
    pub fn len(&self) -> usize {
        self.examples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.examples.is_empty()
    }

    /// The current weight vector.
    pub fn model(&self) -> &Array1<f64> {
        &self.weights
    }

    /// Add an example and its target to the training window; the oldest
    /// examples are evicted once the window overflows.
    pub fn add(&mut self, x: ArrayView1<f64>, target: f64) -> Result<()> {
        if x.len() != self.dim {
            return Err(Error::InvalidShape {
                what: "RidgeRegression::add example",
                expected: self.dim,
                found: x.len(),
            });
        }
        self.examples.push(x.to_vec());
        self.targets.push(target);
        if let Some(buffer) = self.buffer {
            if self.examples.len() > buffer {
                self.forget(self.examples.len() - buffer);
            }
        }
        Ok(())
    }

    /// Delete the first `n` examples from the training window.
    pub fn forget(&mut self, n: usize) {
        let n = n.min(self.examples.len());
        self.examples.drain(..n);
        self.targets.drain(..n);
    }

    /// Recompute the weights from the examples currently in the window.
    pub fn update(&mut self) -> Result<()> {
        if self.examples.is_empty() {
            return Err(Error::Config(
                "cannot update with an empty training window".into(),
            ));
        }
        let a = self.example_matrix();
        let b = Array1::from_vec(self.targets.clone());
        self.weights = self.compute(&a, &b)?;
        Ok(())
    }

    /// `add` followed by `update`.
    pub fn add_update(&mut self, x: ArrayView1<f64>, target: f64) -> Result<()> {
        self.add(x, target)?;
        self.update()
    }

    /// Solve the regularized normal equations for a row-example matrix `a`
    /// and target vector `b`.
    pub fn compute(&self, a: &Array2<f64>, b: &Array1<f64>) -> Result<Array1<f64>> {
        let mut gram = a.t().dot(a);
        for i in 0..gram.nrows() {
            gram[(i, i)] += self.kappa;
        }
        let rhs = a.t().dot(b);
        cholesky_solve(&gram.view(), &rhs)
    }

    /// Inner product of the weights with `x`.
    pub fn predict(&self, x: ArrayView1<f64>) -> Result<f64> {
        if x.len() != self.dim {
            return Err(Error::InvalidShape {
                what: "RidgeRegression::predict input",
                expected: self.dim,
                found: x.len(),
            });
        }
        Ok(self.weights.dot(&x))
    }

    /// Stack the window into a row-example matrix.
    fn example_matrix(&self) -> Array2<f64> {
        let mut a = Array2::zeros((self.examples.len(), self.dim));
        for (i, row) in self.examples.iter().enumerate() {
            for (j, &v) in row.iter().enumerate() {
                a[(i, j)] = v;
            }
        }
        a
    }

    /// Serialize the full state (window included).
    pub fn save<W: Write>(&self, out: &mut W) -> Result<()> {
        serde_json::to_writer(out, self)?;
        Ok(())
    }

    /// Restore a model previously written with [`RidgeRegression::save`].
    pub fn load<R: Read>(input: R) -> Result<Self> {
        Ok(serde_json::from_reader(input)?)
    }
}
