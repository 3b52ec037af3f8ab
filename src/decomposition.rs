//! Principal component analysis.
//!
//! `fit` centers the column examples, forms the empirical covariance and
//! eigendecomposes it; `transform` expresses examples as coefficients in
//! the retained eigenvector basis and `inverse_transform` maps them back.
//! With `k` equal to the full dimension the round trip is exact up to
//! floating point; smaller `k` gives the usual lossy low-rank
//! approximation.

use std::io::{Read, Write};

use ndarray::{Array1, Array2, ArrayView1, Axis};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::math::symmetric_eigen;

/// Construction parameters for [`Pca`].
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct PcaParams {
    /// Number of components to keep; `None` keeps the full dimension.
    pub k: Option<usize>,
    /// Iteration cap for the eigendecomposition.
    pub iter: usize,
}

impl Default for PcaParams {
    fn default() -> Self {
        Self { k: None, iter: 100 }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone)]
struct PcaModel {
    /// Eigenvectors as columns, dimension × k.
    p: Array2<f64>,
    /// Eigenvalues matching the columns of `p`, descending.
    lambda: Array1<f64>,
    /// Column mean of the training data.
    mu: Array1<f64>,
}

/// Principal component analysis over column examples.
#[derive(Deserialize, Serialize, Debug, Clone, Default)]
pub struct Pca {
    params: PcaParams,
    model: Option<PcaModel>,
}

impl Pca {
    pub fn new(params: PcaParams) -> Self {
        Self {
            params,
            model: None,
        }
    }

    pub fn params(&self) -> &PcaParams {
        &self.params
    }

    /// Replace the hyperparameters; the fitted model is kept until the next
    /// `fit`.
    pub fn set_params(&mut self, params: PcaParams) {
        self.params = params;
    }

    /// The components, eigenvalues and mean of the fitted model.
    pub fn model(&self) -> Result<(&Array2<f64>, &Array1<f64>, &Array1<f64>)> {
        let model = self.fitted()?;
        Ok((&model.p, &model.lambda, &model.mu))
    }

    fn fitted(&self) -> Result<&PcaModel> {
        self.model.as_ref().ok_or(Error::NotFitted("Pca"))
    }

    /// Find the eigenbasis of the covariance of `a`.
    ///
    /// # Arguments
    ///
    /// * `a` - Matrix whose columns are training examples.
    pub fn fit(&mut self, a: &Array2<f64>) -> Result<()> {
        let (rows, cols) = (a.nrows(), a.ncols());
        if cols < 2 {
            return Err(Error::Config(
                "Pca::fit requires at least two example columns".into(),
            ));
        }
        let k = self.params.k.unwrap_or(rows);
        if k == 0 || k > rows {
            return Err(Error::Config(format!(
                "component count {} outside of [1, {}]",
                k, rows
            )));
        }

        let mu = a
            .mean_axis(Axis(1))
            .ok_or_else(|| Error::Numerical("empty training matrix".into()))?;
        // center the columns
        let mut centered = a.clone();
        for mut col in centered.columns_mut() {
            col -= &mu;
        }
        let cov = centered.dot(&centered.t()) / (cols as f64 - 1.0);

        log::trace!("eigendecomposing a {}x{} covariance", rows, rows);
        let (lambda, vectors) = symmetric_eigen(&cov.view(), self.params.iter);

        let mut p = Array2::zeros((rows, k));
        for j in 0..k {
            p.column_mut(j).assign(&vectors.column(j));
        }
        let lambda = lambda.slice(ndarray::s![..k]).to_owned();
        self.model = Some(PcaModel { p, lambda, mu });
        Ok(())
    }

    /// Express a vector as coefficients in the eigenvector basis:
    /// `Pᵀ (x - mu)`.
    pub fn transform(&self, x: ArrayView1<f64>) -> Result<Array1<f64>> {
        let model = self.fitted()?;
        if x.len() != model.mu.len() {
            return Err(Error::InvalidShape {
                what: "Pca::transform input",
                expected: model.mu.len(),
                found: x.len(),
            });
        }
        let centered = &x.to_owned() - &model.mu;
        Ok(model.p.t().dot(&centered))
    }

    /// Column-wise [`Pca::transform`] of a matrix of examples.
    pub fn transform_batch(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        let model = self.fitted()?;
        let mut out = Array2::zeros((model.p.ncols(), x.ncols()));
        for (j, col) in x.columns().into_iter().enumerate() {
            out.column_mut(j).assign(&self.transform(col)?);
        }
        Ok(out)
    }

    /// Reconstruct a vector in the original space, reversing the centering:
    /// `P p + mu`.
    pub fn inverse_transform(&self, p: ArrayView1<f64>) -> Result<Array1<f64>> {
        let model = self.fitted()?;
        if p.len() != model.p.ncols() {
            return Err(Error::InvalidShape {
                what: "Pca::inverse_transform input",
                expected: model.p.ncols(),
                found: p.len(),
            });
        }
        Ok(model.p.dot(&p) + &model.mu)
    }

    /// Column-wise [`Pca::inverse_transform`] of a coefficient matrix.
    pub fn inverse_transform_batch(&self, p: &Array2<f64>) -> Result<Array2<f64>> {
        let model = self.fitted()?;
        let mut out = Array2::zeros((model.mu.len(), p.ncols()));
        for (j, col) in p.columns().into_iter().enumerate() {
            out.column_mut(j).assign(&self.inverse_transform(col)?);
        }
        Ok(out)
    }

    /// Serialize the fitted model and parameters.
    pub fn save<W: Write>(&self, out: &mut W) -> Result<()> {
        if self.model.is_none() {
            return Err(Error::NotFitted("Pca"));
        }
        serde_json::to_writer(out, self)?;
        Ok(())
    }

    /// Restore a model previously written with [`Pca::save`].
    pub fn load<R: Read>(input: R) -> Result<Self> {
        Ok(serde_json::from_reader(input)?)
    }
}
