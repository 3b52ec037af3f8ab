//! K-means clustering with an empty-cluster-avoiding centroid update.
//!
//! Assignment uses the score matrix `D = CᵀX − ‖C‖²⊗(½·1) − (½·1)⊗‖X‖²`,
//! whose per-column argmax equals the nearest centroid. The centroid update
//! `(X·indicator + oldC) / (1 + count)` drags a cluster that received no
//! points toward its previous position instead of letting it collapse.

use std::io::{Read, Write};

use ndarray::{Array1, Array2};
use rand::seq::index::sample;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::math::{argmax_columns, col_norms_sq};

/// Construction parameters for [`KMeans`].
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct KMeansParams {
    /// Number of centroids.
    pub k: usize,
    /// Maximum number of iterations.
    pub iter: usize,
    /// Optional column indices used as the starting centroids; when unset,
    /// `k` distinct random columns are drawn.
    pub fit_idx: Option<Vec<usize>>,
}

impl Default for KMeansParams {
    fn default() -> Self {
        Self {
            k: 2,
            iter: 100,
            fit_idx: None,
        }
    }
}

/// K-means model over column examples.
#[derive(Deserialize, Serialize, Debug, Clone, Default)]
pub struct KMeans {
    params: KMeansParams,
    centroids: Option<Array2<f64>>,
    /// Cached squared column norms of the centroids.
    nor_c2: Option<Array1<f64>>,
    /// Cluster id of each training column from the last fit.
    assignments: Option<Vec<usize>>,
}

impl KMeans {
    pub fn new(params: KMeansParams) -> Self {
        Self {
            params,
            centroids: None,
            nor_c2: None,
            assignments: None,
        }
    }

    pub fn params(&self) -> &KMeansParams {
        &self.params
    }

    /// The fitted centroid matrix (dimension × k).
    pub fn centroids(&self) -> Result<&Array2<f64>> {
        self.centroids.as_ref().ok_or(Error::NotFitted("KMeans"))
    }

    /// Cluster ids assigned to the training columns by the last fit.
    pub fn assignments(&self) -> Result<&[usize]> {
        self.assignments
            .as_deref()
            .ok_or(Error::NotFitted("KMeans"))
    }

    /// Pick the starting centroids: either the configured column indices or
    /// `k` distinct random columns.
    fn initial_centroids(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        let k = self.params.k;
        let idx = match &self.params.fit_idx {
            Some(fit_idx) => {
                if fit_idx.len() != k {
                    return Err(Error::Config(format!(
                        "fit_idx has {} entries but k is {}",
                        fit_idx.len(),
                        k
                    )));
                }
                if let Some(&bad) = fit_idx.iter().find(|&&i| i >= x.ncols()) {
                    return Err(Error::Config(format!(
                        "fit_idx index {} out of range for {} columns",
                        bad,
                        x.ncols()
                    )));
                }
                fit_idx.clone()
            }
            None => sample(&mut rand::thread_rng(), x.ncols(), k).into_vec(),
        };
        let mut c = Array2::zeros((x.nrows(), k));
        for (j, &col) in idx.iter().enumerate() {
            c.column_mut(j).assign(&x.column(col));
        }
        Ok(c)
    }

    /// Score matrix whose per-column argmax is the nearest centroid.
    fn score_matrix(c: &Array2<f64>, nor_c2: &Array1<f64>, x: &Array2<f64>) -> Array2<f64> {
        let nor_x2 = col_norms_sq(&x.view());
        let mut d = c.t().dot(x);
        for i in 0..d.nrows() {
            for j in 0..d.ncols() {
                d[(i, j)] -= 0.5 * nor_c2[i] + 0.5 * nor_x2[j];
            }
        }
        d
    }

    /// Centroid update that avoids empty clusters: each centroid becomes
    /// `(sum of assigned columns + old centroid) / (1 + count)`.
    fn updated_centroids(x: &Array2<f64>, assignments: &[usize], old_c: &Array2<f64>) -> Array2<f64> {
        let k = old_c.ncols();
        let mut sums = old_c.clone();
        let mut counts = vec![0usize; k];
        for (j, &cluster) in assignments.iter().enumerate() {
            counts[cluster] += 1;
            let mut target = sums.column_mut(cluster);
            target += &x.column(j);
        }
        for (cluster, mut col) in sums.columns_mut().into_iter().enumerate() {
            col.mapv_inplace(|v| v / (1.0 + counts[cluster] as f64));
        }
        sums
    }

    /// Compute the centroids.
    ///
    /// # Arguments
    ///
    /// * `x` - Matrix whose columns are the examples to cluster.
    pub fn fit(&mut self, x: &Array2<f64>) -> Result<()> {
        let k = self.params.k;
        if k == 0 || k > x.ncols() {
            return Err(Error::Config(format!(
                "k = {} must be in [1, {}]",
                k,
                x.ncols()
            )));
        }

        let mut c = self.initial_centroids(x)?;
        let mut assignments: Vec<usize> = Vec::new();
        let mut prev_assignments: Option<Vec<usize>> = None;

        for iteration in 0..self.params.iter {
            let nor_c2 = col_norms_sq(&c.view());
            let d = Self::score_matrix(&c, &nor_c2, x);
            assignments = argmax_columns(&d.view());

            if log::log_enabled!(log::Level::Trace) {
                let mut energy = 0.0;
                for (j, &cluster) in assignments.iter().enumerate() {
                    if d[(cluster, j)] < 0.0 {
                        energy += (-2.0 * d[(cluster, j)]).sqrt();
                    }
                }
                log::trace!(
                    "iteration {}: mean energy {}",
                    iteration,
                    energy / x.ncols() as f64
                );
            }

            if prev_assignments.as_deref() == Some(assignments.as_slice()) {
                log::trace!("converged at iteration {}", iteration);
                break;
            }
            prev_assignments = Some(assignments.clone());
            c = Self::updated_centroids(x, &assignments, &c);
        }

        self.nor_c2 = Some(col_norms_sq(&c.view()));
        self.centroids = Some(c);
        self.assignments = Some(assignments);
        Ok(())
    }

    /// Cluster id of the nearest centroid for each column of `x`.
    pub fn predict(&self, x: &Array2<f64>) -> Result<Vec<usize>> {
        let c = self.centroids()?;
        if x.nrows() != c.nrows() {
            return Err(Error::InvalidShape {
                what: "KMeans::predict input",
                expected: c.nrows(),
                found: x.nrows(),
            });
        }
        let nor_c2 = self.nor_c2.as_ref().ok_or(Error::NotFitted("KMeans"))?;
        let d = Self::score_matrix(c, nor_c2, x);
        Ok(argmax_columns(&d.view()))
    }

    /// Squared-distance-like scores of every column of `x` to each
    /// centroid: `-2·D`, one row per centroid.
    pub fn transform(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        let c = self.centroids()?;
        if x.nrows() != c.nrows() {
            return Err(Error::InvalidShape {
                what: "KMeans::transform input",
                expected: c.nrows(),
                found: x.nrows(),
            });
        }
        let nor_c2 = self.nor_c2.as_ref().ok_or(Error::NotFitted("KMeans"))?;
        let d = Self::score_matrix(c, nor_c2, x);
        Ok(d.mapv(|v| -2.0 * v))
    }

    /// Relabel the clusters: centroid `i` becomes centroid `mapping[i]` and
    /// the stored assignments are remapped accordingly.
    pub fn permute_centroids(&mut self, mapping: &[usize]) -> Result<()> {
        let c = self.centroids()?.clone();
        let k = c.ncols();
        if mapping.len() != k {
            return Err(Error::Config(format!(
                "mapping has {} entries but k is {}",
                mapping.len(),
                k
            )));
        }
        let mut seen = vec![false; k];
        for &target in mapping {
            if target >= k || seen[target] {
                return Err(Error::Config(
                    "mapping must be a permutation of the cluster ids".into(),
                ));
            }
            seen[target] = true;
        }

        let mut permuted = Array2::zeros((c.nrows(), k));
        for (i, &target) in mapping.iter().enumerate() {
            permuted.column_mut(target).assign(&c.column(i));
        }
        if let Some(assignments) = self.assignments.as_mut() {
            for a in assignments.iter_mut() {
                *a = mapping[*a];
            }
        }
        self.nor_c2 = Some(col_norms_sq(&permuted.view()));
        self.centroids = Some(permuted);
        Ok(())
    }

    /// Serialize the model state (centroids, cached norms, assignments and
    /// hyperparameters).
    pub fn save<W: Write>(&self, out: &mut W) -> Result<()> {
        if self.centroids.is_none() {
            return Err(Error::NotFitted("KMeans"));
        }
        serde_json::to_writer(out, self)?;
        Ok(())
    }

    /// Restore a model previously written with [`KMeans::save`].
    pub fn load<R: Read>(input: R) -> Result<Self> {
        Ok(serde_json::from_reader(input)?)
    }
}
