//! Feature-extraction contract.
//!
//! The toolkit never interprets domain records directly: a
//! [`FeatureExtractor`] implementation owns the record schema and feature
//! space, and hands the learning modules dense vectors and column
//! matrices.

use ndarray::{Array1, Array2};

use crate::error::{Error, Result};

/// Maps domain records (and free-text queries) into the fixed-dimensional
/// feature space the models operate in.
pub trait FeatureExtractor<R> {
    /// Dimension of the produced feature vectors.
    fn dim(&self) -> usize;

    /// Feature vector for a single record.
    fn extract_vector(&self, record: &R) -> Result<Array1<f64>>;

    /// Feature vector for a free-text query.
    fn extract_query(&self, query: &str) -> Result<Array1<f64>>;

    /// Column matrix of feature vectors for a record set.
    fn extract_matrix(&self, records: &[R]) -> Result<Array2<f64>> {
        let mut matrix = Array2::zeros((self.dim(), records.len()));
        for (j, record) in records.iter().enumerate() {
            let vec = self.extract_vector(record)?;
            if vec.len() != self.dim() {
                return Err(Error::InvalidShape {
                    what: "extracted feature vector",
                    expected: self.dim(),
                    found: vec.len(),
                });
            }
            matrix.column_mut(j).assign(&vec);
        }
        Ok(matrix)
    }
}
