//! Batch model: one-vs-all training straight from domain records.
//!
//! Composes a [`FeatureExtractor`] with [`OneVsAll`] so callers can train
//! and score on records without touching feature vectors themselves.

use ndarray::Array1;

use crate::error::Result;
use crate::features::FeatureExtractor;
use crate::models::BinaryModelFactory;
use crate::multiclass::OneVsAll;

/// Multiclass model trained from records through a feature extractor.
pub struct BatchModel<E, F: BinaryModelFactory> {
    extractor: E,
    model: OneVsAll<F>,
}

impl<E, F: BinaryModelFactory> BatchModel<E, F> {
    pub fn new(extractor: E, factory: F, cats: usize) -> Result<Self> {
        Ok(Self {
            extractor,
            model: OneVsAll::new(factory, cats)?,
        })
    }

    pub fn extractor(&self) -> &E {
        &self.extractor
    }

    pub fn model(&self) -> &OneVsAll<F> {
        &self.model
    }

    /// Extract features for all records and train the category models.
    pub fn fit<R>(&mut self, records: &[R], labels: &[i32]) -> Result<()>
    where
        E: FeatureExtractor<R>,
    {
        log::info!("batch model: extracting features for {} records", records.len());
        let x = self.extractor.extract_matrix(records)?;
        self.model.fit(&x, labels)
    }

    /// Per-category decision scores for a single record.
    pub fn decision_function<R>(&self, record: &R) -> Result<Array1<f64>>
    where
        E: FeatureExtractor<R>,
    {
        let x = self.extractor.extract_vector(record)?;
        self.model.decision_function(x.view())
    }

    /// Highest-scoring category for a single record.
    pub fn predict<R>(&self, record: &R) -> Result<usize>
    where
        E: FeatureExtractor<R>,
    {
        let x = self.extractor.extract_vector(record)?;
        self.model.predict(x.view())
    }
}
