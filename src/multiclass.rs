//! One-vs-all multiclass dispatch over a binary-model factory.
//!
//! For each category a fresh binary model is built and trained against a
//! ±1 binarized target vector; prediction picks the category whose model
//! scores highest.

use ndarray::{Array1, Array2, ArrayView1};

use crate::error::{Error, Result};
use crate::models::{BinaryModel, BinaryModelFactory};
use crate::preprocessing::Binarizer;

/// Multiclass classifier combining one binary model per category.
pub struct OneVsAll<F: BinaryModelFactory> {
    factory: F,
    cats: usize,
    models: Vec<F::Model>,
}

impl<F: BinaryModelFactory> OneVsAll<F> {
    /// # Arguments
    ///
    /// * `factory` - Produces a fresh untrained binary model per category.
    /// * `cats` - Number of categories; labels must lie in `[0, cats)`.
    pub fn new(factory: F, cats: usize) -> Result<Self> {
        if cats == 0 {
            return Err(Error::Config("OneVsAll requires at least one category".into()));
        }
        Ok(Self {
            factory,
            cats,
            models: Vec::new(),
        })
    }

    pub fn cats(&self) -> usize {
        self.cats
    }

    /// The per-category models trained by the last `fit`.
    pub fn models(&self) -> &[F::Model] {
        &self.models
    }

    /// Train one binary model per category.
    ///
    /// # Arguments
    ///
    /// * `x` - Feature matrix with training examples as columns.
    /// * `y` - Category index in `[0, cats)` for each column.
    pub fn fit(&mut self, x: &Array2<f64>, y: &[i32]) -> Result<()> {
        if x.ncols() != y.len() {
            return Err(Error::InvalidShape {
                what: "OneVsAll::fit targets",
                expected: x.ncols(),
                found: y.len(),
            });
        }
        if let Some(&bad) = y
            .iter()
            .find(|&&label| label < 0 || label as usize >= self.cats)
        {
            return Err(Error::Config(format!(
                "label {} outside of [0, {})",
                bad, self.cats
            )));
        }

        let mut models = Vec::with_capacity(self.cats);
        for cat in 0..self.cats {
            log::info!("fitting category {}/{}", cat + 1, self.cats);
            let target = Binarizer::new(cat as i32).transform(y);
            let mut model = self.factory.build();
            model.fit(x, &target)?;
            models.push(model);
        }
        self.models = models;
        Ok(())
    }

    fn check_fitted(&self) -> Result<()> {
        if self.models.is_empty() {
            return Err(Error::NotFitted("OneVsAll"));
        }
        Ok(())
    }

    /// Score a single example against every category model.
    ///
    /// # Returns
    ///
    /// A vector with one decision score per category; its semantics depend
    /// on the injected binary model.
    pub fn decision_function(&self, x: ArrayView1<f64>) -> Result<Array1<f64>> {
        self.check_fitted()?;
        let mut scores = Array1::zeros(self.cats);
        for (cat, model) in self.models.iter().enumerate() {
            scores[cat] = model.decision_function(x)?;
        }
        Ok(scores)
    }

    /// Score every column of `x`; the result has one row per category and
    /// one column per instance.
    pub fn decision_function_batch(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        self.check_fitted()?;
        let mut scores = Array2::zeros((self.cats, x.ncols()));
        for (i, col) in x.columns().into_iter().enumerate() {
            for (cat, model) in self.models.iter().enumerate() {
                scores[(cat, i)] = model.decision_function(col)?;
            }
        }
        Ok(scores)
    }

    /// Category with the highest score for a single example.
    pub fn predict(&self, x: ArrayView1<f64>) -> Result<usize> {
        let scores = self.decision_function(x)?;
        Ok(crate::math::argmax(&scores.view()))
    }

    /// Highest-scoring category for every column of `x`.
    pub fn predict_batch(&self, x: &Array2<f64>) -> Result<Vec<usize>> {
        let scores = self.decision_function_batch(x)?;
        Ok(crate::math::argmax_columns(&scores.view()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{LinearSvc, LinearSvcParams};
    use ndarray::arr2;

    fn factory() -> impl BinaryModelFactory<Model = LinearSvc> {
        || LinearSvc::new(LinearSvcParams::default())
    }

    #[test]
    fn two_category_scenario() {
        // category 0 clusters around (1..2, 1..2), category 1 around negatives
        let x = arr2(&[[1.0, 2.0, 1.0, 1.0], [2.0, 1.0, -3.0, -4.0]]);
        let y = vec![0, 0, 1, 1];
        let mut ova = OneVsAll::new(factory(), 2).unwrap();
        ova.fit(&x, &y).unwrap();

        let probe = ndarray::arr1(&[1.0, 2.0]);
        assert_eq!(ova.predict(probe.view()).unwrap(), 0);
    }

    #[test]
    fn batch_prediction_matches_per_column() {
        let x = arr2(&[[1.0, 2.0, 1.0, 1.0], [2.0, 1.0, -3.0, -4.0]]);
        let y = vec![0, 0, 1, 1];
        let mut ova = OneVsAll::new(factory(), 2).unwrap();
        ova.fit(&x, &y).unwrap();

        let batch = ova.predict_batch(&x).unwrap();
        for (i, col) in x.columns().into_iter().enumerate() {
            assert_eq!(batch[i], ova.predict(col).unwrap());
        }
    }

    #[test]
    fn label_out_of_range_errors() {
        let x = arr2(&[[1.0, 2.0], [2.0, 1.0]]);
        let mut ova = OneVsAll::new(factory(), 2).unwrap();
        assert!(ova.fit(&x, &[0, 5]).is_err());
    }

    #[test]
    fn predict_before_fit_errors() {
        let ova = OneVsAll::new(factory(), 2).unwrap();
        let probe = ndarray::arr1(&[1.0, 2.0]);
        assert!(ova.predict(probe.view()).is_err());
    }
}
