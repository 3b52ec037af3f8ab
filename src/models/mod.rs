pub mod linear_svc;
#[cfg(feature = "svm")]
pub mod svm;

pub use linear_svc::{LinearSvc, LinearSvcParams};

use ndarray::{Array1, Array2, ArrayView1};

use crate::error::Result;

/// Contract for the binary models consumed by the multiclass dispatcher and
/// the active learner. `y` uses the crate convention: +1 for positive
/// examples, -1 for negative ones. `x` holds examples as columns.
pub trait BinaryModel {
    /// Fit the model on column examples `x` with ±1 targets `y`.
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()>;

    /// Raw decision score for a single example; the sign carries the class.
    fn decision_function(&self, x: ArrayView1<f64>) -> Result<f64>;

    /// Class prediction in {+1, -1} derived from the decision score.
    fn predict(&self, x: ArrayView1<f64>) -> Result<f64> {
        Ok(if self.decision_function(x)? > 0.0 {
            1.0
        } else {
            -1.0
        })
    }

    /// Optional human readable name for the model.
    fn name(&self) -> &str {
        "binary-model"
    }
}

impl BinaryModel for Box<dyn BinaryModel> {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        (**self).fit(x, y)
    }

    fn decision_function(&self, x: ArrayView1<f64>) -> Result<f64> {
        (**self).decision_function(x)
    }

    fn predict(&self, x: ArrayView1<f64>) -> Result<f64> {
        (**self).predict(x)
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

/// Produces a fresh, untrained binary model per invocation. Implemented for
/// any closure returning a `BinaryModel`, so callers can inject either a
/// concrete model type or a boxed trait object.
pub trait BinaryModelFactory {
    type Model: BinaryModel;

    fn build(&self) -> Self::Model;
}

impl<M: BinaryModel, F: Fn() -> M> BinaryModelFactory for F {
    type Model = M;

    fn build(&self) -> M {
        self()
    }
}
