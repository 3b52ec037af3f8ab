//! SVM-backed binary model built on `linfa-svm` (enabled with the `svm`
//! cargo feature). The solver internals stay in `linfa`; this wrapper only
//! adapts data layout (column examples -> row records) and exposes the
//! [`BinaryModel`] contract.

use linfa::dataset::Pr;
use linfa::traits::{Fit, Predict};
use linfa::Dataset;
use linfa_svm::Svm;
use ndarray::{Array1, Array2, ArrayView1};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::models::BinaryModel;

/// Hyperparameters for [`SvmClassifier`].
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct SvmParams {
    pub eps: f64,
    /// Positive/negative class weights.
    pub c: (f64, f64),
    /// Kernel name: "linear", "gauss" or "poly".
    pub kernel: String,
    pub gaussian_kernel_eps: f64,
    pub polynomial_kernel_constant: f64,
    pub polynomial_kernel_degree: f64,
}

impl Default for SvmParams {
    fn default() -> Self {
        Self {
            eps: 0.1,
            c: (1.0, 1.0),
            kernel: "linear".to_string(),
            gaussian_kernel_eps: 0.1,
            polynomial_kernel_constant: 1.0,
            polynomial_kernel_degree: 3.0,
        }
    }
}

pub struct SvmClassifier {
    model: Option<Svm<f64, Pr>>,
    params: SvmParams,
}

impl SvmClassifier {
    pub fn new(params: SvmParams) -> Self {
        SvmClassifier {
            model: None,
            params,
        }
    }
}

impl BinaryModel for SvmClassifier {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        if x.ncols() != y.len() {
            return Err(Error::InvalidShape {
                what: "SvmClassifier::fit targets",
                expected: x.ncols(),
                found: y.len(),
            });
        }
        // linfa expects row records
        let records = x.t().to_owned();
        let targets: Array1<bool> = y.mapv(|l| l > 0.0);
        let dataset = Dataset::new(records, targets);

        let (c1, c2) = self.params.c;
        let mut model = Svm::<f64, Pr>::params()
            .eps(self.params.eps)
            .pos_neg_weights(c1, c2);

        model = match self.params.kernel.as_str() {
            "linear" => model.linear_kernel(),
            "gauss" => model.gaussian_kernel(self.params.gaussian_kernel_eps),
            "poly" => model.polynomial_kernel(
                self.params.polynomial_kernel_constant,
                self.params.polynomial_kernel_degree,
            ),
            other => {
                return Err(Error::Config(format!(
                    "unsupported kernel type: {}. Valid options are: linear, gauss, poly",
                    other
                )))
            }
        };

        let fitted = model
            .fit(&dataset)
            .map_err(|e| Error::Numerical(format!("svm training failed: {}", e)))?;
        self.model = Some(fitted);
        Ok(())
    }

    fn decision_function(&self, x: ArrayView1<f64>) -> Result<f64> {
        let model = self
            .model
            .as_ref()
            .ok_or(Error::NotFitted("SvmClassifier"))?;
        let record = x
            .to_owned()
            .into_shape((1, x.len()))
            .map_err(|e| Error::Numerical(e.to_string()))?;
        let predictions = model.predict(record);
        let p: f64 = *predictions[0];
        // probability recentered so the sign carries the class
        Ok(2.0 * p - 1.0)
    }

    fn name(&self) -> &str {
        "svm"
    }
}
