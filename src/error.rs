use std::error::Error as StdError;
use std::fmt;

/// Crate-wide error type for model construction, fitting and prediction.
#[derive(Debug)]
pub enum Error {
    /// Invalid hyperparameter or missing required construction input.
    Config(String),
    /// Input dimensions do not match what the model was built or fitted with.
    InvalidShape {
        what: &'static str,
        expected: usize,
        found: usize,
    },
    /// `predict`/`decision_function`/`transform` called before a successful fit.
    NotFitted(&'static str),
    /// Curve evaluation over data that contains only one class.
    DegenerateCurve(&'static str),
    /// Numerical failure inside a linear-algebra kernel.
    Numerical(String),
    /// Model save/load failure.
    Serialization(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Config(msg) => write!(f, "invalid configuration: {}", msg),
            Error::InvalidShape {
                what,
                expected,
                found,
            } => write!(f, "{}: expected {}, found {}", what, expected, found),
            Error::NotFitted(model) => write!(f, "{}: model has not been fitted yet", model),
            Error::DegenerateCurve(msg) => write!(f, "degenerate curve: {}", msg),
            Error::Numerical(msg) => write!(f, "numerical failure: {}", msg),
            Error::Serialization(msg) => write!(f, "serialization failure: {}", msg),
        }
    }
}

impl StdError for Error {}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;
