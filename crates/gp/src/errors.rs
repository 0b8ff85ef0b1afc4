use thiserror::Error;

/// A result type for GP regression algorithm
pub type Result<T> = std::result::Result<T, GpError>;

/// An error when using [`GaussianProcess`](crate::GaussianProcess), the [`linalg`](crate::linalg)
/// primitives or the [`MvnSampler`](crate::MvnSampler)
#[derive(Error, Debug)]
pub enum GpError {
    /// When operand shapes are incompatible
    #[error("Dimension mismatch in {op}: expected {expected}, found {found}")]
    DimensionMismatch {
        /// Operation which detected the mismatch
        op: &'static str,
        /// Expected shape
        expected: String,
        /// Actual shape
        found: String,
    },
    /// When a kernel hyperparameter is out of its domain
    #[error("Invalid hyperparameter {name} = {value}")]
    InvalidHyperparameter {
        /// Hyperparameter name (v, l, s)
        name: &'static str,
        /// Rejected value
        value: f64,
    },
    /// When a factorization or an inversion fails numerically
    #[error("Singular matrix: {0}")]
    SingularMatrix(String),
    /// When linear algebra computation fails
    #[error(transparent)]
    LinalgError(#[from] linfa_linalg::LinalgError),
    /// When a linfa error occurs
    #[error(transparent)]
    LinfaError(#[from] linfa::error::Error),
    /// When error due to a bad value
    #[error("InvalidValue error: {0}")]
    InvalidValueError(String),
}

impl GpError {
    /// Build a `DimensionMismatch` from two shapes
    pub(crate) fn mismatch(op: &'static str, expected: &[usize], found: &[usize]) -> GpError {
        GpError::DimensionMismatch {
            op,
            expected: format!("{expected:?}"),
            found: format!("{found:?}"),
        }
    }
}
