//! A module for covariance functions (kernels) of the GP prior.
//!
//! The following kernel is implemented:
//! * squared exponential (RBF), `k(x, x') = v² exp(-‖x - x'‖² / (2 l²))`.

use crate::errors::{GpError, Result};
use crate::utils::squared_pairwise_distance;
use linfa::Float;
use ndarray::{Array1, Array2, ArrayBase, Data, Ix2};
#[cfg(feature = "serializable")]
use serde::{Deserialize, Serialize};
use std::fmt;

/// A trait for using a covariance function in GP regression
pub trait Kernel<F: Float>: Clone + fmt::Debug + fmt::Display + Send + Sync {
    /// Compute the kernel matrix `K(a, b)` of shape (nrows(a), nrows(b))
    /// where `[i, j] = k(a_i, b_j)`.
    /// Fails with `DimensionMismatch` when `a` and `b` have different number of columns.
    fn evaluate(
        &self,
        a: &ArrayBase<impl Data<Elem = F>, Ix2>,
        b: &ArrayBase<impl Data<Elem = F>, Ix2>,
    ) -> Result<Array2<F>>;

    /// Compute the diagonal of `K(a, a)` without building the whole matrix
    fn diag(&self, a: &ArrayBase<impl Data<Elem = F>, Ix2>) -> Array1<F>;

    /// Prior variance `k(x, x)` of the process at any point
    fn prior_variance(&self) -> F;
}

/// Squared exponential kernel parameterized by a vertical (output) scale `v`
/// and a length scale `l`.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serializable", derive(Serialize, Deserialize))]
pub struct SquaredExponentialKernel<F: Float> {
    vertical_scale: F,
    length_scale: F,
}

impl<F: Float> Default for SquaredExponentialKernel<F> {
    fn default() -> Self {
        SquaredExponentialKernel {
            vertical_scale: F::one(),
            length_scale: F::one(),
        }
    }
}

impl<F: Float> SquaredExponentialKernel<F> {
    /// Constructor, fails with `InvalidHyperparameter` if `v` or `l` is not strictly positive
    pub fn new(vertical_scale: F, length_scale: F) -> Result<Self> {
        check_scale("v", vertical_scale)?;
        check_scale("l", length_scale)?;
        Ok(SquaredExponentialKernel {
            vertical_scale,
            length_scale,
        })
    }

    /// Vertical scale `v`
    pub fn vertical_scale(&self) -> F {
        self.vertical_scale
    }

    /// Length scale `l`
    pub fn length_scale(&self) -> F {
        self.length_scale
    }
}

pub(crate) fn check_scale<F: Float>(name: &'static str, value: F) -> Result<()> {
    if !(value > F::zero()) || !value.is_finite() {
        return Err(GpError::InvalidHyperparameter {
            name,
            value: value.to_f64().unwrap_or(f64::NAN),
        });
    }
    Ok(())
}

impl<F: Float> fmt::Display for SquaredExponentialKernel<F> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "SquaredExponential(v={}, l={})",
            self.vertical_scale, self.length_scale
        )
    }
}

impl<F: Float> Kernel<F> for SquaredExponentialKernel<F> {
    fn evaluate(
        &self,
        a: &ArrayBase<impl Data<Elem = F>, Ix2>,
        b: &ArrayBase<impl Data<Elem = F>, Ix2>,
    ) -> Result<Array2<F>> {
        let v2 = self.prior_variance();
        let factor = F::cast(-0.5) / (self.length_scale * self.length_scale);
        let d2 = squared_pairwise_distance(a, b)?;
        Ok(d2.mapv(|d| v2 * F::exp(factor * d)))
    }

    fn diag(&self, a: &ArrayBase<impl Data<Elem = F>, Ix2>) -> Array1<F> {
        Array1::from_elem(a.nrows(), self.prior_variance())
    }

    fn prior_variance(&self) -> F {
        self.vertical_scale * self.vertical_scale
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::{array, Array};

    #[test]
    fn test_squared_exponential_values() {
        let kernel = SquaredExponentialKernel::new(2., 0.5).unwrap();
        let a = array![[0.], [1.]];
        let b = array![[0.], [0.5], [2.]];
        let k = kernel.evaluate(&a, &b).unwrap();
        assert_eq!(k.shape(), &[2, 3]);
        // v² exp(-d² / (2 l²)) = 4 exp(-2 d²)
        let expected = array![
            [4., 4. * (-0.5f64).exp(), 4. * (-8f64).exp()],
            [4. * (-2f64).exp(), 4. * (-0.5f64).exp(), 4. * (-2f64).exp()]
        ];
        assert_abs_diff_eq!(k, expected, epsilon = 1e-12);
    }

    #[test]
    fn test_kernel_symmetry() {
        let x = Array::linspace(-3., 3., 7).into_shape((7, 1)).unwrap();
        let kernel = SquaredExponentialKernel::new(1.5, 0.8).unwrap();
        let k = kernel.evaluate(&x, &x).unwrap();
        for i in 0..7 {
            assert_abs_diff_eq!(k[[i, i]], 2.25, epsilon = 1e-12);
            for j in 0..7 {
                assert_eq!(k[[i, j]], k[[j, i]]);
            }
        }
        assert_abs_diff_eq!(kernel.diag(&x), k.diag().to_owned());
    }

    #[test]
    fn test_kernel_decreasing_with_distance() {
        let kernel = SquaredExponentialKernel::<f64>::default();
        let origin = array![[0., 0.]];
        let x = array![[0., 0.], [0.5, 0.], [1., 1.], [3., 0.]];
        let k = kernel.evaluate(&origin, &x).unwrap();
        assert!(k.row(0).windows(2).into_iter().all(|w| w[0] > w[1]));
    }

    #[test]
    fn test_shrinking_length_scale() {
        let x = array![[0.], [1.], [2.]];
        let kernel = SquaredExponentialKernel::new(1., 1e-2).unwrap();
        let k = kernel.evaluate(&x, &x).unwrap();
        assert_abs_diff_eq!(k, Array2::<f64>::eye(3), epsilon = 1e-12);
    }

    #[test]
    fn test_invalid_hyperparameters() {
        assert!(matches!(
            SquaredExponentialKernel::new(0., 1.),
            Err(GpError::InvalidHyperparameter { name: "v", .. })
        ));
        assert!(matches!(
            SquaredExponentialKernel::new(1., -2.),
            Err(GpError::InvalidHyperparameter { name: "l", .. })
        ));
        assert!(SquaredExponentialKernel::new(1., f64::NAN).is_err());
    }

    #[test]
    fn test_display() {
        let kernel = SquaredExponentialKernel::new(1., 0.5).unwrap();
        assert_eq!(kernel.to_string(), "SquaredExponential(v=1, l=0.5)");
    }
}
