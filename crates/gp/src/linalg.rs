//! Dense linear algebra primitives used by the regressor and the sampler.
//!
//! Matrices are [`ndarray::Array2`] values in standard (row-major) layout: element `(i, j)`
//! is stored at flat offset `i * ncols + j`. Every function returns a freshly allocated
//! result and never aliases its inputs. Shape errors are reported as
//! [`GpError::DimensionMismatch`] rather than panics.
use crate::errors::{GpError, Result};

use linfa::Float;
use linfa_linalg::{cholesky::*, triangular::*};
use ndarray::{Array1, Array2, ArrayBase, Axis, Data, Ix1, Ix2};
use ndarray_stats::QuantileExt;
#[cfg(feature = "serializable")]
use serde::{Deserialize, Serialize};

/// Numerical thresholds under which a symmetric positive-definite matrix
/// is declared singular by [`invert`].
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serializable", derive(Serialize, Deserialize))]
pub struct InversionTolerance<F: Float> {
    /// Smallest admissible pivot `L_ii²` of the Cholesky factorization
    pub min_pivot: F,
    /// Largest admissible condition estimate `(max L_ii / min L_ii)²`
    pub max_condition: F,
}

impl<F: Float> Default for InversionTolerance<F> {
    fn default() -> Self {
        InversionTolerance {
            min_pivot: F::cast(1e-10),
            max_condition: F::cast(1e14),
        }
    }
}

fn check_same_shape<F: Float>(
    op: &'static str,
    a: &ArrayBase<impl Data<Elem = F>, Ix2>,
    b: &ArrayBase<impl Data<Elem = F>, Ix2>,
) -> Result<()> {
    if a.shape() != b.shape() {
        return Err(GpError::mismatch(op, a.shape(), b.shape()));
    }
    Ok(())
}

fn check_square<F: Float>(op: &'static str, a: &ArrayBase<impl Data<Elem = F>, Ix2>) -> Result<()> {
    if a.nrows() != a.ncols() {
        return Err(GpError::mismatch(
            op,
            &[a.nrows(), a.nrows()],
            &[a.nrows(), a.ncols()],
        ));
    }
    Ok(())
}

/// Elementwise sum `A + B`
pub fn add<F: Float>(
    a: &ArrayBase<impl Data<Elem = F>, Ix2>,
    b: &ArrayBase<impl Data<Elem = F>, Ix2>,
) -> Result<Array2<F>> {
    check_same_shape("add", a, b)?;
    Ok(a + b)
}

/// Elementwise difference `A - B`
pub fn subtract<F: Float>(
    a: &ArrayBase<impl Data<Elem = F>, Ix2>,
    b: &ArrayBase<impl Data<Elem = F>, Ix2>,
) -> Result<Array2<F>> {
    check_same_shape("subtract", a, b)?;
    Ok(a - b)
}

/// Matrix product `A · B`, requires `A.ncols == B.nrows`
pub fn multiply<F: Float>(
    a: &ArrayBase<impl Data<Elem = F>, Ix2>,
    b: &ArrayBase<impl Data<Elem = F>, Ix2>,
) -> Result<Array2<F>> {
    if a.ncols() != b.nrows() {
        return Err(GpError::mismatch(
            "multiply",
            &[a.ncols(), b.ncols()],
            &[b.nrows(), b.ncols()],
        ));
    }
    Ok(a.dot(b))
}

/// Transposed copy of `A` in standard layout
pub fn transpose<F: Float>(a: &ArrayBase<impl Data<Elem = F>, Ix2>) -> Array2<F> {
    a.t().as_standard_layout().into_owned()
}

/// Identity matrix of size `n`
pub fn identity<F: Float>(n: usize) -> Array2<F> {
    Array2::eye(n)
}

/// Identity matrix of size `n` scaled by `scale`, used as diagonal regularization
pub fn scaled_identity<F: Float>(n: usize, scale: F) -> Array2<F> {
    Array2::from_diag_elem(n, scale)
}

/// Diagonal `A[i][i]` of a square matrix
pub fn diagonal<F: Float>(a: &ArrayBase<impl Data<Elem = F>, Ix2>) -> Result<Array1<F>> {
    check_square("diagonal", a)?;
    Ok(a.diag().to_owned())
}

/// Frobenius norm `sqrt(sum A_ij²)`
pub fn frobenius_norm<F: Float>(a: &ArrayBase<impl Data<Elem = F>, Ix2>) -> F {
    a.fold(F::zero(), |acc, &v| acc + v * v).sqrt()
}

/// Symmetric part `(A + Aᵗ) / 2` of a square matrix
pub fn symmetrize<F: Float>(a: &ArrayBase<impl Data<Elem = F>, Ix2>) -> Result<Array2<F>> {
    check_square("symmetrize", a)?;
    Ok((a + &a.t()).mapv(|v| v * F::cast(0.5)))
}

/// View a vector as a `(n, 1)` column matrix
pub fn as_column<F: Float>(v: &ArrayBase<impl Data<Elem = F>, Ix1>) -> Array2<F> {
    v.to_owned().insert_axis(Axis(1))
}

/// Lower triangular factor `L` such that `L · Lᵗ = A`
pub fn cholesky<F: Float>(a: &ArrayBase<impl Data<Elem = F>, Ix2>) -> Result<Array2<F>> {
    check_square("cholesky", a)?;
    if a.is_empty() {
        return Err(GpError::SingularMatrix("empty matrix".to_string()));
    }
    a.cholesky()
        .map_err(|err| GpError::SingularMatrix(format!("cholesky factorization failed ({err})")))
}

/// Inverse of a symmetric positive-definite matrix computed from its Cholesky factor.
///
/// Fails with [`GpError::SingularMatrix`] when the factorization breaks down, when the
/// smallest pivot falls below `tol.min_pivot` or when the condition estimate exceeds
/// `tol.max_condition`. The returned inverse is exactly symmetric.
pub fn invert<F: Float>(
    a: &ArrayBase<impl Data<Elem = F>, Ix2>,
    tol: &InversionTolerance<F>,
) -> Result<Array2<F>> {
    let l = cholesky(a)?;
    let diag = l.diag();
    let min = *diag
        .min()
        .map_err(|err| GpError::SingularMatrix(format!("undefined pivot ({err})")))?;
    let max = *diag
        .max()
        .map_err(|err| GpError::SingularMatrix(format!("undefined pivot ({err})")))?;
    if min * min < tol.min_pivot {
        return Err(GpError::SingularMatrix(format!(
            "pivot {} below {}",
            min * min,
            tol.min_pivot
        )));
    }
    let cond = (max / min) * (max / min);
    if cond > tol.max_condition {
        return Err(GpError::SingularMatrix(format!(
            "condition estimate {} exceeds {}",
            cond, tol.max_condition
        )));
    }

    let rho = l.solve_triangular(&identity::<F>(a.nrows()), UPLO::Lower)?;
    let inv = l.t().solve_triangular(&rho, UPLO::Upper)?;
    symmetrize(&inv)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    #[test]
    fn test_elementwise_ops() {
        let a = array![[1., 2.], [3., 4.]];
        let b = array![[0.5, 0.5], [1., -1.]];
        assert_abs_diff_eq!(add(&a, &b).unwrap(), array![[1.5, 2.5], [4., 3.]]);
        assert_abs_diff_eq!(subtract(&a, &b).unwrap(), array![[0.5, 1.5], [2., 5.]]);
    }

    #[test]
    fn test_shape_mismatch() {
        let a = array![[1., 2.], [3., 4.]];
        let b = array![[1., 2., 3.]];
        assert!(matches!(
            add(&a, &b),
            Err(GpError::DimensionMismatch { op: "add", .. })
        ));
        assert!(matches!(
            multiply(&a, &b),
            Err(GpError::DimensionMismatch { op: "multiply", .. })
        ));
        assert!(matches!(
            diagonal(&b),
            Err(GpError::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn test_multiply_transpose() {
        let a = array![[1., 2., 3.], [4., 5., 6.]];
        let at = transpose(&a);
        assert_eq!(at.shape(), &[3, 2]);
        assert!(at.is_standard_layout());
        let aat = multiply(&a, &at).unwrap();
        assert_abs_diff_eq!(aat, array![[14., 32.], [32., 77.]]);
    }

    #[test]
    fn test_identity_diagonal_norm() {
        let i3 = scaled_identity(3, 2.);
        assert_abs_diff_eq!(diagonal(&i3).unwrap(), array![2., 2., 2.]);
        assert_abs_diff_eq!(frobenius_norm(&identity::<f64>(4)), 2.);
        assert_abs_diff_eq!(frobenius_norm(&array![[3., 0.], [0., 4.]]), 5.);
    }

    #[test]
    fn test_invert_spd() {
        let a = array![[4., 1., 0.5], [1., 3., 0.2], [0.5, 0.2, 2.]];
        let inv = invert(&a, &InversionTolerance::default()).unwrap();
        assert_abs_diff_eq!(a.dot(&inv), identity::<f64>(3), epsilon = 1e-12);
        assert_abs_diff_eq!(inv, inv.t(), epsilon = 0.);
    }

    #[test]
    fn test_invert_singular() {
        let a = array![[1., 1.], [1., 1.]];
        assert!(matches!(
            invert(&a, &InversionTolerance::default()),
            Err(GpError::SingularMatrix(_))
        ));
    }

    #[test]
    fn test_invert_ill_conditioned() {
        let a = array![[1., 0.], [0., 1e-9]];
        let tol = InversionTolerance {
            min_pivot: 1e-12,
            max_condition: 1e6,
        };
        assert!(matches!(invert(&a, &tol), Err(GpError::SingularMatrix(_))));
        let tol = InversionTolerance {
            min_pivot: 1e-12,
            max_condition: 1e12,
        };
        assert_abs_diff_eq!(
            invert(&a, &tol).unwrap(),
            array![[1., 0.], [0., 1e9]],
            epsilon = 1e-3
        );
    }

    #[test]
    fn test_cholesky_reconstruction() {
        let a = array![[4., 2.], [2., 3.]];
        let l = cholesky(&a).unwrap();
        assert_abs_diff_eq!(l[[0, 1]], 0.);
        assert_abs_diff_eq!(l.dot(&l.t()), a, epsilon = 1e-12);
    }
}
