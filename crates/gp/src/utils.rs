use crate::errors::{GpError, Result};
use linfa::Float;
use ndarray::{Array1, Array2, ArrayBase, Data, Ix1, Ix2, Zip};

/// Computes squared euclidean distances between every row of `a` and every row of `b`
/// resulting in a 2d array of shape (nrows(a), nrows(b)) where `[i, j] = ‖a_i - b_j‖²`.
pub fn squared_pairwise_distance<F: Float>(
    a: &ArrayBase<impl Data<Elem = F>, Ix2>,
    b: &ArrayBase<impl Data<Elem = F>, Ix2>,
) -> Result<Array2<F>> {
    if a.ncols() != b.ncols() {
        return Err(GpError::mismatch(
            "squared_pairwise_distance",
            &[b.nrows(), a.ncols()],
            &[b.nrows(), b.ncols()],
        ));
    }

    let mut result = Array2::zeros((a.nrows(), b.nrows()));
    Zip::from(result.rows_mut())
        .and(a.rows())
        .for_each(|mut res_row, a_row| {
            Zip::from(&mut res_row)
                .and(b.rows())
                .for_each(|d, b_row| *d = squared_distance(&a_row, &b_row));
        });
    Ok(result)
}

/// Squared euclidean distance between two points
fn squared_distance<F: Float>(
    x: &ArrayBase<impl Data<Elem = F>, Ix1>,
    y: &ArrayBase<impl Data<Elem = F>, Ix1>,
) -> F {
    Zip::from(x)
        .and(y)
        .fold(F::zero(), |acc, &u, &v| acc + (u - v) * (u - v))
}

/// Empirical mean of the given values, `None` when empty
pub(crate) fn mean<F: Float>(y: &ArrayBase<impl Data<Elem = F>, Ix1>) -> Option<F> {
    y.mean()
}

/// Returns `n` evenly spaced values from `start` to `end` included, as a (n, 1) column
pub(crate) fn linspace_column<F: Float>(start: F, end: F, n: usize) -> Array2<F> {
    let values: Array1<F> = Array1::linspace(start, end, n);
    values.insert_axis(ndarray::Axis(1))
}
