use crate::SamplingMethod;
use linfa::Float;
use ndarray::{Array1, Array2, ArrayBase, Data, Ix2};

#[cfg(feature = "serializable")]
use serde::{Deserialize, Serialize};

/// The Grid design places samples evenly: in one dimension `ns` points
/// from lower to upper bound included, in `nx` dimensions the cartesian product
/// of the smallest number of evenly spaced levels per component giving at least `ns` points,
/// truncated to `ns` points.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serializable", derive(Serialize, Deserialize))]
pub struct Grid<F: Float> {
    /// Design space definition as a (nx, 2) matrix
    /// The ith row is the [lower_bound, upper_bound] of xi, the ith component of a sample x
    xlimits: Array2<F>,
}

impl<F: Float> Grid<F> {
    /// Constructor given a design space given a (nx, 2) matrix \[\[lower bound, upper bound\], ...\]
    ///
    /// ```
    /// use gpviz_doe::{Grid, SamplingMethod};
    /// use ndarray::arr2;
    ///
    /// let doe = Grid::new(&arr2(&[[-1.0, 1.0]])).sample(5);
    /// assert_eq!(doe.column(0).to_vec(), vec![-1.0, -0.5, 0.0, 0.5, 1.0]);
    /// ```
    ///
    /// **Panics** if xlimits number of columns is different from 2.
    pub fn new(xlimits: &ArrayBase<impl Data<Elem = F>, Ix2>) -> Self {
        if xlimits.ncols() != 2 {
            panic!("xlimits must have 2 columns (lower, upper)");
        }
        Grid {
            xlimits: xlimits.to_owned(),
        }
    }

    /// Number of levels per component needed to get at least `ns` points
    fn levels(&self, ns: usize) -> usize {
        let nx = self.xlimits.nrows() as u32;
        let mut n: usize = 1;
        while n.pow(nx) < ns {
            n += 1;
        }
        n
    }
}

impl<F: Float> SamplingMethod<F> for Grid<F> {
    fn sampling_space(&self) -> &Array2<F> {
        &self.xlimits
    }

    fn normalized_sample(&self, ns: usize) -> Array2<F> {
        let nx = self.xlimits.nrows();
        let n = self.levels(ns);
        let levels: Array1<F> = if n > 1 {
            Array1::linspace(F::zero(), F::one(), n)
        } else {
            Array1::zeros(1)
        };
        // the last component varies fastest
        Array2::from_shape_fn((ns, nx), |(i, j)| {
            let stride = n.pow((nx - 1 - j) as u32);
            levels[(i / stride) % n]
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::{arr2, array};

    #[test]
    fn test_grid_1d() {
        let xlimits = arr2(&[[-4., 4.]]);
        let actual = Grid::new(&xlimits).sample(5);
        let expected = array![[-4.], [-2.], [0.], [2.], [4.]];
        assert_abs_diff_eq!(expected, actual, epsilon = 1e-12);
    }

    #[test]
    fn test_grid_single_point() {
        let xlimits = arr2(&[[-0.05, 0.05]]);
        let actual = Grid::new(&xlimits).sample(1);
        assert_abs_diff_eq!(array![[-0.05]], actual, epsilon = 1e-12);
    }

    #[test]
    fn test_grid_2d() {
        let xlimits = arr2(&[[0., 1.], [5., 10.]]);
        let expected = array![
            [0., 5.],
            [0., 7.5],
            [0., 10.],
            [0.5, 5.],
            [0.5, 7.5],
            [0.5, 10.],
            [1., 5.],
        ];
        let actual = Grid::new(&xlimits).sample(7);
        assert_abs_diff_eq!(expected, actual, epsilon = 1e-12);
    }
}
