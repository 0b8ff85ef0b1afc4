use linfa::Float;
use ndarray::Array2;

/// A design of experiments: a way to place `ns` points in a box-bounded space
/// `[lower_1, upper_1] x ... x [lower_nx, upper_nx]`.
pub trait SamplingMethod<F: Float> {
    /// Bounds of the space as a (nx, 2) matrix, one `[lower, upper]` row per component
    fn sampling_space(&self) -> &Array2<F>;

    /// Dimension `nx` of the points
    fn dim(&self) -> usize {
        self.sampling_space().nrows()
    }

    /// Generates `ns` points in the unit hypercube `[0, 1]^nx` as a (ns, nx) matrix
    fn normalized_sample(&self, ns: usize) -> Array2<F>;

    /// Generates `ns` points in the sampling space as a (ns, nx) matrix
    /// by scaling the normalized design to the bounds.
    fn sample(&self, ns: usize) -> Array2<F> {
        let xlimits = self.sampling_space();
        let lower = xlimits.column(0);
        let width = &xlimits.column(1) - &lower;
        self.normalized_sample(ns) * width + lower
    }
}
