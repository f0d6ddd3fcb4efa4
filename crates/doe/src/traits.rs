use linfa::Float;
use ndarray::Array2;

/// Sampling method generating a DoE within a box-shaped design space
///
/// The design space is `[lower_i, upper_i]` for each component `i` of a sample,
/// given as a (nx, 2) matrix.
pub trait SamplingMethod<F: Float> {
    /// Returns the (nx, 2) design space where the ith row holds the bounds of the ith component.
    fn sampling_space(&self) -> &Array2<F>;

    /// Generates `ns` samples in the unit hypercube `[0., 1.]^nx` as a (ns, nx) matrix
    fn normalized_sample(&self, ns: usize) -> Array2<F>;

    /// Generates `ns` samples within the design space as a (ns, nx) matrix
    ///
    /// Normalized samples are rescaled componentwise: `x_i = lower_i + u_i * (upper_i - lower_i)`
    fn sample(&self, ns: usize) -> Array2<F> {
        let xlimits = self.sampling_space();
        let lower = xlimits.column(0);
        let width = &xlimits.column(1) - &lower;
        self.normalized_sample(ns) * width + lower
    }
}
