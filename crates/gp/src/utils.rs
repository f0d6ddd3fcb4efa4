use linfa::Float;
use ndarray::{Array1, Array2, ArrayBase, Axis, Data, Ix2, s};
#[cfg(feature = "serializable")]
use serde::{Deserialize, Serialize};

/// A structure to store (n, xdim) matrix data and its mean and standard deviation vectors.
///
/// Statistics are computed once from training data and reused as is
/// to normalize any later query.
#[derive(Debug, Clone)]
#[cfg_attr(
    feature = "serializable",
    derive(Serialize, Deserialize),
    serde(bound(deserialize = "F: Deserialize<'de>"))
)]
pub(crate) struct NormalizedData<F: Float> {
    /// normalized data
    pub data: Array2<F>,
    /// mean vector computed from data
    pub mean: Array1<F>,
    /// standard deviation vector computed from data
    pub std: Array1<F>,
}

impl<F: Float> NormalizedData<F> {
    /// Constructor
    pub fn new(x: &ArrayBase<impl Data<Elem = F>, Ix2>) -> NormalizedData<F> {
        let (data, mean, std) = normalize(x);
        NormalizedData { data, mean, std }
    }

    /// Dimension of data points
    pub fn ncols(&self) -> usize {
        self.data.ncols()
    }

    /// Normalize `x` with the stored statistics
    pub fn apply(&self, x: &ArrayBase<impl Data<Elem = F>, Ix2>) -> Array2<F> {
        (x - &self.mean) / &self.std
    }
}

/// Center and scale columns of `x`, a zero standard deviation is replaced by one
/// so that constant columns stay finite.
pub fn normalize<F: Float>(
    x: &ArrayBase<impl Data<Elem = F>, Ix2>,
) -> (Array2<F>, Array1<F>, Array1<F>) {
    let x_mean = x
        .mean_axis(Axis(0))
        .unwrap_or_else(|| Array1::zeros(x.ncols()));
    let ddof = if x.nrows() > 1 { F::one() } else { F::zero() };
    let mut x_std = x.std_axis(Axis(0), ddof);
    x_std.mapv_inplace(|v| if v == F::zero() { F::one() } else { v });
    let xnorm = (x - &x_mean) / &x_std;

    (xnorm, x_mean, x_std)
}

/// A structure to retain absolute differences computation used to compute covariance matrix
#[derive(Debug)]
pub struct DiffMatrix<F: Float> {
    /// Differences as (n_obs * (n_obs-1))/2, nx) array
    pub d: Array2<F>,
    /// Indices of the differences in the original data array
    pub d_indices: Array2<usize>,
    /// Number of observations
    pub n_obs: usize,
}

impl<F: Float> DiffMatrix<F> {
    /// Compute differences given points given as an array (n_obs, nx)
    pub fn new(x: &ArrayBase<impl Data<Elem = F>, Ix2>) -> DiffMatrix<F> {
        let n_obs = x.nrows();
        let nx = x.ncols();
        let n_pairs = n_obs * n_obs.saturating_sub(1) / 2;
        let mut d_indices = Array2::<usize>::zeros((n_pairs, 2));
        let mut d = Array2::zeros((n_pairs, nx));

        let mut start = 0;
        for k in 0..n_obs.saturating_sub(1) {
            let end = start + n_obs - k - 1;
            for (r, i) in (start..end).zip(k + 1..n_obs) {
                d_indices[[r, 0]] = k;
                d_indices[[r, 1]] = i;
            }
            let diff = &x.slice(s![k, ..]) - &x.slice(s![k + 1..n_obs, ..]);
            d.slice_mut(s![start..end, ..]).assign(&diff.mapv(|v| v.abs()));
            start = end;
        }

        DiffMatrix {
            d,
            d_indices,
            n_obs,
        }
    }

    /// Index pairs (i, j) of identical rows
    pub fn duplicates(&self) -> Vec<(usize, usize)> {
        self.d
            .rows()
            .into_iter()
            .zip(self.d_indices.rows())
            .filter(|(d, _)| d.iter().all(|v| *v == F::zero()))
            .map(|(_, ij)| (ij[0], ij[1]))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    #[test]
    fn test_normalized_matrix() {
        let x = array![[1., 2.], [3., 4.]];
        let xnorm = NormalizedData::new(&x);
        assert_eq!(xnorm.ncols(), 2);
        assert_eq!(array![2., 3.], xnorm.mean);
        assert_eq!(array![f64::sqrt(2.), f64::sqrt(2.)], xnorm.std);
        assert_abs_diff_eq!(xnorm.apply(&array![[2., 3.]]), array![[0., 0.]]);
    }

    #[test]
    fn test_normalized_constant_column() {
        let x = array![[1., 5.], [3., 5.], [2., 5.]];
        let xnorm = NormalizedData::new(&x);
        assert_eq!(1., xnorm.std[1]);
        assert_abs_diff_eq!(xnorm.data.column(1), array![0., 0., 0.]);
    }

    #[test]
    fn test_diff_matrix() {
        let xt = array![[0.5], [1.2], [2.0], [3.0], [4.0]];
        let expected = (
            array![
                [0.7],
                [1.5],
                [2.5],
                [3.5],
                [0.8],
                [1.8],
                [2.8],
                [1.],
                [2.],
                [1.]
            ],
            array![
                [0, 1],
                [0, 2],
                [0, 3],
                [0, 4],
                [1, 2],
                [1, 3],
                [1, 4],
                [2, 3],
                [2, 4],
                [3, 4]
            ],
        );
        let dm = DiffMatrix::new(&xt);
        assert_abs_diff_eq!(expected.0, dm.d, epsilon = 1e-12);
        assert_eq!(expected.1, dm.d_indices);
        assert!(dm.duplicates().is_empty());
    }

    #[test]
    fn test_duplicates() {
        let xt = array![[0.5, 1.], [1.2, 0.], [0.5, 1.]];
        assert_eq!(vec![(0, 2)], DiffMatrix::new(&xt).duplicates());
    }
}
