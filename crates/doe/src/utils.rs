use linfa::Float;
use ndarray::{Array1, ArrayBase, Data, Ix2};
use ndarray_stats::DeviationExt;
use rayon::prelude::*;

/// Euclidean distances between every pair of distinct rows of `x`, computed in parallel.
///
/// Distances are returned in (i, j) with i < j lexicographic order.
pub fn pdist<F: Float>(x: &ArrayBase<impl Data<Elem = F> + Sync, Ix2>) -> Array1<F> {
    let nrows = x.nrows();
    let pairs: Vec<_> = (0..nrows)
        .flat_map(|i| ((i + 1)..nrows).map(move |j| (i, j)))
        .collect();

    let distances: Vec<F> = pairs
        .par_iter()
        .map(|&(i, j)| {
            // rows of a same matrix always have the same length
            F::cast(x.row(i).l2_dist(&x.row(j)).unwrap_or(f64::INFINITY))
        })
        .collect();

    Array1::from_vec(distances)
}

/// Smallest distance between two distinct rows of `x`, `None` with less than two rows.
pub fn min_pdist<F: Float>(x: &ArrayBase<impl Data<Elem = F> + Sync, Ix2>) -> Option<F> {
    pdist(x)
        .into_iter()
        .fold(None, |acc, d| match acc {
            Some(m) if m <= d => Some(m),
            _ => Some(d),
        })
}
