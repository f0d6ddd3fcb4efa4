use crate::SamplingMethod;
use linfa::Float;
use ndarray::{Array1, Array2, ArrayBase, Data, Ix2};
use ndarray_stats::QuantileExt;

/// The FullFactorial design consists of all combinations of evenly spaced levels
/// of every component within the design space.
///
/// Rows are generated in row-major order: the first component varies slowest,
/// the last one fastest.
#[derive(Clone, Debug)]
pub struct FullFactorial<F: Float> {
    /// Design space definition as a (nx, 2) matrix
    /// The ith row is the [lower_bound, upper_bound] of xi, the ith component of a sample x
    xlimits: Array2<F>,
    /// Number of levels of each component, when not given levels are
    /// balanced to reach the requested number of samples
    levels: Option<Array1<usize>>,
}

impl<F: Float> FullFactorial<F> {
    /// Constructor given a design space given a (nx, 2) matrix \[\[lower bound, upper bound\], ...\]
    ///
    /// ```
    /// use aerogp_doe::FullFactorial;
    /// use ndarray::arr2;
    ///
    /// let doe = FullFactorial::new(&arr2(&[[0.0, 1.0], [5.0, 10.0]]));
    /// ```
    pub fn new(xlimits: &ArrayBase<impl Data<Elem = F>, Ix2>) -> Self {
        if xlimits.ncols() != 2 {
            panic!("xlimits must have 2 columns (lower, upper)");
        }
        FullFactorial {
            xlimits: xlimits.to_owned(),
            levels: None,
        }
    }

    /// Sets the same number of levels for every component.
    ///
    /// A single level stands for the lower bound of the component.
    /// *Panics* if `n` is zero.
    pub fn levels(self, n: usize) -> Self {
        let nx = self.xlimits.nrows();
        self.levels_per_component(Array1::from_elem(nx, n))
    }

    /// Sets the number of levels of each component.
    ///
    /// *Panics* if a level count is zero or if the number of counts does not match
    /// the design space dimension.
    pub fn levels_per_component(mut self, levels: Array1<usize>) -> Self {
        assert_eq!(
            levels.len(),
            self.xlimits.nrows(),
            "one level count expected per component"
        );
        assert!(levels.iter().all(|&n| n > 0), "level counts must be > 0");
        self.levels = Some(levels);
        self
    }

    /// Number of points of the complete grid when levels are given
    pub fn grid_size(&self) -> Option<usize> {
        self.levels
            .as_ref()
            .map(|levels| levels.fold(1, |acc, n| acc * n))
    }

    /// Generates the complete grid when levels are given, an empty (0, nx) sample otherwise.
    pub fn sample_grid(&self) -> Array2<F> {
        match self.grid_size() {
            Some(size) => self.sample(size),
            None => Array2::zeros((0, self.xlimits.nrows())),
        }
    }

    /// Levels are spread as evenly as possible among components so that
    /// the grid holds at least `ns` points
    fn balanced_levels(&self, ns: usize) -> Array1<usize> {
        let nx = self.xlimits.nrows();
        let weights: Array1<F> = Array1::ones(nx) / F::cast(nx);
        let mut levels: Array1<usize> = Array1::ones(nx);
        while levels.fold(1, |acc, n| acc * n) < ns {
            let w: Array1<F> = &levels.mapv(|v| F::cast(v)) / F::cast(levels.sum());
            // weights and w have the same length and no NaN
            let ind = (&weights - &w).argmax().unwrap_or(0);
            levels[ind] += 1;
        }
        levels
    }
}

impl<F: Float> SamplingMethod<F> for FullFactorial<F> {
    fn sampling_space(&self) -> &Array2<F> {
        &self.xlimits
    }

    fn normalized_sample(&self, ns: usize) -> Array2<F> {
        let levels = match &self.levels {
            Some(levels) => levels.to_owned(),
            None => self.balanced_levels(ns),
        };
        let nx = levels.len();
        let nrows = levels.fold(1, |acc, n| acc * n).min(ns);

        let mut doe = Array2::<F>::zeros((nrows, nx));
        for (r, mut row) in doe.rows_mut().into_iter().enumerate() {
            // mixed radix decomposition of r, last component being the fastest digit
            let mut rest = r;
            for j in (0..nx).rev() {
                let n = levels[j];
                let i = rest % n;
                rest /= n;
                row[j] = if n > 1 {
                    F::cast(i) / F::cast(n - 1)
                } else {
                    F::zero()
                };
            }
        }
        doe
    }
}
