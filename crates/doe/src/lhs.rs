use crate::SamplingMethod;
use crate::utils::min_pdist;
use linfa::Float;
use ndarray::{Array1, Array2, ArrayBase, Data, Ix2};
use ndarray_rand::{
    RandomExt, rand::Rng, rand::SeedableRng, rand::seq::SliceRandom, rand_distr::Uniform,
};
use rand_xoshiro::Xoshiro256Plus;
use std::sync::{Arc, RwLock, RwLockWriteGuard};

/// Number of candidate designs drawn by maximin variants
const MAXIMIN_CANDIDATES: usize = 5;

/// Kinds of Latin Hypercube Design
#[derive(Clone, Debug, Default, Copy, PartialEq, Eq)]
pub enum LhsKind {
    /// sample is choosen randomly within its latin hypercube intervals
    Classic,
    /// sample is the middle of its latin hypercube intervals
    Centered,
    /// best of several classic designs regarding the minimal distance between points
    #[default]
    Maximin,
    /// best of several centered designs regarding the minimal distance between points
    CenteredMaximin,
}

type RngRef<R> = Arc<RwLock<R>>;

/// The LHS design is built as follows: each dimension space is divided into ns sections
/// where ns is the number of sampling points, and one point in selected in each section.
/// The selection method gives different kind of LHS (see [LhsKind])
///
/// The random generator is shared between clones, so that two clones never
/// generate the same design.
#[derive(Clone, Debug)]
pub struct Lhs<F: Float, R: Rng> {
    /// Sampling space definition as a (nx, 2) matrix
    /// The ith row is the [lower_bound, upper_bound] of xi, the ith component of x
    xlimits: Array2<F>,
    /// The requested kind of LHS
    kind: LhsKind,
    /// Random generator used for reproducibility
    rng: RngRef<R>,
}

/// LHS with default random generator
impl<F: Float> Lhs<F, Xoshiro256Plus> {
    /// Constructor given a design space given a (nx, 2) matrix \[\[lower bound, upper bound\], ...\]
    ///
    /// ```
    /// use aerogp_doe::Lhs;
    /// use ndarray::arr2;
    ///
    /// let doe = Lhs::new(&arr2(&[[0.0, 1.0], [5.0, 10.0]]));
    /// ```
    pub fn new(xlimits: &ArrayBase<impl Data<Elem = F>, Ix2>) -> Self {
        Self::new_with_rng(xlimits, Xoshiro256Plus::from_entropy())
    }
}

impl<F: Float, R: Rng> SamplingMethod<F> for Lhs<F, R> {
    fn sampling_space(&self) -> &Array2<F> {
        &self.xlimits
    }

    fn normalized_sample(&self, ns: usize) -> Array2<F> {
        match &self.kind {
            LhsKind::Classic => self.classic_lhs(ns),
            LhsKind::Centered => self.centered_lhs(ns),
            LhsKind::Maximin => self.maximin_lhs(ns, false),
            LhsKind::CenteredMaximin => self.maximin_lhs(ns, true),
        }
    }
}

impl<F: Float, R: Rng> Lhs<F, R> {
    /// Constructor with given design space and random generator.
    /// * `xlimits`: (nx, 2) matrix where nx is the dimension of the samples and the ith row
    ///   is the definition interval of the ith component of x.
    /// * `rng`: random generator
    pub fn new_with_rng(xlimits: &ArrayBase<impl Data<Elem = F>, Ix2>, rng: R) -> Self {
        if xlimits.ncols() != 2 {
            panic!("xlimits must have 2 columns (lower, upper)");
        }
        Lhs {
            xlimits: xlimits.to_owned(),
            kind: LhsKind::default(),
            rng: Arc::new(RwLock::new(rng)),
        }
    }

    /// Sets the kind of LHS
    pub fn kind(mut self, kind: LhsKind) -> Self {
        self.kind = kind;
        self
    }

    /// Sets the random generator
    pub fn with_rng<R2: Rng>(self, rng: R2) -> Lhs<F, R2> {
        Lhs {
            xlimits: self.xlimits,
            kind: self.kind,
            rng: Arc::new(RwLock::new(rng)),
        }
    }

    fn rng(&self) -> RwLockWriteGuard<'_, R> {
        // a panic while sampling leaves the generator usable
        self.rng.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Lower bounds of the ns strata of [0, 1]
    fn strata(ns: usize) -> (Array1<f64>, f64) {
        let width = 1. / ns as f64;
        (Array1::from_shape_fn(ns, |i| i as f64 * width), width)
    }

    fn classic_lhs(&self, ns: usize) -> Array2<F> {
        let nx = self.xlimits.nrows();
        let (lower, width) = Self::strata(ns);

        let mut rng = self.rng();
        let rnd = Array2::random_using((ns, nx), Uniform::new(0., 1.), &mut *rng);
        let mut lhs = Array2::zeros((ns, nx));
        let mut perm: Vec<usize> = (0..ns).collect();
        for j in 0..nx {
            perm.shuffle(&mut *rng);
            for (i, &k) in perm.iter().enumerate() {
                lhs[[i, j]] = F::cast(lower[k] + rnd[[i, j]] * width);
            }
        }
        lhs
    }

    fn centered_lhs(&self, ns: usize) -> Array2<F> {
        let nx = self.xlimits.nrows();
        let (lower, width) = Self::strata(ns);
        let centers = lower.mapv(|v| v + width / 2.);

        let mut rng = self.rng();
        let mut lhs = Array2::zeros((ns, nx));
        let mut perm: Vec<usize> = (0..ns).collect();
        for j in 0..nx {
            perm.shuffle(&mut *rng);
            for (i, &k) in perm.iter().enumerate() {
                lhs[[i, j]] = F::cast(centers[k]);
            }
        }
        lhs
    }

    fn maximin_lhs(&self, ns: usize, centered: bool) -> Array2<F> {
        let draw = || {
            if centered {
                self.centered_lhs(ns)
            } else {
                self.classic_lhs(ns)
            }
        };
        let mut best = draw();
        let mut best_dist = min_pdist(&best);
        for _ in 1..MAXIMIN_CANDIDATES {
            let candidate = draw();
            let dist = min_pdist(&candidate);
            if dist > best_dist {
                best_dist = dist;
                best = candidate;
            }
        }
        best
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::{assert_abs_diff_eq, assert_abs_diff_ne};
    use ndarray::{arr2, array};

    fn assert_latin(doe: &Array2<f64>, xlimits: &Array2<f64>) {
        let ns = doe.nrows();
        for (j, col) in doe.columns().into_iter().enumerate() {
            let (lo, up) = (xlimits[[j, 0]], xlimits[[j, 1]]);
            let mut strata: Vec<usize> = col
                .iter()
                .map(|v| {
                    assert!(*v >= lo && *v <= up, "{v} not in [{lo}, {up}]");
                    (((v - lo) / (up - lo) * ns as f64) as usize).min(ns - 1)
                })
                .collect();
            strata.sort_unstable();
            assert_eq!((0..ns).collect::<Vec<_>>(), strata);
        }
    }

    #[test]
    fn test_lhs_kinds_are_latin() {
        let xlimits = arr2(&[[5., 10.], [0., 1.], [-3., -1.]]);
        for kind in [
            LhsKind::Classic,
            LhsKind::Centered,
            LhsKind::Maximin,
            LhsKind::CenteredMaximin,
        ] {
            let doe = Lhs::new(&xlimits)
                .kind(kind)
                .with_rng(Xoshiro256Plus::seed_from_u64(42))
                .sample(7);
            assert_eq!((7, 3), doe.dim());
            assert_latin(&doe, &xlimits);
        }
    }

    #[test]
    fn test_lhs_reproducible_with_seed() {
        let xlimits = arr2(&[[-2., 3.], [1e-3, 1.]]);
        let s1 = Lhs::new(&xlimits)
            .with_rng(Xoshiro256Plus::seed_from_u64(7))
            .sample(6);
        let s2 = Lhs::new(&xlimits)
            .with_rng(Xoshiro256Plus::seed_from_u64(7))
            .sample(6);
        assert_abs_diff_eq!(s1, s2, epsilon = 0.);
    }

    #[test]
    fn test_centered_lhs() {
        let xlimits = arr2(&[[5., 10.], [0., 1.]]);
        let doe = Lhs::new(&xlimits)
            .with_rng(Xoshiro256Plus::seed_from_u64(0))
            .kind(LhsKind::Centered)
            .sample(5);
        let mut col0 = doe.column(0).to_vec();
        col0.sort_by(|a, b| a.partial_cmp(b).unwrap());
        assert_abs_diff_eq!(
            Array1::from_vec(col0),
            array![5.5, 6.5, 7.5, 8.5, 9.5],
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_maximin_not_worse_than_classic_draw() {
        let xlimits = arr2(&[[0., 1.], [0., 1.]]);
        let maximin = Lhs::new(&xlimits)
            .kind(LhsKind::Maximin)
            .with_rng(Xoshiro256Plus::seed_from_u64(42))
            .sample(10);
        let classic = Lhs::new(&xlimits)
            .kind(LhsKind::Classic)
            .with_rng(Xoshiro256Plus::seed_from_u64(42))
            .sample(10);
        // first maximin candidate is the classic draw with the same seed
        assert!(min_pdist(&maximin).unwrap() >= min_pdist(&classic).unwrap());
    }

    #[test]
    fn test_no_duplicate() {
        let xlimits = arr2(&[[5., 10.], [0., 1.]]);
        let lhs = Lhs::new(&xlimits).with_rng(Xoshiro256Plus::seed_from_u64(42));

        let sample1 = lhs.sample(5);
        let sample2 = lhs.sample(5);
        assert_abs_diff_ne!(sample1, sample2);
    }

    #[test]
    fn test_lhs_clone_different() {
        let xlimits = array![[-1., 1.]];
        let lhs = Lhs::new(&xlimits)
            .kind(LhsKind::Classic)
            .with_rng(Xoshiro256Plus::seed_from_u64(42));
        let s1 = lhs.clone().sample(10);
        let s2 = lhs.clone().sample(10);
        assert_abs_diff_ne!(s1, s2);
    }
}
