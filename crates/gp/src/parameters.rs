use crate::errors::{GpError, Result};
use crate::kernels::Smoothness;
use crate::{GP_COBYLA_MAX_EVAL, GP_COBYLA_MIN_EVAL, GP_OPTIM_N_START};
use linfa::{Float, ParamGuard};

use ndarray::{Array1, array};
#[cfg(feature = "serializable")]
use serde::{Deserialize, Serialize};

/// An enum to represent the length scales tuning, one length scale per input component
///
/// A one-element array stands for the same value for every component.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(
    feature = "serializable",
    derive(Serialize, Deserialize),
    serde(bound(deserialize = "F: Deserialize<'de>"))
)]
pub enum LengthScaleTuning<F: Float> {
    /// Constant length scales (ie given not estimated)
    Fixed(Array1<F>),
    /// Length scales are optimized between given bounds (lower, upper) starting from the initial guess
    Optimized {
        /// Initial guess
        init: Array1<F>,
        /// Inclusive bounds (lower, upper)
        bounds: Array1<(F, F)>,
    },
}

impl<F: Float> LengthScaleTuning<F> {
    /// Default initial length scale (normalized input units)
    pub const DEFAULT_INIT: f64 = 1.0;

    /// Optimized length scales within shared `bounds`, starting from the default
    /// initial value clipped into the bounds
    pub fn bounded(bounds: (F, F)) -> Self {
        LengthScaleTuning::Optimized {
            init: array![clip(F::cast(Self::DEFAULT_INIT), bounds)],
            bounds: array![bounds],
        }
    }

    /// Get initial length scales
    pub fn init(&self) -> &Array1<F> {
        match self {
            LengthScaleTuning::Fixed(init) => init,
            LengthScaleTuning::Optimized { init, bounds: _ } => init,
        }
    }

    /// Get bounds, `None` when fixed
    pub fn bounds(&self) -> Option<&Array1<(F, F)>> {
        match self {
            LengthScaleTuning::Fixed(_) => None,
            LengthScaleTuning::Optimized { init: _, bounds } => Some(bounds),
        }
    }

    /// Initial values and bounds expanded to `dim` components
    pub(crate) fn expand(&self, dim: usize) -> Result<(Array1<F>, Option<Vec<(F, F)>>)> {
        let init = broadcast(self.init(), dim, "length scale initial values")?;
        let bounds = match self.bounds() {
            Some(bounds) => Some(broadcast(bounds, dim, "length scale bounds")?.to_vec()),
            None => None,
        };
        Ok((init, bounds))
    }
}

/// An enum to represent the noise magnitude tuning
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(
    feature = "serializable",
    derive(Serialize, Deserialize),
    serde(bound(deserialize = "F: Deserialize<'de>"))
)]
pub enum NoiseTuning<F: Float> {
    /// Constant noise magnitude
    Fixed(F),
    /// Noise magnitude is optimized between given bounds (lower, upper) starting from the initial guess
    Optimized {
        /// Initial guess
        init: F,
        /// Inclusive bounds (lower, upper)
        bounds: (F, F),
    },
}

impl<F: Float> NoiseTuning<F> {
    /// Default initial noise magnitude
    pub const DEFAULT_INIT: f64 = 1e-6;

    /// Optimized noise within `bounds`, starting from the default initial value clipped into the bounds
    pub fn bounded(bounds: (F, F)) -> Self {
        NoiseTuning::Optimized {
            init: clip(F::cast(Self::DEFAULT_INIT), bounds),
            bounds,
        }
    }

    /// Get initial noise magnitude
    pub fn init(&self) -> F {
        match self {
            NoiseTuning::Fixed(init) => *init,
            NoiseTuning::Optimized { init, bounds: _ } => *init,
        }
    }

    /// Get bounds, `None` when fixed
    pub fn bounds(&self) -> Option<(F, F)> {
        match self {
            NoiseTuning::Fixed(_) => None,
            NoiseTuning::Optimized { init: _, bounds } => Some(*bounds),
        }
    }
}

/// An enum to represent the kernel smoothness tuning
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serializable", derive(Serialize, Deserialize))]
pub enum SmoothnessTuning {
    /// Given smoothness
    Fixed(Smoothness),
    /// Every candidate is fitted and the one with the best likelihood is retained
    Select(Vec<Smoothness>),
}

impl Default for SmoothnessTuning {
    fn default() -> Self {
        SmoothnessTuning::Select(vec![
            Smoothness::Matern32,
            Smoothness::Matern52,
            Smoothness::SquaredExponential,
        ])
    }
}

impl SmoothnessTuning {
    /// Selection among smoothness values with `lower <= nu <= upper`
    pub fn bounded(lower: f64, upper: f64) -> Result<Self> {
        if lower.is_nan() || upper.is_nan() || lower > upper {
            return Err(GpError::ConfigError(format!(
                "Smoothness bounds should verify lower <= upper, got ({lower}, {upper})"
            )));
        }
        let candidates: Vec<Smoothness> = Smoothness::ALL
            .iter()
            .filter(|s| s.nu() >= lower && s.nu() <= upper)
            .copied()
            .collect();
        if candidates.is_empty() {
            return Err(GpError::ConfigError(format!(
                "No available smoothness (0.5, 1.5, 2.5 or inf) within ({lower}, {upper})"
            )));
        }
        Ok(SmoothnessTuning::Select(candidates))
    }

    /// Smoothness values to be fitted
    pub fn candidates(&self) -> Vec<Smoothness> {
        match self {
            SmoothnessTuning::Fixed(s) => vec![*s],
            SmoothnessTuning::Select(candidates) => candidates.to_vec(),
        }
    }
}

/// A set of validated GP parameters.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(
    feature = "serializable",
    derive(Serialize, Deserialize),
    serde(bound(deserialize = "F: Deserialize<'de>"))
)]
pub struct GpValidParams<F: Float> {
    /// Length scales tuning hint
    pub(crate) length_scale_tuning: LengthScaleTuning<F>,
    /// Noise magnitude tuning hint
    pub(crate) noise_tuning: NoiseTuning<F>,
    /// Kernel smoothness tuning
    pub(crate) smoothness_tuning: SmoothnessTuning,
    /// Kernel covariance at zero distance in normalized output units
    pub(crate) signal_variance: F,
    /// Number of additional likelihood optimization restarts
    pub(crate) n_start: usize,
    /// Max number of likelihood evaluations during one local optimization
    pub(crate) max_eval: usize,
    /// Seed of restart starting points generation
    pub(crate) seed: Option<u64>,
}

impl<F: Float> GpValidParams<F> {
    /// Get length scales tuning
    pub fn length_scale_tuning(&self) -> &LengthScaleTuning<F> {
        &self.length_scale_tuning
    }

    /// Get noise tuning
    pub fn noise_tuning(&self) -> &NoiseTuning<F> {
        &self.noise_tuning
    }

    /// Get smoothness tuning
    pub fn smoothness_tuning(&self) -> &SmoothnessTuning {
        &self.smoothness_tuning
    }

    /// Get kernel signal variance
    pub fn signal_variance(&self) -> F {
        self.signal_variance
    }

    /// Get the number of internal optimization restarts
    pub fn n_start(&self) -> usize {
        self.n_start
    }

    /// Get the max number of internal likelihood evaluations during one optimization
    pub fn max_eval(&self) -> usize {
        self.max_eval
    }

    /// Get the seed of restart starting points
    pub fn seed(&self) -> Option<u64> {
        self.seed
    }
}

#[derive(Clone, Debug)]
/// The set of hyperparameters that can be specified for the execution of
/// the [GP algorithm](struct.GaussianProcess.html).
pub struct GpParams<F: Float>(GpValidParams<F>);

impl<F: Float> GpParams<F> {
    /// A constructor for GP parameters given the mandatory search spaces
    /// of length scales (shared by every input component) and noise magnitude.
    ///
    /// Initial guesses default to a length scale of 1 and a noise of 1e-6,
    /// clipped into their bounds.
    pub fn new(length_scale_bounds: (F, F), noise_bounds: (F, F)) -> GpParams<F> {
        Self(GpValidParams {
            length_scale_tuning: LengthScaleTuning::bounded(length_scale_bounds),
            noise_tuning: NoiseTuning::bounded(noise_bounds),
            smoothness_tuning: SmoothnessTuning::default(),
            signal_variance: F::one(),
            n_start: GP_OPTIM_N_START,
            max_eval: GP_COBYLA_MAX_EVAL,
            seed: None,
        })
    }

    /// A constructor for GP parameters from validated parameters
    pub fn new_from_valid(params: &GpValidParams<F>) -> Self {
        Self(params.clone())
    }

    /// Set per-component length scale bounds.
    ///
    /// The current initial guess is clipped into the new bounds, hence an
    /// explicit initial guess has to be set afterwards.
    /// This function is no-op when length scales are fixed.
    pub fn length_scale_bounds(mut self, bounds: Array1<(F, F)>) -> Self {
        if let LengthScaleTuning::Optimized { init, bounds: _ } = &self.0.length_scale_tuning {
            let init = if init.len() == bounds.len() {
                init.iter().zip(bounds.iter()).map(|(v, b)| clip(*v, *b)).collect()
            } else {
                bounds
                    .iter()
                    .map(|b| clip(F::cast(LengthScaleTuning::<F>::DEFAULT_INIT), *b))
                    .collect()
            };
            self.0.length_scale_tuning = LengthScaleTuning::Optimized { init, bounds };
        }
        self
    }

    /// Set initial length scales.
    ///
    /// When length scales are optimized, the internal optimization is started from `init`.
    /// When length scales are fixed, this set their constant values.
    pub fn length_scale_init(mut self, init: Array1<F>) -> Self {
        self.0.length_scale_tuning = match self.0.length_scale_tuning {
            LengthScaleTuning::Optimized { init: _, bounds } => {
                LengthScaleTuning::Optimized { init, bounds }
            }
            LengthScaleTuning::Fixed(_) => LengthScaleTuning::Fixed(init),
        };
        self
    }

    /// Set length scales tuning
    pub fn length_scale_tuning(mut self, tuning: LengthScaleTuning<F>) -> Self {
        self.0.length_scale_tuning = tuning;
        self
    }

    /// Set noise magnitude bounds, the current initial guess is clipped into them.
    /// This function is no-op when noise is fixed.
    pub fn noise_bounds(mut self, bounds: (F, F)) -> Self {
        if let NoiseTuning::Optimized { init, bounds: _ } = self.0.noise_tuning {
            self.0.noise_tuning = NoiseTuning::Optimized {
                init: clip(init, bounds),
                bounds,
            };
        }
        self
    }

    /// Set initial noise magnitude (constant value when noise is fixed)
    pub fn noise_init(mut self, init: F) -> Self {
        self.0.noise_tuning = match self.0.noise_tuning {
            NoiseTuning::Optimized { init: _, bounds } => NoiseTuning::Optimized { init, bounds },
            NoiseTuning::Fixed(_) => NoiseTuning::Fixed(init),
        };
        self
    }

    /// Set noise tuning
    pub fn noise_tuning(mut self, tuning: NoiseTuning<F>) -> Self {
        self.0.noise_tuning = tuning;
        self
    }

    /// Set smoothness tuning
    pub fn smoothness(mut self, tuning: SmoothnessTuning) -> Self {
        self.0.smoothness_tuning = tuning;
        self
    }

    /// Set kernel signal variance (normalized output units)
    pub fn signal_variance(mut self, signal_variance: F) -> Self {
        self.0.signal_variance = signal_variance;
        self
    }

    /// Set the number of internal hyperparameters optimization restarts
    pub fn n_start(mut self, n_start: usize) -> Self {
        self.0.n_start = n_start;
        self
    }

    /// Set the max number of internal likelihood evaluations during one optimization
    /// Given max_eval is raised to [crate::GP_COBYLA_MIN_EVAL] when lower.
    pub fn max_eval(mut self, max_eval: usize) -> Self {
        self.0.max_eval = GP_COBYLA_MIN_EVAL.max(max_eval);
        self
    }

    /// Set the seed used to draw restart starting points, `None` means seeded from entropy
    pub fn seed(mut self, seed: Option<u64>) -> Self {
        self.0.seed = seed;
        self
    }
}

impl<F: Float> From<GpValidParams<F>> for GpParams<F> {
    fn from(valid: GpValidParams<F>) -> Self {
        GpParams(valid)
    }
}

impl<F: Float> ParamGuard for GpParams<F> {
    type Checked = GpValidParams<F>;
    type Error = GpError;

    fn check_ref(&self) -> Result<&Self::Checked> {
        let params = &self.0;
        match &params.length_scale_tuning {
            LengthScaleTuning::Fixed(values) => {
                check_positive(values.iter().copied(), "length scales")?;
            }
            LengthScaleTuning::Optimized { init, bounds } => {
                check_positive(init.iter().copied(), "length scale initial values")?;
                for b in bounds.iter() {
                    check_bounds(*b, "length scale")?;
                }
                if init.len() == bounds.len() || bounds.len() == 1 || init.len() == 1 {
                    let n = init.len().max(bounds.len());
                    for k in 0..n {
                        let v = init[k.min(init.len() - 1)];
                        let b = bounds[k.min(bounds.len() - 1)];
                        check_within(v, b, "length scale initial value")?;
                    }
                } else {
                    return Err(GpError::ConfigError(format!(
                        "Length scale initial values ({}) and bounds ({}) dimensions mismatch",
                        init.len(),
                        bounds.len()
                    )));
                }
            }
        }
        match params.noise_tuning {
            NoiseTuning::Fixed(v) => check_positive([v].into_iter(), "noise magnitude")?,
            NoiseTuning::Optimized { init, bounds } => {
                check_bounds(bounds, "noise")?;
                check_within(init, bounds, "noise initial value")?;
            }
        }
        if let SmoothnessTuning::Select(candidates) = &params.smoothness_tuning {
            if candidates.is_empty() {
                return Err(GpError::ConfigError(
                    "Smoothness selection should have at least one candidate".to_string(),
                ));
            }
        }
        check_positive([params.signal_variance].into_iter(), "signal variance")?;
        Ok(&self.0)
    }

    fn check(self) -> Result<Self::Checked> {
        self.check_ref()?;
        Ok(self.0)
    }
}

fn clip<F: Float>(v: F, bounds: (F, F)) -> F {
    if v < bounds.0 {
        bounds.0
    } else if v > bounds.1 {
        bounds.1
    } else {
        v
    }
}

fn broadcast<T: Clone>(values: &Array1<T>, dim: usize, what: &str) -> Result<Array1<T>> {
    match values.len() {
        1 => Ok(Array1::from_elem(dim, values[0].clone())),
        n if n == dim => Ok(values.to_owned()),
        n => Err(GpError::ConfigError(format!(
            "Expected 1 or {dim} {what}, got {n}"
        ))),
    }
}

fn check_positive<F: Float>(mut values: impl Iterator<Item = F>, what: &str) -> Result<()> {
    if values.any(|v| !(v > F::zero() && v.is_finite())) {
        return Err(GpError::ConfigError(format!(
            "{what} should be finite and strictly positive"
        )));
    }
    Ok(())
}

fn check_bounds<F: Float>(bounds: (F, F), what: &str) -> Result<()> {
    let (lo, up) = bounds;
    if !(lo > F::zero() && lo.is_finite() && up.is_finite()) || lo > up {
        return Err(GpError::ConfigError(format!(
            "Invalid {what} bounds ({lo}, {up}): should verify 0 < lower <= upper"
        )));
    }
    Ok(())
}

fn check_within<F: Float>(v: F, bounds: (F, F), what: &str) -> Result<()> {
    if v < bounds.0 || v > bounds.1 || v.is_nan() {
        return Err(GpError::ConfigError(format!(
            "{what} {v} out of bounds ({}, {})",
            bounds.0, bounds.1
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_inits_clipped_into_bounds() {
        let params = GpParams::<f64>::new((1e-1, 1e3), (1e-4, 1e-2));
        let valid = params.check().unwrap();
        assert_eq!(&array![1.0], valid.length_scale_tuning().init());
        assert_eq!(1e-4, valid.noise_tuning().init());

        let params = GpParams::<f64>::new((2., 5.), (1e-8, 1e-2)).check().unwrap();
        assert_eq!(&array![2.0], params.length_scale_tuning().init());
        assert_eq!(1e-6, params.noise_tuning().init());
    }

    #[test]
    fn test_inverted_bounds_rejected() {
        let res = GpParams::<f64>::new((10., 1.), (1e-6, 1e-2)).check();
        assert!(matches!(res, Err(GpError::ConfigError(_))));
        let res = GpParams::<f64>::new((0.1, 10.), (1e-2, 1e-6)).check();
        assert!(matches!(res, Err(GpError::ConfigError(_))));
        let res = GpParams::<f64>::new((0., 10.), (1e-6, 1e-2)).check();
        assert!(matches!(res, Err(GpError::ConfigError(_))));
    }

    #[test]
    fn test_init_out_of_bounds_rejected() {
        let res = GpParams::<f64>::new((0.1, 10.), (1e-6, 1e-2))
            .noise_init(1.0)
            .check();
        assert!(matches!(res, Err(GpError::ConfigError(_))));
        let res = GpParams::<f64>::new((0.1, 10.), (1e-6, 1e-2))
            .length_scale_init(array![0.5, 20.])
            .check();
        assert!(matches!(res, Err(GpError::ConfigError(_))));
    }

    #[test]
    fn test_per_component_bounds() {
        let params = GpParams::<f64>::new((0.1, 10.), (1e-6, 1e-2))
            .length_scale_bounds(array![(0.1, 10.), (2., 3.)])
            .check()
            .unwrap();
        assert_eq!(&array![1.0, 2.0], params.length_scale_tuning().init());
        let (init, bounds) = params.length_scale_tuning().expand(2).unwrap();
        assert_eq!(array![1.0, 2.0], init);
        assert_eq!(Some(vec![(0.1, 10.), (2., 3.)]), bounds);
        assert!(matches!(
            params.length_scale_tuning().expand(3),
            Err(GpError::ConfigError(_))
        ));
    }

    #[test]
    fn test_smoothness_bounded() {
        assert_eq!(
            SmoothnessTuning::Select(vec![Smoothness::Matern32, Smoothness::Matern52]),
            SmoothnessTuning::bounded(1.0, 3.0).unwrap()
        );
        assert_eq!(
            SmoothnessTuning::default(),
            SmoothnessTuning::bounded(1.5, f64::INFINITY).unwrap()
        );
        assert!(SmoothnessTuning::bounded(1.6, 2.4).is_err());
        assert!(SmoothnessTuning::bounded(3.0, 1.0).is_err());
        let res = GpParams::<f64>::new((0.1, 10.), (1e-6, 1e-2))
            .smoothness(SmoothnessTuning::Select(vec![]))
            .check();
        assert!(matches!(res, Err(GpError::ConfigError(_))));
    }
}
