use crate::covariance::{GpInnerParams, cross_covariance, log_likelihood, training_covariance};
use crate::errors::{GpError, Result};
use crate::kernels::{MaternKernel, Smoothness};
use crate::optimization::{
    CobylaParams, Restart, best_restart, optimize_params, prepare_multistart, to_f64,
};
use crate::parameters::{GpParams, GpValidParams, NoiseTuning};
use crate::utils::{DiffMatrix, NormalizedData};

use linfa::prelude::{DatasetBase, Fit, Float};
use linfa_linalg::triangular::*;
use ndarray::{Array1, Array2, ArrayBase, ArrayView1, Axis, Data, Ix1, Ix2};

use log::{debug, info, warn};
use rayon::prelude::*;
#[cfg(feature = "serializable")]
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Instant;

#[cfg(feature = "persistent")]
use std::{fs, io::Write};

/// Default number of additional restarts for hyperparameters optimization
pub const GP_OPTIM_N_START: usize = 0;
/// Minimum of function evaluations for COBYLA optimizer
pub const GP_COBYLA_MIN_EVAL: usize = 50;
/// Maximum of function evaluations for COBYLA optimizer
pub const GP_COBYLA_MAX_EVAL: usize = 1000;
/// Function evaluations budget per optimized hyperparameter
const GP_COBYLA_EVAL_PER_PARAM: usize = 50;

/// Hyperparameters of a fitted [GaussianProcess]
///
/// Length scales are expressed in normalized input units and noise in
/// normalized output units.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(
    feature = "serializable",
    derive(Serialize, Deserialize),
    serde(bound(deserialize = "F: Deserialize<'de>"))
)]
pub struct Hyperparameters<F: Float> {
    /// One length scale per input component
    pub length_scales: Array1<F>,
    /// Kernel smoothness
    pub smoothness: Smoothness,
    /// Noise magnitude added to the training covariance diagonal
    pub noise: F,
}

/// File formats available to save and load a [GaussianProcess]
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
pub enum GpFileFormat {
    /// Human readable format
    #[default]
    Json,
    /// Binary format
    Binary,
}

/// Gaussian Process regression model with a zero mean prior and a Matérn covariance.
///
/// Inputs and output are normalized using training data statistics
/// (mean and sample standard deviation). The model hyperparameters
/// (length scales, noise magnitude and possibly kernel smoothness) are
/// estimated by maximizing the marginal log likelihood of normalized outputs
/// with a COBYLA multistart optimization.
///
/// # Example
///
/// ```no_run
/// use aerogp_gp::{GaussianProcess, GpParams};
/// use linfa::prelude::*;
/// use ndarray::{Array, Array2, Axis};
///
/// let xt = Array::linspace(0., 10., 10).insert_axis(Axis(1));
/// let yt = xt.column(0).mapv(f64::sin);
///
/// let gp = GpParams::new((1e-2, 1e2), (1e-6, 1e-2))
///     .n_start(3)
///     .seed(Some(42))
///     .fit(&Dataset::new(xt, yt))
///     .expect("GP fitted");
///
/// let xtest = Array::linspace(0., 10., 51).insert_axis(Axis(1));
/// let (mean, variance) = gp.predict_valvar(&xtest).expect("GP prediction");
/// ```
#[derive(Debug, Clone)]
#[cfg_attr(
    feature = "serializable",
    derive(Serialize, Deserialize),
    serde(bound(deserialize = "F: Deserialize<'de>"))
)]
pub struct GaussianProcess<F: Float> {
    /// Optimized hyperparameters
    hyperparameters: Hyperparameters<F>,
    /// Kernel built from selected smoothness
    kernel: MaternKernel<F>,
    /// Log likelihood at optimum, maybe used to compare models
    likelihood: F,
    /// Gaussian process internal fitted params
    inner_params: GpInnerParams<F>,
    /// Training inputs
    xt_norm: NormalizedData<F>,
    /// Training outputs
    yt_norm: NormalizedData<F>,
    /// Training dataset (input, output)
    pub(crate) training_data: (Array2<F>, Array1<F>),
    /// Parameters used to fit this model
    pub(crate) params: GpValidParams<F>,
}

impl<F: Float> fmt::Display for GaussianProcess<F> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "GP({}, length_scales={}, noise={}, likelihood={})",
            self.kernel,
            self.hyperparameters.length_scales,
            self.hyperparameters.noise,
            self.likelihood
        )
    }
}

impl<F: Float> GaussianProcess<F> {
    /// Gp parameters contructor given length scale and noise search spaces
    pub fn params(length_scale_bounds: (F, F), noise_bounds: (F, F)) -> GpParams<F> {
        GpParams::new(length_scale_bounds, noise_bounds)
    }

    /// Predict output values at n given `x` points of nx components specified as a (n, nx) matrix.
    /// Returns n scalar output values as a vector (n,).
    pub fn predict(&self, x: &ArrayBase<impl Data<Elem = F>, Ix2>) -> Result<Array1<F>> {
        let xnorm = self.normalize_query(x)?;
        let kx = self.cross_covariance(&xnorm);
        self.denormalize_mean(posterior_mean(&kx, &self.inner_params))
    }

    /// Predict variance values at n given `x` points of nx components specified as a (n, nx) matrix.
    /// Returns n variance values as (n,) vector. Noise is not included.
    pub fn predict_var(&self, x: &ArrayBase<impl Data<Elem = F>, Ix2>) -> Result<Array1<F>> {
        let xnorm = self.normalize_query(x)?;
        let kx = self.cross_covariance(&xnorm);
        self.denormalize_var(posterior_variance(&self.kernel, &kx, &self.inner_params)?)
    }

    /// Predict both output values and variances at n given `x` points of nx components
    pub fn predict_valvar(
        &self,
        x: &ArrayBase<impl Data<Elem = F>, Ix2>,
    ) -> Result<(Array1<F>, Array1<F>)> {
        let xnorm = self.normalize_query(x)?;
        let kx = self.cross_covariance(&xnorm);
        let mean = self.denormalize_mean(posterior_mean(&kx, &self.inner_params))?;
        let var =
            self.denormalize_var(posterior_variance(&self.kernel, &kx, &self.inner_params)?)?;
        Ok((mean, var))
    }

    fn normalize_query(&self, x: &ArrayBase<impl Data<Elem = F>, Ix2>) -> Result<Array2<F>> {
        if x.ncols() != self.xt_norm.ncols() {
            return Err(GpError::ConfigError(format!(
                "Expected {} input components, got {}",
                self.xt_norm.ncols(),
                x.ncols()
            )));
        }
        Ok(self.xt_norm.apply(x))
    }

    fn cross_covariance(&self, xnorm: &Array2<F>) -> Array2<F> {
        cross_covariance(
            &self.kernel,
            xnorm,
            &self.xt_norm.data,
            &self.hyperparameters.length_scales,
        )
    }

    fn denormalize_mean(&self, mean: Array1<F>) -> Result<Array1<F>> {
        let (ymean, ystd) = (self.yt_norm.mean[0], self.yt_norm.std[0]);
        let mean = mean.mapv(|v| v * ystd + ymean);
        check_finite(&mean, "mean")?;
        Ok(mean)
    }

    fn denormalize_var(&self, var: Array1<F>) -> Result<Array1<F>> {
        let ystd = self.yt_norm.std[0];
        let var = var.mapv(|v| v * ystd * ystd);
        check_finite(&var, "variance")?;
        Ok(var)
    }

    /// Optimized hyperparameters
    pub fn hyperparameters(&self) -> &Hyperparameters<F> {
        &self.hyperparameters
    }

    /// Optimized length scales (normalized input units)
    pub fn length_scales(&self) -> &Array1<F> {
        &self.hyperparameters.length_scales
    }

    /// Selected kernel smoothness
    pub fn smoothness(&self) -> Smoothness {
        self.hyperparameters.smoothness
    }

    /// Optimized noise magnitude (normalized output units)
    pub fn noise(&self) -> F {
        self.hyperparameters.noise
    }

    /// Fitted kernel
    pub fn kernel(&self) -> &MaternKernel<F> {
        &self.kernel
    }

    /// Log likelihood of normalized training outputs at optimum
    pub fn likelihood(&self) -> F {
        self.likelihood
    }

    /// Training dataset (input, output)
    pub fn training_data(&self) -> &(Array2<F>, Array1<F>) {
        &self.training_data
    }

    /// Parameters used to fit this model
    pub fn fit_params(&self) -> &GpValidParams<F> {
        &self.params
    }

    /// Input and output dimensions
    pub fn dims(&self) -> (usize, usize) {
        (self.xt_norm.ncols(), self.yt_norm.ncols())
    }
}

#[cfg(feature = "persistent")]
impl GaussianProcess<f64> {
    /// Save the model in the given file using the given format
    pub fn save(&self, path: &str, format: GpFileFormat) -> Result<()> {
        let mut file = fs::File::create(path)?;
        let bytes = match format {
            GpFileFormat::Json => serde_json::to_vec(self).map_err(GpError::SaveJsonError)?,
            GpFileFormat::Binary => bincode::serialize(self).map_err(GpError::SaveBinaryError)?,
        };
        file.write_all(&bytes)?;
        Ok(())
    }

    /// Load a model from the given file and format
    pub fn load(path: &str, format: GpFileFormat) -> Result<GaussianProcess<f64>> {
        let data = fs::read(path)?;
        let gp = match format {
            GpFileFormat::Json => serde_json::from_slice(&data)
                .map_err(|e| GpError::LoadError(format!("{path}: {e}")))?,
            GpFileFormat::Binary => bincode::deserialize(&data)
                .map_err(|e| GpError::LoadError(format!("{path}: {e}")))?,
        };
        Ok(gp)
    }
}

fn check_finite<F: Float>(values: &Array1<F>, what: &str) -> Result<()> {
    if values.iter().any(|v| !v.is_finite()) {
        return Err(GpError::NumericalInstabilityError(format!(
            "predicted {what} is not finite"
        )));
    }
    Ok(())
}

/// Posterior mean in normalized output units given the (m, n) cross covariance
pub(crate) fn posterior_mean<F: Float>(kx: &Array2<F>, inner: &GpInnerParams<F>) -> Array1<F> {
    kx.dot(&inner.alpha)
}

/// Posterior variance `s2 - |L^-1 kx^t|^2` in normalized output units, clipped at zero
pub(crate) fn posterior_variance<F: Float>(
    kernel: &MaternKernel<F>,
    kx: &Array2<F>,
    inner: &GpInnerParams<F>,
) -> Result<Array1<F>> {
    let v = inner.chol.solve_triangular(&kx.t(), UPLO::Lower)?;
    let var = v.mapv(|e| e * e).sum_axis(Axis(0)).mapv(|s| {
        let var = kernel.signal_variance - s;
        // slightly negative depending on machine precision
        if var < F::zero() { F::zero() } else { var }
    });
    Ok(var)
}

impl<F: Float, D: Data<Elem = F>> Fit<ArrayBase<D, Ix2>, ArrayBase<D, Ix1>, GpError>
    for GpValidParams<F>
{
    type Object = GaussianProcess<F>;

    /// Fit GP hyperparameters using maximum likelihood
    fn fit(
        &self,
        dataset: &DatasetBase<ArrayBase<D, Ix2>, ArrayBase<D, Ix1>>,
    ) -> Result<Self::Object> {
        let x = dataset.records();
        let y = dataset.targets();
        let (n_obs, dim) = x.dim();

        if y.len() != n_obs {
            return Err(GpError::ConfigError(format!(
                "Inputs ({n_obs}) and outputs ({}) sizes mismatch",
                y.len()
            )));
        }
        if n_obs < 2 || n_obs < dim {
            return Err(GpError::FitError(format!(
                "Not enough training points: got {n_obs} for {dim} input component(s), \
                 at least max(2, {dim}) required"
            )));
        }
        if x.iter().chain(y.iter()).any(|v| !v.is_finite()) {
            return Err(GpError::FitError(
                "Training data contains non finite values".to_string(),
            ));
        }
        let (length_init, length_bounds) = self.length_scale_tuning().expand(dim)?;

        let xtrain = NormalizedData::new(x);
        let ytrain = NormalizedData::new(&y.to_owned().insert_axis(Axis(1)));
        let yt = ytrain.data.column(0);

        let x_distances = DiffMatrix::new(&xtrain.data);
        let duplicates = x_distances.duplicates();
        if !duplicates.is_empty() {
            warn!(
                "Training inputs contain {} duplicated point(s) (first: rows {:?}), \
                 noise is required to factorize covariance",
                duplicates.len(),
                duplicates[0]
            );
        }

        let mut best: Option<(F, Hyperparameters<F>)> = None;
        let mut failures = vec![];
        for smoothness in self.smoothness_tuning().candidates() {
            match self.optimize_hyperparameters(
                smoothness,
                &x_distances,
                &yt,
                &length_init,
                length_bounds.as_deref(),
            ) {
                Ok((lkh, hyper)) => {
                    debug!("{smoothness}: likelihood = {lkh}, hyperparameters = {hyper:?}");
                    if best.as_ref().map_or(true, |(best_lkh, _)| lkh > *best_lkh) {
                        best = Some((lkh, hyper));
                    }
                }
                Err(err) => {
                    debug!("{smoothness}: {err}");
                    failures.push(err.to_string());
                }
            }
        }
        let (_, hyperparameters) = best.ok_or_else(|| {
            GpError::FitError(format!(
                "No hyperparameter optimization succeeded ({})",
                failures.join("; ")
            ))
        })?;
        info!(
            "GP fitted with {} kernel, length scales = {}, noise = {}",
            hyperparameters.smoothness, hyperparameters.length_scales, hyperparameters.noise
        );

        let kernel = MaternKernel::new(hyperparameters.smoothness, self.signal_variance());
        let k_mx = training_covariance(
            &kernel,
            &x_distances,
            &hyperparameters.length_scales,
            hyperparameters.noise,
        );
        let (likelihood, inner_params) = log_likelihood(&k_mx, &yt).map_err(|e| {
            GpError::NumericalInstabilityError(format!(
                "covariance not factorizable at optimum: {e}"
            ))
        })?;

        Ok(GaussianProcess {
            hyperparameters,
            kernel,
            likelihood,
            inner_params,
            xt_norm: xtrain,
            yt_norm: ytrain,
            training_data: (x.to_owned(), y.to_owned()),
            params: self.clone(),
        })
    }
}

impl<F: Float> GpValidParams<F> {
    /// Maximize the likelihood for the given kernel smoothness.
    /// Returns the likelihood at optimum and the corresponding hyperparameters.
    fn optimize_hyperparameters(
        &self,
        smoothness: Smoothness,
        x_distances: &DiffMatrix<F>,
        yt: &ArrayView1<F>,
        length_init: &Array1<F>,
        length_bounds: Option<&[(F, F)]>,
    ) -> Result<(F, Hyperparameters<F>)> {
        let kernel = MaternKernel::new(smoothness, self.signal_variance());
        let likelihood = |length_scales: &Array1<F>, noise: F| {
            let k_mx = training_covariance(&kernel, x_distances, length_scales, noise);
            log_likelihood(&k_mx, yt).map(|(lkh, _)| lkh)
        };

        // Optimized parameters: length scales then noise, if not fixed
        let mut param0 = vec![];
        let mut bounds = vec![];
        if let Some(length_bounds) = length_bounds {
            param0.extend(length_init.iter().copied());
            bounds.extend_from_slice(length_bounds);
        }
        if let NoiseTuning::Optimized {
            init,
            bounds: noise_bounds,
        } = self.noise_tuning()
        {
            param0.push(*init);
            bounds.push(*noise_bounds);
        }
        let n_length = if length_bounds.is_some() {
            length_init.len()
        } else {
            0
        };

        let base: f64 = 10.;
        let decode = |p: &[f64]| -> (Array1<F>, F) {
            let length_scales = if n_length > 0 {
                p[..n_length].iter().map(|v| F::cast(base.powf(*v))).collect()
            } else {
                length_init.to_owned()
            };
            let noise = match self.noise_tuning() {
                NoiseTuning::Fixed(noise) => *noise,
                NoiseTuning::Optimized { .. } => F::cast(base.powf(p[n_length])),
            };
            (length_scales, noise)
        };

        if param0.is_empty() {
            // Easy path no optimization
            let (length_scales, noise) = decode(&[]);
            let lkh = likelihood(&length_scales, noise).map_err(|e| {
                GpError::FitError(format!(
                    "{smoothness} kernel with fixed hyperparameters failed: {e}"
                ))
            })?;
            return Ok((
                lkh,
                Hyperparameters {
                    length_scales,
                    smoothness,
                    noise,
                },
            ));
        }

        let objfn = |p: &[f64]| -> f64 {
            // optimizer may return nan values
            if p.iter().any(|v| v.is_nan()) {
                return f64::INFINITY;
            }
            let (length_scales, noise) = decode(p);
            match likelihood(&length_scales, noise) {
                Ok(lkh) => -to_f64(lkh),
                Err(_) => f64::INFINITY,
            }
        };

        let (starts, log_bounds) =
            prepare_multistart(self.n_start(), &Array1::from(param0), &bounds, self.seed());
        debug!("Optimize {smoothness} with multistart starts = {starts:?} and bounds = {log_bounds:?}");
        let maxeval = (GP_COBYLA_EVAL_PER_PARAM * starts.ncols())
            .clamp(GP_COBYLA_MIN_EVAL, self.max_eval().max(GP_COBYLA_MIN_EVAL));
        let now = Instant::now();
        let restarts: Vec<Restart> = (0..starts.nrows())
            .into_par_iter()
            .map(|i| {
                optimize_params(
                    &objfn,
                    &starts.row(i).to_vec(),
                    &log_bounds,
                    CobylaParams {
                        maxeval,
                        ..CobylaParams::default()
                    },
                )
            })
            .collect();
        debug!("elapsed optim = {:?}", now.elapsed().as_millis());

        let discarded = restarts.iter().filter(|r| !r.fval.is_finite()).count();
        if discarded > 0 {
            debug!(
                "{discarded}/{} restart(s) discarded for {smoothness}",
                restarts.len()
            );
        }
        let best = best_restart(&restarts).ok_or_else(|| {
            GpError::FitError(format!(
                "all {} restart(s) failed with {smoothness} kernel, \
                 length scale bounds = {length_bounds:?}, noise bounds = {:?}",
                restarts.len(),
                self.noise_tuning().bounds()
            ))
        })?;
        let xopt = restarts[best].xopt.to_vec();
        let (length_scales, noise) = decode(&xopt);
        Ok((
            F::cast(-restarts[best].fval),
            Hyperparameters {
                length_scales,
                smoothness,
                noise,
            },
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parameters::{LengthScaleTuning, SmoothnessTuning};
    use approx::assert_abs_diff_eq;
    use linfa::prelude::Dataset;
    use ndarray::{Array, array};
    use paste::paste;

    fn sin_data() -> (Array2<f64>, Array1<f64>) {
        let xt = Array::linspace(0., 10., 10).insert_axis(Axis(1));
        let yt = xt.column(0).mapv(f64::sin);
        (xt, yt)
    }

    #[test]
    fn test_sin_scenario() {
        let (xt, yt) = sin_data();
        let gp = GpParams::new((1e-2, 1e2), (1e-6, 1e-2))
            .n_start(3)
            .seed(Some(42))
            .fit(&Dataset::new(xt, yt))
            .expect("GP fit error");
        let xtest = array![[0.], [5.], [10.]];
        let ypred = gp.predict(&xtest).expect("prediction error");
        let expected = xtest.column(0).mapv(f64::sin);
        assert_abs_diff_eq!(expected, ypred, epsilon = 0.1);
        println!("{gp}");
    }

    macro_rules! test_gp_interpolation {
        ($smooth:ident) => {
            paste! {

                #[test]
                fn [<test_gp_interpolation_ $smooth:snake>]() {
                    let xt = array![[0.0], [1.0], [2.0], [3.0], [4.0]];
                    let yt = array![0.0, 1.0, 1.5, 0.9, 1.0];
                    let gp = GpParams::new((1e-2, 1e2), (1e-10, 1e-8))
                        .smoothness(SmoothnessTuning::Fixed(Smoothness::$smooth))
                        .n_start(2)
                        .seed(Some(42))
                        .fit(&Dataset::new(xt.clone(), yt.clone()))
                        .expect("GP fit error");
                    assert_eq!(Smoothness::$smooth, gp.smoothness());

                    let (yvals, yvars) = gp.predict_valvar(&xt).expect("prediction error");
                    assert_abs_diff_eq!(yt, yvals, epsilon = 1e-2);
                    assert_abs_diff_eq!(Array1::<f64>::zeros(5), yvars, epsilon = 1e-3);

                    let yvars = gp.predict_var(&array![[0.5], [3.5]]).expect("prediction error");
                    assert!(yvars.iter().all(|v| *v > 0.));
                }
            }
        };
    }

    test_gp_interpolation!(Exponential);
    test_gp_interpolation!(Matern32);
    test_gp_interpolation!(Matern52);
    test_gp_interpolation!(SquaredExponential);

    #[test]
    fn test_variance_decreases_when_adding_point() {
        let kernel = MaternKernel::new(Smoothness::Matern52, 1.0);
        let ls = array![0.8];
        let xq = array![[0.55]];
        let posterior_var = |xt: &Array2<f64>| {
            let yt = Array1::zeros(xt.nrows());
            let k_mx = training_covariance(&kernel, &DiffMatrix::new(xt), &ls, 1e-6);
            let (_, inner) = log_likelihood(&k_mx, &yt).unwrap();
            let kx = cross_covariance(&kernel, &xq, xt, &ls);
            posterior_variance(&kernel, &kx, &inner).unwrap()[0]
        };
        let xt = array![[-1.0], [0.0], [1.2], [2.0]];
        let var = posterior_var(&xt);
        let var_more = posterior_var(&array![[-1.0], [0.0], [1.2], [2.0], [0.5]]);
        assert!(var > 0.);
        assert!(var_more < var);
        // one far away point hardly changes anything, never increases the variance
        let var_far = posterior_var(&array![[-1.0], [0.0], [1.2], [2.0], [50.]]);
        assert!(var_far <= var + 1e-12);
    }

    #[test]
    fn test_restarts_never_worse() {
        let (xt, yt) = sin_data();
        let params = GpParams::new((1e-2, 1e2), (1e-6, 1e-2))
            .smoothness(SmoothnessTuning::Fixed(Smoothness::Matern52))
            .seed(Some(42));
        let gp0 = params
            .clone()
            .fit(&Dataset::new(xt.clone(), yt.clone()))
            .expect("GP fit error");
        let gp5 = params
            .n_start(5)
            .fit(&Dataset::new(xt, yt))
            .expect("GP fit error");
        assert!(gp5.likelihood() >= gp0.likelihood() - 1e-9);
    }

    #[test]
    fn test_smoothness_selection_keeps_best_likelihood() {
        let (xt, yt) = sin_data();
        let fit = |tuning: SmoothnessTuning| {
            GpParams::new((1e-2, 1e2), (1e-6, 1e-2))
                .smoothness(tuning)
                .seed(Some(42))
                .fit(&Dataset::new(xt.clone(), yt.clone()))
                .expect("GP fit error")
        };
        let m32 = fit(SmoothnessTuning::Fixed(Smoothness::Matern32));
        let sqexp = fit(SmoothnessTuning::Fixed(Smoothness::SquaredExponential));
        let selected = fit(SmoothnessTuning::Select(vec![
            Smoothness::Matern32,
            Smoothness::SquaredExponential,
        ]));
        let best = m32.likelihood().max(sqexp.likelihood());
        assert_abs_diff_eq!(best, selected.likelihood(), epsilon = 1e-10);
        let expected = if m32.likelihood() >= sqexp.likelihood() {
            Smoothness::Matern32
        } else {
            Smoothness::SquaredExponential
        };
        assert_eq!(expected, selected.smoothness());
    }

    #[test]
    fn test_fixed_hyperparameters() {
        let (xt, yt) = sin_data();
        let gp = GpParams::new((1e-2, 1e2), (1e-6, 1e-2))
            .length_scale_tuning(LengthScaleTuning::Fixed(array![0.5]))
            .noise_tuning(NoiseTuning::Fixed(1e-4))
            .smoothness(SmoothnessTuning::Fixed(Smoothness::Matern32))
            .fit(&Dataset::new(xt, yt))
            .expect("GP fit error");
        let expected = Hyperparameters {
            length_scales: array![0.5],
            smoothness: Smoothness::Matern32,
            noise: 1e-4,
        };
        assert_eq!(&expected, gp.hyperparameters());
    }

    #[test]
    fn test_constant_output() {
        let xt = array![[0.0, 1.0], [1.0, 0.5], [2.0, 0.2], [3.0, 0.9]];
        let yt = Array1::from_elem(4, 3.1);
        let gp = GpParams::new((1e-2, 1e2), (1e-6, 1e-2))
            .seed(Some(42))
            .fit(&Dataset::new(xt, yt))
            .expect("GP fit error");
        let ypred = gp.predict(&array![[0.5, 0.5], [2.5, 0.1]]).unwrap();
        assert_abs_diff_eq!(array![3.1, 3.1], ypred, epsilon = 1e-6);
    }

    #[test]
    fn test_not_enough_points() {
        let res = GpParams::new((1e-2, 1e2), (1e-6, 1e-2))
            .fit(&Dataset::new(array![[1.0]], array![2.0]));
        assert!(matches!(res, Err(GpError::FitError(_))));
        let res = GpParams::new((1e-2, 1e2), (1e-6, 1e-2)).fit(&Dataset::new(
            array![[1.0, 2.0, 3.0], [0.0, 1.0, 4.0]],
            array![2.0, 1.0],
        ));
        assert!(matches!(res, Err(GpError::FitError(_))));
    }

    #[test]
    fn test_inverted_bounds() {
        let (xt, yt) = sin_data();
        let res = GpParams::new((1e2, 1e-2), (1e-6, 1e-2)).fit(&Dataset::new(xt, yt));
        assert!(matches!(res, Err(GpError::ConfigError(_))));
    }

    #[test]
    fn test_all_restarts_failing() {
        let xt = array![[0.0], [0.0], [1.0]];
        let yt = array![0.0, 1.0, 2.0];
        let res = GpParams::new((1e-2, 1e2), (1e-6, 1e-2))
            .noise_tuning(NoiseTuning::Fixed(f64::MIN_POSITIVE))
            .smoothness(SmoothnessTuning::Fixed(Smoothness::Matern52))
            .n_start(2)
            .seed(Some(42))
            .fit(&Dataset::new(xt, yt));
        match res {
            Err(GpError::FitError(msg)) => assert!(msg.contains("Matern52")),
            _ => panic!("expected fit error"),
        }
    }

    #[test]
    fn test_non_finite_prediction_is_an_error() {
        let (xt, yt) = sin_data();
        let gp = GpParams::new((1e-2, 1e2), (1e-6, 1e-2))
            .seed(Some(42))
            .fit(&Dataset::new(xt, yt))
            .expect("GP fit error");
        let xtest = array![[0.5], [f64::NAN]];
        assert!(matches!(
            gp.predict(&xtest),
            Err(GpError::NumericalInstabilityError(_))
        ));
        assert!(matches!(
            gp.predict_valvar(&xtest),
            Err(GpError::NumericalInstabilityError(_))
        ));
    }

    #[test]
    fn test_query_dimension_mismatch() {
        let (xt, yt) = sin_data();
        let gp = GpParams::new((1e-2, 1e2), (1e-6, 1e-2))
            .seed(Some(42))
            .fit(&Dataset::new(xt, yt))
            .expect("GP fit error");
        assert!(matches!(
            gp.predict(&array![[1.0, 2.0]]),
            Err(GpError::ConfigError(_))
        ));
    }

    #[cfg(feature = "persistent")]
    #[test]
    fn test_save_load() {
        let (xt, yt) = sin_data();
        let gp = GpParams::new((1e-2, 1e2), (1e-6, 1e-2))
            .seed(Some(42))
            .fit(&Dataset::new(xt, yt))
            .expect("GP fit error");
        let test_dir = "target/tests";
        std::fs::create_dir_all(test_dir).ok();
        let xtest = array![[0.5], [2.5], [7.3]];
        let expected = gp.predict_valvar(&xtest).unwrap();
        for (format, ext) in [(GpFileFormat::Json, "json"), (GpFileFormat::Binary, "bin")] {
            let filename = format!("{test_dir}/gp_sin.{ext}");
            gp.save(&filename, format).expect("GP saving");
            let loaded = GaussianProcess::load(&filename, format).expect("GP loading");
            let actual = loaded.predict_valvar(&xtest).unwrap();
            assert_abs_diff_eq!(expected.0, actual.0, epsilon = 1e-12);
            assert_abs_diff_eq!(expected.1, actual.1, epsilon = 1e-12);
            assert_eq!(gp.hyperparameters(), loaded.hyperparameters());
        }
    }

    #[cfg(feature = "persistent")]
    #[test]
    fn test_load_corrupted() {
        let test_dir = "target/tests";
        std::fs::create_dir_all(test_dir).ok();
        let filename = format!("{test_dir}/gp_corrupted.json");
        std::fs::write(&filename, b"{ not a gp").unwrap();
        assert!(matches!(
            GaussianProcess::load(&filename, GpFileFormat::Json),
            Err(GpError::LoadError(_))
        ));
        assert!(matches!(
            GaussianProcess::load("target/tests/missing.json", GpFileFormat::Json),
            Err(GpError::LoadIoError(_))
        ));
    }
}
