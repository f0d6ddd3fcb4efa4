use crate::errors::{Result, SurrogateError};
use crate::table::Limits;
use aerogp_gp::{GP_COBYLA_MAX_EVAL, GpParams, NoiseTuning, SmoothnessTuning};
use ndarray::{Array1, array};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Length scale search space
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum LengthBounds {
    /// Same (lower, upper) bounds for every input variable
    Shared(f64, f64),
    /// (lower, upper) bounds given for each input variable name
    PerVariable(BTreeMap<String, (f64, f64)>),
}

/// Search and plot limits of input variables
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub enum LimitsConfig {
    /// Training min and max rounded to one decimal
    #[default]
    Auto,
    /// Given (lower, upper) limits for each input variable name
    Given(Limits),
}

/// Configuration of one surrogate fit.
///
/// Bounds are mandatory, other options have defaults.
/// It can be read from json, unknown options are rejected:
///
/// ```
/// use aerogp::FitConfig;
///
/// let config = FitConfig::from_json(
///     r#"{ "length_bounds": { "Shared": [0.1, 1000.0] },
///          "noise_bounds": [1e-10, 1e-3],
///          "number_of_restarts": 3,
///          "seed": 42 }"#,
/// ).expect("valid configuration");
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FitConfig {
    length_bounds: LengthBounds,
    #[serde(default)]
    length_init: Option<f64>,
    #[serde(default)]
    noise_magnitude: Option<f64>,
    noise_bounds: (f64, f64),
    #[serde(default)]
    fixed_noise: bool,
    #[serde(default)]
    smoothness: SmoothnessTuning,
    #[serde(default = "default_signal_variance")]
    signal_variance: f64,
    #[serde(default)]
    number_of_restarts: usize,
    #[serde(default = "default_max_eval")]
    max_eval: usize,
    #[serde(default)]
    seed: Option<u64>,
    #[serde(default)]
    limits: LimitsConfig,
    #[serde(default)]
    overwrite: bool,
}

fn default_signal_variance() -> f64 {
    1.0
}

fn default_max_eval() -> usize {
    GP_COBYLA_MAX_EVAL
}

impl FitConfig {
    /// Configuration with the mandatory search spaces and default options
    pub fn new(length_bounds: LengthBounds, noise_bounds: (f64, f64)) -> Self {
        FitConfig {
            length_bounds,
            length_init: None,
            noise_magnitude: None,
            noise_bounds,
            fixed_noise: false,
            smoothness: SmoothnessTuning::default(),
            signal_variance: default_signal_variance(),
            number_of_restarts: 0,
            max_eval: default_max_eval(),
            seed: None,
            limits: LimitsConfig::Auto,
            overwrite: false,
        }
    }

    /// Read configuration from json
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| SurrogateError::ConfigError(format!("fit configuration: {e}")))
    }

    /// Initial length scale for every variable (default 1 clipped into bounds)
    pub fn length_init(mut self, length_init: f64) -> Self {
        self.length_init = Some(length_init);
        self
    }

    /// Initial noise magnitude, it must lie within noise bounds (default 1e-6 clipped into bounds)
    pub fn noise_magnitude(mut self, noise_magnitude: f64) -> Self {
        self.noise_magnitude = Some(noise_magnitude);
        self
    }

    /// When true the noise magnitude is kept constant
    pub fn fixed_noise(mut self, fixed_noise: bool) -> Self {
        self.fixed_noise = fixed_noise;
        self
    }

    /// Kernel smoothness, given or selected by likelihood
    pub fn smoothness(mut self, smoothness: SmoothnessTuning) -> Self {
        self.smoothness = smoothness;
        self
    }

    /// Kernel signal variance (normalized output units)
    pub fn signal_variance(mut self, signal_variance: f64) -> Self {
        self.signal_variance = signal_variance;
        self
    }

    /// Number of likelihood optimization restarts in addition to the initial guess
    pub fn number_of_restarts(mut self, number_of_restarts: usize) -> Self {
        self.number_of_restarts = number_of_restarts;
        self
    }

    /// Max number of likelihood evaluations of one local optimization
    pub fn max_eval(mut self, max_eval: usize) -> Self {
        self.max_eval = max_eval;
        self
    }

    /// Seed of restart starting points
    pub fn seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }

    /// Input variables limits
    pub fn limits(mut self, limits: LimitsConfig) -> Self {
        self.limits = limits;
        self
    }

    /// When true a fitted model is fitted again
    pub fn overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    /// Whether an existing model is fitted again
    pub fn is_overwrite(&self) -> bool {
        self.overwrite
    }

    /// Limits configuration
    pub fn limits_config(&self) -> &LimitsConfig {
        &self.limits
    }

    /// GP parameters for the given (sorted) input variables
    pub(crate) fn gp_params(&self, variables: &[String]) -> Result<GpParams<f64>> {
        let length_bounds: Array1<(f64, f64)> = match &self.length_bounds {
            LengthBounds::Shared(lo, up) => array![(*lo, *up)],
            LengthBounds::PerVariable(bounds) => {
                if let Some(unknown) = bounds.keys().find(|k| !variables.contains(*k)) {
                    return Err(SurrogateError::ConfigError(format!(
                        "Length bounds given for '{unknown}' which is not an input variable"
                    )));
                }
                variables
                    .iter()
                    .map(|v| {
                        bounds.get(v).copied().ok_or_else(|| {
                            SurrogateError::ConfigError(format!("No length bounds for '{v}'"))
                        })
                    })
                    .collect::<Result<Array1<_>>>()?
            }
        };

        let mut params = GpParams::new(length_bounds[0], self.noise_bounds)
            .length_scale_bounds(length_bounds)
            .smoothness(self.smoothness.clone())
            .signal_variance(self.signal_variance)
            .n_start(self.number_of_restarts)
            .max_eval(self.max_eval)
            .seed(self.seed);
        if let Some(init) = self.length_init {
            params = params.length_scale_init(array![init]);
        }
        if self.fixed_noise {
            let noise = self
                .noise_magnitude
                .unwrap_or(NoiseTuning::<f64>::DEFAULT_INIT);
            params = params.noise_tuning(NoiseTuning::Fixed(noise));
        } else if let Some(noise) = self.noise_magnitude {
            params = params.noise_init(noise);
        }
        Ok(params)
    }
}
