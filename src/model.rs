use crate::config::{FitConfig, LimitsConfig};
use crate::errors::{Result, SurrogateError};
use crate::prediction::{Assessment, PredictionResult, confidence_scalar};
use crate::table::{DataTable, Limits, auto_limits, check_limits};

use aerogp_gp::{GaussianProcess, GpFileFormat};
use env_logger::{Builder, Env};
use linfa::ParamGuard;
use linfa::prelude::{Dataset, Fit};
use log::{debug, info};
use ndarray::{Array2, ArrayBase, Data, Ix2};
use ndarray_stats::QuantileExt;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::time::Instant;

/// Environment variable controlling the log level
pub const AEROGP_LOG: &str = "AEROGP_LOG";

/// Gaussian process surrogate of one output of a design sweep with respect to
/// named input variables.
///
/// Variables are sorted by name: a feature vector holds one value per variable
/// in lexicographic order of their names.
///
/// # Example
///
/// ```no_run
/// use aerogp::{DataTable, FitConfig, GprModel, LengthBounds};
/// use ndarray::Array;
///
/// let phi = Array::linspace(0.4, 1.2, 12);
/// let eta = phi.mapv(|v| 0.95 - 0.2 * (v - 0.8) * (v - 0.8));
/// let table = DataTable::from_columns([("phi", phi), ("eta_lost", eta)]).unwrap();
///
/// let mut model = GprModel::new(["phi"], "eta_lost").unwrap();
/// model
///     .fit(&table, &FitConfig::new(LengthBounds::Shared(1e-1, 1e3), (1e-10, 1e-3)))
///     .expect("surrogate fitted");
/// let optimum = model
///     .find_global_max_min_values("eta_lost", &Default::default(), 100)
///     .expect("optimum found");
/// println!("{optimum}");
/// ```
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GprModel {
    /// Input variable names in lexicographic order
    variables: Vec<String>,
    /// Output name
    output_key: String,
    /// Search and plot limits of input variables
    limits: Limits,
    /// Fitted Gaussian process, if any
    gp: Option<GaussianProcess<f64>>,
}

impl GprModel {
    /// Constructor of an unfitted model of `output_key` with respect to `variables`
    pub fn new<I, S>(variables: I, output_key: impl Into<String>) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let env = Env::new().filter_or(AEROGP_LOG, "info");
        let mut builder = Builder::from_env(env);
        let builder = builder.target(env_logger::Target::Stdout);
        builder.try_init().ok();

        let output_key = output_key.into();
        let mut variables: Vec<String> = variables.into_iter().map(Into::into).collect();
        variables.sort();
        if variables.is_empty() {
            return Err(SurrogateError::ConfigError(
                "At least one input variable is required".to_string(),
            ));
        }
        if let Some(w) = variables.windows(2).find(|w| w[0] == w[1]) {
            return Err(SurrogateError::ConfigError(format!(
                "Input variable '{}' is declared twice",
                w[0]
            )));
        }
        if variables.contains(&output_key) {
            return Err(SurrogateError::ConfigError(format!(
                "Output '{output_key}' cannot be an input variable"
            )));
        }
        Ok(GprModel {
            variables,
            output_key,
            limits: Limits::new(),
            gp: None,
        })
    }

    /// Input variable names in lexicographic order
    pub fn variables(&self) -> &[String] {
        &self.variables
    }

    /// Output name
    pub fn output_key(&self) -> &str {
        &self.output_key
    }

    /// Search and plot limits of input variables, empty before fit
    pub fn limits(&self) -> &Limits {
        &self.limits
    }

    /// Whether a model is fitted
    pub fn is_fitted(&self) -> bool {
        self.gp.is_some()
    }

    /// Fitted Gaussian process
    pub fn fitted(&self) -> Result<&GaussianProcess<f64>> {
        self.gp.as_ref().ok_or(SurrogateError::NotFittedError)
    }

    /// Fit the surrogate on the variables and output columns of `table`,
    /// other columns are ignored.
    ///
    /// The configuration is always validated. Then, when already fitted and `overwrite`
    /// is not set, the existing model is returned unchanged without reading `table`.
    /// Otherwise the new model replaces the existing one once fully built.
    pub fn fit(&mut self, table: &DataTable, config: &FitConfig) -> Result<&GaussianProcess<f64>> {
        let params = config.gp_params(&self.variables)?;
        params.check_ref()?;
        if let LimitsConfig::Given(limits) = config.limits_config() {
            self.check_known(limits.keys())?;
            if let Some(v) = self.variables.iter().find(|v| !limits.contains_key(*v)) {
                return Err(SurrogateError::ConfigError(format!("No limits for '{v}'")));
            }
            check_limits(limits)?;
        }

        if self.gp.is_some() && !config.is_overwrite() {
            info!(
                "Surrogate of '{}' already fitted, keep it (overwrite not set)",
                self.output_key
            );
            return self.fitted();
        }

        let x = table.select(&self.variables)?;
        let y = table.column(&self.output_key)?.to_owned();
        let limits = match config.limits_config() {
            LimitsConfig::Auto => auto_limits(&x.view(), &self.variables)?,
            LimitsConfig::Given(limits) => limits.clone(),
        };

        info!(
            "Fit surrogate of '{}' over {:?} with {} points",
            self.output_key,
            self.variables,
            x.nrows()
        );
        let now = Instant::now();
        let gp = params.fit(&Dataset::new(x, y))?;
        debug!("elapsed fit = {:?}", now.elapsed().as_millis());
        info!("{gp}");

        self.limits = limits;
        Ok(&*self.gp.insert(gp))
    }

    /// Predict the output at the rows of `table` with `ci_percent` confidence intervals.
    /// Columns other than input variables are ignored.
    pub fn predict(&self, table: &DataTable, ci_percent: f64) -> Result<PredictionResult> {
        let z = confidence_scalar(ci_percent)?;
        let gp = self.fitted()?;
        let x = table.select(&self.variables)?;
        self.predict_points(gp, x, ci_percent, z)
    }

    /// Predict at points given as a (n, nx) matrix, columns in variables order
    pub fn predict_values(
        &self,
        x: &ArrayBase<impl Data<Elem = f64>, Ix2>,
        ci_percent: f64,
    ) -> Result<PredictionResult> {
        let z = confidence_scalar(ci_percent)?;
        let gp = self.fitted()?;
        if x.ncols() != self.variables.len() {
            return Err(SurrogateError::ConfigError(format!(
                "Expected {} input components ({:?}), got {}",
                self.variables.len(),
                self.variables,
                x.ncols()
            )));
        }
        self.predict_points(gp, x.to_owned(), ci_percent, z)
    }

    fn predict_points(
        &self,
        gp: &GaussianProcess<f64>,
        points: Array2<f64>,
        ci_percent: f64,
        confidence_scalar: f64,
    ) -> Result<PredictionResult> {
        let (mean, variance) = gp.predict_valvar(&points)?;
        Ok(PredictionResult {
            variables: self.variables.clone(),
            points,
            mean,
            variance,
            ci_percent,
            confidence_scalar,
        })
    }

    /// Compare predictions at the rows of `table` with its output column
    pub fn assess(&self, table: &DataTable, ci_percent: f64) -> Result<Assessment> {
        let actual = table.column(&self.output_key)?.to_owned();
        let prediction = self.predict(table, ci_percent)?;
        let assessment = Assessment::new(prediction, actual);
        info!(
            "Assessment of '{}': RMSE = {}, R2 = {}",
            self.output_key, assessment.rmse, assessment.r2_score
        );
        Ok(assessment)
    }

    /// Training output (min, max)
    pub fn output_range(&self) -> Result<(f64, f64)> {
        let (_, yt) = self.fitted()?.training_data();
        let min = yt
            .min()
            .map_err(|e| SurrogateError::NumericalInstabilityError(e.to_string()))?;
        let max = yt
            .max()
            .map_err(|e| SurrogateError::NumericalInstabilityError(e.to_string()))?;
        Ok((*min, *max))
    }

    /// Training mean of each input variable
    pub(crate) fn training_means(&self) -> Result<Vec<f64>> {
        let (xt, _) = self.fitted()?.training_data();
        Ok(xt
            .columns()
            .into_iter()
            .map(|c| c.mean().unwrap_or(0.))
            .collect())
    }

    /// Index of the given input variable
    pub(crate) fn variable_index(&self, name: &str) -> Result<usize> {
        self.variables
            .iter()
            .position(|v| v == name)
            .ok_or_else(|| SurrogateError::MissingColumnError(name.to_string()))
    }

    /// Check every name is an input variable
    pub(crate) fn check_known<'a>(&self, names: impl Iterator<Item = &'a String>) -> Result<()> {
        for name in names {
            self.variable_index(name)?;
        }
        Ok(())
    }

    /// Save the model (variables, output, limits and fitted GP) in the given file
    pub fn save(&self, path: &str, format: GpFileFormat) -> Result<()> {
        let mut file = fs::File::create(path)?;
        let bytes = match format {
            GpFileFormat::Json => serde_json::to_vec(self)?,
            GpFileFormat::Binary => bincode::serialize(self)?,
        };
        file.write_all(&bytes)?;
        Ok(())
    }

    /// Load a model from the given file
    pub fn load(path: &str, format: GpFileFormat) -> Result<GprModel> {
        let data = fs::read(path)?;
        let model: GprModel = match format {
            GpFileFormat::Json => serde_json::from_slice(&data)
                .map_err(|e| SurrogateError::LoadError(format!("{path}: {e}")))?,
            GpFileFormat::Binary => bincode::deserialize(&data)
                .map_err(|e| SurrogateError::LoadError(format!("{path}: {e}")))?,
        };
        if let Some(gp) = &model.gp {
            if gp.dims().0 != model.variables.len() {
                return Err(SurrogateError::LoadError(format!(
                    "{path}: model has {} inputs for {} variables",
                    gp.dims().0,
                    model.variables.len()
                )));
            }
        }
        Ok(model)
    }
}
