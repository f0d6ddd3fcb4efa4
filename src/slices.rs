use crate::errors::{Result, SurrogateError};
use crate::model::GprModel;
use crate::optimum::check_grid_size;
use crate::prediction::{DEFAULT_CI_PERCENT, PredictionResult};

use aerogp_doe::FullFactorial;
use ndarray::{Array1, Array2, ArrayD, IxDyn};
use std::collections::BTreeMap;

/// Value of an input variable held constant in a slice
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum Constant {
    /// Training mean of the variable
    #[default]
    Mean,
    /// Given value
    Value(f64),
}

/// Constants of variables other than the sliced ones, missing variables are held at their mean
pub type SliceConstants = BTreeMap<String, Constant>;

/// Predictions over a 1D or 2D slice of the input space.
///
/// For a 2D slice, arrays are `(resolution, resolution)` shaped and
/// `[i, j]` stands for `(axes[0][i], axes[1][j])`.
#[derive(Clone, Debug, PartialEq)]
pub struct SliceGrid {
    /// Sliced variable names with their evenly spaced coordinates
    pub axes: Vec<(String, Array1<f64>)>,
    /// Values of the other variables
    pub constants: BTreeMap<String, f64>,
    /// Predictions at the grid points, flattened in row-major order
    pub prediction: PredictionResult,
    /// Predicted mean
    pub mean: ArrayD<f64>,
    /// Predicted variance
    pub variance: ArrayD<f64>,
    /// Confidence interval upper bounds
    pub upper: ArrayD<f64>,
    /// Confidence interval lower bounds
    pub lower: ArrayD<f64>,
}

impl GprModel {
    /// Predict along variable `x` spanning its limits with `resolution` points
    pub fn predict_slice_1d(
        &self,
        x: &str,
        resolution: usize,
        constants: &SliceConstants,
    ) -> Result<SliceGrid> {
        self.predict_slice(&[x], resolution, constants)
    }

    /// Predict over the `resolution × resolution` grid of variables `x1` and `x2` spanning their limits
    pub fn predict_slice_2d(
        &self,
        x1: &str,
        x2: &str,
        resolution: usize,
        constants: &SliceConstants,
    ) -> Result<SliceGrid> {
        if x1 == x2 {
            return Err(SurrogateError::ConfigError(format!(
                "Slice variables should differ, got '{x1}' twice"
            )));
        }
        self.predict_slice(&[x1, x2], resolution, constants)
    }

    fn predict_slice(
        &self,
        sliced: &[&str],
        resolution: usize,
        constants: &SliceConstants,
    ) -> Result<SliceGrid> {
        let means = self.training_means()?;
        if resolution == 0 {
            return Err(SurrogateError::ConfigError(
                "Slice resolution should be at least 1".to_string(),
            ));
        }
        let indices = sliced
            .iter()
            .map(|name| self.variable_index(name))
            .collect::<Result<Vec<_>>>()?;
        self.check_known(constants.keys())?;
        if let Some(name) = sliced.iter().find(|v| constants.contains_key(**v)) {
            return Err(SurrogateError::ConfigError(format!(
                "'{name}' is sliced and cannot be held constant"
            )));
        }

        check_grid_size(resolution, sliced.len(), self.variables().len())?;

        let mut xlimits = Array2::zeros((sliced.len(), 2));
        for (k, name) in sliced.iter().enumerate() {
            let (lo, up) = self
                .limits()
                .get(*name)
                .ok_or_else(|| SurrogateError::ConfigError(format!("No limits for '{name}'")))?;
            xlimits[[k, 0]] = *lo;
            xlimits[[k, 1]] = *up;
        }
        let grid = FullFactorial::new(&xlimits).levels(resolution).sample_grid();

        let mut values = BTreeMap::new();
        let mut x = Array2::zeros((grid.nrows(), self.variables().len()));
        for (i, name) in self.variables().iter().enumerate() {
            match indices.iter().position(|&k| k == i) {
                Some(k) => x.column_mut(i).assign(&grid.column(k)),
                None => {
                    let v = match constants.get(name).copied().unwrap_or_default() {
                        Constant::Mean => means[i],
                        Constant::Value(v) => v,
                    };
                    x.column_mut(i).fill(v);
                    values.insert(name.to_string(), v);
                }
            }
        }

        let prediction = self.predict_values(&x, DEFAULT_CI_PERCENT)?;
        let shape = IxDyn(&vec![resolution; sliced.len()]);
        let shaped = |a: Array1<f64>| {
            a.into_shape(shape.clone())
                .map_err(|e| SurrogateError::ConfigError(format!("slice grid: {e}")))
        };
        let axes = sliced
            .iter()
            .map(|name| {
                let (lo, up) = self.limits()[*name];
                (name.to_string(), Array1::linspace(lo, up, resolution))
            })
            .collect();
        Ok(SliceGrid {
            axes,
            constants: values,
            mean: shaped(prediction.mean.clone())?,
            variance: shaped(prediction.variance.clone())?,
            upper: shaped(prediction.upper())?,
            lower: shaped(prediction.lower())?,
            prediction,
        })
    }
}
