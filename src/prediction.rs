use crate::errors::{Result, SurrogateError};
use crate::table::DataTable;
use ndarray::{Array1, Array2, Zip};

/// Default confidence percentage of predicted intervals
pub const DEFAULT_CI_PERCENT: f64 = 95.0;

/// Column of predicted mean values in prediction tables
pub const PREDICTED_OUTPUT: &str = "predicted_output";
/// Column of interval upper bounds in prediction tables
pub const UPPER: &str = "upper";
/// Column of interval lower bounds in prediction tables
pub const LOWER: &str = "lower";
/// Column of actual output values in assessment tables
pub const ACTUAL_OUTPUT: &str = "actual_output";
/// Column of absolute percent errors in assessment tables
pub const PERCENT_ERROR: &str = "percent_error";

/// Two-sided normal quantile `z` such that `mean ± z·sigma` holds `ci_percent`
/// of the distribution, ie `z = Φ⁻¹(1 − (1 − p/100)/2)`.
///
/// `ci_percent` should lie in (0, 100) exclusive.
pub fn confidence_scalar(ci_percent: f64) -> Result<f64> {
    if !(ci_percent > 0. && ci_percent < 100.) {
        return Err(SurrogateError::ConfigError(format!(
            "Confidence percentage should lie in (0, 100), got {ci_percent}"
        )));
    }
    // upper tail probability
    let q = (1. - ci_percent / 100.) / 2.;
    let tail = |z: f64| 0.5 * libm::erfc(z / std::f64::consts::SQRT_2);
    let pdf = |z: f64| (-0.5 * z * z).exp() / (2. * std::f64::consts::PI).sqrt();

    // Newton iterations from the left of the root converge monotonically
    let mut z = 0.;
    for _ in 0..200 {
        let step = (tail(z) - q) / pdf(z);
        z += step;
        if step.abs() <= 1e-14 * z.abs().max(1.) {
            break;
        }
    }
    Ok(z)
}

/// Posterior predictions at query points
#[derive(Clone, Debug, PartialEq)]
pub struct PredictionResult {
    /// Input variable names, columns of `points`
    pub variables: Vec<String>,
    /// Query points as a (n, nx) matrix
    pub points: Array2<f64>,
    /// Posterior mean (n,)
    pub mean: Array1<f64>,
    /// Posterior variance (n,), non negative, noise excluded
    pub variance: Array1<f64>,
    /// Confidence percentage of the intervals
    pub ci_percent: f64,
    /// Normal quantile used for the intervals
    pub confidence_scalar: f64,
}

impl PredictionResult {
    /// Number of predicted points
    pub fn len(&self) -> usize {
        self.mean.len()
    }

    /// Whether there is no predicted point
    pub fn is_empty(&self) -> bool {
        self.mean.is_empty()
    }

    /// Posterior standard deviation
    pub fn std_dev(&self) -> Array1<f64> {
        self.variance.mapv(f64::sqrt)
    }

    /// Interval upper bounds `mean + z·sigma`
    pub fn upper(&self) -> Array1<f64> {
        &self.mean + &(self.std_dev() * self.confidence_scalar)
    }

    /// Interval lower bounds `mean - z·sigma`
    pub fn lower(&self) -> Array1<f64> {
        &self.mean - &(self.std_dev() * self.confidence_scalar)
    }

    /// Input columns with `predicted_output`, `upper` and `lower` columns appended
    pub fn to_table(&self) -> Result<DataTable> {
        let mut table = DataTable::new();
        for (name, col) in self.variables.iter().zip(self.points.columns()) {
            table.insert(name.as_str(), col.to_owned())?;
        }
        table.insert(PREDICTED_OUTPUT, self.mean.to_owned())?;
        table.insert(UPPER, self.upper())?;
        table.insert(LOWER, self.lower())?;
        Ok(table)
    }
}

/// Predictions compared with actual outputs
#[derive(Clone, Debug, PartialEq)]
pub struct Assessment {
    /// Predictions at the assessed points
    pub prediction: PredictionResult,
    /// Actual output values
    pub actual: Array1<f64>,
    /// Root mean squared error
    pub rmse: f64,
    /// Coefficient of determination
    pub r2_score: f64,
    /// Absolute error in percent of the actual value
    pub percent_error: Array1<f64>,
}

impl Assessment {
    pub(crate) fn new(prediction: PredictionResult, actual: Array1<f64>) -> Self {
        let n = actual.len() as f64;
        let residuals = &actual - &prediction.mean;
        let ss_res = residuals.mapv(|v| v * v).sum();
        let rmse = (ss_res / n).sqrt();

        let mean = actual.mean().unwrap_or(0.);
        let ss_tot = actual.mapv(|v| (v - mean) * (v - mean)).sum();
        let r2_score = if ss_tot > 0. {
            1. - ss_res / ss_tot
        } else if ss_res == 0. {
            1.
        } else {
            0.
        };

        let mut percent_error = Array1::zeros(actual.len());
        Zip::from(&mut percent_error)
            .and(&residuals)
            .and(&actual)
            .for_each(|e, &r, &a| {
                *e = if r == 0. {
                    0.
                } else if a == 0. {
                    f64::INFINITY
                } else {
                    (r / a).abs() * 100.
                }
            });

        Assessment {
            prediction,
            actual,
            rmse,
            r2_score,
            percent_error,
        }
    }

    /// Prediction table with `actual_output` and `percent_error` columns appended
    pub fn to_table(&self) -> Result<DataTable> {
        let mut table = self.prediction.to_table()?;
        table.insert(ACTUAL_OUTPUT, self.actual.to_owned())?;
        table.insert(PERCENT_ERROR, self.percent_error.to_owned())?;
        Ok(table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    #[test]
    fn test_confidence_scalar() {
        assert_abs_diff_eq!(confidence_scalar(95.).unwrap(), 1.959963984540054, epsilon = 1e-9);
        assert_abs_diff_eq!(confidence_scalar(68.26894921370859).unwrap(), 1., epsilon = 1e-9);
        assert_abs_diff_eq!(confidence_scalar(99.).unwrap(), 2.5758293035489, epsilon = 1e-9);
        assert_abs_diff_eq!(
            confidence_scalar(99.9999).unwrap(),
            4.891638475698,
            epsilon = 1e-8
        );
        assert!(confidence_scalar(1.).unwrap() > 0.);
        for p in [0., 100., -5., 120., f64::NAN] {
            assert!(matches!(
                confidence_scalar(p),
                Err(SurrogateError::ConfigError(_))
            ));
        }
    }

    fn prediction() -> PredictionResult {
        PredictionResult {
            variables: vec!["phi".to_string()],
            points: array![[0.1], [0.2], [0.3]],
            mean: array![1., 2., 0.],
            variance: array![0., 4., 1.],
            ci_percent: 95.,
            confidence_scalar: 2.,
        }
    }

    #[test]
    fn test_prediction_table() {
        let table = prediction().to_table().unwrap();
        assert_eq!(
            vec!["lower", "phi", "predicted_output", "upper"],
            table.names().collect::<Vec<_>>()
        );
        assert_eq!(&array![1., -2., -2.], table.column(LOWER).unwrap());
        assert_eq!(&array![1., 6., 2.], table.column(UPPER).unwrap());
    }

    #[test]
    fn test_assessment() {
        let assessment = Assessment::new(prediction(), array![1.5, 2., 0.]);
        assert_abs_diff_eq!(assessment.rmse, (0.25f64 / 3.).sqrt(), epsilon = 1e-12);
        // mean 7/6, ss_tot = (1/3)^2 + (5/6)^2 + (7/6)^2
        let ss_tot = 1. / 9. + 25. / 36. + 49. / 36.;
        assert_abs_diff_eq!(assessment.r2_score, 1. - 0.25 / ss_tot, epsilon = 1e-12);
        assert_abs_diff_eq!(assessment.percent_error, array![100. / 3., 0., 0.], epsilon = 1e-12);

        let table = assessment.to_table().unwrap();
        assert!(table.contains(ACTUAL_OUTPUT) && table.contains(PERCENT_ERROR));
    }
}
