use crate::errors::{Result, SurrogateError};
use crate::model::GprModel;
use crate::prediction::DEFAULT_CI_PERCENT;
use crate::table::{Limits, check_limits};

use aerogp_doe::FullFactorial;
use log::debug;
use ndarray::{Array1, Array2, Axis};
use ndarray_stats::{QuantileExt, errors::MinMaxError};
use std::collections::BTreeMap;
use std::fmt;

/// Max number of values (points × variables) of a prediction grid
pub const MAX_GRID_VALUES: usize = 10_000_000;

/// Number of points of a grid of `resolution` levels over `nfree` variables,
/// `ConfigError` when the (npoints, nvars) grid would hold more than [MAX_GRID_VALUES]
pub(crate) fn check_grid_size(resolution: usize, nfree: usize, nvars: usize) -> Result<usize> {
    u32::try_from(nfree)
        .ok()
        .and_then(|k| resolution.checked_pow(k))
        .filter(|npoints| {
            npoints
                .checked_mul(nvars)
                .is_some_and(|n| n <= MAX_GRID_VALUES)
        })
        .ok_or_else(|| {
            SurrogateError::ConfigError(format!(
                "Grid of {resolution}^{nfree} points over {nvars} variable(s) is too large \
                 (max {MAX_GRID_VALUES} values)"
            ))
        })
}

/// Values of input variables held constant during an optimum search
pub type FixedSlices = BTreeMap<String, f64>;

/// Predicted extremum of the output over a grid
#[derive(Clone, Debug, PartialEq)]
pub struct Extremum {
    /// Index of the point in the grid
    pub index: usize,
    /// Input variables values, in variables order
    pub point: Array1<f64>,
    /// Predicted mean
    pub value: f64,
    /// Confidence interval lower bound
    pub lower: f64,
    /// Confidence interval upper bound
    pub upper: f64,
}

/// Global maximum and minimum of the predicted output over a grid
#[derive(Clone, Debug, PartialEq)]
pub struct OptimumReport {
    /// Output name
    pub target: String,
    /// Input variable names
    pub variables: Vec<String>,
    /// Grid point with the greatest predicted mean
    pub maximum: Extremum,
    /// Grid point with the lowest predicted mean
    pub minimum: Extremum,
    /// Limits spanned by each free variable
    pub limits: Limits,
    /// Values of variables held constant
    pub fixed: FixedSlices,
    /// Number of levels of each free variable
    pub resolution: usize,
    /// Confidence percentage of extremum intervals
    pub ci_percent: f64,
}

impl fmt::Display for OptimumReport {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let describe = |e: &Extremum| {
            self.variables
                .iter()
                .zip(e.point.iter())
                .map(|(n, v)| format!("{n}={v}"))
                .collect::<Vec<_>>()
                .join(", ")
        };
        writeln!(
            f,
            "max {} = {} [{}, {}] at {}",
            self.target,
            self.maximum.value,
            self.maximum.lower,
            self.maximum.upper,
            describe(&self.maximum)
        )?;
        write!(
            f,
            "min {} = {} [{}, {}] at {}",
            self.target,
            self.minimum.value,
            self.minimum.lower,
            self.minimum.upper,
            describe(&self.minimum)
        )
    }
}

impl GprModel {
    /// Search the global maximum and minimum of the predicted `target` output
    /// over a full factorial grid of `resolution` levels per free variable
    /// spanning model limits, variables in `fixed` being held constant.
    pub fn find_global_max_min_values(
        &self,
        target: &str,
        fixed: &FixedSlices,
        resolution: usize,
    ) -> Result<OptimumReport> {
        self.find_global_max_min_values_within(target, fixed, resolution, &Limits::new())
    }

    /// Same as [GprModel::find_global_max_min_values] with model limits overridden by `limits`
    pub fn find_global_max_min_values_within(
        &self,
        target: &str,
        fixed: &FixedSlices,
        resolution: usize,
        limits: &Limits,
    ) -> Result<OptimumReport> {
        if target != self.output_key() {
            return Err(SurrogateError::MissingColumnError(format!(
                "{target} (model output is '{}')",
                self.output_key()
            )));
        }
        self.fitted()?;
        if resolution == 0 {
            return Err(SurrogateError::ConfigError(
                "Grid resolution should be at least 1".to_string(),
            ));
        }
        self.check_known(fixed.keys())?;
        self.check_known(limits.keys())?;
        check_limits(limits)?;
        if let Some((name, v)) = fixed.iter().find(|(_, v)| !v.is_finite()) {
            return Err(SurrogateError::ConfigError(format!(
                "Fixed value of '{name}' is not finite ({v})"
            )));
        }

        let free: Vec<&String> = self
            .variables()
            .iter()
            .filter(|v| !fixed.contains_key(*v))
            .collect();
        let mut free_limits = Limits::new();
        for name in free.iter() {
            let bounds = limits
                .get(*name)
                .or_else(|| self.limits().get(*name))
                .ok_or_else(|| SurrogateError::ConfigError(format!("No limits for '{name}'")))?;
            free_limits.insert(name.to_string(), *bounds);
        }

        let x = self.grid(&free, &free_limits, fixed, resolution)?;
        debug!("Search optimum of '{target}' over {} grid points", x.nrows());
        let prediction = self.predict_values(&x, DEFAULT_CI_PERCENT)?;
        let (upper, lower) = (prediction.upper(), prediction.lower());
        let extremum = |index: usize| Extremum {
            index,
            point: prediction.points.row(index).to_owned(),
            value: prediction.mean[index],
            lower: lower[index],
            upper: upper[index],
        };
        let undefined = |e: MinMaxError| SurrogateError::NumericalInstabilityError(format!("{e}"));
        let maximum = extremum(prediction.mean.argmax().map_err(undefined)?);
        let minimum = extremum(prediction.mean.argmin().map_err(undefined)?);

        Ok(OptimumReport {
            target: target.to_string(),
            variables: self.variables().to_vec(),
            maximum,
            minimum,
            limits: free_limits,
            fixed: fixed.clone(),
            resolution,
            ci_percent: DEFAULT_CI_PERCENT,
        })
    }

    /// Full factorial grid over `free` variables (first one varying slowest)
    /// completed with `fixed` values, columns in variables order
    fn grid(
        &self,
        free: &[&String],
        free_limits: &Limits,
        fixed: &FixedSlices,
        resolution: usize,
    ) -> Result<Array2<f64>> {
        let free_grid = if free.is_empty() {
            Array2::zeros((1, 0))
        } else {
            let mut xlimits = Array2::zeros((free.len(), 2));
            for (mut row, name) in xlimits.axis_iter_mut(Axis(0)).zip(free) {
                let (lo, up) = free_limits[name.as_str()];
                row[0] = lo;
                row[1] = up;
            }
            check_grid_size(resolution, free.len(), self.variables().len())?;
            FullFactorial::new(&xlimits).levels(resolution).sample_grid()
        };

        let mut x = Array2::zeros((free_grid.nrows(), self.variables().len()));
        let mut k = 0;
        for (mut col, name) in x.columns_mut().into_iter().zip(self.variables()) {
            match fixed.get(name) {
                Some(v) => col.fill(*v),
                None => {
                    col.assign(&free_grid.column(k));
                    k += 1;
                }
            }
        }
        Ok(x)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{FitConfig, LengthBounds};
    use crate::model::tests::sin_model;
    use crate::table::DataTable;
    use approx::assert_abs_diff_eq;
    use ndarray::{Array, array};

    #[test]
    fn test_sin_optimum() {
        let model = sin_model();
        let report = model
            .find_global_max_min_values("y", &FixedSlices::new(), 100)
            .unwrap();
        assert_abs_diff_eq!(report.maximum.value, 1., epsilon = 0.1);
        assert_abs_diff_eq!(report.minimum.value, -1., epsilon = 0.1);
        let xmax = report.maximum.point[0];
        let pi = std::f64::consts::PI;
        assert!((xmax - pi / 2.).abs() < 0.3 || (xmax - 5. * pi / 2.).abs() < 0.3);
        assert_abs_diff_eq!(report.minimum.point[0], 3. * pi / 2., epsilon = 0.3);
        assert!(report.maximum.lower <= report.maximum.value);
        assert!(report.maximum.upper >= report.maximum.value);
        assert_eq!((0., 10.), report.limits["x"]);

        // reproducible
        let again = model
            .find_global_max_min_values("y", &FixedSlices::new(), 100)
            .unwrap();
        assert_eq!(report, again);
        println!("{report}");
    }

    #[test]
    fn test_optimum_within_limits() {
        let model = sin_model();
        let limits = Limits::from([("x".to_string(), (3., 6.))]);
        let report = model
            .find_global_max_min_values_within("y", &FixedSlices::new(), 31, &limits)
            .unwrap();
        // sin is decreasing then increasing over [3, 6]
        assert_abs_diff_eq!(report.minimum.point[0], 3. * std::f64::consts::PI / 2., epsilon = 0.3);
        assert_abs_diff_eq!(report.maximum.point[0], 3., epsilon = 1e-12);
    }

    fn plane_model() -> GprModel {
        // y = a - 2b + c over a small factorial design
        let levels = Array::linspace(0., 1., 4);
        let (mut a, mut b, mut c) = (vec![], vec![], vec![]);
        for &va in levels.iter() {
            for &vb in levels.iter() {
                for &vc in levels.iter() {
                    a.push(va);
                    b.push(vb);
                    c.push(vc);
                }
            }
        }
        let (a, b, c) = (Array1::from(a), Array1::from(b), Array1::from(c));
        let y = &a - &(&b * 2.) + &c;
        let table = DataTable::from_columns([("a", a), ("b", b), ("c", c), ("y", y)]).unwrap();
        let mut model = GprModel::new(["c", "a", "b"], "y").unwrap();
        model
            .fit(
                &table,
                &FitConfig::new(LengthBounds::Shared(1e-1, 1e2), (1e-8, 1e-4)).seed(Some(42)),
            )
            .unwrap();
        model
    }

    #[test]
    fn test_optimum_with_fixed_slices() {
        let model = plane_model();
        let fixed = FixedSlices::from([("b".to_string(), 0.5)]);
        let report = model.find_global_max_min_values("y", &fixed, 5).unwrap();
        assert_eq!(vec!["a", "b", "c"], report.variables);
        assert_abs_diff_eq!(report.maximum.point, array![1., 0.5, 1.], epsilon = 1e-12);
        assert_abs_diff_eq!(report.minimum.point, array![0., 0.5, 0.], epsilon = 1e-12);
        assert_abs_diff_eq!(report.maximum.value, 1., epsilon = 5e-2);
        // grid order: first free variable slowest, max is the last point
        assert_eq!(24, report.maximum.index);
        assert_eq!(0, report.minimum.index);
        assert!(!report.limits.contains_key("b"));
    }

    #[test]
    fn test_optimum_all_fixed() {
        let model = plane_model();
        let fixed =
            FixedSlices::from([("a".to_string(), 1.), ("b".to_string(), 0.), ("c".to_string(), 0.)]);
        let report = model.find_global_max_min_values("y", &fixed, 10).unwrap();
        assert_eq!(report.maximum, report.minimum);
        assert_abs_diff_eq!(report.maximum.value, 1., epsilon = 5e-2);
    }

    #[test]
    fn test_optimum_ties_to_first_grid_point() {
        let x = Array::linspace(0., 10., 8);
        let y = Array1::from_elem(8, 2.5);
        let table = DataTable::from_columns([("x", x), ("y", y)]).unwrap();
        let mut model = GprModel::new(["x"], "y").unwrap();
        model
            .fit(
                &table,
                &FitConfig::new(LengthBounds::Shared(1e-2, 1e2), (1e-6, 1e-2)).seed(Some(42)),
            )
            .unwrap();
        let report = model
            .find_global_max_min_values("y", &FixedSlices::new(), 20)
            .unwrap();
        assert_eq!(0, report.maximum.index);
        assert_eq!(0, report.minimum.index);
        assert_abs_diff_eq!(report.maximum.value, 2.5, epsilon = 1e-9);
        assert_abs_diff_eq!(report.maximum.point, array![0.], epsilon = 1e-12);
    }

    #[test]
    fn test_grid_too_large() {
        let model = sin_model();
        assert!(matches!(
            model.find_global_max_min_values("y", &FixedSlices::new(), 1 << 62),
            Err(SurrogateError::ConfigError(_))
        ));
        assert!(matches!(
            model.find_global_max_min_values("y", &FixedSlices::new(), MAX_GRID_VALUES + 1),
            Err(SurrogateError::ConfigError(_))
        ));
        assert_eq!(100, check_grid_size(10, 2, 3).unwrap());
        assert_eq!(1, check_grid_size(7, 0, 3).unwrap());
        assert!(check_grid_size(usize::MAX, 2, 1).is_err());
        assert!(check_grid_size(10, 7, 2).is_err());
    }

    #[test]
    fn test_optimum_errors() {
        let model = sin_model();
        let none = FixedSlices::new();
        assert!(matches!(
            model.find_global_max_min_values("eta", &none, 10),
            Err(SurrogateError::MissingColumnError(_))
        ));
        assert!(matches!(
            model.find_global_max_min_values("y", &none, 0),
            Err(SurrogateError::ConfigError(_))
        ));
        let fixed = FixedSlices::from([("z".to_string(), 0.)]);
        assert!(matches!(
            model.find_global_max_min_values("y", &fixed, 10),
            Err(SurrogateError::MissingColumnError(_))
        ));
        let limits = Limits::from([("x".to_string(), (6., 3.))]);
        assert!(matches!(
            model.find_global_max_min_values_within("y", &none, 10, &limits),
            Err(SurrogateError::ConfigError(_))
        ));
        let unfitted = GprModel::new(["x"], "y").unwrap();
        assert!(matches!(
            unfitted.find_global_max_min_values("y", &none, 10),
            Err(SurrogateError::NotFittedError)
        ));
    }
}
