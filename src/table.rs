//! Named numeric columns exchanged with data providers (CSV readers, formula
//! libraries) and plotting tools.

use crate::errors::{Result, SurrogateError};
use ndarray::{Array1, Array2, ArrayView2};
use ndarray_stats::QuantileExt;
use std::collections::BTreeMap;

/// Inclusive (lower, upper) limits per variable name
pub type Limits = BTreeMap<String, (f64, f64)>;

/// A table of named numeric columns of equal length
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DataTable {
    columns: BTreeMap<String, Array1<f64>>,
}

impl DataTable {
    /// An empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a table from (name, values) pairs
    pub fn from_columns<I, S>(columns: I) -> Result<Self>
    where
        I: IntoIterator<Item = (S, Array1<f64>)>,
        S: Into<String>,
    {
        let mut table = DataTable::new();
        for (name, values) in columns {
            table.insert(name, values)?;
        }
        Ok(table)
    }

    /// Insert a column, replacing any column with the same name.
    /// Column length must match the other columns length.
    pub fn insert(&mut self, name: impl Into<String>, values: Array1<f64>) -> Result<()> {
        let name = name.into();
        if let Some((other, column)) = self.columns.iter().find(|(n, _)| **n != name) {
            if column.len() != values.len() {
                return Err(SurrogateError::ConfigError(format!(
                    "Column '{name}' has {} rows while column '{other}' has {}",
                    values.len(),
                    column.len()
                )));
            }
        }
        self.columns.insert(name, values);
        Ok(())
    }

    /// Column values
    pub fn column(&self, name: &str) -> Result<&Array1<f64>> {
        self.columns
            .get(name)
            .ok_or_else(|| SurrogateError::MissingColumnError(name.to_string()))
    }

    /// Whether the table holds the given column
    pub fn contains(&self, name: &str) -> bool {
        self.columns.contains_key(name)
    }

    /// Column names in lexicographic order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.columns.keys().map(|k| k.as_str())
    }

    /// Number of rows
    pub fn nrows(&self) -> usize {
        self.columns.values().next().map_or(0, |c| c.len())
    }

    /// Number of columns
    pub fn ncols(&self) -> usize {
        self.columns.len()
    }

    /// Whether the table has no column
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Gather the given columns in the given order as a (nrows, names.len()) matrix
    pub fn select(&self, names: &[String]) -> Result<Array2<f64>> {
        let mut x = Array2::zeros((self.nrows(), names.len()));
        for (mut col, name) in x.columns_mut().into_iter().zip(names) {
            col.assign(self.column(name)?);
        }
        Ok(x)
    }
}

/// Per-column limits of `x`: min and max rounded to one decimal
pub(crate) fn auto_limits(x: &ArrayView2<f64>, names: &[String]) -> Result<Limits> {
    let round = |v: f64| (v * 10.).round() / 10.;
    names
        .iter()
        .zip(x.columns())
        .map(|(name, col)| {
            let lo = col.min().map_err(|e| {
                SurrogateError::ConfigError(format!("no limits for '{name}': {e}"))
            })?;
            let up = col.max().map_err(|e| {
                SurrogateError::ConfigError(format!("no limits for '{name}': {e}"))
            })?;
            Ok((name.to_string(), (round(*lo), round(*up))))
        })
        .collect()
}

/// Check limits are finite and ordered
pub(crate) fn check_limits(limits: &Limits) -> Result<()> {
    for (name, (lo, up)) in limits {
        if !(lo.is_finite() && up.is_finite()) || lo > up {
            return Err(SurrogateError::ConfigError(format!(
                "Invalid limits ({lo}, {up}) for '{name}': should verify lower <= upper"
            )));
        }
    }
    Ok(())
}
