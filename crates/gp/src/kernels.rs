//! A module for the Matérn covariance family used by the GP model.
//!
//! The kernel is isotropic in the scaled euclidean distance
//! `r = sqrt(sum_j (d_j / l_j)^2)` where `l_j` is the length scale of the jth component.
//! The following smoothness values `nu` are implemented in closed form:
//! * 1/2: absolute exponential,
//! * 3/2: matern 3/2,
//! * 5/2: matern 5/2,
//! * infinity: squared exponential.

use crate::errors::{GpError, Result};
use linfa::Float;
use ndarray::{Array1, ArrayBase, Axis, Data, Ix1, Ix2, Zip};
#[cfg(feature = "serializable")]
use serde::{Deserialize, Serialize};
use std::convert::TryFrom;
use std::fmt;

/// Smoothness `nu` of the Matérn kernel
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(
    feature = "serializable",
    derive(Serialize, Deserialize),
    serde(into = "String"),
    serde(try_from = "String")
)]
pub enum Smoothness {
    /// nu = 1/2, `exp(-r)`
    Exponential,
    /// nu = 3/2, `(1 + sqrt(3) r) exp(-sqrt(3) r)`
    Matern32,
    /// nu = 5/2, `(1 + sqrt(5) r + 5/3 r^2) exp(-sqrt(5) r)`
    Matern52,
    /// nu = infinity, `exp(-r^2 / 2)`
    SquaredExponential,
}

impl Smoothness {
    /// All available smoothness values sorted by increasing `nu`
    pub const ALL: [Smoothness; 4] = [
        Smoothness::Exponential,
        Smoothness::Matern32,
        Smoothness::Matern52,
        Smoothness::SquaredExponential,
    ];

    /// Smoothness parameter `nu` (infinity for squared exponential)
    pub fn nu(&self) -> f64 {
        match self {
            Smoothness::Exponential => 0.5,
            Smoothness::Matern32 => 1.5,
            Smoothness::Matern52 => 2.5,
            Smoothness::SquaredExponential => f64::INFINITY,
        }
    }

    /// Smoothness from `nu` value, only 0.5, 1.5, 2.5 and infinity have a closed form.
    pub fn from_nu(nu: f64) -> Result<Smoothness> {
        Smoothness::ALL
            .iter()
            .find(|s| s.nu() == nu)
            .copied()
            .ok_or_else(|| {
                GpError::ConfigError(format!(
                    "Matern smoothness nu={nu} not supported, should be one of 0.5, 1.5, 2.5 or inf"
                ))
            })
    }

    /// Correlation `m_nu(r)` at scaled distance `r >= 0`, equal to one at `r = 0`
    pub fn correlation<F: Float>(&self, r: F) -> F {
        match self {
            Smoothness::Exponential => (-r).exp(),
            Smoothness::Matern32 => {
                let sr = F::cast(3.).sqrt() * r;
                (F::one() + sr) * (-sr).exp()
            }
            Smoothness::Matern52 => {
                let sr = F::cast(5.).sqrt() * r;
                (F::one() + sr + sr * sr / F::cast(3.)) * (-sr).exp()
            }
            Smoothness::SquaredExponential => (F::cast(-0.5) * r * r).exp(),
        }
    }
}

impl fmt::Display for Smoothness {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            Smoothness::Exponential => "Exponential",
            Smoothness::Matern32 => "Matern32",
            Smoothness::Matern52 => "Matern52",
            Smoothness::SquaredExponential => "SquaredExponential",
        };
        write!(f, "{name}")
    }
}

impl From<Smoothness> for String {
    fn from(item: Smoothness) -> String {
        item.to_string()
    }
}

impl TryFrom<String> for Smoothness {
    type Error = String;
    fn try_from(s: String) -> std::result::Result<Self, Self::Error> {
        Smoothness::ALL
            .iter()
            .find(|v| v.to_string() == s)
            .copied()
            .ok_or_else(|| {
                format!(
                    "Bad string value for Smoothness, should be one of \
                     'Exponential', 'Matern32', 'Matern52', 'SquaredExponential', got '{s}'"
                )
            })
    }
}

/// Matérn covariance `k(a, b) = signal_variance * m_nu(r)`
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(
    feature = "serializable",
    derive(Serialize, Deserialize),
    serde(bound(deserialize = "F: Deserialize<'de>"))
)]
pub struct MaternKernel<F: Float> {
    /// Smoothness of the implied function class
    pub smoothness: Smoothness,
    /// Covariance at zero distance
    pub signal_variance: F,
}

impl<F: Float> MaternKernel<F> {
    /// Constructor
    pub fn new(smoothness: Smoothness, signal_variance: F) -> Self {
        MaternKernel {
            smoothness,
            signal_variance,
        }
    }

    /// Covariance between two points `a` and `b` given per-component `length_scales`
    pub fn covariance(
        &self,
        a: &ArrayBase<impl Data<Elem = F>, Ix1>,
        b: &ArrayBase<impl Data<Elem = F>, Ix1>,
        length_scales: &ArrayBase<impl Data<Elem = F>, Ix1>,
    ) -> F {
        let mut r2 = F::zero();
        Zip::from(a).and(b).and(length_scales).for_each(|&ai, &bi, &l| {
            let s = (ai - bi) / l;
            r2 += s * s;
        });
        self.signal_variance * self.smoothness.correlation(r2.sqrt())
    }

    /// Covariance values given componentwise differences `d` as a (n, nx) matrix,
    /// one row per pair of points. Returns a (n,) vector.
    pub fn value(
        &self,
        d: &ArrayBase<impl Data<Elem = F>, Ix2>,
        length_scales: &ArrayBase<impl Data<Elem = F>, Ix1>,
    ) -> Array1<F> {
        let scaled = d / length_scales;
        let r = scaled.mapv(|v| v * v).sum_axis(Axis(1)).mapv(|v| v.sqrt());
        r.mapv(|ri| self.signal_variance * self.smoothness.correlation(ri))
    }
}

impl<F: Float> fmt::Display for MaternKernel<F> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "Matern(nu={}, variance={})",
            self.smoothness.nu(),
            self.signal_variance
        )
    }
}
