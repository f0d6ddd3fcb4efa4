use aerogp_doe::{Lhs, LhsKind, SamplingMethod};
use linfa::Float;
use ndarray::{Array1, Array2, arr1, s};
use ndarray_rand::rand::SeedableRng;
use rand_xoshiro::Xoshiro256Plus;

pub(crate) struct CobylaParams {
    pub rhobeg: f64,
    pub ftol_rel: f64,
    pub maxeval: usize,
}

impl Default for CobylaParams {
    fn default() -> Self {
        CobylaParams {
            rhobeg: 0.5,
            ftol_rel: 1e-6,
            maxeval: 200,
        }
    }
}

/// Outcome of one local optimization
#[derive(Debug, Clone)]
pub(crate) struct Restart {
    /// Objective value, infinite when no finite value was found
    pub fval: f64,
    /// Optimum location in optimization space
    pub xopt: Array1<f64>,
}

/// Returns the multistart starting points as a (n_start + 1, nparams) matrix
/// and the bounds, both on log10 scale.
///
/// The first row is the given initial guess, the others are spread over the
/// bounds with a maximin LHS drawn from a generator seeded with `seed`
/// (from entropy when no seed is given).
pub(crate) fn prepare_multistart<F: Float>(
    n_start: usize,
    param0: &Array1<F>,
    bounds: &[(F, F)],
    seed: Option<u64>,
) -> (Array2<f64>, Vec<(f64, f64)>) {
    // Use log10 of parameters as optimization variables
    let bounds: Vec<(f64, f64)> = bounds
        .iter()
        .map(|(lo, up)| (to_f64(*lo).log10(), to_f64(*up).log10()))
        .collect();

    let mut starts = Array2::zeros((n_start + 1, param0.len()));
    starts.row_mut(0).assign(&param0.mapv(|v| to_f64(v).log10()));

    if n_start > 0 {
        let mut xlimits = Array2::zeros((bounds.len(), 2));
        for (mut row, (lo, up)) in xlimits.rows_mut().into_iter().zip(&bounds) {
            row.assign(&arr1(&[*lo, *up]));
        }

        let rng = match seed {
            Some(seed) => Xoshiro256Plus::seed_from_u64(seed),
            None => Xoshiro256Plus::from_entropy(),
        };
        let samples = Lhs::new(&xlimits)
            .kind(LhsKind::Maximin)
            .with_rng(rng)
            .sample(n_start);
        starts.slice_mut(s![1.., ..]).assign(&samples);
    }
    (starts, bounds)
}

/// Minimize `objfn` from `param0` within `bounds` with COBYLA.
///
/// The returned location is clipped into the bounds. A failed search keeps its
/// last iterate when its objective value is finite.
pub(crate) fn optimize_params<ObjF>(
    objfn: ObjF,
    param0: &[f64],
    bounds: &[(f64, f64)],
    cobyla: CobylaParams,
) -> Restart
where
    ObjF: Fn(&[f64]) -> f64,
{
    use cobyla::{Func, StopTols, minimize};

    let cons: Vec<&dyn Func<()>> = vec![];
    let clip = |x: &[f64]| {
        Array1::from_iter(
            x.iter()
                .zip(bounds)
                .map(|(v, (lo, up))| v.max(*lo).min(*up)),
        )
    };

    match minimize(
        |x: &[f64], _u: &mut ()| objfn(x),
        param0,
        bounds,
        &cons,
        (),
        cobyla.maxeval,
        cobyla::RhoBeg::All(cobyla.rhobeg),
        Some(StopTols {
            ftol_rel: cobyla.ftol_rel,
            ..StopTols::default()
        }),
    ) {
        Ok((_, x_opt, _)) => {
            let xopt = clip(&x_opt);
            let fval = objfn(xopt.as_slice().unwrap_or(&x_opt[..]));
            Restart {
                fval: if fval.is_nan() { f64::INFINITY } else { fval },
                xopt,
            }
        }
        Err((status, x_opt, _)) => {
            log::debug!("Cobyla optimizer stopped with status={status:?}");
            let xopt = clip(&x_opt);
            let fval = objfn(xopt.as_slice().unwrap_or(&x_opt[..]));
            Restart {
                fval: if fval.is_finite() { fval } else { f64::INFINITY },
                xopt,
            }
        }
    }
}

/// Index of the best restart: lowest finite objective value, ties resolved
/// with the lowest restart index. `None` when no restart has a finite value.
pub(crate) fn best_restart(restarts: &[Restart]) -> Option<usize> {
    restarts
        .iter()
        .enumerate()
        .filter(|(_, r)| r.fval.is_finite())
        .fold(None, |best: Option<(usize, f64)>, (i, r)| match best {
            Some((_, fbest)) if fbest <= r.fval => best,
            _ => Some((i, r.fval)),
        })
        .map(|(i, _)| i)
}

#[inline]
pub(crate) fn to_f64<F: Float>(v: F) -> f64 {
    v.to_f64().unwrap_or(f64::NAN)
}
