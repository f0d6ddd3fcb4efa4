//! Covariance matrices assembly and factorization.

use crate::errors::{GpError, Result};
use crate::kernels::MaternKernel;
use crate::utils::DiffMatrix;

use linfa::Float;
use linfa_linalg::{cholesky::*, triangular::*};
use ndarray::{Array1, Array2, ArrayBase, Axis, Data, Ix1, Ix2};
#[cfg(feature = "serializable")]
use serde::{Deserialize, Serialize};

/// Training covariance `K = k(X, X) + noise * I` as a (n_obs, n_obs) matrix
/// built from the pairwise differences of the training points
pub fn training_covariance<F: Float>(
    kernel: &MaternKernel<F>,
    x_distances: &DiffMatrix<F>,
    length_scales: &ArrayBase<impl Data<Elem = F>, Ix1>,
    noise: F,
) -> Array2<F> {
    let n = x_distances.n_obs;
    let kxx = kernel.value(&x_distances.d, length_scales);
    let mut k_mx = Array2::<F>::eye(n).mapv(|v| v * (kernel.signal_variance + noise));
    for (k, ij) in x_distances.d_indices.outer_iter().enumerate() {
        k_mx[[ij[0], ij[1]]] = kxx[k];
        k_mx[[ij[1], ij[0]]] = kxx[k];
    }
    k_mx
}

/// Cross covariance `k(x, xt)` between m query points and n training points as a (m, n) matrix
pub fn cross_covariance<F: Float>(
    kernel: &MaternKernel<F>,
    x: &ArrayBase<impl Data<Elem = F>, Ix2>,
    xt: &ArrayBase<impl Data<Elem = F>, Ix2>,
    length_scales: &ArrayBase<impl Data<Elem = F>, Ix1>,
) -> Array2<F> {
    Array2::from_shape_fn((x.nrows(), xt.nrows()), |(i, j)| {
        kernel.covariance(&x.row(i), &xt.row(j), length_scales)
    })
}

/// Lower triangular cholesky factor `L` of `k_mx` such that `L.L^t = k_mx`
///
/// No jitter is added: a matrix which is not positive definite is reported as
/// a numerical instability.
pub fn factorize<F: Float>(k_mx: &Array2<F>) -> Result<Array2<F>> {
    let chol = k_mx.cholesky().map_err(|e| {
        GpError::NumericalInstabilityError(format!("covariance factorization failed ({e})"))
    })?;
    if chol.diag().iter().any(|v| !v.is_finite() || *v <= F::zero()) {
        return Err(GpError::NumericalInstabilityError(
            "covariance factorization failed (non positive pivot)".to_string(),
        ));
    }
    Ok(chol)
}

/// Quantities computed once at training time and reused for prediction
#[derive(Default, Debug, Clone)]
#[cfg_attr(
    feature = "serializable",
    derive(Serialize, Deserialize),
    serde(bound(deserialize = "F: Deserialize<'de>"))
)]
pub(crate) struct GpInnerParams<F: Float> {
    /// Cholesky factor of the training covariance matrix \[K\]
    pub chol: Array2<F>,
    /// Gaussian Process weights, solution of \[K\] alpha = y
    pub alpha: Array1<F>,
}

/// Marginal log likelihood of normalized outputs `y` given the training covariance:
///
/// `log p(y | X, theta) = -1/2 y^t K^-1 y - sum(log diag(L)) - n/2 log(2 pi)`
pub(crate) fn log_likelihood<F: Float>(
    k_mx: &Array2<F>,
    y: &ArrayBase<impl Data<Elem = F>, Ix1>,
) -> Result<(F, GpInnerParams<F>)> {
    let chol = factorize(k_mx)?;
    let yc = y.to_owned().insert_axis(Axis(1));
    let z = chol.solve_triangular(&yc, UPLO::Lower)?;
    let alpha = chol
        .t()
        .solve_triangular_into(z, UPLO::Upper)?
        .remove_axis(Axis(1));

    let n = F::cast(y.len());
    let data_fit = y.dot(&alpha);
    let log_det = chol.diag().mapv(|v| v.ln()).sum();
    let two_pi = F::cast(2. * std::f64::consts::PI);
    let likelihood = F::cast(-0.5) * data_fit - log_det - n / F::cast(2.) * two_pi.ln();

    if !likelihood.is_finite() {
        return Err(GpError::NumericalInstabilityError(format!(
            "likelihood is not finite ({likelihood})"
        )));
    }
    Ok((likelihood, GpInnerParams { chol, alpha }))
}
