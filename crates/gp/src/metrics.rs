//! A module for metrics to evaluate Gaussian Process models performances
//! with cross validation: the predictive coefficient Q2 compares the predictive
//! residual sum of squares to the total sum of squares of held-out outputs.

use linfa::dataset::Dataset;
use linfa::{Float, traits::Fit};
use ndarray::{Array1, Array2};

use crate::{GaussianProcess, GpError, GpParams, Result};

/// A trait for Q2 predictive coefficient cross validation score
pub trait PredictScore<F: Float> {
    /// Return the training data (xt, yt)
    fn training_data(&self) -> &(Array2<F>, Array1<F>);

    /// Return the model parameters
    fn params(&self) -> GpParams<F>;

    /// Compute quality metric Q2 with kfold cross validation
    fn q2_score(&self, kfold: usize) -> Result<F> {
        let (xt, yt) = self.training_data();
        if kfold < 2 || kfold > xt.nrows() {
            return Err(GpError::ConfigError(format!(
                "Cross validation folds should be in [2, {}], got {kfold}",
                xt.nrows()
            )));
        }
        let dataset = Dataset::new(xt.to_owned(), yt.to_owned());
        let yt_mean = yt.mean().unwrap_or_else(F::zero);
        // Predictive Residual Sum of Squares
        let mut press = F::zero();
        // Total Sum of Squares
        let mut tss = F::zero();
        for (train, valid) in dataset.fold(kfold).into_iter() {
            let model: GaussianProcess<F> = self.params().fit(&train)?;
            let pred = model.predict(valid.records())?;
            press += (valid.targets() - &pred).mapv(|v| v * v).sum();
            tss += valid.targets().mapv(|v| (v - yt_mean) * (v - yt_mean)).sum();
        }
        if tss == F::zero() {
            return Err(GpError::ConfigError(
                "Q2 is undefined for constant training outputs".to_string(),
            ));
        }
        Ok(F::one() - press / tss)
    }

    /// Q2 predictive coefficient with Leave-One-Out Cross-Validation
    fn looq2_score(&self) -> Result<F> {
        self.q2_score(self.training_data().0.nrows())
    }
}

impl<F: Float> PredictScore<F> for GaussianProcess<F> {
    fn training_data(&self) -> &(Array2<F>, Array1<F>) {
        &self.training_data
    }

    fn params(&self) -> GpParams<F> {
        GpParams::from(self.params.clone())
    }
}
