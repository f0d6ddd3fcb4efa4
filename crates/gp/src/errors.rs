use thiserror::Error;

/// A result type for GP regression algorithm
pub type Result<T> = std::result::Result<T, GpError>;

/// An error when using [`GaussianProcess`](crate::GaussianProcess) algorithm
#[derive(Error, Debug)]
pub enum GpError {
    /// When parameters are invalid (bounds, initial values, dimensions...)
    #[error("Config error: {0}")]
    ConfigError(String),
    /// When training fails: not enough data or no hyperparameter optimization succeeded
    #[error("Fit error: {0}")]
    FitError(String),
    /// When covariance factorization fails or predictions are not finite
    #[error("Numerical instability: {0}")]
    NumericalInstabilityError(String),
    /// When linear algebra computation fails
    #[error(transparent)]
    LinalgError(#[from] linfa_linalg::LinalgError),
    /// When a linfa error occurs
    #[error(transparent)]
    LinfaError(#[from] linfa::error::Error),
    /// When error during saving
    #[cfg(feature = "persistent")]
    #[error("Save error: {0}")]
    SaveJsonError(#[from] serde_json::Error),
    /// When error during binary saving or loading
    #[cfg(feature = "persistent")]
    #[error("Binary format error: {0}")]
    SaveBinaryError(#[from] bincode::Error),
    /// When error during loading
    #[error("Load IO error")]
    LoadIoError(#[from] std::io::Error),
    /// When error during loading
    #[error("Load error: {0}")]
    LoadError(String),
}
