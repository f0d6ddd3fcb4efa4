use aerogp_gp::GpError;
use thiserror::Error;

/// A result type for surrogate errors
pub type Result<T> = std::result::Result<T, SurrogateError>;

/// An error when fitting or using a [`GprModel`](crate::GprModel)
#[derive(Error, Debug)]
pub enum SurrogateError {
    /// When configuration is invalid
    #[error("Invalid configuration: {0}")]
    ConfigError(String),
    /// When a declared column is absent from a table
    #[error("Missing column: {0}")]
    MissingColumnError(String),
    /// When training fails
    #[error("Fit error: {0}")]
    FitError(String),
    /// When a fitted model is required
    #[error("Model not fitted: call fit() or load() first")]
    NotFittedError,
    /// When covariance factorization fails or predictions are not finite
    #[error("Numerical instability: {0}")]
    NumericalInstabilityError(String),
    /// When error during json saving
    #[error("Save error: {0}")]
    SaveJsonError(#[from] serde_json::Error),
    /// When error during binary saving
    #[error("Save error: {0}")]
    SaveBinaryError(#[from] bincode::Error),
    /// When IO fails during saving or loading
    #[error("IO error")]
    LoadIoError(#[from] std::io::Error),
    /// When loaded content is not a valid model
    #[error("Load error: {0}")]
    LoadError(String),
}

impl From<GpError> for SurrogateError {
    fn from(err: GpError) -> Self {
        match err {
            GpError::ConfigError(msg) => SurrogateError::ConfigError(msg),
            GpError::FitError(msg) => SurrogateError::FitError(msg),
            GpError::NumericalInstabilityError(msg) => {
                SurrogateError::NumericalInstabilityError(msg)
            }
            GpError::LinalgError(e) => SurrogateError::NumericalInstabilityError(e.to_string()),
            GpError::LinfaError(e) => SurrogateError::ConfigError(e.to_string()),
            GpError::SaveJsonError(e) => SurrogateError::SaveJsonError(e),
            GpError::SaveBinaryError(e) => SurrogateError::SaveBinaryError(e),
            GpError::LoadIoError(e) => SurrogateError::LoadIoError(e),
            GpError::LoadError(msg) => SurrogateError::LoadError(msg),
        }
    }
}
