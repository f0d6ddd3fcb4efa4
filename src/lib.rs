//! Gaussian process surrogates of turbine design sweeps.
//!
//! A [GprModel] maps named input variables (flow coefficient, stage loading,
//! exit Mach number...) to one output column (loss, efficiency...) of a
//! [DataTable] produced by a design sweep. Once fitted with a [FitConfig],
//! the model provides:
//!
//! * predictions with confidence intervals ([GprModel::predict]),
//! * a grid search of the global maximum and minimum of the predicted output,
//!   optionally with some variables held constant ([GprModel::find_global_max_min_values]),
//! * 1D and 2D slices for plotting ([GprModel::predict_slice_1d], [GprModel::predict_slice_2d]),
//! * an assessment against held-out data ([GprModel::assess]),
//! * json or binary persistence ([GprModel::save], [GprModel::load]).
//!
//! Regression is carried out by the `aerogp-gp` engine: zero mean Gaussian
//! process on normalized data with a Matérn kernel whose smoothness, length scales
//! and noise magnitude are estimated by maximizing the marginal log likelihood.
//!
//! # Logging
//!
//! Fit steps are logged with the [`log`](https://docs.rs/log) crate, the level being
//! read from the `AEROGP_LOG` environment variable (default `info`).
#![warn(missing_docs)]
#![warn(rustdoc::broken_intra_doc_links)]
mod config;
mod errors;
mod model;
mod optimum;
mod prediction;
mod slices;
mod table;

pub use config::{FitConfig, LengthBounds, LimitsConfig};
pub use errors::{Result, SurrogateError};
pub use model::{AEROGP_LOG, GprModel};
pub use optimum::{Extremum, FixedSlices, OptimumReport};
pub use prediction::{
    ACTUAL_OUTPUT, Assessment, DEFAULT_CI_PERCENT, LOWER, PERCENT_ERROR, PREDICTED_OUTPUT,
    PredictionResult, UPPER, confidence_scalar,
};
pub use slices::{Constant, SliceConstants, SliceGrid};
pub use table::{DataTable, Limits};

pub use aerogp_gp::{GaussianProcess, GpFileFormat, Hyperparameters, Smoothness, SmoothnessTuning};
