//! This library implements [Gaussian Process](https://en.wikipedia.org/wiki/Gaussian_process) regression
//! with a zero mean prior on normalized data and a Matérn covariance kernel.
//!
//! Kernel smoothness is either given or selected among the closed form Matérn
//! kernels (nu = 1/2, 3/2, 5/2 or infinity) by comparing optimized likelihoods.
//! Length scales and noise magnitude are estimated by maximizing the marginal
//! log likelihood with a COBYLA multistart optimization, restarts being spread
//! over the (log10) search space with a Latin Hypercube Sampling and run in parallel.
//!
//! GP methods are implemented by [GaussianProcess] parameterized by [GpParams].
//!
//! # Features
//!
//! ## serializable
//!
//! The `serializable` feature enables the serialization of GP models using the [`serde crate`](https://serde.rs/).
//!
//! ## persistent
//!
//! The `persistent` feature enables `save()` and `load()` methods for a GP model
//! in json or binary format.
#![warn(missing_docs)]
#![warn(rustdoc::broken_intra_doc_links)]
mod algorithm;
mod covariance;
mod errors;
pub mod kernels;
pub mod metrics;

mod parameters;
mod utils;

mod optimization;

pub use algorithm::*;
pub use errors::*;
pub use kernels::{MaternKernel, Smoothness};
pub use parameters::*;
pub use utils::DiffMatrix;
