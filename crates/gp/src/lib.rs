//! This library implements [Gaussian Process](https://en.wikipedia.org/wiki/Gaussian_process) regression
//! with a squared exponential kernel and given hyperparameters, together with
//! multivariate normal sampling to draw function trajectories from the GP prior or posterior.
//!
//! GP regression is implemented by [GaussianProcess] parameterized by [GpParams]:
//! fitting conditions the prior on a training dataset once, then [GaussianProcess::predict]
//! returns the posterior mean, covariance and variance at any query points.
//!
//! Draws are produced by [MvnSampler] either from a fitted model
//! (see [GaussianProcess::sample]) or from the zero-mean prior (see [sample_prior]).
//!
//! Dense matrix primitives used by the algorithms are exposed in the [linalg] module.
#![warn(missing_docs)]
#![warn(rustdoc::broken_intra_doc_links)]
mod algorithm;
mod errors;
pub mod kernels;
pub mod linalg;
mod parameters;
mod sampling;
mod utils;

pub use algorithm::*;
pub use errors::*;
pub use kernels::{Kernel, SquaredExponentialKernel};
pub use parameters::*;
pub use sampling::*;
pub use utils::squared_pairwise_distance;
