//! Gaussian Process regression playground.
//!
//! A regression session draws noisy observations of an example function, conditions a GP prior
//! with squared exponential kernel on them and computes the curves to display:
//! posterior mean with 95% confidence band, trajectories drawn from the posterior and
//! trajectories drawn from the standard prior on `[-1, 1]`.
//!
//! The GP machinery lives in the `gpviz-gp` crate, training inputs are placed with
//! the designs of experiments of the `gpviz-doe` crate.
//!
//! # Example
//!
//! ```no_run
//! use gpviz::{ExampleFunction, SeriesKind, Session, SessionConfig};
//!
//! let config = SessionConfig::default()
//!     .function(ExampleFunction::Sigmoid)
//!     .num_samples(10)
//!     .length_scale(2.);
//! let report = Session::default().run(&config).expect("session run");
//! let mean = report.series(SeriesKind::Mean).next().expect("posterior mean");
//! println!("{:?}", mean.y);
//! ```
#![warn(missing_docs)]
#![warn(rustdoc::broken_intra_doc_links)]
pub mod catalog;
pub mod config;
pub mod engine;
mod errors;
pub mod report;
pub mod service;
pub mod session;

pub use catalog::{ExampleFunction, SamplingKind, TrainingSet};
pub use config::{NoiseSpec, SessionConfig};
pub use engine::{Engine, EngineConfig, Hyperparameters, RegressorHandle};
pub use errors::*;
pub use report::{Report, Series, SeriesKind};
pub use service::GpService;
pub use session::Session;

pub use gpviz_gp::{GpSamplingMethod, PriorMean};

/// Env variable to enable logging feature
pub const GPVIZ_LOG: &str = "GPVIZ_LOG";
