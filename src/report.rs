//! Plot-ready output of a regression session.
use crate::errors::Result;
use ndarray::{ArrayBase, Data, Ix1, Ix2};
use serde::{Deserialize, Serialize};
use std::io::Write;

/// Kind of a plotted series
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeriesKind {
    /// Noisy training observations
    Training,
    /// True function
    Function,
    /// Posterior mean
    Mean,
    /// Lower bound of the confidence band
    LowerBound,
    /// Upper bound of the confidence band
    UpperBound,
    /// Trajectory drawn from the posterior
    PosteriorDraw,
    /// Trajectory drawn from the standard prior
    PriorDraw,
}

/// A named curve `y = f(x)`
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Series {
    /// Legend label
    pub name: String,
    /// Kind of curve
    pub kind: SeriesKind,
    /// Abscissae
    pub x: Vec<f64>,
    /// Ordinates
    pub y: Vec<f64>,
}

impl Series {
    /// Series from abscissae and ordinates of the same length
    pub fn new(
        name: impl Into<String>,
        kind: SeriesKind,
        x: &ArrayBase<impl Data<Elem = f64>, Ix1>,
        y: &ArrayBase<impl Data<Elem = f64>, Ix1>,
    ) -> Series {
        Series {
            name: name.into(),
            kind,
            x: x.to_vec(),
            y: y.to_vec(),
        }
    }

    /// One series per column of `draws` (q, n_draws) against `x` (q,)
    pub fn from_draws(
        prefix: &str,
        kind: SeriesKind,
        x: &ArrayBase<impl Data<Elem = f64>, Ix1>,
        draws: &ArrayBase<impl Data<Elem = f64>, Ix2>,
    ) -> Vec<Series> {
        draws
            .columns()
            .into_iter()
            .enumerate()
            .map(|(i, col)| Series::new(format!("{prefix} {}", i + 1), kind, x, &col))
            .collect()
    }
}

/// Summary of the fitted model
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ModelSummary {
    /// Example function name
    pub function: String,
    /// Vertical scale `v`
    pub vertical_scale: f64,
    /// Length scale `l`
    pub length_scale: f64,
    /// Observation noise `s`
    pub noise: f64,
    /// Prior mean value actually used
    pub prior_mean: f64,
    /// Number of training points
    pub n_train: usize,
}

/// Curves computed by a session
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Report {
    /// Fitted model
    pub model: ModelSummary,
    /// Curves to display with the posterior
    pub posterior: Vec<Series>,
    /// Curves of the standard prior panel
    pub prior: Vec<Series>,
}

impl Report {
    /// Series of the given kind
    pub fn series(&self, kind: SeriesKind) -> impl Iterator<Item = &Series> {
        self.posterior
            .iter()
            .chain(self.prior.iter())
            .filter(move |s| s.kind == kind)
    }

    /// Write the report as JSON
    pub fn write_json<W: Write>(&self, writer: W, pretty: bool) -> Result<()> {
        if pretty {
            serde_json::to_writer_pretty(writer, self)?;
        } else {
            serde_json::to_writer(writer, self)?;
        }
        Ok(())
    }
}
