//! Session configuration: which example is regressed and how, with defaults and valid ranges.
use crate::catalog::{ExampleFunction, SamplingKind};
use crate::errors::{GpvizError, Result};
use gpviz_gp::{GpSamplingMethod, PriorMean};
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;
use std::path::Path;

/// Default number of points of the prediction grid
pub const DEFAULT_RESOLUTION: usize = 200;
/// Default number of intervals of the grid where posterior draws are evaluated
pub const DEFAULT_FN_SAMPLE_RESOLUTION: usize = 100;
/// Default number of training samples
pub const DEFAULT_NUM_SAMPLES: usize = 8;
/// Default number of posterior draws
pub const DEFAULT_NUM_FN_SAMPLES: usize = 20;
/// Default number of standard prior draws
pub const DEFAULT_NUM_STD_GP_SAMPLES: usize = 2;
/// Default standard deviation of the noise added to training outputs
pub const DEFAULT_Y_NOISE: f64 = 0.1;
/// Default random seed
pub const DEFAULT_SEED: u64 = 42;

const NUM_SAMPLES_RANGE: RangeInclusive<usize> = 1..=50;
const NUM_DRAWS_RANGE: RangeInclusive<usize> = 1..=50;
const NOISE_RANGE: RangeInclusive<f64> = 0.0..=5.0;
const SCALE_MAX: f64 = 5.0;

/// Observation noise `s` assumed by the model
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub enum NoiseSpec {
    /// Same as the noise actually added to the training outputs
    #[default]
    MatchSampleNoise,
    /// Given standard deviation
    Fixed(f64),
}

impl NoiseSpec {
    /// Noise standard deviation given the one used to generate training outputs
    pub fn resolve(&self, y_noise: f64) -> f64 {
        match self {
            NoiseSpec::MatchSampleNoise => y_noise,
            NoiseSpec::Fixed(s) => *s,
        }
    }
}

/// Regression session configuration
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Function to regress
    pub(crate) function: ExampleFunction,
    /// Number of training samples
    pub(crate) num_samples: usize,
    /// Placement of training inputs
    pub(crate) sampling: SamplingKind,
    /// Standard deviation of the noise added to training outputs
    pub(crate) y_noise: f64,
    /// Observation noise assumed by the model
    pub(crate) noise: NoiseSpec,
    /// Prior mean of the model
    pub(crate) prior_mean: PriorMean<f64>,
    /// Vertical scale `v` of the kernel
    pub(crate) vertical_scale: f64,
    /// Length scale `l` of the kernel
    pub(crate) length_scale: f64,
    /// Number of points of the prediction grid
    pub(crate) resolution: usize,
    /// Number of posterior draws
    pub(crate) num_fn_samples: usize,
    /// Number of intervals of the grid where posterior draws are evaluated
    pub(crate) fn_sample_resolution: usize,
    /// Number of standard prior draws
    pub(crate) num_std_gp_samples: usize,
    /// Factorization used to draw trajectories
    pub(crate) sampling_method: GpSamplingMethod,
    /// Random seed
    pub(crate) seed: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        SessionConfig {
            function: ExampleFunction::default(),
            num_samples: DEFAULT_NUM_SAMPLES,
            sampling: SamplingKind::default(),
            y_noise: DEFAULT_Y_NOISE,
            noise: NoiseSpec::default(),
            prior_mean: PriorMean::DataMean,
            vertical_scale: 1.,
            length_scale: 1.,
            resolution: DEFAULT_RESOLUTION,
            num_fn_samples: DEFAULT_NUM_FN_SAMPLES,
            fn_sample_resolution: DEFAULT_FN_SAMPLE_RESOLUTION,
            num_std_gp_samples: DEFAULT_NUM_STD_GP_SAMPLES,
            sampling_method: GpSamplingMethod::default(),
            seed: DEFAULT_SEED,
        }
    }
}

impl SessionConfig {
    /// Load a configuration from a JSON file, missing fields taking default values
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: SessionConfig = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Sets the function to regress
    pub fn function(mut self, function: ExampleFunction) -> Self {
        self.function = function;
        self
    }

    /// Sets the number of training samples
    pub fn num_samples(mut self, num_samples: usize) -> Self {
        self.num_samples = num_samples;
        self
    }

    /// Sets the placement of training inputs
    pub fn sampling(mut self, sampling: SamplingKind) -> Self {
        self.sampling = sampling;
        self
    }

    /// Sets the noise added to training outputs
    pub fn y_noise(mut self, y_noise: f64) -> Self {
        self.y_noise = y_noise;
        self
    }

    /// Sets the observation noise assumed by the model
    pub fn noise(mut self, noise: NoiseSpec) -> Self {
        self.noise = noise;
        self
    }

    /// Sets the prior mean
    pub fn prior_mean(mut self, prior_mean: PriorMean<f64>) -> Self {
        self.prior_mean = prior_mean;
        self
    }

    /// Sets the kernel vertical scale `v`
    pub fn vertical_scale(mut self, vertical_scale: f64) -> Self {
        self.vertical_scale = vertical_scale;
        self
    }

    /// Sets the kernel length scale `l`
    pub fn length_scale(mut self, length_scale: f64) -> Self {
        self.length_scale = length_scale;
        self
    }

    /// Sets the number of points of the prediction grid
    pub fn resolution(mut self, resolution: usize) -> Self {
        self.resolution = resolution;
        self
    }

    /// Sets the number of posterior draws
    pub fn num_fn_samples(mut self, num_fn_samples: usize) -> Self {
        self.num_fn_samples = num_fn_samples;
        self
    }

    /// Sets the number of intervals of the posterior draws grid
    pub fn fn_sample_resolution(mut self, fn_sample_resolution: usize) -> Self {
        self.fn_sample_resolution = fn_sample_resolution;
        self
    }

    /// Sets the number of standard prior draws
    pub fn num_std_gp_samples(mut self, num_std_gp_samples: usize) -> Self {
        self.num_std_gp_samples = num_std_gp_samples;
        self
    }

    /// Sets the factorization used to draw trajectories
    pub fn sampling_method(mut self, sampling_method: GpSamplingMethod) -> Self {
        self.sampling_method = sampling_method;
        self
    }

    /// Sets the random seed
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Function to regress
    pub fn get_function(&self) -> ExampleFunction {
        self.function
    }

    /// Observation noise standard deviation `s` used by the model
    pub fn model_noise(&self) -> f64 {
        self.noise.resolve(self.y_noise)
    }

    /// Check every field lies in its valid range
    pub fn check(self) -> Result<Self> {
        if !NUM_SAMPLES_RANGE.contains(&self.num_samples) {
            return Err(out_of_range("num_samples", self.num_samples, &NUM_SAMPLES_RANGE));
        }
        if !NOISE_RANGE.contains(&self.y_noise) {
            return Err(out_of_range("y_noise", self.y_noise, &NOISE_RANGE));
        }
        if let NoiseSpec::Fixed(s) = self.noise {
            if !NOISE_RANGE.contains(&s) {
                return Err(out_of_range("noise", s, &NOISE_RANGE));
            }
        }
        if let PriorMean::Fixed(m) = self.prior_mean {
            if !m.is_finite() {
                return Err(GpvizError::InvalidConfigError(format!(
                    "prior_mean should be finite, got {m}"
                )));
            }
        }
        for (name, value) in [
            ("vertical_scale", self.vertical_scale),
            ("length_scale", self.length_scale),
        ] {
            if !(value > 0. && value <= SCALE_MAX) {
                return Err(GpvizError::InvalidConfigError(format!(
                    "{name} should be in ]0, {SCALE_MAX}], got {value}"
                )));
            }
        }
        if self.resolution < 2 || self.fn_sample_resolution < 1 {
            return Err(GpvizError::InvalidConfigError(format!(
                "resolution should be >= 2 and fn_sample_resolution >= 1, got {} and {}",
                self.resolution, self.fn_sample_resolution
            )));
        }
        if !NUM_DRAWS_RANGE.contains(&self.num_fn_samples) {
            return Err(out_of_range(
                "num_fn_samples",
                self.num_fn_samples,
                &NUM_DRAWS_RANGE,
            ));
        }
        if !NUM_DRAWS_RANGE.contains(&self.num_std_gp_samples) {
            return Err(out_of_range(
                "num_std_gp_samples",
                self.num_std_gp_samples,
                &NUM_DRAWS_RANGE,
            ));
        }
        Ok(self)
    }
}

fn out_of_range<T: std::fmt::Display>(
    name: &str,
    value: T,
    range: &RangeInclusive<T>,
) -> GpvizError {
    GpvizError::InvalidConfigError(format!(
        "{name} should be in [{}, {}], got {value}",
        range.start(),
        range.end()
    ))
}
