//! Catalog of one-dimensional example functions and synthetic training sets.
use crate::errors::{GpvizError, Result};
use gpviz_doe::{Grid, Random, SamplingMethod};
use gpviz_gp::standard_normal;
use ndarray::{array, Array1, Array2};
use ndarray_rand::rand::SeedableRng;
use rand_xoshiro::Xoshiro256Plus;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::fmt;

/// Example functions to be approximated by GP regression
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum ExampleFunction {
    /// `sin(x)`
    #[default]
    Sin,
    /// `exp(cos(x)) sin(x)`
    ExpCosSin,
    /// Standard normal probability density function
    NormalPdf,
    /// Logistic sigmoid `1 / (1 + exp(-x))`
    Sigmoid,
    /// Identity sampled on a tiny interval, hidden from the default listing
    Point,
}

impl ExampleFunction {
    /// All examples, the hidden ones last
    pub const ALL: [ExampleFunction; 5] = [
        ExampleFunction::Sin,
        ExampleFunction::ExpCosSin,
        ExampleFunction::NormalPdf,
        ExampleFunction::Sigmoid,
        ExampleFunction::Point,
    ];

    /// Examples listed to the user
    pub fn visible() -> impl Iterator<Item = ExampleFunction> {
        Self::ALL.into_iter().filter(|f| !f.is_hidden())
    }

    /// Whether the example is hidden from the default listing
    pub fn is_hidden(&self) -> bool {
        matches!(self, ExampleFunction::Point)
    }

    /// Display name
    pub fn name(&self) -> &'static str {
        match self {
            ExampleFunction::Sin => "sin(x)",
            ExampleFunction::ExpCosSin => "exp(cos(x)) sin(x)",
            ExampleFunction::NormalPdf => "Normal distribution PDF",
            ExampleFunction::Sigmoid => "Sigmoid function",
            ExampleFunction::Point => "Point",
        }
    }

    fn key(&self) -> &'static str {
        match self {
            ExampleFunction::Sin => "sin",
            ExampleFunction::ExpCosSin => "exp-cos-sin",
            ExampleFunction::NormalPdf => "normal-pdf",
            ExampleFunction::Sigmoid => "sigmoid",
            ExampleFunction::Point => "point",
        }
    }

    /// Interval where training inputs are sampled
    pub fn x_range(&self) -> (f64, f64) {
        match self {
            ExampleFunction::Sin => (-PI, PI),
            ExampleFunction::ExpCosSin => (0., 10.),
            ExampleFunction::NormalPdf => (-5., 5.),
            ExampleFunction::Sigmoid => (-5., 5.),
            ExampleFunction::Point => (-0.05, 0.05),
        }
    }

    /// Interval where the posterior is displayed
    pub fn xt_range(&self) -> (f64, f64) {
        match self {
            ExampleFunction::Sin => (-4. * PI, 4. * PI),
            ExampleFunction::ExpCosSin => (-2., 12.),
            ExampleFunction::NormalPdf => (-5., 5.),
            ExampleFunction::Sigmoid => (-10., 10.),
            ExampleFunction::Point => (-4., 4.),
        }
    }

    /// Function value at `x`
    pub fn eval(&self, x: f64) -> f64 {
        match self {
            ExampleFunction::Sin => x.sin(),
            ExampleFunction::ExpCosSin => x.cos().exp() * x.sin(),
            ExampleFunction::NormalPdf => (-0.5 * x * x).exp() / (2. * PI).sqrt(),
            ExampleFunction::Sigmoid => 1. / (1. + (-x).exp()),
            ExampleFunction::Point => x,
        }
    }
}

impl fmt::Display for ExampleFunction {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.key())
    }
}

impl From<ExampleFunction> for String {
    fn from(item: ExampleFunction) -> String {
        item.key().to_string()
    }
}

impl TryFrom<String> for ExampleFunction {
    type Error = GpvizError;
    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

impl std::str::FromStr for ExampleFunction {
    type Err = GpvizError;

    /// Parse either the example key (`sin`, `sigmoid`, ...) or its index in the catalog
    fn from_str(s: &str) -> Result<Self> {
        if let Ok(index) = s.parse::<usize>() {
            return Self::ALL.get(index).copied().ok_or_else(|| {
                GpvizError::InvalidConfigError(format!(
                    "Example index {index} out of range [0, {}]",
                    Self::ALL.len() - 1
                ))
            });
        }
        Self::ALL
            .into_iter()
            .find(|f| f.key() == s)
            .ok_or_else(|| GpvizError::InvalidConfigError(format!("Unknown example function '{s}'")))
    }
}

/// How training inputs are placed within the sampling interval
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SamplingKind {
    /// Evenly spaced, bounds included
    #[default]
    Systematic,
    /// Uniformly drawn
    Random,
}

/// Noisy observations of an example function together with
/// the true function evaluated on a prediction grid
#[derive(Clone, Debug)]
pub struct TrainingSet {
    /// Training inputs (n, 1)
    pub x: Array2<f64>,
    /// Noisy training outputs (n,)
    pub y: Array1<f64>,
    /// Prediction grid (q, 1)
    pub xt: Array2<f64>,
    /// True function values on the prediction grid (q,)
    pub yt: Array1<f64>,
    /// Standard deviation of the noise added to the training outputs
    pub y_noise: f64,
}

impl TrainingSet {
    /// Build `num_samples` observations `f(x) + y_noise.N(0, 1)` of `function`
    /// and a grid of `resolution` points over its display interval.
    ///
    /// Random inputs and noise are drawn from independent streams of a generator seeded by `seed`.
    pub fn generate(
        function: ExampleFunction,
        num_samples: usize,
        sampling: SamplingKind,
        y_noise: f64,
        resolution: usize,
        seed: u64,
    ) -> Result<TrainingSet> {
        if num_samples == 0 || resolution == 0 {
            return Err(GpvizError::InvalidConfigError(format!(
                "Number of samples ({num_samples}) and resolution ({resolution}) should be positive"
            )));
        }
        let (xmin, xmax) = function.x_range();
        let (xtmin, xtmax) = function.xt_range();
        let xlimits = array![[xmin, xmax]];

        let mut rng = Xoshiro256Plus::seed_from_u64(seed);
        let x = match sampling {
            SamplingKind::Systematic => Grid::new(&xlimits).sample(num_samples),
            SamplingKind::Random => {
                let design = Random::from_stream(&xlimits, rng.clone());
                rng.jump();
                design.sample(num_samples)
            }
        };
        let noise = standard_normal::<f64, _>((num_samples, 1), &mut rng)?;
        let y = x.column(0).mapv(|v| function.eval(v)) + noise.column(0).mapv(|e| y_noise * e);

        let xt = Grid::new(&array![[xtmin, xtmax]]).sample(resolution);
        let yt = xt.column(0).mapv(|v| function.eval(v));

        Ok(TrainingSet {
            x,
            y,
            xt,
            yt,
            y_noise,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_catalog() {
        assert_eq!(ExampleFunction::visible().count(), 4);
        assert_abs_diff_eq!(ExampleFunction::Sin.eval(PI / 2.), 1.);
        assert_abs_diff_eq!(ExampleFunction::Sigmoid.eval(0.), 0.5);
        assert_abs_diff_eq!(
            ExampleFunction::NormalPdf.eval(0.),
            0.3989422804014327,
            epsilon = 1e-12
        );
        assert_abs_diff_eq!(ExampleFunction::ExpCosSin.eval(0.), 0.);
        assert_eq!(ExampleFunction::Point.eval(0.03), 0.03);
    }

    #[test]
    fn test_parse_example() {
        assert_eq!("sigmoid".parse::<ExampleFunction>().unwrap(), ExampleFunction::Sigmoid);
        assert_eq!("1".parse::<ExampleFunction>().unwrap(), ExampleFunction::ExpCosSin);
        assert!("7".parse::<ExampleFunction>().is_err());
        assert!("cos".parse::<ExampleFunction>().is_err());
        let json = serde_json::to_string(&ExampleFunction::NormalPdf).unwrap();
        assert_eq!(json, "\"normal-pdf\"");
        let back: ExampleFunction = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ExampleFunction::NormalPdf);
    }

    #[test]
    fn test_systematic_noiseless_set() {
        let set =
            TrainingSet::generate(ExampleFunction::Sin, 5, SamplingKind::Systematic, 0., 200, 42)
                .unwrap();
        assert_eq!(set.x.shape(), &[5, 1]);
        assert_eq!(set.xt.shape(), &[200, 1]);
        assert_abs_diff_eq!(set.x[[0, 0]], -PI, epsilon = 1e-12);
        assert_abs_diff_eq!(set.x[[2, 0]], 0., epsilon = 1e-12);
        assert_abs_diff_eq!(set.x[[4, 0]], PI, epsilon = 1e-12);
        assert_abs_diff_eq!(set.y, set.x.column(0).mapv(f64::sin), epsilon = 1e-12);
        assert_abs_diff_eq!(set.xt[[0, 0]], -4. * PI, epsilon = 1e-12);
        assert_abs_diff_eq!(set.xt[[199, 0]], 4. * PI, epsilon = 1e-12);
    }

    #[test]
    fn test_random_noisy_set() {
        let set =
            TrainingSet::generate(ExampleFunction::Sigmoid, 40, SamplingKind::Random, 0.1, 50, 7)
                .unwrap();
        assert!(set.x.iter().all(|&x| (-5. ..5.).contains(&x)));
        let residuals = &set.y - &set.x.column(0).mapv(|x| ExampleFunction::Sigmoid.eval(x));
        assert!(residuals.iter().any(|r| r.abs() > 1e-6));
        assert!(residuals.iter().all(|r| r.abs() < 0.6));

        let again =
            TrainingSet::generate(ExampleFunction::Sigmoid, 40, SamplingKind::Random, 0.1, 50, 7)
                .unwrap();
        assert_eq!(set.x, again.x);
        assert_eq!(set.y, again.y);
    }

    #[test]
    fn test_invalid_set() {
        assert!(
            TrainingSet::generate(ExampleFunction::Sin, 0, SamplingKind::Random, 0.1, 50, 7)
                .is_err()
        );
    }
}
