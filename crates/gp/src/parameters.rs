use crate::errors::{GpError, Result};
use crate::kernels::check_scale;
use crate::linalg::InversionTolerance;
use linfa::{Float, ParamGuard};

#[cfg(feature = "serializable")]
use serde::{Deserialize, Serialize};

/// Default jitter added to the diagonal of the training kernel matrix
pub const GP_DEFAULT_JITTER: f64 = 1e-6;

/// Prior mean `m` of the process
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serializable", derive(Serialize, Deserialize))]
pub enum PriorMean<F: Float> {
    /// Use the empirical mean of the training targets
    #[default]
    DataMean,
    /// Use the given constant value
    Fixed(F),
}

impl<F: Float> PriorMean<F> {
    /// Constructor from an optional value, `None` meaning data mean
    pub fn from_option(value: Option<F>) -> Self {
        value.map_or(PriorMean::DataMean, PriorMean::Fixed)
    }
}

/// A set of validated GP parameters.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serializable", derive(Serialize, Deserialize))]
pub struct GpValidParams<F: Float> {
    /// Vertical scale `v` of the squared exponential kernel
    pub(crate) vertical_scale: F,
    /// Length scale `l` of the squared exponential kernel
    pub(crate) length_scale: F,
    /// Standard deviation `s` of the observation noise
    pub(crate) noise: F,
    /// Prior mean `m`
    pub(crate) prior_mean: PriorMean<F>,
    /// Parameter to improve numerical stability, added to `s²` on the diagonal
    pub(crate) jitter: F,
    /// Thresholds used when inverting the regularized kernel matrix
    pub(crate) tolerance: InversionTolerance<F>,
}

impl<F: Float> Default for GpValidParams<F> {
    fn default() -> GpValidParams<F> {
        GpValidParams {
            vertical_scale: F::one(),
            length_scale: F::one(),
            noise: F::zero(),
            prior_mean: PriorMean::default(),
            jitter: F::cast(GP_DEFAULT_JITTER),
            tolerance: InversionTolerance::default(),
        }
    }
}

impl<F: Float> GpValidParams<F> {
    /// Get vertical scale `v`
    pub fn vertical_scale(&self) -> F {
        self.vertical_scale
    }

    /// Get length scale `l`
    pub fn length_scale(&self) -> F {
        self.length_scale
    }

    /// Get observation noise standard deviation `s`
    pub fn noise(&self) -> F {
        self.noise
    }

    /// Get prior mean specification
    pub fn prior_mean(&self) -> PriorMean<F> {
        self.prior_mean
    }

    /// Get jitter
    pub fn jitter(&self) -> F {
        self.jitter
    }

    /// Get inversion tolerance
    pub fn tolerance(&self) -> &InversionTolerance<F> {
        &self.tolerance
    }
}

#[derive(Clone, Debug)]
/// The set of hyperparameters that can be specified for the execution of
/// the [GP algorithm](struct.GaussianProcess.html).
pub struct GpParams<F: Float>(GpValidParams<F>);

impl<F: Float> Default for GpParams<F> {
    fn default() -> Self {
        Self(GpValidParams::default())
    }
}

impl<F: Float> GpParams<F> {
    /// A constructor for GP parameters given kernel scales `v` and `l`
    pub fn new(vertical_scale: F, length_scale: F) -> GpParams<F> {
        Self(GpValidParams {
            vertical_scale,
            length_scale,
            ..Default::default()
        })
    }

    /// A constructor for GP parameters from validated parameters
    pub fn new_from_valid(params: &GpValidParams<F>) -> Self {
        Self(params.clone())
    }

    /// Set vertical scale `v`
    pub fn vertical_scale(mut self, vertical_scale: F) -> Self {
        self.0.vertical_scale = vertical_scale;
        self
    }

    /// Set length scale `l`
    pub fn length_scale(mut self, length_scale: F) -> Self {
        self.0.length_scale = length_scale;
        self
    }

    /// Set observation noise standard deviation `s`
    pub fn noise(mut self, noise: F) -> Self {
        self.0.noise = noise;
        self
    }

    /// Set prior mean
    pub fn prior_mean(mut self, prior_mean: PriorMean<F>) -> Self {
        self.0.prior_mean = prior_mean;
        self
    }

    /// Set jitter.
    ///
    /// Jitter is used to improve numerical stability
    pub fn jitter(mut self, jitter: F) -> Self {
        self.0.jitter = jitter;
        self
    }

    /// Set thresholds used to declare the kernel matrix singular
    pub fn tolerance(mut self, tolerance: InversionTolerance<F>) -> Self {
        self.0.tolerance = tolerance;
        self
    }
}

impl<F: Float> From<GpValidParams<F>> for GpParams<F> {
    fn from(valid: GpValidParams<F>) -> Self {
        GpParams(valid)
    }
}

fn check_non_negative<F: Float>(name: &'static str, value: F) -> Result<()> {
    if !(value >= F::zero()) || !value.is_finite() {
        return Err(GpError::InvalidHyperparameter {
            name,
            value: value.to_f64().unwrap_or(f64::NAN),
        });
    }
    Ok(())
}

impl<F: Float> ParamGuard for GpParams<F> {
    type Checked = GpValidParams<F>;
    type Error = GpError;

    fn check_ref(&self) -> Result<&Self::Checked> {
        check_scale("v", self.0.vertical_scale)?;
        check_scale("l", self.0.length_scale)?;
        check_non_negative("s", self.0.noise)?;
        check_non_negative("jitter", self.0.jitter)?;
        if let PriorMean::Fixed(m) = self.0.prior_mean {
            if !m.is_finite() {
                return Err(GpError::InvalidHyperparameter {
                    name: "m",
                    value: m.to_f64().unwrap_or(f64::NAN),
                });
            }
        }
        let tol = &self.0.tolerance;
        if !(tol.min_pivot >= F::zero()) || !(tol.max_condition > F::one()) {
            return Err(GpError::InvalidValueError(format!(
                "Inversion tolerance should verify min_pivot >= 0 and max_condition > 1, got {:?}",
                tol
            )));
        }
        Ok(&self.0)
    }

    fn check(self) -> Result<Self::Checked> {
        self.check_ref()?;
        Ok(self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_params() {
        let params = GpParams::<f64>::default().check().unwrap();
        assert_eq!(params.vertical_scale(), 1.);
        assert_eq!(params.length_scale(), 1.);
        assert_eq!(params.noise(), 0.);
        assert_eq!(params.jitter(), GP_DEFAULT_JITTER);
        assert_eq!(params.prior_mean(), PriorMean::DataMean);
    }

    #[test]
    fn test_invalid_params() {
        assert!(matches!(
            GpParams::new(-1., 1.).check(),
            Err(GpError::InvalidHyperparameter { name: "v", .. })
        ));
        assert!(matches!(
            GpParams::new(1., 0.).check(),
            Err(GpError::InvalidHyperparameter { name: "l", .. })
        ));
        assert!(matches!(
            GpParams::new(1., 1.).noise(-0.1).check(),
            Err(GpError::InvalidHyperparameter { name: "s", .. })
        ));
        assert!(matches!(
            GpParams::new(1., 1.)
                .prior_mean(PriorMean::Fixed(f64::INFINITY))
                .check(),
            Err(GpError::InvalidHyperparameter { name: "m", .. })
        ));
        assert!(GpParams::new(1., 1.)
            .tolerance(InversionTolerance {
                min_pivot: 0.,
                max_condition: 0.5
            })
            .check()
            .is_err());
    }

    #[test]
    fn test_prior_mean_from_option() {
        assert_eq!(PriorMean::<f64>::from_option(None), PriorMean::DataMean);
        assert_eq!(PriorMean::from_option(Some(2.)), PriorMean::Fixed(2.));
    }
}
