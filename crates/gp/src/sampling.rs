//! Multivariate normal sampling used to draw function trajectories
//! from a GP prior or posterior.
//!
//! Draws are returned as a `(q, n_draws)` matrix: each column is one independent
//! trajectory evaluated at the `q` locations, ready to be plotted as a sample path.
use crate::errors::{GpError, Result};
use crate::kernels::Kernel;
use crate::linalg::{self, scaled_identity};
use crate::utils::linspace_column;

use linfa::Float;
use linfa_linalg::eigh::*;
use log::{debug, warn};
use ndarray::{Array, Array1, Array2, ArrayBase, Axis, Data, Ix1, Ix2};
use ndarray_stats::QuantileExt;
use ndarray_rand::rand::Rng;
use ndarray_rand::rand_distr::Uniform;
use ndarray_rand::RandomExt;
#[cfg(feature = "serializable")]
use serde::{Deserialize, Serialize};
use statrs::distribution::{ContinuousCDF, Normal};

/// Default jitter first added to the covariance diagonal when the factorization fails
pub const MVN_DEFAULT_INITIAL_JITTER: f64 = 1e-10;
/// Default number of jitter doublings before giving up
pub const MVN_DEFAULT_MAX_RETRIES: usize = 20;
/// Relative magnitude of the most negative eigenvalue still accepted as rounding error
/// once jitter retries are exhausted
pub const MVN_EIGEN_FALLBACK_TOLERANCE: f64 = 1e-6;

/// Eigenvalues below this threshold are considered null by [`GpSamplingMethod::EigenValues`]
const EIGENVALUE_CUTOFF: f64 = 1e-9;

/// Factorization used to compute `L` such that `L.Lᵗ ≈ cov`
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serializable", derive(Serialize, Deserialize))]
pub enum GpSamplingMethod {
    /// Lower triangular Cholesky factor, with doubling jitter on failure
    #[default]
    Cholesky,
    /// Spectral factor `W.sqrt(Λ)` where negative or tiny eigenvalues are truncated to zero.
    /// More robust than Cholesky on dense, ill-conditioned locations.
    EigenValues,
}

/// Sampler of `Normal(mean, cov)` distributions.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serializable", derive(Serialize, Deserialize))]
pub struct MvnSampler<F: Float> {
    method: GpSamplingMethod,
    initial_jitter: F,
    max_retries: usize,
    variance_scale: Option<F>,
}

impl<F: Float> Default for MvnSampler<F> {
    fn default() -> Self {
        MvnSampler {
            method: GpSamplingMethod::default(),
            initial_jitter: F::cast(MVN_DEFAULT_INITIAL_JITTER),
            max_retries: MVN_DEFAULT_MAX_RETRIES,
            variance_scale: None,
        }
    }
}

impl<F: Float> MvnSampler<F> {
    /// Sampler using the given factorization method and default jitter strategy
    pub fn new(method: GpSamplingMethod) -> Self {
        MvnSampler {
            method,
            ..Default::default()
        }
    }

    /// Set the factorization method
    pub fn method(mut self, method: GpSamplingMethod) -> Self {
        self.method = method;
        self
    }

    /// Set the first jitter value tried when Cholesky factorization fails.
    /// The jitter is relative to the covariance magnitude, the largest of the diagonal
    /// entries and the variance scale.
    pub fn initial_jitter(mut self, initial_jitter: F) -> Self {
        self.initial_jitter = initial_jitter;
        self
    }

    /// Set the number of jitter doublings tried before reporting a singular matrix
    pub fn max_retries(mut self, max_retries: usize) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Set the prior variance the sampled covariances derive from.
    ///
    /// Posterior covariances are computed by cancellation of terms of that order so their
    /// rounding errors do not shrink with their diagonal.
    pub fn variance_scale(mut self, variance_scale: F) -> Self {
        self.variance_scale = Some(variance_scale);
        self
    }

    /// Factorization method in use
    pub fn sampling_method(&self) -> GpSamplingMethod {
        self.method
    }

    fn magnitude(&self, cov: &ArrayBase<impl Data<Elem = F>, Ix2>) -> F {
        let diag_max = cov
            .diag()
            .iter()
            .fold(F::zero(), |acc, &d| if d.abs() > acc { d.abs() } else { acc });
        let magnitude = match self.variance_scale {
            Some(scale) if scale > diag_max => scale,
            _ => diag_max,
        };
        if magnitude > F::zero() {
            magnitude
        } else {
            F::one()
        }
    }

    /// Compute a factor `L` such that `L.Lᵗ ≈ cov`
    pub fn factorize(&self, cov: &ArrayBase<impl Data<Elem = F>, Ix2>) -> Result<Array2<F>> {
        if cov.nrows() != cov.ncols() {
            return Err(GpError::mismatch(
                "factorize",
                &[cov.nrows(), cov.nrows()],
                cov.shape(),
            ));
        }
        match self.method {
            GpSamplingMethod::Cholesky => self.cholesky_with_jitter(cov),
            GpSamplingMethod::EigenValues => eigen_factor(cov),
        }
    }

    fn cholesky_with_jitter(&self, cov: &ArrayBase<impl Data<Elem = F>, Ix2>) -> Result<Array2<F>> {
        if let Ok(l) = linalg::cholesky(cov) {
            return Ok(l);
        }
        let n = cov.nrows();
        let magnitude = self.magnitude(cov);
        let mut jitter = self.initial_jitter * magnitude;
        for attempt in 1..=self.max_retries {
            let regularized = cov + &scaled_identity(n, jitter);
            if let Ok(l) = linalg::cholesky(&regularized) {
                debug!("Cholesky factorization succeeded with jitter {jitter} (attempt {attempt})");
                return Ok(l);
            }
            jitter = jitter * F::cast(2.);
        }

        // semi definite up to rounding: negative eigenvalues are tiny wrt the magnitude
        let (v, w) = cov.to_owned().eigh_into()?;
        let min_eig = *v
            .min()
            .map_err(|err| GpError::SingularMatrix(format!("undefined eigenvalue ({err})")))?;
        if min_eig < -F::cast(MVN_EIGEN_FALLBACK_TOLERANCE) * magnitude {
            warn!(
                "Cholesky factorization failed after {} jitter retries (last jitter {}), min eigenvalue {}",
                self.max_retries, jitter, min_eig
            );
            return Err(GpError::SingularMatrix(format!(
                "covariance is not positive semi definite (min eigenvalue {min_eig}) even with jitter {jitter}"
            )));
        }
        warn!(
            "Cholesky factorization failed after {} jitter retries, using eigen decomposition",
            self.max_retries
        );
        Ok(spectral_factor(v, w))
    }

    /// Draw `n_draws` samples from `Normal(mean, cov)` as a `(q, n_draws)` matrix
    pub fn sample<R: Rng>(
        &self,
        mean: &ArrayBase<impl Data<Elem = F>, Ix1>,
        cov: &ArrayBase<impl Data<Elem = F>, Ix2>,
        n_draws: usize,
        rng: &mut R,
    ) -> Result<Array2<F>> {
        if n_draws == 0 {
            return Err(GpError::InvalidValueError(
                "Number of draws should be strictly positive".to_string(),
            ));
        }
        if mean.len() != cov.nrows() {
            return Err(GpError::mismatch(
                "sample",
                &[mean.len(), mean.len()],
                cov.shape(),
            ));
        }
        if mean.is_empty() {
            return Ok(Array2::zeros((0, n_draws)));
        }
        let c = self.factorize(cov)?;
        let z = standard_normal((mean.len(), n_draws), rng)?;
        Ok(c.dot(&z) + &mean.view().insert_axis(Axis(1)))
    }

    /// Draw `n_draws` samples from `Normal(0, cov)` as a `(q, n_draws)` matrix
    pub fn sample_zero_mean<R: Rng>(
        &self,
        cov: &ArrayBase<impl Data<Elem = F>, Ix2>,
        n_draws: usize,
        rng: &mut R,
    ) -> Result<Array2<F>> {
        self.sample(&Array1::zeros(cov.nrows()), cov, n_draws, rng)
    }
}

fn eigen_factor<F: Float>(cov: &ArrayBase<impl Data<Elem = F>, Ix2>) -> Result<Array2<F>> {
    let (v, w) = cov.to_owned().eigh_into()?;
    Ok(spectral_factor(v, w))
}

fn spectral_factor<F: Float>(v: Array1<F>, w: Array2<F>) -> Array2<F> {
    let v = v.mapv(|x| {
        // We lower bound the float value at 1e-9
        if x < F::cast(EIGENVALUE_CUTOFF) {
            return F::zero();
        }
        x.sqrt()
    });
    w.dot(&Array2::from_diag(&v))
}

/// Generate a matrix of independent standard normal variates as the probit
/// (inverse normal cdf) of uniform draws on (0, 1) taken from `rng`.
pub fn standard_normal<F: Float, R: Rng>(shape: (usize, usize), rng: &mut R) -> Result<Array2<F>> {
    let normal = Normal::new(0., 1.).map_err(|err| GpError::InvalidValueError(err.to_string()))?;
    let u = Array::random_using(shape, Uniform::new(f64::MIN_POSITIVE, 1.), rng);
    Ok(u.mapv(|p| F::cast(normal.inverse_cdf(p))))
}

/// Evenly spaced `(resolution + 1, 1)` grid spanning [-1, 1] with step `2 / resolution`
/// used to display prior draws.
pub fn standard_prior_grid<F: Float>(resolution: usize) -> Result<Array2<F>> {
    if resolution == 0 {
        return Err(GpError::InvalidValueError(
            "Grid resolution should be strictly positive".to_string(),
        ));
    }
    Ok(linspace_column(-F::one(), F::one(), resolution + 1))
}

/// Draw `n_draws` trajectories of the zero-mean GP prior `Normal(0, K(grid, grid))`
/// as a `(grid.nrows(), n_draws)` matrix.
pub fn sample_prior<F: Float, R: Rng>(
    kernel: &impl Kernel<F>,
    grid: &ArrayBase<impl Data<Elem = F>, Ix2>,
    n_draws: usize,
    sampler: &MvnSampler<F>,
    rng: &mut R,
) -> Result<Array2<F>> {
    let k = kernel.evaluate(grid, grid)?;
    debug!(
        "Sampling {} prior trajectories of {} on {} points",
        n_draws,
        kernel,
        grid.nrows()
    );
    sampler
        .clone()
        .variance_scale(kernel.prior_variance())
        .sample_zero_mean(&k, n_draws, rng)
}
