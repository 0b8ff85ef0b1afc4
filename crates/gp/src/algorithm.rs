use crate::errors::{GpError, Result};
use crate::kernels::{Kernel, SquaredExponentialKernel};
use crate::linalg::{self, as_column, diagonal, scaled_identity, symmetrize};
use crate::parameters::{GpParams, GpValidParams, PriorMean};
use crate::sampling::{GpSamplingMethod, MvnSampler};
use crate::utils::mean;

use linfa::prelude::{DatasetBase, Fit, Float};
use ndarray::{Array1, Array2, ArrayBase, Axis, Data, Ix1, Ix2};
use ndarray_rand::rand::Rng;

use log::{debug, warn};
#[cfg(feature = "serializable")]
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Instant;

/// Negative posterior variances smaller than `-GP_NEGATIVE_VARIANCE_WARN * v²` are reported
/// as a numerical stability issue before being clamped to zero
pub const GP_NEGATIVE_VARIANCE_WARN: f64 = 1e-6;

/// Quantile of the standard normal distribution used for 95% confidence bands
pub const GP_CONFIDENCE_95: f64 = 1.96;

/// Gaussian Process regression posterior at `q` query points
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serializable", derive(Serialize, Deserialize))]
pub struct GpPosterior<F: Float> {
    /// Posterior mean (q,)
    pub mean: Array1<F>,
    /// Posterior covariance (q, q), symmetric
    pub covariance: Array2<F>,
    /// Posterior marginal variance (q,), equal to the covariance diagonal
    pub variance: Array1<F>,
}

impl<F: Float> GpPosterior<F> {
    /// Number of query points
    pub fn len(&self) -> usize {
        self.mean.len()
    }

    /// Whether the posterior is evaluated at no point
    pub fn is_empty(&self) -> bool {
        self.mean.is_empty()
    }

    /// Posterior standard deviation (q,)
    pub fn std_dev(&self) -> Array1<F> {
        self.variance.mapv(|v| v.sqrt())
    }

    /// Lower and upper bounds `mean ∓ z.std_dev`
    pub fn confidence_interval(&self, z: F) -> (Array1<F>, Array1<F>) {
        let half_width = self.std_dev().mapv(|s| z * s);
        (&self.mean - &half_width, &self.mean + &half_width)
    }
}

/// Gaussian Process regression model with squared exponential kernel
/// conditioned on a training dataset `(X, y)`.
///
/// Hyperparameters are given, not estimated: vertical scale `v`, length scale `l`,
/// observation noise `s` and prior mean `m`. Fitting computes once the inverse of
/// the regularized kernel matrix `K(X, X) + (s² + jitter).I` and the weights
/// `alpha = Kinv.(y - m)` reused by every prediction.
///
/// The model is immutable once fitted: changing a hyperparameter requires a new fit.
/// Prediction only reads the model, hence concurrent predictions on a shared model are safe.
///
/// # Example
///
/// ```no_run
/// use gpviz_gp::{GaussianProcess, PriorMean};
/// use linfa::prelude::*;
/// use ndarray::{Array, Axis};
///
/// let xt = Array::linspace(-3., 3., 7).insert_axis(Axis(1));
/// let yt = xt.column(0).mapv(f64::sin);
///
/// let gp = GaussianProcess::<f64>::params(1., 1.)
///     .noise(0.)
///     .prior_mean(PriorMean::Fixed(0.))
///     .fit(&Dataset::new(xt, yt))
///     .expect("GP fitted");
///
/// let x = Array::linspace(-5., 5., 101).insert_axis(Axis(1));
/// let posterior = gp.predict(&x).expect("GP prediction");
/// let (lower, upper) = posterior.confidence_interval(1.96);
/// ```
#[derive(Clone, Debug)]
#[cfg_attr(
    feature = "serializable",
    derive(Serialize, Deserialize),
    serde(bound(serialize = "F: Serialize", deserialize = "F: Deserialize<'de>"))
)]
pub struct GaussianProcess<F: Float> {
    /// Covariance function
    kernel: SquaredExponentialKernel<F>,
    /// Prior mean value actually used (explicit or derived from training outputs)
    mean: F,
    /// Inverse of the regularized training kernel matrix (n, n)
    k_inv: Array2<F>,
    /// Weights Kinv.(y - m) (n,)
    alpha: Array1<F>,
    /// Training dataset (input, output)
    pub(crate) training_data: (Array2<F>, Array1<F>),
    /// Parameters used to fit this model
    pub(crate) params: GpValidParams<F>,
}

impl<F: Float> fmt::Display for GaussianProcess<F> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "GP(kernel={}, noise={}, mean={}, n_train={})",
            self.kernel,
            self.params.noise,
            self.mean,
            self.training_data.0.nrows()
        )
    }
}

impl<F: Float> GaussianProcess<F> {
    /// Gp parameters contructor given kernel scales `v` and `l`
    pub fn params(vertical_scale: F, length_scale: F) -> GpParams<F> {
        GpParams::new(vertical_scale, length_scale)
    }

    fn check_query(&self, x: &ArrayBase<impl Data<Elem = F>, Ix2>) -> Result<()> {
        let nx = self.training_data.0.ncols();
        if x.ncols() != nx {
            return Err(GpError::mismatch(
                "predict",
                &[x.nrows(), nx],
                &[x.nrows(), x.ncols()],
            ));
        }
        Ok(())
    }

    /// Predict the posterior distribution at `q` points given as a (q, nx) matrix:
    /// mean (q,), covariance (q, q) and variance (q,).
    ///
    /// Negative variances due to round-off errors are clamped to zero,
    /// so that `variance[i] == covariance[[i, i]] >= 0`.
    pub fn predict(&self, x: &ArrayBase<impl Data<Elem = F>, Ix2>) -> Result<GpPosterior<F>> {
        self.check_query(x)?;
        let now = Instant::now();
        // Cross kernel (n, q)
        let k_cross = self.kernel.evaluate(&self.training_data.0, x)?;
        // Query kernel (q, q)
        let k_query = self.kernel.evaluate(x, x)?;

        let k_cross_t = linalg::transpose(&k_cross);
        let mean = linalg::multiply(&k_cross_t, &as_column(&self.alpha))?
            .remove_axis(Axis(1))
            .mapv(|v| v + self.mean);

        let reduction = linalg::multiply(&k_cross_t, &linalg::multiply(&self.k_inv, &k_cross)?)?;
        let mut covariance = symmetrize(&linalg::subtract(&k_query, &reduction)?)?;
        self.clamp_variances(covariance.diag_mut());
        let variance = diagonal(&covariance)?;

        debug!(
            "GP posterior computed at {} points in {:?}",
            x.nrows(),
            now.elapsed()
        );
        Ok(GpPosterior {
            mean,
            covariance,
            variance,
        })
    }

    /// Predict posterior mean values at `q` points given as a (q, nx) matrix.
    pub fn predict_mean(&self, x: &ArrayBase<impl Data<Elem = F>, Ix2>) -> Result<Array1<F>> {
        self.check_query(x)?;
        let k_cross = self.kernel.evaluate(&self.training_data.0, x)?;
        Ok(k_cross.t().dot(&self.alpha).mapv(|v| v + self.mean))
    }

    /// Predict posterior marginal variances at `q` points given as a (q, nx) matrix
    /// without computing the whole (q, q) covariance matrix.
    pub fn predict_var(&self, x: &ArrayBase<impl Data<Elem = F>, Ix2>) -> Result<Array1<F>> {
        self.check_query(x)?;
        let k_cross = self.kernel.evaluate(&self.training_data.0, x)?;
        let kinv_kc = self.k_inv.dot(&k_cross);
        let reduction = (&k_cross * &kinv_kc).sum_axis(Axis(0));
        let mut variance = self.kernel.diag(x) - reduction;
        self.clamp_variances(variance.view_mut());
        Ok(variance)
    }

    fn clamp_variances(&self, mut variances: ndarray::ArrayViewMut1<F>) {
        let threshold = -F::cast(GP_NEGATIVE_VARIANCE_WARN) * self.kernel.prior_variance();
        variances.iter_mut().for_each(|v| {
            if *v < F::zero() {
                if *v < threshold {
                    warn!("Negative posterior variance {} clamped to zero", *v);
                }
                *v = F::zero();
            }
        });
    }

    /// Sample the gaussian process posterior for `n_traj` trajectories at `q` points
    /// using cholesky decomposition. Returns a (q, n_traj) matrix.
    pub fn sample_chol<R: Rng>(
        &self,
        x: &ArrayBase<impl Data<Elem = F>, Ix2>,
        n_traj: usize,
        rng: &mut R,
    ) -> Result<Array2<F>> {
        self.sample_with(x, n_traj, &MvnSampler::new(GpSamplingMethod::Cholesky), rng)
    }

    /// Sample the gaussian process posterior for `n_traj` trajectories at `q` points
    /// using eigenvalues decomposition. Returns a (q, n_traj) matrix.
    pub fn sample_eig<R: Rng>(
        &self,
        x: &ArrayBase<impl Data<Elem = F>, Ix2>,
        n_traj: usize,
        rng: &mut R,
    ) -> Result<Array2<F>> {
        self.sample_with(x, n_traj, &MvnSampler::new(GpSamplingMethod::EigenValues), rng)
    }

    /// Sample the gaussian process posterior for `n_traj` trajectories (alias of `sample_chol`)
    pub fn sample<R: Rng>(
        &self,
        x: &ArrayBase<impl Data<Elem = F>, Ix2>,
        n_traj: usize,
        rng: &mut R,
    ) -> Result<Array2<F>> {
        self.sample_chol(x, n_traj, rng)
    }

    /// Sample the gaussian process posterior for `n_traj` trajectories with the given sampler.
    pub fn sample_with<R: Rng>(
        &self,
        x: &ArrayBase<impl Data<Elem = F>, Ix2>,
        n_traj: usize,
        sampler: &MvnSampler<F>,
        rng: &mut R,
    ) -> Result<Array2<F>> {
        let posterior = self.predict(x)?;
        sampler
            .clone()
            .variance_scale(self.kernel.prior_variance())
            .sample(&posterior.mean, &posterior.covariance, n_traj, rng)
    }

    /// Covariance function
    pub fn kernel(&self) -> &SquaredExponentialKernel<F> {
        &self.kernel
    }

    /// Prior mean value used by the model
    pub fn prior_mean(&self) -> F {
        self.mean
    }

    /// Observation noise standard deviation
    pub fn noise(&self) -> F {
        self.params.noise
    }

    /// Parameters used to fit this model
    pub fn params_used(&self) -> &GpValidParams<F> {
        &self.params
    }

    /// Training dataset (input, output)
    pub fn training_data(&self) -> &(Array2<F>, Array1<F>) {
        &self.training_data
    }

    /// Retrieve number of training points and input dimension
    pub fn dims(&self) -> (usize, usize) {
        (self.training_data.0.nrows(), self.training_data.0.ncols())
    }
}

impl<F: Float, D: Data<Elem = F>> Fit<ArrayBase<D, Ix2>, ArrayBase<D, Ix1>, GpError>
    for GpValidParams<F>
{
    type Object = GaussianProcess<F>;

    /// Condition the GP prior on the training dataset
    fn fit(
        &self,
        dataset: &DatasetBase<ArrayBase<D, Ix2>, ArrayBase<D, Ix1>>,
    ) -> Result<Self::Object> {
        let x = dataset.records();
        let y = dataset.targets();

        if x.nrows() == 0 {
            return Err(GpError::mismatch("fit", &[1, x.ncols()], x.shape()));
        }
        if x.nrows() != y.len() {
            return Err(GpError::mismatch("fit", &[x.nrows()], &[y.len()]));
        }
        if x.iter().chain(y.iter()).any(|v| !v.is_finite()) {
            return Err(GpError::InvalidValueError(
                "Training data should contain only finite values".to_string(),
            ));
        }

        let now = Instant::now();
        let kernel = SquaredExponentialKernel::new(self.vertical_scale(), self.length_scale())?;
        let m = match self.prior_mean() {
            PriorMean::DataMean => mean(y).unwrap_or_else(F::zero),
            PriorMean::Fixed(m) => m,
        };

        let n = x.nrows();
        let k = kernel.evaluate(x, x)?;
        let reg = self.noise() * self.noise() + self.jitter();
        let k_reg = linalg::add(&k, &scaled_identity(n, reg))?;
        let k_inv = linalg::invert(&k_reg, self.tolerance())?;

        let y_centered = y.mapv(|v| v - m);
        let alpha = k_inv.dot(&y_centered);

        debug!(
            "GP fitted on {} points (nx={}) in {:?}, mean={}",
            n,
            x.ncols(),
            now.elapsed(),
            m
        );
        Ok(GaussianProcess {
            kernel,
            mean: m,
            k_inv,
            alpha,
            training_data: (x.to_owned(), y.to_owned()),
            params: self.clone(),
        })
    }
}
