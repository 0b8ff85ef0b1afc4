//! Regression engine: fits models, predicts posteriors and draws trajectories.
//!
//! A fitted model is shared through a [`RegressorHandle`] so that several predictions
//! can read it concurrently.
use crate::errors::Result;
use gpviz_gp::linalg::InversionTolerance;
use gpviz_gp::{
    sample_prior, GaussianProcess, GpParams, GpPosterior, GpSamplingMethod, MvnSampler, PriorMean,
    SquaredExponentialKernel, GP_DEFAULT_JITTER,
};
use linfa::prelude::{Dataset, Fit};
use linfa::ParamGuard;
use log::{debug, info};
use ndarray::{Array1, Array2};
use ndarray_rand::rand::Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::ops::Deref;
use std::sync::Arc;

/// Numerical settings shared by every model built by an [`Engine`]
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    pub(crate) sampler: MvnSampler<f64>,
    pub(crate) jitter: f64,
    pub(crate) tolerance: InversionTolerance<f64>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            sampler: MvnSampler::default(),
            jitter: GP_DEFAULT_JITTER,
            tolerance: InversionTolerance::default(),
        }
    }
}

impl EngineConfig {
    /// Sets the factorization used to draw trajectories
    pub fn sampling_method(mut self, method: GpSamplingMethod) -> Self {
        self.sampler = self.sampler.method(method);
        self
    }

    /// Sets the multivariate normal sampler
    pub fn sampler(mut self, sampler: MvnSampler<f64>) -> Self {
        self.sampler = sampler;
        self
    }

    /// Sets the jitter added to the training kernel matrix diagonal
    pub fn jitter(mut self, jitter: f64) -> Self {
        self.jitter = jitter;
        self
    }

    /// Sets the thresholds used to declare the training kernel matrix singular
    pub fn tolerance(mut self, tolerance: InversionTolerance<f64>) -> Self {
        self.tolerance = tolerance;
        self
    }
}

/// Shared read-only access to a fitted model
#[derive(Clone, Debug)]
pub struct RegressorHandle(Arc<GaussianProcess<f64>>);

impl Deref for RegressorHandle {
    type Target = GaussianProcess<f64>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// Hyperparameters of a regression: kernel scales, noise and prior mean
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Hyperparameters {
    /// Vertical scale `v`
    pub vertical_scale: f64,
    /// Length scale `l`
    pub length_scale: f64,
    /// Observation noise standard deviation `s`
    pub noise: f64,
    /// Prior mean `m`
    pub prior_mean: PriorMean<f64>,
}

impl Default for Hyperparameters {
    fn default() -> Self {
        Hyperparameters {
            vertical_scale: 1.,
            length_scale: 1.,
            noise: 0.,
            prior_mean: PriorMean::DataMean,
        }
    }
}

/// GP regression engine
#[derive(Clone, Debug)]
pub struct Engine {
    config: EngineConfig,
}

impl Engine {
    /// Engine with checked numerical settings
    pub fn new(config: EngineConfig) -> Result<Engine> {
        GpParams::<f64>::default()
            .jitter(config.jitter)
            .tolerance(config.tolerance)
            .check()?;
        info!(
            "GP engine ready (sampling={:?}, jitter={})",
            config.sampler.sampling_method(),
            config.jitter
        );
        Ok(Engine { config })
    }

    /// Numerical settings
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Condition the GP prior on training inputs `x` (n, nx) and outputs `y` (n,)
    pub fn fit(
        &self,
        x: &Array2<f64>,
        y: &Array1<f64>,
        hyper: &Hyperparameters,
    ) -> Result<RegressorHandle> {
        let gp = GaussianProcess::params(hyper.vertical_scale, hyper.length_scale)
            .noise(hyper.noise)
            .prior_mean(hyper.prior_mean)
            .jitter(self.config.jitter)
            .tolerance(self.config.tolerance)
            .fit(&Dataset::new(x.to_owned(), y.to_owned()))?;
        info!("Fitted {}", gp);
        Ok(RegressorHandle(Arc::new(gp)))
    }

    /// Posterior at query points `xt` (q, nx)
    pub fn predict(&self, model: &RegressorHandle, xt: &Array2<f64>) -> Result<GpPosterior<f64>> {
        Ok(model.predict(xt)?)
    }

    /// Posteriors at several query sets, computed in parallel on the shared model
    pub fn predict_many(
        &self,
        model: &RegressorHandle,
        queries: &[Array2<f64>],
    ) -> Result<Vec<GpPosterior<f64>>> {
        debug!("Predicting {} query sets in parallel", queries.len());
        queries
            .par_iter()
            .map(|xt| self.predict(model, xt))
            .collect()
    }

    /// `n_draws` posterior trajectories at `xt` (q, nx) as a (q, n_draws) matrix
    pub fn sample_from_posterior<R: Rng>(
        &self,
        model: &RegressorHandle,
        xt: &Array2<f64>,
        n_draws: usize,
        rng: &mut R,
    ) -> Result<Array2<f64>> {
        Ok(model.sample_with(xt, n_draws, &self.config.sampler, rng)?)
    }

    /// `n_draws` trajectories of the zero-mean prior with scales `v` and `l`
    /// at `grid` (q, nx) as a (q, n_draws) matrix
    pub fn sample_prior<R: Rng>(
        &self,
        grid: &Array2<f64>,
        vertical_scale: f64,
        length_scale: f64,
        n_draws: usize,
        rng: &mut R,
    ) -> Result<Array2<f64>> {
        let kernel = SquaredExponentialKernel::new(vertical_scale, length_scale)?;
        Ok(sample_prior(
            &kernel,
            grid,
            n_draws,
            &self.config.sampler,
            rng,
        )?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::GpvizError;
    use approx::assert_abs_diff_eq;
    use gpviz_gp::{standard_prior_grid, GpError};
    use ndarray::{array, Array, Axis};
    use ndarray_rand::rand::SeedableRng;
    use rand_xoshiro::Xoshiro256Plus;

    fn sin_model(engine: &Engine) -> RegressorHandle {
        let x = Array::linspace(-3., 3., 8).insert_axis(Axis(1));
        let y = x.column(0).mapv(f64::sin);
        engine
            .fit(
                &x,
                &y,
                &Hyperparameters {
                    noise: 0.05,
                    ..Default::default()
                },
            )
            .unwrap()
    }

    #[test]
    fn test_fit_predict() {
        let engine = Engine::new(EngineConfig::default()).unwrap();
        let model = sin_model(&engine);
        let xt = Array::linspace(-3., 3., 31).insert_axis(Axis(1));
        let posterior = engine.predict(&model, &xt).unwrap();
        assert_eq!(posterior.len(), 31);
        assert_abs_diff_eq!(posterior.mean, xt.column(0).mapv(f64::sin), epsilon = 0.1);
    }

    #[test]
    fn test_predict_many_matches_sequential() {
        let engine = Engine::new(EngineConfig::default()).unwrap();
        let model = sin_model(&engine);
        let queries: Vec<_> = (1..=6)
            .map(|k| Array::linspace(-4., 4., 10 * k).insert_axis(Axis(1)))
            .collect();
        let parallel = engine.predict_many(&model, &queries).unwrap();
        for (xt, posterior) in queries.iter().zip(parallel) {
            assert_eq!(posterior, engine.predict(&model, xt).unwrap());
        }
    }

    #[test]
    fn test_shared_model_across_threads() {
        let engine = Engine::new(EngineConfig::default()).unwrap();
        let model = sin_model(&engine);
        let xt = Array::linspace(-2., 2., 21).insert_axis(Axis(1));
        let expected = engine.predict(&model, &xt).unwrap();
        std::thread::scope(|s| {
            let handles: Vec<_> = (0..4)
                .map(|_| {
                    let model = model.clone();
                    let (engine, xt) = (&engine, &xt);
                    s.spawn(move || engine.predict(&model, xt).unwrap())
                })
                .collect();
            for h in handles {
                assert_eq!(h.join().unwrap(), expected);
            }
        });
    }

    #[test]
    fn test_sampling() {
        let engine =
            Engine::new(EngineConfig::default().sampling_method(GpSamplingMethod::EigenValues))
                .unwrap();
        let model = sin_model(&engine);
        let mut rng = Xoshiro256Plus::seed_from_u64(0);
        let xt = Array::linspace(-4., 4., 101).insert_axis(Axis(1));
        let draws = engine
            .sample_from_posterior(&model, &xt, 5, &mut rng)
            .unwrap();
        assert_eq!(draws.shape(), &[101, 5]);

        let grid = standard_prior_grid(100).unwrap();
        let prior = engine.sample_prior(&grid, 1., 1., 2, &mut rng).unwrap();
        assert_eq!(prior.shape(), &[101, 2]);
    }

    #[test]
    fn test_invalid_inputs() {
        assert!(Engine::new(EngineConfig::default().jitter(-1.)).is_err());
        let engine = Engine::new(EngineConfig::default()).unwrap();
        let res = engine.fit(
            &array![[0.], [1.]],
            &array![0.],
            &Hyperparameters::default(),
        );
        assert!(matches!(
            res,
            Err(GpvizError::GpError(GpError::DimensionMismatch { .. }))
        ));
        let mut rng = Xoshiro256Plus::seed_from_u64(0);
        assert!(matches!(
            engine.sample_prior(&array![[0.]], 0., 1., 1, &mut rng),
            Err(GpvizError::GpError(GpError::InvalidHyperparameter { name: "v", .. }))
        ));
    }
}
