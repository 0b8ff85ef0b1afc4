//! Regression session: generates training data for an example function, fits the model
//! and computes every curve to display.
use crate::catalog::TrainingSet;
use crate::config::SessionConfig;
use crate::engine::Hyperparameters;
use crate::errors::{GpvizError, Result};
use crate::report::{ModelSummary, Report, Series, SeriesKind};
use crate::service::GpService;

use gpviz_gp::{
    sample_prior, standard_prior_grid, Kernel, MvnSampler, SquaredExponentialKernel,
    GP_CONFIDENCE_95,
};
use log::{debug, info};
use ndarray::{Array, Axis};
use ndarray_rand::rand::SeedableRng;
use rand_xoshiro::Xoshiro256Plus;
use std::time::Instant;

/// Number of intervals of the grid where standard prior draws are evaluated
pub const STD_PRIOR_RESOLUTION: usize = 100;

/// Runs regression sessions on a lazily initialized engine
#[derive(Debug, Default)]
pub struct Session {
    service: GpService,
}

impl Session {
    /// Session running on the given service
    pub fn new(service: GpService) -> Self {
        Session { service }
    }

    /// Underlying service
    pub fn service(&self) -> &GpService {
        &self.service
    }

    /// Run a whole session: training data, posterior with 95% confidence band,
    /// posterior draws and standard prior draws.
    pub fn run(&self, config: &SessionConfig) -> Result<Report> {
        let config = config.clone().check()?;
        let engine = self.service.engine()?;
        let now = Instant::now();

        let set = TrainingSet::generate(
            config.function,
            config.num_samples,
            config.sampling,
            config.y_noise,
            config.resolution,
            config.seed,
        )?;
        info!(
            "Regressing {} on {} {:?} samples",
            config.function.name(),
            config.num_samples,
            config.sampling
        );

        let hyper = Hyperparameters {
            vertical_scale: config.vertical_scale,
            length_scale: config.length_scale,
            noise: config.model_noise(),
            prior_mean: config.prior_mean,
        };
        let model = engine.fit(&set.x, &set.y, &hyper)?;

        let (xtmin, xtmax) = config.function.xt_range();
        let x_draws =
            Array::linspace(xtmin, xtmax, config.fn_sample_resolution + 1).insert_axis(Axis(1));
        let mut posteriors = engine
            .predict_many(&model, &[set.xt.clone(), x_draws.clone()])?
            .into_iter();
        let (Some(posterior), Some(draws_posterior)) = (posteriors.next(), posteriors.next()) else {
            return Err(GpvizError::InvalidConfigError(
                "Missing posterior for a query set".to_string(),
            ));
        };
        let (lower, upper) = posterior.confidence_interval(GP_CONFIDENCE_95);

        // posterior draws then prior draws continue the seeded stream of the session
        let mut rng = Xoshiro256Plus::seed_from_u64(config.seed);
        rng.long_jump();
        let sampler = engine
            .config()
            .sampler
            .clone()
            .method(config.sampling_method)
            .variance_scale(model.kernel().prior_variance());
        let draws = sampler.sample(
            &draws_posterior.mean,
            &draws_posterior.covariance,
            config.num_fn_samples,
            &mut rng,
        )?;
        let prior = standard_prior(&config, &sampler, &mut rng)?;

        let xt = set.xt.column(0);
        let mut curves = vec![
            Series::new("training data", SeriesKind::Training, &set.x.column(0), &set.y),
            Series::new(config.function.name(), SeriesKind::Function, &xt, &set.yt),
            Series::new("posterior mean", SeriesKind::Mean, &xt, &posterior.mean),
            Series::new("lower 95% bound", SeriesKind::LowerBound, &xt, &lower),
            Series::new("upper 95% bound", SeriesKind::UpperBound, &xt, &upper),
        ];
        curves.extend(Series::from_draws(
            "posterior draw",
            SeriesKind::PosteriorDraw,
            &x_draws.column(0),
            &draws,
        ));

        debug!("Session computed in {:?}", now.elapsed());
        Ok(Report {
            model: ModelSummary {
                function: config.function.name().to_string(),
                vertical_scale: config.vertical_scale,
                length_scale: config.length_scale,
                noise: model.noise(),
                prior_mean: model.prior_mean(),
                n_train: model.dims().0,
            },
            posterior: curves,
            prior,
        })
    }
}

fn standard_prior(
    config: &SessionConfig,
    sampler: &MvnSampler<f64>,
    rng: &mut Xoshiro256Plus,
) -> Result<Vec<Series>> {
    let grid = standard_prior_grid::<f64>(STD_PRIOR_RESOLUTION)?;
    let kernel = SquaredExponentialKernel::new(config.vertical_scale, config.length_scale)?;
    let draws = sample_prior(&kernel, &grid, config.num_std_gp_samples, sampler, rng)?;
    Ok(Series::from_draws(
        "prior draw",
        SeriesKind::PriorDraw,
        &grid.column(0),
        &draws,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{ExampleFunction, SamplingKind};
    use crate::config::NoiseSpec;
    use gpviz_gp::{GpSamplingMethod, PriorMean};

    #[test]
    fn test_default_session() {
        let session = Session::default();
        let config = SessionConfig::default();
        let report = session.run(&config).unwrap();

        assert_eq!(report.model.n_train, 8);
        assert_eq!(report.model.noise, 0.1);
        assert_eq!(report.series(SeriesKind::PosteriorDraw).count(), 20);
        assert_eq!(report.series(SeriesKind::PriorDraw).count(), 2);
        let mean = report.series(SeriesKind::Mean).next().unwrap();
        assert_eq!(mean.x.len(), 200);
        let draw = report.series(SeriesKind::PosteriorDraw).next().unwrap();
        assert_eq!(draw.x.len(), 101);
        let prior = report.series(SeriesKind::PriorDraw).next().unwrap();
        assert_eq!(prior.x.len(), 101);
        assert_eq!(prior.x[0], -1.);

        let lower = report.series(SeriesKind::LowerBound).next().unwrap();
        let upper = report.series(SeriesKind::UpperBound).next().unwrap();
        for ((l, u), m) in lower.y.iter().zip(&upper.y).zip(&mean.y) {
            assert!(l <= m && m <= u);
        }
        assert!(session.service().is_ready());
    }

    #[test]
    fn test_session_is_reproducible() {
        let session = Session::default();
        let config = SessionConfig::default()
            .function(ExampleFunction::ExpCosSin)
            .sampling(SamplingKind::Random)
            .num_samples(15)
            .noise(NoiseSpec::Fixed(0.2))
            .prior_mean(PriorMean::Fixed(0.))
            .seed(3);
        let first = session.run(&config).unwrap();
        let second = session.run(&config).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.model.prior_mean, 0.);
        assert_eq!(first.model.noise, 0.2);
        assert_eq!(session.service().initializations(), 1);

        let other = session.run(&config.seed(4)).unwrap();
        assert_ne!(first, other);
    }

    #[test]
    fn test_session_with_eigen_sampling() {
        let session = Session::default();
        let config = SessionConfig::default()
            .function(ExampleFunction::NormalPdf)
            .sampling_method(GpSamplingMethod::EigenValues)
            .num_fn_samples(3);
        let report = session.run(&config).unwrap();
        assert_eq!(report.series(SeriesKind::PosteriorDraw).count(), 3);
        assert!(report
            .series(SeriesKind::PosteriorDraw)
            .all(|s| s.y.iter().all(|v| v.is_finite())));
    }

    #[test]
    fn test_dense_noiseless_session() {
        let session = Session::default();
        for function in [ExampleFunction::ExpCosSin, ExampleFunction::NormalPdf] {
            let config = SessionConfig::default()
                .function(function)
                .num_samples(50)
                .noise(NoiseSpec::Fixed(0.))
                .vertical_scale(5.)
                .length_scale(5.);
            let report = session.run(&config).unwrap();
            assert_eq!(report.model.noise, 0.);
            assert_eq!(report.series(SeriesKind::PosteriorDraw).count(), 20);
            assert!(report
                .series(SeriesKind::PosteriorDraw)
                .all(|s| s.y.iter().all(|v| v.is_finite())));
        }
    }

    #[test]
    fn test_invalid_session() {
        let session = Session::default();
        assert!(session
            .run(&SessionConfig::default().length_scale(-1.))
            .is_err());
        assert!(!session.service().is_ready());
    }
}
