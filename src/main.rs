use clap::{Parser, ValueEnum};
use env_logger::{Builder, Env};
use gpviz::{
    EngineConfig, ExampleFunction, GpSamplingMethod, GpService, NoiseSpec, PriorMean,
    SamplingKind, Session, SessionConfig, GPVIZ_LOG,
};
use log::info;
use std::fs::File;
use std::io::{self, BufWriter};
use std::path::PathBuf;

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Placement {
    Systematic,
    Random,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Factorization {
    Cholesky,
    Eigen,
}

/// Fit a Gaussian process on noisy samples of an example function and
/// output posterior, confidence band and function draws as JSON
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// JSON session configuration, command line options take precedence
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Example function: sin, exp-cos-sin, normal-pdf, sigmoid, point or its index
    #[arg(short, long, value_parser = parse_function)]
    function: Option<ExampleFunction>,
    /// Number of training samples
    #[arg(short, long)]
    num_samples: Option<usize>,
    /// Placement of training inputs
    #[arg(long, value_enum)]
    sampling: Option<Placement>,
    /// Standard deviation of the noise added to training outputs
    #[arg(long)]
    y_noise: Option<f64>,
    /// Observation noise of the model, same as y-noise if not given
    #[arg(long)]
    noise: Option<f64>,
    /// Prior mean of the model, mean of training outputs if not given
    #[arg(short = 'm', long)]
    prior_mean: Option<f64>,
    /// Kernel vertical scale
    #[arg(short, long)]
    vertical_scale: Option<f64>,
    /// Kernel length scale
    #[arg(short, long)]
    length_scale: Option<f64>,
    /// Number of points of the prediction grid
    #[arg(short, long)]
    resolution: Option<usize>,
    /// Number of posterior draws
    #[arg(long)]
    draws: Option<usize>,
    /// Number of standard prior draws
    #[arg(long)]
    prior_draws: Option<usize>,
    /// Factorization used to draw trajectories
    #[arg(long, value_enum)]
    factorization: Option<Factorization>,
    /// Random seed
    #[arg(short, long)]
    seed: Option<u64>,
    /// Output file, standard output if not given
    #[arg(short, long)]
    output: Option<PathBuf>,
    /// Pretty print JSON
    #[arg(long, default_value_t = false)]
    pretty: bool,
    /// List example functions and exit
    #[arg(long, default_value_t = false)]
    list: bool,
}

fn parse_function(s: &str) -> Result<ExampleFunction, String> {
    s.parse().map_err(|err: gpviz::GpvizError| err.to_string())
}

impl Args {
    fn session_config(&self) -> anyhow::Result<SessionConfig> {
        let mut config = match &self.config {
            Some(path) => SessionConfig::from_file(path)?,
            None => SessionConfig::default(),
        };
        if let Some(function) = self.function {
            config = config.function(function);
        }
        if let Some(n) = self.num_samples {
            config = config.num_samples(n);
        }
        if let Some(sampling) = self.sampling {
            config = config.sampling(match sampling {
                Placement::Systematic => SamplingKind::Systematic,
                Placement::Random => SamplingKind::Random,
            });
        }
        if let Some(y_noise) = self.y_noise {
            config = config.y_noise(y_noise);
        }
        if let Some(noise) = self.noise {
            config = config.noise(NoiseSpec::Fixed(noise));
        }
        if let Some(m) = self.prior_mean {
            config = config.prior_mean(PriorMean::Fixed(m));
        }
        if let Some(v) = self.vertical_scale {
            config = config.vertical_scale(v);
        }
        if let Some(l) = self.length_scale {
            config = config.length_scale(l);
        }
        if let Some(resolution) = self.resolution {
            config = config.resolution(resolution);
        }
        if let Some(n) = self.draws {
            config = config.num_fn_samples(n);
        }
        if let Some(n) = self.prior_draws {
            config = config.num_std_gp_samples(n);
        }
        if let Some(factorization) = self.factorization {
            config = config.sampling_method(match factorization {
                Factorization::Cholesky => GpSamplingMethod::Cholesky,
                Factorization::Eigen => GpSamplingMethod::EigenValues,
            });
        }
        if let Some(seed) = self.seed {
            config = config.seed(seed);
        }
        Ok(config.check()?)
    }
}

fn main() -> anyhow::Result<()> {
    let env = Env::new().filter_or(GPVIZ_LOG, "info");
    let mut builder = Builder::from_env(env);
    let builder = builder.target(env_logger::Target::Stderr);
    builder.try_init().ok();

    let args = Args::parse();
    if args.list {
        for (i, f) in ExampleFunction::ALL.iter().enumerate() {
            if !f.is_hidden() {
                println!("{i}: {f} ({})", f.name());
            }
        }
        return Ok(());
    }

    let config = args.session_config()?;
    let session = Session::new(GpService::new(EngineConfig::default()));
    let report = session.run(&config)?;

    match &args.output {
        Some(path) => {
            report.write_json(BufWriter::new(File::create(path)?), args.pretty)?;
            info!("Report written to {}", path.display());
        }
        None => report.write_json(io::stdout().lock(), args.pretty)?,
    }
    Ok(())
}
