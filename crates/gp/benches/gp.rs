use criterion::{criterion_group, criterion_main, Criterion};
use gpviz_doe::{Random, SamplingMethod};
use gpviz_gp::{sample_prior, standard_prior_grid, GaussianProcess, GpSamplingMethod, MvnSampler};
use gpviz_gp::SquaredExponentialKernel;
use linfa::prelude::{Dataset, Fit};
use ndarray::{array, Array, Axis};
use ndarray_rand::rand::SeedableRng;
use rand_xoshiro::Xoshiro256Plus;

fn criterion_gp(c: &mut Criterion) {
    let nts = [10, 50, 200];

    let mut group = c.benchmark_group("gp");
    group.sample_size(20);
    for nt in nts {
        let xlimits = array![[-10., 10.]];
        let xt = Random::seeded(&xlimits, 42).sample(nt);
        let yt = xt.column(0).mapv(|x| x * x.sin());
        let x = Array::linspace(-12., 12., 200).insert_axis(Axis(1));

        group.bench_function(format!("gp fit {nt}"), |b| {
            b.iter(|| {
                std::hint::black_box(
                    GaussianProcess::<f64>::params(10., 2.)
                        .noise(0.1)
                        .fit(&Dataset::new(xt.to_owned(), yt.to_owned()))
                        .expect("GP fit error"),
                )
            });
        });

        let gp = GaussianProcess::<f64>::params(10., 2.)
            .noise(0.1)
            .fit(&Dataset::new(xt.to_owned(), yt.to_owned()))
            .expect("GP fit error");
        group.bench_function(format!("gp predict {nt}"), |b| {
            b.iter(|| std::hint::black_box(gp.predict(&x).expect("GP prediction error")));
        });
    }
    group.finish();
}

fn criterion_sampling(c: &mut Criterion) {
    let mut group = c.benchmark_group("sampling");
    group.sample_size(20);
    let grid = standard_prior_grid::<f64>(100).expect("grid");
    let kernel = SquaredExponentialKernel::default();
    for method in [GpSamplingMethod::Cholesky, GpSamplingMethod::EigenValues] {
        let sampler = MvnSampler::new(method);
        let mut rng = Xoshiro256Plus::seed_from_u64(42);
        group.bench_function(format!("prior {method:?}"), |b| {
            b.iter(|| {
                std::hint::black_box(
                    sample_prior(&kernel, &grid, 20, &sampler, &mut rng).expect("sampling error"),
                )
            });
        });
    }
    group.finish();
}

criterion_group!(benches, criterion_gp, criterion_sampling);
criterion_main!(benches);
