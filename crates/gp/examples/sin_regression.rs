use gpviz_gp::{GaussianProcess, PriorMean, GP_CONFIDENCE_95};
use linfa::prelude::*;
use ndarray::{concatenate, Array, Axis};
use ndarray_rand::rand::SeedableRng;
use rand_xoshiro::Xoshiro256Plus;
use std::f64::consts::PI;

fn main() {
    let xt = Array::linspace(-PI, PI, 5).insert_axis(Axis(1));
    let yt = xt.column(0).mapv(f64::sin);

    println!("Condition GP prior on 'sin' at {}", xt.column(0));
    let gp = GaussianProcess::<f64>::params(1., 1.)
        .noise(0.)
        .prior_mean(PriorMean::Fixed(0.))
        .fit(&Dataset::new(xt, yt))
        .expect("GP fitting");
    println!("{gp}");

    let xtest = Array::linspace(-4. * PI, 4. * PI, 17).insert_axis(Axis(1));
    let posterior = gp.predict(&xtest).expect("GP prediction");
    let (lower, upper) = posterior.confidence_interval(GP_CONFIDENCE_95);

    println!("Posterior (x, mean, lower, upper)");
    println!(
        "{}",
        concatenate![
            Axis(1),
            xtest,
            posterior.mean.insert_axis(Axis(1)),
            lower.insert_axis(Axis(1)),
            upper.insert_axis(Axis(1))
        ]
    );

    let mut rng = Xoshiro256Plus::seed_from_u64(42);
    let draws = gp.sample(&xtest, 3, &mut rng).expect("GP sampling");
    println!("Posterior draws at x (one column per draw)");
    println!("{}", draws);
}
