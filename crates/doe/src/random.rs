use std::sync::{Mutex, PoisonError};

use crate::SamplingMethod;
use linfa::Float;
use ndarray::{Array2, ArrayBase, Data, Ix2};
use ndarray_rand::rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256Plus;

#[cfg(feature = "serializable")]
use serde::{Deserialize, Serialize};

/// Uniform random design.
///
/// Points are drawn from a `Xoshiro256Plus` stream owned by the design: successive calls
/// to `sample` continue that stream, so a seeded design is reproducible as a whole
/// sequence of calls, not call by call.
#[derive(Debug)]
#[cfg_attr(feature = "serializable", derive(Serialize, Deserialize))]
pub struct Random<F: Float> {
    /// Sampling space as a (nx, 2) matrix of [lower_bound, upper_bound] rows
    xlimits: Array2<F>,
    stream: Mutex<Xoshiro256Plus>,
}

impl<F: Float> Random<F> {
    /// Design over `xlimits` drawing from a stream seeded from system entropy
    ///
    /// ```
    /// use gpviz_doe::Random;
    /// use ndarray::arr2;
    ///
    /// let doe = Random::new(&arr2(&[[-3.14, 3.14]]));
    /// ```
    pub fn new(xlimits: &ArrayBase<impl Data<Elem = F>, Ix2>) -> Self {
        Self::from_stream(xlimits, Xoshiro256Plus::from_entropy())
    }

    /// Design over `xlimits` drawing from a stream seeded by `seed`
    pub fn seeded(xlimits: &ArrayBase<impl Data<Elem = F>, Ix2>, seed: u64) -> Self {
        Self::from_stream(xlimits, Xoshiro256Plus::seed_from_u64(seed))
    }

    /// Design over `xlimits` drawing from the given stream, typically a `jump`ed copy
    /// of a generator whose other streams feed other consumers.
    ///
    /// **Panics** if xlimits number of columns is different from 2.
    pub fn from_stream(
        xlimits: &ArrayBase<impl Data<Elem = F>, Ix2>,
        stream: Xoshiro256Plus,
    ) -> Self {
        if xlimits.ncols() != 2 {
            panic!("xlimits must have 2 columns (lower, upper)");
        }
        Random {
            xlimits: xlimits.to_owned(),
            stream: Mutex::new(stream),
        }
    }

    /// Split off a design over the same space whose stream starts `2^128` draws ahead,
    /// so that both designs never produce overlapping sequences.
    pub fn split(&self) -> Self {
        let mut stream = self.lock();
        let other = stream.clone();
        stream.jump();
        Random {
            xlimits: self.xlimits.clone(),
            stream: Mutex::new(other),
        }
    }

    /// Draw `ns` points in the unit hypercube from `rng` without touching the design stream
    pub fn normalized_sample_using<R: Rng>(&self, ns: usize, rng: &mut R) -> Array2<F> {
        Array2::from_shape_simple_fn((ns, self.dim()), || F::cast(rng.gen::<f64>()))
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Xoshiro256Plus> {
        self.stream.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<F: Float> Clone for Random<F> {
    fn clone(&self) -> Self {
        Random {
            xlimits: self.xlimits.clone(),
            stream: Mutex::new(self.lock().clone()),
        }
    }
}

impl<F: Float> SamplingMethod<F> for Random<F> {
    fn sampling_space(&self) -> &Array2<F> {
        &self.xlimits
    }

    fn normalized_sample(&self, ns: usize) -> Array2<F> {
        let mut stream = self.lock();
        self.normalized_sample_using(ns, &mut *stream)
    }
}
