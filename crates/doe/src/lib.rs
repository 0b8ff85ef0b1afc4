/*!
This library implements the designs of experiments (DoE) used to place training
inputs and prediction locations of one-dimensional (or box-bounded) regression problems.

A DoE method is a way to generate a set of points (i.e. a DoE) within a design (or sample) space `xlimits`.
The design space is defined as a 2D ndarray `(nx, 2)`, specifying lower bound and upper bound
of each `nx` components of the samples `x`.

Example:
```
use gpviz_doe::{Grid, Random, SamplingMethod};
use ndarray::arr2;

// Design space is defined as [-3.14, 3.14], samples are 1-dimensional.
let xlimits = arr2(&[[-3.14, 3.14]]);
// We generate eight evenly spaced samples
let samples = Grid::new(&xlimits).sample(8);
// or else randomly with random generator seeded for reproducibility
let samples = Random::seeded(&xlimits, 42).sample(8);
```

This library contains two kinds of sampling methods:
* [Grid Sampling](crate::grid::Grid), also known as systematic sampling,
* [Random Sampling](crate::random::Random)

*/
#![warn(missing_docs)]
#![warn(rustdoc::broken_intra_doc_links)]
mod grid;
mod random;
mod traits;

pub use grid::*;
pub use random::*;
pub use traits::*;
