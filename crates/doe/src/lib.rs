/*!
This library implements the Design of Experiments (DoE) methods a.k.a. sampling methods
used by the aerogp surrogate engine.

A DoE method is a way to generate a set of points (i.e. a DoE) within a design (or sample) space `xlimits`.
The design space is defined as a 2D ndarray `(nx, 2)`, specifying lower bound and upper bound
of each `nx` components of the samples `x`.

Example:
```
use aerogp_doe::{FullFactorial, Lhs, LhsKind, SamplingMethod};
use ndarray::arr2;
use ndarray_rand::rand::SeedableRng;
use rand_xoshiro::Xoshiro256Plus;

// Design space is defined as [5., 10.] x [0., 1.], samples are 2-dimensional.
let xlimits = arr2(&[[5., 10.], [0., 1.]]);
// We generate five samples using maximin Latin Hypercube sampling.
let samples = Lhs::new(&xlimits)
    .kind(LhsKind::Maximin)
    .with_rng(Xoshiro256Plus::seed_from_u64(42))
    .sample(5);
// or else a regular grid with 4 levels per component (16 samples)
let grid = FullFactorial::new(&xlimits).levels(4).sample(16);
```

This library contains two kinds of sampling methods:
* [Latin Hypercube Sampling](crate::lhs::Lhs),
* [Full Factorial Sampling](crate::full_factorial::FullFactorial)

*/
#![warn(missing_docs)]
#![warn(rustdoc::broken_intra_doc_links)]
mod full_factorial;
mod lhs;
mod traits;
mod utils;

pub use full_factorial::*;
pub use lhs::*;
pub use traits::*;
