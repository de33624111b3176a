//! Number generators for runtime-configurable operator parameters.
//!
//! Operators take their tunable quantities (number of crossover points,
//! mutation magnitude, ...) from a [`NumberGenerator`] instead of a hardcoded
//! constant. A fixed parameter is a [`ConstantGenerator`]; a varying one is
//! drawn from a distribution. This keeps the operator mechanics testable
//! independently of their parameterization.
//!
//! Generators never own random state: the random source is injected on every
//! draw, so they are deterministic given the caller's stream.
//!
//! # Generators
//!
//! - [`ConstantGenerator`]: always the same value
//! - [`UniformGenerator`]: uniform over an inclusive range (integer or real)
//! - [`PoissonGenerator`]: Poisson-distributed counts
//! - [`GaussianGenerator`]: normally distributed reals
//! - [`ExponentialGenerator`]: exponentially distributed reals
//! - [`BinomialGenerator`]: binomially distributed counts
//! - [`AdjustableGenerator`]: a constant that can be changed while running

mod generators;
mod probability;

pub use generators::{
    AdjustableGenerator, BinomialGenerator, ConstantGenerator, ExponentialGenerator,
    GaussianGenerator, PoissonGenerator, UniformGenerator,
};
pub use probability::Probability;

use rand::RngCore;
use std::fmt;

/// A source of parameter values, polymorphic over distribution family.
pub trait NumberGenerator<N>: Send + Sync + fmt::Debug {
    /// Draws the next value.
    fn next_value(&self, rng: &mut dyn RngCore) -> N;

    /// The smallest value this generator can produce, if it is known.
    ///
    /// Operators use it to reject parameters that are always invalid, such
    /// as a negative mutation spread, at construction time.
    fn lower_bound(&self) -> Option<N> {
        None
    }

    /// The largest value this generator can produce, if it is known.
    ///
    /// Count parameters (cut points, mutation moves) are rejected only when
    /// this is below 1, i.e. the generator can never yield a useful value.
    fn upper_bound(&self) -> Option<N> {
        None
    }
}

impl<N, G: NumberGenerator<N> + ?Sized> NumberGenerator<N> for Box<G> {
    fn next_value(&self, rng: &mut dyn RngCore) -> N {
        (**self).next_value(rng)
    }

    fn lower_bound(&self) -> Option<N> {
        (**self).lower_bound()
    }

    fn upper_bound(&self) -> Option<N> {
        (**self).upper_bound()
    }
}

impl<N, G: NumberGenerator<N> + ?Sized> NumberGenerator<N> for std::sync::Arc<G> {
    fn next_value(&self, rng: &mut dyn RngCore) -> N {
        (**self).next_value(rng)
    }

    fn lower_bound(&self) -> Option<N> {
        (**self).lower_bound()
    }

    fn upper_bound(&self) -> Option<N> {
        (**self).upper_bound()
    }
}
