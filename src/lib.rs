//! Domain-agnostic evolutionary computation engine.
//!
//! Evolves populations of arbitrary user-defined candidates:
//!
//! - **Engine**: Generational loop with elitism, pluggable termination
//!   conditions, and asynchronous observers.
//! - **Operators**: Composable population transforms. k-point crossover of
//!   lists, strings and bit strings, OX/PMX permutation crossover, and
//!   string, list-order, Gaussian and permutation mutations.
//! - **Selection**: Tournament, roulette, rank, stochastic universal,
//!   sigma-scaled and truncation selection for natural or inverted fitness.
//! - **Evaluation**: Fitness scoring on a bounded worker pool with results
//!   in input order.
//! - **Numbers**: Runtime-configurable operator parameters drawn from
//!   constant, uniform, Poisson, Gaussian, exponential or binomial
//!   distributions.
//! - **Permutations**: Exhaustive lexicographic enumeration of small sets.
//!
//! # Architecture
//!
//! The crate never inspects candidates. Everything representation-specific
//! (creation, fitness, recombination, perturbation) is supplied through
//! traits; the engine owns only the loop, the randomness, and the
//! concurrency. All randomness flows from one seeded generator per run.

pub mod engine;
pub mod error;
pub mod evaluation;
pub mod numbers;
pub mod operators;
pub mod permutation;
pub mod random;
pub mod selection;

pub use error::{EvolutionError, Result};
