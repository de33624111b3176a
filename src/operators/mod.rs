//! Population-transforming stochastic operators.
//!
//! Every operator takes a population of `N` candidates and returns a
//! population of `N` candidates. Crossover-style operators recombine pairs,
//! mutation-style operators perturb single candidates; both share the
//! [`EvolutionaryOperator`] interface so they compose freely in an
//! [`EvolutionPipeline`].
//!
//! # Crossover Operators
//!
//! - [`Crossover`] + [`ListCrossover`]: k-point crossover of `Vec<G>`
//! - [`Crossover`] + [`StringCrossover`]: k-point crossover of `String`s
//! - [`PermutationCrossover`]: order (OX) and partially mapped (PMX) crossover
//!
//! # Mutation Operators
//!
//! - [`Mutation`] + [`StringMutation`]: alphabet replacement
//! - [`Mutation`] + [`ListOrderMutation`]: adjacent swaps
//! - [`Mutation`] + [`GaussianMutation`]: Gaussian noise on real vectors
//! - [`PermutationMutation`]: swap, insert, or invert moves
//!
//! # References
//!
//! - Eiben & Smith (2015), *Introduction to Evolutionary Computing*, ch. 4
//! - Davis (1985), "Applying Adaptive Algorithms to Epistatic Domains"
//! - Goldberg & Lingle (1985), "Alleles, Loci, and the Traveling Salesman Problem"

mod crossover;
mod mutation;
mod permutation;

pub use crossover::{BitStringCrossover, Crossover, ListCrossover, Recombination, StringCrossover};
pub use mutation::{GaussianMutation, ListOrderMutation, Mutate, Mutation, StringMutation};
pub use permutation::{
    insert_mutation, invert_mutation, order_crossover, pmx_crossover, swap_mutation,
    PermutationCrossover, PermutationCrossoverKind, PermutationMutation, PermutationMove,
};

use crate::error::Result;
use rand::RngCore;

/// A stochastic population transform.
///
/// Implementations must return exactly as many candidates as they receive.
/// The engine checks this after every pipeline run and aborts the run if it
/// does not hold.
pub trait EvolutionaryOperator<T>: Send + Sync {
    /// Transforms `population`, drawing randomness only from `rng`.
    fn apply(&self, population: Vec<T>, rng: &mut dyn RngCore) -> Result<Vec<T>>;
}

impl<T, O: EvolutionaryOperator<T> + ?Sized> EvolutionaryOperator<T> for Box<O> {
    fn apply(&self, population: Vec<T>, rng: &mut dyn RngCore) -> Result<Vec<T>> {
        (**self).apply(population, rng)
    }
}

/// Returns the population unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityOperator;

impl<T> EvolutionaryOperator<T> for IdentityOperator {
    fn apply(&self, population: Vec<T>, _rng: &mut dyn RngCore) -> Result<Vec<T>> {
        Ok(population)
    }
}

/// An ordered sequence of operators.
///
/// The output of each stage is the input of the next. An empty pipeline is
/// the identity transform.
///
/// ```
/// use u_evolve::numbers::{ConstantGenerator, Probability};
/// use u_evolve::operators::{Crossover, EvolutionPipeline, EvolutionaryOperator, StringCrossover};
/// use u_evolve::random::create_rng;
///
/// let pipeline = EvolutionPipeline::new()
///     .then(Crossover::new(StringCrossover, ConstantGenerator::new(1), Probability::ONE).unwrap());
/// let out = pipeline
///     .apply(vec!["aaaa".to_string(), "bbbb".to_string()], &mut create_rng(1))
///     .unwrap();
/// assert_eq!(out.len(), 2);
/// ```
pub struct EvolutionPipeline<T> {
    stages: Vec<Box<dyn EvolutionaryOperator<T>>>,
}

impl<T> Default for EvolutionPipeline<T> {
    fn default() -> Self {
        Self { stages: Vec::new() }
    }
}

impl<T> EvolutionPipeline<T> {
    /// Creates an empty pipeline.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a stage.
    pub fn then<O: EvolutionaryOperator<T> + 'static>(mut self, operator: O) -> Self {
        self.stages.push(Box::new(operator));
        self
    }

    /// Appends an already boxed stage.
    pub fn push(&mut self, operator: Box<dyn EvolutionaryOperator<T>>) {
        self.stages.push(operator);
    }

    /// Number of stages.
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    /// Whether the pipeline has no stages.
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }
}

impl<T> EvolutionaryOperator<T> for EvolutionPipeline<T> {
    fn apply(&self, population: Vec<T>, rng: &mut dyn RngCore) -> Result<Vec<T>> {
        self.stages
            .iter()
            .try_fold(population, |pop, stage| stage.apply(pop, rng))
    }
}

impl<T> std::fmt::Debug for EvolutionPipeline<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EvolutionPipeline")
            .field("stages", &self.stages.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EvolutionError;
    use crate::random::create_rng;

    /// Appends a fixed suffix to every candidate.
    struct Suffix(&'static str);

    impl EvolutionaryOperator<String> for Suffix {
        fn apply(&self, population: Vec<String>, _rng: &mut dyn RngCore) -> Result<Vec<String>> {
            Ok(population.into_iter().map(|s| s + self.0).collect())
        }
    }

    struct Fails;

    impl EvolutionaryOperator<String> for Fails {
        fn apply(&self, _population: Vec<String>, _rng: &mut dyn RngCore) -> Result<Vec<String>> {
            Err(EvolutionError::InvalidArgument("boom".into()))
        }
    }

    fn population() -> Vec<String> {
        vec!["a".to_string(), "b".to_string()]
    }

    #[test]
    fn test_empty_pipeline_is_identity() {
        let pipeline: EvolutionPipeline<String> = EvolutionPipeline::new();
        assert!(pipeline.is_empty());
        let out = pipeline.apply(population(), &mut create_rng(1)).unwrap();
        assert_eq!(out, population());
    }

    #[test]
    fn test_stages_apply_in_order() {
        let pipeline = EvolutionPipeline::new().then(Suffix("1")).then(Suffix("2"));
        assert_eq!(pipeline.len(), 2);
        let out = pipeline.apply(population(), &mut create_rng(1)).unwrap();
        assert_eq!(out, vec!["a12".to_string(), "b12".to_string()]);
    }

    #[test]
    fn test_error_stops_pipeline() {
        let pipeline = EvolutionPipeline::new()
            .then(Suffix("1"))
            .then(Fails)
            .then(Suffix("2"));
        let err = pipeline.apply(population(), &mut create_rng(1)).unwrap_err();
        assert_eq!(err, EvolutionError::InvalidArgument("boom".into()));
    }

    #[test]
    fn test_pipelines_nest() {
        let inner = EvolutionPipeline::new().then(Suffix("x"));
        let mut outer = EvolutionPipeline::new().then(inner);
        outer.push(Box::new(IdentityOperator));
        let out = outer.apply(population(), &mut create_rng(1)).unwrap();
        assert_eq!(out, vec!["ax".to_string(), "bx".to_string()]);
    }
}
