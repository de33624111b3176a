//! Fitness evaluation.
//!
//! A [`FitnessEvaluator`] scores one candidate in the context of its
//! population. The [`EvaluationScheduler`] scores a whole generation across
//! a bounded rayon worker pool and returns the scores in input order,
//! whatever order the workers finish in.
//!
//! Evaluation is the only parallel phase of a run and acts as a barrier: a
//! call returns only once every candidate is scored. A failing evaluation
//! (an error, a panic, or a NaN score) fails the whole call, since dropping
//! the candidate would change the population size.
//!
//! # Thread Safety
//!
//! Evaluators are shared by reference between workers (`Send + Sync`). An
//! evaluator that needs randomness must keep per-thread generators (for
//! example seeded through [`SeedSequence`](crate::random::SeedSequence))
//! rather than one unsynchronized generator.

mod scheduler;

pub use scheduler::EvaluationScheduler;

use std::cmp::Ordering;
use std::fmt;

/// Error type returned by user fitness functions.
pub type EvaluationError = Box<dyn std::error::Error + Send + Sync>;

/// Whether higher or lower fitness is better.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FitnessDirection {
    /// Higher fitness is better.
    #[default]
    Natural,
    /// Lower fitness is better.
    Inverted,
}

impl FitnessDirection {
    /// Whether higher fitness is better.
    pub fn is_natural(self) -> bool {
        self == FitnessDirection::Natural
    }

    /// Orders two scores fittest first: `Less` means `a` is fitter than `b`.
    ///
    /// Unordered values (NaN) compare equal.
    pub fn compare(self, a: f64, b: f64) -> Ordering {
        let ord = match self {
            FitnessDirection::Natural => b.partial_cmp(&a),
            FitnessDirection::Inverted => a.partial_cmp(&b),
        };
        ord.unwrap_or(Ordering::Equal)
    }

    /// Whether `a` is strictly fitter than `b`.
    pub fn is_better(self, a: f64, b: f64) -> bool {
        self.compare(a, b) == Ordering::Less
    }

    /// The least fit representable score.
    pub fn worst(self) -> f64 {
        match self {
            FitnessDirection::Natural => f64::NEG_INFINITY,
            FitnessDirection::Inverted => f64::INFINITY,
        }
    }
}

/// Scores candidates.
///
/// # Implementing
///
/// ```
/// use u_evolve::evaluation::{EvaluationError, FitnessDirection, FitnessEvaluator};
///
/// struct CountOnes;
///
/// impl FitnessEvaluator<Vec<bool>> for CountOnes {
///     fn fitness(&self, candidate: &Vec<bool>, _population: &[Vec<bool>]) -> Result<f64, EvaluationError> {
///         Ok(candidate.iter().filter(|&&b| b).count() as f64)
///     }
///
///     fn direction(&self) -> FitnessDirection {
///         FitnessDirection::Natural
///     }
/// }
/// ```
pub trait FitnessEvaluator<T>: Send + Sync {
    /// Scores `candidate`. `population` is the generation it belongs to,
    /// for fitness functions that depend on the other candidates.
    fn fitness(&self, candidate: &T, population: &[T]) -> Result<f64, EvaluationError>;

    /// Whether higher or lower scores are better.
    fn direction(&self) -> FitnessDirection {
        FitnessDirection::Natural
    }
}

impl<T, E: FitnessEvaluator<T> + ?Sized> FitnessEvaluator<T> for std::sync::Arc<E> {
    fn fitness(&self, candidate: &T, population: &[T]) -> Result<f64, EvaluationError> {
        (**self).fitness(candidate, population)
    }

    fn direction(&self) -> FitnessDirection {
        (**self).direction()
    }
}

/// Adapts an infallible closure into a [`FitnessEvaluator`].
///
/// ```
/// use u_evolve::evaluation::{FitnessDirection, FitnessEvaluator, FnEvaluator};
///
/// let eval = FnEvaluator::new(FitnessDirection::Inverted, |x: &f64, _: &[f64]| x * x);
/// let population = vec![3.0_f64];
/// assert_eq!(eval.fitness(&population[0], &population[..]).unwrap(), 9.0);
/// ```
pub struct FnEvaluator<F> {
    direction: FitnessDirection,
    f: F,
}

impl<F> FnEvaluator<F> {
    /// Wraps `f` with the given direction.
    pub fn new(direction: FitnessDirection, f: F) -> Self {
        Self { direction, f }
    }
}

impl<T, F> FitnessEvaluator<T> for FnEvaluator<F>
where
    F: Fn(&T, &[T]) -> f64 + Send + Sync,
{
    fn fitness(&self, candidate: &T, population: &[T]) -> Result<f64, EvaluationError> {
        Ok((self.f)(candidate, population))
    }

    fn direction(&self) -> FitnessDirection {
        self.direction
    }
}

impl<F> fmt::Debug for FnEvaluator<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnEvaluator")
            .field("direction", &self.direction)
            .finish()
    }
}

/// A candidate paired with its fitness score.
#[derive(Debug, Clone, PartialEq)]
pub struct EvaluatedCandidate<T> {
    /// The scored candidate.
    pub candidate: T,
    /// Its fitness.
    pub fitness: f64,
}

impl<T> EvaluatedCandidate<T> {
    /// Pairs a candidate with its score.
    pub fn new(candidate: T, fitness: f64) -> Self {
        Self { candidate, fitness }
    }
}

/// Stable sort, fittest first. Equal scores keep their input order.
pub fn sort_fittest_first<T>(population: &mut [EvaluatedCandidate<T>], direction: FitnessDirection) {
    population.sort_by(|a, b| direction.compare(a.fitness, b.fitness));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direction_compare() {
        assert_eq!(FitnessDirection::Natural.compare(2.0, 1.0), Ordering::Less);
        assert_eq!(FitnessDirection::Inverted.compare(2.0, 1.0), Ordering::Greater);
        assert_eq!(FitnessDirection::Natural.compare(1.0, f64::NAN), Ordering::Equal);
        assert!(FitnessDirection::Inverted.is_better(0.5, 0.6));
        assert!(!FitnessDirection::Natural.is_better(0.5, 0.5));
    }

    #[test]
    fn test_worst() {
        assert!(FitnessDirection::Natural.is_better(-1e300, FitnessDirection::Natural.worst()));
        assert!(FitnessDirection::Inverted.is_better(1e300, FitnessDirection::Inverted.worst()));
    }

    #[test]
    fn test_sort_is_stable() {
        let mut pop = vec![
            EvaluatedCandidate::new('a', 1.0),
            EvaluatedCandidate::new('b', 3.0),
            EvaluatedCandidate::new('c', 1.0),
            EvaluatedCandidate::new('d', 3.0),
        ];
        sort_fittest_first(&mut pop, FitnessDirection::Natural);
        let order: String = pop.iter().map(|e| e.candidate).collect();
        assert_eq!(order, "bdac");

        sort_fittest_first(&mut pop, FitnessDirection::Inverted);
        let order: String = pop.iter().map(|e| e.candidate).collect();
        assert_eq!(order, "acbd");
    }

    #[test]
    fn test_fn_evaluator() {
        let eval = FnEvaluator::new(FitnessDirection::Natural, |s: &String, pop: &[String]| {
            (s.len() + pop.len()) as f64
        });
        let pop = vec!["ab".to_string(), "c".to_string()];
        assert_eq!(eval.fitness(&pop[0], &pop[..]).unwrap(), 4.0);
        assert_eq!(FitnessEvaluator::<String>::direction(&eval), FitnessDirection::Natural);
    }
}
