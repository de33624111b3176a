//! Candidate creation and per-generation snapshots.

use crate::error::{EvolutionError, Result};
use crate::evaluation::{EvaluatedCandidate, FitnessDirection};
use rand::RngCore;
use std::fmt;
use std::time::Duration;

/// Creates the candidates of the initial population.
///
/// # Implementing
///
/// ```
/// use rand::RngCore;
/// use u_evolve::engine::CandidateFactory;
/// use u_evolve::random::RandomSource;
///
/// struct Bits(usize);
///
/// impl CandidateFactory<Vec<bool>> for Bits {
///     fn generate_random_candidate(&self, rng: &mut dyn RngCore) -> Vec<bool> {
///         (0..self.0).map(|_| rng.next_flip()).collect()
///     }
/// }
/// ```
pub trait CandidateFactory<T>: Send + Sync {
    /// Creates one random candidate.
    fn generate_random_candidate(&self, rng: &mut dyn RngCore) -> T;

    /// Creates a population of `size` candidates.
    ///
    /// `seeds` come first, in order; the rest are random. Fails with
    /// [`EvolutionError::InvalidConfiguration`] if there are more seeds than
    /// slots.
    fn generate_initial_population(
        &self,
        size: usize,
        seeds: Vec<T>,
        rng: &mut dyn RngCore,
    ) -> Result<Vec<T>> {
        if seeds.len() > size {
            return Err(EvolutionError::InvalidConfiguration(format!(
                "{} seed candidates do not fit a population of {size}",
                seeds.len()
            )));
        }
        let mut population = seeds;
        population.reserve(size - population.len());
        while population.len() < size {
            population.push(self.generate_random_candidate(rng));
        }
        Ok(population)
    }
}

/// Adapts a closure into a [`CandidateFactory`].
pub struct FnFactory<F> {
    f: F,
}

impl<F> FnFactory<F> {
    /// Wraps `f`.
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

impl<T, F> CandidateFactory<T> for FnFactory<F>
where
    F: Fn(&mut dyn RngCore) -> T + Send + Sync,
{
    fn generate_random_candidate(&self, rng: &mut dyn RngCore) -> T {
        (self.f)(rng)
    }
}

impl<F> fmt::Debug for FnFactory<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("FnFactory")
    }
}

/// Lifecycle phase of a run. Transitions are logged at debug level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnginePhase {
    /// Building the initial population.
    Initializing,
    /// Scoring candidates.
    Evaluating,
    /// Choosing parents.
    Selecting,
    /// Running the operator pipeline.
    Varying,
    /// Asking the termination conditions.
    CheckingTermination,
    /// The run is over.
    Terminated,
}

impl fmt::Display for EnginePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EnginePhase::Initializing => "initializing",
            EnginePhase::Evaluating => "evaluating",
            EnginePhase::Selecting => "selecting",
            EnginePhase::Varying => "varying",
            EnginePhase::CheckingTermination => "checking termination",
            EnginePhase::Terminated => "terminated",
        };
        f.write_str(name)
    }
}

/// Summary statistics of one evaluated generation.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PopulationStats {
    /// Fitness of the fittest candidate.
    pub best_fitness: f64,
    /// Fitness of the least fit candidate.
    pub worst_fitness: f64,
    /// Arithmetic mean fitness.
    pub mean_fitness: f64,
    /// Population standard deviation of fitness.
    pub fitness_std_dev: f64,
    /// Number of candidates.
    pub population_size: usize,
}

impl PopulationStats {
    /// Computes the statistics of `scores`.
    ///
    /// An empty slice yields the direction's worst score everywhere and a
    /// zero spread.
    pub fn from_scores(scores: &[f64], direction: FitnessDirection) -> Self {
        if scores.is_empty() {
            return Self {
                best_fitness: direction.worst(),
                worst_fitness: direction.worst(),
                mean_fitness: direction.worst(),
                fitness_std_dev: 0.0,
                population_size: 0,
            };
        }

        let n = scores.len() as f64;
        let mean = scores.iter().sum::<f64>() / n;
        let variance = scores.iter().map(|f| (f - mean).powi(2)).sum::<f64>() / n;

        let mut best = scores[0];
        let mut worst = scores[0];
        for &f in &scores[1..] {
            if direction.is_better(f, best) {
                best = f;
            }
            if direction.is_better(worst, f) {
                worst = f;
            }
        }

        Self {
            best_fitness: best,
            worst_fitness: worst,
            mean_fitness: mean,
            fitness_std_dev: variance.sqrt(),
            population_size: scores.len(),
        }
    }
}

/// Snapshot of a generation, handed to observers and termination
/// conditions.
#[derive(Debug, Clone)]
pub struct PopulationData<T> {
    /// The fittest candidate of this generation.
    pub best_candidate: T,
    /// Fitness statistics.
    pub stats: PopulationStats,
    /// Whether higher or lower fitness is better in this run.
    pub direction: FitnessDirection,
    /// Number of elites carried between generations.
    pub elite_count: usize,
    /// Generation number; the initial population is generation 0.
    pub generation: usize,
    /// Time since the run started.
    pub elapsed: Duration,
}

impl<T: Clone> PopulationData<T> {
    /// Builds a snapshot from a population sorted fittest first.
    ///
    /// # Panics
    /// Panics if `population` is empty.
    pub(crate) fn from_sorted(
        population: &[EvaluatedCandidate<T>],
        direction: FitnessDirection,
        elite_count: usize,
        generation: usize,
        elapsed: Duration,
    ) -> Self {
        let scores: Vec<f64> = population.iter().map(|e| e.fitness).collect();
        Self {
            best_candidate: population[0].candidate.clone(),
            stats: PopulationStats::from_scores(&scores, direction),
            direction,
            elite_count,
            generation,
            elapsed,
        }
    }
}

impl<T> PopulationData<T> {
    /// Fitness of the fittest candidate.
    pub fn best_fitness(&self) -> f64 {
        self.stats.best_fitness
    }

    /// Mean fitness of the generation.
    pub fn mean_fitness(&self) -> f64 {
        self.stats.mean_fitness
    }

    /// Standard deviation of the generation's fitness.
    pub fn fitness_std_dev(&self) -> f64 {
        self.stats.fitness_std_dev
    }

    /// Number of candidates in the generation.
    pub fn population_size(&self) -> usize {
        self.stats.population_size
    }
}

/// Outcome of a completed run.
#[derive(Debug, Clone)]
pub struct EvolutionResult<T> {
    /// The fittest candidate of the final generation.
    pub best_candidate: T,
    /// Its fitness.
    pub best_fitness: f64,
    /// Number of breeding generations executed after generation 0.
    pub generations: usize,
    /// Final population, fittest first.
    pub population: Vec<EvaluatedCandidate<T>>,
    /// Best fitness of each generation, starting with generation 0.
    pub fitness_history: Vec<f64>,
    /// Wall-clock duration of the run.
    pub elapsed: Duration,
    /// Indices of the termination conditions that were satisfied.
    pub satisfied_conditions: Vec<usize>,
    /// Snapshots discarded under [`ObserverPolicy::DropNewest`](super::ObserverPolicy::DropNewest).
    pub dropped_snapshots: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random::{create_rng, RandomSource};

    struct Counter;

    impl CandidateFactory<u32> for Counter {
        fn generate_random_candidate(&self, rng: &mut dyn RngCore) -> u32 {
            100 + rng.next_index(10) as u32
        }
    }

    #[test]
    fn test_seeds_come_first() {
        let pop = Counter
            .generate_initial_population(5, vec![1, 2], &mut create_rng(42))
            .unwrap();
        assert_eq!(pop.len(), 5);
        assert_eq!(&pop[..2], &[1, 2]);
        assert!(pop[2..].iter().all(|&c| (100..110).contains(&c)));
    }

    #[test]
    fn test_too_many_seeds() {
        let err = Counter
            .generate_initial_population(1, vec![1, 2], &mut create_rng(42))
            .unwrap_err();
        assert!(matches!(err, EvolutionError::InvalidConfiguration(_)));
    }

    #[test]
    fn test_fn_factory() {
        let factory = FnFactory::new(|rng: &mut dyn RngCore| rng.next_unit());
        let pop = factory
            .generate_initial_population(3, Vec::new(), &mut create_rng(1))
            .unwrap();
        assert_eq!(pop.len(), 3);
        assert!(pop.iter().all(|x| (0.0..1.0).contains(x)));
    }

    #[test]
    fn test_stats() {
        let stats = PopulationStats::from_scores(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0], FitnessDirection::Natural);
        assert_eq!(stats.best_fitness, 9.0);
        assert_eq!(stats.worst_fitness, 2.0);
        assert!((stats.mean_fitness - 5.0).abs() < 1e-12);
        assert!((stats.fitness_std_dev - 2.0).abs() < 1e-12);
        assert_eq!(stats.population_size, 8);

        let stats = PopulationStats::from_scores(&[3.0, 1.0, 2.0], FitnessDirection::Inverted);
        assert_eq!(stats.best_fitness, 1.0);
        assert_eq!(stats.worst_fitness, 3.0);
    }

    #[test]
    fn test_snapshot_from_sorted() {
        let pop = vec![
            EvaluatedCandidate::new("b", 3.0),
            EvaluatedCandidate::new("a", 1.0),
        ];
        let data = PopulationData::from_sorted(&pop, FitnessDirection::Natural, 1, 4, Duration::from_secs(2));
        assert_eq!(data.best_candidate, "b");
        assert_eq!(data.best_fitness(), 3.0);
        assert_eq!(data.mean_fitness(), 2.0);
        assert_eq!(data.population_size(), 2);
        assert_eq!(data.generation, 4);
        assert_eq!(data.elite_count, 1);
    }

    #[test]
    fn test_phase_display() {
        assert_eq!(EnginePhase::CheckingTermination.to_string(), "checking termination");
    }
}
