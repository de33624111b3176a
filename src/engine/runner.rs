//! The generational loop.
//!
//! [`EvolutionEngine`] orchestrates the complete evolutionary process:
//! initialization → evaluation → selection → variation → evaluation → repeat,
//! until a termination condition is satisfied.

use super::config::EngineConfig;
use super::observer::{EvolutionObserver, ObserverDispatcher};
use super::termination::TerminationCondition;
use super::types::{CandidateFactory, EnginePhase, EvolutionResult, PopulationData};
use crate::error::{EvolutionError, Result};
use crate::evaluation::{
    sort_fittest_first, EvaluatedCandidate, EvaluationScheduler, FitnessDirection, FitnessEvaluator,
};
use crate::operators::EvolutionaryOperator;
use crate::random::rng_from_seed;
use crate::selection::{select, SelectionStrategy};
use rand::rngs::StdRng;
use std::fmt;
use std::time::Instant;

/// Drives a population through successive generations.
///
/// # Usage
///
/// ```
/// use u_evolve::engine::{EngineConfig, EvolutionEngine, FnFactory, GenerationCount};
/// use u_evolve::evaluation::{FitnessDirection, FnEvaluator};
/// use u_evolve::numbers::{ConstantGenerator, Probability};
/// use u_evolve::operators::{Mutation, StringMutation};
/// use u_evolve::random::RandomSource;
///
/// const ALPHABET: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZ ";
/// let letters: Vec<char> = ALPHABET.chars().collect();
///
/// let factory = FnFactory::new(move |rng: &mut dyn rand::RngCore| {
///     (0..5).map(|_| letters[rng.next_index(letters.len())]).collect::<String>()
/// });
/// let mutation = Mutation::new(
///     StringMutation::new(ALPHABET).unwrap(),
///     ConstantGenerator::new(1usize),
///     Probability::new(0.5).unwrap(),
/// )
/// .unwrap();
/// let evaluator = FnEvaluator::new(FitnessDirection::Natural, |s: &String, _: &[String]| {
///     s.chars().zip("HELLO".chars()).filter(|(a, b)| a == b).count() as f64
/// });
///
/// let config = EngineConfig::default().with_population_size(50).with_elite_count(2).with_seed(1);
/// let engine = EvolutionEngine::new(factory, mutation, evaluator, config).unwrap();
/// let best = engine.evolve(&[&GenerationCount::new(20).unwrap()]).unwrap();
/// assert_eq!(best.chars().count(), 5);
/// ```
pub struct EvolutionEngine<T> {
    factory: Box<dyn CandidateFactory<T>>,
    operator: Box<dyn EvolutionaryOperator<T>>,
    evaluator: Box<dyn FitnessEvaluator<T>>,
    selection: Box<dyn SelectionStrategy>,
    observers: Vec<Box<dyn EvolutionObserver<T>>>,
    scheduler: EvaluationScheduler,
    config: EngineConfig,
}

impl<T> EvolutionEngine<T>
where
    T: Clone + Send + Sync + fmt::Debug + 'static,
{
    /// Creates an engine.
    ///
    /// Validates `config` and builds the evaluation pool, so every
    /// configuration error surfaces here rather than mid-run.
    pub fn new<F, O, E>(factory: F, operator: O, evaluator: E, config: EngineConfig) -> Result<Self>
    where
        F: CandidateFactory<T> + 'static,
        O: EvolutionaryOperator<T> + 'static,
        E: FitnessEvaluator<T> + 'static,
    {
        config.validate()?;
        let scheduler = if config.parallel {
            EvaluationScheduler::new(config.threads)?
        } else {
            EvaluationScheduler::sequential()
        };
        Ok(Self {
            factory: Box::new(factory),
            operator: Box::new(operator),
            evaluator: Box::new(evaluator),
            selection: Box::new(config.selection),
            observers: Vec::new(),
            scheduler,
            config,
        })
    }

    /// Replaces the configured [`Selection`](crate::selection::Selection)
    /// with a custom strategy.
    pub fn with_selection_strategy<S: SelectionStrategy + 'static>(mut self, strategy: S) -> Self {
        self.selection = Box::new(strategy);
        self
    }

    /// Registers an observer for all subsequent runs.
    pub fn add_observer<O: EvolutionObserver<T> + 'static>(&mut self, observer: O) {
        self.observers.push(Box::new(observer));
    }

    /// The engine's configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Runs until a condition is satisfied and returns the fittest candidate.
    pub fn evolve(&self, conditions: &[&dyn TerminationCondition<T>]) -> Result<T> {
        self.evolve_population(Vec::new(), conditions)
            .map(|result| result.best_candidate)
    }

    /// Runs from an initial population that starts with `seeds` and returns
    /// the full outcome.
    ///
    /// # Errors
    ///
    /// - [`EvolutionError::NoTerminationCondition`] if `conditions` is empty
    /// - [`EvolutionError::InvalidConfiguration`] if there are more seeds
    ///   than population slots
    /// - [`EvolutionError::InvalidPopulationSize`] if an operator changes the
    ///   number of candidates
    /// - [`EvolutionError::EvaluationFailure`] if a fitness evaluation fails
    /// - any error returned by an operator
    pub fn evolve_population(
        &self,
        seeds: Vec<T>,
        conditions: &[&dyn TerminationCondition<T>],
    ) -> Result<EvolutionResult<T>> {
        if conditions.is_empty() {
            return Err(EvolutionError::NoTerminationCondition);
        }
        self.config.validate()?;
        for condition in conditions {
            condition.reset();
        }

        let mut rng = rng_from_seed(self.config.seed);
        log::info!(
            "evolution started: population {}, elites {}, {} evaluation thread(s)",
            self.config.population_size,
            self.config.elite_count,
            self.scheduler.threads()
        );

        std::thread::scope(|scope| {
            let mut dispatcher = ObserverDispatcher::start(
                scope,
                &self.observers,
                self.config.observer_capacity,
                self.config.observer_policy,
            );
            let outcome = self.run(seeds, conditions, &mut rng, &mut dispatcher);
            let dropped = dispatcher.finish();
            outcome.map(|mut result| {
                result.dropped_snapshots = dropped;
                result
            })
        })
    }

    fn run(
        &self,
        seeds: Vec<T>,
        conditions: &[&dyn TerminationCondition<T>],
        rng: &mut StdRng,
        dispatcher: &mut ObserverDispatcher<'_, T>,
    ) -> Result<EvolutionResult<T>> {
        let start = Instant::now();
        let direction = self.evaluator.direction();
        let elite_count = self.config.elite_count;

        // 1. Initialize and evaluate generation 0
        enter(EnginePhase::Initializing, 0);
        let initial = self
            .factory
            .generate_initial_population(self.config.population_size, seeds, rng)?;
        enter(EnginePhase::Evaluating, 0);
        let mut population = self.scheduler.evaluate(initial, self.evaluator.as_ref())?;
        sort_fittest_first(&mut population, direction);

        let mut fitness_history = Vec::new();
        let mut generation = 0;

        // 2. Generational loop
        let satisfied_conditions = loop {
            let data = PopulationData::from_sorted(
                &population,
                direction,
                elite_count,
                generation,
                start.elapsed(),
            );
            fitness_history.push(data.best_fitness());
            log::debug!(
                "generation {generation}: best {:.6}, mean {:.6}, std dev {:.6}",
                data.best_fitness(),
                data.mean_fitness(),
                data.fitness_std_dev()
            );

            enter(EnginePhase::CheckingTermination, generation);
            let satisfied: Vec<usize> = conditions
                .iter()
                .enumerate()
                .filter(|(_, condition)| condition.should_terminate(&data))
                .map(|(i, _)| i)
                .collect();

            if dispatcher.is_active() {
                dispatcher.notify(data);
            }
            if !satisfied.is_empty() {
                break satisfied;
            }

            population = self.breed(population, direction, generation + 1, rng)?;
            generation += 1;
        };
        enter(EnginePhase::Terminated, generation);

        let best = &population[0];
        let elapsed = start.elapsed();
        log::info!(
            "evolution finished after {generation} generation(s) in {elapsed:?}: best fitness {}",
            best.fitness
        );

        Ok(EvolutionResult {
            best_candidate: best.candidate.clone(),
            best_fitness: best.fitness,
            generations: generation,
            population,
            fitness_history,
            elapsed,
            satisfied_conditions,
            dropped_snapshots: 0,
        })
    }

    /// Produces the next generation from one sorted fittest first.
    fn breed(
        &self,
        population: Vec<EvaluatedCandidate<T>>,
        direction: FitnessDirection,
        generation: usize,
        rng: &mut StdRng,
    ) -> Result<Vec<EvaluatedCandidate<T>>> {
        let size = population.len();
        let elite_count = self.config.elite_count.min(size);

        enter(EnginePhase::Selecting, generation);
        let parents = select(
            self.selection.as_ref(),
            &population,
            direction,
            size - elite_count,
            rng,
        );

        enter(EnginePhase::Varying, generation);
        let offspring = self.operator.apply(parents, rng)?;
        if offspring.len() != size - elite_count {
            return Err(EvolutionError::InvalidPopulationSize {
                size: elite_count + offspring.len(),
                elites: elite_count,
            });
        }

        // Elites keep their scores; offspring are scored with the elites
        // as part of their population context.
        let mut elites = population;
        elites.truncate(elite_count);
        let mut candidates: Vec<T> = elites.iter().map(|e| e.candidate.clone()).collect();
        candidates.extend(offspring);

        enter(EnginePhase::Evaluating, generation);
        let scores = self
            .scheduler
            .score(&candidates, elite_count, self.evaluator.as_ref())?;

        let mut next = elites;
        next.extend(
            candidates
                .into_iter()
                .skip(elite_count)
                .zip(scores)
                .map(|(candidate, fitness)| EvaluatedCandidate::new(candidate, fitness)),
        );
        sort_fittest_first(&mut next, direction);
        Ok(next)
    }
}

impl<T> fmt::Debug for EvolutionEngine<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EvolutionEngine")
            .field("config", &self.config)
            .field("selection", &self.selection)
            .field("observers", &self.observers.len())
            .field("scheduler", &self.scheduler)
            .finish()
    }
}

fn enter(phase: EnginePhase, generation: usize) {
    log::debug!("generation {generation}: {phase}");
}

// ============================================================================
// Tests
// ============================================================================
