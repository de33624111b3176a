//! Bounded-pool evaluation of whole generations.

use super::{EvaluatedCandidate, FitnessEvaluator};
use crate::error::{EvolutionError, Result};
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};

/// Scores populations on a dedicated worker pool.
///
/// With one thread (or [`sequential`](Self::sequential)) candidates are
/// scored inline on the calling thread and no pool is created.
pub struct EvaluationScheduler {
    pool: Option<ThreadPool>,
}

impl EvaluationScheduler {
    /// Creates a scheduler with `threads` workers.
    ///
    /// `0` sizes the pool to the available hardware concurrency.
    pub fn new(threads: usize) -> Result<Self> {
        if threads == 1 {
            return Ok(Self::sequential());
        }
        let pool = ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("u-evolve-eval-{i}"))
            .build()
            .map_err(|e| {
                EvolutionError::InvalidConfiguration(format!("cannot build evaluation pool: {e}"))
            })?;
        Ok(Self { pool: Some(pool) })
    }

    /// A scheduler that evaluates on the calling thread.
    pub fn sequential() -> Self {
        Self { pool: None }
    }

    /// Number of workers scoring candidates concurrently.
    pub fn threads(&self) -> usize {
        self.pool.as_ref().map_or(1, |p| p.current_num_threads())
    }

    /// Scores every candidate and pairs it with its fitness, preserving
    /// input order.
    pub fn evaluate<T>(
        &self,
        population: Vec<T>,
        evaluator: &dyn FitnessEvaluator<T>,
    ) -> Result<Vec<EvaluatedCandidate<T>>>
    where
        T: Send + Sync + fmt::Debug,
    {
        let scores = self.score(&population, 0, evaluator)?;
        Ok(population
            .into_iter()
            .zip(scores)
            .map(|(candidate, fitness)| EvaluatedCandidate::new(candidate, fitness))
            .collect())
    }

    /// Scores `population[from..]`, passing the whole slice as context.
    ///
    /// Returns one score per scored candidate, in order. If several
    /// candidates fail, the one with the lowest index is reported.
    pub fn score<T>(
        &self,
        population: &[T],
        from: usize,
        evaluator: &dyn FitnessEvaluator<T>,
    ) -> Result<Vec<f64>>
    where
        T: Sync + fmt::Debug,
    {
        let range = from.min(population.len())..population.len();
        let outcomes: Vec<Result<f64>> = match &self.pool {
            Some(pool) => pool.install(|| {
                range
                    .into_par_iter()
                    .map(|i| evaluate_one(evaluator, population, i))
                    .collect()
            }),
            None => range
                .map(|i| evaluate_one(evaluator, population, i))
                .collect(),
        };

        outcomes.into_iter().collect::<Result<Vec<f64>>>().inspect_err(|e| {
            log::warn!("{e}");
        })
    }
}

impl Default for EvaluationScheduler {
    fn default() -> Self {
        Self::new(0).unwrap_or_else(|_| Self::sequential())
    }
}

impl fmt::Debug for EvaluationScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EvaluationScheduler")
            .field("threads", &self.threads())
            .finish()
    }
}

fn evaluate_one<T: fmt::Debug>(
    evaluator: &dyn FitnessEvaluator<T>,
    population: &[T],
    index: usize,
) -> Result<f64> {
    let candidate = &population[index];
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
        evaluator.fitness(candidate, population)
    }));

    let reason = match outcome {
        Ok(Ok(fitness)) if !fitness.is_nan() => return Ok(fitness),
        Ok(Ok(_)) => "fitness is NaN".to_string(),
        Ok(Err(e)) => e.to_string(),
        Err(payload) => format!("evaluator panicked: {}", panic_message(payload.as_ref())),
    };

    Err(EvolutionError::EvaluationFailure {
        index,
        candidate: format!("{candidate:?}"),
        reason,
    })
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.as_str()
    } else {
        "unknown panic"
    }
}
