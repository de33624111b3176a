//! Termination conditions.
//!
//! The engine asks every condition after each generation, including
//! generation 0, and stops as soon as at least one is satisfied. All
//! conditions are consulted every time so stateful ones stay current.

use super::types::PopulationData;
use crate::error::{EvolutionError, Result};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Decides when a run is over.
pub trait TerminationCondition<T>: Send + Sync + fmt::Debug {
    /// Whether the run should stop after the generation described by `data`.
    fn should_terminate(&self, data: &PopulationData<T>) -> bool;

    /// Clears per-run state. Called by the engine before every run.
    fn reset(&self) {}
}

/// Stops once `generations` breeding generations have run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GenerationCount {
    generations: usize,
}

impl GenerationCount {
    /// Fails if `generations` is zero.
    pub fn new(generations: usize) -> Result<Self> {
        if generations == 0 {
            return Err(EvolutionError::InvalidConfiguration(
                "generation count must be at least 1".into(),
            ));
        }
        Ok(Self { generations })
    }
}

impl<T> TerminationCondition<T> for GenerationCount {
    fn should_terminate(&self, data: &PopulationData<T>) -> bool {
        data.generation >= self.generations
    }
}

/// Stops once the run has taken at least `limit` of wall-clock time.
///
/// Checked between generations, so a run may overshoot by one generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ElapsedTime {
    limit: Duration,
}

impl ElapsedTime {
    /// Fails if `limit` is zero.
    pub fn new(limit: Duration) -> Result<Self> {
        if limit.is_zero() {
            return Err(EvolutionError::InvalidConfiguration(
                "time limit must be positive".into(),
            ));
        }
        Ok(Self { limit })
    }
}

impl<T> TerminationCondition<T> for ElapsedTime {
    fn should_terminate(&self, data: &PopulationData<T>) -> bool {
        data.elapsed >= self.limit
    }
}

/// Stops once the best fitness reaches `target` (at or above it for
/// natural fitness, at or below it for inverted fitness).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TargetFitness {
    target: f64,
}

impl TargetFitness {
    /// Fails if `target` is NaN.
    pub fn new(target: f64) -> Result<Self> {
        if target.is_nan() {
            return Err(EvolutionError::InvalidConfiguration(
                "target fitness must not be NaN".into(),
            ));
        }
        Ok(Self { target })
    }
}

impl<T> TerminationCondition<T> for TargetFitness {
    fn should_terminate(&self, data: &PopulationData<T>) -> bool {
        let best = data.best_fitness();
        if data.direction.is_natural() {
            best >= self.target
        } else {
            best <= self.target
        }
    }
}

/// Stops when the tracked fitness has not improved for `generations`
/// consecutive generations.
///
/// Tracks the best fitness by default, or the mean fitness with
/// [`on_mean`](Self::on_mean).
#[derive(Debug)]
pub struct Stagnation {
    generations: usize,
    use_mean: bool,
    // (fittest value seen, generation it was seen in)
    state: Mutex<Option<(f64, usize)>>,
}

impl Stagnation {
    /// Fails if `generations` is zero.
    pub fn new(generations: usize) -> Result<Self> {
        if generations == 0 {
            return Err(EvolutionError::InvalidConfiguration(
                "stagnation limit must be at least 1".into(),
            ));
        }
        Ok(Self {
            generations,
            use_mean: false,
            state: Mutex::new(None),
        })
    }

    /// Tracks the mean fitness instead of the best.
    pub fn on_mean(mut self) -> Self {
        self.use_mean = true;
        self
    }
}

impl<T> TerminationCondition<T> for Stagnation {
    fn should_terminate(&self, data: &PopulationData<T>) -> bool {
        let value = if self.use_mean {
            data.mean_fitness()
        } else {
            data.best_fitness()
        };
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        let since = match *state {
            Some((best, since)) if !data.direction.is_better(value, best) => since,
            _ => {
                *state = Some((value, data.generation));
                data.generation
            }
        };
        data.generation.saturating_sub(since) >= self.generations
    }

    fn reset(&self) {
        *self.state.lock().unwrap_or_else(|e| e.into_inner()) = None;
    }
}

/// Stops when [`abort`](Self::abort) is called, from any thread.
///
/// Clones share the same flag. The engine never clears it: an abort
/// requested before a run starts stops that run at generation 0, and a flag
/// passed to [`from_flag`](Self::from_flag) stays owned by the caller. Call
/// [`clear`](Self::clear) to rearm the condition.
#[derive(Debug, Clone, Default)]
pub struct UserAbort {
    aborted: Arc<AtomicBool>,
}

impl UserAbort {
    /// Creates a condition that is not yet aborted.
    pub fn new() -> Self {
        Self::default()
    }

    /// Wraps an existing cancellation flag.
    pub fn from_flag(flag: Arc<AtomicBool>) -> Self {
        Self { aborted: flag }
    }

    /// Requests the run to stop after the current generation.
    pub fn abort(&self) {
        self.aborted.store(true, Ordering::Relaxed);
    }

    /// Withdraws a pending abort request.
    pub fn clear(&self) {
        self.aborted.store(false, Ordering::Relaxed);
    }

    /// Whether an abort was requested.
    pub fn is_aborted(&self) -> bool {
        self.aborted.load(Ordering::Relaxed)
    }
}

impl<T> TerminationCondition<T> for UserAbort {
    fn should_terminate(&self, _data: &PopulationData<T>) -> bool {
        self.is_aborted()
    }
}
