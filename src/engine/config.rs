//! Engine configuration.
//!
//! [`EngineConfig`] holds all parameters that control the generational loop
//! apart from the termination conditions, which are passed per run.

use crate::error::{EvolutionError, Result};
use crate::selection::Selection;

/// What the engine does when the observer queue is full.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ObserverPolicy {
    /// Wait for the observers to catch up. No snapshot is lost.
    #[default]
    Block,
    /// Discard the new snapshot and keep evolving.
    DropNewest,
}

/// Configuration for the [`EvolutionEngine`](super::EvolutionEngine).
///
/// # Defaults
///
/// ```
/// use u_evolve::engine::EngineConfig;
///
/// let config = EngineConfig::default();
/// assert_eq!(config.population_size, 100);
/// assert_eq!(config.elite_count, 0);
/// ```
///
/// # Builder Pattern
///
/// ```
/// use u_evolve::engine::EngineConfig;
/// use u_evolve::selection::Selection;
///
/// let config = EngineConfig::default()
///     .with_population_size(200)
///     .with_elite_count(10)
///     .with_selection(Selection::Rank)
///     .with_seed(42);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EngineConfig {
    /// Number of candidates in every generation.
    ///
    /// Larger populations increase diversity but slow down each generation.
    /// Typical range: 50–500.
    pub population_size: usize,

    /// Number of fittest candidates copied unchanged into the next
    /// generation. Elites are not re-evaluated.
    pub elite_count: usize,

    /// Parent selection strategy.
    pub selection: Selection,

    /// Whether to evaluate candidates on a worker pool.
    pub parallel: bool,

    /// Worker pool size. `0` uses the available hardware concurrency.
    ///
    /// Ignored when `parallel` is false.
    pub threads: usize,

    /// Random seed for reproducibility.
    ///
    /// `None` seeds each run from OS entropy.
    pub seed: Option<u64>,

    /// Maximum number of snapshots queued for observers.
    pub observer_capacity: usize,

    /// Behaviour when the observer queue is full.
    pub observer_policy: ObserverPolicy,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            population_size: 100,
            elite_count: 0,
            selection: Selection::default(),
            parallel: true,
            threads: 0,
            seed: None,
            observer_capacity: 64,
            observer_policy: ObserverPolicy::Block,
        }
    }
}

impl EngineConfig {
    /// Sets the population size.
    pub fn with_population_size(mut self, n: usize) -> Self {
        self.population_size = n;
        self
    }

    /// Sets the number of elites.
    pub fn with_elite_count(mut self, n: usize) -> Self {
        self.elite_count = n;
        self
    }

    /// Sets the selection strategy.
    pub fn with_selection(mut self, selection: Selection) -> Self {
        self.selection = selection;
        self
    }

    /// Enables or disables parallel evaluation.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Sets the worker pool size (`0` for the hardware default).
    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads;
        self
    }

    /// Sets the random seed for reproducibility.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Sets the observer queue capacity.
    pub fn with_observer_capacity(mut self, capacity: usize) -> Self {
        self.observer_capacity = capacity;
        self
    }

    /// Sets the observer back-pressure policy.
    pub fn with_observer_policy(mut self, policy: ObserverPolicy) -> Self {
        self.observer_policy = policy;
        self
    }

    /// Preset for quick runs: small population, light elitism.
    ///
    /// - Population: 50, Elites: 2, Tournament size: 2
    pub fn fast() -> Self {
        Self {
            population_size: 50,
            elite_count: 2,
            selection: Selection::tournament(2),
            ..Self::default()
        }
    }

    /// Preset balancing solution quality against run time.
    ///
    /// - Population: 100, Elites: 5, Tournament size: 3
    pub fn balanced() -> Self {
        Self {
            population_size: 100,
            elite_count: 5,
            selection: Selection::tournament(3),
            ..Self::default()
        }
    }

    /// Preset for long runs: large population, stronger pressure.
    ///
    /// - Population: 250, Elites: 10, Tournament size: 4
    pub fn thorough() -> Self {
        Self {
            population_size: 250,
            elite_count: 10,
            selection: Selection::tournament(4),
            ..Self::default()
        }
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.population_size < 1 || self.elite_count > self.population_size {
            return Err(EvolutionError::InvalidPopulationSize {
                size: self.population_size,
                elites: self.elite_count,
            });
        }
        if self.observer_capacity == 0 {
            return Err(EvolutionError::InvalidConfiguration(
                "observer_capacity must be at least 1".into(),
            ));
        }
        self.selection.validate()
    }
}
