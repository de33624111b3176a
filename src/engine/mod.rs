//! Generational evolution engine.
//!
//! Evolves a population of user-defined candidates: the user supplies a
//! [`CandidateFactory`], a [`FitnessEvaluator`](crate::evaluation::FitnessEvaluator)
//! and an operator pipeline; the engine runs the loop.
//!
//! # Algorithm
//!
//! 1. Create the initial population (seed candidates first) and evaluate it.
//!    This is generation 0.
//! 2. Keep the `elite_count` fittest candidates unchanged.
//! 3. Select `population_size - elite_count` parents.
//! 4. Apply the operator pipeline to the parents.
//! 5. Evaluate the offspring, merge them with the elites and sort.
//! 6. Notify observers, then stop if any termination condition holds;
//!    otherwise return to step 2.
//!
//! Only evaluation runs in parallel. Selection, variation and bookkeeping
//! happen on the calling thread and draw from one seeded generator, so a
//! seeded run is reproducible whatever the number of evaluation threads.
//!
//! # References
//!
//! - Holland (1975), *Adaptation in Natural and Artificial Systems*
//! - Goldberg (1989), *Genetic Algorithms in Search, Optimization and
//!   Machine Learning*
//! - De Jong (1975), "An Analysis of the Behavior of a Class of Genetic
//!   Adaptive Systems" (elitism)

mod config;
mod observer;
mod runner;
mod termination;
mod types;

pub use config::{EngineConfig, ObserverPolicy};
pub use observer::{EvolutionObserver, FnObserver};
pub use runner::EvolutionEngine;
pub use termination::{
    ElapsedTime, GenerationCount, Stagnation, TargetFitness, TerminationCondition, UserAbort,
};
pub use types::{
    CandidateFactory, EnginePhase, EvolutionResult, FnFactory, PopulationData, PopulationStats,
};
