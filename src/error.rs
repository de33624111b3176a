//! Error taxonomy shared by every component of the engine.
//!
//! Configuration problems are reported when an object is built, so a
//! misconfigured run never starts. Structural problems abort the current
//! generation and evaluation failures abort the whole run.

/// Errors produced by the evolution engine and its building blocks.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EvolutionError {
    /// Bad operator, generator, strategy, or engine parameters.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// A call received an argument it cannot work with.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Two candidates paired by an operator are structurally incompatible.
    #[error("incompatible candidates at positions {first} and {second}: {reason}")]
    IncompatibleCandidates {
        /// Population index of the first candidate of the pairing.
        first: usize,
        /// Population index of the second candidate of the pairing.
        second: usize,
        /// What did not match.
        reason: String,
    },

    /// A permutation generator was asked for more orderings than exist.
    #[error("permutation sequence exhausted")]
    ExhaustedSequence,

    /// A fitness evaluation failed; the run cannot continue.
    #[error("fitness evaluation failed for candidate {index} ({candidate}): {reason}")]
    EvaluationFailure {
        /// Population index of the failing candidate.
        index: usize,
        /// Debug rendering of the failing candidate.
        candidate: String,
        /// The error or panic message raised by the evaluator.
        reason: String,
    },

    /// `evolve` was called without any termination condition.
    #[error("at least one termination condition is required")]
    NoTerminationCondition,

    /// The population cannot hold the requested elites, is empty, or an
    /// operator changed its size.
    #[error("invalid population size {size} (elite count {elites})")]
    InvalidPopulationSize {
        /// Population size seen.
        size: usize,
        /// Elite count configured for the run.
        elites: usize,
    },
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, EvolutionError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_the_problem() {
        let err = EvolutionError::IncompatibleCandidates {
            first: 0,
            second: 1,
            reason: "lengths 5 and 8 differ".into(),
        };
        assert_eq!(
            err.to_string(),
            "incompatible candidates at positions 0 and 1: lengths 5 and 8 differ"
        );

        let err = EvolutionError::InvalidPopulationSize { size: 3, elites: 4 };
        assert!(err.to_string().contains("size 3"));
    }
}
