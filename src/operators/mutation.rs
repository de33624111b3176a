//! Single-candidate perturbation.
//!
//! [`Mutation`] gates each candidate independently with its own probability
//! draw and takes the perturbation magnitude from a [`NumberGenerator`]. A
//! [`Mutate`] implementation supplies the representation-specific move.

use super::EvolutionaryOperator;
use crate::error::{EvolutionError, Result};
use crate::numbers::{NumberGenerator, Probability};
use crate::random::RandomSource;
use rand::RngCore;
use rand_distr::{Distribution, Normal};
use std::fmt;
use std::marker::PhantomData;

/// Representation-specific half of a mutation operator.
pub trait Mutate<T>: Send + Sync {
    /// The parameter drawn for each mutated candidate (a count, a spread, ...).
    type Magnitude;

    /// Rejects magnitude generators that could never perturb anything.
    ///
    /// Receives the generator's lower and upper bounds, if known.
    fn check_magnitude(
        &self,
        _lower_bound: Option<&Self::Magnitude>,
        _upper_bound: Option<&Self::Magnitude>,
    ) -> std::result::Result<(), String> {
        Ok(())
    }

    /// Perturbs one candidate.
    fn mutate(&self, candidate: T, magnitude: Self::Magnitude, rng: &mut dyn RngCore) -> T;
}

/// Probability-gated, per-candidate mutation.
pub struct Mutation<T, M: Mutate<T>> {
    mutator: M,
    magnitude: Box<dyn NumberGenerator<M::Magnitude>>,
    probability: Probability,
    _candidate: PhantomData<fn(T) -> T>,
}

impl<T, M: Mutate<T>> Mutation<T, M> {
    /// Creates a mutation operator.
    ///
    /// Fails with [`EvolutionError::InvalidConfiguration`] if `probability`
    /// is zero or the magnitude generator is rejected by the mutator.
    pub fn new<G>(mutator: M, magnitude: G, probability: Probability) -> Result<Self>
    where
        G: NumberGenerator<M::Magnitude> + 'static,
    {
        if probability.value() <= 0.0 {
            return Err(EvolutionError::InvalidConfiguration(
                "mutation probability must be greater than zero".into(),
            ));
        }
        mutator
            .check_magnitude(magnitude.lower_bound().as_ref(), magnitude.upper_bound().as_ref())
            .map_err(EvolutionError::InvalidConfiguration)?;
        Ok(Self {
            mutator,
            magnitude: Box::new(magnitude),
            probability,
            _candidate: PhantomData,
        })
    }

    /// The per-candidate application probability.
    pub fn probability(&self) -> Probability {
        self.probability
    }
}

impl<T: Send, M: Mutate<T>> EvolutionaryOperator<T> for Mutation<T, M> {
    fn apply(&self, population: Vec<T>, rng: &mut dyn RngCore) -> Result<Vec<T>> {
        Ok(population
            .into_iter()
            .map(|candidate| {
                if self.probability.next_event(rng) {
                    let magnitude = self.magnitude.next_value(rng);
                    self.mutator.mutate(candidate, magnitude, rng)
                } else {
                    candidate
                }
            })
            .collect())
    }
}

impl<T, M: Mutate<T> + fmt::Debug> fmt::Debug for Mutation<T, M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mutation")
            .field("mutator", &self.mutator)
            .field("probability", &self.probability)
            .finish()
    }
}

/// Counts are rejected only when the generator can never exceed 0.
fn require_positive_count(upper_bound: Option<&usize>) -> std::result::Result<(), String> {
    match upper_bound {
        Some(0) => Err("mutation count must be able to reach 1, generator never exceeds 0".into()),
        _ => Ok(()),
    }
}

/// Replaces `magnitude` randomly chosen characters with letters drawn from
/// an alphabet. Positions may repeat, and a replacement may equal the
/// original character.
#[derive(Debug, Clone)]
pub struct StringMutation {
    alphabet: Vec<char>,
}

impl StringMutation {
    /// Creates the mutator. The alphabet must not be empty.
    pub fn new(alphabet: &str) -> Result<Self> {
        let alphabet: Vec<char> = alphabet.chars().collect();
        if alphabet.is_empty() {
            return Err(EvolutionError::InvalidConfiguration(
                "mutation alphabet must not be empty".into(),
            ));
        }
        Ok(Self { alphabet })
    }
}

impl Mutate<String> for StringMutation {
    type Magnitude = usize;

    fn check_magnitude(
        &self,
        _lower_bound: Option<&usize>,
        upper_bound: Option<&usize>,
    ) -> std::result::Result<(), String> {
        require_positive_count(upper_bound)
    }

    fn mutate(&self, candidate: String, magnitude: usize, rng: &mut dyn RngCore) -> String {
        let mut chars: Vec<char> = candidate.chars().collect();
        if chars.is_empty() {
            return candidate;
        }
        for _ in 0..magnitude {
            let pos = rng.next_index(chars.len());
            chars[pos] = self.alphabet[rng.next_index(self.alphabet.len())];
        }
        chars.into_iter().collect()
    }
}

/// Performs `magnitude` swaps of a random element with its successor
/// (wrapping at the end). Only the order changes; elements are conserved.
#[derive(Debug, Clone, Copy, Default)]
pub struct ListOrderMutation;

impl<G: Send> Mutate<Vec<G>> for ListOrderMutation {
    type Magnitude = usize;

    fn check_magnitude(
        &self,
        _lower_bound: Option<&usize>,
        upper_bound: Option<&usize>,
    ) -> std::result::Result<(), String> {
        require_positive_count(upper_bound)
    }

    fn mutate(&self, mut candidate: Vec<G>, magnitude: usize, rng: &mut dyn RngCore) -> Vec<G> {
        let n = candidate.len();
        if n < 2 {
            return candidate;
        }
        for _ in 0..magnitude {
            let i = rng.next_index(n);
            candidate.swap(i, (i + 1) % n);
        }
        candidate
    }
}

/// Adds Normal(0, σ) noise to every gene of a real vector, where σ is the
/// drawn magnitude. Results are clamped to the optional bounds.
#[derive(Debug, Clone, Copy, Default)]
pub struct GaussianMutation {
    bounds: Option<(f64, f64)>,
}

impl GaussianMutation {
    /// Creates an unbounded mutator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Clamps mutated genes into `[min, max]`.
    pub fn with_bounds(min: f64, max: f64) -> Result<Self> {
        if !(min.is_finite() && max.is_finite() && min <= max) {
            return Err(EvolutionError::InvalidConfiguration(format!(
                "gene bounds must be finite with min <= max, got [{min}, {max}]"
            )));
        }
        Ok(Self {
            bounds: Some((min, max)),
        })
    }
}

impl Mutate<Vec<f64>> for GaussianMutation {
    type Magnitude = f64;

    fn check_magnitude(
        &self,
        lower_bound: Option<&f64>,
        _upper_bound: Option<&f64>,
    ) -> std::result::Result<(), String> {
        match lower_bound {
            Some(&sigma) if sigma < 0.0 => {
                Err(format!("standard deviation must not be negative, got {sigma}"))
            }
            _ => Ok(()),
        }
    }

    fn mutate(&self, mut candidate: Vec<f64>, magnitude: f64, rng: &mut dyn RngCore) -> Vec<f64> {
        let Ok(noise) = Normal::new(0.0, magnitude.abs()) else {
            return candidate;
        };
        for gene in candidate.iter_mut() {
            *gene += noise.sample(rng);
            if let Some((min, max)) = self.bounds {
                *gene = gene.clamp(min, max);
            }
        }
        candidate
    }
}
