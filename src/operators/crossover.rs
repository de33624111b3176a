//! Pairwise recombination.
//!
//! [`Crossover`] handles everything common to crossover operators: pairing
//! candidates in population order, compatibility checks, the probability
//! gate, and drawing the number of cut points. A [`Recombination`] supplies
//! the representation-specific part.

use super::EvolutionaryOperator;
use crate::error::{EvolutionError, Result};
use crate::numbers::{ConstantGenerator, NumberGenerator, Probability};
use rand::RngCore;
use std::fmt;

/// Representation-specific half of a crossover operator.
pub trait Recombination<T>: Send + Sync {
    /// Checks that two candidates can be mated.
    ///
    /// Returns a description of the mismatch on failure.
    fn check_compatible(&self, first: &T, second: &T) -> std::result::Result<(), String>;

    /// Produces two offspring from two compatible parents using `points`
    /// cut points (always at least 1).
    fn mate(&self, first: T, second: T, points: usize, rng: &mut dyn RngCore) -> (T, T);
}

/// Probability-gated crossover over candidates paired in population order.
///
/// Pairs are `(0, 1)`, `(2, 3)`, ... and a trailing odd candidate passes
/// through unchanged. Every pair is checked for compatibility before any
/// recombination happens, so a mismatch yields an error and no partially
/// recombined population.
pub struct Crossover<R> {
    recombination: R,
    points: Box<dyn NumberGenerator<usize>>,
    probability: Probability,
}

impl<R> Crossover<R> {
    /// Creates a crossover operator.
    ///
    /// Fails with [`EvolutionError::InvalidConfiguration`] if `probability`
    /// is zero (crossover could never happen) or if `points` can never
    /// produce a value of 1 or more according to its upper bound (a constant
    /// 0 makes a no-op operator). Generators that only sometimes yield 0,
    /// such as Poisson counts, are accepted; a pair that draws 0 points
    /// passes through unchanged.
    pub fn new<G>(recombination: R, points: G, probability: Probability) -> Result<Self>
    where
        G: NumberGenerator<usize> + 'static,
    {
        if probability.value() <= 0.0 {
            return Err(EvolutionError::InvalidConfiguration(
                "crossover probability must be greater than zero".into(),
            ));
        }
        if let Some(max) = points.upper_bound() {
            if max < 1 {
                return Err(EvolutionError::InvalidConfiguration(format!(
                    "number of crossover points must be at least 1, generator never exceeds {max}"
                )));
            }
        }
        Ok(Self {
            recombination,
            points: Box::new(points),
            probability,
        })
    }

    /// Creates a crossover operator with a fixed number of cut points and a
    /// raw probability, validating both.
    pub fn with_constant(recombination: R, points: usize, probability: f64) -> Result<Self> {
        let probability = Probability::new(probability)?;
        Self::new(recombination, ConstantGenerator::new(points), probability)
    }

    /// The application probability per pair.
    pub fn probability(&self) -> Probability {
        self.probability
    }
}

impl<T, R> EvolutionaryOperator<T> for Crossover<R>
where
    T: Send,
    R: Recombination<T>,
{
    fn apply(&self, population: Vec<T>, rng: &mut dyn RngCore) -> Result<Vec<T>> {
        for (pair, parents) in population.chunks_exact(2).enumerate() {
            self.recombination
                .check_compatible(&parents[0], &parents[1])
                .map_err(|reason| EvolutionError::IncompatibleCandidates {
                    first: pair * 2,
                    second: pair * 2 + 1,
                    reason,
                })?;
        }

        let mut offspring = Vec::with_capacity(population.len());
        let mut parents = population.into_iter();
        while let Some(first) = parents.next() {
            let Some(second) = parents.next() else {
                offspring.push(first);
                break;
            };

            let points = if self.probability.next_event(rng) {
                self.points.next_value(rng)
            } else {
                0
            };

            if points > 0 {
                let (a, b) = self.recombination.mate(first, second, points, rng);
                offspring.push(a);
                offspring.push(b);
            } else {
                offspring.push(first);
                offspring.push(second);
            }
        }

        Ok(offspring)
    }
}

impl<R: fmt::Debug> fmt::Debug for Crossover<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Crossover")
            .field("recombination", &self.recombination)
            .field("points", &self.points)
            .field("probability", &self.probability)
            .finish()
    }
}

/// k-point crossover for `Vec<G>` of equal length.
///
/// Offspring exchange every other segment between the sorted cut points, so
/// the elements of a pair are redistributed but never created or lost.
#[derive(Debug, Clone, Copy, Default)]
pub struct ListCrossover;

/// k-point crossover for bit strings.
pub type BitStringCrossover = ListCrossover;

impl<G: Send + Sync> Recombination<Vec<G>> for ListCrossover {
    fn check_compatible(&self, first: &Vec<G>, second: &Vec<G>) -> std::result::Result<(), String> {
        if first.len() == second.len() {
            Ok(())
        } else {
            Err(format!(
                "list lengths {} and {} differ",
                first.len(),
                second.len()
            ))
        }
    }

    fn mate(
        &self,
        mut first: Vec<G>,
        mut second: Vec<G>,
        points: usize,
        rng: &mut dyn RngCore,
    ) -> (Vec<G>, Vec<G>) {
        let cuts = cut_points(first.len(), points, rng);
        exchange_segments(&mut first, &mut second, &cuts);
        (first, second)
    }
}

/// k-point crossover for `String`s with the same number of characters.
#[derive(Debug, Clone, Copy, Default)]
pub struct StringCrossover;

impl Recombination<String> for StringCrossover {
    fn check_compatible(&self, first: &String, second: &String) -> std::result::Result<(), String> {
        let (a, b) = (first.chars().count(), second.chars().count());
        if a == b {
            Ok(())
        } else {
            Err(format!("string lengths {a} and {b} differ"))
        }
    }

    fn mate(
        &self,
        first: String,
        second: String,
        points: usize,
        rng: &mut dyn RngCore,
    ) -> (String, String) {
        let mut a: Vec<char> = first.chars().collect();
        let mut b: Vec<char> = second.chars().collect();
        let cuts = cut_points(a.len(), points, rng);
        exchange_segments(&mut a, &mut b, &cuts);
        (a.into_iter().collect(), b.into_iter().collect())
    }
}

/// Draws up to `points` distinct cut positions in `1..len`, sorted.
///
/// Sequences shorter than 2 have no interior position and get no cuts.
pub(crate) fn cut_points(len: usize, points: usize, rng: &mut dyn RngCore) -> Vec<usize> {
    if len < 2 {
        return Vec::new();
    }
    let k = points.min(len - 1);
    let mut cuts: Vec<usize> = rand::seq::index::sample(rng, len - 1, k)
        .into_iter()
        .map(|i| i + 1)
        .collect();
    cuts.sort_unstable();
    cuts
}

/// Swaps every second segment delimited by `cuts` between `a` and `b`.
fn exchange_segments<G>(a: &mut [G], b: &mut [G], cuts: &[usize]) {
    let len = a.len();
    let mut start = 0;
    let mut exchanging = false;
    for &end in cuts.iter().chain(std::iter::once(&len)) {
        if exchanging {
            a[start..end].swap_with_slice(&mut b[start..end]);
        }
        exchanging = !exchanging;
        start = end;
    }
}
