//! Parent selection.
//!
//! Selection determines which evaluated candidates survive into the next
//! generation's breeding pool. Different strategies provide different
//! selection pressure. Every strategy honours the run's
//! [`FitnessDirection`] and draws only from the injected generator, so a
//! fixed seed reproduces the same choices.
//!
//! # References
//!
//! - Blickle & Thiele (1996), "A Comparison of Selection Schemes used in
//!   Evolutionary Algorithms"
//! - Baker (1987), "Reducing Bias and Inefficiency in the Selection Algorithm"
//! - Goldberg (1989), *Genetic Algorithms in Search, Optimization and
//!   Machine Learning*, ch. 4 (sigma scaling)

use crate::error::{EvolutionError, Result};
use crate::evaluation::{EvaluatedCandidate, FitnessDirection};
use crate::random::RandomSource;
use rand::seq::SliceRandom;
use rand::RngCore;
use std::cmp::Ordering;
use std::fmt;

/// Floor applied to sigma-scaled weights.
const SIGMA_FLOOR: f64 = 0.1;

/// Picks parent indices from a scored population.
pub trait SelectionStrategy: Send + Sync + fmt::Debug {
    /// Returns `count` indices into `fitness`, with repetition.
    ///
    /// # Panics
    /// Panics if `fitness` is empty and `count > 0`.
    fn select_indices(
        &self,
        fitness: &[f64],
        direction: FitnessDirection,
        count: usize,
        rng: &mut dyn RngCore,
    ) -> Vec<usize>;
}

/// Selects `count` candidates and clones them out of `population`.
///
/// # Panics
/// Panics if `population` is empty and `count > 0`.
pub fn select<T: Clone>(
    strategy: &dyn SelectionStrategy,
    population: &[EvaluatedCandidate<T>],
    direction: FitnessDirection,
    count: usize,
    rng: &mut dyn RngCore,
) -> Vec<T> {
    let fitness: Vec<f64> = population.iter().map(|e| e.fitness).collect();
    strategy
        .select_indices(&fitness, direction, count, rng)
        .into_iter()
        .map(|i| population[i].candidate.clone())
        .collect()
}

/// Built-in selection strategies.
///
/// # Examples
///
/// ```
/// use u_evolve::selection::Selection;
///
/// // Tournament with size 3 (moderate selection pressure)
/// let sel = Selection::tournament(3);
/// assert!(sel.validate().is_ok());
///
/// // Keep only the top quarter
/// let sel = Selection::Truncation(0.25);
/// assert!(sel.validate().is_ok());
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Selection {
    /// Sample `size` distinct candidates uniformly and keep the fittest.
    ///
    /// With probability `1 - probability` a random other contestant wins
    /// instead, which softens the pressure without shrinking the tournament.
    /// Ties go to the lowest index. When `size` exceeds the population,
    /// contestants are drawn with replacement.
    ///
    /// - size=2: light pressure (good for diversity)
    /// - size=3-5: moderate pressure (typical default)
    /// - size>5: strong pressure (risk of premature convergence)
    ///
    /// # Complexity
    /// O(size) per selection
    Tournament {
        /// Number of contestants per tournament.
        size: usize,
        /// Probability that the fittest contestant wins, in `(0, 1]`.
        probability: f64,
    },

    /// Fitness-proportionate (roulette wheel) selection.
    ///
    /// Weights are `max(f, 0)` under [`FitnessDirection::Natural`] and `1/f`
    /// under [`FitnessDirection::Inverted`]. With inverted fitness, any
    /// candidate scoring zero or less takes all of the probability.
    ///
    /// **Warning**: Susceptible to super-candidate dominance when fitness
    /// variance is high.
    ///
    /// # Complexity
    /// O(n) setup, O(log n) per selection
    Roulette,

    /// Linear rank selection: the fittest of `n` has weight `n`, the least
    /// fit weight `1`. Insensitive to fitness scaling.
    ///
    /// # Complexity
    /// O(n log n) setup, O(log n) per selection
    Rank,

    /// Stochastic universal sampling over the roulette weights.
    ///
    /// One spin places `count` evenly spaced pointers, so every candidate
    /// is chosen within one of its expected number of times. The pointers
    /// are resolved in a single sweep of the cumulative weights.
    ///
    /// # Complexity
    /// O(n + count)
    StochasticUniversal,

    /// Sigma scaling: weight `1 + (f - mean) / 2σ`, floored at `0.1`, sampled
    /// with stochastic universal sampling. Keeps pressure steady as the
    /// population converges.
    SigmaScaling,

    /// Uniform choice among the fittest `ceil(ratio · n)` candidates.
    Truncation(f64),
}

impl Default for Selection {
    fn default() -> Self {
        Selection::tournament(3)
    }
}

impl Selection {
    /// Deterministic tournament of `size` contestants.
    pub fn tournament(size: usize) -> Self {
        Selection::Tournament {
            size,
            probability: 1.0,
        }
    }

    /// Checks the strategy's parameters.
    pub fn validate(&self) -> Result<()> {
        match *self {
            Selection::Tournament { size, probability } => {
                if size == 0 {
                    return Err(EvolutionError::InvalidConfiguration(
                        "tournament size must be at least 1".into(),
                    ));
                }
                if !(probability > 0.0 && probability <= 1.0) {
                    return Err(EvolutionError::InvalidConfiguration(format!(
                        "tournament probability must be in (0, 1], got {probability}"
                    )));
                }
            }
            Selection::Truncation(ratio) => {
                if !(ratio > 0.0 && ratio <= 1.0) {
                    return Err(EvolutionError::InvalidConfiguration(format!(
                        "truncation ratio must be in (0, 1], got {ratio}"
                    )));
                }
            }
            _ => {}
        }
        Ok(())
    }
}

impl SelectionStrategy for Selection {
    fn select_indices(
        &self,
        fitness: &[f64],
        direction: FitnessDirection,
        count: usize,
        rng: &mut dyn RngCore,
    ) -> Vec<usize> {
        if count == 0 {
            return Vec::new();
        }
        assert!(!fitness.is_empty(), "cannot select from empty population");

        match *self {
            Selection::Tournament { size, probability } => (0..count)
                .map(|_| tournament(fitness, direction, size, probability, rng))
                .collect(),
            Selection::Roulette => {
                let wheel = Wheel::new(roulette_weights(fitness, direction));
                (0..count).map(|_| wheel.spin(rng)).collect()
            }
            Selection::Rank => {
                let wheel = Wheel::new(rank_weights(fitness, direction));
                (0..count).map(|_| wheel.spin(rng)).collect()
            }
            Selection::StochasticUniversal => {
                Wheel::new(roulette_weights(fitness, direction)).universal(count, rng)
            }
            Selection::SigmaScaling => {
                Wheel::new(sigma_weights(fitness, direction)).universal(count, rng)
            }
            Selection::Truncation(ratio) => {
                let order = fittest_order(fitness, direction);
                let keep = ((ratio * order.len() as f64).ceil() as usize).clamp(1, order.len());
                (0..count).map(|_| order[rng.next_index(keep)]).collect()
            }
        }
    }
}

// ============================================================================
// Strategies
// ============================================================================

fn tournament(
    fitness: &[f64],
    direction: FitnessDirection,
    size: usize,
    probability: f64,
    rng: &mut dyn RngCore,
) -> usize {
    let n = fitness.len();
    let size = size.max(1);
    let contestants: Vec<usize> = if size <= n {
        rand::seq::index::sample(rng, n, size).into_vec()
    } else {
        (0..size).map(|_| rng.next_index(n)).collect()
    };

    let mut winner = 0;
    for (slot, &idx) in contestants.iter().enumerate().skip(1) {
        let best = contestants[winner];
        match direction.compare(fitness[idx], fitness[best]) {
            Ordering::Less => winner = slot,
            Ordering::Equal if idx < best => winner = slot,
            _ => {}
        }
    }

    if size > 1 && probability < 1.0 && !rng.next_event(probability) {
        let mut other = rng.next_index(size - 1);
        if other >= winner {
            other += 1;
        }
        return contestants[other];
    }
    contestants[winner]
}

/// Indices ordered fittest first; ties keep index order.
fn fittest_order(fitness: &[f64], direction: FitnessDirection) -> Vec<usize> {
    let mut order: Vec<usize> = (0..fitness.len()).collect();
    order.sort_by(|&a, &b| direction.compare(fitness[a], fitness[b]));
    order
}

fn roulette_weights(fitness: &[f64], direction: FitnessDirection) -> Vec<f64> {
    match direction {
        FitnessDirection::Natural => fitness.iter().map(|&f| f.max(0.0)).collect(),
        FitnessDirection::Inverted => {
            if fitness.iter().any(|&f| f <= 0.0) {
                fitness
                    .iter()
                    .map(|&f| if f <= 0.0 { 1.0 } else { 0.0 })
                    .collect()
            } else {
                fitness.iter().map(|&f| 1.0 / f).collect()
            }
        }
    }
}

fn rank_weights(fitness: &[f64], direction: FitnessDirection) -> Vec<f64> {
    let n = fitness.len();
    let mut weights = vec![0.0; n];
    for (rank, idx) in fittest_order(fitness, direction).into_iter().enumerate() {
        weights[idx] = (n - rank) as f64;
    }
    weights
}

fn sigma_weights(fitness: &[f64], direction: FitnessDirection) -> Vec<f64> {
    let n = fitness.len() as f64;
    let mean = fitness.iter().sum::<f64>() / n;
    let variance = fitness.iter().map(|f| (f - mean).powi(2)).sum::<f64>() / n;
    let sigma = variance.sqrt();
    if !(sigma > 0.0) || !sigma.is_finite() {
        return vec![1.0; fitness.len()];
    }
    let sign = if direction.is_natural() { 1.0 } else { -1.0 };
    fitness
        .iter()
        .map(|&f| (1.0 + sign * (f - mean) / (2.0 * sigma)).max(SIGMA_FLOOR))
        .collect()
}

/// Cumulative weights for proportional sampling.
///
/// Falls back to uniform weights when the total is zero or not finite.
struct Wheel {
    cumulative: Vec<f64>,
    total: f64,
}

impl Wheel {
    fn new(weights: Vec<f64>) -> Self {
        let total: f64 = weights.iter().sum();
        let weights = if total > 0.0 && total.is_finite() {
            weights
        } else {
            vec![1.0; weights.len()]
        };

        let mut acc = 0.0;
        let cumulative: Vec<f64> = weights
            .iter()
            .map(|w| {
                acc += w;
                acc
            })
            .collect();
        Self {
            total: acc,
            cumulative,
        }
    }

    fn index_at(&self, point: f64) -> usize {
        self.cumulative
            .partition_point(|&c| c <= point)
            .min(self.cumulative.len() - 1)
    }

    fn spin(&self, rng: &mut dyn RngCore) -> usize {
        self.index_at(rng.next_unit() * self.total)
    }

    /// One spin, `count` equally spaced pointers, resolved by a single
    /// forward sweep. The result is shuffled so that consecutive parents are
    /// not sorted by index.
    fn universal(&self, count: usize, rng: &mut dyn RngCore) -> Vec<usize> {
        let step = self.total / count as f64;
        let start = rng.next_unit() * step;
        let mut chosen = self.sweep(start, step, count);
        chosen.shuffle(rng);
        chosen
    }

    /// Resolves the pointers `start + i * step` in ascending order.
    fn sweep(&self, start: f64, step: f64, count: usize) -> Vec<usize> {
        let last = self.cumulative.len() - 1;
        let mut chosen = Vec::with_capacity(count);
        let mut idx = 0;
        for i in 0..count {
            let pointer = start + i as f64 * step;
            while idx < last && self.cumulative[idx] <= pointer {
                idx += 1;
            }
            chosen.push(idx);
        }
        chosen
    }
}
