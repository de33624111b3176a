//! Concrete [`NumberGenerator`] implementations.

use super::NumberGenerator;
use crate::error::{EvolutionError, Result};
use rand::distr::uniform::SampleUniform;
use rand::{Rng, RngCore};
use rand_distr::{Binomial, Distribution, Exp, Normal, Poisson};
use std::fmt;
use std::sync::{Arc, RwLock};

/// Always returns the configured value.
///
/// ```
/// use u_evolve::numbers::{ConstantGenerator, NumberGenerator};
/// use u_evolve::random::create_rng;
///
/// let points = ConstantGenerator::new(2usize);
/// assert_eq!(points.next_value(&mut create_rng(1)), 2);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConstantGenerator<N> {
    value: N,
}

impl<N> ConstantGenerator<N> {
    /// Creates a generator that always yields `value`.
    pub fn new(value: N) -> Self {
        Self { value }
    }
}

impl<N: Copy + Send + Sync + fmt::Debug> NumberGenerator<N> for ConstantGenerator<N> {
    fn next_value(&self, _rng: &mut dyn RngCore) -> N {
        self.value
    }

    fn lower_bound(&self) -> Option<N> {
        Some(self.value)
    }
    fn upper_bound(&self) -> Option<N> {
        Some(self.value)
    }
}

/// Uniform over the inclusive range `[min, max]`.
///
/// Works for integers (discrete uniform) and reals (continuous uniform).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UniformGenerator<N> {
    min: N,
    max: N,
}

impl<N: PartialOrd + fmt::Debug> UniformGenerator<N> {
    /// Creates the generator. Fails if `min > max` or the bounds are unordered.
    pub fn new(min: N, max: N) -> Result<Self> {
        match min.partial_cmp(&max) {
            Some(std::cmp::Ordering::Less | std::cmp::Ordering::Equal) => Ok(Self { min, max }),
            _ => Err(EvolutionError::InvalidConfiguration(format!(
                "uniform range requires min <= max, got [{min:?}, {max:?}]"
            ))),
        }
    }
}

impl<N> NumberGenerator<N> for UniformGenerator<N>
where
    N: SampleUniform + PartialOrd + Copy + Send + Sync + fmt::Debug,
{
    fn next_value(&self, rng: &mut dyn RngCore) -> N {
        rng.random_range(self.min..=self.max)
    }

    fn lower_bound(&self) -> Option<N> {
        Some(self.min)
    }
    fn upper_bound(&self) -> Option<N> {
        Some(self.max)
    }
}

/// Poisson-distributed counts with the given mean.
#[derive(Debug, Clone, Copy)]
pub struct PoissonGenerator {
    mean: f64,
    dist: Poisson<f64>,
}

impl PoissonGenerator {
    /// Creates the generator. The mean must be positive and finite.
    pub fn new(mean: f64) -> Result<Self> {
        if !(mean.is_finite() && mean > 0.0) {
            return Err(EvolutionError::InvalidConfiguration(format!(
                "poisson mean must be positive and finite, got {mean}"
            )));
        }
        let dist = Poisson::new(mean)
            .map_err(|e| EvolutionError::InvalidConfiguration(format!("poisson({mean}): {e}")))?;
        Ok(Self { mean, dist })
    }

    /// The configured mean.
    pub fn mean(&self) -> f64 {
        self.mean
    }
}

impl NumberGenerator<usize> for PoissonGenerator {
    fn next_value(&self, rng: &mut dyn RngCore) -> usize {
        self.dist.sample(rng) as usize
    }

    fn lower_bound(&self) -> Option<usize> {
        Some(0)
    }
}

/// Normally distributed reals.
#[derive(Debug, Clone, Copy)]
pub struct GaussianGenerator {
    mean: f64,
    std_dev: f64,
    dist: Normal<f64>,
}

impl GaussianGenerator {
    /// Creates the generator. The standard deviation must be finite and
    /// non-negative.
    pub fn new(mean: f64, std_dev: f64) -> Result<Self> {
        if !mean.is_finite() || !std_dev.is_finite() || std_dev < 0.0 {
            return Err(EvolutionError::InvalidConfiguration(format!(
                "gaussian requires finite mean and std_dev >= 0, got ({mean}, {std_dev})"
            )));
        }
        let dist = Normal::new(mean, std_dev).map_err(|e| {
            EvolutionError::InvalidConfiguration(format!("normal({mean}, {std_dev}): {e}"))
        })?;
        Ok(Self { mean, std_dev, dist })
    }

    /// The configured mean.
    pub fn mean(&self) -> f64 {
        self.mean
    }

    /// The configured standard deviation.
    pub fn std_dev(&self) -> f64 {
        self.std_dev
    }
}

impl NumberGenerator<f64> for GaussianGenerator {
    fn next_value(&self, rng: &mut dyn RngCore) -> f64 {
        self.dist.sample(rng)
    }
}

/// Exponentially distributed reals with the given rate.
#[derive(Debug, Clone, Copy)]
pub struct ExponentialGenerator {
    rate: f64,
    dist: Exp<f64>,
}

impl ExponentialGenerator {
    /// Creates the generator. The rate must be positive and finite.
    pub fn new(rate: f64) -> Result<Self> {
        if !(rate.is_finite() && rate > 0.0) {
            return Err(EvolutionError::InvalidConfiguration(format!(
                "exponential rate must be positive and finite, got {rate}"
            )));
        }
        let dist = Exp::new(rate)
            .map_err(|e| EvolutionError::InvalidConfiguration(format!("exp({rate}): {e}")))?;
        Ok(Self { rate, dist })
    }

    /// The configured rate.
    pub fn rate(&self) -> f64 {
        self.rate
    }
}

impl NumberGenerator<f64> for ExponentialGenerator {
    fn next_value(&self, rng: &mut dyn RngCore) -> f64 {
        self.dist.sample(rng)
    }

    fn lower_bound(&self) -> Option<f64> {
        Some(0.0)
    }
}

/// Binomially distributed counts: successes in `trials` Bernoulli(p) trials.
#[derive(Debug, Clone, Copy)]
pub struct BinomialGenerator {
    trials: u64,
    dist: Binomial,
}

impl BinomialGenerator {
    /// Creates the generator. `p` must be in `[0, 1]`.
    pub fn new(trials: u64, p: f64) -> Result<Self> {
        let dist = Binomial::new(trials, p).map_err(|e| {
            EvolutionError::InvalidConfiguration(format!("binomial({trials}, {p}): {e}"))
        })?;
        Ok(Self { trials, dist })
    }
}

impl NumberGenerator<usize> for BinomialGenerator {
    fn next_value(&self, rng: &mut dyn RngCore) -> usize {
        self.dist.sample(rng) as usize
    }

    fn lower_bound(&self) -> Option<usize> {
        Some(0)
    }

    fn upper_bound(&self) -> Option<usize> {
        usize::try_from(self.trials).ok()
    }
}

/// A constant whose value can be changed while a run is in progress.
///
/// Clones share the same value, so one clone can be handed to an operator
/// and another kept by an observer that adapts the parameter between
/// generations.
#[derive(Debug, Clone)]
pub struct AdjustableGenerator<N> {
    value: Arc<RwLock<N>>,
}

impl<N: Copy> AdjustableGenerator<N> {
    /// Creates the generator with an initial value.
    pub fn new(value: N) -> Self {
        Self {
            value: Arc::new(RwLock::new(value)),
        }
    }

    /// Replaces the value returned by subsequent draws.
    pub fn set(&self, value: N) {
        let mut guard = self.value.write().unwrap_or_else(|e| e.into_inner());
        *guard = value;
    }

    /// The current value.
    pub fn get(&self) -> N {
        *self.value.read().unwrap_or_else(|e| e.into_inner())
    }
}

impl<N: Copy + Send + Sync + fmt::Debug> NumberGenerator<N> for AdjustableGenerator<N> {
    fn next_value(&self, _rng: &mut dyn RngCore) -> N {
        self.get()
    }
}
