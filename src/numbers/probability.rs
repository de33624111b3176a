//! Validated probability values.

use crate::error::{EvolutionError, Result};
use crate::random::RandomSource;
use rand::RngCore;

/// A probability in `[0, 1]`.
///
/// ```
/// use u_evolve::numbers::Probability;
///
/// let p = Probability::new(0.25).unwrap();
/// assert_eq!(p.complement().value(), 0.75);
/// assert!(Probability::new(1.5).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(try_from = "f64", into = "f64")
)]
pub struct Probability(f64);

impl Probability {
    /// An event that never happens.
    pub const ZERO: Probability = Probability(0.0);

    /// A fair coin flip.
    pub const EVENS: Probability = Probability(0.5);

    /// An event that always happens.
    pub const ONE: Probability = Probability(1.0);

    /// Creates a probability, rejecting values outside `[0, 1]` and NaN.
    pub fn new(value: f64) -> Result<Self> {
        if !(0.0..=1.0).contains(&value) {
            return Err(EvolutionError::InvalidConfiguration(format!(
                "probability must be in [0, 1], got {value}"
            )));
        }
        Ok(Self(value))
    }

    /// The raw value.
    pub fn value(self) -> f64 {
        self.0
    }

    /// `1 - p`.
    pub fn complement(self) -> Self {
        Self(1.0 - self.0)
    }

    /// Draws a Bernoulli trial with this probability.
    pub fn next_event(self, rng: &mut dyn RngCore) -> bool {
        // Avoid consuming the stream for the degenerate cases.
        if self.0 >= 1.0 {
            true
        } else if self.0 <= 0.0 {
            false
        } else {
            rng.next_event(self.0)
        }
    }
}

impl TryFrom<f64> for Probability {
    type Error = EvolutionError;

    fn try_from(value: f64) -> Result<Self> {
        Self::new(value)
    }
}

impl From<Probability> for f64 {
    fn from(p: Probability) -> f64 {
        p.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random::create_rng;

    #[test]
    fn test_bounds() {
        assert!(Probability::new(0.0).is_ok());
        assert!(Probability::new(1.0).is_ok());
        assert!(Probability::new(-0.01).is_err());
        assert!(Probability::new(1.01).is_err());
        assert!(Probability::new(f64::NAN).is_err());
    }

    #[test]
    fn test_constants() {
        assert_eq!(Probability::ZERO.value(), 0.0);
        assert_eq!(Probability::EVENS.value(), 0.5);
        assert_eq!(Probability::ONE.complement(), Probability::ZERO);
    }

    #[test]
    fn test_next_event_frequency() {
        let mut rng = create_rng(42);
        let p = Probability::new(0.3).unwrap();
        let hits = (0..10_000).filter(|_| p.next_event(&mut rng)).count();
        assert!((2700..3300).contains(&hits), "got {hits} hits");
    }

    #[test]
    fn test_degenerate_events_do_not_draw() {
        let mut a = create_rng(1);
        let mut b = create_rng(1);
        assert!(Probability::ONE.next_event(&mut a));
        assert!(!Probability::ZERO.next_event(&mut a));
        assert_eq!(a.next_u64(), b.next_u64());
    }
}
