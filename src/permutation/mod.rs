//! Exhaustive, order-exact enumeration of all orderings of a small set.
//!
//! [`PermutationGenerator`] walks every ordering of 1–20 elements in
//! lexicographic order of their indices. It is used by combinatorial
//! operators and by tests that need to try every arrangement of a set.
//!
//! The 20-element ceiling is hard: 21! does not fit in a `u64`, so the
//! total count could no longer be represented exactly.
//!
//! # Algorithm
//!
//! Each step finds the largest `j` with `index[j] < index[j + 1]`, the
//! largest `k > j` with `index[k] > index[j]`, swaps the two and reverses
//! the tail after `j`. The first call after construction or [`reset`]
//! returns the identity ordering without stepping.
//!
//! Reference: Rosen (1991), *Discrete Mathematics and Its Applications*,
//! section 4.4.
//!
//! [`reset`]: PermutationGenerator::reset

use crate::error::{EvolutionError, Result};

/// Largest element count a [`PermutationGenerator`] accepts.
pub const MAX_PERMUTATION_ELEMENTS: usize = 20;

/// Exact `n!` for `n <= 20`.
///
/// ```
/// use u_evolve::permutation::factorial;
///
/// assert_eq!(factorial(0).unwrap(), 1);
/// assert_eq!(factorial(5).unwrap(), 120);
/// assert!(factorial(21).is_err());
/// ```
pub fn factorial(n: usize) -> Result<u64> {
    if n > MAX_PERMUTATION_ELEMENTS {
        return Err(EvolutionError::InvalidArgument(format!(
            "factorial({n}) exceeds the exact u64 range (max n = {MAX_PERMUTATION_ELEMENTS})"
        )));
    }
    Ok((2..=n as u64).product())
}

/// Generates every ordering of a fixed element set, one per call.
///
/// Not thread-safe; give each consumer its own instance.
///
/// # Examples
///
/// ```
/// use u_evolve::permutation::PermutationGenerator;
///
/// let mut gen = PermutationGenerator::new(vec!['a', 'b', 'c']).unwrap();
/// assert_eq!(gen.total_permutations(), 6);
/// assert_eq!(gen.next_permutation().unwrap(), vec!['a', 'b', 'c']);
/// assert_eq!(gen.next_permutation().unwrap(), vec!['a', 'c', 'b']);
/// assert_eq!(gen.remaining_permutations(), 4);
/// ```
#[derive(Debug, Clone)]
pub struct PermutationGenerator<T> {
    elements: Vec<T>,
    indices: Vec<usize>,
    remaining: u64,
    total: u64,
}

impl<T: Clone> PermutationGenerator<T> {
    /// Creates a generator over a private copy of `elements`.
    ///
    /// Fails with [`EvolutionError::InvalidConfiguration`] if there are no
    /// elements or more than [`MAX_PERMUTATION_ELEMENTS`].
    pub fn new(elements: impl Into<Vec<T>>) -> Result<Self> {
        let elements = elements.into();
        let n = elements.len();
        if n == 0 || n > MAX_PERMUTATION_ELEMENTS {
            return Err(EvolutionError::InvalidConfiguration(format!(
                "permutation size must be between 1 and {MAX_PERMUTATION_ELEMENTS}, got {n}"
            )));
        }
        let total = factorial(n)?;
        let mut gen = Self {
            elements,
            indices: vec![0; n],
            remaining: total,
            total,
        };
        gen.reset();
        Ok(gen)
    }

    /// Restores the identity ordering; the next call yields it again.
    pub fn reset(&mut self) {
        for (i, slot) in self.indices.iter_mut().enumerate() {
            *slot = i;
        }
        self.remaining = self.total;
    }

    /// Number of elements in each permutation.
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// Always `false`; a generator holds at least one element.
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// `n!`.
    pub fn total_permutations(&self) -> u64 {
        self.total
    }

    /// Orderings not yet produced since construction or the last reset.
    pub fn remaining_permutations(&self) -> u64 {
        self.remaining
    }

    /// Whether another ordering is available.
    pub fn has_next(&self) -> bool {
        self.remaining > 0
    }

    /// Returns the next ordering in a freshly allocated vector.
    ///
    /// Fails with [`EvolutionError::ExhaustedSequence`] once every ordering
    /// has been produced.
    pub fn next_permutation(&mut self) -> Result<Vec<T>> {
        self.advance()?;
        Ok(self
            .indices
            .iter()
            .map(|&i| self.elements[i].clone())
            .collect())
    }

    /// Writes the next ordering into `destination` without allocating.
    ///
    /// Fails with [`EvolutionError::InvalidArgument`] if the buffer length
    /// differs from [`len`](Self::len); the generator is not advanced in that
    /// case.
    pub fn next_permutation_into(&mut self, destination: &mut [T]) -> Result<()> {
        if destination.len() != self.elements.len() {
            return Err(EvolutionError::InvalidArgument(format!(
                "destination length {} must equal permutation length {}",
                destination.len(),
                self.elements.len()
            )));
        }
        self.advance()?;
        for (slot, &i) in destination.iter_mut().zip(&self.indices) {
            slot.clone_from(&self.elements[i]);
        }
        Ok(())
    }

    /// The current index ordering (the last one produced).
    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    /// Steps the index array to its lexicographic successor.
    fn advance(&mut self) -> Result<()> {
        if self.remaining == 0 {
            return Err(EvolutionError::ExhaustedSequence);
        }

        if self.remaining < self.total {
            let idx = &mut self.indices;
            let n = idx.len();

            let mut j = n - 2;
            while idx[j] > idx[j + 1] {
                j -= 1;
            }

            let mut k = n - 1;
            while idx[j] > idx[k] {
                k -= 1;
            }

            idx.swap(j, k);
            idx[j + 1..].reverse();
        }

        self.remaining -= 1;
        Ok(())
    }
}

impl<T: Clone> Iterator for PermutationGenerator<T> {
    type Item = Vec<T>;

    fn next(&mut self) -> Option<Vec<T>> {
        self.next_permutation().ok()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        match usize::try_from(self.remaining) {
            Ok(n) => (n, Some(n)),
            Err(_) => (usize::MAX, None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::HashSet;

    #[test]
    fn test_factorial_values() {
        assert_eq!(factorial(0).unwrap(), 1);
        assert_eq!(factorial(1).unwrap(), 1);
        assert_eq!(factorial(10).unwrap(), 3_628_800);
        assert_eq!(factorial(20).unwrap(), 2_432_902_008_176_640_000);
        assert!(matches!(
            factorial(21),
            Err(EvolutionError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_rejects_empty_and_oversized_sets() {
        let empty: Vec<u8> = vec![];
        assert!(matches!(
            PermutationGenerator::new(empty),
            Err(EvolutionError::InvalidConfiguration(_))
        ));
        let too_many: Vec<u8> = (0..21).collect();
        assert!(matches!(
            PermutationGenerator::new(too_many),
            Err(EvolutionError::InvalidConfiguration(_))
        ));
        let max: Vec<u8> = (0..20).collect();
        let gen = PermutationGenerator::new(max).unwrap();
        assert_eq!(gen.total_permutations(), 2_432_902_008_176_640_000);
    }

    #[test]
    fn test_lexicographic_order_for_three() {
        let gen = PermutationGenerator::new(vec![1, 2, 3]).unwrap();
        let all: Vec<Vec<i32>> = gen.collect();
        assert_eq!(
            all,
            vec![
                vec![1, 2, 3],
                vec![1, 3, 2],
                vec![2, 1, 3],
                vec![2, 3, 1],
                vec![3, 1, 2],
                vec![3, 2, 1],
            ]
        );
    }

    #[test]
    fn test_single_element() {
        let mut gen = PermutationGenerator::new(vec!["only"]).unwrap();
        assert_eq!(gen.total_permutations(), 1);
        assert_eq!(gen.next_permutation().unwrap(), vec!["only"]);
        assert!(!gen.has_next());
        assert_eq!(gen.next_permutation(), Err(EvolutionError::ExhaustedSequence));
    }

    #[test]
    fn test_counts_track_calls() {
        let mut gen = PermutationGenerator::new(vec!['a', 'b', 'c', 'd']).unwrap();
        assert_eq!(gen.total_permutations(), 24);
        assert_eq!(gen.remaining_permutations(), 24);
        gen.next_permutation().unwrap();
        gen.next_permutation().unwrap();
        assert_eq!(gen.remaining_permutations(), 22);
        assert!(gen.has_next());
    }

    #[test]
    fn test_exhaustion_is_an_error() {
        let mut gen = PermutationGenerator::new(vec![0, 1]).unwrap();
        gen.next_permutation().unwrap();
        gen.next_permutation().unwrap();
        assert!(!gen.has_next());
        assert_eq!(gen.next_permutation(), Err(EvolutionError::ExhaustedSequence));
        let mut buf = [0, 0];
        assert_eq!(
            gen.next_permutation_into(&mut buf),
            Err(EvolutionError::ExhaustedSequence)
        );
    }

    #[test]
    fn test_reset_restarts_sequence() {
        let mut gen = PermutationGenerator::new(vec!['x', 'y', 'z']).unwrap();
        let first: Vec<Vec<char>> = gen.by_ref().collect();
        assert!(!gen.has_next());
        gen.reset();
        assert_eq!(gen.remaining_permutations(), 6);
        let second: Vec<Vec<char>> = gen.by_ref().collect();
        assert_eq!(first, second);
    }

    #[test]
    fn test_reset_mid_sequence() {
        let mut gen = PermutationGenerator::new(vec![1, 2, 3, 4]).unwrap();
        for _ in 0..7 {
            gen.next_permutation().unwrap();
        }
        gen.reset();
        assert_eq!(gen.next_permutation().unwrap(), vec![1, 2, 3, 4]);
        assert_eq!(gen.next_permutation().unwrap(), vec![1, 2, 4, 3]);
    }

    #[test]
    fn test_buffer_variant_matches_allocating_variant() {
        let elements = vec!['p', 'q', 'r', 's'];
        let mut allocating = PermutationGenerator::new(elements.clone()).unwrap();
        let mut buffered = PermutationGenerator::new(elements).unwrap();
        let mut buf = ['-'; 4];
        while allocating.has_next() {
            buffered.next_permutation_into(&mut buf).unwrap();
            assert_eq!(allocating.next_permutation().unwrap(), buf.to_vec());
        }
        assert!(!buffered.has_next());
    }

    #[test]
    fn test_buffer_length_mismatch() {
        let mut gen = PermutationGenerator::new(vec![1, 2, 3]).unwrap();
        let mut short = [0; 2];
        assert!(matches!(
            gen.next_permutation_into(&mut short),
            Err(EvolutionError::InvalidArgument(_))
        ));
        // A rejected call must not consume an ordering.
        assert_eq!(gen.remaining_permutations(), 6);
    }

    #[test]
    fn test_first_and_last_are_extremes() {
        let mut gen = PermutationGenerator::new(vec![0, 1, 2, 3, 4]).unwrap();
        let first = gen.next_permutation().unwrap();
        let mut last = first.clone();
        while gen.has_next() {
            last = gen.next_permutation().unwrap();
        }
        assert_eq!(first, vec![0, 1, 2, 3, 4]);
        assert_eq!(last, vec![4, 3, 2, 1, 0]);
    }

    #[test]
    fn test_duplicate_values_still_enumerate_positions() {
        // Orderings are over positions, so equal values repeat outputs.
        let gen = PermutationGenerator::new(vec![7, 7]).unwrap();
        let all: Vec<Vec<i32>> = gen.collect();
        assert_eq!(all, vec![vec![7, 7], vec![7, 7]]);
    }

    #[test]
    fn test_size_hint() {
        let mut gen = PermutationGenerator::new(vec![1, 2, 3]).unwrap();
        assert_eq!(gen.size_hint(), (6, Some(6)));
        gen.next();
        assert_eq!(gen.size_hint(), (5, Some(5)));
    }

    proptest! {
        #[test]
        fn prop_all_orderings_exactly_once(n in 1usize..=7) {
            let elements: Vec<usize> = (0..n).collect();
            let mut gen = PermutationGenerator::new(elements).unwrap();
            let total = gen.total_permutations();
            let mut seen = HashSet::new();
            let mut previous: Option<Vec<usize>> = None;
            for _ in 0..total {
                let p = gen.next_permutation().unwrap();
                let mut sorted = p.clone();
                sorted.sort_unstable();
                prop_assert_eq!(&sorted, &(0..n).collect::<Vec<_>>());
                if let Some(prev) = &previous {
                    prop_assert!(prev < &p, "not lexicographic: {:?} then {:?}", prev, p);
                }
                prop_assert!(seen.insert(p.clone()));
                previous = Some(p);
            }
            prop_assert!(!gen.has_next());
            prop_assert_eq!(seen.len() as u64, factorial(n).unwrap());
        }
    }
}
