//! Operators for permutation-encoded candidates.
//!
//! Candidates are `Vec<usize>` holding each of `0..n` exactly once
//! (tours, job orders, ...). Every operator here keeps that property.
//!
//! # Crossover
//!
//! - [`order_crossover`] (OX): Davis (1985), preserves relative order
//! - [`pmx_crossover`] (PMX): Goldberg & Lingle (1985), preserves absolute position
//!
//! # Mutation
//!
//! - [`swap_mutation`]: exchange two random positions, O(1)
//! - [`insert_mutation`]: remove and reinsert at a random position, O(n)
//! - [`invert_mutation`]: reverse a random segment (2-opt), O(n)
//!
//! # References
//!
//! - Cicirello (2023), "Genetic Operators for Permutation Representation"

use super::crossover::{Crossover, Recombination};
use super::mutation::{Mutate, Mutation};
use crate::error::{EvolutionError, Result};
use crate::numbers::{ConstantGenerator, Probability};
use crate::random::RandomSource;
use rand::RngCore;

// ============================================================================
// Crossover
// ============================================================================

/// Which segment-based crossover a [`PermutationCrossover`] performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PermutationCrossoverKind {
    /// Order crossover (OX).
    #[default]
    Order,
    /// Partially mapped crossover (PMX).
    PartiallyMapped,
}

/// Probability-gated OX/PMX crossover over a population of permutations.
pub type PermutationCrossover = Crossover<PermutationCrossoverKind>;

impl Crossover<PermutationCrossoverKind> {
    /// Order crossover applied to each pair with the given probability.
    pub fn order(probability: Probability) -> Result<Self> {
        Self::new(
            PermutationCrossoverKind::Order,
            ConstantGenerator::new(1usize),
            probability,
        )
    }

    /// Partially mapped crossover applied to each pair with the given
    /// probability.
    pub fn partially_mapped(probability: Probability) -> Result<Self> {
        Self::new(
            PermutationCrossoverKind::PartiallyMapped,
            ConstantGenerator::new(1usize),
            probability,
        )
    }
}

impl Recombination<Vec<usize>> for PermutationCrossoverKind {
    fn check_compatible(
        &self,
        first: &Vec<usize>,
        second: &Vec<usize>,
    ) -> std::result::Result<(), String> {
        if first.len() != second.len() {
            return Err(format!(
                "permutation lengths {} and {} differ",
                first.len(),
                second.len()
            ));
        }
        for perm in [first, second] {
            if !is_permutation(perm) {
                return Err(format!("{perm:?} is not a permutation of 0..{}", perm.len()));
            }
        }
        Ok(())
    }

    /// Segment-based: the number of cut points is not used.
    fn mate(
        &self,
        first: Vec<usize>,
        second: Vec<usize>,
        _points: usize,
        rng: &mut dyn RngCore,
    ) -> (Vec<usize>, Vec<usize>) {
        if first.len() < 2 {
            return (first, second);
        }
        let (start, end) = random_segment(first.len(), rng);
        match self {
            Self::Order => (
                ox_build_child(&first, &second, start, end),
                ox_build_child(&second, &first, start, end),
            ),
            Self::PartiallyMapped => (
                pmx_build_child(&first, &second, start, end),
                pmx_build_child(&second, &first, start, end),
            ),
        }
    }
}

/// Order Crossover (OX) for permutations.
///
/// # Algorithm (Davis, 1985)
///
/// 1. Select a random segment `[start, end]` from parent1
/// 2. Copy segment to child at the same positions
/// 3. Fill remaining positions with elements from parent2, in their original
///    order, skipping elements already present in the child
///
/// Fails with [`EvolutionError::InvalidArgument`] if the parents are not
/// permutations of the same length.
pub fn order_crossover(
    parent1: &[usize],
    parent2: &[usize],
    rng: &mut dyn RngCore,
) -> Result<(Vec<usize>, Vec<usize>)> {
    check_parents(parent1, parent2)?;
    let (c1, c2) =
        PermutationCrossoverKind::Order.mate(parent1.to_vec(), parent2.to_vec(), 1, rng);
    Ok((c1, c2))
}

/// Partially Mapped Crossover (PMX) for permutations.
///
/// # Algorithm (Goldberg & Lingle, 1985)
///
/// 1. Select a random segment `[start, end]` from parent1
/// 2. Copy segment to child at the same positions
/// 3. For each element in parent2's segment that isn't in the child yet,
///    follow the mapping chain to a free position and place it there
/// 4. Fill remaining positions from parent2
///
/// Fails with [`EvolutionError::InvalidArgument`] if the parents are not
/// permutations of the same length.
pub fn pmx_crossover(
    parent1: &[usize],
    parent2: &[usize],
    rng: &mut dyn RngCore,
) -> Result<(Vec<usize>, Vec<usize>)> {
    check_parents(parent1, parent2)?;
    let (c1, c2) = PermutationCrossoverKind::PartiallyMapped.mate(
        parent1.to_vec(),
        parent2.to_vec(),
        1,
        rng,
    );
    Ok((c1, c2))
}

fn check_parents(parent1: &[usize], parent2: &[usize]) -> Result<()> {
    if parent1.is_empty() {
        return Err(EvolutionError::InvalidArgument(
            "parents must not be empty".into(),
        ));
    }
    PermutationCrossoverKind::Order
        .check_compatible(&parent1.to_vec(), &parent2.to_vec())
        .map_err(EvolutionError::InvalidArgument)
}

/// Build one OX child: copy segment from `template`, fill from `donor`.
fn ox_build_child(template: &[usize], donor: &[usize], start: usize, end: usize) -> Vec<usize> {
    let n = template.len();
    let mut child = vec![usize::MAX; n];
    let mut in_segment = vec![false; n];

    for i in start..=end {
        child[i] = template[i];
        in_segment[template[i]] = true;
    }

    // Fill from donor, starting after the segment and wrapping around.
    let mut pos = (end + 1) % n;
    for offset in 0..n {
        let val = donor[(end + 1 + offset) % n];
        if !in_segment[val] {
            child[pos] = val;
            pos = (pos + 1) % n;
        }
    }

    child
}

/// Build one PMX child: copy segment from `template`, map from `donor`.
fn pmx_build_child(template: &[usize], donor: &[usize], start: usize, end: usize) -> Vec<usize> {
    let n = template.len();
    let sentinel = usize::MAX;
    let mut child = vec![sentinel; n];
    let mut placed = vec![false; n];

    // Position of every value in the donor.
    let mut donor_pos = vec![0; n];
    for (i, &v) in donor.iter().enumerate() {
        donor_pos[v] = i;
    }

    for i in start..=end {
        child[i] = template[i];
        placed[template[i]] = true;
    }

    for i in start..=end {
        let donor_val = donor[i];
        if placed[donor_val] {
            continue;
        }
        let mut pos = i;
        loop {
            let next = donor_pos[template[pos]];
            if next < start || next > end {
                child[next] = donor_val;
                placed[donor_val] = true;
                break;
            }
            pos = next;
        }
    }

    for i in 0..n {
        if child[i] == sentinel {
            child[i] = donor[i];
        }
    }

    child
}

// ============================================================================
// Mutation
// ============================================================================

/// A single permutation-preserving move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PermutationMove {
    /// Exchange two random positions.
    #[default]
    Swap,
    /// Remove an element and reinsert it elsewhere.
    Insert,
    /// Reverse a random segment.
    Invert,
}

/// Probability-gated permutation mutation performing `magnitude` moves.
pub type PermutationMutation = Mutation<Vec<usize>, PermutationMove>;

impl Mutate<Vec<usize>> for PermutationMove {
    type Magnitude = usize;

    fn check_magnitude(
        &self,
        _lower_bound: Option<&usize>,
        upper_bound: Option<&usize>,
    ) -> std::result::Result<(), String> {
        match upper_bound {
            Some(0) => Err("number of moves must be able to reach 1, generator never exceeds 0".into()),
            _ => Ok(()),
        }
    }

    fn mutate(&self, mut candidate: Vec<usize>, magnitude: usize, rng: &mut dyn RngCore) -> Vec<usize> {
        for _ in 0..magnitude {
            match self {
                Self::Swap => swap_mutation(&mut candidate, rng),
                Self::Insert => insert_mutation(&mut candidate, rng),
                Self::Invert => invert_mutation(&mut candidate, rng),
            }
        }
        candidate
    }
}

/// Swap mutation: exchange two random positions.
pub fn swap_mutation<G>(perm: &mut [G], rng: &mut dyn RngCore) {
    let n = perm.len();
    if n < 2 {
        return;
    }
    let i = rng.next_index(n);
    let j = rng.next_index(n);
    perm.swap(i, j);
}

/// Insert mutation: remove an element and reinsert at a random position.
pub fn insert_mutation<G>(perm: &mut Vec<G>, rng: &mut dyn RngCore) {
    let n = perm.len();
    if n < 2 {
        return;
    }
    let from = rng.next_index(n);
    let item = perm.remove(from);
    let to = rng.next_index(n); // n - 1 elements left, n insertion points
    perm.insert(to, item);
}

/// Invert mutation: reverse a random segment (2-opt move).
pub fn invert_mutation<G>(perm: &mut [G], rng: &mut dyn RngCore) {
    let n = perm.len();
    if n < 2 {
        return;
    }
    let (start, end) = random_segment(n, rng);
    perm[start..=end].reverse();
}

// ============================================================================
// Helpers
// ============================================================================

/// Pick a random segment `[start, end]` within `0..n` where `start <= end`.
fn random_segment(n: usize, rng: &mut dyn RngCore) -> (usize, usize) {
    let a = rng.next_index(n);
    let b = rng.next_index(n);
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

fn is_permutation(perm: &[usize]) -> bool {
    let mut seen = vec![false; perm.len()];
    perm.iter().all(|&v| {
        if v >= seen.len() || seen[v] {
            return false;
        }
        seen[v] = true;
        true
    })
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operators::EvolutionaryOperator;
    use crate::random::create_rng;

    fn is_valid_permutation(perm: &[usize], n: usize) -> bool {
        perm.len() == n && is_permutation(perm)
    }

    // ---- OX Crossover ----

    #[test]
    fn test_ox_produces_valid_permutations() {
        let mut rng = create_rng(42);
        let p1 = vec![0, 1, 2, 3, 4, 5, 6, 7];
        let p2 = vec![7, 6, 5, 4, 3, 2, 1, 0];

        for _ in 0..100 {
            let (c1, c2) = order_crossover(&p1, &p2, &mut rng).unwrap();
            assert!(is_valid_permutation(&c1, 8), "OX child1 not valid: {c1:?}");
            assert!(is_valid_permutation(&c2, 8), "OX child2 not valid: {c2:?}");
        }
    }

    #[test]
    fn test_ox_single_element() {
        let mut rng = create_rng(42);
        let (c1, c2) = order_crossover(&[0], &[0], &mut rng).unwrap();
        assert_eq!(c1, vec![0]);
        assert_eq!(c2, vec![0]);
    }

    #[test]
    fn test_ox_rejects_bad_parents() {
        let mut rng = create_rng(42);
        assert!(order_crossover(&[0, 1, 2], &[0, 1], &mut rng).is_err());
        assert!(order_crossover(&[0, 1, 1], &[0, 1, 2], &mut rng).is_err());
        assert!(order_crossover(&[], &[], &mut rng).is_err());
    }

    // ---- PMX Crossover ----

    #[test]
    fn test_pmx_produces_valid_permutations() {
        let mut rng = create_rng(42);
        let p1 = vec![0, 1, 2, 3, 4, 5, 6, 7];
        let p2 = vec![3, 7, 5, 1, 6, 0, 2, 4];

        for _ in 0..100 {
            let (c1, c2) = pmx_crossover(&p1, &p2, &mut rng).unwrap();
            assert!(is_valid_permutation(&c1, 8), "PMX child1 not valid: {c1:?}");
            assert!(is_valid_permutation(&c2, 8), "PMX child2 not valid: {c2:?}");
        }
    }

    #[test]
    fn test_pmx_identical_parents() {
        let mut rng = create_rng(42);
        let p = vec![0, 1, 2, 3, 4];
        let (c1, c2) = pmx_crossover(&p, &p, &mut rng).unwrap();
        assert_eq!(c1, p);
        assert_eq!(c2, p);
    }

    #[test]
    fn test_pmx_keeps_template_segment() {
        let p1 = vec![0, 1, 2, 3, 4, 5];
        let p2 = vec![5, 3, 1, 4, 0, 2];
        let child = pmx_build_child(&p1, &p2, 1, 3);
        assert_eq!(&child[1..=3], &[1, 2, 3]);
        assert!(is_valid_permutation(&child, 6));
    }

    // ---- Operators ----

    #[test]
    fn test_permutation_crossover_operator() {
        let mut rng = create_rng(7);
        for op in [
            PermutationCrossover::order(Probability::ONE).unwrap(),
            PermutationCrossover::partially_mapped(Probability::ONE).unwrap(),
        ] {
            let mut population: Vec<Vec<usize>> = (0..6)
                .map(|i| {
                    let mut p: Vec<usize> = (0..9).collect();
                    p.rotate_left(i);
                    p
                })
                .collect();
            for _ in 0..20 {
                population = op.apply(population, &mut rng).unwrap();
                assert_eq!(population.len(), 6);
                assert!(population.iter().all(|p| is_valid_permutation(p, 9)));
            }
        }
    }

    #[test]
    fn test_permutation_crossover_rejects_non_permutations() {
        let op = PermutationCrossover::order(Probability::ONE).unwrap();
        let err = op
            .apply(vec![vec![0, 1, 2], vec![0, 0, 2]], &mut create_rng(1))
            .unwrap_err();
        assert!(matches!(err, EvolutionError::IncompatibleCandidates { .. }));
    }

    #[test]
    fn test_permutation_mutation_operator() {
        let mut rng = create_rng(42);
        for mv in [
            PermutationMove::Swap,
            PermutationMove::Insert,
            PermutationMove::Invert,
        ] {
            let op =
                PermutationMutation::new(mv, ConstantGenerator::new(2usize), Probability::ONE)
                    .unwrap();
            let population: Vec<Vec<usize>> = (0..10).map(|_| (0..12).collect()).collect();
            let out = op.apply(population, &mut rng).unwrap();
            assert_eq!(out.len(), 10);
            assert!(out.iter().all(|p| is_valid_permutation(p, 12)), "{mv:?}");
        }
    }

    #[test]
    fn test_permutation_mutation_rejects_zero_moves() {
        let op = PermutationMutation::new(
            PermutationMove::Swap,
            ConstantGenerator::new(0usize),
            Probability::ONE,
        );
        assert!(op.is_err());
    }

    // ---- Swap / Insert / Invert ----

    #[test]
    fn test_swap_preserves_permutation() {
        let mut rng = create_rng(42);
        for _ in 0..100 {
            let mut perm: Vec<usize> = (0..10).collect();
            swap_mutation(&mut perm, &mut rng);
            assert!(is_valid_permutation(&perm, 10));
        }
    }

    #[test]
    fn test_insert_preserves_permutation() {
        let mut rng = create_rng(42);
        for _ in 0..100 {
            let mut perm: Vec<usize> = (0..10).collect();
            insert_mutation(&mut perm, &mut rng);
            assert!(is_valid_permutation(&perm, 10));
        }
    }

    #[test]
    fn test_invert_changes_eventually() {
        let mut rng = create_rng(42);
        let original: Vec<usize> = (0..5).collect();
        let mut changed = false;
        for _ in 0..100 {
            let mut perm = original.clone();
            invert_mutation(&mut perm, &mut rng);
            assert!(is_valid_permutation(&perm, 5));
            if perm != original {
                changed = true;
                break;
            }
        }
        assert!(changed, "invert should change the permutation eventually");
    }

    #[test]
    fn test_single_element_moves_are_noops() {
        let mut rng = create_rng(42);
        let mut perm = vec![0];
        swap_mutation(&mut perm, &mut rng);
        insert_mutation(&mut perm, &mut rng);
        invert_mutation(&mut perm, &mut rng);
        assert_eq!(perm, vec![0]);
    }

    #[test]
    fn test_random_segment_bounds() {
        let mut rng = create_rng(42);
        for _ in 0..1000 {
            let (start, end) = random_segment(10, &mut rng);
            assert!(start <= end);
            assert!(end < 10);
        }
    }
}
