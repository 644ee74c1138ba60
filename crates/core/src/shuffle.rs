//! Fisher–Yates shuffling.

use rand::Rng;

/// Shuffle `items` in place into a uniformly random permutation.
///
/// Walks `i` from the last index down to 1, draws `j` uniformly from `0..=i`
/// and swaps the two slots.
pub fn fisher_yates<T, R: Rng + ?Sized>(items: &mut [T], rng: &mut R) {
    for i in (1..items.len()).rev() {
        let j = rng.random_range(0..=i);
        items.swap(i, j);
    }
}

/// Copy `source` and return it shuffled; the input is left untouched.
#[must_use]
pub fn shuffled<T: Clone, R: Rng + ?Sized>(source: &[T], rng: &mut R) -> Vec<T> {
    let mut out = source.to_vec();
    fisher_yates(&mut out, rng);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::collections::HashMap;

    #[test]
    fn shuffle_is_a_permutation() {
        let mut rng = StdRng::seed_from_u64(7);
        let source: Vec<u32> = (0..50).collect();
        let mut out = shuffled(&source, &mut rng);
        assert_eq!(out.len(), source.len());
        out.sort_unstable();
        assert_eq!(out, source);
    }

    #[test]
    fn empty_and_single_inputs_are_fine() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut empty: Vec<u8> = Vec::new();
        fisher_yates(&mut empty, &mut rng);
        assert!(empty.is_empty());

        let mut one = vec!["only"];
        fisher_yates(&mut one, &mut rng);
        assert_eq!(one, ["only"]);
    }

    #[test]
    fn same_seed_gives_same_order() {
        let source: Vec<u32> = (0..20).collect();
        let a = shuffled(&source, &mut StdRng::seed_from_u64(99));
        let b = shuffled(&source, &mut StdRng::seed_from_u64(99));
        assert_eq!(a, b);
    }

    #[test]
    fn every_position_is_reachable() {
        // 3 elements have 6 permutations; a fair shuffle hits all of them.
        let mut rng = StdRng::seed_from_u64(2024);
        let mut seen: HashMap<Vec<u8>, usize> = HashMap::new();
        for _ in 0..600 {
            *seen.entry(shuffled(&[1u8, 2, 3], &mut rng)).or_default() += 1;
        }
        assert_eq!(seen.len(), 6);
        assert!(seen.values().all(|&n| n > 50));
    }
}
