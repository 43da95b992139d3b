// THEORY:
// The reducer answers: "which undesired colors should the tracker actively exclude
// so that the simulated accuracy lands near the operator's target?"
//
//   required_undesired = total_unique * (100 - target) / 100
//   required_count     = round(required_undesired)
//
// Then `required_count` colors are drawn uniformly, without replacement, from the
// corpus' undesired set. If the set is too small, or the count rounds to zero, the
// whole undesired set is returned instead.
//
// A higher target therefore yields fewer colors to exclude, and a lower target more.
// That direction is what the calibration files downstream expect and is kept as is.
//
// The random source is a parameter. Production passes an entropy-seeded generator;
// tests and `--seed` runs pass a seeded `StdRng` and get the same subset every time,
// because `ColorSet` iterates in a fixed order.

use crate::core_modules::color_set::ColorSet;
use crate::core_modules::hsv::HsvColor;
use rand::Rng;
use rand::seq::index;
use tracing::debug;

/// Unrounded number of undesired colors to exclude for `target_accuracy`.
pub fn required_undesired(total_unique: usize, target_accuracy: u8) -> f64 {
    let target = target_accuracy.min(100) as f64;
    total_unique as f64 * (100.0 - target) / 100.0
}

/// `round(required_undesired)`, with exact halves going to the even neighbour.
pub fn required_count(total_unique: usize, target_accuracy: u8) -> usize {
    required_undesired(total_unique, target_accuracy).round_ties_even() as usize
}

/// Picks the calibrated subset of `undesired`.
///
/// Returns `required_count` colors sampled without replacement when
/// `0 < required_count <= |undesired|`, otherwise every undesired color.
/// The result is never larger than `undesired`.
pub fn select_required<R: Rng + ?Sized>(undesired: &ColorSet, required_count: usize, rng: &mut R) -> Vec<HsvColor> {
    let pool = undesired.to_vec();
    if required_count == 0 || required_count > pool.len() {
        debug!(required_count, available = pool.len(), "taking the whole undesired set");
        return pool;
    }

    let mut picked: Vec<usize> = index::sample(rng, pool.len(), required_count).into_vec();
    picked.sort_unstable();
    debug!(required_count, available = pool.len(), "sampled undesired subset");
    picked.into_iter().map(|i| pool[i]).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::collections::HashSet;

    fn undesired(n: usize) -> ColorSet {
        (0..n).map(|i| HsvColor::new((i % 180) as u8, (i / 180) as u8, 7)).collect()
    }

    #[test]
    fn required_count_examples() {
        assert_eq!(required_count(100, 80), 20);
        assert_eq!(required_count(100, 100), 0);
        assert_eq!(required_count(100, 0), 100);
        assert_eq!(required_count(0, 50), 0);
        assert_relative_eq!(required_undesired(7, 50), 3.5);
        assert_eq!(required_count(7, 50), 4);
        assert_eq!(required_count(5, 50), 2);
    }

    #[test]
    fn higher_target_means_fewer_exclusions() {
        let mut previous = usize::MAX;
        for target in 0..=100u8 {
            let count = required_count(250, target);
            assert!(count <= previous);
            previous = count;
        }
    }

    #[test]
    fn samples_exactly_required_count_without_replacement() {
        let set = undesired(50);
        let mut rng = StdRng::seed_from_u64(7);
        let picked = select_required(&set, 20, &mut rng);
        assert_eq!(picked.len(), 20);
        let unique: HashSet<_> = picked.iter().copied().collect();
        assert_eq!(unique.len(), 20);
        assert!(picked.iter().all(|&c| set.contains(c)));
    }

    #[test]
    fn seeded_generators_pick_the_same_subset() {
        let set = undesired(500);
        let a = select_required(&set, 37, &mut StdRng::seed_from_u64(42));
        let b = select_required(&set, 37, &mut StdRng::seed_from_u64(42));
        assert_eq!(a, b);
    }

    #[test]
    fn falls_back_to_the_whole_set() {
        let set = undesired(5);
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(select_required(&set, 6, &mut rng), set.to_vec());
        assert_eq!(select_required(&set, 0, &mut rng), set.to_vec());
        assert_eq!(select_required(&set, 5, &mut rng).len(), 5);
        assert!(select_required(&ColorSet::new(), 3, &mut rng).is_empty());
    }
}
