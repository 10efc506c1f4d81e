// ============================================================
// Layer 4 — Train/Validation Splitter
// ============================================================
// Holds out part of an image-folder dataset when no separate
// test directory is given. The held-out images drive the
// best-weights checkpoint.
//
// Folder loaders return images grouped by class, so the split
// shuffles first; the shuffle is seeded.

use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};

/// Seeded shuffle of `samples`, then the first `train_fraction` of them
/// (rounded) go to training and the rest to validation.
/// Fractions outside `[0, 1]` are clamped.
pub fn split_train_val<T>(mut samples: Vec<T>, train_fraction: f64, seed: u64) -> (Vec<T>, Vec<T>) {
    samples.shuffle(&mut StdRng::seed_from_u64(seed));

    let total     = samples.len();
    let fraction  = train_fraction.clamp(0.0, 1.0);
    let held_out  = samples.split_off(((total as f64) * fraction).round() as usize);

    tracing::debug!(
        "Split {} images: {} train / {} held out (seed {})",
        total, samples.len(), held_out.len(), seed,
    );
    (samples, held_out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn numbers(n: usize) -> Vec<usize> { (0..n).collect() }

    #[test]
    fn test_rounded_sizes_and_nothing_lost() {
        let (train, val) = split_train_val(numbers(10), 0.75, 1);
        assert_eq!((train.len(), val.len()), (8, 2));

        let mut all: Vec<usize> = train.into_iter().chain(val).collect();
        all.sort();
        assert_eq!(all, numbers(10));
    }

    #[test]
    fn test_seed_controls_order() {
        let (a, _) = split_train_val(numbers(30), 0.5, 9);
        let (b, _) = split_train_val(numbers(30), 0.5, 9);
        let (c, _) = split_train_val(numbers(30), 0.5, 10);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_out_of_range_fraction_is_clamped() {
        let (train, val) = split_train_val(numbers(4), 1.5, 0);
        assert_eq!((train.len(), val.len()), (4, 0));
        let (train, val) = split_train_val(numbers(4), -1.0, 0);
        assert_eq!((train.len(), val.len()), (0, 4));
    }

    #[test]
    fn test_empty_input() {
        let (train, val) = split_train_val(Vec::<u8>::new(), 0.8, 0);
        assert!(train.is_empty() && val.is_empty());
    }
}
