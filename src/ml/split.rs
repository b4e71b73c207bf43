//! Seeded train/test partition

use crate::structs::{CrimeError, Result, Split};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

/// Partition `0..n_rows` into test and train indices
///
/// The indices are shuffled with a generator seeded by `seed`; the first
/// `round(test_ratio * n_rows)` go to the test set. The same seed always
/// yields the same partition.
///
/// # Errors
/// Returns a config error if `test_ratio` is outside (0, 1) or either side
/// of the split would be empty
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
pub fn train_test_split(n_rows: usize, test_ratio: f64, seed: u64) -> Result<Split> {
    if !(test_ratio > 0.0 && test_ratio < 1.0) {
        return Err(CrimeError::Config(format!(
            "Test ratio must be within (0, 1), got {test_ratio}"
        )));
    }

    let n_test = (test_ratio * n_rows as f64).round() as usize;
    if n_test == 0 || n_test >= n_rows {
        return Err(CrimeError::Config(format!(
            "Test ratio {test_ratio} on {n_rows} rows leaves an empty train or test set"
        )));
    }

    let mut indices: Vec<usize> = (0..n_rows).collect();
    let mut rng = StdRng::seed_from_u64(seed);
    indices.shuffle(&mut rng);

    let train = indices.split_off(n_test);

    Ok(Split {
        seed,
        train,
        test: indices,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_same_seed_same_split() {
        let a = train_test_split(200, 0.2, 12).expect("split");
        let b = train_test_split(200, 0.2, 12).expect("split");
        assert_eq!(a, b);

        let c = train_test_split(200, 0.2, 13).expect("split");
        assert_ne!(a.test, c.test);
    }

    #[test]
    fn test_partition_complete_and_disjoint() {
        let split = train_test_split(101, 0.2, 7).expect("split");

        let train: HashSet<usize> = split.train.iter().copied().collect();
        let test: HashSet<usize> = split.test.iter().copied().collect();

        assert!(train.is_disjoint(&test));
        assert_eq!(train.len() + test.len(), 101);
        assert_eq!(train.union(&test).count(), 101);
        assert!(train.union(&test).all(|&i| i < 101));
    }

    #[test]
    fn test_test_size_is_rounded() {
        assert_eq!(train_test_split(1994, 0.2, 12).expect("split").test.len(), 399);
        assert_eq!(train_test_split(10, 0.25, 0).expect("split").test.len(), 3);
        assert_eq!(train_test_split(100, 0.2, 0).expect("split").train.len(), 80);
    }

    #[test]
    fn test_invalid_ratio() {
        assert!(matches!(train_test_split(10, 0.0, 1), Err(CrimeError::Config(_))));
        assert!(matches!(train_test_split(10, 1.0, 1), Err(CrimeError::Config(_))));
        assert!(matches!(train_test_split(10, f64::NAN, 1), Err(CrimeError::Config(_))));
    }

    #[test]
    fn test_empty_side() {
        assert!(matches!(train_test_split(2, 0.1, 1), Err(CrimeError::Config(_))));
        assert!(matches!(train_test_split(0, 0.5, 1), Err(CrimeError::Config(_))));
    }
}
