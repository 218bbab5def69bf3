//! Seeded train/test partitioning.

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SplitError {
    #[error("Test fraction {0} must be strictly between 0 and 1")]
    InvalidFraction(f64),
    #[error("Cannot split {rows} rows into non-empty train ({train}) and test ({test}) sets")]
    TooFewRows {
        rows: usize,
        train: usize,
        test: usize,
    },
}

/// Row indices of a train/test partition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitIndices {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

/// Shuffle `0..rows` with `seed` and carve off `ceil(rows * test_fraction)` test rows.
pub fn train_test_split(
    rows: usize,
    test_fraction: f64,
    seed: u64,
) -> Result<SplitIndices, SplitError> {
    if !(test_fraction > 0.0 && test_fraction < 1.0) {
        return Err(SplitError::InvalidFraction(test_fraction));
    }
    let n_test = (rows as f64 * test_fraction).ceil() as usize;
    let n_train = rows.saturating_sub(n_test);
    if n_test == 0 || n_train == 0 {
        return Err(SplitError::TooFewRows {
            rows,
            train: n_train,
            test: n_test,
        });
    }
    let mut indices: Vec<usize> = (0..rows).collect();
    let mut rng = StdRng::seed_from_u64(seed);
    indices.shuffle(&mut rng);
    let train = indices.split_off(n_test);
    Ok(SplitIndices {
        train,
        test: indices,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_sizes_follow_ceil_rule() {
        let split = train_test_split(101, 0.2, 42).unwrap();
        assert_eq!(split.test.len(), 21);
        assert_eq!(split.train.len(), 80);
    }

    #[test]
    fn split_is_a_seeded_partition() {
        let a = train_test_split(50, 0.2, 42).unwrap();
        let b = train_test_split(50, 0.2, 42).unwrap();
        assert_eq!(a, b);
        let mut all: Vec<usize> = a.train.iter().chain(&a.test).copied().collect();
        all.sort_unstable();
        assert_eq!(all, (0..50).collect::<Vec<_>>());
        assert_ne!(a, train_test_split(50, 0.2, 7).unwrap());
    }

    #[test]
    fn rejects_degenerate_inputs() {
        assert_eq!(
            train_test_split(10, 1.0, 42),
            Err(SplitError::InvalidFraction(1.0))
        );
        assert!(matches!(
            train_test_split(1, 0.2, 42),
            Err(SplitError::TooFewRows { rows: 1, .. })
        ));
    }
}
