//! Train/test split
//!
//! Shuffles row positions and cuts them into a training and a held-out subset.
//! Sizes follow the usual convention: `n_test = ceil(test_size * n)`, the rest
//! trains. With `seed = None` the shuffle draws from OS entropy, so repeated
//! runs see different splits.

use super::LabeledTable;
use crate::{Error, Result};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

/// Default held-out fraction.
pub const DEFAULT_TEST_SIZE: f64 = 0.25;

/// Split settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SplitConfig {
    /// Fraction of rows held out for evaluation, in (0, 1).
    pub test_size: f64,
    /// Shuffle seed. `None` means nondeterministic.
    pub seed: Option<u64>,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            test_size: DEFAULT_TEST_SIZE,
            seed: None,
        }
    }
}

impl SplitConfig {
    /// Settings with a fixed seed and the default test size.
    #[must_use]
    pub fn seeded(seed: u64) -> Self {
        Self {
            seed: Some(seed),
            ..Self::default()
        }
    }
}

/// Training and held-out subsets of one table.
#[derive(Debug, Clone)]
pub struct TrainTestSplit {
    /// Rows used to fit the model.
    pub train: LabeledTable,
    /// Rows held out for evaluation.
    pub test: LabeledTable,
}

/// Partition `table` into disjoint training and test subsets.
///
/// # Errors
///
/// Returns [`Error::InvalidSplit`] if `test_size` is outside (0, 1) or either
/// subset would be empty.
#[allow(clippy::cast_possible_truncation)]
#[allow(clippy::cast_precision_loss)]
#[allow(clippy::cast_sign_loss)]
pub fn train_test_split(table: &LabeledTable, config: &SplitConfig) -> Result<TrainTestSplit> {
    if !(config.test_size > 0.0 && config.test_size < 1.0) {
        return Err(Error::InvalidSplit(format!(
            "test_size must be in (0, 1), got {}",
            config.test_size
        )));
    }

    let n = table.n_rows();
    let n_test = (config.test_size * n as f64).ceil() as usize;
    let n_train = n.saturating_sub(n_test);
    if n_test == 0 || n_train == 0 {
        return Err(Error::InvalidSplit(format!(
            "{n} rows with test_size={} leaves an empty subset (train={n_train}, test={n_test})",
            config.test_size
        )));
    }

    let mut rng = match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let mut positions: Vec<usize> = (0..n).collect();
    positions.shuffle(&mut rng);

    let (test_positions, train_positions) = positions.split_at(n_test);

    tracing::debug!(
        rows = n,
        train = n_train,
        test = n_test,
        seed = ?config.seed,
        "split table"
    );

    Ok(TrainTestSplit {
        train: table.select_rows(train_positions),
        test: table.select_rows(test_positions),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{Array1, Array2};
    use std::collections::BTreeSet;

    #[allow(clippy::cast_precision_loss)]
    fn create_test_table(num_rows: usize) -> LabeledTable {
        let features = Array2::from_shape_fn((num_rows, 2), |(r, c)| (r * 10 + c) as f64);
        let labels = Array1::from_iter((0..num_rows).map(|r| r % 3));
        LabeledTable::new(vec!["a".into(), "b".into()], "target", features, labels).unwrap()
    }

    #[test]
    fn test_default_sizes_150_rows() {
        let table = create_test_table(150);
        let split = train_test_split(&table, &SplitConfig::seeded(7)).unwrap();

        assert_eq!(split.train.n_rows(), 112);
        assert_eq!(split.test.n_rows(), 38);
    }

    #[test]
    fn test_split_is_partition() {
        let table = create_test_table(40);
        let split = train_test_split(&table, &SplitConfig::seeded(1)).unwrap();

        let train: BTreeSet<_> = split.train.row_ids().iter().copied().collect();
        let test: BTreeSet<_> = split.test.row_ids().iter().copied().collect();

        assert!(train.is_disjoint(&test));
        let union: BTreeSet<_> = train.union(&test).copied().collect();
        let all: BTreeSet<_> = table.row_ids().iter().copied().collect();
        assert_eq!(union, all);
    }

    #[test]
    fn test_split_preserves_pairing() {
        let table = create_test_table(30);
        let split = train_test_split(&table, &SplitConfig::seeded(3)).unwrap();

        for (pos, &id) in split.test.row_ids().iter().enumerate() {
            assert_eq!(split.test.labels()[pos], id % 3);
            assert!((split.test.features()[[pos, 0]] - (id * 10) as f64).abs() < f64::EPSILON);
        }
    }

    #[test]
    fn test_same_seed_same_split() {
        let table = create_test_table(50);
        let a = train_test_split(&table, &SplitConfig::seeded(42)).unwrap();
        let b = train_test_split(&table, &SplitConfig::seeded(42)).unwrap();
        assert_eq!(a.test.row_ids(), b.test.row_ids());
    }

    #[test]
    fn test_invalid_test_size() {
        let table = create_test_table(10);
        for test_size in [0.0, 1.0, -0.5, 1.5, f64::NAN] {
            let config = SplitConfig {
                test_size,
                seed: Some(0),
            };
            let result = train_test_split(&table, &config);
            assert!(matches!(result, Err(Error::InvalidSplit(_))), "{test_size}");
        }
    }

    #[test]
    fn test_too_few_rows() {
        let table = create_test_table(1);
        let result = train_test_split(&table, &SplitConfig::seeded(0));
        assert!(matches!(result, Err(Error::InvalidSplit(_))));
    }
}
