//! Labeled tabular data: feature table, label vector and row identity
//!
//! A [`LabeledTable`] keeps features and labels paired by row. Every row carries
//! a stable row id assigned at load time, so a train/test split can be checked
//! against the full table (disjoint and exhaustive).
//!
//! ```text
//! load_iris() ──> LabeledTable (150 × 4) ──train_test_split──> train (112) + test (38)
//! ```

mod iris;
mod split;

pub use iris::{load_iris, IRIS_FEATURE_NAMES, IRIS_LABEL_NAME};
pub use split::{train_test_split, SplitConfig, TrainTestSplit, DEFAULT_TEST_SIZE};

use crate::{Error, Result};
use ndarray::{Array1, Array2, Axis};
use std::collections::BTreeSet;

/// Feature table plus label vector, paired row by row.
#[derive(Debug, Clone, PartialEq)]
pub struct LabeledTable {
    feature_names: Vec<String>,
    label_name: String,
    features: Array2<f64>,
    labels: Array1<usize>,
    row_ids: Vec<usize>,
}

impl LabeledTable {
    /// Create a table, assigning row ids `0..n`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ShapeMismatch`] if the label vector length differs from
    /// the feature row count, or the number of names differs from the column count.
    pub fn new(
        feature_names: Vec<String>,
        label_name: impl Into<String>,
        features: Array2<f64>,
        labels: Array1<usize>,
    ) -> Result<Self> {
        let row_ids = (0..features.nrows()).collect();
        Self::with_row_ids(feature_names, label_name, features, labels, row_ids)
    }

    fn with_row_ids(
        feature_names: Vec<String>,
        label_name: impl Into<String>,
        features: Array2<f64>,
        labels: Array1<usize>,
        row_ids: Vec<usize>,
    ) -> Result<Self> {
        if labels.len() != features.nrows() {
            return Err(Error::ShapeMismatch(format!(
                "label vector has {} rows, feature table has {}",
                labels.len(),
                features.nrows()
            )));
        }
        if feature_names.len() != features.ncols() {
            return Err(Error::ShapeMismatch(format!(
                "{} feature names for {} feature columns",
                feature_names.len(),
                features.ncols()
            )));
        }
        debug_assert_eq!(row_ids.len(), features.nrows());

        Ok(Self {
            feature_names,
            label_name: label_name.into(),
            features,
            labels,
            row_ids,
        })
    }

    /// Number of rows.
    #[must_use]
    pub fn n_rows(&self) -> usize {
        self.features.nrows()
    }

    /// Number of feature columns.
    #[must_use]
    pub fn n_features(&self) -> usize {
        self.features.ncols()
    }

    /// Feature column names.
    #[must_use]
    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    /// Name of the label column.
    #[must_use]
    pub fn label_name(&self) -> &str {
        &self.label_name
    }

    /// Feature matrix (rows × features).
    #[must_use]
    pub const fn features(&self) -> &Array2<f64> {
        &self.features
    }

    /// Label vector.
    #[must_use]
    pub const fn labels(&self) -> &Array1<usize> {
        &self.labels
    }

    /// Stable row identities, parallel to the rows.
    #[must_use]
    pub fn row_ids(&self) -> &[usize] {
        &self.row_ids
    }

    /// Distinct labels in ascending order.
    #[must_use]
    pub fn classes(&self) -> Vec<usize> {
        self.labels
            .iter()
            .copied()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Take the rows at the given positions, keeping ids and feature/label pairing.
    ///
    /// # Panics
    ///
    /// Panics if a position is out of bounds.
    #[must_use]
    pub fn select_rows(&self, positions: &[usize]) -> Self {
        Self {
            feature_names: self.feature_names.clone(),
            label_name: self.label_name.clone(),
            features: self.features.select(Axis(0), positions),
            labels: self.labels.select(Axis(0), positions),
            row_ids: positions.iter().map(|&p| self.row_ids[p]).collect(),
        }
    }
}
