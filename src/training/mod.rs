//! Model fit step
//!
//! Wraps `linfa-trees`' CART decision tree. Instead of patching the toolkit to
//! capture what happened during training, [`Trainer::fit`] takes a
//! [`FitObserver`] and reports to it once the model is fitted. An
//! [`ActiveRun`](crate::experiment::ActiveRun) is such an observer; it turns
//! the report into params, training metrics, tags and a model summary when
//! autolog is enabled.

mod model;

pub use model::{ModelSummary, TrainedModel};

use linfa::prelude::*;
use linfa::Dataset;
use linfa_trees::{DecisionTree, SplitQuality};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::data::LabeledTable;
use crate::{Error, Result};

/// Impurity criterion used to choose splits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SplitCriterion {
    /// Gini impurity.
    #[default]
    Gini,
    /// Information gain (entropy).
    Entropy,
}

impl SplitCriterion {
    const fn quality(self) -> SplitQuality {
        match self {
            Self::Gini => SplitQuality::Gini,
            Self::Entropy => SplitQuality::Entropy,
        }
    }
}

impl fmt::Display for SplitCriterion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Gini => write!(f, "gini"),
            Self::Entropy => write!(f, "entropy"),
        }
    }
}

impl std::str::FromStr for SplitCriterion {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "gini" => Ok(Self::Gini),
            "entropy" => Ok(Self::Entropy),
            other => Err(Error::Config(format!(
                "unknown split criterion '{other}' (expected gini or entropy)"
            ))),
        }
    }
}

/// Decision-tree hyperparameters. Defaults match an unconfigured tree:
/// Gini impurity, unbounded depth.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeParams {
    /// Split criterion.
    pub criterion: SplitCriterion,
    /// Maximum tree depth, `None` for unbounded.
    pub max_depth: Option<usize>,
}

/// What the fit step hands to its observer.
#[derive(Debug, Clone, Copy)]
pub struct FitReport<'a> {
    /// Hyperparameters the model was fitted with.
    pub params: &'a TreeParams,
    /// The fitted model.
    pub model: &'a TrainedModel,
    /// Training rows.
    pub train: &'a LabeledTable,
}

/// Collaborator notified after a successful fit.
pub trait FitObserver {
    /// Called once per fit, after the model is built.
    ///
    /// # Errors
    ///
    /// Observer failures abort the fit step.
    fn on_fit(&mut self, report: &FitReport<'_>) -> Result<()>;
}

/// Observer that ignores fits.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl FitObserver for NoopObserver {
    fn on_fit(&mut self, _report: &FitReport<'_>) -> Result<()> {
        Ok(())
    }
}

/// Fits decision trees with fixed hyperparameters.
#[derive(Debug, Clone, Copy, Default)]
pub struct Trainer {
    params: TreeParams,
}

impl Trainer {
    /// Create a trainer.
    #[must_use]
    pub const fn new(params: TreeParams) -> Self {
        Self { params }
    }

    /// Hyperparameters in use.
    #[must_use]
    pub const fn params(&self) -> &TreeParams {
        &self.params
    }

    /// Fit a tree on `train`, then notify `observer`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Fit`] if the toolkit rejects the data (e.g. no rows),
    /// or whatever the observer returns.
    pub fn fit(&self, train: &LabeledTable, observer: &mut dyn FitObserver) -> Result<TrainedModel> {
        if train.n_rows() == 0 {
            return Err(Error::Fit("training table has no rows".to_string()));
        }

        let _span = tracing::info_span!(
            "fit",
            rows = train.n_rows(),
            criterion = %self.params.criterion,
            max_depth = ?self.params.max_depth
        )
        .entered();

        let dataset = Dataset::new(train.features().clone(), train.labels().clone());
        let tree = DecisionTree::<f64, usize>::params()
            .split_quality(self.params.criterion.quality())
            .max_depth(self.params.max_depth)
            .fit(&dataset)
            .map_err(|e| Error::Fit(e.to_string()))?;

        let model = TrainedModel::new(tree, train.feature_names().to_vec(), train.classes());
        tracing::info!(depth = model.depth(), leaves = model.num_leaves(), "fitted decision tree");

        observer.on_fit(&FitReport {
            params: &self.params,
            model: &model,
            train,
        })?;

        Ok(model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn separable_table() -> LabeledTable {
        LabeledTable::new(
            vec!["x".into()],
            "target",
            array![[0.0], [1.0], [10.0], [11.0]],
            array![0, 0, 1, 1],
        )
        .unwrap()
    }

    #[derive(Default)]
    struct CountingObserver {
        calls: usize,
        rows: usize,
    }

    impl FitObserver for CountingObserver {
        fn on_fit(&mut self, report: &FitReport<'_>) -> Result<()> {
            self.calls += 1;
            self.rows = report.train.n_rows();
            Ok(())
        }
    }

    struct FailingObserver;

    impl FitObserver for FailingObserver {
        fn on_fit(&mut self, _report: &FitReport<'_>) -> Result<()> {
            Err(Error::Tracking("store offline".to_string()))
        }
    }

    #[test]
    fn test_fit_perfect_on_separable_data() {
        let table = separable_table();
        let model = Trainer::default().fit(&table, &mut NoopObserver).unwrap();

        let predictions = model.predict(table.features()).unwrap();
        assert_eq!(predictions, array![0, 0, 1, 1]);
    }

    #[test]
    fn test_observer_called_once() {
        let table = separable_table();
        let mut observer = CountingObserver::default();
        Trainer::default().fit(&table, &mut observer).unwrap();

        assert_eq!(observer.calls, 1);
        assert_eq!(observer.rows, 4);
    }

    #[test]
    fn test_observer_failure_propagates() {
        let result = Trainer::default().fit(&separable_table(), &mut FailingObserver);
        assert!(matches!(result, Err(Error::Tracking(_))));
    }

    #[test]
    fn test_max_depth_bounds_tree() {
        let table = LabeledTable::new(
            vec!["x".into()],
            "target",
            array![[0.0], [1.0], [2.0], [3.0], [4.0], [5.0]],
            array![0, 1, 0, 1, 0, 1],
        )
        .unwrap();
        let params = TreeParams {
            criterion: SplitCriterion::Entropy,
            max_depth: Some(1),
        };
        let model = Trainer::new(params).fit(&table, &mut NoopObserver).unwrap();
        assert!(model.depth() <= 1);
    }

    #[test]
    fn test_criterion_parse() {
        assert_eq!("Gini".parse::<SplitCriterion>().unwrap(), SplitCriterion::Gini);
        assert_eq!(" entropy ".parse::<SplitCriterion>().unwrap(), SplitCriterion::Entropy);
        assert!("log_loss".parse::<SplitCriterion>().is_err());
        assert_eq!(SplitCriterion::Entropy.to_string(), "entropy");
    }
}
