//! Fitted decision tree

use linfa::prelude::*;
use linfa_trees::DecisionTree;
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// A fitted classifier plus the schema it was fitted on.
///
/// Serializes to the `model/model.json` run artifact and reloads from it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainedModel {
    tree: DecisionTree<f64, usize>,
    feature_names: Vec<String>,
    classes: Vec<usize>,
}

/// Serializable description of a fitted tree, stored as a run artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelSummary {
    /// Estimator family.
    pub estimator: String,
    /// Depth of the fitted tree.
    pub depth: usize,
    /// Number of leaves.
    pub num_leaves: usize,
    /// Classes seen during fit.
    pub classes: Vec<usize>,
    /// Impurity-based importance per feature, keyed by feature name.
    pub feature_importance: Vec<(String, f64)>,
}

impl TrainedModel {
    pub(super) fn new(
        tree: DecisionTree<f64, usize>,
        feature_names: Vec<String>,
        classes: Vec<usize>,
    ) -> Self {
        Self {
            tree,
            feature_names,
            classes,
        }
    }

    /// Predict one class per row.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ShapeMismatch`] if `features` has a different number
    /// of columns than the training table.
    pub fn predict(&self, features: &Array2<f64>) -> Result<Array1<usize>> {
        if features.ncols() != self.feature_names.len() {
            return Err(Error::ShapeMismatch(format!(
                "model expects {} features, got {}",
                self.feature_names.len(),
                features.ncols()
            )));
        }
        Ok(self.tree.predict(features))
    }

    /// Feature names, in training column order.
    #[must_use]
    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    /// Classes seen during fit, ascending.
    #[must_use]
    pub fn classes(&self) -> &[usize] {
        &self.classes
    }

    /// Depth of the fitted tree.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.tree.max_depth()
    }

    /// Number of leaves.
    #[must_use]
    pub fn num_leaves(&self) -> usize {
        self.tree.num_leaves()
    }

    /// Impurity-based importance per feature, in column order.
    #[must_use]
    pub fn feature_importance(&self) -> Vec<f64> {
        self.tree.feature_importance()
    }

    /// Summary for tracking.
    #[must_use]
    pub fn summary(&self) -> ModelSummary {
        ModelSummary {
            estimator: "DecisionTree".to_string(),
            depth: self.depth(),
            num_leaves: self.num_leaves(),
            classes: self.classes.clone(),
            feature_importance: self
                .feature_names
                .iter()
                .cloned()
                .zip(self.feature_importance())
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::TrainedModel;
    use crate::data::load_iris;
    use crate::training::{NoopObserver, Trainer, TreeParams};
    use crate::Error;
    use ndarray::Array2;

    #[test]
    fn test_predict_length_matches_rows() {
        let iris = load_iris().unwrap();
        let model = Trainer::default().fit(&iris, &mut NoopObserver).unwrap();

        let predictions = model.predict(iris.features()).unwrap();
        assert_eq!(predictions.len(), iris.n_rows());
        assert!(predictions.iter().all(|p| model.classes().contains(p)));
    }

    #[test]
    fn test_predict_rejects_wrong_width() {
        let iris = load_iris().unwrap();
        let model = Trainer::default().fit(&iris, &mut NoopObserver).unwrap();

        let result = model.predict(&Array2::zeros((3, 2)));
        assert!(matches!(result, Err(Error::ShapeMismatch(_))));
    }

    #[test]
    fn test_summary_names_every_feature() {
        let iris = load_iris().unwrap();
        let model = Trainer::default().fit(&iris, &mut NoopObserver).unwrap();
        let summary = model.summary();

        assert_eq!(summary.feature_importance.len(), 4);
        assert_eq!(summary.feature_importance[0].0, "sepal length (cm)");
        assert!(summary.num_leaves >= 3);
        assert_eq!(summary.classes, vec![0, 1, 2]);
    }

    #[test]
    fn test_depth_respects_limit() {
        let iris = load_iris().unwrap();
        let params = TreeParams {
            max_depth: Some(2),
            ..TreeParams::default()
        };
        let model = Trainer::new(params).fit(&iris, &mut NoopObserver).unwrap();
        assert!(model.depth() <= 2);
        assert!(model.num_leaves() >= 2);
    }

    #[test]
    fn test_json_reload_predicts_identically() {
        let iris = load_iris().unwrap();
        let model = Trainer::default().fit(&iris, &mut NoopObserver).unwrap();

        let json = serde_json::to_vec(&model).unwrap();
        let reloaded: TrainedModel = serde_json::from_slice(&json).unwrap();

        assert_eq!(reloaded.feature_names(), model.feature_names());
        assert_eq!(reloaded.classes(), model.classes());
        assert_eq!(
            reloaded.predict(iris.features()).unwrap(),
            model.predict(iris.features()).unwrap()
        );
    }
}
