//! Automatic logging of fit details onto the active run

use std::collections::BTreeMap;

use super::{ActiveRun, TrackingStore};
use crate::evaluation::{classification_metrics, EvaluationDataset};
use crate::training::{FitObserver, FitReport};
use crate::Result;

/// Artifact path of the fitted model summary.
pub const MODEL_SUMMARY_ARTIFACT: &str = "model/summary.json";

/// Artifact path of the serialized fitted model.
pub const MODEL_ARTIFACT: &str = "model/model.json";

/// Input context recorded for the training dataset.
pub const TRAIN_CONTEXT: &str = "train";

/// Estimator family recorded as `estimator_name`.
pub const ESTIMATOR_NAME: &str = "DecisionTree";

/// Fully qualified estimator type recorded as `estimator_class`.
pub const ESTIMATOR_CLASS: &str = "linfa_trees::DecisionTree";

impl<S: TrackingStore> FitObserver for ActiveRun<'_, S> {
    fn on_fit(&mut self, report: &FitReport<'_>) -> Result<()> {
        if !self.autolog_enabled() {
            return Ok(());
        }

        let train = report.train;
        self.log_param("criterion", report.params.criterion)?;
        self.log_param(
            "max_depth",
            report
                .params
                .max_depth
                .map_or_else(|| "None".to_string(), |d| d.to_string()),
        )?;
        self.log_param("n_features", train.n_features())?;
        self.log_param("n_classes", report.model.classes().len())?;
        self.log_param("n_train_rows", train.n_rows())?;

        let predictions = report.model.predict(train.features())?;
        let scores = classification_metrics(&predictions, train.labels())?;
        let metrics = BTreeMap::from([
            ("training_accuracy_score".to_string(), scores.accuracy),
            ("training_precision_score".to_string(), scores.precision),
            ("training_recall_score".to_string(), scores.recall),
            ("training_f1_score".to_string(), scores.f1),
            ("training_score".to_string(), scores.accuracy),
        ]);
        self.log_metrics(&metrics)?;

        self.set_tag("estimator_name", ESTIMATOR_NAME)?;
        self.set_tag("estimator_class", ESTIMATOR_CLASS)?;

        let summary = serde_json::to_vec_pretty(&report.model.summary())?;
        self.log_artifact(MODEL_SUMMARY_ARTIFACT, &summary)?;
        self.log_artifact(MODEL_ARTIFACT, &serde_json::to_vec(report.model)?)?;

        let dataset = EvaluationDataset::from_table(train, TRAIN_CONTEXT)?;
        self.log_dataset(&dataset, TRAIN_CONTEXT)?;

        tracing::debug!(
            run_id = self.run_id(),
            training_accuracy = scores.accuracy,
            "autologged fit"
        );
        Ok(())
    }
}
