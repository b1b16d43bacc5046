//! Held-out evaluation
//!
//! [`evaluate`] runs a prediction function over an [`EvaluationDataset`],
//! scores the predictions as a classifier and records everything on the
//! active run: the dataset as an `eval` input, each metric, the confusion
//! matrix with per-class scores, and the per-row results table as a Parquet
//! artifact.

mod dataset;
mod metrics;

pub use dataset::{to_parquet_bytes, EvaluationDataset, MEMORY_SOURCE, PREDICTION_COLUMN};
pub use metrics::{
    classification_metrics, classification_report, ClassScore, ClassificationReport,
    ClassificationScores, ConfusionCounts,
};

use std::collections::BTreeMap;
use std::fmt;

use ndarray::{Array1, Array2};
use serde::Serialize;

use crate::experiment::{ActiveRun, TrackingStore};
use crate::training::TrainedModel;
use crate::{Error, Result};

/// Artifact path of the per-row evaluation table.
pub const EVAL_TABLE_ARTIFACT: &str = "eval_results_table.parquet";

/// Artifact path of the confusion matrix and per-class scores.
pub const CONFUSION_MATRIX_ARTIFACT: &str = "confusion_matrix.json";

/// Input context recorded for evaluation datasets.
pub const EVAL_CONTEXT: &str = "eval";

/// Kind of model being evaluated. Selects the metric set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ModelType {
    /// Multi-class classifier.
    #[default]
    Classifier,
}

impl fmt::Display for ModelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Classifier => write!(f, "classifier"),
        }
    }
}

/// Anything that maps a feature matrix to one class per row.
pub trait Predictor {
    /// Predict classes for every row of `features`.
    ///
    /// # Errors
    ///
    /// Implementation specific.
    fn predict(&self, features: &Array2<f64>) -> Result<Array1<usize>>;
}

impl<F> Predictor for F
where
    F: Fn(&Array2<f64>) -> Result<Array1<usize>>,
{
    fn predict(&self, features: &Array2<f64>) -> Result<Array1<usize>> {
        self(features)
    }
}

impl Predictor for TrainedModel {
    fn predict(&self, features: &Array2<f64>) -> Result<Array1<usize>> {
        TrainedModel::predict(self, features)
    }
}

/// Metrics produced by an evaluation, keyed by metric name.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct EvaluationResult {
    metrics: BTreeMap<String, f64>,
}

impl EvaluationResult {
    /// All metrics.
    #[must_use]
    pub const fn metrics(&self) -> &BTreeMap<String, f64> {
        &self.metrics
    }

    /// One metric by name.
    #[must_use]
    pub fn metric(&self, key: &str) -> Option<f64> {
        self.metrics.get(key).copied()
    }
}

impl fmt::Display for EvaluationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let json = serde_json::to_string(&self.metrics).map_err(|_| fmt::Error)?;
        f.write_str(&json)
    }
}

/// Evaluate `predictor` on `data`, logging results to `run`.
///
/// Metrics: `example_count`, `accuracy_score`, `precision_score`,
/// `recall_score`, `f1_score`, `matthews_corrcoef`.
///
/// # Errors
///
/// - [`Error::PredictionLength`] if the predictor returns the wrong number of rows
/// - whatever the predictor, scoring or tracking store returns
pub fn evaluate<P, S>(
    predictor: &P,
    data: &EvaluationDataset,
    model_type: ModelType,
    run: &mut ActiveRun<'_, S>,
) -> Result<EvaluationResult>
where
    P: Predictor + ?Sized,
    S: TrackingStore,
{
    let _span = tracing::info_span!(
        "evaluate",
        dataset = data.name(),
        rows = data.num_rows(),
        %model_type
    )
    .entered();

    let predictions = predictor.predict(data.features())?;
    if predictions.len() != data.num_rows() {
        return Err(Error::PredictionLength {
            expected: data.num_rows(),
            actual: predictions.len(),
        });
    }

    let report = match model_type {
        ModelType::Classifier => classification_report(&predictions, data.labels())?,
    };
    let metrics = classifier_metrics(&report, data.num_rows());

    run.log_dataset(data, EVAL_CONTEXT)?;
    run.log_metrics(&metrics)?;
    run.log_artifact(CONFUSION_MATRIX_ARTIFACT, &serde_json::to_vec_pretty(&report)?)?;

    let table = data.with_predictions(&predictions)?;
    let artifact = run.log_artifact(EVAL_TABLE_ARTIFACT, &to_parquet_bytes(&table)?)?;
    tracing::debug!(path = artifact.path(), size = artifact.size_bytes(), "logged evaluation table");

    tracing::info!(
        accuracy = metrics.get("accuracy_score").copied().unwrap_or_default(),
        "evaluation complete"
    );

    Ok(EvaluationResult { metrics })
}

#[allow(clippy::cast_precision_loss)]
fn classifier_metrics(report: &ClassificationReport, num_rows: usize) -> BTreeMap<String, f64> {
    let scores = &report.scores;
    BTreeMap::from([
        ("example_count".to_string(), num_rows as f64),
        ("accuracy_score".to_string(), scores.accuracy),
        ("precision_score".to_string(), scores.precision),
        ("recall_score".to_string(), scores.recall),
        ("f1_score".to_string(), scores.f1),
        ("matthews_corrcoef".to_string(), scores.mcc),
    ])
}
