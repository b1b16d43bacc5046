//! Classification scores from a confusion matrix

use std::collections::BTreeSet;

use linfa::prelude::*;
use ndarray::Array1;
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Scores for one set of predictions against ground truth.
///
/// Precision, recall and F1 are averaged over classes weighted by support.
/// Undefined values (a class never predicted, a single-class MCC) are 0.0.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ClassificationScores {
    /// Fraction of correct predictions.
    pub accuracy: f64,
    /// Support-weighted precision.
    pub precision: f64,
    /// Support-weighted recall.
    pub recall: f64,
    /// Support-weighted F1.
    pub f1: f64,
    /// Matthews correlation coefficient.
    pub mcc: f64,
}

/// Scores for a single class, one-vs-rest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassScore {
    /// Class label.
    pub class: usize,
    /// Fraction of rows predicted as `class` that are `class`.
    pub precision: f64,
    /// Fraction of `class` rows predicted as `class`.
    pub recall: f64,
    /// Harmonic mean of precision and recall.
    pub f1: f64,
    /// Number of rows whose true label is `class`.
    pub support: u64,
}

/// Confusion matrix over the union of true and predicted labels.
///
/// `counts[i][j]` is the number of rows with true label `classes[i]`
/// predicted as `classes[j]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfusionCounts {
    /// Labels, ascending.
    pub classes: Vec<usize>,
    /// Row-major counts, truth by prediction.
    pub counts: Vec<Vec<u64>>,
}

impl ConfusionCounts {
    fn tally(predictions: &Array1<usize>, truth: &Array1<usize>) -> Self {
        let classes: Vec<usize> = truth
            .iter()
            .chain(predictions.iter())
            .copied()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let index = |label: usize| classes.binary_search(&label).unwrap_or_default();

        let mut counts = vec![vec![0u64; classes.len()]; classes.len()];
        for (&t, &p) in truth.iter().zip(predictions.iter()) {
            counts[index(t)][index(p)] += 1;
        }
        Self { classes, counts }
    }

    /// Total number of scored rows.
    #[must_use]
    pub fn total(&self) -> u64 {
        self.counts.iter().flatten().sum()
    }

    /// Rows whose true label is `classes[k]`.
    fn support(&self, k: usize) -> u64 {
        self.counts[k].iter().sum()
    }

    /// Rows predicted as `classes[k]`.
    fn predicted(&self, k: usize) -> u64 {
        self.counts.iter().map(|row| row[k]).sum()
    }

    /// One-vs-rest precision, recall and F1 for every class.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn per_class(&self) -> Vec<ClassScore> {
        let ratio = |num: u64, den: u64| if den == 0 { 0.0 } else { num as f64 / den as f64 };

        self.classes
            .iter()
            .enumerate()
            .map(|(k, &class)| {
                let tp = self.counts[k][k];
                let support = self.support(k);
                let precision = ratio(tp, self.predicted(k));
                let recall = ratio(tp, support);
                let f1 = if precision + recall > 0.0 {
                    2.0 * precision * recall / (precision + recall)
                } else {
                    0.0
                };
                ClassScore {
                    class,
                    precision,
                    recall,
                    f1,
                    support,
                }
            })
            .collect()
    }
}

/// Aggregate scores together with the matrix and per-class rows they came from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassificationReport {
    /// Aggregate scores.
    pub scores: ClassificationScores,
    /// Confusion matrix.
    pub confusion_matrix: ConfusionCounts,
    /// One-vs-rest scores per class.
    pub per_class: Vec<ClassScore>,
}

/// Score `predictions` against `truth`.
///
/// # Errors
///
/// - [`Error::PredictionLength`] if the lengths differ
/// - [`Error::Evaluation`] on empty input or a toolkit failure
pub fn classification_metrics(
    predictions: &Array1<usize>,
    truth: &Array1<usize>,
) -> Result<ClassificationScores> {
    classification_report(predictions, truth).map(|report| report.scores)
}

/// Score `predictions` against `truth`, keeping the confusion matrix and
/// per-class scores.
///
/// # Errors
///
/// Same as [`classification_metrics`].
#[allow(clippy::cast_precision_loss)]
pub fn classification_report(
    predictions: &Array1<usize>,
    truth: &Array1<usize>,
) -> Result<ClassificationReport> {
    if predictions.len() != truth.len() {
        return Err(Error::PredictionLength {
            expected: truth.len(),
            actual: predictions.len(),
        });
    }
    if truth.is_empty() {
        return Err(Error::Evaluation("no rows to score".to_string()));
    }

    let cm = predictions
        .confusion_matrix(truth.view())
        .map_err(|e| Error::Evaluation(e.to_string()))?;

    let confusion_matrix = ConfusionCounts::tally(predictions, truth);
    let per_class = confusion_matrix.per_class();
    let total = confusion_matrix.total() as f64;
    let weighted = |score: fn(&ClassScore) -> f64| {
        per_class
            .iter()
            .map(|c| score(c) * c.support as f64)
            .sum::<f64>()
            / total
    };

    let scores = ClassificationScores {
        accuracy: finite(cm.accuracy()),
        precision: weighted(|c| c.precision),
        recall: weighted(|c| c.recall),
        f1: weighted(|c| c.f1),
        mcc: finite(cm.mcc()),
    };

    Ok(ClassificationReport {
        scores,
        confusion_matrix,
        per_class,
    })
}

fn finite(value: f32) -> f64 {
    let value = f64::from(value);
    if value.is_finite() {
        value
    } else {
        0.0
    }
}
