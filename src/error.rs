//! Error types for iris-autolog
//!
//! Toyota Way: Clear error messages with actionable guidance (Respect for People)
//!
//! Nothing in the pipeline recovers from these. Every variant propagates to
//! `main` and terminates the process with a non-zero status.

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// iris-autolog error types
#[derive(Error, Debug)]
pub enum Error {
    /// Feature table and label vector (or names) disagree on shape
    #[error("Shape mismatch: {0}")]
    ShapeMismatch(String),

    /// Train/test split cannot be produced with the requested settings
    #[error("Invalid split: {0}")]
    InvalidSplit(String),

    /// Model fit failed inside the toolkit
    #[error("Model fit failed: {0}")]
    Fit(String),

    /// Prediction function returned the wrong number of predictions
    #[error("Prediction length mismatch: expected {expected} predictions, got {actual}")]
    PredictionLength {
        /// Rows in the evaluation dataset
        expected: usize,
        /// Predictions returned by the model
        actual: usize,
    },

    /// Metric computation failed inside the toolkit
    #[error("Evaluation failed: {0}")]
    Evaluation(String),

    /// Evaluation table lacks a required column
    #[error("Column not found: {0}")]
    MissingColumn(String),

    /// Invalid input values
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Environment configuration could not be parsed
    #[error("Configuration error: {0}")]
    Config(String),

    /// Tracking store rejected an operation
    #[error("Tracking error: {0}")]
    Tracking(String),

    /// Parameter re-logged with a different value (params are immutable)
    #[error("Parameter '{key}' already logged for run {run_id} with value '{existing}', refusing '{new}'")]
    ParamConflict {
        /// Run the parameter belongs to
        run_id: String,
        /// Parameter key
        key: String,
        /// Value already stored
        existing: String,
        /// Rejected value
        new: String,
    },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON encode/decode error in the tracking store
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Arrow error
    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    /// Parquet error
    #[error("Parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),
}
