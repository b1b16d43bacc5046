//! Dataset Input - reference to a dataset consumed by a run

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A dataset logged as an input of a run.
///
/// Only metadata is stored: the digest identifies the content, `schema` and
/// `profile` describe it. `context` says how the run used it (`eval`, `train`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DatasetInput {
    run_id: String,
    name: String,
    digest: String,
    source_type: String,
    schema: serde_json::Value,
    profile: serde_json::Value,
    context: String,
    logged_at: DateTime<Utc>,
}

impl DatasetInput {
    /// Create a dataset input record.
    #[must_use]
    pub fn new(
        run_id: impl Into<String>,
        name: impl Into<String>,
        digest: impl Into<String>,
        source_type: impl Into<String>,
        schema: serde_json::Value,
        profile: serde_json::Value,
        context: impl Into<String>,
    ) -> Self {
        Self {
            run_id: run_id.into(),
            name: name.into(),
            digest: digest.into(),
            source_type: source_type.into(),
            schema,
            profile,
            context: context.into(),
            logged_at: Utc::now(),
        }
    }

    /// Get the run ID.
    #[must_use]
    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    /// Get the dataset name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the content digest.
    #[must_use]
    pub fn digest(&self) -> &str {
        &self.digest
    }

    /// Get the source type (e.g. `memory`).
    #[must_use]
    pub fn source_type(&self) -> &str {
        &self.source_type
    }

    /// Get the column schema.
    #[must_use]
    pub const fn schema(&self) -> &serde_json::Value {
        &self.schema
    }

    /// Get the dataset profile (row and element counts).
    #[must_use]
    pub const fn profile(&self) -> &serde_json::Value {
        &self.profile
    }

    /// Get the usage context.
    #[must_use]
    pub fn context(&self) -> &str {
        &self.context
    }

    /// Get the time the input was logged.
    #[must_use]
    pub const fn logged_at(&self) -> DateTime<Utc> {
        self.logged_at
    }
}
