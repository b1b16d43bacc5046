//! Experiment Record - named group of runs and where their artifacts live

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Name used when no experiment is configured.
pub const DEFAULT_EXPERIMENT_NAME: &str = "Default";

/// A named experiment.
///
/// Runs are attributed to exactly one experiment, looked up by name and
/// created on first use. `artifact_location` is assigned by the store that
/// created the experiment: a directory for [`FileStore`](super::FileStore),
/// `memory:/<id>` for the in-memory store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ExperimentRecord {
    experiment_id: String,
    name: String,
    artifact_location: String,
    created_at: DateTime<Utc>,
}

impl ExperimentRecord {
    /// Create an experiment record stamped with the current time.
    #[must_use]
    pub fn new(
        experiment_id: impl Into<String>,
        name: impl Into<String>,
        artifact_location: impl Into<String>,
    ) -> Self {
        Self {
            experiment_id: experiment_id.into(),
            name: name.into(),
            artifact_location: artifact_location.into(),
            created_at: Utc::now(),
        }
    }

    /// Store-assigned ID.
    #[must_use]
    pub fn experiment_id(&self) -> &str {
        &self.experiment_id
    }

    /// Human-readable name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Root under which run artifact directories are created.
    #[must_use]
    pub fn artifact_location(&self) -> &str {
        &self.artifact_location
    }

    /// Artifact root of one run in this experiment.
    #[must_use]
    pub fn run_artifact_uri(&self, run_id: &str) -> String {
        format!(
            "{}/{run_id}/artifacts",
            self.artifact_location.trim_end_matches('/')
        )
    }

    /// Creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_artifact_uri() {
        let record = ExperimentRecord::new("0", DEFAULT_EXPERIMENT_NAME, "mlruns/0/");
        assert_eq!(record.run_artifact_uri("abc"), "mlruns/0/abc/artifacts");
    }
}
