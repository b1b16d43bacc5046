//! Experiment tracking client
//!
//! Records experiments, runs and everything a run produces. The active run is
//! an explicit value ([`ActiveRun`]) borrowed from the [`TrackingClient`], not
//! ambient process state: whatever logs to a run has to be handed the run.
//!
//! ## Schema Overview
//!
//! ```text
//! ExperimentRecord (1) ──< RunRecord (N)
//!                              │
//!                              ├──< ParamRecord (N)   [write-once]
//!                              ├──< TagRecord (N)
//!                              ├──< MetricRecord (N)  [time-series]
//!                              ├──< DatasetInput (N)
//!                              └──< ArtifactRecord (N) [CAS]
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use iris_autolog::experiment::{ExperimentStore, RunStatus, TrackingClient};
//!
//! let mut client = TrackingClient::new(ExperimentStore::new());
//! let mut run = client.start_run("Default")?;
//! run.log_param("max_depth", 3)?;
//! run.log_metric("accuracy_score", 0.95)?;
//! run.finish(RunStatus::Success)?;
//! # Ok::<(), iris_autolog::Error>(())
//! ```

mod artifact_record;
mod autolog;
mod client;
mod dataset_input;
mod experiment_record;
mod file_store;
mod metric_record;
mod param_record;
mod run_record;
mod store;
mod uri;

pub use artifact_record::{cas_hash, ArtifactRecord};
pub(crate) use artifact_record::hex;
pub use autolog::{
    ESTIMATOR_CLASS, ESTIMATOR_NAME, MODEL_ARTIFACT, MODEL_SUMMARY_ARTIFACT, TRAIN_CONTEXT,
};
pub use client::{ActiveRun, TrackingClient};
pub use dataset_input::DatasetInput;
pub use experiment_record::{ExperimentRecord, DEFAULT_EXPERIMENT_NAME};
pub use file_store::FileStore;
pub use metric_record::MetricRecord;
pub use param_record::{ParamRecord, TagRecord};
pub use run_record::{RunRecord, RunRecordBuilder, RunStatus};
pub use store::{ExperimentStore, TrackingStore};
pub use uri::{TrackingUri, DEFAULT_TRACKING_URI};

use crate::{Error, Result};

/// Longest accepted key or artifact path.
pub const MAX_KEY_LEN: usize = 250;

/// Check that a metric/param/tag key or artifact path is safe to use as a
/// relative file path: non-empty, bounded, `[A-Za-z0-9_.\- /]` only, no
/// leading `/` and no `.`/`..` segments.
///
/// # Errors
///
/// Returns [`Error::InvalidInput`] describing the offending key.
pub fn validate_key(kind: &str, key: &str) -> Result<()> {
    let invalid = |why: &str| Err(Error::InvalidInput(format!("invalid {kind} '{key}': {why}")));

    if key.is_empty() {
        return invalid("empty");
    }
    if key.len() > MAX_KEY_LEN {
        return invalid("too long");
    }
    if !key
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.' | ' ' | '/'))
    {
        return invalid("unsupported character");
    }
    if key.starts_with('/') {
        return invalid("absolute path");
    }
    if key.split('/').any(|seg| seg.is_empty() || seg == "." || seg == "..") {
        return invalid("empty or relative path segment");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_key_accepts_common_keys() {
        for key in ["accuracy_score", "training_f1_score", "model/summary.json", "eval results"] {
            assert!(validate_key("metric", key).is_ok(), "{key}");
        }
    }

    #[test]
    fn test_validate_key_rejects_unsafe_keys() {
        let too_long = "k".repeat(MAX_KEY_LEN + 1);
        for key in ["", "/etc/passwd", "a/../b", "..", "a//b", "semi;colon", "tab\t", &too_long] {
            assert!(validate_key("metric", key).is_err(), "{key:?}");
        }
    }
}
