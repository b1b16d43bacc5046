//! Tracking client and the explicit active-run context

use std::collections::BTreeMap;

use super::{
    validate_key, ArtifactRecord, DatasetInput, MetricRecord, ParamRecord, RunRecord, RunStatus,
    TagRecord, TrackingStore,
};
use crate::evaluation::EvaluationDataset;
use crate::Result;

/// Entry point for recording runs into a [`TrackingStore`].
#[derive(Debug)]
pub struct TrackingClient<S: TrackingStore> {
    store: S,
    autolog: bool,
}

impl<S: TrackingStore> TrackingClient<S> {
    /// Create a client over `store` with autolog disabled.
    pub const fn new(store: S) -> Self {
        Self {
            store,
            autolog: false,
        }
    }

    /// Enable automatic logging of fit parameters, training metrics and the
    /// model summary for runs started afterwards.
    pub fn autolog(&mut self) {
        tracing::debug!("autolog enabled");
        self.autolog = true;
    }

    /// Whether autolog is enabled.
    #[must_use]
    pub const fn autolog_enabled(&self) -> bool {
        self.autolog
    }

    /// Borrow the underlying store.
    #[must_use]
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Consume the client, returning the store.
    pub fn into_store(self) -> S {
        self.store
    }

    /// Start a run in the named experiment (created on first use).
    ///
    /// The returned [`ActiveRun`] borrows the client, so at most one run is
    /// active at a time.
    ///
    /// # Errors
    ///
    /// Returns an error if the experiment or run cannot be persisted.
    pub fn start_run(&mut self, experiment_name: &str) -> Result<ActiveRun<'_, S>> {
        let experiment = self.store.get_or_create_experiment(experiment_name)?;
        let run_id = uuid::Uuid::new_v4().simple().to_string();

        let mut run = RunRecord::new(run_id, experiment.experiment_id());
        run.start();
        self.store.create_run(&run)?;

        tracing::info!(
            run_id = run.run_id(),
            run_name = run.run_name(),
            experiment = experiment.name(),
            artifact_uri = %experiment.run_artifact_uri(run.run_id()),
            "started run"
        );

        Ok(ActiveRun {
            store: &mut self.store,
            run,
            autolog: self.autolog,
            finished: false,
        })
    }
}

/// A started run. Everything logged through it is attributed to this run.
///
/// Dropping an unfinished run ends it as [`RunStatus::Failed`].
#[derive(Debug)]
pub struct ActiveRun<'a, S: TrackingStore> {
    store: &'a mut S,
    run: RunRecord,
    autolog: bool,
    finished: bool,
}

impl<S: TrackingStore> ActiveRun<'_, S> {
    /// Get the run ID.
    #[must_use]
    pub fn run_id(&self) -> &str {
        self.run.run_id()
    }

    /// Get the run's lifecycle record.
    #[must_use]
    pub const fn record(&self) -> &RunRecord {
        &self.run
    }

    /// Whether autolog was enabled when the run started.
    #[must_use]
    pub const fn autolog_enabled(&self) -> bool {
        self.autolog
    }

    /// Record a parameter (write-once).
    ///
    /// # Errors
    ///
    /// Returns an error for invalid keys or a conflicting earlier value.
    pub fn log_param(&mut self, key: &str, value: impl ToString) -> Result<()> {
        validate_key("param", key)?;
        self.store
            .log_param(ParamRecord::new(self.run.run_id(), key, value.to_string()))
    }

    /// Record a metric at step 0.
    ///
    /// # Errors
    ///
    /// Returns an error for invalid keys or store failures.
    pub fn log_metric(&mut self, key: &str, value: f64) -> Result<()> {
        self.log_metric_at(key, value, 0)
    }

    /// Record a metric at the given step.
    ///
    /// # Errors
    ///
    /// Returns an error for invalid keys or store failures.
    pub fn log_metric_at(&mut self, key: &str, value: f64, step: u64) -> Result<()> {
        validate_key("metric", key)?;
        self.store
            .log_metric(MetricRecord::new(self.run.run_id(), key, step, value))
    }

    /// Record every entry of a metrics mapping at step 0.
    ///
    /// # Errors
    ///
    /// Stops at the first failing metric.
    pub fn log_metrics(&mut self, metrics: &BTreeMap<String, f64>) -> Result<()> {
        for (key, value) in metrics {
            self.log_metric(key, *value)?;
        }
        Ok(())
    }

    /// Set a tag.
    ///
    /// # Errors
    ///
    /// Returns an error for invalid keys or store failures.
    pub fn set_tag(&mut self, key: &str, value: impl ToString) -> Result<()> {
        validate_key("tag", key)?;
        self.store
            .set_tag(TagRecord::new(self.run.run_id(), key, value.to_string()))
    }

    /// Record a dataset input with its usage context.
    ///
    /// # Errors
    ///
    /// Returns an error for store failures.
    pub fn log_input(
        &mut self,
        name: &str,
        digest: &str,
        source_type: &str,
        schema: serde_json::Value,
        profile: serde_json::Value,
        context: &str,
    ) -> Result<()> {
        tracing::debug!(run_id = self.run.run_id(), name, digest, context, "logging dataset input");
        self.store.log_input(DatasetInput::new(
            self.run.run_id(),
            name,
            digest,
            source_type,
            schema,
            profile,
            context,
        ))
    }

    /// Record `data` as an input of this run, in `context`.
    ///
    /// # Errors
    ///
    /// Returns an error for store failures.
    pub fn log_dataset(&mut self, data: &EvaluationDataset, context: &str) -> Result<()> {
        self.log_input(
            data.name(),
            data.digest(),
            data.source_type(),
            data.schema_json(),
            data.profile_json(),
            context,
        )
    }

    /// Store artifact bytes at `path` under the run.
    ///
    /// # Errors
    ///
    /// Returns an error for invalid paths or store failures.
    pub fn log_artifact(&mut self, path: &str, bytes: &[u8]) -> Result<ArtifactRecord> {
        validate_key("artifact path", path)?;
        self.store.log_artifact(self.run.run_id(), path, bytes)
    }

    /// End the run with `status`, returning its final record.
    ///
    /// # Errors
    ///
    /// Returns an error if the final state cannot be persisted.
    pub fn finish(mut self, status: RunStatus) -> Result<RunRecord> {
        self.finished = true;
        self.run.complete(status);
        self.store.update_run(&self.run)?;
        tracing::info!(run_id = self.run.run_id(), ?status, "finished run");
        Ok(self.run.clone())
    }
}

impl<S: TrackingStore> Drop for ActiveRun<'_, S> {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        self.run.complete(RunStatus::Failed);
        if let Err(e) = self.store.update_run(&self.run) {
            tracing::warn!(run_id = self.run.run_id(), error = %e, "could not mark abandoned run as failed");
        } else {
            tracing::warn!(run_id = self.run.run_id(), "run dropped before finish, marked failed");
        }
    }
}
