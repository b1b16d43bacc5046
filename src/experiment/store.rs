//! Tracking stores
//!
//! [`TrackingStore`] is the persistence seam of the tracking client. Two
//! implementations ship with the crate:
//!
//! - [`ExperimentStore`]: in-memory, for tests and `memory:` tracking URIs
//! - [`FileStore`](super::FileStore): directory-backed, `mlruns`-style layout

use std::collections::HashMap;

use super::{
    ArtifactRecord, DatasetInput, ExperimentRecord, MetricRecord, ParamRecord, RunRecord,
    TagRecord,
};
use crate::{Error, Result};

/// Persistence backend for experiments, runs and run data.
pub trait TrackingStore {
    /// Create an experiment with the given name, assigning its ID.
    ///
    /// # Errors
    ///
    /// Returns an error if an experiment with that name already exists.
    fn create_experiment(&mut self, name: &str) -> Result<ExperimentRecord>;

    /// Look up an experiment by name.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be read.
    fn get_experiment_by_name(&self, name: &str) -> Result<Option<ExperimentRecord>>;

    /// Persist a new run.
    ///
    /// # Errors
    ///
    /// Returns an error if the parent experiment is unknown.
    fn create_run(&mut self, run: &RunRecord) -> Result<()>;

    /// Overwrite the stored lifecycle state of an existing run.
    ///
    /// # Errors
    ///
    /// Returns an error if the run is unknown.
    fn update_run(&mut self, run: &RunRecord) -> Result<()>;

    /// Append a metric point.
    ///
    /// # Errors
    ///
    /// Returns an error if the run is unknown.
    fn log_metric(&mut self, metric: MetricRecord) -> Result<()>;

    /// Record a parameter. Re-logging the same value is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ParamConflict`] if the key already holds another value.
    fn log_param(&mut self, param: ParamRecord) -> Result<()>;

    /// Set (or overwrite) a tag.
    ///
    /// # Errors
    ///
    /// Returns an error if the run is unknown.
    fn set_tag(&mut self, tag: TagRecord) -> Result<()>;

    /// Record a dataset input.
    ///
    /// # Errors
    ///
    /// Returns an error if the run is unknown.
    fn log_input(&mut self, input: DatasetInput) -> Result<()>;

    /// Store artifact bytes at `path` under the run.
    ///
    /// # Errors
    ///
    /// Returns an error if the run is unknown or the bytes cannot be written.
    fn log_artifact(&mut self, run_id: &str, path: &str, bytes: &[u8]) -> Result<ArtifactRecord>;

    /// Look up an experiment by name, creating it if missing.
    ///
    /// # Errors
    ///
    /// Propagates lookup and creation errors.
    fn get_or_create_experiment(&mut self, name: &str) -> Result<ExperimentRecord> {
        match self.get_experiment_by_name(name)? {
            Some(experiment) => Ok(experiment),
            None => self.create_experiment(name),
        }
    }
}

impl<T: TrackingStore + ?Sized> TrackingStore for Box<T> {
    fn create_experiment(&mut self, name: &str) -> Result<ExperimentRecord> {
        (**self).create_experiment(name)
    }

    fn get_experiment_by_name(&self, name: &str) -> Result<Option<ExperimentRecord>> {
        (**self).get_experiment_by_name(name)
    }

    fn create_run(&mut self, run: &RunRecord) -> Result<()> {
        (**self).create_run(run)
    }

    fn update_run(&mut self, run: &RunRecord) -> Result<()> {
        (**self).update_run(run)
    }

    fn log_metric(&mut self, metric: MetricRecord) -> Result<()> {
        (**self).log_metric(metric)
    }

    fn log_param(&mut self, param: ParamRecord) -> Result<()> {
        (**self).log_param(param)
    }

    fn set_tag(&mut self, tag: TagRecord) -> Result<()> {
        (**self).set_tag(tag)
    }

    fn log_input(&mut self, input: DatasetInput) -> Result<()> {
        (**self).log_input(input)
    }

    fn log_artifact(&mut self, run_id: &str, path: &str, bytes: &[u8]) -> Result<ArtifactRecord> {
        (**self).log_artifact(run_id, path, bytes)
    }
}

/// In-memory store for experiment tracking data.
///
/// ## Design
///
/// Experiments and runs live in hash maps for O(1) lookups by ID. Run data
/// (metrics, params, tags, inputs, artifacts) is kept in insertion order and
/// filtered per run on query.
///
/// ## Time-Series Optimization
///
/// The `get_metrics_for_run` function returns metrics ordered by step.
#[derive(Debug, Default)]
pub struct ExperimentStore {
    experiments: HashMap<String, ExperimentRecord>,
    runs: HashMap<String, RunRecord>,
    metrics: Vec<MetricRecord>,
    params: Vec<ParamRecord>,
    tags: Vec<TagRecord>,
    inputs: Vec<DatasetInput>,
    artifacts: Vec<(ArtifactRecord, Vec<u8>)>,
}

impl ExperimentStore {
    /// Create a new empty experiment store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if the store is empty (no experiments, runs, or metrics).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.experiments.is_empty() && self.runs.is_empty() && self.metrics.is_empty()
    }

    /// Get the number of experiments in the store.
    #[must_use]
    pub fn experiment_count(&self) -> usize {
        self.experiments.len()
    }

    /// Get the number of runs in the store.
    #[must_use]
    pub fn run_count(&self) -> usize {
        self.runs.len()
    }

    /// Get the number of metrics in the store.
    #[must_use]
    pub fn metric_count(&self) -> usize {
        self.metrics.len()
    }

    /// Get an experiment by ID.
    #[must_use]
    pub fn get_experiment(&self, experiment_id: &str) -> Option<&ExperimentRecord> {
        self.experiments.get(experiment_id)
    }

    /// Get a run by ID.
    #[must_use]
    pub fn get_run(&self, run_id: &str) -> Option<&RunRecord> {
        self.runs.get(run_id)
    }

    /// Get all runs for an experiment.
    #[must_use]
    pub fn get_runs_for_experiment(&self, experiment_id: &str) -> Vec<&RunRecord> {
        self.runs
            .values()
            .filter(|run| run.experiment_id() == experiment_id)
            .collect()
    }

    /// Get metrics for a specific run and key, ordered by step.
    #[must_use]
    pub fn get_metrics_for_run(&self, run_id: &str, key: &str) -> Vec<MetricRecord> {
        let mut metrics: Vec<MetricRecord> = self
            .metrics
            .iter()
            .filter(|m| m.run_id() == run_id && m.key() == key)
            .cloned()
            .collect();

        metrics.sort_by_key(MetricRecord::step);

        metrics
    }

    /// Latest value of every metric key logged for a run.
    #[must_use]
    pub fn get_latest_metrics(&self, run_id: &str) -> HashMap<String, f64> {
        let mut latest: HashMap<String, (u64, f64)> = HashMap::new();
        for m in self.metrics.iter().filter(|m| m.run_id() == run_id) {
            let entry = latest.entry(m.key().to_string()).or_insert((m.step(), m.value()));
            if m.step() >= entry.0 {
                *entry = (m.step(), m.value());
            }
        }
        latest.into_iter().map(|(k, (_, v))| (k, v)).collect()
    }

    /// Get all params of a run.
    #[must_use]
    pub fn get_params_for_run(&self, run_id: &str) -> HashMap<String, String> {
        self.params
            .iter()
            .filter(|p| p.run_id() == run_id)
            .map(|p| (p.key().to_string(), p.value().to_string()))
            .collect()
    }

    /// Get all tags of a run.
    #[must_use]
    pub fn get_tags_for_run(&self, run_id: &str) -> HashMap<String, String> {
        self.tags
            .iter()
            .filter(|t| t.run_id() == run_id)
            .map(|t| (t.key().to_string(), t.value().to_string()))
            .collect()
    }

    /// Get dataset inputs of a run, in logging order.
    #[must_use]
    pub fn get_inputs_for_run(&self, run_id: &str) -> Vec<&DatasetInput> {
        self.inputs.iter().filter(|i| i.run_id() == run_id).collect()
    }

    /// Get artifact records of a run, in logging order.
    #[must_use]
    pub fn get_artifacts_for_run(&self, run_id: &str) -> Vec<&ArtifactRecord> {
        self.artifacts
            .iter()
            .filter(|(a, _)| a.run_id() == run_id)
            .map(|(a, _)| a)
            .collect()
    }

    /// Get the stored bytes of an artifact.
    #[must_use]
    pub fn artifact_bytes(&self, run_id: &str, path: &str) -> Option<&[u8]> {
        self.artifacts
            .iter()
            .rev()
            .find(|(a, _)| a.run_id() == run_id && a.path() == path)
            .map(|(_, bytes)| bytes.as_slice())
    }

    fn require_run(&self, run_id: &str) -> Result<()> {
        if self.runs.contains_key(run_id) {
            Ok(())
        } else {
            Err(Error::Tracking(format!("unknown run '{run_id}'")))
        }
    }
}

impl TrackingStore for ExperimentStore {
    fn create_experiment(&mut self, name: &str) -> Result<ExperimentRecord> {
        if self.get_experiment_by_name(name)?.is_some() {
            return Err(Error::Tracking(format!("experiment '{name}' already exists")));
        }
        let id = self.experiments.len().to_string();
        let location = format!("memory:/{id}");
        let experiment = ExperimentRecord::new(id, name, location);
        self.experiments
            .insert(experiment.experiment_id().to_string(), experiment.clone());
        Ok(experiment)
    }

    fn get_experiment_by_name(&self, name: &str) -> Result<Option<ExperimentRecord>> {
        Ok(self.experiments.values().find(|e| e.name() == name).cloned())
    }

    fn create_run(&mut self, run: &RunRecord) -> Result<()> {
        if !self.experiments.contains_key(run.experiment_id()) {
            return Err(Error::Tracking(format!(
                "unknown experiment '{}'",
                run.experiment_id()
            )));
        }
        self.runs.insert(run.run_id().to_string(), run.clone());
        Ok(())
    }

    fn update_run(&mut self, run: &RunRecord) -> Result<()> {
        self.require_run(run.run_id())?;
        self.runs.insert(run.run_id().to_string(), run.clone());
        Ok(())
    }

    fn log_metric(&mut self, metric: MetricRecord) -> Result<()> {
        self.require_run(metric.run_id())?;
        self.metrics.push(metric);
        Ok(())
    }

    fn log_param(&mut self, param: ParamRecord) -> Result<()> {
        self.require_run(param.run_id())?;
        if let Some(existing) = self
            .params
            .iter()
            .find(|p| p.run_id() == param.run_id() && p.key() == param.key())
        {
            if existing.value() == param.value() {
                return Ok(());
            }
            return Err(Error::ParamConflict {
                run_id: param.run_id().to_string(),
                key: param.key().to_string(),
                existing: existing.value().to_string(),
                new: param.value().to_string(),
            });
        }
        self.params.push(param);
        Ok(())
    }

    fn set_tag(&mut self, tag: TagRecord) -> Result<()> {
        self.require_run(tag.run_id())?;
        self.tags
            .retain(|t| !(t.run_id() == tag.run_id() && t.key() == tag.key()));
        self.tags.push(tag);
        Ok(())
    }

    fn log_input(&mut self, input: DatasetInput) -> Result<()> {
        self.require_run(input.run_id())?;
        self.inputs.push(input);
        Ok(())
    }

    fn log_artifact(&mut self, run_id: &str, path: &str, bytes: &[u8]) -> Result<ArtifactRecord> {
        self.require_run(run_id)?;
        let record = ArtifactRecord::for_bytes(run_id, path, bytes);
        self.artifacts.push((record.clone(), bytes.to_vec()));
        Ok(record)
    }
}
