//! Directory-backed tracking store
//!
//! Layout (one directory per experiment, one per run):
//!
//! ```text
//! <root>/<experiment_id>/meta.json
//! <root>/<experiment_id>/<run_id>/meta.json
//! <root>/<experiment_id>/<run_id>/metrics/<key>     "<ts_ms> <value> <step>" per line
//! <root>/<experiment_id>/<run_id>/params/<key>
//! <root>/<experiment_id>/<run_id>/tags/<key>
//! <root>/<experiment_id>/<run_id>/inputs/<context>-<digest>.json
//! <root>/<experiment_id>/<run_id>/artifacts/<path>
//! ```
//!
//! Keys may contain `/`, which nests them in subdirectories.

use std::collections::BTreeMap;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use super::store::TrackingStore;
use super::{
    validate_key, ArtifactRecord, DatasetInput, ExperimentRecord, MetricRecord, ParamRecord,
    RunRecord, TagRecord,
};
use crate::{Error, Result};

const META_FILE: &str = "meta.json";

/// Tracking store persisting to a local directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    /// Open (creating if needed) a store rooted at `root`.
    ///
    /// # Errors
    ///
    /// Returns an error if the root directory cannot be created.
    pub fn open<P: AsRef<Path>>(root: P) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root)?;
        tracing::debug!(root = %root.display(), "opened file tracking store");
        Ok(Self { root })
    }

    /// Root directory of the store.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Read a run's stored lifecycle record.
    ///
    /// # Errors
    ///
    /// Returns an error if the run is unknown or its metadata is unreadable.
    pub fn get_run(&self, run_id: &str) -> Result<RunRecord> {
        let dir = self.run_dir(run_id)?;
        read_json(&dir.join(META_FILE))
    }

    /// Read the full history of one metric, ordered by step.
    ///
    /// # Errors
    ///
    /// Returns an error if the run or metric is unknown or a line is malformed.
    pub fn get_metric_history(&self, run_id: &str, key: &str) -> Result<Vec<MetricRecord>> {
        validate_key("metric", key)?;
        let path = self.run_dir(run_id)?.join("metrics").join(key);
        let content = fs::read_to_string(&path)?;
        let mut history = content
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(|line| MetricRecord::from_line(run_id, key, line))
            .collect::<Result<Vec<_>>>()?;
        history.sort_by_key(MetricRecord::step);
        Ok(history)
    }

    /// Latest value of every metric logged for a run.
    ///
    /// # Errors
    ///
    /// Returns an error if the run is unknown or a history file is malformed.
    pub fn get_latest_metrics(&self, run_id: &str) -> Result<BTreeMap<String, f64>> {
        let dir = self.run_dir(run_id)?.join("metrics");
        let mut latest = BTreeMap::new();
        for key in read_kv_dir(&dir)?.into_keys() {
            if let Some(last) = self.get_metric_history(run_id, &key)?.last() {
                latest.insert(key, last.value());
            }
        }
        Ok(latest)
    }

    /// Read all params of a run.
    ///
    /// # Errors
    ///
    /// Returns an error if the run is unknown.
    pub fn get_params(&self, run_id: &str) -> Result<BTreeMap<String, String>> {
        read_kv_dir(&self.run_dir(run_id)?.join("params"))
    }

    /// Read all tags of a run.
    ///
    /// # Errors
    ///
    /// Returns an error if the run is unknown.
    pub fn get_tags(&self, run_id: &str) -> Result<BTreeMap<String, String>> {
        read_kv_dir(&self.run_dir(run_id)?.join("tags"))
    }

    /// Read all dataset inputs of a run.
    ///
    /// # Errors
    ///
    /// Returns an error if the run is unknown or an input file is unreadable.
    pub fn get_inputs(&self, run_id: &str) -> Result<Vec<DatasetInput>> {
        let dir = self.run_dir(run_id)?.join("inputs");
        if !dir.is_dir() {
            return Ok(Vec::new());
        }
        let mut paths = fs::read_dir(&dir)?
            .map(|entry| entry.map(|e| e.path()))
            .collect::<std::io::Result<Vec<_>>>()?;
        paths.sort();
        paths.iter().map(|p| read_json(p)).collect()
    }

    /// Location of an artifact on disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the run is unknown or the path is invalid.
    pub fn artifact_path(&self, run_id: &str, path: &str) -> Result<PathBuf> {
        validate_key("artifact path", path)?;
        Ok(self.run_dir(run_id)?.join("artifacts").join(path))
    }

    fn experiment_dirs(&self) -> Result<Vec<PathBuf>> {
        let mut dirs = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let path = entry?.path();
            if path.join(META_FILE).is_file() {
                dirs.push(path);
            }
        }
        dirs.sort();
        Ok(dirs)
    }

    fn experiment_dir(&self, experiment_id: &str) -> Result<PathBuf> {
        let dir = self.root.join(experiment_id);
        if dir.join(META_FILE).is_file() {
            Ok(dir)
        } else {
            Err(Error::Tracking(format!("unknown experiment '{experiment_id}'")))
        }
    }

    fn run_dir(&self, run_id: &str) -> Result<PathBuf> {
        if run_id.is_empty() || !run_id.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
            return Err(Error::Tracking(format!("invalid run id '{run_id}'")));
        }
        for experiment in self.experiment_dirs()? {
            let dir = experiment.join(run_id);
            if dir.join(META_FILE).is_file() {
                return Ok(dir);
            }
        }
        Err(Error::Tracking(format!("unknown run '{run_id}'")))
    }
}

impl TrackingStore for FileStore {
    fn create_experiment(&mut self, name: &str) -> Result<ExperimentRecord> {
        if self.get_experiment_by_name(name)?.is_some() {
            return Err(Error::Tracking(format!("experiment '{name}' already exists")));
        }
        let next_id = self
            .experiment_dirs()?
            .iter()
            .filter_map(|dir| dir.file_name()?.to_str()?.parse::<u64>().ok())
            .max()
            .map_or(0, |max| max + 1);

        let id = next_id.to_string();
        let dir = self.root.join(&id);
        let experiment = ExperimentRecord::new(id, name, dir.display().to_string());
        fs::create_dir_all(&dir)?;
        write_json(&dir.join(META_FILE), &experiment)?;

        tracing::info!(experiment_id = experiment.experiment_id(), name, "created experiment");
        Ok(experiment)
    }

    fn get_experiment_by_name(&self, name: &str) -> Result<Option<ExperimentRecord>> {
        for dir in self.experiment_dirs()? {
            let experiment: ExperimentRecord = read_json(&dir.join(META_FILE))?;
            if experiment.name() == name {
                return Ok(Some(experiment));
            }
        }
        Ok(None)
    }

    fn create_run(&mut self, run: &RunRecord) -> Result<()> {
        let dir = self.experiment_dir(run.experiment_id())?.join(run.run_id());
        for sub in ["metrics", "params", "tags", "inputs", "artifacts"] {
            fs::create_dir_all(dir.join(sub))?;
        }
        write_json(&dir.join(META_FILE), run)
    }

    fn update_run(&mut self, run: &RunRecord) -> Result<()> {
        let dir = self.run_dir(run.run_id())?;
        write_json(&dir.join(META_FILE), run)
    }

    fn log_metric(&mut self, metric: MetricRecord) -> Result<()> {
        validate_key("metric", metric.key())?;
        let path = self.run_dir(metric.run_id())?.join("metrics").join(metric.key());
        ensure_parent(&path)?;
        let mut file = OpenOptions::new().create(true).append(true).open(&path)?;
        writeln!(file, "{}", metric.to_line())?;
        Ok(())
    }

    fn log_param(&mut self, param: ParamRecord) -> Result<()> {
        validate_key("param", param.key())?;
        let path = self.run_dir(param.run_id())?.join("params").join(param.key());
        if path.is_file() {
            let existing = fs::read_to_string(&path)?;
            if existing == param.value() {
                return Ok(());
            }
            return Err(Error::ParamConflict {
                run_id: param.run_id().to_string(),
                key: param.key().to_string(),
                existing,
                new: param.value().to_string(),
            });
        }
        ensure_parent(&path)?;
        fs::write(&path, param.value())?;
        Ok(())
    }

    fn set_tag(&mut self, tag: TagRecord) -> Result<()> {
        validate_key("tag", tag.key())?;
        let path = self.run_dir(tag.run_id())?.join("tags").join(tag.key());
        ensure_parent(&path)?;
        fs::write(&path, tag.value())?;
        Ok(())
    }

    fn log_input(&mut self, input: DatasetInput) -> Result<()> {
        validate_key("input context", input.context())?;
        let file_name = format!("{}-{}.json", input.context(), input.digest());
        validate_key("input", &file_name)?;
        let path = self.run_dir(input.run_id())?.join("inputs").join(file_name);
        write_json(&path, &input)
    }

    fn log_artifact(&mut self, run_id: &str, path: &str, bytes: &[u8]) -> Result<ArtifactRecord> {
        let target = self.artifact_path(run_id, path)?;
        ensure_parent(&target)?;
        fs::write(&target, bytes)?;
        let record = ArtifactRecord::for_bytes(run_id, path, bytes);
        tracing::debug!(run_id, path, hash = record.cas_hash(), "stored artifact");
        Ok(record)
    }
}

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    Ok(())
}

fn write_json<T: serde::Serialize>(path: &Path, value: &T) -> Result<()> {
    ensure_parent(path)?;
    fs::write(path, serde_json::to_vec_pretty(value)?)?;
    Ok(())
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let bytes = fs::read(path)?;
    Ok(serde_json::from_slice(&bytes)?)
}

/// Read a directory of one-file-per-key values, recursing into nested keys.
fn read_kv_dir(dir: &Path) -> Result<BTreeMap<String, String>> {
    fn walk(dir: &Path, prefix: &str, out: &mut BTreeMap<String, String>) -> Result<()> {
        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            let name = entry.file_name().to_string_lossy().into_owned();
            let key = if prefix.is_empty() {
                name
            } else {
                format!("{prefix}/{name}")
            };
            let path = entry.path();
            if path.is_dir() {
                walk(&path, &key, out)?;
            } else {
                out.insert(key, fs::read_to_string(&path)?);
            }
        }
        Ok(())
    }

    let mut out = BTreeMap::new();
    if dir.is_dir() {
        walk(dir, "", &mut out)?;
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::experiment::RunStatus;

    fn store_with_run() -> (tempfile::TempDir, FileStore, RunRecord) {
        let tmp = tempfile::tempdir().unwrap();
        let mut store = FileStore::open(tmp.path().join("mlruns")).unwrap();
        let experiment = store.get_or_create_experiment("Default").unwrap();
        let mut run = RunRecord::new("abc123", experiment.experiment_id());
        run.start();
        store.create_run(&run).unwrap();
        (tmp, store, run)
    }

    #[test]
    fn test_experiment_ids_increment() {
        let tmp = tempfile::tempdir().unwrap();
        let mut store = FileStore::open(tmp.path()).unwrap();

        let first = store.create_experiment("Default").unwrap();
        let second = store.create_experiment("iris").unwrap();

        assert_eq!(first.experiment_id(), "0");
        assert_eq!(second.experiment_id(), "1");
        assert_eq!(
            store.get_experiment_by_name("iris").unwrap().unwrap().experiment_id(),
            "1"
        );
        assert!(store.create_experiment("iris").is_err());
    }

    #[test]
    fn test_run_meta_persisted() {
        let (_tmp, mut store, mut run) = store_with_run();
        assert_eq!(store.get_run("abc123").unwrap(), run);

        run.complete(RunStatus::Success);
        store.update_run(&run).unwrap();
        assert_eq!(
            store.get_run("abc123").unwrap().status(),
            RunStatus::Success
        );
    }

    #[test]
    fn test_metric_history_appends() {
        let (_tmp, mut store, _run) = store_with_run();
        store.log_metric(MetricRecord::new("abc123", "accuracy_score", 1, 0.9)).unwrap();
        store.log_metric(MetricRecord::new("abc123", "accuracy_score", 0, 0.8)).unwrap();

        let history = store.get_metric_history("abc123", "accuracy_score").unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].step(), 0);

        let latest = store.get_latest_metrics("abc123").unwrap();
        assert!((latest["accuracy_score"] - 0.9).abs() < f64::EPSILON);
    }

    #[test]
    fn test_params_and_nested_tags() {
        let (_tmp, mut store, _run) = store_with_run();
        store.log_param(ParamRecord::new("abc123", "criterion", "gini")).unwrap();
        store.set_tag(TagRecord::new("abc123", "estimator/name", "DecisionTree")).unwrap();

        assert_eq!(store.get_params("abc123").unwrap()["criterion"], "gini");
        assert_eq!(store.get_tags("abc123").unwrap()["estimator/name"], "DecisionTree");

        let conflict = store.log_param(ParamRecord::new("abc123", "criterion", "entropy"));
        assert!(matches!(conflict, Err(Error::ParamConflict { .. })));
    }

    #[test]
    fn test_artifact_written_to_disk() {
        let (_tmp, mut store, _run) = store_with_run();
        let record = store.log_artifact("abc123", "model/summary.json", b"{\"depth\":3}").unwrap();

        let on_disk = fs::read(store.artifact_path("abc123", "model/summary.json").unwrap()).unwrap();
        assert_eq!(on_disk, b"{\"depth\":3}");
        assert_eq!(record.size_bytes(), 11);
    }

    #[test]
    fn test_path_traversal_rejected() {
        let (_tmp, mut store, _run) = store_with_run();
        assert!(store.log_artifact("abc123", "../escape", b"x").is_err());
        assert!(store.log_metric(MetricRecord::new("abc123", "/abs", 0, 1.0)).is_err());
        assert!(store.get_run("../abc123").is_err());
    }
}
