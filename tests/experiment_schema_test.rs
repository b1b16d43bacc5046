//! Experiment Schema Tests
//!
//! Covers the tracking records and both store implementations through the
//! public API only.

use iris_autolog::experiment::{
    cas_hash, ArtifactRecord, ExperimentRecord, ExperimentStore, FileStore, MetricRecord,
    ParamRecord, RunRecord, RunStatus, TagRecord, TrackingStore,
};
use iris_autolog::Error;

// =============================================================================
// ExperimentRecord Tests
// =============================================================================

#[test]
fn test_experiment_record_creation() {
    let record = ExperimentRecord::new("0", "Default", "memory:/0");

    assert_eq!(record.experiment_id(), "0");
    assert_eq!(record.name(), "Default");
    assert_eq!(record.artifact_location(), "memory:/0");
    assert!(record.created_at().timestamp() > 0);
}

#[test]
fn test_store_assigns_artifact_location() {
    let mut memory = ExperimentStore::new();
    let experiment = memory.create_experiment("iris").unwrap();
    assert_eq!(experiment.artifact_location(), "memory:/0");

    let tmp = tempfile::tempdir().unwrap();
    let mut files = FileStore::open(tmp.path()).unwrap();
    let experiment = files.create_experiment("iris").unwrap();
    let location = std::path::Path::new(experiment.artifact_location());
    assert_eq!(location, tmp.path().join("0"));
    assert!(location.is_dir());

    let reloaded = files.get_experiment_by_name("iris").unwrap().unwrap();
    assert_eq!(reloaded, experiment);
}

#[test]
fn test_experiment_record_serialization() {
    let record = ExperimentRecord::new("3", "Serialization Test", "mlruns/3");

    let json = serde_json::to_string(&record).expect("serialization failed");
    let deserialized: ExperimentRecord =
        serde_json::from_str(&json).expect("deserialization failed");

    assert_eq!(record, deserialized);
}

// =============================================================================
// RunRecord Tests
// =============================================================================

#[test]
fn test_run_record_lifecycle() {
    let mut run = RunRecord::new("a1b2c3d4e5f6", "0");
    assert_eq!(run.status(), RunStatus::Pending);
    assert_eq!(run.run_name(), "run-a1b2c3d4");
    assert!(run.started_at().is_none());

    run.start();
    assert_eq!(run.status(), RunStatus::Running);
    assert!(run.started_at().is_some());
    assert!(!run.status().is_terminal());

    run.complete(RunStatus::Success);
    assert!(run.status().is_terminal());
    assert!(run.ended_at().unwrap() >= run.started_at().unwrap());
}

#[test]
fn test_run_record_named() {
    let run = RunRecord::builder("abc", "0").run_name("baseline").build();
    assert_eq!(run.run_name(), "baseline");
}

#[test]
fn test_run_status_serialization() {
    for status in [
        RunStatus::Pending,
        RunStatus::Running,
        RunStatus::Success,
        RunStatus::Failed,
        RunStatus::Cancelled,
    ] {
        let json = serde_json::to_string(&status).unwrap();
        let back: RunStatus = serde_json::from_str(&json).unwrap();
        assert_eq!(status, back);
    }
}

// =============================================================================
// MetricRecord / ArtifactRecord Tests
// =============================================================================

#[test]
fn test_metric_line_format() {
    let metric = MetricRecord::new("run", "accuracy_score", 2, 0.875);
    let line = metric.to_line();
    let fields: Vec<&str> = line.split(' ').collect();
    assert_eq!(fields.len(), 3);
    assert_eq!(fields[1], "0.875");
    assert_eq!(fields[2], "2");

    let parsed = MetricRecord::from_line("run", "accuracy_score", &line).unwrap();
    assert_eq!(parsed.step(), 2);
    assert!((parsed.value() - 0.875).abs() < f64::EPSILON);
    assert_eq!(
        parsed.timestamp().timestamp_millis(),
        metric.timestamp().timestamp_millis()
    );
}

#[test]
fn test_metric_line_malformed() {
    for line in ["", "1 2", "x 0.5 0", "1 0.5 0 extra"] {
        assert!(matches!(
            MetricRecord::from_line("run", "k", line),
            Err(Error::Tracking(_))
        ));
    }
}

#[test]
fn test_artifact_record_content_addressed() {
    let a = ArtifactRecord::for_bytes("run", "model/summary.json", b"{}");
    let b = ArtifactRecord::for_bytes("other", "copy.json", b"{}");

    assert_eq!(a.cas_hash(), b.cas_hash());
    assert_eq!(a.cas_hash(), cas_hash(b"{}"));
    assert!(a.cas_hash().starts_with("sha256:"));
    assert_eq!(a.cas_hash().len(), "sha256:".len() + 64);
    assert_eq!(a.size_bytes(), 2);
}

// =============================================================================
// Store Tests
// =============================================================================

fn exercise_store<S: TrackingStore>(store: &mut S) -> String {
    let experiment = store.get_or_create_experiment("iris").unwrap();
    let again = store.get_or_create_experiment("iris").unwrap();
    assert_eq!(experiment.experiment_id(), again.experiment_id());

    let mut run = RunRecord::new("0123abcd", experiment.experiment_id());
    run.start();
    store.create_run(&run).unwrap();

    store
        .log_param(ParamRecord::new("0123abcd", "criterion", "gini"))
        .unwrap();
    store
        .log_param(ParamRecord::new("0123abcd", "criterion", "gini"))
        .unwrap();
    let conflict = store.log_param(ParamRecord::new("0123abcd", "criterion", "entropy"));
    assert!(matches!(conflict, Err(Error::ParamConflict { .. })));

    store
        .set_tag(TagRecord::new("0123abcd", "estimator_name", "Tree"))
        .unwrap();
    store
        .set_tag(TagRecord::new("0123abcd", "estimator_name", "DecisionTree"))
        .unwrap();

    for step in [2, 0, 1] {
        #[allow(clippy::cast_precision_loss)]
        let value = step as f64 / 10.0;
        store
            .log_metric(MetricRecord::new("0123abcd", "loss", step, value))
            .unwrap();
    }

    let artifact = store
        .log_artifact("0123abcd", "model/summary.json", b"{\"depth\":3}")
        .unwrap();
    assert_eq!(artifact.path(), "model/summary.json");

    run.complete(RunStatus::Success);
    store.update_run(&run).unwrap();

    assert!(store
        .log_metric(MetricRecord::new("missing", "loss", 0, 1.0))
        .is_err());

    experiment.experiment_id().to_string()
}

#[test]
fn test_memory_store_contract() {
    let mut store = ExperimentStore::new();
    let experiment_id = exercise_store(&mut store);

    assert_eq!(experiment_id, "0");
    assert_eq!(store.get_run("0123abcd").unwrap().status(), RunStatus::Success);
    assert_eq!(store.get_params_for_run("0123abcd")["criterion"], "gini");
    assert_eq!(
        store.get_tags_for_run("0123abcd")["estimator_name"],
        "DecisionTree"
    );

    let steps: Vec<u64> = store
        .get_metrics_for_run("0123abcd", "loss")
        .iter()
        .map(MetricRecord::step)
        .collect();
    assert_eq!(steps, vec![0, 1, 2]);
    assert_eq!(
        store.artifact_bytes("0123abcd", "model/summary.json"),
        Some(&b"{\"depth\":3}"[..])
    );
}

#[test]
fn test_file_store_contract() {
    let tmp = tempfile::tempdir().unwrap();
    let mut store = FileStore::open(tmp.path().join("mlruns")).unwrap();
    let experiment_id = exercise_store(&mut store);

    assert_eq!(experiment_id, "0");
    assert_eq!(store.get_run("0123abcd").unwrap().status(), RunStatus::Success);
    assert_eq!(store.get_params("0123abcd").unwrap()["criterion"], "gini");
    assert_eq!(
        store.get_tags("0123abcd").unwrap()["estimator_name"],
        "DecisionTree"
    );

    let history = store.get_metric_history("0123abcd", "loss").unwrap();
    let steps: Vec<u64> = history.iter().map(MetricRecord::step).collect();
    assert_eq!(steps, vec![0, 1, 2]);

    let path = store.artifact_path("0123abcd", "model/summary.json").unwrap();
    assert_eq!(std::fs::read(path).unwrap(), b"{\"depth\":3}");
}

#[test]
fn test_file_store_reopen_sees_experiments() {
    let tmp = tempfile::tempdir().unwrap();
    let root = tmp.path().join("mlruns");

    let first = FileStore::open(&root)
        .unwrap()
        .get_or_create_experiment("Default")
        .unwrap();
    let mut reopened = FileStore::open(&root).unwrap();
    let second = reopened.get_or_create_experiment("Default").unwrap();
    let other = reopened.get_or_create_experiment("iris").unwrap();

    assert_eq!(first.experiment_id(), second.experiment_id());
    assert_eq!(other.experiment_id(), "1");
}
