//! Pipeline benchmarks
//!
//! Benchmarks for the steps of one tracked training pass:
//! - Train/test split
//! - Decision-tree fit (with and without autolog)
//! - Held-out evaluation and Parquet encoding
//!
//! Toyota Way: Measure before optimizing (Genchi Genbutsu)

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use iris_autolog::data::{load_iris, train_test_split, LabeledTable, SplitConfig};
use iris_autolog::evaluation::{evaluate, to_parquet_bytes, EvaluationDataset, ModelType};
use iris_autolog::experiment::{ExperimentStore, RunStatus, TrackingClient};
use iris_autolog::training::{NoopObserver, Trainer, TreeParams};
use ndarray::{Array1, Array2};

/// Create a synthetic 3-class table with `num_rows` rows and 4 features
#[allow(clippy::cast_precision_loss)]
fn create_test_table(num_rows: usize) -> LabeledTable {
    let features = Array2::from_shape_fn((num_rows, 4), |(r, c)| {
        ((r * 31 + c * 17) % 97) as f64 / 10.0 + (r % 3) as f64
    });
    let labels = Array1::from_iter((0..num_rows).map(|r| r % 3));
    LabeledTable::new(
        vec!["f0".into(), "f1".into(), "f2".into(), "f3".into()],
        "target",
        features,
        labels,
    )
    .unwrap()
}

/// Benchmark the seeded shuffle split
fn bench_split(c: &mut Criterion) {
    let mut group = c.benchmark_group("train_test_split");

    for size in [150, 1_000, 10_000] {
        let table = create_test_table(size);
        group.bench_with_input(BenchmarkId::from_parameter(size), &table, |b, table| {
            b.iter(|| black_box(train_test_split(table, &SplitConfig::seeded(42)).unwrap()));
        });
    }

    group.finish();
}

/// Benchmark tree fitting at several table sizes
fn bench_fit(c: &mut Criterion) {
    let mut group = c.benchmark_group("decision_tree_fit");
    group.sample_size(20);

    for size in [150, 1_000, 5_000] {
        let table = create_test_table(size);
        group.bench_with_input(BenchmarkId::from_parameter(size), &table, |b, table| {
            b.iter(|| black_box(Trainer::default().fit(table, &mut NoopObserver).unwrap()));
        });
    }

    group.finish();
}

/// Benchmark fit with autolog recording into an in-memory store
fn bench_fit_autolog(c: &mut Criterion) {
    let iris = load_iris().unwrap();
    let trainer = Trainer::new(TreeParams::default());

    c.bench_function("decision_tree_fit_autolog_iris", |b| {
        b.iter(|| {
            let mut client = TrackingClient::new(ExperimentStore::new());
            client.autolog();
            let mut run = client.start_run("bench").unwrap();
            black_box(trainer.fit(&iris, &mut run).unwrap());
            run.finish(RunStatus::Success).unwrap();
        });
    });
}

/// Benchmark evaluation including metric logging and the results table
fn bench_evaluate(c: &mut Criterion) {
    let iris = load_iris().unwrap();
    let split = train_test_split(&iris, &SplitConfig::seeded(42)).unwrap();
    let model = Trainer::default().fit(&split.train, &mut NoopObserver).unwrap();
    let eval = EvaluationDataset::from_table(&split.test, "test").unwrap();

    c.bench_function("evaluate_iris_test", |b| {
        b.iter(|| {
            let mut client = TrackingClient::new(ExperimentStore::new());
            let mut run = client.start_run("bench").unwrap();
            black_box(evaluate(&model, &eval, ModelType::Classifier, &mut run).unwrap());
            run.finish(RunStatus::Success).unwrap();
        });
    });

    c.bench_function("eval_table_to_parquet", |b| {
        b.iter(|| black_box(to_parquet_bytes(eval.batch()).unwrap()));
    });
}

criterion_group!(
    benches,
    bench_split,
    bench_fit,
    bench_fit_autolog,
    bench_evaluate
);
criterion_main!(benches);
