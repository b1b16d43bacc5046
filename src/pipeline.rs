//! The end-to-end workflow
//!
//! One linear pass: enable autolog, start a run, split the data, fit the
//! tree (autolog observes the fit through the run), evaluate on the held-out
//! rows, finish the run. Any error stops the pass; the run is then ended as
//! failed when it goes out of scope.

use ndarray::{Array1, Array2};

use crate::config::PipelineConfig;
use crate::data::{load_iris, train_test_split, LabeledTable};
use crate::evaluation::{evaluate, EvaluationDataset, EvaluationResult, ModelType};
use crate::experiment::{RunStatus, TrackingClient, TrackingStore};
use crate::training::Trainer;
use crate::Result;

/// Name of the held-out evaluation dataset.
pub const EVAL_DATASET_NAME: &str = "test";

/// Run the workflow on the bundled iris dataset.
///
/// # Errors
///
/// Propagates the first error from loading, splitting, fitting, evaluation
/// or tracking.
pub fn run<S: TrackingStore>(
    config: &PipelineConfig,
    client: &mut TrackingClient<S>,
) -> Result<EvaluationResult> {
    let iris = load_iris()?;
    run_on(&iris, config, client)
}

/// Run the workflow on `table`.
///
/// # Errors
///
/// Propagates the first error from splitting, fitting, evaluation or
/// tracking.
pub fn run_on<S: TrackingStore>(
    table: &LabeledTable,
    config: &PipelineConfig,
    client: &mut TrackingClient<S>,
) -> Result<EvaluationResult> {
    if config.autolog {
        client.autolog();
    }

    let mut run = client.start_run(&config.experiment_name)?;
    let _span = tracing::info_span!("pipeline", run_id = run.run_id()).entered();

    let split = train_test_split(table, &config.split)?;
    tracing::info!(
        train_rows = split.train.n_rows(),
        test_rows = split.test.n_rows(),
        seed = ?config.split.seed,
        "split dataset"
    );

    let model = Trainer::new(config.tree).fit(&split.train, &mut run)?;

    let eval_data = EvaluationDataset::from_table(&split.test, EVAL_DATASET_NAME)?;
    let predict = |features: &Array2<f64>| -> Result<Array1<usize>> { model.predict(features) };
    let result = evaluate(&predict, &eval_data, ModelType::Classifier, &mut run)?;

    run.finish(RunStatus::Success)?;
    Ok(result)
}
