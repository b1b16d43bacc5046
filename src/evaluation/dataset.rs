//! Evaluation table
//!
//! The held-out rows as one Arrow [`RecordBatch`]: feature columns plus the
//! target column, the same shape a caller would hand over as a data frame.

use std::sync::Arc;

use arrow::array::{Array, ArrayRef, Float64Array, Int64Array};
use arrow::compute::cast;
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use ndarray::{Array1, Array2};
use parquet::arrow::ArrowWriter;
use serde_json::json;
use sha2::{Digest, Sha256};

use crate::data::LabeledTable;
use crate::experiment::hex;
use crate::{Error, Result};

/// Dataset source recorded on run inputs.
pub const MEMORY_SOURCE: &str = "memory";

/// Column holding model predictions in the evaluation results table.
pub const PREDICTION_COLUMN: &str = "prediction";

/// A named evaluation table with a designated target column.
#[derive(Debug, Clone)]
pub struct EvaluationDataset {
    name: String,
    targets: String,
    batch: RecordBatch,
    feature_names: Vec<String>,
    features: Array2<f64>,
    labels: Array1<usize>,
    digest: String,
}

impl EvaluationDataset {
    /// Join a table's features and labels into one evaluation table. The
    /// target column takes the table's label name.
    ///
    /// # Errors
    ///
    /// Returns an error if the Arrow batch cannot be assembled.
    pub fn from_table(table: &LabeledTable, name: impl Into<String>) -> Result<Self> {
        let mut fields = Vec::with_capacity(table.n_features() + 1);
        let mut columns: Vec<ArrayRef> = Vec::with_capacity(table.n_features() + 1);

        for (idx, feature) in table.feature_names().iter().enumerate() {
            fields.push(Field::new(feature, DataType::Float64, false));
            let values = table.features().column(idx).to_vec();
            columns.push(Arc::new(Float64Array::from(values)));
        }

        fields.push(Field::new(table.label_name(), DataType::Int64, false));
        let labels = table
            .labels()
            .iter()
            .map(|&label| {
                i64::try_from(label)
                    .map_err(|_| Error::InvalidInput(format!("label {label} does not fit in Int64")))
            })
            .collect::<Result<Vec<_>>>()?;
        columns.push(Arc::new(Int64Array::from(labels)));

        let batch = RecordBatch::try_new(Arc::new(Schema::new(fields)), columns)?;
        Self::from_record_batch(batch, table.label_name(), name)
    }

    /// Wrap an existing table. Every column other than `targets` is a
    /// feature and must be numeric; `targets` must hold non-negative integers.
    ///
    /// # Errors
    ///
    /// - [`Error::MissingColumn`] if `targets` is not in the batch
    /// - [`Error::InvalidInput`] on non-numeric columns, nulls or negative labels
    pub fn from_record_batch(
        batch: RecordBatch,
        targets: impl Into<String>,
        name: impl Into<String>,
    ) -> Result<Self> {
        let targets = targets.into();
        let schema = batch.schema();
        let target_idx = schema
            .index_of(&targets)
            .map_err(|_| Error::MissingColumn(targets.clone()))?;

        let mut feature_names = Vec::new();
        let mut feature_columns = Vec::new();
        for (idx, field) in schema.fields().iter().enumerate() {
            if idx == target_idx {
                continue;
            }
            feature_names.push(field.name().clone());
            feature_columns.push(float_column(field.name(), batch.column(idx))?);
        }

        let labels = label_column(&targets, batch.column(target_idx))?;
        let features = Array2::from_shape_fn((batch.num_rows(), feature_columns.len()), |(r, c)| {
            feature_columns[c].value(r)
        });
        let digest = compute_digest(&feature_names, &targets, &features, &labels);

        Ok(Self {
            name: name.into(),
            targets,
            batch,
            feature_names,
            features,
            labels,
            digest,
        })
    }

    /// Dataset name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Target column name.
    #[must_use]
    pub fn targets(&self) -> &str {
        &self.targets
    }

    /// The underlying table.
    #[must_use]
    pub const fn batch(&self) -> &RecordBatch {
        &self.batch
    }

    /// Number of rows.
    #[must_use]
    pub fn num_rows(&self) -> usize {
        self.batch.num_rows()
    }

    /// Feature column names, in table order.
    #[must_use]
    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    /// Feature matrix (target column removed).
    #[must_use]
    pub const fn features(&self) -> &Array2<f64> {
        &self.features
    }

    /// Ground-truth labels.
    #[must_use]
    pub const fn labels(&self) -> &Array1<usize> {
        &self.labels
    }

    /// Short content digest: 8 hex chars of SHA-256 over names and values.
    #[must_use]
    pub fn digest(&self) -> &str {
        &self.digest
    }

    /// Source type recorded with the dataset.
    #[must_use]
    pub const fn source_type(&self) -> &'static str {
        MEMORY_SOURCE
    }

    /// Column name to type mapping.
    #[must_use]
    pub fn schema_json(&self) -> serde_json::Value {
        let columns: Vec<_> = self
            .batch
            .schema()
            .fields()
            .iter()
            .map(|f| json!({ "name": f.name(), "type": f.data_type().to_string() }))
            .collect();
        json!({ "columns": columns })
    }

    /// Row and element counts.
    #[must_use]
    pub fn profile_json(&self) -> serde_json::Value {
        json!({
            "num_rows": self.batch.num_rows(),
            "num_elements": self.batch.num_rows() * self.batch.num_columns(),
        })
    }

    /// The evaluation table with a trailing prediction column.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PredictionLength`] if `predictions` does not cover
    /// every row.
    pub fn with_predictions(&self, predictions: &Array1<usize>) -> Result<RecordBatch> {
        if predictions.len() != self.num_rows() {
            return Err(Error::PredictionLength {
                expected: self.num_rows(),
                actual: predictions.len(),
            });
        }

        let schema = self.batch.schema();
        let mut fields: Vec<Field> = schema.fields().iter().map(|f| f.as_ref().clone()).collect();
        fields.push(Field::new(PREDICTION_COLUMN, DataType::Int64, false));

        let mut columns = self.batch.columns().to_vec();
        let values = predictions
            .iter()
            .map(|&p| {
                i64::try_from(p)
                    .map_err(|_| Error::InvalidInput(format!("prediction {p} does not fit in Int64")))
            })
            .collect::<Result<Vec<_>>>()?;
        columns.push(Arc::new(Int64Array::from(values)));

        Ok(RecordBatch::try_new(Arc::new(Schema::new(fields)), columns)?)
    }
}

/// Encode a batch as an in-memory Parquet file.
///
/// # Errors
///
/// Returns an error if the Parquet writer fails.
pub fn to_parquet_bytes(batch: &RecordBatch) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    let mut writer = ArrowWriter::try_new(&mut buf, batch.schema(), None)?;
    writer.write(batch)?;
    writer.close()?;
    Ok(buf)
}

fn float_column(name: &str, column: &ArrayRef) -> Result<Float64Array> {
    if !column.data_type().is_numeric() {
        return Err(Error::InvalidInput(format!(
            "feature column '{name}' has non-numeric type {}",
            column.data_type()
        )));
    }
    if column.null_count() > 0 {
        return Err(Error::InvalidInput(format!("feature column '{name}' contains nulls")));
    }
    let cast_column = cast(column.as_ref(), &DataType::Float64)?;
    let array = cast_column
        .as_any()
        .downcast_ref::<Float64Array>()
        .ok_or_else(|| Error::InvalidInput(format!("failed to read '{name}' as Float64")))?;
    Ok(array.clone())
}

fn label_column(name: &str, column: &ArrayRef) -> Result<Array1<usize>> {
    if !column.data_type().is_integer() {
        return Err(Error::InvalidInput(format!(
            "target column '{name}' must be integer, found {}",
            column.data_type()
        )));
    }
    if column.null_count() > 0 {
        return Err(Error::InvalidInput(format!("target column '{name}' contains nulls")));
    }
    let cast_column = cast(column.as_ref(), &DataType::Int64)?;
    let array = cast_column
        .as_any()
        .downcast_ref::<Int64Array>()
        .ok_or_else(|| Error::InvalidInput(format!("failed to read '{name}' as Int64")))?;

    array
        .values()
        .iter()
        .map(|&v| {
            usize::try_from(v)
                .map_err(|_| Error::InvalidInput(format!("target column '{name}' has negative label {v}")))
        })
        .collect()
}

fn compute_digest(
    feature_names: &[String],
    targets: &str,
    features: &Array2<f64>,
    labels: &Array1<usize>,
) -> String {
    let mut hasher = Sha256::new();
    for name in feature_names {
        hasher.update(name.as_bytes());
        hasher.update([0u8]);
    }
    hasher.update(targets.as_bytes());
    for value in features {
        hasher.update(value.to_le_bytes());
    }
    for label in labels {
        hasher.update((*label as u64).to_le_bytes());
    }
    let mut digest = hex(&hasher.finalize());
    digest.truncate(8);
    digest
}
