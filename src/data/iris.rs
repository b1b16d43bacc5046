//! Iris dataset loader (150 rows, 4 features, 3 classes)

use super::LabeledTable;
use crate::Result;

/// Feature column names, in column order.
pub const IRIS_FEATURE_NAMES: [&str; 4] = [
    "sepal length (cm)",
    "sepal width (cm)",
    "petal length (cm)",
    "petal width (cm)",
];

/// Label column name.
pub const IRIS_LABEL_NAME: &str = "target";

/// Load the classic iris dataset bundled with `linfa-datasets`.
///
/// # Errors
///
/// Returns an error if the bundled table is malformed (shape mismatch).
pub fn load_iris() -> Result<LabeledTable> {
    let dataset = linfa_datasets::iris();
    let features = dataset.records().clone();
    let labels = dataset.targets().clone();

    tracing::debug!(
        rows = features.nrows(),
        features = features.ncols(),
        "loaded iris dataset"
    );

    LabeledTable::new(
        IRIS_FEATURE_NAMES.iter().map(|s| (*s).to_string()).collect(),
        IRIS_LABEL_NAME,
        features,
        labels,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_iris_shape() {
        let iris = load_iris().unwrap();
        assert_eq!(iris.n_rows(), 150);
        assert_eq!(iris.n_features(), 4);
        assert_eq!(iris.classes(), vec![0, 1, 2]);
        assert_eq!(iris.label_name(), "target");
    }

    #[test]
    fn test_iris_classes_balanced() {
        let iris = load_iris().unwrap();
        for class in iris.classes() {
            let count = iris.labels().iter().filter(|&&l| l == class).count();
            assert_eq!(count, 50, "class {class} has {count} rows");
        }
    }
}
