//! Dataset preparation: feature/label extraction and train/test partitioning

use crate::error::{PipelineError, Result};
use crate::utils::DataLoader;
use ndarray::{Array1, Array2, Axis};
use polars::prelude::*;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::path::Path;
use tracing::info;

/// Name of the label column
pub const TARGET_COLUMN: &str = "target";
/// Fraction of samples held out for testing
pub const DEFAULT_TEST_SIZE: f64 = 0.2;
/// Seed used for the train/test shuffle
pub const DEFAULT_RANDOM_STATE: u64 = 42;

/// Train/test partition of a feature matrix and label vector
#[derive(Debug, Clone)]
pub struct DataSplit {
    pub x_train: Array2<f64>,
    pub x_test: Array2<f64>,
    pub y_train: Array1<f64>,
    pub y_test: Array1<f64>,
    /// Feature column names, in matrix column order
    pub feature_names: Vec<String>,
}

impl DataSplit {
    /// Number of feature columns
    pub fn n_features(&self) -> usize {
        self.x_train.ncols()
    }

    /// Total number of samples across both partitions
    pub fn n_samples(&self) -> usize {
        self.x_train.nrows() + self.x_test.nrows()
    }
}

/// Load `path` and split it with the default target, test size and seed
pub fn prepare_data(path: impl AsRef<Path>) -> Result<DataSplit> {
    prepare_data_with(path, TARGET_COLUMN, DEFAULT_TEST_SIZE, DEFAULT_RANDOM_STATE)
}

/// Load `path`, separate `target` from the features and partition the rows
pub fn prepare_data_with(
    path: impl AsRef<Path>,
    target: &str,
    test_size: f64,
    random_state: u64,
) -> Result<DataSplit> {
    let df = DataLoader::new().load_csv(path)?;
    let (x, y, feature_names) = frame_to_xy(&df, target)?;
    let (x_train, x_test, y_train, y_test) = train_test_split(&x, &y, test_size, random_state)?;

    info!(
        train = x_train.nrows(),
        test = x_test.nrows(),
        features = feature_names.len(),
        "prepared train/test split"
    );

    Ok(DataSplit {
        x_train,
        x_test,
        y_train,
        y_test,
        feature_names,
    })
}

/// Drop `target` from the frame and return (features, labels, feature names).
///
/// Every column is cast strictly to `f64`, so text columns fail here.
/// Missing cells become `NaN`.
pub fn frame_to_xy(df: &DataFrame, target: &str) -> Result<(Array2<f64>, Array1<f64>, Vec<String>)> {
    let target_col = df
        .column(target)
        .map_err(|_| PipelineError::ColumnNotFound(target.to_string()))?;
    let y = Array1::from_vec(column_values(target_col)?);

    let feature_names: Vec<String> = df
        .get_column_names()
        .into_iter()
        .filter(|name| name.as_str() != target)
        .map(|name| name.to_string())
        .collect();

    let col_data = feature_names
        .iter()
        .map(|name| {
            let column = df
                .column(name)
                .map_err(|_| PipelineError::ColumnNotFound(name.clone()))?;
            column_values(column)
        })
        .collect::<Result<Vec<Vec<f64>>>>()?;

    let x = Array2::from_shape_fn((df.height(), feature_names.len()), |(r, c)| col_data[c][r]);

    Ok((x, y, feature_names))
}

fn column_values(column: &Column) -> Result<Vec<f64>> {
    let casted = column.strict_cast(&DataType::Float64).map_err(|e| {
        PipelineError::DataError(format!("column '{}' is not numeric: {}", column.name(), e))
    })?;
    Ok(casted
        .f64()?
        .into_iter()
        .map(|v| v.unwrap_or(f64::NAN))
        .collect())
}

/// Shuffle rows with a seeded RNG and hold out `ceil(test_size * n)` of them.
///
/// Returns `(x_train, x_test, y_train, y_test)`.
pub fn train_test_split(
    x: &Array2<f64>,
    y: &Array1<f64>,
    test_size: f64,
    random_state: u64,
) -> Result<(Array2<f64>, Array2<f64>, Array1<f64>, Array1<f64>)> {
    let n_samples = x.nrows();
    if n_samples != y.len() {
        return Err(PipelineError::ShapeError {
            expected: format!("y length = {}", n_samples),
            actual: format!("y length = {}", y.len()),
        });
    }
    if !(test_size > 0.0 && test_size < 1.0) {
        return Err(PipelineError::invalid_parameter(
            "test_size",
            test_size,
            "must be in (0, 1)",
        ));
    }

    let n_test = test_count(n_samples, test_size);
    let n_train = n_samples.saturating_sub(n_test);
    if n_test == 0 || n_train == 0 {
        return Err(PipelineError::DataError(format!(
            "cannot split {} samples with test_size = {}: one partition would be empty",
            n_samples, test_size
        )));
    }

    let mut indices: Vec<usize> = (0..n_samples).collect();
    let mut rng = ChaCha8Rng::seed_from_u64(random_state);
    indices.shuffle(&mut rng);

    let (test_idx, train_idx) = indices.split_at(n_test);

    Ok((
        x.select(Axis(0), train_idx),
        x.select(Axis(0), test_idx),
        y.select(Axis(0), train_idx),
        y.select(Axis(0), test_idx),
    ))
}

fn test_count(n_samples: usize, test_size: f64) -> usize {
    (n_samples as f64 * test_size).ceil() as usize
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn indexed_data(n: usize) -> (Array2<f64>, Array1<f64>) {
        // Column 0 carries the row id so partitions can be traced back
        let x = Array2::from_shape_fn((n, 2), |(r, c)| if c == 0 { r as f64 } else { (r * 7 % 13) as f64 });
        let y = Array1::from_shape_fn(n, |r| (r % 2) as f64);
        (x, y)
    }

    #[test]
    fn test_split_sizes() {
        let (x, y) = indexed_data(100);
        let (x_train, x_test, y_train, y_test) = train_test_split(&x, &y, 0.2, 42).unwrap();

        assert_eq!(x_test.nrows(), 20);
        assert_eq!(x_train.nrows(), 80);
        assert_eq!(y_test.len(), 20);
        assert_eq!(y_train.len(), 80);
    }

    #[test]
    fn test_split_rounds_test_size_up() {
        let (x, y) = indexed_data(11);
        let (x_train, x_test, _, _) = train_test_split(&x, &y, 0.2, 42).unwrap();
        assert_eq!(x_test.nrows(), 3);
        assert_eq!(x_train.nrows(), 8);
    }

    #[test]
    fn test_test_count_is_plain_ceil() {
        assert_eq!(test_count(100, 0.2), 20);
        assert_eq!(test_count(55, 0.2), 11);
        // 100 * 0.07 is a hair above 7.0 in f64
        assert_eq!(test_count(100, 0.07), 8);
        assert_eq!(test_count(11, 0.2), 3);
    }

    #[test]
    fn test_split_disjoint_and_complete() {
        let (x, y) = indexed_data(57);
        let (x_train, x_test, y_train, _) = train_test_split(&x, &y, 0.2, 7).unwrap();

        let train_ids: HashSet<usize> = x_train.column(0).iter().map(|&v| v as usize).collect();
        let test_ids: HashSet<usize> = x_test.column(0).iter().map(|&v| v as usize).collect();

        assert!(train_ids.is_disjoint(&test_ids));
        assert_eq!(train_ids.len() + test_ids.len(), 57);

        // Labels travel with their rows
        for (row, label) in x_train.rows().into_iter().zip(y_train.iter()) {
            assert_eq!((row[0] as usize % 2) as f64, *label);
        }
    }

    #[test]
    fn test_split_is_deterministic() {
        let (x, y) = indexed_data(40);
        let a = train_test_split(&x, &y, 0.2, 42).unwrap();
        let b = train_test_split(&x, &y, 0.2, 42).unwrap();
        assert_eq!(a.0, b.0);
        assert_eq!(a.1, b.1);

        let c = train_test_split(&x, &y, 0.2, 43).unwrap();
        assert_ne!(a.1, c.1);
    }

    #[test]
    fn test_split_rejects_bad_test_size() {
        let (x, y) = indexed_data(10);
        assert!(train_test_split(&x, &y, 0.0, 42).is_err());
        assert!(train_test_split(&x, &y, 1.0, 42).is_err());
        assert!(train_test_split(&x, &y, -0.5, 42).is_err());
    }

    #[test]
    fn test_split_rejects_length_mismatch() {
        let (x, _) = indexed_data(10);
        let y = Array1::zeros(9);
        let err = train_test_split(&x, &y, 0.2, 42).unwrap_err();
        assert!(matches!(err, PipelineError::ShapeError { .. }));
    }

    #[test]
    fn test_frame_to_xy() {
        let df = df!(
            "f1" => &[0.1, 0.9, 0.4],
            "f2" => &[1i64, 2, 3],
            "target" => &[0i64, 1, 0]
        )
        .unwrap();

        let (x, y, names) = frame_to_xy(&df, "target").unwrap();
        assert_eq!(names, vec!["f1".to_string(), "f2".to_string()]);
        assert_eq!(x.dim(), (3, 2));
        assert_eq!(x[[1, 0]], 0.9);
        assert_eq!(x[[2, 1]], 3.0);
        assert_eq!(y.to_vec(), vec![0.0, 1.0, 0.0]);
    }

    #[test]
    fn test_frame_to_xy_missing_target() {
        let df = df!("f1" => &[0.1, 0.2], "label" => &[0i64, 1]).unwrap();
        let err = frame_to_xy(&df, "target").unwrap_err();
        assert!(matches!(err, PipelineError::ColumnNotFound(ref c) if c == "target"));
    }

    #[test]
    fn test_frame_to_xy_rejects_text_features() {
        let df = df!("color" => &["red", "blue"], "target" => &[0i64, 1]).unwrap();
        let err = frame_to_xy(&df, "target").unwrap_err();
        assert!(matches!(err, PipelineError::DataError(_)));
    }
}
