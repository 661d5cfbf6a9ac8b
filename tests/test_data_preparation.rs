//! Integration tests for loading and splitting CSV datasets

use sample_model::error::PipelineError;
use sample_model::preprocessing::{frame_to_xy, prepare_data, prepare_data_with};
use polars::prelude::*;
use std::collections::HashSet;
use std::io::Write;
use tempfile::NamedTempFile;

/// CSV with an `id` feature so rows can be tracked through the split
fn write_indexed_csv(n: usize) -> NamedTempFile {
    let tmp = NamedTempFile::with_suffix(".csv").unwrap();
    writeln!(tmp.as_file(), "id,x,target").unwrap();
    for i in 0..n {
        writeln!(tmp.as_file(), "{},{},{}", i, (i as f64) * 0.5, i % 2).unwrap();
    }
    tmp
}

fn ids(values: &ndarray::Array2<f64>) -> Vec<i64> {
    values.column(0).iter().map(|&v| v as i64).collect()
}

#[test]
fn test_split_sizes() {
    let tmp = write_indexed_csv(100);
    let split = prepare_data(tmp.path()).unwrap();

    assert_eq!(split.x_train.nrows(), 80);
    assert_eq!(split.x_test.nrows(), 20);
    assert_eq!(split.y_train.len(), 80);
    assert_eq!(split.y_test.len(), 20);
    assert_eq!(split.n_features(), 2);
    assert_eq!(split.feature_names, vec!["id".to_string(), "x".to_string()]);
}

#[test]
fn test_split_rounds_test_size_up() {
    let tmp = write_indexed_csv(11);
    let split = prepare_data(tmp.path()).unwrap();

    // ceil(0.2 * 11) = 3
    assert_eq!(split.x_test.nrows(), 3);
    assert_eq!(split.x_train.nrows(), 8);
}

#[test]
fn test_split_is_disjoint_and_complete() {
    let tmp = write_indexed_csv(50);
    let split = prepare_data(tmp.path()).unwrap();

    let train: HashSet<i64> = ids(&split.x_train).into_iter().collect();
    let test: HashSet<i64> = ids(&split.x_test).into_iter().collect();

    assert!(train.is_disjoint(&test));
    let all: HashSet<i64> = train.union(&test).copied().collect();
    assert_eq!(all, (0..50).collect::<HashSet<i64>>());
}

#[test]
fn test_labels_follow_their_rows() {
    let tmp = write_indexed_csv(40);
    let split = prepare_data(tmp.path()).unwrap();

    for (row, &label) in split.x_train.rows().into_iter().zip(split.y_train.iter()) {
        assert_eq!(label, (row[0] as i64 % 2) as f64);
    }
    for (row, &label) in split.x_test.rows().into_iter().zip(split.y_test.iter()) {
        assert_eq!(label, (row[0] as i64 % 2) as f64);
    }
}

#[test]
fn test_split_is_deterministic() {
    let tmp = write_indexed_csv(60);
    let a = prepare_data(tmp.path()).unwrap();
    let b = prepare_data(tmp.path()).unwrap();
    assert_eq!(ids(&a.x_test), ids(&b.x_test));
    assert_eq!(a.y_train, b.y_train);

    let c = prepare_data_with(tmp.path(), "target", 0.2, 7).unwrap();
    assert_ne!(ids(&a.x_test), ids(&c.x_test));
}

#[test]
fn test_missing_file() {
    let err = prepare_data("does/not/exist.csv").unwrap_err();
    assert!(err.is_not_found());
}

#[test]
fn test_missing_target_column() {
    let tmp = NamedTempFile::with_suffix(".csv").unwrap();
    writeln!(tmp.as_file(), "a,b").unwrap();
    writeln!(tmp.as_file(), "1,2").unwrap();
    writeln!(tmp.as_file(), "3,4").unwrap();

    let err = prepare_data(tmp.path()).unwrap_err();
    assert!(matches!(err, PipelineError::ColumnNotFound(ref c) if c == "target"));
}

#[test]
fn test_text_feature_is_rejected() {
    let tmp = NamedTempFile::with_suffix(".csv").unwrap();
    writeln!(tmp.as_file(), "color,target").unwrap();
    for i in 0..10 {
        writeln!(tmp.as_file(), "{},{}", if i % 2 == 0 { "red" } else { "blue" }, i % 2).unwrap();
    }

    let err = prepare_data(tmp.path()).unwrap_err();
    assert!(matches!(err, PipelineError::DataError(_)));
}

#[test]
fn test_frame_to_xy_drops_target() {
    let df = df!(
        "a" => &[1.0, 2.0, 3.0],
        "target" => &[0i64, 1, 0],
        "b" => &[4.0, 5.0, 6.0]
    )
    .unwrap();

    let (x, y, names) = frame_to_xy(&df, "target").unwrap();
    assert_eq!(names, vec!["a".to_string(), "b".to_string()]);
    assert_eq!(x.shape(), &[3, 2]);
    assert_eq!(x[[1, 1]], 5.0);
    assert_eq!(y.to_vec(), vec![0.0, 1.0, 0.0]);
}

#[test]
fn test_bundled_dataset() {
    let split = prepare_data("data/sample_dataset.csv").unwrap();
    assert_eq!(split.n_samples(), 100);
    assert_eq!(split.x_test.nrows(), 20);
    assert_eq!(split.feature_names, vec!["f1".to_string(), "f2".to_string()]);
}
