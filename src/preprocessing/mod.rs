//! Data preparation module
//!
//! Turns a CSV table into train/test feature matrices and label vectors.

pub mod split;

pub use split::{
    frame_to_xy, prepare_data, prepare_data_with, train_test_split, DataSplit,
    DEFAULT_RANDOM_STATE, DEFAULT_TEST_SIZE, TARGET_COLUMN,
};
