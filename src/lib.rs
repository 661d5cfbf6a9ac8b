//! Sample Model - tabular binary classification pipeline
//!
//! Loads a CSV dataset, splits it into train and test partitions, then trains
//! and evaluates two classifiers on the same split.
//!
//! # Modules
//!
//! - [`utils`] - CSV loading
//! - [`preprocessing`] - feature/label extraction and the seeded train/test split
//! - [`training`] - random forest and a small sequential neural network
//! - [`evaluation`] - accuracy and the classification report
//! - [`pipeline`] - stage functions and the end-to-end run
//! - [`cli`] - command-line interface

pub mod error;

pub mod utils;
pub mod preprocessing;
pub mod training;
pub mod evaluation;
pub mod pipeline;

pub mod cli;

pub use error::{PipelineError, Result};

/// Prelude for common imports
pub mod prelude {
    pub use crate::error::{PipelineError, Result};
    pub use crate::evaluation::{accuracy_score, evaluate_model, ClassificationReport, EvaluationResult};
    pub use crate::pipeline::{
        create_nn_model, run_pipeline, train_rf_model, PipelineConfig, PipelineReport,
    };
    pub use crate::preprocessing::{prepare_data, train_test_split, DataSplit};
    pub use crate::training::{Classifier, RandomForest, Sequential};
    pub use crate::utils::DataLoader;
}
