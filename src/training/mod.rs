//! Model training module
//!
//! Provides the two classifiers used by the pipeline:
//! - Random Forest over CART decision trees
//! - Feed-forward neural network (Dense/Dropout stack trained with Adam)

mod models;
pub mod adam;
pub mod decision_tree;
pub mod layers;
pub mod neural_network;
pub mod random_forest;

pub use adam::Adam;
pub use decision_tree::{Criterion, DecisionTree, TreeNode};
pub use layers::{Activation, Dense, Dropout, Layer};
pub use models::Classifier;
pub use neural_network::{EpochLog, FitOptions, History, Loss, NetworkEvaluation, Sequential};
pub use random_forest::RandomForest;
