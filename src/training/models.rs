//! Shared model traits

use crate::error::Result;
use ndarray::{Array1, Array2};

/// A fitted model that assigns a class label to every row
pub trait Classifier: Send + Sync {
    /// Predict one label per row of `x`
    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>>;

    /// Human-readable model name used in logs
    fn name(&self) -> &'static str;
}
