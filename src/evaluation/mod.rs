//! Model evaluation
//!
//! Scores a fitted [`Classifier`] on held-out data and prints the result.

pub mod metrics;
pub mod report;

pub use metrics::{accuracy_score, macro_average, per_class_metrics, weighted_average, AverageMetrics, ClassMetrics};
pub use report::ClassificationReport;

use crate::error::Result;
use crate::training::Classifier;
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Accuracy and per-class report for one model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationResult {
    pub accuracy: f64,
    pub report: ClassificationReport,
}

impl EvaluationResult {
    /// The rendered report table
    pub fn report_text(&self) -> String {
        self.report.to_string()
    }
}

/// Predict on `x_test` and score against `y_test` without printing
pub fn score_model<C: Classifier + ?Sized>(
    model: &C,
    x_test: &Array2<f64>,
    y_test: &Array1<f64>,
) -> Result<EvaluationResult> {
    let y_pred = model.predict(x_test)?;
    let report = ClassificationReport::new(y_test, &y_pred)?;
    info!(model = model.name(), accuracy = report.accuracy, samples = y_test.len(), "model scored");
    Ok(EvaluationResult {
        accuracy: report.accuracy,
        report,
    })
}

/// Score the model and print accuracy and the classification report to stdout
pub fn evaluate_model<C: Classifier + ?Sized>(
    model: &C,
    x_test: &Array2<f64>,
    y_test: &Array1<f64>,
) -> Result<EvaluationResult> {
    let result = score_model(model, x_test, y_test)?;

    println!("Model Accuracy: {:.4}", result.accuracy);
    println!("Classification Report:");
    println!("{}", result.report);

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PipelineError;
    use ndarray::array;

    /// Predicts 1 whenever the first feature is positive
    struct SignModel;

    impl Classifier for SignModel {
        fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
            Ok(x.column(0).mapv(|v| if v > 0.0 { 1.0 } else { 0.0 }))
        }

        fn name(&self) -> &'static str {
            "SignModel"
        }
    }

    #[test]
    fn test_score_model() {
        let x = array![[1.0], [-1.0], [2.0], [-2.0]];
        let y = array![1.0, 0.0, 0.0, 0.0];

        let result = score_model(&SignModel, &x, &y).unwrap();
        assert_eq!(result.accuracy, 0.75);
        assert_eq!(result.report.class(0.0).unwrap().recall, 2.0 / 3.0);
        assert!(result.report_text().contains("weighted avg"));
    }

    #[test]
    fn test_evaluate_model_length_mismatch() {
        let x = array![[1.0], [-1.0]];
        let y = array![1.0];
        let err = evaluate_model(&SignModel, &x, &y).unwrap_err();
        assert!(matches!(err, PipelineError::ShapeError { .. }));
    }
}
