//! Classification metrics

use crate::error::{PipelineError, Result};
use crate::training::decision_tree::unique_sorted;
use ndarray::Array1;
use serde::{Deserialize, Serialize};

fn check_pair(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> Result<()> {
    if y_true.len() != y_pred.len() {
        return Err(PipelineError::ShapeError {
            expected: format!("{} predictions", y_true.len()),
            actual: format!("{} predictions", y_pred.len()),
        });
    }
    if y_true.is_empty() {
        return Err(PipelineError::DataError("cannot score an empty label set".to_string()));
    }
    Ok(())
}

/// Fraction of predictions that exactly match the true label
pub fn accuracy_score(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> Result<f64> {
    check_pair(y_true, y_pred)?;
    let correct = y_true
        .iter()
        .zip(y_pred.iter())
        .filter(|(t, p)| t == p)
        .count();
    Ok(correct as f64 / y_true.len() as f64)
}

/// Precision, recall and F1 for a single class
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassMetrics {
    pub label: f64,
    pub precision: f64,
    pub recall: f64,
    pub f1_score: f64,
    /// Number of true samples of this class
    pub support: usize,
}

/// Averaged precision, recall and F1
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AverageMetrics {
    pub precision: f64,
    pub recall: f64,
    pub f1_score: f64,
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 {
        0.0
    } else {
        num as f64 / den as f64
    }
}

fn f1(precision: f64, recall: f64) -> f64 {
    if precision + recall > 0.0 {
        2.0 * precision * recall / (precision + recall)
    } else {
        0.0
    }
}

/// One entry per label found in either `y_true` or `y_pred`, sorted by label.
///
/// Undefined ratios (no predicted or no true samples) are reported as 0.0.
pub fn per_class_metrics(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> Result<Vec<ClassMetrics>> {
    check_pair(y_true, y_pred)?;
    let labels = unique_sorted(y_true.iter().chain(y_pred.iter()).copied());

    Ok(labels
        .into_iter()
        .map(|label| {
            let mut tp = 0;
            let mut predicted = 0;
            let mut actual = 0;
            for (&t, &p) in y_true.iter().zip(y_pred.iter()) {
                let is_true = t == label;
                let is_pred = p == label;
                if is_true {
                    actual += 1;
                }
                if is_pred {
                    predicted += 1;
                }
                if is_true && is_pred {
                    tp += 1;
                }
            }
            let precision = ratio(tp, predicted);
            let recall = ratio(tp, actual);
            ClassMetrics {
                label,
                precision,
                recall,
                f1_score: f1(precision, recall),
                support: actual,
            }
        })
        .collect())
}

/// Unweighted mean over classes
pub fn macro_average(classes: &[ClassMetrics]) -> AverageMetrics {
    let n = classes.len().max(1) as f64;
    AverageMetrics {
        precision: classes.iter().map(|c| c.precision).sum::<f64>() / n,
        recall: classes.iter().map(|c| c.recall).sum::<f64>() / n,
        f1_score: classes.iter().map(|c| c.f1_score).sum::<f64>() / n,
    }
}

/// Mean over classes weighted by support
pub fn weighted_average(classes: &[ClassMetrics]) -> AverageMetrics {
    let total: usize = classes.iter().map(|c| c.support).sum();
    if total == 0 {
        return AverageMetrics { precision: 0.0, recall: 0.0, f1_score: 0.0 };
    }
    let w = |f: fn(&ClassMetrics) -> f64| {
        classes.iter().map(|c| f(c) * c.support as f64).sum::<f64>() / total as f64
    };
    AverageMetrics {
        precision: w(|c| c.precision),
        recall: w(|c| c.recall),
        f1_score: w(|c| c.f1_score),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;

    #[test]
    fn test_accuracy() {
        let y_true = array![1.0, 0.0, 1.0, 1.0, 0.0, 1.0, 0.0, 0.0];
        let y_pred = array![1.0, 0.0, 1.0, 0.0, 0.0, 1.0, 1.0, 0.0];
        assert_relative_eq!(accuracy_score(&y_true, &y_pred).unwrap(), 0.75);
    }

    #[test]
    fn test_accuracy_length_mismatch() {
        assert!(accuracy_score(&array![1.0, 0.0], &array![1.0]).is_err());
        assert!(accuracy_score(&Array1::zeros(0), &Array1::zeros(0)).is_err());
    }

    #[test]
    fn test_per_class_metrics() {
        // class 1: tp=3 fp=1 fn=1, class 0: tp=3 fp=1 fn=1
        let y_true = array![1.0, 0.0, 1.0, 1.0, 0.0, 1.0, 0.0, 0.0];
        let y_pred = array![1.0, 0.0, 1.0, 0.0, 0.0, 1.0, 1.0, 0.0];
        let classes = per_class_metrics(&y_true, &y_pred).unwrap();

        assert_eq!(classes.len(), 2);
        assert_eq!(classes[0].label, 0.0);
        assert_eq!(classes[1].support, 4);
        assert_relative_eq!(classes[1].precision, 0.75);
        assert_relative_eq!(classes[1].recall, 0.75);
        assert_relative_eq!(classes[1].f1_score, 0.75);
    }

    #[test]
    fn test_zero_division_is_zero() {
        // class 2 is never predicted; class 5 never occurs
        let y_true = array![1.0, 2.0];
        let y_pred = array![1.0, 5.0];
        let classes = per_class_metrics(&y_true, &y_pred).unwrap();

        let two = classes.iter().find(|c| c.label == 2.0).unwrap();
        assert_eq!(two.precision, 0.0);
        assert_eq!(two.recall, 0.0);

        let five = classes.iter().find(|c| c.label == 5.0).unwrap();
        assert_eq!(five.support, 0);
        assert_eq!(five.f1_score, 0.0);
    }

    #[test]
    fn test_averages() {
        let y_true = array![0.0, 0.0, 0.0, 1.0];
        let y_pred = array![0.0, 0.0, 0.0, 0.0];
        let classes = per_class_metrics(&y_true, &y_pred).unwrap();

        let macro_avg = macro_average(&classes);
        assert_relative_eq!(macro_avg.recall, 0.5);

        let weighted = weighted_average(&classes);
        assert_relative_eq!(weighted.recall, 0.75);
        assert_relative_eq!(weighted.precision, 0.75 * 0.75);
    }
}
