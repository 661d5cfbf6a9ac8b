//! Text classification report

use super::metrics::{
    accuracy_score, macro_average, per_class_metrics, weighted_average, AverageMetrics, ClassMetrics,
};
use crate::error::Result;
use ndarray::Array1;
use serde::{Deserialize, Serialize};
use std::fmt;

const HEADERS: [&str; 4] = ["precision", "recall", "f1-score", "support"];
const DIGITS: usize = 2;

/// Per-class precision/recall/F1 table with accuracy and average rows
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationReport {
    pub classes: Vec<ClassMetrics>,
    pub accuracy: f64,
    pub macro_avg: AverageMetrics,
    pub weighted_avg: AverageMetrics,
    pub total_support: usize,
}

impl ClassificationReport {
    pub fn new(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> Result<Self> {
        let classes = per_class_metrics(y_true, y_pred)?;
        Ok(Self {
            accuracy: accuracy_score(y_true, y_pred)?,
            macro_avg: macro_average(&classes),
            weighted_avg: weighted_average(&classes),
            total_support: y_true.len(),
            classes,
        })
    }

    /// Metrics for one label
    pub fn class(&self, label: f64) -> Option<&ClassMetrics> {
        self.classes.iter().find(|c| c.label == label)
    }
}

fn label_name(label: f64) -> String {
    if label.fract() == 0.0 && label.abs() < 1e15 {
        format!("{}", label as i64)
    } else {
        format!("{}", label)
    }
}

fn write_row(
    f: &mut fmt::Formatter<'_>,
    width: usize,
    name: &str,
    values: [f64; 3],
    support: usize,
) -> fmt::Result {
    write!(f, "{:>width$} ", name, width = width)?;
    for v in values {
        write!(f, " {:>9.prec$}", v, prec = DIGITS)?;
    }
    writeln!(f, " {:>9}", support)
}

impl fmt::Display for ClassificationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<String> = self.classes.iter().map(|c| label_name(c.label)).collect();
        let width = names
            .iter()
            .map(String::len)
            .chain(std::iter::once("weighted avg".len()))
            .max()
            .unwrap_or(0);

        write!(f, "{:>width$} ", "", width = width)?;
        for h in HEADERS {
            write!(f, " {:>9}", h)?;
        }
        writeln!(f)?;
        writeln!(f)?;

        for (name, c) in names.iter().zip(&self.classes) {
            write_row(f, width, name, [c.precision, c.recall, c.f1_score], c.support)?;
        }
        writeln!(f)?;

        writeln!(
            f,
            "{:>width$}  {:>9} {:>9} {:>9.prec$} {:>9}",
            "accuracy",
            "",
            "",
            self.accuracy,
            self.total_support,
            width = width,
            prec = DIGITS
        )?;

        for (name, avg) in [("macro avg", &self.macro_avg), ("weighted avg", &self.weighted_avg)] {
            write_row(
                f,
                width,
                name,
                [avg.precision, avg.recall, avg.f1_score],
                self.total_support,
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_report_layout() {
        let y_true = array![0.0, 0.0, 1.0, 1.0];
        let y_pred = array![0.0, 0.0, 1.0, 1.0];
        let report = ClassificationReport::new(&y_true, &y_pred).unwrap();

        let expected = "              precision    recall  f1-score   support\n\
                        \n\
                        \x20          0       1.00      1.00      1.00         2\n\
                        \x20          1       1.00      1.00      1.00         2\n\
                        \n\
                        \x20   accuracy                           1.00         4\n\
                        \x20  macro avg       1.00      1.00      1.00         4\n\
                        weighted avg       1.00      1.00      1.00         4\n";
        assert_eq!(report.to_string(), expected);
    }

    #[test]
    fn test_report_values() {
        let y_true = array![1.0, 0.0, 1.0, 1.0, 0.0, 1.0, 0.0, 0.0];
        let y_pred = array![1.0, 0.0, 1.0, 0.0, 0.0, 1.0, 1.0, 0.0];
        let report = ClassificationReport::new(&y_true, &y_pred).unwrap();

        assert_eq!(report.accuracy, 0.75);
        assert_eq!(report.total_support, 8);
        assert_eq!(report.class(1.0).unwrap().support, 4);
        assert!(report.class(2.0).is_none());
        assert!(report.to_string().contains("      0.75"));
    }

    #[test]
    fn test_label_names() {
        assert_eq!(label_name(1.0), "1");
        assert_eq!(label_name(-3.0), "-3");
        assert_eq!(label_name(0.5), "0.5");
    }
}
