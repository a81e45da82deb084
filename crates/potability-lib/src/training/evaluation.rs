//! Held-out evaluation of binary classifiers

use crate::models::Potability;
use serde::Serialize;
use std::fmt;

/// Precision and recall for one class
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ClassScores {
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub support: usize,
}

/// Accuracy, confusion matrix and per-class scores
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassificationReport {
    pub accuracy: f64,
    /// `confusion[actual][predicted]`, indexed by label
    pub confusion: [[usize; 2]; 2],
    pub not_potable: ClassScores,
    pub potable: ClassScores,
}

impl ClassificationReport {
    /// Compare predictions against ground truth.
    ///
    /// Both slices must have the same length; an empty comparison reports
    /// zero accuracy.
    pub fn compute(actual: &[Potability], predicted: &[Potability]) -> Self {
        let mut confusion = [[0usize; 2]; 2];
        for (a, p) in actual.iter().zip(predicted) {
            confusion[a.label() as usize][p.label() as usize] += 1;
        }

        let total = actual.len().min(predicted.len());
        let correct = confusion[0][0] + confusion[1][1];
        let accuracy = if total == 0 {
            0.0
        } else {
            correct as f64 / total as f64
        };

        Self {
            accuracy,
            confusion,
            not_potable: class_scores(&confusion, 0),
            potable: class_scores(&confusion, 1),
        }
    }
}

fn class_scores(confusion: &[[usize; 2]; 2], class: usize) -> ClassScores {
    let tp = confusion[class][class] as f64;
    let predicted = (confusion[0][class] + confusion[1][class]) as f64;
    let support = confusion[class][0] + confusion[class][1];

    let precision = ratio(tp, predicted);
    let recall = ratio(tp, support as f64);
    let f1 = ratio(2.0 * precision * recall, precision + recall);
    ClassScores {
        precision,
        recall,
        f1,
        support,
    }
}

fn ratio(num: f64, den: f64) -> f64 {
    if den == 0.0 {
        0.0
    } else {
        num / den
    }
}

impl fmt::Display for ClassificationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{:>14} {:>9} {:>9} {:>9} {:>9}", "", "precision", "recall", "f1", "support")?;
        for (name, s) in [("Not Potable", &self.not_potable), ("Potable", &self.potable)] {
            writeln!(
                f,
                "{:>14} {:>9.2} {:>9.2} {:>9.2} {:>9}",
                name, s.precision, s.recall, s.f1, s.support
            )?;
        }
        writeln!(f, "{:>14} {:>9.4}", "accuracy", self.accuracy)?;
        write!(
            f,
            "confusion [[{}, {}], [{}, {}]]",
            self.confusion[0][0], self.confusion[0][1], self.confusion[1][0], self.confusion[1][1]
        )
    }
}
