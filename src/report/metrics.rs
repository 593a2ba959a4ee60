//! Binary classification summary for fitted probability models.
//!
//! Any ratio whose denominator is zero (no positives, no negatives, no
//! predicted positives) is reported as 0 rather than NaN.

use serde::Serialize;

use crate::error::{Result, SelectError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ConfusionMatrix {
    pub true_positive: usize,
    pub false_positive: usize,
    pub true_negative: usize,
    pub false_negative: usize,
}

impl ConfusionMatrix {
    pub fn total(&self) -> usize {
        self.true_positive + self.false_positive + self.true_negative + self.false_negative
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ClassificationReport {
    pub threshold: f64,
    pub confusion: ConfusionMatrix,
    pub accuracy: f64,
    /// True positive rate (recall).
    pub sensitivity: f64,
    /// True negative rate.
    pub specificity: f64,
    pub precision: f64,
    pub f1: f64,
    /// False discovery rate, `FP / (FP + TP)`.
    pub fdr: f64,
}

/// Classify `probabilities` at `threshold` (predict 1 when `p >= threshold`)
/// and compare against 0/1 `labels`.
pub fn classify(probabilities: &[f64], labels: &[f64], threshold: f64) -> Result<ClassificationReport> {
    if probabilities.len() != labels.len() {
        return Err(SelectError::invalid(format!(
            "Got {} probabilities for {} labels.",
            probabilities.len(),
            labels.len()
        )));
    }
    if !(0.0..=1.0).contains(&threshold) {
        return Err(SelectError::invalid("Classification threshold must be in [0, 1]."));
    }

    let mut cm = ConfusionMatrix {
        true_positive: 0,
        false_positive: 0,
        true_negative: 0,
        false_negative: 0,
    };
    for (i, (&p, &label)) in probabilities.iter().zip(labels).enumerate() {
        let actual = match label {
            l if l == 1.0 => true,
            l if l == 0.0 => false,
            other => {
                return Err(SelectError::invalid(format!(
                    "Label at row {i} must be 0 or 1, got {other}."
                )));
            }
        };
        let predicted = p >= threshold;
        match (predicted, actual) {
            (true, true) => cm.true_positive += 1,
            (true, false) => cm.false_positive += 1,
            (false, false) => cm.true_negative += 1,
            (false, true) => cm.false_negative += 1,
        }
    }

    let tp = cm.true_positive as f64;
    let fp = cm.false_positive as f64;
    let tn = cm.true_negative as f64;
    let fn_ = cm.false_negative as f64;

    let precision = ratio(tp, tp + fp);
    let sensitivity = ratio(tp, tp + fn_);
    Ok(ClassificationReport {
        threshold,
        confusion: cm,
        accuracy: ratio(tp + tn, cm.total() as f64),
        sensitivity,
        specificity: ratio(tn, tn + fp),
        precision,
        f1: ratio(2.0 * precision * sensitivity, precision + sensitivity),
        fdr: ratio(fp, fp + tp),
    })
}

fn ratio(num: f64, den: f64) -> f64 {
    if den > 0.0 { num / den } else { 0.0 }
}
