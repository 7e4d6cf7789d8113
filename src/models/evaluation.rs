//! Labeled-sample evaluation payloads

use serde::{Deserialize, Serialize};

use super::settings::AccuracySettings;
use super::telemetry::VerifyRequest;

/// One labeled order, same fields as a verify request plus the label
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LabeledSample {
    #[serde(flatten)]
    pub request: VerifyRequest,
    pub is_fraud: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EvaluationRequest {
    pub samples: Vec<LabeledSample>,
}

/// 2x2 confusion matrix, fraud is the positive class
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfusionMatrix {
    pub true_negatives: u64,
    pub false_positives: u64,
    pub false_negatives: u64,
    pub true_positives: u64,
}

impl ConfusionMatrix {
    pub fn record(&mut self, predicted_fraud: bool, actual_fraud: bool) {
        match (predicted_fraud, actual_fraud) {
            (false, false) => self.true_negatives += 1,
            (true, false) => self.false_positives += 1,
            (false, true) => self.false_negatives += 1,
            (true, true) => self.true_positives += 1,
        }
    }

    pub fn total(&self) -> u64 {
        self.true_negatives + self.false_positives + self.false_negatives + self.true_positives
    }

    pub fn accuracy(&self) -> f64 {
        ratio(self.true_positives + self.true_negatives, self.total())
    }

    /// Zero when nothing was predicted positive
    pub fn precision(&self) -> f64 {
        ratio(self.true_positives, self.true_positives + self.false_positives)
    }

    /// Zero when there were no positives
    pub fn recall(&self) -> f64 {
        ratio(self.true_positives, self.true_positives + self.false_negatives)
    }

    pub fn f1_score(&self) -> f64 {
        let (p, r) = (self.precision(), self.recall());
        if p + r == 0.0 {
            0.0
        } else {
            2.0 * p * r / (p + r)
        }
    }

    pub fn fraud_rate(&self) -> f64 {
        ratio(self.true_positives + self.false_negatives, self.total())
    }
}

fn ratio(numerator: u64, denominator: u64) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

/// Metrics for one evaluation run, rounded to 4 places
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationReport {
    pub accuracy: f64,
    pub precision: f64,
    pub recall: f64,
    pub f1_score: f64,
    pub confusion_matrix: ConfusionMatrix,
    pub total_samples: u64,
    pub fraud_rate: f64,
    /// Settings the classifier ran under
    pub settings: AccuracySettings,
}

impl EvaluationReport {
    pub fn from_matrix(matrix: ConfusionMatrix, settings: AccuracySettings) -> Self {
        Self {
            accuracy: round4(matrix.accuracy()),
            precision: round4(matrix.precision()),
            recall: round4(matrix.recall()),
            f1_score: round4(matrix.f1_score()),
            confusion_matrix: matrix,
            total_samples: matrix.total(),
            fraud_rate: round4(matrix.fraud_rate()),
            settings,
        }
    }
}

fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}
