//! Labeled Evaluation
//!
//! Runs the classifier over labeled samples under given settings and reports
//! how often it agrees with the labels. Used by operators to see what a
//! degradation change does before and after applying it.

use rand::Rng;

use crate::logic::classifier::{ClassifierError, RiskClassifier};
use crate::logic::features::RiskFeatures;
use crate::models::{AccuracySettings, ConfusionMatrix, EvaluationReport, LabeledSample, ValidationError};

pub const MAX_SAMPLES: usize = 10_000;

/// Validated sample ready for scoring
#[derive(Debug, Clone)]
pub struct PreparedSample {
    pub features: RiskFeatures,
    pub is_fraud: bool,
}

/// Validate every sample up front. One bad sample rejects the batch, naming
/// its index and field.
pub fn prepare(samples: Vec<LabeledSample>) -> Result<Vec<PreparedSample>, ValidationError> {
    if samples.is_empty() {
        return Err(ValidationError::new("samples", "must contain at least one sample"));
    }
    if samples.len() > MAX_SAMPLES {
        return Err(ValidationError::new(
            "samples",
            format!("at most {} samples per evaluation", MAX_SAMPLES),
        ));
    }

    samples
        .into_iter()
        .enumerate()
        .map(|(i, sample)| {
            let (telemetry, order) = sample
                .request
                .into_parts()
                .map_err(|e| e.within(&format!("samples[{}]", i)))?;
            Ok(PreparedSample {
                features: RiskFeatures::build(&telemetry, &order),
                is_fraud: sample.is_fraud,
            })
        })
        .collect()
}

pub fn run<R: Rng>(
    classifier: &RiskClassifier,
    samples: &[PreparedSample],
    settings: AccuracySettings,
    rng: &mut R,
) -> Result<EvaluationReport, ClassifierError> {
    let mut matrix = ConfusionMatrix::default();
    for sample in samples {
        let verdict = classifier.score_with_rng(&sample.features, &settings, rng)?;
        matrix.record(verdict.flagged, sample.is_fraud);
    }
    Ok(EvaluationReport::from_matrix(matrix, settings))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::VerifyRequest;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn sample(typing_speed: f64, time_on_page: f64, payment: &str, is_fraud: bool) -> LabeledSample {
        LabeledSample {
            request: VerifyRequest {
                typing_speed: Some(typing_speed),
                time_on_page: Some(time_on_page),
                payment_type: Some(payment.to_string()),
                ..Default::default()
            },
            is_fraud,
        }
    }

    fn labeled_batch() -> Vec<LabeledSample> {
        vec![
            sample(480.0, 2.0, "credit card", true),
            sample(460.0, 4.0, "paypal", true),
            sample(150.0, 120.0, "cash on delivery", false),
            sample(210.0, 75.0, "paytm", false),
        ]
    }

    #[test]
    fn test_empty_batch_rejected() {
        let err = prepare(vec![]).unwrap_err();
        assert_eq!(err.field, "samples");
    }

    #[test]
    fn test_bad_sample_named_by_index() {
        let mut batch = labeled_batch();
        batch.push(sample(100.0, 10.0, "bitcoin", false));
        let err = prepare(batch).unwrap_err();
        assert_eq!(err.field, "samples[4].payment_type");
    }

    #[test]
    fn test_undegraded_run_is_perfect_on_clear_cases() {
        let prepared = prepare(labeled_batch()).unwrap();
        let report = run(
            &RiskClassifier::default(),
            &prepared,
            AccuracySettings::default(),
            &mut StdRng::seed_from_u64(0),
        )
        .unwrap();

        assert_eq!(report.accuracy, 1.0);
        assert_eq!(report.confusion_matrix.true_positives, 2);
        assert_eq!(report.confusion_matrix.true_negatives, 2);
        assert_eq!(report.fraud_rate, 0.5);
    }

    #[test]
    fn test_degraded_run_tracks_target() {
        let batch: Vec<LabeledSample> = labeled_batch().into_iter().cycle().take(4_000).collect();
        let prepared = prepare(batch).unwrap();
        let settings = AccuracySettings {
            enabled: true,
            target_accuracy: 0.80,
            noise_factor: 0.10,
            bias_factor: 0.05,
        };

        let report = run(&RiskClassifier::default(), &prepared, settings, &mut StdRng::seed_from_u64(11)).unwrap();
        assert!((report.accuracy - 0.80).abs() <= 0.03, "accuracy {}", report.accuracy);
        assert_eq!(report.settings, settings);
    }
}
