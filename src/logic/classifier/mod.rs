//! Local Risk Classifier
//!
//! Scores one order's features and returns the classifier verdict.
//!
//! ## Structure
//! - `rules`: weights, thresholds, constants
//! - `scorer`: deterministic raw score
//! - `degradation`: configured noise/bias/target transform
//!
//! Settings are passed in per call, so a concurrent settings update applies to
//! the next call and never to one already running.

pub mod rules;
pub mod scorer;
pub mod degradation;

use rand::Rng;
use thiserror::Error;

use crate::logic::features::{RiskFeatures, FEATURE_VERSION};
use crate::models::{AccuracySettings, Verdict};

pub use degradation::{degrade, DegradedScore};
pub use rules::{ClassifierWeights, DECISION_THRESHOLD};
pub use scorer::{raw_score, ScoreBreakdown};

/// Pipeline defect while scoring. Fatal to the one verification.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ClassifierError {
    #[error("feature layout mismatch: expected v{expected_version}, got v{actual_version} (hash {actual_hash:#x})")]
    LayoutMismatch {
        expected_version: u8,
        actual_version: u8,
        actual_hash: u32,
    },
    #[error("feature `{name}` is not finite ({value})")]
    NonFiniteFeature { name: &'static str, value: f64 },
    #[error("raw score is not finite ({0}); check classifier weights")]
    NonFiniteScore(f64),
}

#[derive(Debug, Clone, Default)]
pub struct RiskClassifier {
    weights: ClassifierWeights,
}

impl RiskClassifier {
    pub fn new(weights: ClassifierWeights) -> Self {
        Self { weights }
    }

    pub fn weights(&self) -> &ClassifierWeights {
        &self.weights
    }

    /// Score using the thread-local RNG for degradation draws
    pub fn score(
        &self,
        features: &RiskFeatures,
        settings: &AccuracySettings,
    ) -> Result<Verdict, ClassifierError> {
        self.score_with_rng(features, settings, &mut rand::thread_rng())
    }

    /// Score with a caller-supplied RNG. With degradation disabled the RNG is
    /// never touched and the result depends on `features` alone.
    pub fn score_with_rng<R: Rng>(
        &self,
        features: &RiskFeatures,
        settings: &AccuracySettings,
        rng: &mut R,
    ) -> Result<Verdict, ClassifierError> {
        check_features(features)?;

        let threshold = self.weights.threshold;
        let (breakdown, mut signals) = raw_score(features, &self.weights);
        let raw = breakdown.raw;
        if !raw.is_finite() {
            return Err(ClassifierError::NonFiniteScore(raw));
        }

        let (score, confidence) = if settings.enabled {
            let degraded = degrade(raw, threshold, settings, rng);
            signals.push(format!(
                "degraded toward {} (jitter {:+.3}, bias -{:.2})",
                settings.target_percentage(),
                degraded.jitter,
                settings.bias_factor
            ));
            let confidence = margin_confidence(degraded.score, threshold) * (1.0 - settings.noise_factor);
            (degraded.score, confidence)
        } else {
            (raw, margin_confidence(raw, threshold))
        };

        Ok(Verdict::classifier(score >= threshold)
            .with_confidence(confidence)
            .with_scores(raw, score)
            .with_signals(signals))
    }
}

fn check_features(features: &RiskFeatures) -> Result<(), ClassifierError> {
    if !features.is_compatible() {
        return Err(ClassifierError::LayoutMismatch {
            expected_version: FEATURE_VERSION,
            actual_version: features.version,
            actual_hash: features.layout_hash,
        });
    }
    if let Some((name, value)) = features.first_non_finite() {
        return Err(ClassifierError::NonFiniteFeature { name, value });
    }
    Ok(())
}

/// Distance from the threshold, scaled to [0, 1]
fn margin_confidence(score: f64, threshold: f64) -> f64 {
    let span = threshold.max(1.0 - threshold);
    if span <= 0.0 {
        return 1.0;
    }
    ((score - threshold).abs() / span).min(1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::features::{Feature, FEATURE_COUNT};
    use crate::models::{OrderContext, PaymentMethod, TelemetryPayload, VerdictSource};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn features(typing_speed: f64, time_on_page: f64) -> RiskFeatures {
        RiskFeatures::build(
            &TelemetryPayload::new(typing_speed, time_on_page),
            &OrderContext::new(PaymentMethod::CreditCard),
        )
    }

    fn degraded(target: f64) -> AccuracySettings {
        AccuracySettings {
            enabled: true,
            target_accuracy: target,
            noise_factor: 0.2,
            bias_factor: 0.15,
        }
    }

    #[test]
    fn test_disabled_is_deterministic() {
        let classifier = RiskClassifier::default();
        let f = features(450.0, 2.0);
        let settings = AccuracySettings::default();

        let first = classifier.score(&f, &settings).unwrap();
        for _ in 0..50 {
            assert_eq!(classifier.score(&f, &settings).unwrap(), first);
        }
        assert!(first.flagged);
        assert_eq!(first.source, VerdictSource::Classifier);
        assert_eq!(first.raw_score, first.score);
    }

    #[test]
    fn test_disabled_ignores_rng() {
        let classifier = RiskClassifier::default();
        let f = features(180.0, 95.0);
        let settings = AccuracySettings::default();

        let a = classifier.score_with_rng(&f, &settings, &mut StdRng::seed_from_u64(1)).unwrap();
        let b = classifier.score_with_rng(&f, &settings, &mut StdRng::seed_from_u64(2)).unwrap();
        assert_eq!(a, b);
        assert!(!a.flagged);
    }

    #[test]
    fn test_enabled_with_seed_is_deterministic() {
        let classifier = RiskClassifier::default();
        let f = features(300.0, 12.0);

        let a = classifier.score_with_rng(&f, &degraded(0.8), &mut StdRng::seed_from_u64(42)).unwrap();
        let b = classifier.score_with_rng(&f, &degraded(0.8), &mut StdRng::seed_from_u64(42)).unwrap();
        assert_eq!(a, b);
        assert!(a.signals.iter().any(|s| s.starts_with("degraded")));
    }

    #[test]
    fn test_raw_score_is_pre_degradation() {
        let classifier = RiskClassifier::default();
        let f = features(450.0, 2.0);
        let plain = classifier.score(&f, &AccuracySettings::default()).unwrap();
        let noisy = classifier
            .score_with_rng(&f, &degraded(0.7), &mut StdRng::seed_from_u64(3))
            .unwrap();
        assert_eq!(plain.raw_score, noisy.raw_score);
    }

    #[test]
    fn test_accuracy_against_labels_converges() {
        let classifier = RiskClassifier::default();
        // Ground truth: fraud sessions are fast and short, humans slow and long
        let fraud = features(480.0, 3.0);
        let human = features(150.0, 120.0);
        let settings = degraded(0.75);

        let trials = 10_000u64;
        let mut correct = 0u64;
        for seed in 0..trials {
            let is_fraud = seed % 3 == 0;
            let f = if is_fraud { &fraud } else { &human };
            let verdict = classifier
                .score_with_rng(f, &settings, &mut StdRng::seed_from_u64(seed))
                .unwrap();
            if verdict.flagged == is_fraud {
                correct += 1;
            }
        }

        let accuracy = correct as f64 / trials as f64;
        assert!((accuracy - 0.75).abs() <= 0.03, "accuracy {}", accuracy);
    }

    #[test]
    fn test_non_finite_feature_is_classifier_error() {
        let mut values = [0.0; FEATURE_COUNT];
        values[Feature::TypingSpeed.index()] = f64::INFINITY;
        let f = RiskFeatures::from_values(values);

        let err = RiskClassifier::default()
            .score(&f, &AccuracySettings::default())
            .unwrap_err();
        assert!(matches!(err, ClassifierError::NonFiniteFeature { name: "typing_speed_cpm", .. }));
    }

    #[test]
    fn test_layout_mismatch_is_classifier_error() {
        let mut f = features(100.0, 60.0);
        f.version = FEATURE_VERSION + 1;

        let err = RiskClassifier::default()
            .score(&f, &AccuracySettings::default())
            .unwrap_err();
        assert!(matches!(err, ClassifierError::LayoutMismatch { .. }));
    }

    #[test]
    fn test_poisoned_weights_are_classifier_error() {
        let weights = ClassifierWeights {
            dwell: f64::NAN,
            ..Default::default()
        };
        let err = RiskClassifier::new(weights)
            .score(&features(100.0, 60.0), &AccuracySettings::default())
            .unwrap_err();
        assert!(matches!(err, ClassifierError::NonFiniteScore(_)));
    }

    #[test]
    fn test_confidence_in_unit_range() {
        let classifier = RiskClassifier::default();
        let v = classifier.score(&features(2000.0, 0.0), &AccuracySettings::default()).unwrap();
        let c = v.confidence.unwrap();
        assert!((0.0..=1.0).contains(&c));
    }
}
