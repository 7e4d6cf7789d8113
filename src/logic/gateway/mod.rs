//! Verification Gateway
//!
//! Orchestration boundary for one order:
//!
//! ```text
//! validate -> build features -> read settings -> { classifier, detector (timeout) } -> combine
//! ```
//!
//! Classifier and detector run concurrently. The detector is bounded by
//! `detector_timeout`; on timeout or error it is treated as absent and the
//! fail-safe policy applies. A classifier failure fails the one verification.
//! Also fronts the accuracy store and the labeled evaluation.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use thiserror::Error;

use crate::logic::accuracy::AccuracyStore;
use crate::logic::classifier::{ClassifierError, RiskClassifier};
use crate::logic::combiner::{combine, FailSafePolicy};
use crate::logic::detector::{AnomalyDetector, DetectorKind};
use crate::logic::evaluation;
use crate::logic::features::RiskFeatures;
use crate::models::{
    AccuracySettings, Decision, EvaluationReport, LabeledSample, OrderContext, TelemetryPayload,
    ValidationError, Verdict, VerdictSource, VerifyRequest,
};


// ============================================================================
// ERRORS & OPTIONS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Error)]
pub enum GatewayError {
    /// Bad input; the caller can fix it
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// Pipeline defect; internal error for this call only
    #[error("classifier failure: {0}")]
    Classifier(#[from] ClassifierError),
}

#[derive(Debug, Clone)]
pub struct GatewayOptions {
    pub detector_timeout: Duration,
    pub fail_safe: FailSafePolicy,
    /// Fixed seed makes degradation draws reproducible across runs
    pub seed: Option<u64>,
}

impl Default for GatewayOptions {
    fn default() -> Self {
        Self {
            detector_timeout: Duration::from_millis(250),
            fail_safe: FailSafePolicy::NoOpinion,
            seed: None,
        }
    }
}

// ============================================================================
// COUNTERS
// ============================================================================

#[derive(Debug, Default)]
struct Counters {
    verifications: AtomicU64,
    blocks: AtomicU64,
    allows: AtomicU64,
    validation_rejections: AtomicU64,
    detector_timeouts: AtomicU64,
    detector_errors: AtomicU64,
    classifier_failures: AtomicU64,
    evaluations: AtomicU64,
}

fn bump(counter: &AtomicU64) {
    counter.fetch_add(1, Ordering::Relaxed);
}

/// Point-in-time copy of the gateway counters
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GatewayStats {
    pub verifications: u64,
    pub blocks: u64,
    pub allows: u64,
    pub validation_rejections: u64,
    pub detector_timeouts: u64,
    pub detector_errors: u64,
    pub classifier_failures: u64,
    pub evaluations: u64,
    pub settings_revision: u64,
    pub detector: DetectorKind,
    pub fail_safe_policy: FailSafePolicy,
}

// ============================================================================
// GATEWAY
// ============================================================================

pub struct VerificationGateway {
    store: Arc<AccuracyStore>,
    classifier: RiskClassifier,
    detector: Arc<dyn AnomalyDetector>,
    options: GatewayOptions,
    /// Present only when seeded; otherwise draws come from the thread RNG
    rng: Option<Mutex<StdRng>>,
    counters: Counters,
}

impl VerificationGateway {
    pub fn new(store: Arc<AccuracyStore>, detector: Arc<dyn AnomalyDetector>, options: GatewayOptions) -> Self {
        let rng = options.seed.map(|seed| Mutex::new(StdRng::seed_from_u64(seed)));
        Self {
            store,
            classifier: RiskClassifier::default(),
            detector,
            options,
            rng,
            counters: Counters::default(),
        }
    }

    pub fn with_classifier(mut self, classifier: RiskClassifier) -> Self {
        self.classifier = classifier;
        self
    }

    pub fn classifier(&self) -> &RiskClassifier {
        &self.classifier
    }

    pub fn detector_kind(&self) -> DetectorKind {
        self.detector.kind()
    }

    pub fn options(&self) -> &GatewayOptions {
        &self.options
    }

    /// Verify a wire request: required-field and payment checks, then `verify`.
    pub async fn verify_request(&self, request: VerifyRequest) -> Result<Decision, GatewayError> {
        let (telemetry, order) = request.into_parts().map_err(|err| self.reject(err))?;
        self.verify(&telemetry, &order).await
    }

    pub async fn verify(&self, telemetry: &TelemetryPayload, order: &OrderContext) -> Result<Decision, GatewayError> {
        telemetry.check().map_err(|err| self.reject(err))?;
        order.check().map_err(|err| self.reject(err))?;

        let features = RiskFeatures::build(telemetry, order);
        let settings = self.store.get();

        let (classified, detected) = tokio::join!(
            async { self.classify(&features, &settings) },
            self.consult_detector(order, &features),
        );

        let classifier_verdict = classified.map_err(|err| {
            bump(&self.counters.classifier_failures);
            tracing::error!("Classifier failed: {}", err);
            GatewayError::Classifier(err)
        })?;

        let decision = combine(&classifier_verdict, detected.as_ref(), self.options.fail_safe);
        self.record(&decision, order);
        Ok(decision)
    }

    // ------------------------------------------------------------------------
    // Accuracy control pass-throughs
    // ------------------------------------------------------------------------

    pub fn get_accuracy_settings(&self) -> AccuracySettings {
        self.store.get()
    }

    pub fn set_accuracy_settings(&self, candidate: AccuracySettings) -> Result<AccuracySettings, ValidationError> {
        self.store.set(candidate)
    }

    /// Score labeled samples under the current settings.
    pub fn evaluate(&self, samples: Vec<LabeledSample>) -> Result<EvaluationReport, GatewayError> {
        let prepared = evaluation::prepare(samples)?;
        let settings = self.store.get();

        let report = match &self.rng {
            Some(rng) => evaluation::run(&self.classifier, &prepared, settings, &mut *rng.lock()),
            None => evaluation::run(&self.classifier, &prepared, settings, &mut rand::thread_rng()),
        }?;

        bump(&self.counters.evaluations);
        tracing::info!(
            "Evaluated {} samples: accuracy={:.4}, f1={:.4}, degradation={}",
            report.total_samples,
            report.accuracy,
            report.f1_score,
            if settings.enabled { "on" } else { "off" },
        );
        Ok(report)
    }

    pub fn stats(&self) -> GatewayStats {
        let c = &self.counters;
        GatewayStats {
            verifications: c.verifications.load(Ordering::Relaxed),
            blocks: c.blocks.load(Ordering::Relaxed),
            allows: c.allows.load(Ordering::Relaxed),
            validation_rejections: c.validation_rejections.load(Ordering::Relaxed),
            detector_timeouts: c.detector_timeouts.load(Ordering::Relaxed),
            detector_errors: c.detector_errors.load(Ordering::Relaxed),
            classifier_failures: c.classifier_failures.load(Ordering::Relaxed),
            evaluations: c.evaluations.load(Ordering::Relaxed),
            settings_revision: self.store.revision(),
            detector: self.detector.kind(),
            fail_safe_policy: self.options.fail_safe,
        }
    }

    // ------------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------------

    fn reject(&self, err: ValidationError) -> ValidationError {
        bump(&self.counters.validation_rejections);
        tracing::debug!("Rejected verification: {}", err);
        err
    }

    fn classify(&self, features: &RiskFeatures, settings: &AccuracySettings) -> Result<Verdict, ClassifierError> {
        match &self.rng {
            Some(rng) => self.classifier.score_with_rng(features, settings, &mut *rng.lock()),
            None => self.classifier.score(features, settings),
        }
    }

    /// `None` means no opinion: timed out or failed.
    async fn consult_detector(&self, order: &OrderContext, features: &RiskFeatures) -> Option<Verdict> {
        let timeout = self.options.detector_timeout;
        let kind = self.detector.kind();

        match tokio::time::timeout(timeout, self.detector.check(order, features)).await {
            Ok(Ok(verdict)) => Some(verdict),
            Ok(Err(err)) if err.is_timeout() => {
                bump(&self.counters.detector_timeouts);
                tracing::warn!("Detector {} timed out: {}", kind, err);
                None
            }
            Ok(Err(err)) => {
                bump(&self.counters.detector_errors);
                tracing::warn!("Detector {} failed: {}", kind, err);
                None
            }
            Err(_) => {
                bump(&self.counters.detector_timeouts);
                tracing::warn!("Detector {} gave no answer within {:?}", kind, timeout);
                None
            }
        }
    }

    fn record(&self, decision: &Decision, order: &OrderContext) {
        bump(&self.counters.verifications);

        let raw_score = decision
            .verdict(VerdictSource::Classifier)
            .and_then(|v| v.raw_score)
            .unwrap_or_default();
        let user = order.user_id.as_deref().unwrap_or("anonymous");

        if decision.is_block() {
            bump(&self.counters.blocks);
            tracing::info!(
                decision_id = %decision.id,
                user_id = user,
                raw_score = raw_score,
                "Order blocked: {}",
                decision.reason
            );
        } else {
            bump(&self.counters.allows);
            tracing::debug!(
                decision_id = %decision.id,
                user_id = user,
                raw_score = raw_score,
                "Order allowed: {}",
                decision.reason
            );
        }
    }
}
