//! Verdicts and decisions

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============================================================================
// VERDICT
// ============================================================================

/// Which pipeline stage produced a verdict
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerdictSource {
    Classifier,
    Detector,
}

impl VerdictSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            VerdictSource::Classifier => "classifier",
            VerdictSource::Detector => "detector",
        }
    }
}

/// A single source's boolean risk opinion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Verdict {
    pub source: VerdictSource,
    /// Short name of the concrete producer, e.g. `classifier` or `detector:rules`
    pub label: String,
    /// Block (classifier) or anomaly (detector)
    pub flagged: bool,
    pub confidence: Option<f64>,
    /// Pre-degradation score
    pub raw_score: Option<f64>,
    /// Score the verdict was derived from (post-degradation for the classifier)
    pub score: Option<f64>,
    /// Signals that contributed, for audit
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub signals: Vec<String>,
}

impl Verdict {
    pub fn classifier(flagged: bool) -> Self {
        Self {
            source: VerdictSource::Classifier,
            label: VerdictSource::Classifier.as_str().to_string(),
            flagged,
            confidence: None,
            raw_score: None,
            score: None,
            signals: vec![],
        }
    }

    pub fn detector(label: &str, flagged: bool) -> Self {
        Self {
            source: VerdictSource::Detector,
            label: format!("detector:{}", label),
            flagged,
            confidence: None,
            raw_score: None,
            score: None,
            signals: vec![],
        }
    }

    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = Some(confidence.clamp(0.0, 1.0));
        self
    }

    pub fn with_scores(mut self, raw_score: f64, score: f64) -> Self {
        self.raw_score = Some(raw_score);
        self.score = Some(score);
        self
    }

    pub fn with_signals(mut self, signals: Vec<String>) -> Self {
        self.signals = signals;
        self
    }
}

// ============================================================================
// DECISION
// ============================================================================

/// Final gateway outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Allow,
    Block,
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Allow => "allow",
            Outcome::Block => "block",
        }
    }
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One verification result. Built once by the combiner, never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    pub id: Uuid,
    pub outcome: Outcome,
    pub reason: String,
    pub contributing_verdicts: Vec<Verdict>,
    pub decided_at: DateTime<Utc>,
}

impl Decision {
    pub(crate) fn new(outcome: Outcome, reason: String, contributing_verdicts: Vec<Verdict>) -> Self {
        Self {
            id: Uuid::new_v4(),
            outcome,
            reason,
            contributing_verdicts,
            decided_at: Utc::now(),
        }
    }

    pub fn is_block(&self) -> bool {
        self.outcome == Outcome::Block
    }

    pub fn verdict(&self, source: VerdictSource) -> Option<&Verdict> {
        self.contributing_verdicts.iter().find(|v| v.source == source)
    }

    /// Whether the secondary detector contributed an opinion
    pub fn detector_consulted(&self) -> bool {
        self.verdict(VerdictSource::Detector).is_some()
    }
}

// ============================================================================
// WIRE RESPONSE
// ============================================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct VerifyResponse {
    pub decision: Outcome,
    pub reason: String,
    pub details: DecisionDetails,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DecisionDetails {
    pub decision_id: Uuid,
    pub fraud_probability: Option<f64>,
    pub raw_score: Option<f64>,
    pub detector_consulted: bool,
    pub verdicts: Vec<Verdict>,
    pub decided_at: DateTime<Utc>,
}

impl From<Decision> for VerifyResponse {
    fn from(decision: Decision) -> Self {
        let classifier = decision.verdict(VerdictSource::Classifier);
        let fraud_probability = classifier.and_then(|v| v.score);
        let raw_score = classifier.and_then(|v| v.raw_score);
        let detector_consulted = decision.detector_consulted();

        Self {
            decision: decision.outcome,
            reason: decision.reason,
            details: DecisionDetails {
                decision_id: decision.id,
                fraud_probability,
                raw_score,
                detector_consulted,
                verdicts: decision.contributing_verdicts,
                decided_at: decision.decided_at,
            },
        }
    }
}
