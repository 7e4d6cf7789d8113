//! Decision Combiner
//!
//! Merges the classifier verdict with the detector verdict (if any) into one
//! Decision. Pure: inputs are borrowed, exactly one Decision comes out.
//!
//! Precedence:
//! 1. classifier block -> block
//! 2. detector anomaly -> block
//! 3. detector absent  -> governed by `FailSafePolicy`
//! 4. otherwise        -> allow

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::models::{Decision, Outcome, Verdict};

pub const ALLOW_REASON: &str = "verification successful";
pub const DETECTOR_UNAVAILABLE: &str = "detector unavailable";

/// Outcome rule when the detector gave no opinion (timeout, error)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailSafePolicy {
    /// Absent detector is no opinion; the classifier alone decides
    #[default]
    NoOpinion,
    /// Absent detector blocks
    Strict,
}

impl FailSafePolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailSafePolicy::NoOpinion => "no_opinion",
            FailSafePolicy::Strict => "strict",
        }
    }
}

impl std::fmt::Display for FailSafePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for FailSafePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "no_opinion" | "no-opinion" => Ok(FailSafePolicy::NoOpinion),
            "strict" => Ok(FailSafePolicy::Strict),
            other => Err(format!("unknown fail-safe policy `{}`", other)),
        }
    }
}

pub fn combine(classifier: &Verdict, detector: Option<&Verdict>, policy: FailSafePolicy) -> Decision {
    let mut reasons = Vec::new();

    if classifier.flagged {
        reasons.push(classifier_reason(classifier));
    }

    match detector {
        Some(d) if d.flagged => reasons.push(detector_reason(d)),
        Some(_) => {}
        None if policy == FailSafePolicy::Strict => reasons.push(DETECTOR_UNAVAILABLE.to_string()),
        None => {}
    }

    let mut verdicts = vec![classifier.clone()];
    verdicts.extend(detector.cloned());

    if !reasons.is_empty() {
        return Decision::new(Outcome::Block, reasons.join("; "), verdicts);
    }

    let reason = if detector.is_some() {
        ALLOW_REASON.to_string()
    } else {
        format!("{} (classifier only, {})", ALLOW_REASON, DETECTOR_UNAVAILABLE)
    };
    Decision::new(Outcome::Allow, reason, verdicts)
}

fn classifier_reason(verdict: &Verdict) -> String {
    let mut reason = match verdict.score {
        Some(score) => format!("{} flagged high risk (score {:.2})", verdict.label, score),
        None => format!("{} flagged high risk", verdict.label),
    };
    if !verdict.signals.is_empty() {
        reason.push_str(": ");
        reason.push_str(&verdict.signals.join(", "));
    }
    reason
}

fn detector_reason(verdict: &Verdict) -> String {
    let mut reason = match verdict.confidence {
        Some(c) => format!("{} reported anomaly (confidence {:.2})", verdict.label, c),
        None => format!("{} reported anomaly", verdict.label),
    };
    if !verdict.signals.is_empty() {
        reason.push_str(": ");
        reason.push_str(&verdict.signals.join(", "));
    }
    reason
}
