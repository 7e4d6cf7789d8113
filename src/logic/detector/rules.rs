//! Rule-based detector
//!
//! Deterministic heuristics that look at the order context next to the
//! telemetry. Each rule that fires adds to confidence.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{AnomalyDetector, DetectorError, DetectorKind};
use crate::logic::features::{Feature, RiskFeatures};
use crate::models::{OrderContext, Verdict};

const RULE_COUNT: f64 = 3.0;
const BASE_CONFIDENCE: f64 = 0.6;
const CONFIDENCE_PER_EXTRA_HIT: f64 = 0.15;
const MAX_CONFIDENCE: f64 = 0.95;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleThresholds {
    /// Account history considered long-standing
    pub veteran_order_count: u32,
    /// A session shorter than this counts as brand new (seconds)
    pub fresh_session_secs: f64,
    /// Typing speed no person sustains (characters/minute)
    pub max_human_cpm: f64,
}

impl Default for RuleThresholds {
    fn default() -> Self {
        Self {
            veteran_order_count: 50,
            fresh_session_secs: 10.0,
            max_human_cpm: 1200.0,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct RuleBasedDetector {
    thresholds: RuleThresholds,
}

impl RuleBasedDetector {
    pub fn new(thresholds: RuleThresholds) -> Self {
        Self { thresholds }
    }

    /// Names of the rules that fire for this order
    pub fn evaluate(&self, order: &OrderContext, features: &RiskFeatures) -> Vec<String> {
        let t = &self.thresholds;
        let mut hits = Vec::new();

        let dwell = features.get(Feature::TimeOnPage);
        if order.prior_order_count >= t.veteran_order_count && dwell < t.fresh_session_secs {
            hits.push(format!(
                "account with {} prior orders on a {:.1}s session",
                order.prior_order_count, dwell
            ));
        }

        let speed = features.get(Feature::TypingSpeed);
        if speed > t.max_human_cpm {
            hits.push(format!("typing speed {:.0} cpm exceeds {:.0}", speed, t.max_human_cpm));
        }

        if order.is_anonymous()
            && order.payment_method.is_card_like()
            && features.get(Feature::FocusFieldCount) == 0.0
        {
            hits.push(format!(
                "anonymous {} checkout without field interaction",
                order.payment_method
            ));
        }

        hits
    }
}

#[async_trait]
impl AnomalyDetector for RuleBasedDetector {
    fn kind(&self) -> DetectorKind {
        DetectorKind::RuleBased
    }

    async fn check(&self, order: &OrderContext, features: &RiskFeatures) -> Result<Verdict, DetectorError> {
        let hits = self.evaluate(order, features);
        let score = hits.len() as f64 / RULE_COUNT;

        let verdict = Verdict::detector(DetectorKind::RuleBased.as_str(), !hits.is_empty());
        let verdict = if hits.is_empty() {
            verdict
        } else {
            let extra = (hits.len() - 1) as f64;
            verdict.with_confidence((BASE_CONFIDENCE + CONFIDENCE_PER_EXTRA_HIT * extra).min(MAX_CONFIDENCE))
        };

        let mut verdict = verdict.with_signals(hits);
        verdict.score = Some(score);
        Ok(verdict)
    }
}
