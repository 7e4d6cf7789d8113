//! Raw Risk Scorer
//!
//! Deterministic: features in, score + explanation out. No randomness here.

use serde::{Deserialize, Serialize};

use super::rules::*;
use crate::logic::features::{Feature, RiskFeatures};
use crate::models::PaymentMethod;

/// How the raw score was assembled
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub speed_signal: f64,
    pub dwell_signal: f64,
    pub keystroke_signal: f64,
    pub uniformity_signal: f64,
    pub context_adjustment: f64,
    pub raw: f64,
}

/// Compute the raw risk score in [0, 1] and the signals that fired.
pub fn raw_score(features: &RiskFeatures, weights: &ClassifierWeights) -> (ScoreBreakdown, Vec<String>) {
    let mut signals = Vec::new();

    let speed = features.get(Feature::TypingSpeed);
    let speed_signal = ramp_up(speed, SPEED_RISK_FLOOR_CPM, SPEED_RISK_CEIL_CPM);
    if speed_signal > 0.0 {
        signals.push(format!("typing speed {:.0} cpm above human range", speed));
    }

    let dwell = features.get(Feature::TimeOnPage);
    let dwell_signal = ramp_down(dwell, DWELL_RISK_FLOOR_SECS, DWELL_SAFE_SECS);
    if dwell_signal > 0.0 {
        signals.push(format!("only {:.1}s on checkout page", dwell));
    }

    let keystroke_signal = keystroke_signal(features, &mut signals);

    let uniformity_signal = if features.get(Feature::FocusFieldCount) >= MIN_FIELDS_FOR_UNIFORMITY {
        let cv = features.get(Feature::FocusDwellCv);
        let signal = ramp_down(cv, 0.0, UNIFORM_DWELL_CV);
        if signal > 0.0 {
            signals.push(format!("field dwell unusually uniform (cv {:.3})", cv));
        }
        signal
    } else {
        0.0
    };

    let behavioral = speed_signal * weights.typing_speed
        + dwell_signal * weights.dwell
        + keystroke_signal * weights.keystrokes
        + uniformity_signal * weights.uniformity;

    let context_adjustment = context_adjustment(features);
    let raw = (behavioral + context_adjustment).clamp(0.0, 1.0);

    (
        ScoreBreakdown {
            speed_signal,
            dwell_signal,
            keystroke_signal,
            uniformity_signal,
            context_adjustment,
            raw,
        },
        signals,
    )
}

fn keystroke_signal(features: &RiskFeatures, signals: &mut Vec<String>) -> f64 {
    if features.get(Feature::KeystrokesReported) < 1.0 {
        return 0.0;
    }

    if features.get(Feature::KeystrokeCount) == 0.0 {
        signals.push("form submitted without keystrokes".to_string());
        return 1.0;
    }

    let rate = features.get(Feature::KeystrokesPerSec);
    if rate > MAX_HUMAN_KEYSTROKES_PER_SEC {
        signals.push(format!("{:.1} keystrokes/s sustained", rate));
        return 1.0;
    }

    0.0
}

fn context_adjustment(features: &RiskFeatures) -> f64 {
    let payment = PaymentMethod::from_code(features.get(Feature::PaymentCode) as u8)
        .map(payment_risk)
        .unwrap_or(0.0);

    let prior_orders = features.get(Feature::PriorOrderCount);
    let history = if prior_orders == 0.0 {
        FIRST_ORDER_BUMP
    } else if prior_orders >= RETURNING_CUSTOMER_ORDERS {
        -RETURNING_CUSTOMER_RELIEF
    } else {
        0.0
    };

    let anonymous = if features.get(Feature::IsAnonymous) >= 1.0 {
        ANONYMOUS_BUMP
    } else {
        0.0
    };

    payment + history + anonymous
}

/// 0 at or below `low`, 1 at or above `high`, linear between
fn ramp_up(value: f64, low: f64, high: f64) -> f64 {
    ((value - low) / (high - low)).clamp(0.0, 1.0)
}

/// 1 at or below `low`, 0 at or above `high`, linear between
fn ramp_down(value: f64, low: f64, high: f64) -> f64 {
    1.0 - ramp_up(value, low, high)
}
