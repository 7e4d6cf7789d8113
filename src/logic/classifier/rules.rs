//! Classifier Rules & Weights
//!
//! Constants and weight config only. Scoring lives in `scorer`.

use serde::{Deserialize, Serialize};

use crate::models::PaymentMethod;

// ============================================================================
// DECISION THRESHOLD
// ============================================================================

/// Score at or above this blocks
pub const DECISION_THRESHOLD: f64 = 0.5;

// ============================================================================
// SIGNAL WEIGHTS
// ============================================================================

pub const TYPING_SPEED_WEIGHT: f64 = 0.35;
pub const DWELL_WEIGHT: f64 = 0.40;
pub const KEYSTROKE_WEIGHT: f64 = 0.15;
pub const UNIFORMITY_WEIGHT: f64 = 0.10;

// ============================================================================
// SIGNAL RANGES
// ============================================================================

/// Typing speed starts contributing risk above this (characters/minute)
pub const SPEED_RISK_FLOOR_CPM: f64 = 250.0;
/// Typing speed contributes full risk at or above this
pub const SPEED_RISK_CEIL_CPM: f64 = 500.0;

/// Page dwell at or below this is full risk (seconds)
pub const DWELL_RISK_FLOOR_SECS: f64 = 5.0;
/// Page dwell at or above this carries no risk
pub const DWELL_SAFE_SECS: f64 = 30.0;

/// Sustained keystrokes per second no human produces
pub const MAX_HUMAN_KEYSTROKES_PER_SEC: f64 = 15.0;

/// Field dwell variation below this looks scripted
pub const UNIFORM_DWELL_CV: f64 = 0.15;
/// Uniformity needs at least this many focused fields to mean anything
pub const MIN_FIELDS_FOR_UNIFORMITY: f64 = 3.0;

// ============================================================================
// CONTEXT ADJUSTMENTS
// ============================================================================

pub const FIRST_ORDER_BUMP: f64 = 0.03;
pub const ANONYMOUS_BUMP: f64 = 0.02;
pub const RETURNING_CUSTOMER_ORDERS: f64 = 5.0;
pub const RETURNING_CUSTOMER_RELIEF: f64 = 0.05;

/// Additive risk per payment method
pub fn payment_risk(method: PaymentMethod) -> f64 {
    match method {
        PaymentMethod::CashOnDelivery => 0.0,
        PaymentMethod::Paytm => 0.02,
        PaymentMethod::CreditCard | PaymentMethod::Paypal => 0.05,
    }
}

// ============================================================================
// CONFIGURABLE WEIGHTS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifierWeights {
    pub typing_speed: f64,
    pub dwell: f64,
    pub keystrokes: f64,
    pub uniformity: f64,
    pub threshold: f64,
}

impl Default for ClassifierWeights {
    fn default() -> Self {
        Self {
            typing_speed: TYPING_SPEED_WEIGHT,
            dwell: DWELL_WEIGHT,
            keystrokes: KEYSTROKE_WEIGHT,
            uniformity: UNIFORMITY_WEIGHT,
            threshold: DECISION_THRESHOLD,
        }
    }
}

impl ClassifierWeights {
    /// Behavioral weights sum to 1.0 so the behavioral part alone stays in [0, 1]
    pub fn behavioral_total(&self) -> f64 {
        self.typing_speed + self.dwell + self.keystrokes + self.uniformity
    }
}
