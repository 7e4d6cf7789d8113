//! Risk Features - classifier input vector
//!
//! Built deterministically from a telemetry payload and its order context.
//! Request-local: one vector per verification, never shared or persisted.
//!
//! ## Layout rules
//! 1. Add feature -> increment FEATURE_VERSION
//! 2. Change order -> increment FEATURE_VERSION
//! 3. Remove feature -> increment FEATURE_VERSION

use crc32fast::Hasher;
use serde::{Deserialize, Serialize};

use crate::models::{OrderContext, TelemetryPayload};

// ============================================================================
// LAYOUT
// ============================================================================

pub const FEATURE_VERSION: u8 = 1;

pub const FEATURE_LAYOUT: &[&str] = &[
    "typing_speed_cpm",     // 0
    "time_on_page_secs",    // 1
    "keystrokes_reported",  // 2: 1.0 when the collector sent a count
    "keystroke_count",      // 3: 0.0 when not reported
    "keystrokes_per_sec",   // 4
    "focus_field_count",    // 5
    "focus_total_secs",     // 6
    "focus_dwell_cv",       // 7: coefficient of variation across fields, 0.0 below 2 fields
    "payment_code",         // 8
    "prior_order_count",    // 9
    "is_anonymous",         // 10
];

pub const FEATURE_COUNT: usize = 11;

/// Named index into the vector
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(usize)]
pub enum Feature {
    TypingSpeed = 0,
    TimeOnPage = 1,
    KeystrokesReported = 2,
    KeystrokeCount = 3,
    KeystrokesPerSec = 4,
    FocusFieldCount = 5,
    FocusTotalSecs = 6,
    FocusDwellCv = 7,
    PaymentCode = 8,
    PriorOrderCount = 9,
    IsAnonymous = 10,
}

impl Feature {
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        FEATURE_LAYOUT[self.index()]
    }
}

/// CRC32 over version + ordered names
pub fn layout_hash() -> u32 {
    let mut hasher = Hasher::new();
    hasher.update(&[FEATURE_VERSION]);
    for name in FEATURE_LAYOUT {
        hasher.update(name.as_bytes());
        hasher.update(&[0]);
    }
    hasher.finalize()
}

// ============================================================================
// RISK FEATURES
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskFeatures {
    pub version: u8,
    pub layout_hash: u32,
    values: [f64; FEATURE_COUNT],
}

impl RiskFeatures {
    /// Derive the vector. Inputs are expected to have passed validation.
    pub fn build(telemetry: &TelemetryPayload, order: &OrderContext) -> Self {
        let mut values = [0.0f64; FEATURE_COUNT];

        values[Feature::TypingSpeed.index()] = telemetry.typing_speed;
        values[Feature::TimeOnPage.index()] = telemetry.time_on_page;

        if let Some(count) = telemetry.keystroke_count {
            values[Feature::KeystrokesReported.index()] = 1.0;
            values[Feature::KeystrokeCount.index()] = count as f64;
            if telemetry.time_on_page > 0.0 {
                values[Feature::KeystrokesPerSec.index()] = count as f64 / telemetry.time_on_page;
            }
        }

        // Map iteration order varies; float sums must not
        let mut dwell: Vec<f64> = telemetry.field_focus_durations.values().copied().collect();
        dwell.sort_by(f64::total_cmp);
        values[Feature::FocusFieldCount.index()] = dwell.len() as f64;
        values[Feature::FocusTotalSecs.index()] = dwell.iter().sum::<f64>() / 1000.0;
        values[Feature::FocusDwellCv.index()] = coefficient_of_variation(&dwell);

        values[Feature::PaymentCode.index()] = order.payment_method.code() as f64;
        values[Feature::PriorOrderCount.index()] = order.prior_order_count as f64;
        values[Feature::IsAnonymous.index()] = if order.is_anonymous() { 1.0 } else { 0.0 };

        Self::from_values(values)
    }

    pub fn from_values(values: [f64; FEATURE_COUNT]) -> Self {
        Self {
            version: FEATURE_VERSION,
            layout_hash: layout_hash(),
            values,
        }
    }

    pub fn get(&self, feature: Feature) -> f64 {
        self.values[feature.index()]
    }

    /// `(name, value)` pairs in layout order
    pub fn named(&self) -> Vec<(&'static str, f64)> {
        FEATURE_LAYOUT.iter().copied().zip(self.values.iter().copied()).collect()
    }

    pub fn is_compatible(&self) -> bool {
        self.version == FEATURE_VERSION && self.layout_hash == layout_hash()
    }

    /// First non-finite feature, if any
    pub fn first_non_finite(&self) -> Option<(&'static str, f64)> {
        self.named().into_iter().find(|(_, v)| !v.is_finite())
    }
}

/// Population standard deviation over mean. 0.0 below two samples or zero mean.
fn coefficient_of_variation(samples: &[f64]) -> f64 {
    if samples.len() < 2 {
        return 0.0;
    }
    let n = samples.len() as f64;
    let mean = samples.iter().sum::<f64>() / n;
    if mean <= 0.0 {
        return 0.0;
    }
    let variance = samples.iter().map(|s| (s - mean).powi(2)).sum::<f64>() / n;
    variance.sqrt() / mean
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PaymentMethod;

    #[test]
    fn test_layout_count_matches() {
        assert_eq!(FEATURE_LAYOUT.len(), FEATURE_COUNT);
        assert_eq!(Feature::IsAnonymous.index(), FEATURE_COUNT - 1);
        assert_eq!(Feature::FocusDwellCv.name(), "focus_dwell_cv");
    }

    #[test]
    fn test_layout_hash_is_stable() {
        assert_eq!(layout_hash(), layout_hash());
        assert!(RiskFeatures::from_values([0.0; FEATURE_COUNT]).is_compatible());
    }

    #[test]
    fn test_build_from_payload() {
        let telemetry = TelemetryPayload::new(240.0, 60.0)
            .with_keystrokes(120)
            .with_focus("name", 2000.0)
            .with_focus("address", 4000.0);
        let order = OrderContext::new(PaymentMethod::Paypal).with_prior_orders(4);

        let f = RiskFeatures::build(&telemetry, &order);
        assert_eq!(f.get(Feature::TypingSpeed), 240.0);
        assert_eq!(f.get(Feature::KeystrokesReported), 1.0);
        assert_eq!(f.get(Feature::KeystrokesPerSec), 2.0);
        assert_eq!(f.get(Feature::FocusFieldCount), 2.0);
        assert_eq!(f.get(Feature::FocusTotalSecs), 6.0);
        assert!((f.get(Feature::FocusDwellCv) - 1.0 / 3.0).abs() < 1e-9);
        assert_eq!(f.get(Feature::PaymentCode), 3.0);
        assert_eq!(f.get(Feature::PriorOrderCount), 4.0);
        assert_eq!(f.get(Feature::IsAnonymous), 1.0);
    }

    #[test]
    fn test_build_is_deterministic() {
        let telemetry = TelemetryPayload::new(90.0, 30.0)
            .with_focus("a", 100.0)
            .with_focus("b", 300.0)
            .with_focus("c", 200.0);
        let order = OrderContext::new(PaymentMethod::Paytm).with_user("u1");

        assert_eq!(RiskFeatures::build(&telemetry, &order), RiskFeatures::build(&telemetry, &order));
    }

    #[test]
    fn test_build_ignores_focus_insertion_order() {
        let dwell = [1200.1, 3400.2, 560.3, 7800.4, 90.5, 2300.6, 4100.7, 650.8];
        let order = OrderContext::new(PaymentMethod::Paypal);

        let forward = dwell
            .iter()
            .enumerate()
            .fold(TelemetryPayload::new(200.0, 60.0), |t, (i, ms)| t.with_focus(&format!("f{}", i), *ms));
        let expected = RiskFeatures::build(&forward, &order);

        for _ in 0..50 {
            let reversed = dwell
                .iter()
                .enumerate()
                .rev()
                .fold(TelemetryPayload::new(200.0, 60.0), |t, (i, ms)| t.with_focus(&format!("f{}", i), *ms));
            let f = RiskFeatures::build(&reversed, &order);
            assert_eq!(
                f.get(Feature::FocusTotalSecs).to_bits(),
                expected.get(Feature::FocusTotalSecs).to_bits()
            );
            assert_eq!(
                f.get(Feature::FocusDwellCv).to_bits(),
                expected.get(Feature::FocusDwellCv).to_bits()
            );
        }
    }

    #[test]
    fn test_missing_keystrokes_are_not_zero_keystrokes() {
        let order = OrderContext::new(PaymentMethod::CreditCard);
        let silent = RiskFeatures::build(&TelemetryPayload::new(0.0, 40.0), &order);
        let zero = RiskFeatures::build(&TelemetryPayload::new(0.0, 40.0).with_keystrokes(0), &order);

        assert_eq!(silent.get(Feature::KeystrokesReported), 0.0);
        assert_eq!(zero.get(Feature::KeystrokesReported), 1.0);
        assert_eq!(zero.get(Feature::KeystrokeCount), 0.0);
    }

    #[test]
    fn test_non_finite_detection() {
        let mut values = [1.0; FEATURE_COUNT];
        values[Feature::TimeOnPage.index()] = f64::NAN;
        let f = RiskFeatures::from_values(values);
        assert_eq!(f.first_non_finite().map(|(name, _)| name), Some("time_on_page_secs"));
    }
}
