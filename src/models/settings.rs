//! Accuracy degradation settings

use serde::{Deserialize, Serialize};
use validator::Validate;

use super::validation::{ensure_finite, ValidationError};

pub const TARGET_ACCURACY_MIN: f64 = 0.70;
pub const TARGET_ACCURACY_MAX: f64 = 0.95;
pub const NOISE_FACTOR_MAX: f64 = 0.30;
pub const BIAS_FACTOR_MAX: f64 = 0.20;

const FIELD_ORDER: &[&str] = &["enabled", "target_accuracy", "noise_factor", "bias_factor"];

/// Live-tunable degradation applied by the local classifier.
///
/// Bounds are enforced on every write; an out-of-range candidate is rejected
/// as a whole, never clamped.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Validate)]
pub struct AccuracySettings {
    pub enabled: bool,
    #[validate(range(min = 0.70, max = 0.95, message = "must be within [0.70, 0.95]"))]
    pub target_accuracy: f64,
    #[validate(range(min = 0.0, max = 0.30, message = "must be within [0.00, 0.30]"))]
    pub noise_factor: f64,
    #[validate(range(min = 0.0, max = 0.20, message = "must be within [0.00, 0.20]"))]
    pub bias_factor: f64,
}

impl Default for AccuracySettings {
    fn default() -> Self {
        Self {
            enabled: false,
            target_accuracy: TARGET_ACCURACY_MAX,
            noise_factor: 0.0,
            bias_factor: 0.0,
        }
    }
}

impl AccuracySettings {
    /// Check every bound, naming the first offending field.
    pub fn check(&self) -> Result<(), ValidationError> {
        ensure_finite("target_accuracy", self.target_accuracy)?;
        ensure_finite("noise_factor", self.noise_factor)?;
        ensure_finite("bias_factor", self.bias_factor)?;

        self.validate()
            .map_err(|report| ValidationError::from_report(&report, FIELD_ORDER))
    }

    /// Target accuracy as a display percentage, e.g. `"75.0%"`
    pub fn target_percentage(&self) -> String {
        format!("{:.1}%", self.target_accuracy * 100.0)
    }
}

/// Wire shape of an `accuracy-control` write.
///
/// Every field is mandatory; partial updates are refused. Bound violations are
/// reported ahead of missing fields so the caller learns about the value they
/// did send first.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct AccuracySettingsUpdate {
    pub enabled: Option<bool>,
    #[validate(range(min = 0.70, max = 0.95, message = "must be within [0.70, 0.95]"))]
    pub target_accuracy: Option<f64>,
    #[validate(range(min = 0.0, max = 0.30, message = "must be within [0.00, 0.30]"))]
    pub noise_factor: Option<f64>,
    #[validate(range(min = 0.0, max = 0.20, message = "must be within [0.00, 0.20]"))]
    pub bias_factor: Option<f64>,
}

impl AccuracySettingsUpdate {
    pub fn into_candidate(self) -> Result<AccuracySettings, ValidationError> {
        self.validate()
            .map_err(|report| ValidationError::from_report(&report, FIELD_ORDER))?;

        let enabled = self.enabled.ok_or_else(|| ValidationError::required("enabled"))?;
        let target_accuracy = self
            .target_accuracy
            .ok_or_else(|| ValidationError::required("target_accuracy"))?;
        let noise_factor = self
            .noise_factor
            .ok_or_else(|| ValidationError::required("noise_factor"))?;
        let bias_factor = self
            .bias_factor
            .ok_or_else(|| ValidationError::required("bias_factor"))?;

        Ok(AccuracySettings {
            enabled,
            target_accuracy,
            noise_factor,
            bias_factor,
        })
    }
}

impl From<AccuracySettings> for AccuracySettingsUpdate {
    fn from(settings: AccuracySettings) -> Self {
        Self {
            enabled: Some(settings.enabled),
            target_accuracy: Some(settings.target_accuracy),
            noise_factor: Some(settings.noise_factor),
            bias_factor: Some(settings.bias_factor),
        }
    }
}
