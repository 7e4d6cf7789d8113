//! Configuration module

use std::env;
use std::fmt::Display;
use std::str::FromStr;
use std::time::Duration;

use crate::logic::{DetectorConfig, FailSafePolicy, GatewayOptions};
use crate::models::AccuracySettings;

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Server port
    pub port: u16,

    /// Environment (development, production)
    pub environment: String,

    /// Secondary detector selection and limits
    pub detector: DetectorConfig,

    /// Outcome when the detector gives no opinion
    pub fail_safe: FailSafePolicy,

    /// Bearer key for accuracy-control writes
    pub control_api_key: Option<String>,

    /// Fixed degradation seed
    pub degradation_seed: Option<u64>,

    /// Settings the accuracy store starts with
    pub initial_accuracy: AccuracySettings,
}

impl Default for Config {
    fn default() -> Self {
        Self::from_source(|_| None)
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self::from_source(|key| env::var(key).ok())
    }

    /// Load configuration from any key lookup
    pub fn from_source<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = DetectorConfig::default();
        let initial = AccuracySettings::default();

        let detector = DetectorConfig {
            kind: parse_or(&lookup, "DETECTOR_MODE", defaults.kind),
            url: lookup("DETECTOR_URL").unwrap_or(defaults.url),
            timeout: Duration::from_millis(parse_or(&lookup, "DETECTOR_TIMEOUT_MS", 250)),
            stub_delay: Duration::from_millis(parse_or(&lookup, "DETECTOR_STUB_DELAY_MS", 0)),
        };

        Self {
            port: parse_or(&lookup, "PORT", 5000),

            environment: lookup("ENVIRONMENT").unwrap_or_else(|| "development".to_string()),

            detector,

            fail_safe: parse_or(&lookup, "FAIL_SAFE_POLICY", FailSafePolicy::default()),

            control_api_key: lookup("CONTROL_API_KEY").filter(|k| !k.trim().is_empty()),

            degradation_seed: lookup("DEGRADATION_SEED").and_then(|raw| match raw.trim().parse() {
                Ok(seed) => Some(seed),
                Err(_) => {
                    tracing::warn!("Ignoring DEGRADATION_SEED={:?}: not an unsigned integer", raw);
                    None
                }
            }),

            initial_accuracy: AccuracySettings {
                enabled: parse_or(&lookup, "ACCURACY_ENABLED", initial.enabled),
                target_accuracy: parse_or(&lookup, "TARGET_ACCURACY", initial.target_accuracy),
                noise_factor: parse_or(&lookup, "NOISE_FACTOR", initial.noise_factor),
                bias_factor: parse_or(&lookup, "BIAS_FACTOR", initial.bias_factor),
            },
        }
    }

    /// Check if running in production
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    pub fn gateway_options(&self) -> GatewayOptions {
        GatewayOptions {
            detector_timeout: self.detector.timeout,
            fail_safe: self.fail_safe,
            seed: self.degradation_seed,
        }
    }
}

/// Parse `key`, falling back to `default` (with a warning) when unparseable
fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: Display,
{
    match lookup(key) {
        None => default,
        Some(raw) => match raw.trim().parse() {
            Ok(value) => value,
            Err(err) => {
                tracing::warn!("Ignoring {}={:?}: {}", key, raw, err);
                default
            }
        },
    }
}
