//! Secondary Anomaly Detector
//!
//! Independent cross-check on an order. The gateway only ever sees
//! `dyn AnomalyDetector`; which variant runs is a configuration choice.
//!
//! ## Variants
//! - `stub`: never flags, optional simulated latency
//! - `remote`: external scoring service over HTTP
//! - `rules`: deterministic heuristics over order context and features

pub mod stub;
pub mod remote;
pub mod rules;

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::logic::features::RiskFeatures;
use crate::models::{OrderContext, Verdict};

pub use remote::RemoteDetector;
pub use rules::{RuleBasedDetector, RuleThresholds};
pub use stub::StubDetector;

// ============================================================================
// CAPABILITY
// ============================================================================

#[async_trait]
pub trait AnomalyDetector: Send + Sync {
    fn kind(&self) -> DetectorKind;

    /// Return a detector verdict. `flagged` means anomalous.
    async fn check(&self, order: &OrderContext, features: &RiskFeatures) -> Result<Verdict, DetectorError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectorKind {
    Stub,
    Remote,
    #[serde(rename = "rules")]
    RuleBased,
}

impl DetectorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DetectorKind::Stub => "stub",
            DetectorKind::Remote => "remote",
            DetectorKind::RuleBased => "rules",
        }
    }
}

impl std::fmt::Display for DetectorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for DetectorKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "stub" => Ok(DetectorKind::Stub),
            "remote" => Ok(DetectorKind::Remote),
            "rules" | "rule_based" => Ok(DetectorKind::RuleBased),
            other => Err(format!("unknown detector mode `{}`", other)),
        }
    }
}

// ============================================================================
// ERRORS
// ============================================================================

/// Detector failure. Never fatal to a verification.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DetectorError {
    #[error("detector timed out after {0:?}")]
    Timeout(Duration),
    #[error("detector transport error: {0}")]
    Transport(String),
    #[error("detector returned status {0}")]
    Status(u16),
    #[error("malformed detector response: {0}")]
    Malformed(String),
}

impl DetectorError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, DetectorError::Timeout(_))
    }
}

// ============================================================================
// FACTORY
// ============================================================================

#[derive(Debug, Clone)]
pub struct DetectorConfig {
    pub kind: DetectorKind,
    /// Base URL of the remote scoring service
    pub url: String,
    /// Upper bound on one check, enforced by the gateway and by the HTTP client
    pub timeout: Duration,
    /// Artificial latency for the stub
    pub stub_delay: Duration,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            kind: DetectorKind::Stub,
            url: "http://localhost:5001".to_string(),
            timeout: Duration::from_millis(250),
            stub_delay: Duration::ZERO,
        }
    }
}

pub fn build(config: &DetectorConfig) -> Result<Arc<dyn AnomalyDetector>, DetectorError> {
    let detector: Arc<dyn AnomalyDetector> = match config.kind {
        DetectorKind::Stub => Arc::new(StubDetector::with_delay(config.stub_delay)),
        DetectorKind::Remote => Arc::new(RemoteDetector::new(&config.url, config.timeout)?),
        DetectorKind::RuleBased => Arc::new(RuleBasedDetector::default()),
    };
    tracing::info!("Anomaly detector: {}", detector.kind());
    Ok(detector)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_parsing() {
        assert_eq!("stub".parse::<DetectorKind>().unwrap(), DetectorKind::Stub);
        assert_eq!(" Remote ".parse::<DetectorKind>().unwrap(), DetectorKind::Remote);
        assert_eq!("rules".parse::<DetectorKind>().unwrap(), DetectorKind::RuleBased);
        assert!("model".parse::<DetectorKind>().is_err());
    }

    #[test]
    fn test_kind_serializes_as_mode_name() {
        assert_eq!(serde_json::to_string(&DetectorKind::RuleBased).unwrap(), "\"rules\"");
        assert_eq!(DetectorKind::Stub.to_string(), "stub");
    }

    #[test]
    fn test_build_each_variant() {
        for kind in [DetectorKind::Stub, DetectorKind::Remote, DetectorKind::RuleBased] {
            let config = DetectorConfig { kind, ..Default::default() };
            assert_eq!(build(&config).unwrap().kind(), kind);
        }
    }

    #[test]
    fn test_only_timeout_is_timeout() {
        assert!(DetectorError::Timeout(Duration::from_millis(5)).is_timeout());
        assert!(!DetectorError::Status(503).is_timeout());
    }
}
