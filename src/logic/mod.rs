//! Decision pipeline
//!
//! ## Structure
//! - `accuracy`: live degradation settings store
//! - `features`: RiskFeatures layout and builder
//! - `classifier`: local risk classifier
//! - `detector`: secondary anomaly detector variants
//! - `combiner`: verdict precedence and fail-safe policy
//! - `evaluation`: labeled-sample accuracy report
//! - `gateway`: per-order orchestration

pub mod accuracy;
pub mod features;
pub mod classifier;
pub mod detector;
pub mod combiner;
pub mod evaluation;
pub mod gateway;

pub use accuracy::AccuracyStore;
pub use classifier::{ClassifierError, RiskClassifier};
pub use combiner::{combine, FailSafePolicy};
pub use detector::{AnomalyDetector, DetectorConfig, DetectorError, DetectorKind};
pub use features::RiskFeatures;
pub use gateway::{GatewayError, GatewayOptions, GatewayStats, VerificationGateway};
