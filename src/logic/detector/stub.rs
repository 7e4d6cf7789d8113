//! Stub detector - offline default, never flags

use std::time::Duration;

use async_trait::async_trait;

use super::{AnomalyDetector, DetectorError, DetectorKind};
use crate::logic::features::RiskFeatures;
use crate::models::{OrderContext, Verdict};

#[derive(Debug, Clone, Default)]
pub struct StubDetector {
    delay: Duration,
}

impl StubDetector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stub that answers only after `delay`, for timeout drills
    pub fn with_delay(delay: Duration) -> Self {
        Self { delay }
    }
}

#[async_trait]
impl AnomalyDetector for StubDetector {
    fn kind(&self) -> DetectorKind {
        DetectorKind::Stub
    }

    async fn check(&self, _order: &OrderContext, _features: &RiskFeatures) -> Result<Verdict, DetectorError> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        Ok(Verdict::detector(DetectorKind::Stub.as_str(), false))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{PaymentMethod, TelemetryPayload};
    use std::time::Instant;

    fn inputs() -> (OrderContext, RiskFeatures) {
        let order = OrderContext::new(PaymentMethod::CreditCard);
        let features = RiskFeatures::build(&TelemetryPayload::new(900.0, 1.0), &order);
        (order, features)
    }

    #[test]
    fn test_stub_never_flags() {
        let (order, features) = inputs();
        let verdict = tokio_test::block_on(StubDetector::new().check(&order, &features)).unwrap();
        assert!(!verdict.flagged);
        assert_eq!(verdict.label, "detector:stub");
    }

    #[tokio::test]
    async fn test_stub_delay_is_honoured() {
        let (order, features) = inputs();
        let started = Instant::now();
        StubDetector::with_delay(Duration::from_millis(30))
            .check(&order, &features)
            .await
            .unwrap();
        assert!(started.elapsed() >= Duration::from_millis(30));
    }
}
