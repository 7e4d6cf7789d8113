//! Remote detector client
//!
//! POSTs one order to `{base_url}/check` and maps the answer to a detector
//! verdict. No retries: a timeout or error is terminal for that call.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{AnomalyDetector, DetectorError, DetectorKind};
use crate::logic::features::RiskFeatures;
use crate::models::{OrderContext, Verdict};

pub struct RemoteDetector {
    check_url: String,
    timeout: Duration,
    http_client: reqwest::Client,
}

// Request/Response types

#[derive(Debug, Serialize)]
pub struct CheckRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<&'a str>,
    pub payment_type: &'static str,
    pub prior_order_count: u32,
    pub feature_version: u8,
    pub features: BTreeMap<&'static str, f64>,
}

#[derive(Debug, Deserialize)]
pub struct CheckResponse {
    pub is_anomaly: bool,
    pub confidence: Option<f64>,
    pub score: Option<f64>,
}

impl RemoteDetector {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, DetectorError> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DetectorError::Transport(e.to_string()))?;

        Ok(Self {
            check_url: format!("{}/check", base_url.trim_end_matches('/')),
            timeout,
            http_client,
        })
    }

    pub fn check_url(&self) -> &str {
        &self.check_url
    }

    fn map_send_error(&self, err: reqwest::Error) -> DetectorError {
        if err.is_timeout() {
            DetectorError::Timeout(self.timeout)
        } else {
            DetectorError::Transport(err.to_string())
        }
    }
}

#[async_trait]
impl AnomalyDetector for RemoteDetector {
    fn kind(&self) -> DetectorKind {
        DetectorKind::Remote
    }

    async fn check(&self, order: &OrderContext, features: &RiskFeatures) -> Result<Verdict, DetectorError> {
        let request = CheckRequest {
            user_id: order.user_id.as_deref(),
            payment_type: order.payment_method.as_str(),
            prior_order_count: order.prior_order_count,
            feature_version: features.version,
            features: features.named().into_iter().collect(),
        };

        let response = self.http_client
            .post(&self.check_url)
            .json(&request)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        if !response.status().is_success() {
            return Err(DetectorError::Status(response.status().as_u16()));
        }

        let body: CheckResponse = response.json().await.map_err(|e| {
            if e.is_timeout() {
                DetectorError::Timeout(self.timeout)
            } else {
                DetectorError::Malformed(e.to_string())
            }
        })?;

        let mut verdict = Verdict::detector(DetectorKind::Remote.as_str(), body.is_anomaly);
        if let Some(confidence) = body.confidence {
            if !(0.0..=1.0).contains(&confidence) {
                return Err(DetectorError::Malformed(format!(
                    "confidence {} outside [0, 1]",
                    confidence
                )));
            }
            verdict = verdict.with_confidence(confidence);
        }
        if let Some(score) = body.score {
            if !score.is_finite() {
                return Err(DetectorError::Malformed("score is not finite".to_string()));
            }
            verdict.score = Some(score);
        }

        Ok(verdict)
    }
}
