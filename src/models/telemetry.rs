//! Order telemetry and order context

use std::collections::HashMap;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use validator::Validate;

use super::validation::{ensure_finite, ValidationError};

pub const TYPING_SPEED_MAX_CPM: f64 = 2000.0;
pub const TIME_ON_PAGE_MAX_SECS: f64 = 86_400.0;
pub const KEYSTROKE_COUNT_MAX: u32 = 1_000_000;
pub const FOCUS_FIELDS_MAX: usize = 64;
pub const FOCUS_FIELD_NAME_MAX: usize = 64;
/// A single field cannot stay focused longer than the page was open
pub const FOCUS_DURATION_MAX_MS: f64 = TIME_ON_PAGE_MAX_SECS * 1000.0;
pub const USER_ID_MAX_LEN: usize = 128;

const TELEMETRY_FIELD_ORDER: &[&str] = &[
    "typing_speed",
    "time_on_page",
    "keystroke_count",
    "field_focus_durations",
];

// ============================================================================
// PAYMENT METHOD
// ============================================================================

/// Payment methods accepted by the storefront checkout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PaymentMethod {
    #[serde(rename = "cash on delivery")]
    CashOnDelivery,
    #[serde(rename = "credit card")]
    CreditCard,
    #[serde(rename = "paytm")]
    Paytm,
    #[serde(rename = "paypal")]
    Paypal,
}

impl PaymentMethod {
    pub const ALL: [PaymentMethod; 4] = [
        PaymentMethod::CashOnDelivery,
        PaymentMethod::CreditCard,
        PaymentMethod::Paytm,
        PaymentMethod::Paypal,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::CashOnDelivery => "cash on delivery",
            PaymentMethod::CreditCard => "credit card",
            PaymentMethod::Paytm => "paytm",
            PaymentMethod::Paypal => "paypal",
        }
    }

    /// Stable numeric code used in the feature vector
    pub fn code(&self) -> u8 {
        match self {
            PaymentMethod::CashOnDelivery => 0,
            PaymentMethod::CreditCard => 1,
            PaymentMethod::Paytm => 2,
            PaymentMethod::Paypal => 3,
        }
    }

    pub fn from_code(code: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|m| m.code() == code)
    }

    /// Card-not-present methods that carry chargeback exposure
    pub fn is_card_like(&self) -> bool {
        matches!(self, PaymentMethod::CreditCard | PaymentMethod::Paypal)
    }

    pub fn supported() -> Vec<&'static str> {
        Self::ALL.iter().map(|m| m.as_str()).collect()
    }
}

impl std::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for PaymentMethod {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|m| m.as_str() == wanted)
            .ok_or_else(|| {
                ValidationError::new(
                    "payment_type",
                    format!(
                        "unknown payment type `{}`; supported: {}",
                        s,
                        Self::supported().join(", ")
                    ),
                )
            })
    }
}

// ============================================================================
// TELEMETRY PAYLOAD
// ============================================================================

/// Behavioral telemetry captured by the checkout form collector
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
pub struct TelemetryPayload {
    /// Characters per minute
    #[validate(range(min = 0.0, max = 2000.0, message = "must be within [0, 2000] characters/minute"))]
    pub typing_speed: f64,
    /// Seconds spent on the checkout page
    #[validate(range(min = 0.0, max = 86400.0, message = "must be within [0, 86400] seconds"))]
    pub time_on_page: f64,
    #[validate(range(max = 1000000, message = "must be <= 1000000"))]
    pub keystroke_count: Option<u32>,
    /// Field name -> milliseconds focused
    #[validate(length(max = 64, message = "at most 64 fields may be reported"))]
    #[serde(default)]
    pub field_focus_durations: HashMap<String, f64>,
}

impl TelemetryPayload {
    pub fn new(typing_speed: f64, time_on_page: f64) -> Self {
        Self {
            typing_speed,
            time_on_page,
            ..Default::default()
        }
    }

    pub fn with_keystrokes(mut self, count: u32) -> Self {
        self.keystroke_count = Some(count);
        self
    }

    pub fn with_focus(mut self, field: &str, millis: f64) -> Self {
        self.field_focus_durations.insert(field.to_string(), millis);
        self
    }

    /// Full payload check: finiteness, declared ranges, per-field dwell values.
    pub fn check(&self) -> Result<(), ValidationError> {
        ensure_finite("typing_speed", self.typing_speed)?;
        ensure_finite("time_on_page", self.time_on_page)?;

        self.validate()
            .map_err(|report| ValidationError::from_report(&report, TELEMETRY_FIELD_ORDER))?;

        // Sorted so a payload with several bad entries always names the same one
        let mut names: Vec<&String> = self.field_focus_durations.keys().collect();
        names.sort();
        for name in names {
            let millis = self.field_focus_durations[name];
            if name.is_empty() || name.chars().count() > FOCUS_FIELD_NAME_MAX {
                return Err(ValidationError::new(
                    "field_focus_durations",
                    format!("field names must be 1-{} characters", FOCUS_FIELD_NAME_MAX),
                ));
            }
            if !millis.is_finite() || !(0.0..=FOCUS_DURATION_MAX_MS).contains(&millis) {
                return Err(ValidationError::new(
                    "field_focus_durations",
                    format!("duration for `{}` must be within [0, {}] milliseconds", name, FOCUS_DURATION_MAX_MS),
                ));
            }
        }

        Ok(())
    }
}

// ============================================================================
// ORDER CONTEXT
// ============================================================================

/// Order metadata supplied alongside telemetry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct OrderContext {
    /// Absent for anonymous sessions
    #[validate(length(min = 1, max = 128, message = "must be 1-128 characters"))]
    pub user_id: Option<String>,
    pub payment_method: PaymentMethod,
    /// Looked up by the caller from its order history
    #[serde(default)]
    pub prior_order_count: u32,
}

impl OrderContext {
    pub fn new(payment_method: PaymentMethod) -> Self {
        Self {
            user_id: None,
            payment_method,
            prior_order_count: 0,
        }
    }

    pub fn with_user(mut self, user_id: &str) -> Self {
        self.user_id = Some(user_id.to_string());
        self
    }

    pub fn with_prior_orders(mut self, count: u32) -> Self {
        self.prior_order_count = count;
        self
    }

    pub fn is_anonymous(&self) -> bool {
        self.user_id.is_none()
    }

    pub fn check(&self) -> Result<(), ValidationError> {
        self.validate()
            .map_err(|report| ValidationError::from_report(&report, &["user_id"]))
    }
}

// ============================================================================
// WIRE REQUEST
// ============================================================================

/// Body of `POST /api/v1/verify`.
///
/// Required fields are optional here so a missing one is reported as a
/// validation error naming it, not as an opaque decode failure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VerifyRequest {
    pub typing_speed: Option<f64>,
    pub time_on_page: Option<f64>,
    pub payment_type: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub keystroke_count: Option<u32>,
    #[serde(default)]
    pub field_focus_durations: HashMap<String, f64>,
    #[serde(default)]
    pub prior_order_count: u32,
}

impl VerifyRequest {
    /// Split into validated domain inputs.
    pub fn into_parts(self) -> Result<(TelemetryPayload, OrderContext), ValidationError> {
        let typing_speed = self
            .typing_speed
            .ok_or_else(|| ValidationError::required("typing_speed"))?;
        let time_on_page = self
            .time_on_page
            .ok_or_else(|| ValidationError::required("time_on_page"))?;
        let payment_type = self
            .payment_type
            .ok_or_else(|| ValidationError::required("payment_type"))?;

        let telemetry = TelemetryPayload {
            typing_speed,
            time_on_page,
            keystroke_count: self.keystroke_count,
            field_focus_durations: self.field_focus_durations,
        };
        telemetry.check()?;

        let order = OrderContext {
            user_id: self.user_id.filter(|id| !id.trim().is_empty()),
            payment_method: payment_type.parse()?,
            prior_order_count: self.prior_order_count,
        };
        order.check()?;

        Ok((telemetry, order))
    }
}
