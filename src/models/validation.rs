//! Validation error shared by payload and settings checks

use serde::Serialize;
use thiserror::Error;

/// Input rejected before any scoring or store mutation.
///
/// Always names exactly one field: the first offending field in
/// declaration order of the validated struct.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Error)]
#[error("invalid `{field}`: {message}")]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn required(field: impl Into<String>) -> Self {
        Self::new(field, "is required")
    }

    /// Collapse a `validator` report into a single error.
    ///
    /// `order` lists the struct's fields in declaration order so the chosen
    /// field does not depend on hash map iteration.
    pub fn from_report(report: &validator::ValidationErrors, order: &[&str]) -> Self {
        let field_errors = report.field_errors();

        let field = order
            .iter()
            .copied()
            .find(|name| field_errors.contains_key(*name))
            .map(str::to_string)
            .or_else(|| field_errors.keys().next().map(|k| k.to_string()))
            .unwrap_or_else(|| "payload".to_string());

        let message = field_errors
            .get(field.as_str())
            .and_then(|errors| errors.first())
            .map(describe)
            .unwrap_or_else(|| "invalid value".to_string());

        Self { field, message }
    }

    /// Prefix the field with a location, e.g. `samples[3].typing_speed`.
    pub fn within(self, location: &str) -> Self {
        Self {
            field: format!("{}.{}", location, self.field),
            message: self.message,
        }
    }
}

fn describe(error: &validator::ValidationError) -> String {
    if let Some(message) = &error.message {
        return message.to_string();
    }

    match error.code.as_ref() {
        "required" => "is required".to_string(),
        "range" => match (error.params.get("min"), error.params.get("max")) {
            (Some(min), Some(max)) => format!("must be within [{}, {}]", min, max),
            (Some(min), None) => format!("must be >= {}", min),
            (None, Some(max)) => format!("must be <= {}", max),
            (None, None) => "out of range".to_string(),
        },
        "length" => "has an invalid length".to_string(),
        code => format!("failed `{}` check", code),
    }
}

/// Reject NaN and infinities, which pass `validator`'s range comparisons.
pub fn ensure_finite(field: &str, value: f64) -> Result<(), ValidationError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ValidationError::new(field, "must be a finite number"))
    }
}
