//! API endpoint handlers.
//!
//! # Request Pipeline
//! ```text
//! received
//!     → method checked          (405, router fallback)
//!     → rate limit checked      (429)
//!     → CSRF checked            (403, state-changing only)
//!     → body validated          (400)
//!     → sanitized
//!     → handled                 (200 | 500)
//! ```
//! Padding to a constant latency is applied around the whole pipeline by
//! `http::middleware::latency` on the state-changing routes.

pub mod contact;
pub mod csrf;
pub mod health;
pub mod improve_text;
pub mod rate_limit;

use axum::http::HeaderMap;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::http::request::csrf_token;
use crate::http::response::ApiError;
use crate::http::server::AppState;

/// Count the request against `identifier`'s window.
pub(crate) fn admit(state: &AppState, identifier: &str) -> Result<(), ApiError> {
    if !state.config.rate_limit.enabled || state.rate_limiter.is_allowed(identifier) {
        Ok(())
    } else {
        tracing::warn!(client = %identifier, "Rate limit exceeded");
        Err(ApiError::RateLimited)
    }
}

/// Validate the CSRF header. When `required` is false an absent header passes,
/// but a present one must still be valid.
pub(crate) fn verify_csrf(state: &AppState, headers: &HeaderMap, required: bool) -> Result<(), ApiError> {
    match csrf_token(headers) {
        Some(token) if state.csrf.validate_token(token) => Ok(()),
        Some(_) => Err(ApiError::InvalidCsrf),
        None if required => Err(ApiError::InvalidCsrf),
        None => Ok(()),
    }
}

pub(crate) fn parse_json<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, ApiError> {
    serde_json::from_slice(bytes).map_err(|e| ApiError::Validation(format!("malformed body: {}", e)))
}

/// A required, non-blank string field of at most `max_chars` characters.
///
/// Returns the trimmed value.
pub(crate) fn required_text<'a>(
    value: &'a Value,
    field: &str,
    max_chars: usize,
) -> Result<&'a str, ApiError> {
    let text = match value {
        Value::String(s) => s.trim(),
        Value::Null => return Err(ApiError::Validation(format!("{} is missing", field))),
        _ => return Err(ApiError::Validation(format!("{} is not a string", field))),
    };
    if text.is_empty() {
        return Err(ApiError::Validation(format!("{} is empty", field)));
    }
    if text.chars().count() > max_chars {
        return Err(ApiError::Validation(format!("{} exceeds {} characters", field, max_chars)));
    }
    Ok(text)
}

/// An optional string field; absent, null or blank values are `None`.
pub(crate) fn optional_text<'a>(
    value: &'a Value,
    field: &str,
    max_chars: usize,
) -> Result<Option<&'a str>, ApiError> {
    match value {
        Value::Null => Ok(None),
        Value::String(s) if s.trim().is_empty() => Ok(None),
        value => required_text(value, field, max_chars).map(Some),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_required_text() {
        assert_eq!(required_text(&json!("  ok "), "name", 5).unwrap(), "ok");
        assert!(required_text(&json!(null), "name", 5).is_err());
        assert!(required_text(&json!(7), "name", 5).is_err());
        assert!(required_text(&json!("   "), "name", 5).is_err());
        assert!(required_text(&json!("abcdef"), "name", 5).is_err());
        // Limits count characters, not bytes.
        assert!(required_text(&json!("ããããã"), "name", 5).is_ok());
    }

    #[test]
    fn test_optional_text() {
        assert_eq!(optional_text(&json!(null), "context", 5).unwrap(), None);
        assert_eq!(optional_text(&json!(""), "context", 5).unwrap(), None);
        assert_eq!(optional_text(&json!("  "), "context", 5).unwrap(), None);
        assert_eq!(optional_text(&json!(" ok "), "context", 5).unwrap(), Some("ok"));
        assert!(optional_text(&json!(3), "context", 5).is_err());
        assert!(optional_text(&json!("abcdef"), "context", 5).is_err());
    }
}
