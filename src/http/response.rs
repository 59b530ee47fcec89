//! Error responses.
//!
//! # Design Decisions
//! - Every rejection maps to one status code and one fixed public message
//! - The underlying reason is logged and counted, never returned
//! - 400, 403 and 500 share the same body so callers cannot tell them apart

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::observability::metrics;

/// Public body used for 400, 403 and 500.
pub const GENERIC_FAILURE: &str = "Request failed";

/// Why a request did not succeed.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("method not allowed")]
    MethodNotAllowed,

    #[error("no such route")]
    NotFound,

    #[error("rate limit exceeded")]
    RateLimited,

    #[error("missing or invalid CSRF token")]
    InvalidCsrf,

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("internal error: {0}")]
    Internal(String),
}

/// JSON error body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            ApiError::InvalidCsrf => StatusCode::FORBIDDEN,
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn public_message(&self) -> &'static str {
        match self {
            ApiError::MethodNotAllowed => "Method not allowed",
            ApiError::NotFound => "Not found",
            ApiError::RateLimited => "Too many requests, please try again later",
            ApiError::InvalidCsrf | ApiError::Validation(_) | ApiError::Internal(_) => {
                GENERIC_FAILURE
            }
        }
    }

    fn reason(&self) -> &'static str {
        match self {
            ApiError::MethodNotAllowed => "method",
            ApiError::NotFound => "not_found",
            ApiError::RateLimited => "rate_limit",
            ApiError::InvalidCsrf => "csrf",
            ApiError::Validation(_) => "validation",
            ApiError::Internal(_) => "internal",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match &self {
            ApiError::Internal(_) => tracing::error!(error = %self, "Request failed"),
            _ => tracing::warn!(error = %self, "Request rejected"),
        }
        metrics::record_rejection(self.reason());

        let body = ErrorBody {
            error: self.public_message().to_string(),
        };
        (self.status(), Json(body)).into_response()
    }
}

/// Fallback for known paths hit with the wrong method.
pub async fn method_not_allowed() -> ApiError {
    ApiError::MethodNotAllowed
}

/// Fallback for unknown paths.
pub async fn not_found() -> ApiError {
    ApiError::NotFound
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_internal_details_not_leaked() {
        let response = ApiError::Validation("email too long".into()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let bytes = axum::body::to_bytes(response.into_body(), 1024).await.unwrap();
        let body: ErrorBody = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body.error, GENERIC_FAILURE);
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(ApiError::MethodNotAllowed.status(), 405);
        assert_eq!(ApiError::RateLimited.status(), 429);
        assert_eq!(ApiError::InvalidCsrf.status(), 403);
        assert_eq!(ApiError::Internal("boom".into()).status(), 500);
        assert_eq!(
            ApiError::InvalidCsrf.public_message(),
            ApiError::Internal("x".into()).public_message()
        );
    }
}
