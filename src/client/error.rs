//! Client-side error normalization.

use reqwest::StatusCode;
use thiserror::Error;

/// What went wrong, phrased for the person using the form.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Too many attempts. Please wait a moment before trying again.")]
    RateLimited,

    #[error("Security validation failed. Reload the page and try again.")]
    Forbidden,

    #[error("Invalid data. Check the fields and try again.")]
    InvalidInput,

    #[error("Server error. Please try again later.")]
    Server,

    #[error("The request timed out. Please try again.")]
    Timeout,

    #[error("Could not reach the server. Check your connection.")]
    Network(#[source] reqwest::Error),

    #[error("Unexpected response from the server.")]
    Unexpected(String),

    #[error("A submission is already in progress.")]
    Busy,
}

impl ClientError {
    /// Collapse a non-success status into one of the canned errors.
    pub fn from_status(status: StatusCode) -> Self {
        match status {
            StatusCode::TOO_MANY_REQUESTS => ClientError::RateLimited,
            StatusCode::FORBIDDEN => ClientError::Forbidden,
            s if s.is_server_error() => ClientError::Server,
            s if s.is_client_error() => ClientError::InvalidInput,
            s => ClientError::Unexpected(format!("status {}", s)),
        }
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ClientError::Timeout
        } else if e.is_decode() {
            ClientError::Unexpected(e.to_string())
        } else if let Some(status) = e.status() {
            ClientError::from_status(status)
        } else {
            ClientError::Network(e)
        }
    }
}
