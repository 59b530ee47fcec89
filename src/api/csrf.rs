//! `GET /api/csrf-token` and `GET /api/csrf`

use axum::{
    extract::State,
    http::{header, HeaderValue},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::http::response::ApiError;
use crate::http::server::AppState;

#[derive(Debug, Serialize, Deserialize)]
pub struct CsrfTokenResponse {
    pub token: String,
    /// Expiry in unix milliseconds.
    pub expires: u64,
}

/// Issue a token in the body and mirror it into an HTTP-only cookie.
pub async fn issue_token(State(state): State<AppState>) -> Result<Response, ApiError> {
    let issued = state.csrf.generate_token();
    let cookie = format!(
        "{}={}; HttpOnly; Secure; SameSite=Strict; Path=/; Max-Age={}",
        state.config.csrf.cookie_name, issued.token, state.config.csrf.ttl_secs
    );
    let cookie = HeaderValue::from_str(&cookie)
        .map_err(|e| ApiError::Internal(format!("unencodable cookie: {}", e)))?;

    tracing::debug!(expires = issued.expires_at, "CSRF token issued");

    let mut response = Json(CsrfTokenResponse {
        token: issued.token,
        expires: issued.expires_at,
    })
    .into_response();
    let headers = response.headers_mut();
    headers.insert(header::SET_COOKIE, cookie);
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
    Ok(response)
}
