//! `GET /api/rate-limit`
//!
//! A probe rather than a gated endpoint: the call counts against the caller's
//! window, and an exhausted window is reported with `success: false` instead
//! of a 429 so the client can always read its remaining budget.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::http::request::ClientIdentifier;
use crate::http::server::AppState;

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RateLimitStatus {
    pub success: bool,
    pub remaining_requests: u32,
    pub max_requests: u32,
    pub window_ms: u64,
}

pub async fn rate_limit_status(
    State(state): State<AppState>,
    ClientIdentifier(client): ClientIdentifier,
) -> Json<RateLimitStatus> {
    let limiter = &state.rate_limiter;
    let success = !state.config.rate_limit.enabled || limiter.is_allowed(&client);
    if !success {
        tracing::debug!(client = %client, "Rate limit probe on exhausted window");
    }

    Json(RateLimitStatus {
        success,
        remaining_requests: limiter.remaining_requests(&client),
        max_requests: limiter.max_requests(),
        window_ms: limiter.window_ms(),
    })
}
