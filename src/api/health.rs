//! `GET /api/health`

use axum::{extract::State, Json};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::http::server::AppState;

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
    pub message: String,
    pub version: String,
}

pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let now = DateTime::<Utc>::from_timestamp_millis(state.clock.now_millis() as i64)
        .unwrap_or_default();
    Json(HealthResponse {
        status: "ok".to_string(),
        timestamp: now.to_rfc3339_opts(SecondsFormat::Millis, true),
        message: "DFD API is running".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}
