//! `POST /api/improve-text`

use axum::{body::Body, extract::State, http::HeaderMap, Json};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{admit, optional_text, parse_json, required_text, verify_csrf};
use crate::http::request::{read_body, ClientIdentifier};
use crate::http::response::ApiError;
use crate::http::server::AppState;
use crate::improve::ImproveError;
use crate::security::sanitize;

pub const MAX_TEXT_CHARS: usize = 5000;
pub const MAX_CONTEXT_CHARS: usize = 500;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ImproveRequest {
    text: Value,
    context: Value,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImproveResponse {
    pub success: bool,
    pub improved_text: String,
}

pub async fn improve_text(
    State(state): State<AppState>,
    ClientIdentifier(client): ClientIdentifier,
    headers: HeaderMap,
    body: Body,
) -> Result<Json<ImproveResponse>, ApiError> {
    admit(&state, &client)?;
    verify_csrf(&state, &headers, true)?;

    let bytes = read_body(body, state.config.security.max_body_size).await?;
    let request: ImproveRequest = parse_json(&bytes)?;

    let text = sanitize(required_text(&request.text, "text", MAX_TEXT_CHARS)?);
    let context = optional_text(&request.context, "context", MAX_CONTEXT_CHARS)?.map(sanitize);

    let improved = state
        .improver
        .improve(&text, context.as_deref())
        .await
        .map_err(|e| match e {
            ImproveError::Empty => ApiError::Validation("text is empty after sanitizing".into()),
            other => ApiError::Internal(other.to_string()),
        })?;

    Ok(Json(ImproveResponse {
        success: true,
        improved_text: improved,
    }))
}
