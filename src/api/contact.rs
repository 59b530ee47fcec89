//! `POST /api/contact`

use axum::{body::Body, extract::State, http::HeaderMap, Json};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{admit, parse_json, required_text, verify_csrf};
use crate::http::request::{read_body, ClientIdentifier};
use crate::http::response::ApiError;
use crate::http::server::AppState;
use crate::security::{sanitize, validate_email};

pub const MAX_NAME_CHARS: usize = 100;
pub const MAX_EMAIL_CHARS: usize = 254;
pub const MAX_MESSAGE_CHARS: usize = 2000;

/// Raw body; fields stay untyped so wrong types become validation failures.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ContactRequest {
    name: Value,
    email: Value,
    message: Value,
}

/// A contact message after validation and sanitization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactSubmission {
    pub name: String,
    pub email: String,
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ContactResponse {
    pub success: bool,
    pub message: String,
}

pub async fn submit_contact(
    State(state): State<AppState>,
    ClientIdentifier(client): ClientIdentifier,
    headers: HeaderMap,
    body: Body,
) -> Result<Json<ContactResponse>, ApiError> {
    admit(&state, &client)?;
    verify_csrf(&state, &headers, state.config.csrf.require_for_contact)?;

    let bytes = read_body(body, state.config.security.max_body_size).await?;
    let request: ContactRequest = parse_json(&bytes)?;
    let submission = validate(&request)?;

    let id = uuid::Uuid::new_v4();
    tracing::info!(
        submission_id = %id,
        client = %client,
        name_chars = submission.name.chars().count(),
        message_chars = submission.message.chars().count(),
        "Contact message received"
    );

    Ok(Json(ContactResponse {
        success: true,
        message: "Message sent successfully".to_string(),
    }))
}

fn validate(request: &ContactRequest) -> Result<ContactSubmission, ApiError> {
    let name = required_text(&request.name, "name", MAX_NAME_CHARS)?;
    let email = required_text(&request.email, "email", MAX_EMAIL_CHARS)?;
    let message = required_text(&request.message, "message", MAX_MESSAGE_CHARS)?;

    if !validate_email(email) {
        return Err(ApiError::Validation("email is malformed".into()));
    }

    Ok(ContactSubmission {
        name: sanitize(name),
        email: email.to_lowercase(),
        message: sanitize(message),
    })
}
