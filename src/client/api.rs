//! HTTP client for the DFD API.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use reqwest::RequestBuilder;
use serde::de::DeserializeOwned;
use serde::Serialize;

use super::error::ClientError;
use super::gate::SubmitGate;
use crate::api::contact::ContactResponse;
use crate::api::csrf::CsrfTokenResponse;
use crate::api::health::HealthResponse;
use crate::api::improve_text::ImproveResponse;
use crate::api::rate_limit::RateLimitStatus;
use crate::http::request::CSRF_HEADER;
use crate::security::{Clock, SystemClock};

/// Tokens this close to expiry are refreshed before use.
const TOKEN_REFRESH_MARGIN_MS: u64 = 60_000;

#[derive(Debug, Clone, Serialize)]
pub struct ContactForm {
    pub name: String,
    pub email: String,
    pub message: String,
}

#[derive(Debug, Serialize)]
struct ImproveRequest<'a> {
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    context: Option<&'a str>,
}

#[derive(Debug, Clone)]
struct CachedToken {
    token: String,
    expires: u64,
}

pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    token: Mutex<Option<CachedToken>>,
    remaining: Mutex<Option<u32>>,
    gate: SubmitGate,
    clock: Arc<dyn Clock>,
}

impl ApiClient {
    /// `timeout` bounds every request end to end.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: Mutex::new(None),
            remaining: Mutex::new(None),
            gate: SubmitGate::new(),
            clock: Arc::new(SystemClock),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub async fn health(&self) -> Result<HealthResponse, ClientError> {
        self.send(self.http.get(self.url("/api/health"))).await
    }

    /// Current CSRF token, fetching a new one when missing or close to expiry.
    pub async fn csrf_token(&self) -> Result<String, ClientError> {
        let now = self.clock.now_millis();
        if let Some(cached) = self.token.lock().expect("token mutex poisoned").as_ref() {
            if cached.expires > now + TOKEN_REFRESH_MARGIN_MS {
                return Ok(cached.token.clone());
            }
        }

        let issued: CsrfTokenResponse = self.send(self.http.get(self.url("/api/csrf-token"))).await?;
        *self.token.lock().expect("token mutex poisoned") = Some(CachedToken {
            token: issued.token.clone(),
            expires: issued.expires,
        });
        Ok(issued.token)
    }

    /// Ask the server how many requests are left. The probe itself counts as one.
    pub async fn rate_limit_status(&self) -> Result<RateLimitStatus, ClientError> {
        let status: RateLimitStatus = self.send(self.http.get(self.url("/api/rate-limit"))).await?;
        *self.remaining.lock().expect("remaining mutex poisoned") = Some(status.remaining_requests);
        Ok(status)
    }

    /// Last known remaining budget, if the server has been asked.
    pub fn remaining_requests(&self) -> Option<u32> {
        *self.remaining.lock().expect("remaining mutex poisoned")
    }

    /// Whether an unexpired CSRF token is cached.
    pub fn has_token(&self) -> bool {
        let now = self.clock.now_millis();
        self.token
            .lock()
            .expect("token mutex poisoned")
            .as_ref()
            .is_some_and(|cached| cached.expires > now)
    }

    /// Whether a submit action should be offered right now: a token is held,
    /// nothing is in flight and the budget is not known to be spent.
    pub fn can_submit(&self) -> bool {
        self.has_token() && !self.gate.is_busy() && self.remaining_requests() != Some(0)
    }

    pub async fn submit_contact(&self, form: &ContactForm) -> Result<ContactResponse, ClientError> {
        let _permit = self.gate.try_begin().ok_or(ClientError::Busy)?;
        let token = self.csrf_token().await?;
        let request = self
            .http
            .post(self.url("/api/contact"))
            .header(CSRF_HEADER, token)
            .json(form);
        self.send_guarded(request).await
    }

    pub async fn improve_text(&self, text: &str, context: Option<&str>) -> Result<String, ClientError> {
        let _permit = self.gate.try_begin().ok_or(ClientError::Busy)?;
        let token = self.csrf_token().await?;
        let request = self
            .http
            .post(self.url("/api/improve-text"))
            .header(CSRF_HEADER, token)
            .json(&ImproveRequest { text, context });
        let response: ImproveResponse = self.send_guarded(request).await?;
        Ok(response.improved_text)
    }

    /// Like `send`, but tracks budget exhaustion and drops a rejected token.
    async fn send_guarded<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ClientError> {
        let result = self.send(request).await;
        match &result {
            Err(ClientError::Forbidden) => {
                *self.token.lock().expect("token mutex poisoned") = None;
            }
            Err(ClientError::RateLimited) => {
                *self.remaining.lock().expect("remaining mutex poisoned") = Some(0);
            }
            _ => {}
        }
        result
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ClientError> {
        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            tracing::debug!(status = %status, "API request failed");
            return Err(ClientError::from_status(status));
        }
        Ok(response.json().await?)
    }
}
