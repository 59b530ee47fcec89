//! Constant-latency response padding.
//!
//! Padded routes hold every response, success or rejection, until a fixed
//! target plus random jitter has elapsed since the request arrived, so the
//! branch taken cannot be read from response timing.

use std::time::Duration;

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use tokio::time::Instant;

use crate::config::LatencyConfig;

/// Target latency and jitter bound for padded routes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LatencyPadding {
    pub target: Duration,
    pub jitter: Duration,
}

impl LatencyPadding {
    pub fn from_config(config: &LatencyConfig) -> Self {
        Self {
            target: Duration::from_millis(config.target_ms),
            jitter: Duration::from_millis(config.jitter_ms),
        }
    }

    /// When a request that arrived at `start` may be answered.
    pub fn deadline(&self, start: Instant) -> Instant {
        let jitter_ms = self.jitter.as_millis() as u64;
        let jitter = if jitter_ms > 0 {
            Duration::from_millis(fastrand::u64(0..jitter_ms))
        } else {
            Duration::ZERO
        };
        start + self.target + jitter
    }
}

pub async fn constant_latency(
    State(padding): State<LatencyPadding>,
    request: Request,
    next: Next,
) -> Response {
    let start = Instant::now();
    let response = next.run(request).await;

    let deadline = padding.deadline(start);
    let now = Instant::now();
    if now < deadline {
        tokio::time::sleep_until(deadline).await;
    } else {
        tracing::debug!(
            overrun_ms = (now - deadline).as_millis() as u64,
            "Handler exceeded latency target"
        );
    }
    response
}
