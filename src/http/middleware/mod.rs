//! Route-level middleware.

pub mod latency;
pub mod observe;

pub use latency::{constant_latency, LatencyPadding};
pub use observe::record_metrics;
