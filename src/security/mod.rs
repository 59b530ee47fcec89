//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming API request:
//!     → rate_limit.rs (fixed window per client identifier)
//!     → csrf.rs (signed token check on state-changing calls)
//!     → email.rs / sanitize.rs (field validation and cleanup)
//!     → handler
//! Outgoing response:
//!     → headers.rs (fixed security headers)
//! ```
//!
//! # Design Decisions
//! - Services are built once at startup and shared through `Arc`
//! - Time is read through `clock::Clock` so windows and expiry are testable
//! - Fail closed: any parse error in a token is a rejection

pub mod clock;
pub mod csrf;
pub mod email;
pub mod headers;
pub mod rate_limit;
pub mod sanitize;
pub mod timing;

pub use clock::{Clock, ManualClock, SystemClock};
pub use csrf::{CsrfService, IssuedToken};
pub use email::validate_email;
pub use rate_limit::{RateLimitEntry, RateLimiter};
pub use sanitize::{sanitize, sanitize_value};
pub use timing::constant_time_eq;
