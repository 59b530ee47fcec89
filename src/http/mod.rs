//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, outer layers: trace, request ID, timeout, panics)
//!     → middleware/ (metrics, constant-latency padding on state-changing routes)
//!     → request.rs (client identifier, CSRF header, bounded body)
//!     → api handlers
//!     → response.rs (generic error bodies)
//!     → security headers on the way out
//! ```

pub mod middleware;
pub mod request;
pub mod response;
pub mod server;

pub use request::{ClientIdentifier, CSRF_HEADER};
pub use response::{ApiError, ErrorBody};
pub use server::{build_router, AppState, HttpServer};
