//! DFD API library.
//!
//! Server and client pieces behind the DFD drafting application: contact
//! submission, CSRF token issuance, text improvement, rate limiting and
//! draft auto-save.

pub mod api;
pub mod autosave;
pub mod client;
pub mod config;
pub mod http;
pub mod improve;
pub mod lifecycle;
pub mod observability;
pub mod security;

pub use config::ApiConfig;
pub use http::{AppState, HttpServer};
pub use lifecycle::Shutdown;
