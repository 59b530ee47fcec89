//! Client side of the API.
//!
//! Mirrors the server's rate-limit and CSRF state so a UI (or the CLI) can
//! decide whether a submit action should be offered at all.
//!
//! # Design Decisions
//! - Every request carries an explicit timeout; a stuck call fails instead of blocking
//! - Non-2xx responses collapse into a handful of canned messages
//! - No automatic retries; the user re-submits

pub mod api;
pub mod error;
pub mod gate;

pub use api::{ApiClient, ContactForm};
pub use error::ClientError;
pub use gate::{SubmitGate, SubmitPermit};
