//! Persisted snapshot envelope.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::StorageKind;

/// What is written under the storage key.
///
/// `data` is the form object, or a base64 ciphertext string when `encrypted`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedSnapshot {
    pub data: Value,
    pub timestamp: DateTime<Utc>,
    pub encrypted: bool,
    pub storage_type: StorageKind,
}
