//! Draft auto-save.
//!
//! # Data Flow
//! ```text
//! form edits
//!     → task.rs (debounce quiet period, periodic save while dirty)
//!     → store.rs (snapshot, optional encryption)
//!     → storage.rs (local file backend | in-memory session backend)
//!
//! export.rs: standalone JSON export/import of a draft
//! ```
//!
//! # Design Decisions
//! - The form is an opaque JSON object; nothing here knows its fields
//! - Encryption is AES-256-GCM, so tampered snapshots fail to restore
//! - Timers belong to one task with an explicit shutdown; nothing saves after it

pub mod cipher;
pub mod export;
pub mod snapshot;
pub mod storage;
pub mod store;
pub mod task;

use serde_json::{Map, Value};
use thiserror::Error;

use crate::config::StorageKind;

pub use cipher::SnapshotCipher;
pub use export::{ExportDocument, ExportInfo, EXPORT_VERSION};
pub use snapshot::PersistedSnapshot;
pub use storage::{FileStorage, MemoryStorage, SnapshotStorage};
pub use store::AutoSaveStore;
pub use task::{AutoSaveHandle, SaveStatus};

/// Field name → value mapping owned by the drafting UI.
pub type FormState = Map<String, Value>;

/// Key the current draft is stored under.
pub const STORAGE_KEY: &str = "dfd-form-autosave";

#[derive(Debug, Error)]
pub enum AutoSaveError {
    #[error("storage error: {0}")]
    Storage(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("encryption error: {0}")]
    Crypto(String),

    #[error("invalid format: {0}")]
    Format(String),

    #[error("{0:?} storage does not outlive this process")]
    NotDurable(StorageKind),

    #[error("auto-save task is not running")]
    Stopped,
}

pub type Result<T> = std::result::Result<T, AutoSaveError>;
