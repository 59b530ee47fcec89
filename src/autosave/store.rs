//! Snapshot persistence over two storage backends.

use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::Value;

use super::cipher::SnapshotCipher;
use super::snapshot::PersistedSnapshot;
use super::storage::{FileStorage, MemoryStorage, SnapshotStorage};
use super::{AutoSaveError, FormState, Result, STORAGE_KEY};
use crate::config::{AutoSaveConfig, StorageKind};

/// Saves, restores and clears the current draft.
pub struct AutoSaveStore {
    local: Arc<dyn SnapshotStorage>,
    session: Arc<dyn SnapshotStorage>,
    active: StorageKind,
    cipher: Option<SnapshotCipher>,
}

impl AutoSaveStore {
    pub fn new(
        local: Arc<dyn SnapshotStorage>,
        session: Arc<dyn SnapshotStorage>,
        active: StorageKind,
    ) -> Self {
        Self {
            local,
            session,
            active,
            cipher: None,
        }
    }

    pub fn from_config(config: &AutoSaveConfig) -> Result<Self> {
        let store = Self::new(
            Arc::new(FileStorage::new(PathBuf::from(&config.storage_dir))),
            Arc::new(MemoryStorage::new()),
            config.storage,
        );
        if !config.encrypt {
            return Ok(store);
        }
        match config.passphrase.as_deref() {
            Some(passphrase) if !passphrase.is_empty() => {
                Ok(store.with_cipher(SnapshotCipher::from_passphrase(passphrase)))
            }
            _ => Err(AutoSaveError::Crypto(
                "encryption enabled without a passphrase".into(),
            )),
        }
    }

    pub fn with_cipher(mut self, cipher: SnapshotCipher) -> Self {
        self.cipher = Some(cipher);
        self
    }

    /// Enable or disable encryption for future saves.
    pub fn set_cipher(&mut self, cipher: Option<SnapshotCipher>) {
        self.cipher = cipher;
    }

    pub fn is_encrypted(&self) -> bool {
        self.cipher.is_some()
    }

    pub fn storage_kind(&self) -> StorageKind {
        self.active
    }

    /// Fail unless the active backend keeps drafts after this process exits.
    pub fn ensure_durable(&self) -> Result<()> {
        match self.backend(self.active).kind() {
            StorageKind::Local => Ok(()),
            kind => Err(AutoSaveError::NotDurable(kind)),
        }
    }

    fn backend(&self, kind: StorageKind) -> &Arc<dyn SnapshotStorage> {
        match kind {
            StorageKind::Local => &self.local,
            StorageKind::Session => &self.session,
        }
    }

    /// Overwrite the stored draft with `form`. Returns the snapshot timestamp.
    pub fn save(&self, form: &FormState) -> Result<DateTime<Utc>> {
        let (data, encrypted) = match &self.cipher {
            Some(cipher) => {
                let plaintext = serde_json::to_vec(form)?;
                (Value::String(cipher.encrypt(&plaintext)?), true)
            }
            None => (Value::Object(form.clone()), false),
        };

        let snapshot = PersistedSnapshot {
            data,
            timestamp: Utc::now(),
            encrypted,
            storage_type: self.active,
        };
        self.backend(self.active)
            .write(STORAGE_KEY, &serde_json::to_string(&snapshot)?)?;

        tracing::debug!(
            storage = ?self.active,
            encrypted,
            fields = form.len(),
            "Draft saved"
        );
        Ok(snapshot.timestamp)
    }

    /// Load the stored draft from the active backend, if any.
    pub fn restore(&self) -> Result<Option<FormState>> {
        let Some(raw) = self.backend(self.active).read(STORAGE_KEY)? else {
            return Ok(None);
        };
        let snapshot: PersistedSnapshot = serde_json::from_str(&raw)?;

        let value = if snapshot.encrypted {
            let Value::String(sealed) = &snapshot.data else {
                return Err(AutoSaveError::Format("encrypted data is not a string".into()));
            };
            let cipher = self.cipher.as_ref().ok_or_else(|| {
                AutoSaveError::Crypto("snapshot is encrypted but no key is set".into())
            })?;
            serde_json::from_slice(&cipher.decrypt(sealed)?)?
        } else {
            snapshot.data
        };

        match value {
            Value::Object(form) => Ok(Some(form)),
            _ => Err(AutoSaveError::Format("snapshot data is not an object".into())),
        }
    }

    /// Remove the draft from both backends.
    pub fn clear(&self) -> Result<()> {
        self.local.remove(STORAGE_KEY)?;
        self.session.remove(STORAGE_KEY)?;
        tracing::debug!("Draft cleared");
        Ok(())
    }

    /// Make `kind` the active backend, moving any stored draft across.
    pub fn switch_storage(&mut self, kind: StorageKind) -> Result<()> {
        if kind == self.active {
            return Ok(());
        }
        let from = self.backend(self.active).clone();
        let to = self.backend(kind).clone();

        if let Some(raw) = from.read(STORAGE_KEY)? {
            let mut snapshot: PersistedSnapshot = serde_json::from_str(&raw)?;
            snapshot.storage_type = kind;
            to.write(STORAGE_KEY, &serde_json::to_string(&snapshot)?)?;
            from.remove(STORAGE_KEY)?;
        }

        tracing::info!(from = ?self.active, to = ?kind, "Draft storage switched");
        self.active = kind;
        Ok(())
    }
}
