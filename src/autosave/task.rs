//! Debounced and periodic saving on a background task.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use super::store::AutoSaveStore;
use super::{AutoSaveError, FormState, Result};
use crate::config::AutoSaveConfig;

/// Observable state of the auto-saver.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SaveStatus {
    /// Changes received but not yet persisted.
    pub dirty: bool,
    pub last_saved: Option<DateTime<Utc>>,
    pub saves: u64,
    pub last_error: Option<String>,
}

enum Command {
    Update(FormState),
    Flush(oneshot::Sender<Result<()>>),
    Clear(oneshot::Sender<Result<()>>),
}

/// Owner of the auto-save task.
///
/// Dropping the handle without [`shutdown`](Self::shutdown) also stops the
/// task, since its command channel closes.
pub struct AutoSaveHandle {
    commands: mpsc::UnboundedSender<Command>,
    status: watch::Receiver<SaveStatus>,
    stop: Option<oneshot::Sender<()>>,
    task: JoinHandle<()>,
    store: Arc<Mutex<AutoSaveStore>>,
}

impl AutoSaveHandle {
    /// Start saving `debounce` after the last update, and every `interval`
    /// while changes are pending.
    pub fn spawn(store: AutoSaveStore, debounce: Duration, interval: Duration) -> Self {
        let store = Arc::new(Mutex::new(store));
        let (commands, rx) = mpsc::unbounded_channel();
        let (status_tx, status) = watch::channel(SaveStatus::default());
        let (stop, stop_rx) = oneshot::channel();

        let worker = Worker {
            store: store.clone(),
            status: status_tx,
            latest: None,
        };
        let task = tokio::spawn(worker.run(rx, stop_rx, debounce, interval));

        Self {
            commands,
            status,
            stop: Some(stop),
            task,
            store,
        }
    }

    pub fn from_config(store: AutoSaveStore, config: &AutoSaveConfig) -> Self {
        Self::spawn(
            store,
            Duration::from_millis(config.debounce_ms),
            Duration::from_secs(config.interval_secs),
        )
    }

    /// Record the latest form state. Saving happens later.
    pub fn update(&self, form: FormState) -> Result<()> {
        self.commands
            .send(Command::Update(form))
            .map_err(|_| AutoSaveError::Stopped)
    }

    /// Save pending changes now.
    pub async fn flush(&self) -> Result<()> {
        let (tx, rx) = oneshot::channel();
        self.commands
            .send(Command::Flush(tx))
            .map_err(|_| AutoSaveError::Stopped)?;
        rx.await.map_err(|_| AutoSaveError::Stopped)?
    }

    /// Drop pending changes and remove the stored draft.
    pub async fn clear(&self) -> Result<()> {
        let (tx, rx) = oneshot::channel();
        self.commands
            .send(Command::Clear(tx))
            .map_err(|_| AutoSaveError::Stopped)?;
        rx.await.map_err(|_| AutoSaveError::Stopped)?
    }

    pub fn status(&self) -> SaveStatus {
        self.status.borrow().clone()
    }

    /// Wait for the next status change.
    pub async fn changed(&mut self) -> Result<SaveStatus> {
        self.status.changed().await.map_err(|_| AutoSaveError::Stopped)?;
        Ok(self.status())
    }

    /// Shared access to the underlying store (restore, switch backend, ...).
    pub fn store(&self) -> Arc<Mutex<AutoSaveStore>> {
        self.store.clone()
    }

    /// Stop the timers. Pending changes are discarded, not saved.
    pub async fn shutdown(mut self) {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
        if let Err(e) = (&mut self.task).await {
            tracing::warn!(error = %e, "Auto-save task ended abnormally");
        }
    }
}

struct Worker {
    store: Arc<Mutex<AutoSaveStore>>,
    status: watch::Sender<SaveStatus>,
    latest: Option<FormState>,
}

impl Worker {
    async fn run(
        mut self,
        mut commands: mpsc::UnboundedReceiver<Command>,
        mut stop: oneshot::Receiver<()>,
        debounce: Duration,
        interval: Duration,
    ) {
        let mut ticker = tokio::time::interval_at(Instant::now() + interval, interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut debounce_at: Option<Instant> = None;

        loop {
            tokio::select! {
                biased;

                _ = &mut stop => break,

                command = commands.recv() => match command {
                    Some(Command::Update(form)) => {
                        self.latest = Some(form);
                        debounce_at = Some(Instant::now() + debounce);
                        self.status.send_modify(|s| s.dirty = true);
                    }
                    Some(Command::Flush(reply)) => {
                        debounce_at = None;
                        let _ = reply.send(self.save_pending().await);
                    }
                    Some(Command::Clear(reply)) => {
                        debounce_at = None;
                        self.latest = None;
                        let _ = reply.send(self.clear().await);
                    }
                    None => break,
                },

                _ = tokio::time::sleep_until(debounce_at.unwrap_or_else(Instant::now)),
                    if debounce_at.is_some() =>
                {
                    debounce_at = None;
                    let _ = self.save_pending().await;
                }

                _ = ticker.tick() => {
                    if self.latest.is_some() {
                        debounce_at = None;
                        let _ = self.save_pending().await;
                    }
                }
            }
        }

        if self.latest.is_some() {
            tracing::debug!("Auto-save stopped with unsaved changes");
        }
    }

    async fn save_pending(&mut self) -> Result<()> {
        let Some(form) = self.latest.clone() else {
            return Ok(());
        };

        let store = self.store.clone();
        let result = blocking(move || {
            store
                .lock()
                .expect("auto-save store mutex poisoned")
                .save(&form)
        })
        .await;

        match result {
            Ok(saved_at) => {
                self.latest = None;
                self.status.send_modify(|s| {
                    s.dirty = false;
                    s.last_saved = Some(saved_at);
                    s.saves += 1;
                    s.last_error = None;
                });
                Ok(())
            }
            Err(e) => {
                tracing::warn!(error = %e, "Auto-save failed");
                let message = e.to_string();
                self.status.send_modify(|s| s.last_error = Some(message));
                Err(e)
            }
        }
    }

    async fn clear(&mut self) -> Result<()> {
        let store = self.store.clone();
        blocking(move || store.lock().expect("auto-save store mutex poisoned").clear()).await?;
        self.status.send_modify(|s| {
            s.dirty = false;
            s.last_error = None;
        });
        Ok(())
    }
}

/// Run storage I/O off the runtime threads; file writes end in `sync_all`.
async fn blocking<T, F>(f: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| AutoSaveError::Storage(std::io::Error::other(e)))?
}
