//! Adherence Log Sync.
//!
//! Every adherence write, whether from the in-app marking flow or from a notification
//! action callback, is sent as a message to one actor task that owns the write path.
//! The actor applies field-scoped merges one at a time and broadcasts the resulting
//! day log, which is what [`AdherenceSubscription`] streams to readers.

use std::sync::{Arc, Mutex};

use chrono::NaiveDate;
use rusqlite::Connection;
use tokio::sync::{broadcast, mpsc, oneshot};

use crate::identity::SessionProvider;
use crate::notify::ActionEvent;
use crate::schedule::adherence::AdherenceLog;
use crate::schedule::types::{DoseSlot, LoggedStatus};
use crate::store::adherence::{self as log_store, WriteSource};

const COMMAND_BUFFER: usize = 64;
const CHANGE_BUFFER: usize = 128;

#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("no signed-in user")]
    NoSession,
    #[error("adherence sync task has stopped")]
    Closed,
    #[error("adherence store error: {0}")]
    Database(String),
}

/// A committed change to one user's log for one day, carrying the full day after the merge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdherenceChange {
    pub user_id: String,
    pub date: NaiveDate,
    pub log: AdherenceLog,
}

enum Command {
    Merge {
        user_id: String,
        date: NaiveDate,
        entries: AdherenceLog,
        source: WriteSource,
        reply: oneshot::Sender<Result<AdherenceLog, SyncError>>,
    },
    Read {
        user_id: String,
        date: NaiveDate,
        reply: oneshot::Sender<Result<AdherenceLog, SyncError>>,
    },
}

/// Handle to the adherence actor. Cheap to clone; the actor stops once every handle is dropped.
#[derive(Clone)]
pub struct AdherenceSync {
    commands: mpsc::Sender<Command>,
    changes: broadcast::Sender<AdherenceChange>,
}

impl AdherenceSync {
    /// Spawn the actor on the current tokio runtime.
    pub fn spawn(db: Arc<Mutex<Connection>>) -> Self {
        let (commands, rx) = mpsc::channel(COMMAND_BUFFER);
        let (changes, _) = broadcast::channel(CHANGE_BUFFER);
        tokio::spawn(run(db, rx, changes.clone()));
        Self { commands, changes }
    }

    /// Merge `entries` into the day log. Returns the full day log after the write.
    pub async fn merge(
        &self,
        user_id: &str,
        date: NaiveDate,
        entries: AdherenceLog,
        source: WriteSource,
    ) -> Result<AdherenceLog, SyncError> {
        let (reply, rx) = oneshot::channel();
        self.commands
            .send(Command::Merge {
                user_id: user_id.to_string(),
                date,
                entries,
                source,
                reply,
            })
            .await
            .map_err(|_| SyncError::Closed)?;
        rx.await.map_err(|_| SyncError::Closed)?
    }

    /// Read the day log. Ordered after every write sent before it.
    pub async fn read(&self, user_id: &str, date: NaiveDate) -> Result<AdherenceLog, SyncError> {
        request_read(&self.commands, user_id, date).await
    }

    /// Set a single slot.
    pub async fn mark_slot(
        &self,
        user_id: &str,
        date: NaiveDate,
        slot: DoseSlot,
        status: LoggedStatus,
        source: WriteSource,
    ) -> Result<AdherenceLog, SyncError> {
        let entries = AdherenceLog::from([(slot, status)]);
        self.merge(user_id, date, entries, source).await
    }

    /// Live stream of the log for `user_id` on `date`, starting with the current snapshot.
    pub async fn subscribe(&self, user_id: &str, date: NaiveDate) -> Result<AdherenceSubscription, SyncError> {
        // Subscribe before reading so no change between the two is missed.
        let changes = self.changes.subscribe();
        let snapshot = self.read(user_id, date).await?;
        Ok(AdherenceSubscription {
            user_id: user_id.to_string(),
            date,
            commands: self.commands.downgrade(),
            changes,
            pending: Some(snapshot),
        })
    }
}

/// Push-based view of one user-day. See [`AdherenceSync::subscribe`].
pub struct AdherenceSubscription {
    user_id: String,
    date: NaiveDate,
    commands: mpsc::WeakSender<Command>,
    changes: broadcast::Receiver<AdherenceChange>,
    pending: Option<AdherenceLog>,
}

impl AdherenceSubscription {
    pub fn date(&self) -> NaiveDate {
        self.date
    }

    /// Next emission, or `None` once the actor has stopped.
    pub async fn next(&mut self) -> Option<AdherenceLog> {
        if let Some(snapshot) = self.pending.take() {
            return Some(snapshot);
        }
        loop {
            match self.changes.recv().await {
                Ok(change) if change.user_id == self.user_id && change.date == self.date => {
                    return Some(change.log);
                }
                Ok(_) => continue,
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::debug!(user = %self.user_id, skipped, "subscription lagged, re-reading day");
                    let commands = self.commands.upgrade()?;
                    return request_read(&commands, &self.user_id, self.date).await.ok();
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}

/// Handle a notification action delivered by the OS.
///
/// Best effort: with no signed-in user, an unrecognised action, or a payload without
/// a prescription id or a readable slot label, nothing is written. Write failures are
/// logged and otherwise dropped since there is no UI to report them to.
pub async fn on_action_performed(
    sync: &AdherenceSync,
    session: &dyn SessionProvider,
    event: &ActionEvent,
    today: NaiveDate,
) -> Option<AdherenceLog> {
    let Some(user_id) = session.current_user() else {
        tracing::debug!(action = %event.action_id, "no session for notification action, skipped");
        return None;
    };
    let status = event.status()?;
    if event.extra.prescription_id.is_empty() {
        tracing::debug!(action = %event.action_id, "notification action without prescription id, skipped");
        return None;
    }
    let Some(slot) = DoseSlot::from_label(&event.extra.slot_label) else {
        tracing::debug!(label = %event.extra.slot_label, "unrecognised slot label, skipped");
        return None;
    };

    match sync
        .mark_slot(&user_id, today, slot, status, WriteSource::Notification)
        .await
    {
        Ok(log) => {
            tracing::info!(
                user = %user_id,
                prescription = %event.extra.prescription_id,
                slot = %slot,
                status = status.as_str(),
                "dose logged from notification"
            );
            Some(log)
        }
        Err(e) => {
            tracing::warn!(user = %user_id, slot = %slot, error = %e, "notification adherence write failed");
            None
        }
    }
}

async fn request_read(
    commands: &mpsc::Sender<Command>,
    user_id: &str,
    date: NaiveDate,
) -> Result<AdherenceLog, SyncError> {
    let (reply, rx) = oneshot::channel();
    commands
        .send(Command::Read {
            user_id: user_id.to_string(),
            date,
            reply,
        })
        .await
        .map_err(|_| SyncError::Closed)?;
    rx.await.map_err(|_| SyncError::Closed)?
}

async fn run(
    db: Arc<Mutex<Connection>>,
    mut commands: mpsc::Receiver<Command>,
    changes: broadcast::Sender<AdherenceChange>,
) {
    tracing::debug!("adherence sync started");
    while let Some(command) = commands.recv().await {
        match command {
            Command::Merge {
                user_id,
                date,
                entries,
                source,
                reply,
            } => {
                let result = blocking_merge(&db, &user_id, date, entries, source).await;
                if let Ok(log) = &result {
                    // No receivers is fine.
                    let _ = changes.send(AdherenceChange {
                        user_id,
                        date,
                        log: log.clone(),
                    });
                }
                let _ = reply.send(result);
            }
            Command::Read { user_id, date, reply } => {
                let _ = reply.send(blocking_read(&db, &user_id, date).await);
            }
        }
    }
    tracing::debug!("adherence sync stopped");
}

async fn blocking_merge(
    db: &Arc<Mutex<Connection>>,
    user_id: &str,
    date: NaiveDate,
    entries: AdherenceLog,
    source: WriteSource,
) -> Result<AdherenceLog, SyncError> {
    let db = Arc::clone(db);
    let user_id = user_id.to_string();
    tokio::task::spawn_blocking(move || {
        let mut conn = db
            .lock()
            .map_err(|e| anyhow::anyhow!("db lock poisoned: {e}"))?;
        log_store::merge_adherence(&mut conn, &user_id, date, &entries, source)?;
        log_store::get_adherence_day(&conn, &user_id, date)
    })
    .await
    .map_err(|e| SyncError::Database(format!("db task failed: {e}")))?
    .map_err(|e| SyncError::Database(format!("{e:#}")))
}

async fn blocking_read(
    db: &Arc<Mutex<Connection>>,
    user_id: &str,
    date: NaiveDate,
) -> Result<AdherenceLog, SyncError> {
    let db = Arc::clone(db);
    let user_id = user_id.to_string();
    tokio::task::spawn_blocking(move || {
        let conn = db
            .lock()
            .map_err(|e| anyhow::anyhow!("db lock poisoned: {e}"))?;
        log_store::get_adherence_day(&conn, &user_id, date)
    })
    .await
    .map_err(|e| SyncError::Database(format!("db task failed: {e}")))?
    .map_err(|e| SyncError::Database(format!("{e:#}")))
}
