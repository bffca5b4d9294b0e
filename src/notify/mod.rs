//! OS scheduling boundary.
//!
//! Provides the [`AlarmScheduler`] trait the engine hands alarm batches to, the
//! fixed notification action types, the action-callback payload ([`ActionEvent`]),
//! and [`reconcile`] which replaces a prescription's previously registered alarms
//! with a fresh projection.

pub mod reconcile;

use serde::{Deserialize, Serialize};

use crate::schedule::alarms::{AlarmExtra, AlarmRecord};
use crate::schedule::types::LoggedStatus;

pub use reconcile::{reconcile, Reconciliation};

/// Action type attached to every medication alarm.
pub const ACTION_TYPE_ID: &str = "GROUP_MEDICATION_ACTION";
/// Action id for "mark all taken".
pub const ACTION_TAKEN_ALL: &str = "taken_all";
/// Action id for "mark all missed".
pub const ACTION_MISSED_ALL: &str = "missed_all";
/// Notification channel alarms are delivered on.
pub const CHANNEL_ID: &str = "medication_reminders";

/// Errors surfaced by the scheduling facility.
#[derive(Debug, thiserror::Error)]
pub enum ScheduleError {
    #[error("scheduler rejected batch: {0}")]
    Rejected(String),
    #[error("scheduler unavailable: {0}")]
    Unavailable(String),
    #[error("alarm ledger error: {0}")]
    Ledger(String),
}

/// One button shown on a delivered alarm.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NotificationAction {
    pub id: &'static str,
    pub title: &'static str,
    /// Whether tapping brings the app to the foreground.
    pub foreground: bool,
    pub destructive: bool,
}

/// A named group of actions registered once with the OS.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActionType {
    pub id: &'static str,
    pub actions: Vec<NotificationAction>,
}

/// Delivery channel settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChannelSpec {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    /// Platform importance, 5 = urgent.
    pub importance: u8,
    pub vibration: bool,
}

/// The medication action group: "Taken All" and "Missed", both handled in the background.
pub fn medication_action_type() -> ActionType {
    ActionType {
        id: ACTION_TYPE_ID,
        actions: vec![
            NotificationAction {
                id: ACTION_TAKEN_ALL,
                title: "Taken All",
                foreground: false,
                destructive: false,
            },
            NotificationAction {
                id: ACTION_MISSED_ALL,
                title: "Missed",
                foreground: false,
                destructive: true,
            },
        ],
    }
}

pub fn medication_channel() -> ChannelSpec {
    ChannelSpec {
        id: CHANNEL_ID,
        name: "Medication Reminders",
        description: "Persistent alarms to remind patients to take tablets",
        importance: 5,
        vibration: true,
    }
}

/// Payload the OS hands back when the user taps an alarm action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionEvent {
    pub action_id: String,
    pub extra: AlarmExtra,
}

impl ActionEvent {
    /// Adherence value an action id maps to. Unknown ids (e.g. a plain tap) map to `None`.
    pub fn status(&self) -> Option<LoggedStatus> {
        match self.action_id.as_str() {
            ACTION_TAKEN_ALL => Some(LoggedStatus::Taken),
            ACTION_MISSED_ALL => Some(LoggedStatus::Missed),
            _ => None,
        }
    }
}

/// The OS alarm/notification facility.
///
/// Calls are fire-and-await: once issued they complete or fail and cannot be
/// aborted. Implementations are synchronous; async callers should use
/// `tokio::task::spawn_blocking`.
pub trait AlarmScheduler: Send + Sync {
    /// Register the medication action buttons and delivery channel.
    fn prepare(&self, _action_type: &ActionType, _channel: &ChannelSpec) -> Result<(), ScheduleError> {
        Ok(())
    }

    /// Register every alarm in `batch` in a single call.
    fn schedule(&self, batch: &[AlarmRecord]) -> Result<(), ScheduleError>;

    /// Cancel previously registered alarms by id.
    fn cancel(&self, ids: &[i64]) -> Result<(), ScheduleError>;
}

/// Scheduler that only logs what it would register.
///
/// Used when no platform scheduler is attached (CLI, MCP server).
#[derive(Debug, Default, Clone)]
pub struct LogScheduler;

impl AlarmScheduler for LogScheduler {
    fn prepare(&self, action_type: &ActionType, channel: &ChannelSpec) -> Result<(), ScheduleError> {
        tracing::info!(
            action_type = action_type.id,
            actions = action_type.actions.len(),
            channel = channel.id,
            "notification actions registered"
        );
        Ok(())
    }

    fn schedule(&self, batch: &[AlarmRecord]) -> Result<(), ScheduleError> {
        for alarm in batch {
            tracing::info!(
                id = alarm.id,
                at = %alarm.at,
                title = %alarm.title,
                action_type = ACTION_TYPE_ID,
                channel = CHANNEL_ID,
                "alarm registered"
            );
        }
        Ok(())
    }

    fn cancel(&self, ids: &[i64]) -> Result<(), ScheduleError> {
        tracing::info!(count = ids.len(), ?ids, "alarms cancelled");
        Ok(())
    }
}
