//! Adherence log persistence.
//!
//! The log is one row per (user, day, slot). [`merge_adherence`] upserts only the
//! slots it is given, so two writers touching different slots of the same day can
//! never clobber each other. Later writes to the same slot win.

use std::collections::BTreeMap;

use anyhow::Result;
use chrono::NaiveDate;
use rusqlite::{params, Connection};

use crate::schedule::adherence::AdherenceLog;
use crate::schedule::types::{DoseSlot, LoggedStatus};

/// Date key format used for the log.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Which path produced an adherence write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteSource {
    /// In-app marking by the signed-in user.
    App,
    /// Notification action button, possibly with the app in the background.
    Notification,
}

impl WriteSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::App => "app",
            Self::Notification => "notification",
        }
    }
}

impl std::fmt::Display for WriteSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Field-scoped merge of `entries` into the log for `user_id` on `date`.
pub fn merge_adherence(
    conn: &mut Connection,
    user_id: &str,
    date: NaiveDate,
    entries: &AdherenceLog,
    source: WriteSource,
) -> Result<()> {
    let date_key = date.format(DATE_FORMAT).to_string();
    let now = chrono::Utc::now().to_rfc3339();

    let tx = conn.transaction()?;
    for (slot, status) in entries {
        tx.execute(
            "INSERT INTO adherence_log (user_id, log_date, slot, status, updated_at, source) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6) \
             ON CONFLICT(user_id, log_date, slot) DO UPDATE SET \
                status = excluded.status, updated_at = excluded.updated_at, source = excluded.source",
            params![user_id, date_key, slot.as_str(), status.as_str(), now, source.as_str()],
        )?;
    }
    tx.commit()?;

    tracing::debug!(user = %user_id, date = %date_key, slots = entries.len(), source = %source, "adherence merged");
    Ok(())
}

/// All recorded slots for one day.
pub fn get_adherence_day(conn: &Connection, user_id: &str, date: NaiveDate) -> Result<AdherenceLog> {
    let mut stmt = conn.prepare(
        "SELECT slot, status FROM adherence_log WHERE user_id = ?1 AND log_date = ?2",
    )?;
    let rows = stmt
        .query_map(params![user_id, date.format(DATE_FORMAT).to_string()], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?
        .collect::<Result<Vec<_>, _>>()?;

    let mut log = AdherenceLog::new();
    for (slot, status) in rows {
        if let Some(entry) = parse_entry(&slot, &status) {
            log.insert(entry.0, entry.1);
        }
    }
    Ok(log)
}

/// Logs for every day in `from..=to` that has at least one entry.
pub fn get_adherence_range(
    conn: &Connection,
    user_id: &str,
    from: NaiveDate,
    to: NaiveDate,
) -> Result<BTreeMap<NaiveDate, AdherenceLog>> {
    let mut stmt = conn.prepare(
        "SELECT log_date, slot, status FROM adherence_log \
         WHERE user_id = ?1 AND log_date >= ?2 AND log_date <= ?3",
    )?;
    let rows = stmt
        .query_map(
            params![
                user_id,
                from.format(DATE_FORMAT).to_string(),
                to.format(DATE_FORMAT).to_string()
            ],
            |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                ))
            },
        )?
        .collect::<Result<Vec<_>, _>>()?;

    let mut logs: BTreeMap<NaiveDate, AdherenceLog> = BTreeMap::new();
    for (date, slot, status) in rows {
        let Ok(date) = NaiveDate::parse_from_str(&date, DATE_FORMAT) else {
            tracing::warn!(date = %date, "skipping adherence row with malformed date");
            continue;
        };
        if let Some((slot, status)) = parse_entry(&slot, &status) {
            logs.entry(date).or_default().insert(slot, status);
        }
    }
    Ok(logs)
}

fn parse_entry(slot: &str, status: &str) -> Option<(DoseSlot, LoggedStatus)> {
    match (slot.parse(), status.parse()) {
        (Ok(slot), Ok(status)) => Some((slot, status)),
        _ => {
            tracing::warn!(slot, status, "skipping unreadable adherence row");
            None
        }
    }
}
