//! Alarm reconciliation for a single prescription.
//!
//! Compares a fresh projection against the ledger of alarms already registered for
//! the prescription: superseded future alarms are cancelled, identical ones are kept
//! as they are, new ones are registered in one batch, and delivered ones are pruned.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use rusqlite::Connection;
use serde::Serialize;

use super::{AlarmScheduler, ScheduleError};
use crate::schedule::alarms::{reissue_id, AlarmRecord};
use crate::schedule::types::DoseSlot;
use crate::store::alarms as ledger;

/// Outcome of [`reconcile`].
#[derive(Debug, Default, Serialize)]
pub struct Reconciliation {
    /// Alarms newly handed to the scheduler.
    pub scheduled: Vec<AlarmRecord>,
    /// Ids of superseded alarms that were cancelled.
    pub cancelled: Vec<i64>,
    /// Previously registered alarms left untouched because the fresh batch matches them.
    pub kept: usize,
    /// Ledger entries dropped because their instant has passed.
    pub expired: usize,
}

/// Bring the OS registrations for `prescription_id` in line with `fresh`.
///
/// Cancellations are issued before the new batch is registered. Nothing is rolled
/// back on failure; the error is returned for the caller to log.
pub fn reconcile(
    conn: &mut Connection,
    scheduler: &dyn AlarmScheduler,
    user_id: &str,
    prescription_id: &str,
    fresh: Vec<AlarmRecord>,
    now: DateTime<Utc>,
) -> Result<Reconciliation, ScheduleError> {
    let previous = ledger::registered_for(conn, prescription_id).map_err(ledger_err)?;

    let (expired, live): (Vec<AlarmRecord>, Vec<AlarmRecord>) =
        previous.into_iter().partition(|a| a.at <= now);

    let fresh_keys: HashSet<_> = fresh.iter().map(match_key).collect();
    let live_keys: HashSet<_> = live.iter().map(match_key).collect();

    let cancelled: Vec<i64> = live
        .iter()
        .filter(|a| !fresh_keys.contains(&match_key(a)))
        .map(|a| a.id)
        .collect();
    let kept = live.len() - cancelled.len();

    let mut to_schedule: Vec<AlarmRecord> = fresh
        .into_iter()
        .filter(|a| !live_keys.contains(&match_key(a)))
        .collect();

    if !cancelled.is_empty() {
        scheduler.cancel(&cancelled)?;
        ledger::remove(conn, &cancelled).map_err(ledger_err)?;
    }

    if !to_schedule.is_empty() {
        avoid_id_collisions(conn, &mut to_schedule)?;
        scheduler.schedule(&to_schedule)?;
        ledger::record_registered(conn, user_id, &to_schedule).map_err(ledger_err)?;
    }

    let expired_ids: Vec<i64> = expired.iter().map(|a| a.id).collect();
    if !expired_ids.is_empty() {
        ledger::remove(conn, &expired_ids).map_err(ledger_err)?;
    }

    tracing::info!(
        prescription = %prescription_id,
        scheduled = to_schedule.len(),
        cancelled = cancelled.len(),
        kept,
        expired = expired_ids.len(),
        "alarms reconciled"
    );

    Ok(Reconciliation {
        scheduled: to_schedule,
        cancelled,
        kept,
        expired: expired_ids.len(),
    })
}

/// Two alarms are the same registration when slot, instant and body all agree.
fn match_key(alarm: &AlarmRecord) -> (DoseSlot, DateTime<Utc>, String) {
    (alarm.slot, alarm.at, alarm.body.clone())
}

/// Re-draw ids that already exist in the ledger.
fn avoid_id_collisions(conn: &Connection, batch: &mut [AlarmRecord]) -> Result<(), ScheduleError> {
    let ids: Vec<i64> = batch.iter().map(|a| a.id).collect();
    let taken: HashSet<i64> = ledger::existing_ids(conn, &ids)
        .map_err(ledger_err)?
        .into_iter()
        .collect();
    if taken.is_empty() {
        return Ok(());
    }

    let mut in_use: HashSet<i64> = ids.into_iter().collect();
    for alarm in batch.iter_mut().filter(|a| taken.contains(&a.id)) {
        let mut id = reissue_id();
        while in_use.contains(&id) || !ledger::existing_ids(conn, &[id]).map_err(ledger_err)?.is_empty() {
            id = reissue_id();
        }
        tracing::debug!(old = alarm.id, new = id, "alarm id collided with ledger, reissued");
        in_use.insert(id);
        alarm.id = id;
    }
    Ok(())
}

fn ledger_err(e: anyhow::Error) -> ScheduleError {
    ScheduleError::Ledger(format!("{e:#}"))
}
