//! Adherence state resolver: derives each slot's live status from the clock and
//! the persisted log, and aggregates day-level status for the history strip.
//!
//! Everything here is a pure projection. Callers pass `now` and the log explicitly
//! and re-run the resolver on every tick and on every log change.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use serde::Serialize;

use super::alarms::slot_instant;
use super::frequency::SlotPlan;
use super::types::{DayStatus, DoseSlot, LoggedStatus, PatientRecord, SlotStatus};

/// Persisted entries for one user-day. Absence of a slot means "not yet recorded".
pub type AdherenceLog = BTreeMap<DoseSlot, LoggedStatus>;

/// Number of days shown in the history strip, today included.
pub const STRIP_DAYS: i64 = 7;

/// Resolved state of one dose slot for a day.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SlotCard {
    pub slot: DoseSlot,
    pub label: &'static str,
    pub time: &'static str,
    pub target: DateTime<Utc>,
    pub status: SlotStatus,
    pub medicines: Vec<String>,
}

/// One day of the history strip.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DayEntry {
    pub date: NaiveDate,
    /// Narrow weekday label, e.g. `"M"`.
    pub day_label: String,
    pub status: DayStatus,
}

/// Status of a single slot.
///
/// A persisted value always wins. Otherwise the slot is Locked strictly before its
/// target instant and Pending from the target instant on.
pub fn slot_status(
    logged: Option<LoggedStatus>,
    target: DateTime<Utc>,
    now: DateTime<Utc>,
) -> SlotStatus {
    match logged {
        Some(status) => status.into(),
        None if now < target => SlotStatus::Locked,
        None => SlotStatus::Pending,
    }
}

/// Resolve every slot present in `plan` on local calendar `day`.
pub fn resolve_day<Tz: TimeZone>(
    plan: &SlotPlan,
    day: NaiveDate,
    now: &DateTime<Tz>,
    log: &AdherenceLog,
) -> Vec<SlotCard> {
    let tz = now.timezone();
    let now_utc = now.with_timezone(&Utc);

    plan.iter()
        .filter_map(|(slot, meds)| {
            let target = slot_instant(&tz, day, slot)?;
            Some(SlotCard {
                slot,
                label: slot.label(),
                time: slot.display_time(),
                target,
                status: slot_status(log.get(&slot).copied(), target, now_utc),
                medicines: meds.to_vec(),
            })
        })
        .collect()
}

/// Resolve today's slot cards across all active prescriptions.
pub fn resolve_today<Tz: TimeZone>(
    records: &[PatientRecord],
    now: &DateTime<Tz>,
    today_log: &AdherenceLog,
) -> Vec<SlotCard> {
    let plan = SlotPlan::for_records(records);
    resolve_day(&plan, now.date_naive(), now, today_log)
}

/// Classification a day carries before any slot status is applied.
pub fn prior_status(day: NaiveDate, today: NaiveDate) -> DayStatus {
    if day < today {
        DayStatus::Missed
    } else if day == today {
        DayStatus::Today
    } else {
        DayStatus::Future
    }
}

/// Aggregate slot statuses into a day status.
///
/// `Perfect` when every slot is Taken. `Partial` when at least one slot is Missed,
/// or when some but not all slots are Taken. Anything else keeps `prior`,
/// including a day with no slots.
pub fn aggregate_day<I>(statuses: I, prior: DayStatus) -> DayStatus
where
    I: IntoIterator<Item = SlotStatus>,
{
    let (mut total, mut taken, mut missed) = (0usize, 0usize, 0usize);
    for status in statuses {
        total += 1;
        match status {
            SlotStatus::Taken => taken += 1,
            SlotStatus::Missed => missed += 1,
            SlotStatus::Locked | SlotStatus::Pending => {}
        }
    }

    if total == 0 {
        prior
    } else if taken == total {
        DayStatus::Perfect
    } else if missed > 0 || taken > 0 {
        DayStatus::Partial
    } else {
        prior
    }
}

/// Build the history strip: the six days before today plus today.
///
/// `logs` holds whatever entries exist per date; missing dates resolve as empty logs.
pub fn week_strip<Tz: TimeZone>(
    records: &[PatientRecord],
    now: &DateTime<Tz>,
    logs: &BTreeMap<NaiveDate, AdherenceLog>,
) -> Vec<DayEntry> {
    let plan = SlotPlan::for_records(records);
    let today = now.date_naive();
    let empty = AdherenceLog::new();

    (0..STRIP_DAYS)
        .rev()
        .map(|back| {
            let date = today - Duration::days(back);
            let log = logs.get(&date).unwrap_or(&empty);
            let cards = resolve_day(&plan, date, now, log);
            let status = aggregate_day(cards.iter().map(|c| c.status), prior_status(date, today));
            DayEntry {
                date,
                day_label: date.format("%a").to_string().chars().take(1).collect(),
                status,
            }
        })
        .collect()
}
