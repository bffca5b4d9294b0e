//! Alarm projector: expands a prescription's dose slots over a treatment window
//! into concrete future alarm instants.

use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::frequency::SlotPlan;
use super::types::{DoseSlot, PatientRecord};

/// Upper bound of the alarm id space. Platform notification ids are signed 32-bit.
const ALARM_ID_MAX: i64 = i32::MAX as i64;

/// Opaque payload attached to every alarm and echoed back on action callbacks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlarmExtra {
    pub prescription_id: String,
    pub slot_label: String,
}

/// One concrete reminder ready for registration with the OS scheduler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlarmRecord {
    pub id: i64,
    pub slot: DoseSlot,
    /// Calendar day the alarm belongs to, in the projection's local time.
    pub day: NaiveDate,
    /// Absolute target instant.
    pub at: DateTime<Utc>,
    pub title: String,
    pub body: String,
    pub extra: AlarmExtra,
}

/// Alarm title for a slot, e.g. `"Morning Medicines"`.
pub fn alarm_title(slot: DoseSlot) -> String {
    format!("{} Medicines", slot.label())
}

/// Project `record` over `window_days` calendar days starting at `window_start`.
///
/// Only instants strictly after `window_start` are kept. Output is ordered by day,
/// then by slot time within the day. Every alarm in the batch gets a distinct id.
pub fn project<Tz: TimeZone>(
    record: &PatientRecord,
    window_start: &DateTime<Tz>,
    window_days: u32,
) -> Vec<AlarmRecord> {
    let plan = SlotPlan::for_record(record);
    if plan.is_empty() || window_days == 0 {
        return Vec::new();
    }

    let tz = window_start.timezone();
    let first_day = window_start.date_naive();
    let cutoff = window_start.with_timezone(&Utc);

    let mut alarms = Vec::new();
    for offset in 0..window_days {
        let day = first_day + Duration::days(i64::from(offset));
        for (slot, meds) in plan.iter() {
            let Some(at) = slot_instant(&tz, day, slot) else {
                tracing::warn!(%day, slot = %slot, "slot time does not exist in local time, skipping");
                continue;
            };
            if at <= cutoff {
                continue;
            }
            alarms.push(AlarmRecord {
                id: 0,
                slot,
                day,
                at,
                title: alarm_title(slot),
                body: format!("Take: {}", meds.join(", ")),
                extra: AlarmExtra {
                    prescription_id: record.id.clone(),
                    slot_label: slot.label().to_string(),
                },
            });
        }
    }

    let count = alarms.len();
    for (alarm, id) in alarms.iter_mut().zip(allocate_ids(count)) {
        alarm.id = id;
    }

    tracing::debug!(
        prescription = %record.id,
        window_days,
        count = alarms.len(),
        "projected alarms"
    );
    alarms
}

/// Absolute instant of `slot` on local calendar `day`.
///
/// Ambiguous local times (DST fall-back) resolve to the earlier instant; a time that
/// falls in a DST gap moves forward one hour.
pub fn slot_instant<Tz: TimeZone>(tz: &Tz, day: NaiveDate, slot: DoseSlot) -> Option<DateTime<Utc>> {
    let local = day.and_time(slot.clock_time());
    tz.from_local_datetime(&local)
        .earliest()
        .or_else(|| tz.from_local_datetime(&(local + Duration::hours(1))).earliest())
        .map(|dt| dt.with_timezone(&Utc))
}

/// Allocate `count` distinct ids as a contiguous block at a random base.
///
/// Ids within one batch never collide. Across batches the random base keeps
/// collisions improbable; the alarm ledger rejects any that do occur.
fn allocate_ids(count: usize) -> impl Iterator<Item = i64> {
    let span = count as i64;
    let base = if span >= ALARM_ID_MAX {
        1
    } else {
        rand::thread_rng().gen_range(1..=ALARM_ID_MAX - span)
    };
    (0..span).map(move |i| base + i)
}

/// Draw a single replacement id, used when a batch id collides with the ledger.
pub(crate) fn reissue_id() -> i64 {
    rand::thread_rng().gen_range(1..=ALARM_ID_MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::types::{Medicine, RecordStatus};
    use chrono::{FixedOffset, NaiveDateTime};
    use std::collections::HashSet;

    fn med(name: &str, dose: &str, frequency: &str) -> Medicine {
        Medicine {
            name: name.into(),
            dose: dose.into(),
            frequency: frequency.into(),
            duration: String::new(),
            instructions: None,
        }
    }

    fn record(meds: Vec<Medicine>) -> PatientRecord {
        PatientRecord {
            id: "rx-42".into(),
            hospital_name: "Apollo".into(),
            diagnosis: "Viral Fever".into(),
            date_added: "2024-01-01".into(),
            medicines: meds,
            status: RecordStatus::OngoingTreatment,
        }
    }

    fn at(s: &str) -> DateTime<Utc> {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M").unwrap().and_utc()
    }

    #[test]
    fn two_day_window_before_morning_includes_first_morning() {
        let rec = record(vec![med("Augmentin", "625mg", "1-0-1")]);
        let alarms = project(&rec, &at("2024-01-01 07:30"), 2);

        let instants: Vec<(DoseSlot, DateTime<Utc>)> = alarms.iter().map(|a| (a.slot, a.at)).collect();
        assert_eq!(
            instants,
            vec![
                (DoseSlot::Morning, at("2024-01-01 08:00")),
                (DoseSlot::Night, at("2024-01-01 21:00")),
                (DoseSlot::Morning, at("2024-01-02 08:00")),
                (DoseSlot::Night, at("2024-01-02 21:00")),
            ]
        );
    }

    #[test]
    fn full_week_three_times_daily_is_21_alarms() {
        let rec = record(vec![med("Dolo", "650mg", "TDS")]);
        assert_eq!(project(&rec, &at("2024-03-10 06:00"), 7).len(), 21);
        // Starting after the morning slot drops exactly that one.
        assert_eq!(project(&rec, &at("2024-03-10 09:00"), 7).len(), 20);
    }

    #[test]
    fn instant_equal_to_start_is_excluded() {
        let rec = record(vec![med("Dolo", "650mg", "OD")]);
        let start = at("2024-01-01 08:00");
        let alarms = project(&rec, &start, 3);
        assert_eq!(alarms.len(), 2);
        assert!(alarms.iter().all(|a| a.at > start));
    }

    #[test]
    fn alarms_are_ordered_by_instant() {
        let rec = record(vec![med("A", "1", "0-0-1"), med("B", "1", "tid")]);
        let alarms = project(&rec, &at("2024-01-01 00:00"), 4);
        assert!(alarms.windows(2).all(|w| w[0].at < w[1].at));
    }

    #[test]
    fn ids_are_unique_within_batch() {
        let rec = record(vec![med("Dolo", "650mg", "1-1-1")]);
        let alarms = project(&rec, &at("2024-01-01 00:00"), 30);
        let ids: HashSet<i64> = alarms.iter().map(|a| a.id).collect();
        assert_eq!(ids.len(), alarms.len());
        assert!(alarms.iter().all(|a| a.id > 0 && a.id <= ALARM_ID_MAX));
    }

    #[test]
    fn body_and_extra_carry_labels() {
        let rec = record(vec![
            med("Augmentin 625 Duo", "625mg", "1-0-1"),
            med("Dolo 650", "650mg", "1-0-1"),
        ]);
        let alarms = project(&rec, &at("2024-01-01 12:00"), 1);
        assert_eq!(alarms.len(), 1);
        let night = &alarms[0];
        assert_eq!(night.title, "Night Medicines");
        assert_eq!(night.body, "Take: Augmentin 625 Duo (625mg), Dolo 650 (650mg)");
        assert_eq!(night.extra.prescription_id, "rx-42");
        assert_eq!(night.extra.slot_label, "Night");
    }

    #[test]
    fn empty_prescription_or_window_projects_nothing() {
        assert!(project(&record(vec![]), &at("2024-01-01 00:00"), 7).is_empty());
        let rec = record(vec![med("Dolo", "650mg", "TDS")]);
        assert!(project(&rec, &at("2024-01-01 00:00"), 0).is_empty());
        assert!(project(&rec, &at("2024-01-01 22:00"), 1).is_empty());
    }

    #[test]
    fn slot_times_are_local_to_the_window_timezone() {
        let ist = FixedOffset::east_opt(5 * 3600 + 1800).unwrap();
        let start = ist.with_ymd_and_hms(2024, 1, 1, 7, 0, 0).unwrap();
        let rec = record(vec![med("Dolo", "650mg", "OD")]);
        let alarms = project(&rec, &start, 1);
        assert_eq!(alarms.len(), 1);
        // 08:00 IST is 02:30 UTC.
        assert_eq!(alarms[0].at, at("2024-01-01 02:30"));
        assert_eq!(alarms[0].day, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
    }

    #[test]
    fn extra_serializes_camel_case() {
        let extra = AlarmExtra {
            prescription_id: "rx".into(),
            slot_label: "Morning".into(),
        };
        let json = serde_json::to_value(&extra).unwrap();
        assert_eq!(json, serde_json::json!({"prescriptionId": "rx", "slotLabel": "Morning"}));
    }
}
