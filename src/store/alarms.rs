//! Ledger of alarms currently registered with the OS scheduler.
//!
//! The OS owns delivery; the ledger only remembers what was handed over so a later
//! registration for the same prescription can cancel what it supersedes.

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{params, Connection};

use crate::schedule::alarms::{AlarmExtra, AlarmRecord};
use crate::schedule::types::DoseSlot;
use crate::store::adherence::DATE_FORMAT;

/// Alarms on record for a prescription, ordered by target instant.
pub fn registered_for(conn: &Connection, prescription_id: &str) -> Result<Vec<AlarmRecord>> {
    let mut stmt = conn.prepare(
        "SELECT id, slot, day, target_at, title, body FROM alarm_ledger \
         WHERE prescription_id = ?1 ORDER BY target_at",
    )?;
    let rows = stmt
        .query_map(params![prescription_id], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, String>(4)?,
                row.get::<_, String>(5)?,
            ))
        })?
        .collect::<Result<Vec<_>, _>>()?;

    rows.into_iter()
        .map(|(id, slot, day, target_at, title, body)| -> Result<AlarmRecord> {
            let slot: DoseSlot = slot.parse().map_err(anyhow::Error::msg)?;
            Ok(AlarmRecord {
                id,
                slot,
                day: NaiveDate::parse_from_str(&day, DATE_FORMAT)
                    .with_context(|| format!("bad ledger day for alarm {id}"))?,
                at: DateTime::parse_from_rfc3339(&target_at)
                    .with_context(|| format!("bad ledger instant for alarm {id}"))?
                    .with_timezone(&Utc),
                title,
                body,
                extra: AlarmExtra {
                    prescription_id: prescription_id.to_string(),
                    slot_label: slot.label().to_string(),
                },
            })
        })
        .collect()
}

/// Remember a batch that the scheduler accepted.
pub fn record_registered(conn: &mut Connection, user_id: &str, batch: &[AlarmRecord]) -> Result<()> {
    let now = Utc::now().to_rfc3339();
    let tx = conn.transaction()?;
    for alarm in batch {
        tx.execute(
            "INSERT INTO alarm_ledger (id, user_id, prescription_id, slot, day, target_at, title, body, registered_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                alarm.id,
                user_id,
                alarm.extra.prescription_id,
                alarm.slot.as_str(),
                alarm.day.format(DATE_FORMAT).to_string(),
                alarm.at.to_rfc3339(),
                alarm.title,
                alarm.body,
                now,
            ],
        )
        .with_context(|| format!("failed to record alarm {}", alarm.id))?;
    }
    tx.commit()?;
    Ok(())
}

/// Forget alarms by id (cancelled or already delivered).
pub fn remove(conn: &mut Connection, ids: &[i64]) -> Result<usize> {
    let tx = conn.transaction()?;
    let mut removed = 0;
    for id in ids {
        removed += tx.execute("DELETE FROM alarm_ledger WHERE id = ?1", params![id])?;
    }
    tx.commit()?;
    Ok(removed)
}

/// Ids already taken in the ledger, for collision checks against a fresh batch.
pub fn existing_ids(conn: &Connection, candidates: &[i64]) -> Result<Vec<i64>> {
    let mut stmt = conn.prepare("SELECT COUNT(*) > 0 FROM alarm_ledger WHERE id = ?1")?;
    let mut taken = Vec::new();
    for id in candidates {
        let exists: bool = stmt.query_row(params![id], |row| row.get(0))?;
        if exists {
            taken.push(*id);
        }
    }
    Ok(taken)
}

/// Count of ledger entries still in the future for a user.
pub fn upcoming_count(conn: &Connection, user_id: &str, now: DateTime<Utc>) -> Result<u64> {
    let n: i64 = conn.query_row(
        "SELECT COUNT(*) FROM alarm_ledger WHERE user_id = ?1 AND target_at > ?2",
        params![user_id, now.to_rfc3339()],
        |row| row.get(0),
    )?;
    Ok(n as u64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn alarm(id: i64, rx: &str, hour: u32) -> AlarmRecord {
        AlarmRecord {
            id,
            slot: DoseSlot::Morning,
            day: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            at: Utc.with_ymd_and_hms(2024, 1, 1, hour, 0, 0).unwrap(),
            title: "Morning Medicines".into(),
            body: "Take: Dolo (650mg)".into(),
            extra: AlarmExtra {
                prescription_id: rx.into(),
                slot_label: "Morning".into(),
            },
        }
    }

    #[test]
    fn record_then_read_back() {
        let mut conn = crate::db::open_memory_database().unwrap();
        let batch = vec![alarm(10, "rx1", 9), alarm(11, "rx1", 8), alarm(12, "rx2", 8)];
        record_registered(&mut conn, "u1", &batch).unwrap();

        let rx1 = registered_for(&conn, "rx1").unwrap();
        assert_eq!(rx1, vec![batch[1].clone(), batch[0].clone()]);
    }

    #[test]
    fn remove_and_collision_check() {
        let mut conn = crate::db::open_memory_database().unwrap();
        record_registered(&mut conn, "u1", &[alarm(1, "rx", 8), alarm(2, "rx", 9)]).unwrap();

        assert_eq!(existing_ids(&conn, &[2, 3]).unwrap(), vec![2]);
        assert_eq!(remove(&mut conn, &[1, 99]).unwrap(), 1);
        assert_eq!(registered_for(&conn, "rx").unwrap().len(), 1);
    }

    #[test]
    fn duplicate_id_is_rejected() {
        let mut conn = crate::db::open_memory_database().unwrap();
        record_registered(&mut conn, "u1", &[alarm(1, "rx", 8)]).unwrap();
        assert!(record_registered(&mut conn, "u1", &[alarm(1, "rx", 9)]).is_err());
    }

    #[test]
    fn upcoming_counts_future_only() {
        let mut conn = crate::db::open_memory_database().unwrap();
        record_registered(&mut conn, "u1", &[alarm(1, "rx", 8), alarm(2, "rx", 20)]).unwrap();
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
        assert_eq!(upcoming_count(&conn, "u1", now).unwrap(), 1);
    }
}
