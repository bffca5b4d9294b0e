//! Prescription record persistence.

use anyhow::{bail, Context, Result};
use rusqlite::{params, Connection, OptionalExtension};

use crate::schedule::types::{Medicine, PatientRecord, RecordStatus};

/// Insert a new record for `user_id`. Records are write-once; saving an existing id fails.
pub fn save_record(conn: &Connection, user_id: &str, record: &PatientRecord) -> Result<()> {
    let exists: bool = conn.query_row(
        "SELECT COUNT(*) > 0 FROM records WHERE id = ?1",
        params![record.id],
        |row| row.get(0),
    )?;
    if exists {
        bail!("record already exists: {}", record.id);
    }

    let medicines = serde_json::to_string(&record.medicines)?;
    conn.execute(
        "INSERT INTO records (id, user_id, hospital_name, diagnosis, date_added, status, medicines, created_at) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            record.id,
            user_id,
            record.hospital_name,
            record.diagnosis,
            record.date_added,
            record.status.as_str(),
            medicines,
            chrono::Utc::now().to_rfc3339(),
        ],
    )?;

    tracing::info!(id = %record.id, user = %user_id, medicines = record.med_count(), "record saved");
    Ok(())
}

/// All records for `user_id`, in the order they were saved.
pub fn get_records(conn: &Connection, user_id: &str) -> Result<Vec<PatientRecord>> {
    let mut stmt = conn.prepare(
        "SELECT id, hospital_name, diagnosis, date_added, status, medicines \
         FROM records WHERE user_id = ?1 ORDER BY created_at, rowid",
    )?;

    let rows = stmt
        .query_map(params![user_id], row_to_parts)?
        .collect::<Result<Vec<_>, _>>()?;

    rows.into_iter().map(parts_to_record).collect()
}

/// One record by id, scoped to `user_id`.
pub fn get_record(conn: &Connection, user_id: &str, id: &str) -> Result<Option<PatientRecord>> {
    conn.query_row(
        "SELECT id, hospital_name, diagnosis, date_added, status, medicines \
         FROM records WHERE user_id = ?1 AND id = ?2",
        params![user_id, id],
        row_to_parts,
    )
    .optional()?
    .map(parts_to_record)
    .transpose()
}

/// Filter by hospital-name substring (case-insensitive), newest `date_added` first.
pub fn search_records(
    records: &[PatientRecord],
    hospital_query: &str,
    limit: Option<usize>,
) -> Vec<PatientRecord> {
    let needle = hospital_query.to_lowercase();
    let mut found: Vec<PatientRecord> = records
        .iter()
        .filter(|r| r.hospital_name.to_lowercase().contains(&needle))
        .cloned()
        .collect();
    // YYYY-MM-DD sorts lexically; stable sort keeps save order among equal dates.
    found.sort_by(|a, b| b.date_added.cmp(&a.date_added));
    if let Some(limit) = limit {
        found.truncate(limit);
    }
    found
}

type RecordParts = (String, String, String, String, String, String);

fn row_to_parts(row: &rusqlite::Row<'_>) -> rusqlite::Result<RecordParts> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
        row.get(5)?,
    ))
}

fn parts_to_record(
    (id, hospital_name, diagnosis, date_added, status, medicines): RecordParts,
) -> Result<PatientRecord> {
    let medicines: Vec<Medicine> = serde_json::from_str(&medicines)
        .with_context(|| format!("corrupt medicines column for record {id}"))?;
    let status: RecordStatus = status.parse().map_err(anyhow::Error::msg)?;
    Ok(PatientRecord {
        id,
        hospital_name,
        diagnosis,
        date_added,
        medicines,
        status,
    })
}
