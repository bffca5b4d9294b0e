//! SQL DDL for all MedCare tables.
//!
//! Defines the `profiles`, `records`, `adherence_log`, `alarm_ledger`, and
//! `schema_meta` tables. All DDL uses `IF NOT EXISTS` for idempotent initialization.

use rusqlite::Connection;

/// All schema DDL statements for MedCare's core tables.
const SCHEMA_SQL: &str = r#"
-- User profiles (display data only; identity lives elsewhere)
CREATE TABLE IF NOT EXISTS profiles (
    user_id TEXT PRIMARY KEY,
    display_name TEXT NOT NULL,
    phone_number TEXT NOT NULL DEFAULT '',
    updated_at TEXT NOT NULL
);

-- Saved prescriptions. Medicines are a JSON array and never updated in place.
CREATE TABLE IF NOT EXISTS records (
    id TEXT PRIMARY KEY,
    user_id TEXT NOT NULL,
    hospital_name TEXT NOT NULL,
    diagnosis TEXT NOT NULL,
    date_added TEXT NOT NULL,
    status TEXT NOT NULL CHECK(status IN ('Ongoing Treatment','Recovered','Cured','Maintenance')),
    medicines TEXT NOT NULL,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_records_user ON records(user_id);
CREATE INDEX IF NOT EXISTS idx_records_date ON records(date_added);

-- Adherence log: one row per user, calendar day and slot. Writes are field-scoped upserts.
CREATE TABLE IF NOT EXISTS adherence_log (
    user_id TEXT NOT NULL,
    log_date TEXT NOT NULL,
    slot TEXT NOT NULL CHECK(slot IN ('morning','afternoon','night')),
    status TEXT NOT NULL CHECK(status IN ('Taken','Missed')),
    updated_at TEXT NOT NULL,
    PRIMARY KEY (user_id, log_date, slot)
);

-- Alarms currently registered with the OS scheduler, used for reconciliation
CREATE TABLE IF NOT EXISTS alarm_ledger (
    id INTEGER PRIMARY KEY,
    user_id TEXT NOT NULL,
    prescription_id TEXT NOT NULL,
    slot TEXT NOT NULL CHECK(slot IN ('morning','afternoon','night')),
    day TEXT NOT NULL,
    target_at TEXT NOT NULL,
    title TEXT NOT NULL,
    body TEXT NOT NULL,
    registered_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_alarm_ledger_prescription ON alarm_ledger(prescription_id);

-- Schema metadata
CREATE TABLE IF NOT EXISTS schema_meta (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);
"#;

/// Initialize all schema tables. Idempotent (uses IF NOT EXISTS).
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(SCHEMA_SQL)?;

    // Set initial schema version if not already present
    conn.execute(
        "INSERT OR IGNORE INTO schema_meta (key, value) VALUES ('schema_version', '1')",
        [],
    )?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_creates_all_tables() {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();

        let tables: Vec<String> = conn
            .prepare("SELECT name FROM sqlite_master WHERE type='table' ORDER BY name")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<Result<Vec<_>, _>>()
            .unwrap();

        for table in ["profiles", "records", "adherence_log", "alarm_ledger", "schema_meta"] {
            assert!(tables.contains(&table.to_string()), "missing table {table}");
        }
    }

    #[test]
    fn schema_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();
        init_schema(&conn).unwrap(); // second call should not error
    }

    #[test]
    fn adherence_rejects_derived_statuses() {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();
        let result = conn.execute(
            "INSERT INTO adherence_log (user_id, log_date, slot, status, updated_at) \
             VALUES ('u', '2024-01-01', 'morning', 'Pending', 'now')",
            [],
        );
        assert!(result.is_err(), "Pending must never be persisted");
    }
}
