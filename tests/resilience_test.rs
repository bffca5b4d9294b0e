use chrono::NaiveDate;
use medcare::db;
use medcare::schedule::types::{DoseSlot, LoggedStatus};
use medcare::schedule::AdherenceLog;
use medcare::store::adherence::{get_adherence_day, merge_adherence, WriteSource};
use tempfile::TempDir;

fn day() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
}

#[test]
fn open_creates_new_db_at_nonexistent_path() {
    let tmp = TempDir::new().unwrap();
    let db_path = tmp.path().join("subdir").join("new.db");

    // Should not exist yet
    assert!(!db_path.exists());

    let conn = db::open_database(&db_path).unwrap();

    // Should have been created
    assert!(db_path.exists());

    // Should be functional
    let count: i64 = conn
        .query_row("SELECT COUNT(*) FROM records", [], |row| row.get(0))
        .unwrap();
    assert_eq!(count, 0);
}

#[test]
fn health_check_passes_on_valid_db() {
    let conn = db::open_memory_database().unwrap();

    let report = db::check_database_health(&conn).unwrap();
    assert!(report.integrity_ok);
    assert_eq!(report.schema_version, db::migrations::CURRENT_SCHEMA_VERSION);
    assert_eq!(report.record_count, 0);
    assert_eq!(report.adherence_count, 0);
    assert_eq!(report.alarm_count, 0);
}

#[test]
fn busy_timeout_is_set() {
    let tmp = TempDir::new().unwrap();
    let db_path = tmp.path().join("test.db");

    let conn = db::open_database(&db_path).unwrap();

    let timeout: i64 = conn
        .pragma_query_value(None, "busy_timeout", |row| row.get(0))
        .unwrap();
    assert_eq!(timeout, 5000);

    let mode: String = conn
        .pragma_query_value(None, "journal_mode", |row| row.get(0))
        .unwrap();
    assert_eq!(mode.to_lowercase(), "wal");
}

#[test]
fn write_from_second_connection_is_visible_to_first() {
    // The notification path may run on its own connection while the app holds one.
    let tmp = TempDir::new().unwrap();
    let db_path = tmp.path().join("shared.db");

    let app_conn = db::open_database(&db_path).unwrap();
    let mut callback_conn = db::open_database(&db_path).unwrap();

    merge_adherence(
        &mut callback_conn,
        "u1",
        day(),
        &AdherenceLog::from([(DoseSlot::Night, LoggedStatus::Missed)]),
        WriteSource::Notification,
    )
    .unwrap();

    let log = get_adherence_day(&app_conn, "u1", day()).unwrap();
    assert_eq!(log.get(&DoseSlot::Night), Some(&LoggedStatus::Missed));
}

#[test]
fn data_survives_reopen() {
    let tmp = TempDir::new().unwrap();
    let db_path = tmp.path().join("persist.db");

    {
        let mut conn = db::open_database(&db_path).unwrap();
        merge_adherence(
            &mut conn,
            "u1",
            day(),
            &AdherenceLog::from([(DoseSlot::Morning, LoggedStatus::Taken)]),
            WriteSource::App,
        )
        .unwrap();
    }

    let conn = db::open_database(&db_path).unwrap();
    let log = get_adherence_day(&conn, "u1", day()).unwrap();
    assert_eq!(log.len(), 1);
    assert_eq!(
        db::migrations::get_schema_version(&conn).unwrap(),
        db::migrations::CURRENT_SCHEMA_VERSION
    );
}
