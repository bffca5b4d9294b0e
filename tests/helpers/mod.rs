#![allow(dead_code)]

use chrono::{DateTime, FixedOffset, TimeZone};
use medcare::app::MedCare;
use medcare::config::MedcareConfig;
use medcare::db;
use medcare::identity::StaticSession;
use medcare::notify::{AlarmScheduler, ScheduleError};
use medcare::schedule::types::{Medicine, PatientRecord, RecordStatus};
use medcare::schedule::AlarmRecord;
use rusqlite::Connection;
use std::sync::{Arc, Mutex};

/// Open a fresh in-memory database with schema and migrations applied.
pub fn test_db() -> Connection {
    let conn = Connection::open_in_memory().unwrap();
    db::schema::init_schema(&conn).unwrap();
    db::migrations::run_migrations(&conn).unwrap();
    conn
}

/// India Standard Time, a zone with no DST and a half-hour offset.
pub fn ist() -> FixedOffset {
    FixedOffset::east_opt(5 * 3600 + 1800).unwrap()
}

/// Local wall-clock instant in IST.
pub fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<FixedOffset> {
    ist().with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
}

pub fn medicine(name: &str, dose: &str, frequency: &str) -> Medicine {
    Medicine {
        name: name.into(),
        dose: dose.into(),
        frequency: frequency.into(),
        duration: "5 days".into(),
        instructions: None,
    }
}

pub fn record(id: &str, hospital: &str, date_added: &str, medicines: Vec<Medicine>) -> PatientRecord {
    PatientRecord {
        id: id.into(),
        hospital_name: hospital.into(),
        diagnosis: "General Consultation".into(),
        date_added: date_added.into(),
        medicines,
        status: RecordStatus::OngoingTreatment,
    }
}

/// Scheduler that remembers every call and can be told to fail.
#[derive(Default)]
pub struct RecordingScheduler {
    pub scheduled: Mutex<Vec<AlarmRecord>>,
    pub cancelled: Mutex<Vec<i64>>,
    pub batches: Mutex<usize>,
    pub fail: Mutex<bool>,
}

impl RecordingScheduler {
    pub fn set_failing(&self, fail: bool) {
        *self.fail.lock().unwrap() = fail;
    }

    pub fn scheduled_count(&self) -> usize {
        self.scheduled.lock().unwrap().len()
    }
}

impl AlarmScheduler for RecordingScheduler {
    fn schedule(&self, batch: &[AlarmRecord]) -> Result<(), ScheduleError> {
        if *self.fail.lock().unwrap() {
            return Err(ScheduleError::Rejected("exact alarms not permitted".into()));
        }
        *self.batches.lock().unwrap() += 1;
        self.scheduled.lock().unwrap().extend_from_slice(batch);
        Ok(())
    }

    fn cancel(&self, ids: &[i64]) -> Result<(), ScheduleError> {
        self.cancelled.lock().unwrap().extend_from_slice(ids);
        Ok(())
    }
}

/// Engine over an in-memory database. Must be called inside a tokio runtime.
pub fn engine(user: Option<&str>) -> (MedCare, Arc<RecordingScheduler>, Arc<StaticSession>) {
    engine_with_config(user, MedcareConfig::default())
}

pub fn engine_with_config(
    user: Option<&str>,
    config: MedcareConfig,
) -> (MedCare, Arc<RecordingScheduler>, Arc<StaticSession>) {
    let scheduler = Arc::new(RecordingScheduler::default());
    let session = Arc::new(match user {
        Some(u) => StaticSession::signed_in(u),
        None => StaticSession::signed_out(),
    });
    let app = MedCare::new(
        Arc::new(Mutex::new(test_db())),
        scheduler.clone(),
        session.clone(),
        Arc::new(config),
    );
    (app, scheduler, session)
}
