use std::collections::BTreeMap;

use anyhow::Result;
use chrono::NaiveDate;
use serde::Serialize;

use crate::config::MedcareConfig;
use crate::schedule::adherence::AdherenceLog;
use crate::schedule::types::PatientRecord;
use crate::store::profiles::UserProfile;

/// Export format: one user's prescriptions, adherence history and profile.
#[derive(Debug, Serialize)]
struct ExportData {
    user_id: String,
    profile: Option<UserProfile>,
    records: Vec<PatientRecord>,
    adherence: BTreeMap<NaiveDate, AdherenceLog>,
}

/// Export the configured user's data as JSON to stdout.
pub fn export(config: &MedcareConfig) -> Result<()> {
    let db_path = config.resolved_db_path();
    let conn = crate::db::open_database(&db_path)?;
    let user = &config.storage.default_user;

    let from = NaiveDate::from_ymd_opt(1, 1, 1).unwrap_or(NaiveDate::MIN);
    let to = NaiveDate::from_ymd_opt(9999, 12, 31).unwrap_or(NaiveDate::MAX);

    let data = ExportData {
        user_id: user.clone(),
        profile: crate::store::profiles::get_profile(&conn, user)?,
        records: crate::store::records::get_records(&conn, user)?,
        adherence: crate::store::adherence::get_adherence_range(&conn, user, from, to)?,
    };

    let json = serde_json::to_string_pretty(&data)?;
    println!("{json}");

    eprintln!(
        "Exported {} prescriptions and {} days of adherence.",
        data.records.len(),
        data.adherence.len()
    );

    Ok(())
}
