pub mod doctor;
pub mod export;
pub mod profile;
pub mod records;
pub mod reset;
pub mod schedule;

use anyhow::{bail, Result};
use std::sync::{Arc, Mutex};

use crate::app::MedCare;
use crate::config::MedcareConfig;
use crate::identity::StaticSession;
use crate::notify::LogScheduler;
use crate::schedule::types::Medicine;

/// Open the database and start the engine signed in as the configured user.
pub fn open_engine(config: &MedcareConfig) -> Result<MedCare> {
    let db_path = config.resolved_db_path();
    let conn = crate::db::open_database(&db_path)?;
    let session = Arc::new(StaticSession::signed_in(config.storage.default_user.clone()));
    Ok(MedCare::new(
        Arc::new(Mutex::new(conn)),
        Arc::new(LogScheduler),
        session,
        Arc::new(config.clone()),
    ))
}

/// Parse a `--med` argument: `name|dose|frequency[|duration[|instructions]]`.
pub fn parse_medicine(arg: &str) -> Result<Medicine> {
    let mut parts = arg.split('|').map(str::trim);
    let name = parts.next().unwrap_or_default();
    let dose = parts.next().unwrap_or_default();
    let frequency = parts.next().unwrap_or_default();
    if name.is_empty() || frequency.is_empty() {
        bail!("expected name|dose|frequency[|duration[|instructions]], got '{arg}'");
    }
    let duration = parts.next().unwrap_or_default();
    let instructions = parts.next().filter(|s| !s.is_empty()).map(str::to_string);
    Ok(Medicine {
        name: name.to_string(),
        dose: dose.to_string(),
        frequency: frequency.to_string(),
        duration: duration.to_string(),
        instructions,
    })
}
