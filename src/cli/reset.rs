//! CLI `reset` command: delete all data after user confirmation.

use anyhow::{bail, Result};
use std::io::Write;

use crate::config::MedcareConfig;

/// Delete all prescriptions, adherence history, alarms and profiles after user confirmation.
///
/// Alarms already handed to the platform scheduler are not cancelled.
pub fn reset(config: &MedcareConfig) -> Result<()> {
    let db_path = config.resolved_db_path();

    println!("WARNING: This will permanently delete ALL prescriptions, adherence history and profiles.");
    println!("Database: {}", db_path.display());
    print!("\nType YES to confirm: ");
    std::io::stdout().flush()?;

    let mut input = String::new();
    std::io::stdin().read_line(&mut input)?;

    if input.trim() != "YES" {
        bail!("reset cancelled");
    }

    let conn = crate::db::open_database(&db_path)?;

    conn.execute_batch(
        "DELETE FROM alarm_ledger;
         DELETE FROM adherence_log;
         DELETE FROM records;
         DELETE FROM profiles;",
    )?;

    println!("All data deleted. Database reset complete.");
    Ok(())
}
