//! CLI `doctor` command: run database diagnostics and print a health report.

use anyhow::{Context, Result};

use crate::config::MedcareConfig;
use crate::db;

/// Run database diagnostics and print a health report.
pub fn doctor(config: &MedcareConfig) -> Result<()> {
    let db_path = config.resolved_db_path();

    if !db_path.exists() {
        println!("Database: not found at {}", db_path.display());
        println!("Run `medcare add` or `medcare serve` to initialize.");
        return Ok(());
    }

    let file_size = std::fs::metadata(&db_path)
        .map(|m| m.len())
        .unwrap_or(0);

    let conn = db::open_database(&db_path)
        .context("failed to open database (may be corrupt)")?;

    let report = db::check_database_health(&conn)
        .context("failed to run health check")?;

    let upcoming = crate::store::alarms::upcoming_count(
        &conn,
        &config.storage.default_user,
        chrono::Utc::now(),
    )?;

    println!("MedCare Health Report");
    println!("=====================");
    println!();
    println!("Database:          {}", db_path.display());
    println!("File size:         {}", format_bytes(file_size));
    println!("Schema version:    {}", report.schema_version);
    println!("User:              {}", config.storage.default_user);
    println!(
        "OCR endpoint:      {}",
        if config.ocr.endpoint.is_empty() { "(not configured)" } else { &config.ocr.endpoint }
    );
    println!();
    println!("Row counts:");
    println!("  Prescriptions:   {}", report.record_count);
    println!("  Adherence log:   {}", report.adherence_count);
    println!("  Alarm ledger:    {}", report.alarm_count);
    println!("  Upcoming alarms: {upcoming}");
    println!("  Profiles:        {}", report.profile_count);
    println!();
    if report.integrity_ok {
        println!("Integrity check:   PASSED");
    } else {
        println!("Integrity check:   FAILED ({})", report.integrity_details);
        println!();
        println!("Recovery steps:");
        println!("  1. Restore from a backup: cp backup.db ~/.medcare/medcare.db");
        println!("  2. Or export what is still readable:");
        println!("     medcare export > backup.json");
    }

    Ok(())
}

fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{bytes} B")
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_sizes() {
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(2048), "2.0 KB");
        assert_eq!(format_bytes(3 * 1024 * 1024), "3.0 MB");
    }
}
