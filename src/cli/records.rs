//! CLI prescription commands: `records`, `show`, `add` and `scan`.

use anyhow::{Context, Result};
use std::path::Path;

use crate::app::{MedCare, SaveOutcome};
use crate::ocr::entry::manual_entry;
use crate::schedule::frequency::classify;
use crate::schedule::types::PatientRecord;

/// List prescriptions, newest first.
pub async fn list(app: &MedCare, user: &str, hospital: Option<&str>, limit: Option<usize>) -> Result<()> {
    let records = app.search_records(user, hospital.unwrap_or(""), limit).await?;
    if records.is_empty() {
        println!("No prescriptions saved.");
        return Ok(());
    }
    for record in &records {
        println!(
            "{}  {:<28} {:<20} {} meds  [{}]",
            record.date_added,
            record.hospital_name,
            record.diagnosis,
            record.med_count(),
            record.status
        );
        println!("            id: {}", record.id);
    }
    Ok(())
}

/// Print a single prescription with the slots each medicine is taken in.
pub async fn show(app: &MedCare, user: &str, id: &str) -> Result<()> {
    let record = app
        .record(user, id)
        .await?
        .with_context(|| format!("no prescription with id {id}"))?;
    print_record(&record);
    Ok(())
}

/// Save a prescription typed on the command line.
pub async fn add(app: &MedCare, user: &str, hospital: &str, meds: &[String]) -> Result<()> {
    let medicines = meds
        .iter()
        .map(|m| super::parse_medicine(m))
        .collect::<Result<Vec<_>>>()?;
    let parsed = manual_entry(hospital, medicines)?;
    let outcome = app.save_parsed(user, parsed, &chrono::Local::now()).await?;
    print_outcome(&outcome);
    Ok(())
}

/// Extract a prescription from a photo and, with `save`, store it.
///
/// Extraction failures fall back to suggesting manual entry.
pub async fn scan(app: &MedCare, user: &str, image: &Path, save: bool) -> Result<()> {
    let bytes = std::fs::read(image)
        .with_context(|| format!("failed to read image: {}", image.display()))?;

    let parsed = match app.scan_prescription(&bytes).await {
        Ok(parsed) => parsed,
        Err(e) => {
            println!("Could not read the prescription: {e}");
            println!("Enter it manually instead:");
            println!("  medcare add --hospital \"<name>\" --med \"<name>|<dose>|<frequency>\"");
            return Ok(());
        }
    };

    println!("Hospital:    {}", parsed.hospital_name);
    println!("Confidence:  {:.0}%", parsed.confidence_score * 100.0);
    for flag in &parsed.risk_flags {
        println!("Risk flag:   {flag}");
    }
    for med in &parsed.medicines {
        println!("  - {} {} ({})", med.name, med.dose, med.frequency);
    }

    if save {
        let outcome = app.save_parsed(user, parsed, &chrono::Local::now()).await?;
        print_outcome(&outcome);
    } else {
        println!();
        println!("Review the list above, then re-run with --save to store it.");
    }
    Ok(())
}

fn print_record(record: &PatientRecord) {
    println!("Prescription: {}", record.id);
    println!("{}", "=".repeat(50));
    println!("  Hospital:   {}", record.hospital_name);
    println!("  Diagnosis:  {}", record.diagnosis);
    println!("  Added:      {}", record.date_added);
    println!("  Status:     {}", record.status);
    println!();
    println!("Medicines:");
    for med in &record.medicines {
        let slots: Vec<&str> = classify(&med.frequency).iter().map(|s| s.label()).collect();
        println!("  {} {}  [{}]  {}", med.name, med.dose, med.frequency, slots.join(", "));
        if !med.duration.is_empty() {
            println!("      for {}", med.duration);
        }
        if let Some(ref instructions) = med.instructions {
            println!("      {instructions}");
        }
    }
}

fn print_outcome(outcome: &SaveOutcome) {
    println!("Saved prescription {} ({} medicines).", outcome.record.id, outcome.record.med_count());
    match (&outcome.alarms, &outcome.alarm_error) {
        (Some(alarms), _) => println!(
            "Alarms: {} scheduled, {} kept, {} cancelled.",
            alarms.scheduled.len(),
            alarms.kept,
            alarms.cancelled.len()
        ),
        (None, Some(err)) => println!("Alarms could not be scheduled: {err}"),
        (None, None) => {}
    }
}
