//! Manual entry, offered when extraction fails or the user prefers typing.

use super::ParsedPrescription;
use crate::schedule::types::Medicine;

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum EntryError {
    #[error("hospital name is required")]
    MissingHospital,
    #[error("at least one medicine with a name is required")]
    NoMedicines,
}

/// Validate typed prescription data.
///
/// Medicine rows with a blank name are dropped. The result carries full
/// confidence and no risk flags.
pub fn manual_entry(hospital_name: &str, medicines: Vec<Medicine>) -> Result<ParsedPrescription, EntryError> {
    let hospital_name = hospital_name.trim();
    if hospital_name.is_empty() {
        return Err(EntryError::MissingHospital);
    }

    let medicines: Vec<Medicine> = medicines
        .into_iter()
        .filter(|m| !m.name.trim().is_empty())
        .collect();
    if medicines.is_empty() {
        return Err(EntryError::NoMedicines);
    }

    Ok(ParsedPrescription {
        hospital_name: hospital_name.to_string(),
        medicines,
        confidence_score: 1.0,
        risk_flags: Vec::new(),
    })
}
