//! Core scheduling type definitions.
//!
//! Defines [`DoseSlot`] (the three fixed daily reminder windows), the prescription
//! data model ([`Medicine`], [`PatientRecord`]), the persisted adherence values
//! ([`LoggedStatus`]), and the derived statuses ([`SlotStatus`], [`DayStatus`]).

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

/// One of the three fixed daily reminder windows.
///
/// Ordering follows the clock: Morning < Afternoon < Night.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DoseSlot {
    /// 08:00.
    Morning,
    /// 13:30.
    Afternoon,
    /// 21:00.
    Night,
}

impl DoseSlot {
    pub const ALL: [DoseSlot; 3] = [DoseSlot::Morning, DoseSlot::Afternoon, DoseSlot::Night];

    /// Slot id used as the adherence log key.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Morning => "morning",
            Self::Afternoon => "afternoon",
            Self::Night => "night",
        }
    }

    /// Human-facing label, also carried as `slotLabel` in alarm payloads.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Morning => "Morning",
            Self::Afternoon => "Afternoon",
            Self::Night => "Night",
        }
    }

    /// Fixed wall-clock time of this slot. Not configurable per record.
    pub fn clock_time(&self) -> NaiveTime {
        let (h, m) = match self {
            Self::Morning => (8, 0),
            Self::Afternoon => (13, 30),
            Self::Night => (21, 0),
        };
        NaiveTime::from_hms_opt(h, m, 0).unwrap_or(NaiveTime::MIN)
    }

    /// Display form of the clock time, e.g. `"1:30 PM"`.
    pub fn display_time(&self) -> &'static str {
        match self {
            Self::Morning => "8:00 AM",
            Self::Afternoon => "1:30 PM",
            Self::Night => "9:00 PM",
        }
    }

    /// Parse the slot named by an alarm's `slotLabel` (first word, case-insensitive).
    pub fn from_label(label: &str) -> Option<Self> {
        label
            .split_whitespace()
            .next()
            .and_then(|word| word.to_lowercase().parse().ok())
    }
}

impl std::fmt::Display for DoseSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for DoseSlot {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "morning" => Ok(Self::Morning),
            "afternoon" => Ok(Self::Afternoon),
            "night" => Ok(Self::Night),
            _ => Err(format!("unknown dose slot: {s}")),
        }
    }
}

/// A persisted adherence value. Locked/Pending are never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LoggedStatus {
    Taken,
    Missed,
}

impl LoggedStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Taken => "Taken",
            Self::Missed => "Missed",
        }
    }
}

impl std::fmt::Display for LoggedStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for LoggedStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "taken" => Ok(Self::Taken),
            "missed" => Ok(Self::Missed),
            _ => Err(format!("unknown adherence status: {s}")),
        }
    }
}

/// Live status of a dose slot, derived from the clock and the adherence log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SlotStatus {
    /// Target time not reached yet.
    Locked,
    /// Target time reached, nothing recorded.
    Pending,
    Taken,
    Missed,
}

impl From<LoggedStatus> for SlotStatus {
    fn from(status: LoggedStatus) -> Self {
        match status {
            LoggedStatus::Taken => Self::Taken,
            LoggedStatus::Missed => Self::Missed,
        }
    }
}

impl std::fmt::Display for SlotStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Locked => "Locked",
            Self::Pending => "Pending",
            Self::Taken => "Taken",
            Self::Missed => "Missed",
        })
    }
}

/// Day-level classification for the 7-day history strip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DayStatus {
    Today,
    Perfect,
    Partial,
    Missed,
    Future,
}

impl std::fmt::Display for DayStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Today => "today",
            Self::Perfect => "perfect",
            Self::Partial => "partial",
            Self::Missed => "missed",
            Self::Future => "future",
        })
    }
}

/// A single medicine line on a prescription.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Medicine {
    #[serde(rename = "med_name")]
    pub name: String,
    #[serde(default)]
    pub dose: String,
    /// Free-text frequency code, e.g. `"1-0-1"`, `"BD"`, `"OD"`.
    #[serde(default)]
    pub frequency: String,
    #[serde(default)]
    pub duration: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
}

impl Medicine {
    /// Label used in alarm bodies: `"Dolo 650 (650mg)"`.
    pub fn alarm_label(&self) -> String {
        format!("{} ({})", self.name, self.dose)
    }
}

/// Treatment status of a saved record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecordStatus {
    #[serde(rename = "Ongoing Treatment")]
    OngoingTreatment,
    Recovered,
    Cured,
    Maintenance,
}

impl RecordStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OngoingTreatment => "Ongoing Treatment",
            Self::Recovered => "Recovered",
            Self::Cured => "Cured",
            Self::Maintenance => "Maintenance",
        }
    }
}

impl std::fmt::Display for RecordStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for RecordStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Ongoing Treatment" => Ok(Self::OngoingTreatment),
            "Recovered" => Ok(Self::Recovered),
            "Cured" => Ok(Self::Cured),
            "Maintenance" => Ok(Self::Maintenance),
            _ => Err(format!("unknown record status: {s}")),
        }
    }
}

/// A saved prescription. Medicines are immutable once the record is saved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatientRecord {
    pub id: String,
    pub hospital_name: String,
    pub diagnosis: String,
    /// `YYYY-MM-DD`.
    pub date_added: String,
    pub medicines: Vec<Medicine>,
    pub status: RecordStatus,
}

impl PatientRecord {
    pub fn med_count(&self) -> usize {
        self.medicines.len()
    }
}
