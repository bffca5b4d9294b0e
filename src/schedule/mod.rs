pub mod adherence;
pub mod alarms;
pub mod frequency;
pub mod types;

pub use adherence::{aggregate_day, resolve_today, week_strip, AdherenceLog, DayEntry, SlotCard};
pub use alarms::{project, AlarmExtra, AlarmRecord};
pub use frequency::{classify, SlotPlan};
pub use types::{DayStatus, DoseSlot, LoggedStatus, Medicine, PatientRecord, RecordStatus, SlotStatus};
