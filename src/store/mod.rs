//! Persistence collaborator over SQLite: prescription records, the adherence log,
//! user profiles, and the registered-alarm ledger.

pub mod adherence;
pub mod alarms;
pub mod profiles;
pub mod records;
