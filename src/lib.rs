//! Medication reminders and adherence tracking.
//!
//! MedCare turns saved prescriptions into a daily dose schedule. Each medicine's
//! free-text frequency code (`"1-0-1"`, `"BD"`, `"TDS"`, `"OD"`, ...) is mapped onto
//! three fixed dose slots:
//!
//! | Slot | Time | Example codes |
//! |------|------|---------------|
//! | **Morning** | 8:00 AM | `1-0-0`, `OD`, `morning` |
//! | **Afternoon** | 1:30 PM | `1-1-1`, `TDS`, `TID` |
//! | **Night** | 9:00 PM | `0-0-1`, `1-0-1`, `BD`, `night` |
//!
//! Saving a prescription projects a week of alarms and reconciles them with what
//! was registered before. The adherence log records Taken/Missed per user, day and
//! slot, written either from the app or from a notification action button.
//!
//! # Architecture
//!
//! - **Storage**: SQLite (WAL) for prescriptions, the adherence log, profiles and
//!   the registered-alarm ledger
//! - **Writes**: one actor task serializes every adherence write and streams the
//!   resulting day logs to subscribers
//! - **Scheduling**: alarms go through the [`notify::AlarmScheduler`] trait
//! - **Transport**: MCP over stdio or streamable HTTP, plus a terminal CLI
//!
//! # Modules
//!
//! - [`schedule`]: frequency interpretation, alarm projection, slot and day status
//! - [`store`]: SQLite persistence for records, adherence, profiles and alarms
//! - [`sync`]: the adherence write actor and live subscriptions
//! - [`notify`]: OS scheduling boundary and alarm reconciliation
//! - [`app`]: end-to-end flows used by the CLI and MCP tools

pub mod app;
pub mod cli;
pub mod config;
pub mod db;
pub mod identity;
pub mod notify;
pub mod ocr;
pub mod schedule;
pub mod server;
pub mod store;
pub mod sync;
pub mod tools;
