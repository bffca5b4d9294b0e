//! Top-level flows: what the CLI, the MCP tools and a platform shell call into.
//!
//! [`MedCare`] owns the shared connection, the adherence actor, the platform
//! scheduler and the session source. Every flow takes `now` explicitly so the
//! whole engine can be driven from tests with fixed instants.

use std::sync::{Arc, Mutex};
use std::time::Duration as StdDuration;

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use rusqlite::Connection;
use serde::Serialize;
use tokio::sync::watch;

use crate::config::MedcareConfig;
use crate::identity::SessionProvider;
use crate::notify::{self, ActionEvent, AlarmScheduler, Reconciliation};
use crate::ocr::{ExtractionError, OcrClient, ParsedPrescription};
use crate::schedule::adherence::{self, AdherenceLog, DayEntry, SlotCard, STRIP_DAYS};
use crate::schedule::alarms::project;
use crate::schedule::types::{DayStatus, DoseSlot, LoggedStatus, PatientRecord, SlotStatus};
use crate::store;
use crate::store::adherence::WriteSource;
use crate::store::profiles::UserProfile;
use crate::sync::{self, AdherenceSync, SyncError};

/// Today's slot cards and the day's aggregate status.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TodayView {
    pub date: NaiveDate,
    pub slots: Vec<SlotCard>,
    pub day_status: DayStatus,
}

impl TodayView {
    pub fn build<Tz: TimeZone>(records: &[PatientRecord], now: &DateTime<Tz>, log: &AdherenceLog) -> Self {
        let slots = adherence::resolve_today(records, now, log);
        let day_status = adherence::aggregate_day(slots.iter().map(|s| s.status), DayStatus::Today);
        Self {
            date: now.date_naive(),
            slots,
            day_status,
        }
    }
}

/// Result of saving a prescription. The record is saved even when alarm
/// registration fails; `alarm_error` then says why.
#[derive(Debug, Serialize)]
pub struct SaveOutcome {
    pub record: PatientRecord,
    pub alarms: Option<Reconciliation>,
    pub alarm_error: Option<String>,
}

#[derive(Clone)]
pub struct MedCare {
    db: Arc<Mutex<Connection>>,
    sync: AdherenceSync,
    scheduler: Arc<dyn AlarmScheduler>,
    session: Arc<dyn SessionProvider>,
    config: Arc<MedcareConfig>,
}

impl MedCare {
    /// Wire up the engine. Must be called inside a tokio runtime; the adherence
    /// actor is spawned here.
    pub fn new(
        db: Arc<Mutex<Connection>>,
        scheduler: Arc<dyn AlarmScheduler>,
        session: Arc<dyn SessionProvider>,
        config: Arc<MedcareConfig>,
    ) -> Self {
        if let Err(e) = scheduler.prepare(&notify::medication_action_type(), &notify::medication_channel()) {
            tracing::warn!(error = %e, "failed to register notification actions");
        }
        let sync = AdherenceSync::spawn(Arc::clone(&db));
        Self {
            db,
            sync,
            scheduler,
            session,
            config,
        }
    }

    pub fn config(&self) -> &MedcareConfig {
        &self.config
    }

    pub fn sync(&self) -> &AdherenceSync {
        &self.sync
    }

    /// The signed-in user, if any.
    pub fn current_user(&self) -> Result<String, SyncError> {
        self.session.current_user().ok_or(SyncError::NoSession)
    }

    /// Save a new prescription, then bring its alarms in line with it.
    pub async fn save_prescription<Tz>(
        &self,
        user_id: &str,
        record: PatientRecord,
        now: &DateTime<Tz>,
    ) -> Result<SaveOutcome>
    where
        Tz: TimeZone + Send + Sync + 'static,
        Tz::Offset: Send + Sync,
    {
        let scheduler = Arc::clone(&self.scheduler);
        let user = user_id.to_string();
        let now = now.clone();
        let window_days = self.config.schedule.window_days;

        let outcome = self
            .with_db(move |conn| {
                store::records::save_record(conn, &user, &record)
                    .with_context(|| format!("failed to save record {}", record.id))?;

                let fresh = project(&record, &now, window_days);
                let reconciled = notify::reconcile(
                    conn,
                    scheduler.as_ref(),
                    &user,
                    &record.id,
                    fresh,
                    now.with_timezone(&Utc),
                );
                let (alarms, alarm_error) = match reconciled {
                    Ok(r) => (Some(r), None),
                    Err(e) => {
                        tracing::warn!(prescription = %record.id, error = %e, "alarm registration failed, record kept");
                        (None, Some(e.to_string()))
                    }
                };
                Ok(SaveOutcome {
                    record,
                    alarms,
                    alarm_error,
                })
            })
            .await?;

        tracing::info!(
            user = %user_id,
            prescription = %outcome.record.id,
            medicines = outcome.record.med_count(),
            alarms = outcome.alarms.as_ref().map(|a| a.scheduled.len()).unwrap_or(0),
            "prescription saved"
        );
        Ok(outcome)
    }

    /// Fill defaults on reviewed OCR or manual-entry data and save it.
    pub async fn save_parsed<Tz>(
        &self,
        user_id: &str,
        parsed: ParsedPrescription,
        now: &DateTime<Tz>,
    ) -> Result<SaveOutcome>
    where
        Tz: TimeZone + Send + Sync + 'static,
        Tz::Offset: Send + Sync,
    {
        let record = parsed.into_record(now.date_naive());
        self.save_prescription(user_id, record, now).await
    }

    /// Re-project every saved prescription from `now`, e.g. on app start.
    pub async fn refresh_alarms<Tz>(&self, user_id: &str, now: &DateTime<Tz>) -> Result<Vec<Reconciliation>>
    where
        Tz: TimeZone + Send + Sync + 'static,
        Tz::Offset: Send + Sync,
    {
        let scheduler = Arc::clone(&self.scheduler);
        let user = user_id.to_string();
        let now = now.clone();
        let window_days = self.config.schedule.window_days;

        self.with_db(move |conn| {
            let records = store::records::get_records(conn, &user)?;
            let mut outcomes = Vec::with_capacity(records.len());
            for record in &records {
                let fresh = project(record, &now, window_days);
                match notify::reconcile(conn, scheduler.as_ref(), &user, &record.id, fresh, now.with_timezone(&Utc)) {
                    Ok(r) => outcomes.push(r),
                    Err(e) => tracing::warn!(prescription = %record.id, error = %e, "alarm refresh failed"),
                }
            }
            Ok(outcomes)
        })
        .await
    }

    /// Extract a prescription from an image. On error, offer manual entry instead.
    pub async fn scan_prescription(&self, image: &[u8]) -> Result<ParsedPrescription, ExtractionError> {
        OcrClient::new(&self.config.ocr)?.extract(image).await
    }

    pub async fn records(&self, user_id: &str) -> Result<Vec<PatientRecord>> {
        let user = user_id.to_string();
        self.with_db(move |conn| store::records::get_records(conn, &user)).await
    }

    /// Records whose hospital name contains `query`, newest first.
    pub async fn search_records(
        &self,
        user_id: &str,
        query: &str,
        limit: Option<usize>,
    ) -> Result<Vec<PatientRecord>> {
        let records = self.records(user_id).await?;
        Ok(store::records::search_records(&records, query, limit))
    }

    pub async fn record(&self, user_id: &str, id: &str) -> Result<Option<PatientRecord>> {
        let user = user_id.to_string();
        let id = id.to_string();
        self.with_db(move |conn| store::records::get_record(conn, &user, &id)).await
    }

    /// Resolve today's view for `user_id`.
    pub async fn today<Tz: TimeZone>(&self, user_id: &str, now: &DateTime<Tz>) -> Result<TodayView> {
        let records = self.records(user_id).await?;
        let log = self.sync.read(user_id, now.date_naive()).await?;
        Ok(TodayView::build(&records, now, &log))
    }

    /// The seven-day history strip ending today.
    pub async fn week<Tz: TimeZone>(&self, user_id: &str, now: &DateTime<Tz>) -> Result<Vec<DayEntry>> {
        let today = now.date_naive();
        let from = today - Duration::days(STRIP_DAYS - 1);
        let user = user_id.to_string();
        let (records, logs) = self
            .with_db(move |conn| {
                let records = store::records::get_records(conn, &user)?;
                let logs = store::adherence::get_adherence_range(conn, &user, from, today)?;
                Ok((records, logs))
            })
            .await?;
        Ok(adherence::week_strip(&records, now, &logs))
    }

    /// Mark a slot from the app.
    ///
    /// The slot must be on today's schedule and already due; a Locked slot is
    /// refused. Marking an already logged slot overwrites it.
    pub async fn mark_dose<Tz: TimeZone>(
        &self,
        user_id: &str,
        slot: DoseSlot,
        status: LoggedStatus,
        now: &DateTime<Tz>,
    ) -> Result<AdherenceLog> {
        let view = self.today(user_id, now).await?;
        let card = view
            .slots
            .iter()
            .find(|c| c.slot == slot)
            .with_context(|| format!("{} is not on today's schedule", slot.label()))?;
        anyhow::ensure!(
            card.status != SlotStatus::Locked,
            "{} dose is not due until {}",
            slot.label(),
            slot.display_time()
        );

        let log = self
            .sync
            .mark_slot(user_id, view.date, slot, status, WriteSource::App)
            .await
            .context("failed to record dose")?;
        tracing::info!(user = %user_id, slot = %slot, status = status.as_str(), "dose marked");
        Ok(log)
    }

    /// Notification action callback. See [`sync::on_action_performed`].
    pub async fn handle_action<Tz: TimeZone>(&self, event: &ActionEvent, now: &DateTime<Tz>) -> Option<AdherenceLog> {
        sync::on_action_performed(&self.sync, self.session.as_ref(), event, now.date_naive()).await
    }

    pub async fn profile(&self, user_id: &str) -> Result<Option<UserProfile>> {
        let user = user_id.to_string();
        self.with_db(move |conn| store::profiles::get_profile(conn, &user)).await
    }

    pub async fn set_profile(&self, profile: UserProfile) -> Result<()> {
        self.with_db(move |conn| store::profiles::upsert_profile(conn, &profile)).await
    }

    pub async fn upcoming_alarms(&self, user_id: &str, now: DateTime<Utc>) -> Result<u64> {
        let user = user_id.to_string();
        self.with_db(move |conn| store::alarms::upcoming_count(conn, &user, now)).await
    }

    /// Keep a live [`TodayView`] for `user_id`.
    ///
    /// The view is recomputed every `schedule.tick_secs` and on every change to the
    /// day's log. When the clock crosses midnight the feed moves to the new day.
    /// The task stops once every receiver is dropped.
    pub async fn spawn_today_feed<Tz, F>(&self, user_id: &str, clock: F) -> Result<watch::Receiver<TodayView>>
    where
        Tz: TimeZone + Send + Sync + 'static,
        Tz::Offset: Send + Sync,
        F: Fn() -> DateTime<Tz> + Send + Sync + 'static,
    {
        let now = clock();
        let mut subscription = self.sync.subscribe(user_id, now.date_naive()).await?;
        let mut log = subscription.next().await.unwrap_or_default();
        let records = self.records(user_id).await?;
        let (tx, rx) = watch::channel(TodayView::build(&records, &now, &log));

        let app = self.clone();
        let user = user_id.to_string();
        let period = StdDuration::from_secs(self.config.schedule.tick_secs.max(1));

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.tick().await;
            loop {
                tokio::select! {
                    _ = ticker.tick() => {}
                    next = subscription.next() => match next {
                        Some(updated) => log = updated,
                        None => break,
                    },
                    _ = tx.closed() => break,
                }

                let now = clock();
                if now.date_naive() != subscription.date() {
                    match app.sync.subscribe(&user, now.date_naive()).await {
                        Ok(fresh) => {
                            subscription = fresh;
                            log = subscription.next().await.unwrap_or_default();
                        }
                        Err(e) => {
                            tracing::warn!(user = %user, error = %e, "today feed lost adherence sync");
                            break;
                        }
                    }
                }

                let records = match app.records(&user).await {
                    Ok(records) => records,
                    Err(e) => {
                        tracing::warn!(user = %user, error = %e, "today feed could not load records");
                        continue;
                    }
                };
                if tx.send(TodayView::build(&records, &now, &log)).is_err() {
                    break;
                }
            }
            tracing::debug!(user = %user, "today feed stopped");
        });

        Ok(rx)
    }

    async fn with_db<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let db = Arc::clone(&self.db);
        tokio::task::spawn_blocking(move || {
            let mut conn = db
                .lock()
                .map_err(|e| anyhow::anyhow!("db lock poisoned: {e}"))?;
            f(&mut conn)
        })
        .await
        .context("db task failed")?
    }
}
