pub mod classify_frequency;
pub mod list_records;
pub mod mark_dose;
pub mod notification_action;
pub mod save_prescription;
pub mod scan_prescription;
pub mod today_schedule;
pub mod week_history;

use base64::Engine;
use classify_frequency::ClassifyFrequencyParams;
use list_records::ListRecordsParams;
use mark_dose::MarkDoseParams;
use notification_action::NotificationActionParams;
use rmcp::handler::server::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::{tool, tool_handler, tool_router, ServerHandler};
use save_prescription::SavePrescriptionParams;
use scan_prescription::ScanPrescriptionParams;
use today_schedule::TodayScheduleParams;
use week_history::WeekHistoryParams;

use crate::app::MedCare;
use crate::notify::ActionEvent;
use crate::ocr::entry::manual_entry;
use crate::schedule::alarms::AlarmExtra;
use crate::schedule::frequency::classify;
use crate::schedule::types::{DoseSlot, LoggedStatus};

/// The MedCare MCP tool handler. Wraps the engine and exposes its flows via the
/// `#[tool_router]` macro. Every call resolves against the local clock.
#[derive(Clone)]
pub struct MedCareTools {
    tool_router: ToolRouter<Self>,
    app: MedCare,
}

#[tool_router]
impl MedCareTools {
    pub fn new(app: MedCare) -> Self {
        Self {
            tool_router: Self::tool_router(),
            app,
        }
    }

    fn user(&self, explicit: Option<String>) -> Result<String, String> {
        match explicit.filter(|u| !u.trim().is_empty()) {
            Some(user) => Ok(user),
            None => self.app.current_user().map_err(|e| e.to_string()),
        }
    }

    /// Save a prescription and register its reminder alarms.
    #[tool(description = "Save a prescription (hospital + medicines with frequency codes such as 1-0-1, BD, TDS, OD) and schedule its reminder alarms for the coming week.")]
    async fn save_prescription(
        &self,
        Parameters(params): Parameters<SavePrescriptionParams>,
    ) -> Result<String, String> {
        let user = self.user(params.user)?;
        let medicines = params.medicines.into_iter().map(Into::into).collect();
        let parsed = manual_entry(&params.hospital_name, medicines).map_err(|e| e.to_string())?;

        tracing::info!(
            user = %user,
            medicines = parsed.medicines.len(),
            "save_prescription called"
        );

        let now = chrono::Local::now();
        let outcome = self
            .app
            .save_parsed(&user, parsed, &now)
            .await
            .map_err(|e| format!("save failed: {e:#}"))?;

        serde_json::to_string(&outcome).map_err(|e| format!("serialization failed: {e}"))
    }

    /// Read a prescription photo through the extraction service.
    #[tool(description = "Extract hospital name and medicines from a prescription photo (base64). Review the result, then call save_prescription. If extraction fails, enter the prescription manually.")]
    async fn scan_prescription(
        &self,
        Parameters(params): Parameters<ScanPrescriptionParams>,
    ) -> Result<String, String> {
        let encoded = match params.image_base64.split_once(',') {
            Some((prefix, data)) if prefix.starts_with("data:") => data,
            _ => params.image_base64.as_str(),
        };
        let image = base64::engine::general_purpose::STANDARD
            .decode(encoded.trim())
            .map_err(|e| format!("image is not valid base64: {e}"))?;

        tracing::info!(bytes = image.len(), "scan_prescription called");

        let parsed = self
            .app
            .scan_prescription(&image)
            .await
            .map_err(|e| format!("{e}; enter the prescription manually with save_prescription"))?;

        serde_json::to_string(&parsed).map_err(|e| format!("serialization failed: {e}"))
    }

    /// Today's dose slots with their live status.
    #[tool(description = "Show today's dose slots (morning 8:00 AM, afternoon 1:30 PM, night 9:00 PM) with status locked/pending/taken/missed and the medicines due in each.")]
    async fn today_schedule(
        &self,
        Parameters(params): Parameters<TodayScheduleParams>,
    ) -> Result<String, String> {
        let user = self.user(params.user)?;
        let view = self
            .app
            .today(&user, &chrono::Local::now())
            .await
            .map_err(|e| format!("today failed: {e:#}"))?;

        serde_json::to_string(&view).map_err(|e| format!("serialization failed: {e}"))
    }

    /// Mark a dose slot as taken or missed.
    #[tool(description = "Mark today's morning/afternoon/night dose as taken or missed. Only slots whose time has been reached can be marked.")]
    async fn mark_dose(
        &self,
        Parameters(params): Parameters<MarkDoseParams>,
    ) -> Result<String, String> {
        let user = self.user(params.user)?;
        let slot: DoseSlot = params.slot.trim().to_lowercase().parse()?;
        let status: LoggedStatus = params.status.trim().parse()?;

        tracing::info!(user = %user, slot = %slot, status = status.as_str(), "mark_dose called");

        let log = self
            .app
            .mark_dose(&user, slot, status, &chrono::Local::now())
            .await
            .map_err(|e| format!("{e:#}"))?;

        serde_json::to_string(&log).map_err(|e| format!("serialization failed: {e}"))
    }

    /// Deliver a notification action as the OS would.
    #[tool(description = "Apply a reminder notification action (taken_all or missed_all) for the slot named in the alarm payload. Dropped silently when no user is signed in.")]
    async fn notification_action(
        &self,
        Parameters(params): Parameters<NotificationActionParams>,
    ) -> Result<String, String> {
        let event = ActionEvent {
            action_id: params.action_id,
            extra: AlarmExtra {
                prescription_id: params.prescription_id,
                slot_label: params.slot_label,
            },
        };
        let applied = self.app.handle_action(&event, &chrono::Local::now()).await;

        Ok(match applied {
            Some(log) => serde_json::json!({ "applied": true, "log": log }),
            None => serde_json::json!({ "applied": false }),
        }
        .to_string())
    }

    /// List saved prescriptions.
    #[tool(description = "List saved prescriptions, newest first, optionally filtered by hospital name.")]
    async fn list_records(
        &self,
        Parameters(params): Parameters<ListRecordsParams>,
    ) -> Result<String, String> {
        let user = self.user(params.user)?;
        let records = self
            .app
            .search_records(&user, params.hospital.as_deref().unwrap_or(""), params.limit)
            .await
            .map_err(|e| format!("list failed: {e:#}"))?;

        serde_json::to_string(&records).map_err(|e| format!("serialization failed: {e}"))
    }

    /// The last seven days of adherence.
    #[tool(description = "Show the last 7 days of adherence: perfect, partial, missed, or today.")]
    async fn week_history(
        &self,
        Parameters(params): Parameters<WeekHistoryParams>,
    ) -> Result<String, String> {
        let user = self.user(params.user)?;
        let days = self
            .app
            .week(&user, &chrono::Local::now())
            .await
            .map_err(|e| format!("history failed: {e:#}"))?;

        serde_json::to_string(&days).map_err(|e| format!("serialization failed: {e}"))
    }

    /// Explain which slots a frequency code maps to.
    #[tool(description = "Show which dose slots a frequency code maps to. Unrecognised codes fall back to morning.")]
    async fn classify_frequency(
        &self,
        Parameters(params): Parameters<ClassifyFrequencyParams>,
    ) -> Result<String, String> {
        let slots = classify(&params.code);
        Ok(serde_json::json!({ "code": params.code, "slots": slots }).to_string())
    }
}

#[tool_handler]
impl ServerHandler for MedCareTools {
    fn get_info(&self) -> rmcp::model::ServerInfo {
        rmcp::model::ServerInfo {
            instructions: Some(
                "MedCare tracks medication reminders. Use save_prescription to add a prescription, \
                 today_schedule to see what is due, and mark_dose to record taken or missed doses."
                    .into(),
            ),
            capabilities: rmcp::model::ServerCapabilities::builder()
                .enable_tools()
                .build(),
            ..Default::default()
        }
    }
}
