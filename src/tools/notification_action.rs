//! MCP `notification_action` tool parameter definition.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Parameters for the `notification_action` MCP tool, mirroring the payload the
/// OS hands back when an alarm action button is tapped.
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct NotificationActionParams {
    #[schemars(description = "Action id: 'taken_all' or 'missed_all'")]
    pub action_id: String,

    #[schemars(description = "Prescription id from the alarm's extra payload")]
    pub prescription_id: String,

    #[schemars(description = "Slot label from the alarm's extra payload, e.g. 'Night'")]
    pub slot_label: String,
}
