//! MCP `mark_dose` tool parameter definition.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Parameters for the `mark_dose` MCP tool.
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct MarkDoseParams {
    #[schemars(description = "Dose slot: 'morning', 'afternoon' or 'night'")]
    pub slot: String,

    #[schemars(description = "Outcome: 'taken' or 'missed'")]
    pub status: String,

    #[schemars(description = "User to mark for. Defaults to the signed-in user.")]
    pub user: Option<String>,
}
