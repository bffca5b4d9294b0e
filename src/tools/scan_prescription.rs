//! MCP `scan_prescription` tool parameter definition.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Parameters for the `scan_prescription` MCP tool.
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct ScanPrescriptionParams {
    /// Base64 image bytes, with or without a `data:` URL prefix.
    #[schemars(description = "Prescription photo as base64 (a data: URL prefix is accepted)")]
    pub image_base64: String,
}
