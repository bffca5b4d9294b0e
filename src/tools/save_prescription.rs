//! MCP `save_prescription` tool parameter definition.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::schedule::types::Medicine;

/// One medicine line as typed or reviewed by the user.
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct MedicineInput {
    #[schemars(description = "Medicine name, e.g. 'Dolo 650'")]
    pub name: String,

    #[schemars(description = "Dose, e.g. '650mg'")]
    #[serde(default)]
    pub dose: String,

    #[schemars(description = "Frequency code, e.g. '1-0-1', 'BD', 'TDS', 'OD', 'morning', 'night'")]
    #[serde(default)]
    pub frequency: String,

    #[schemars(description = "Treatment duration, e.g. '5 days'")]
    pub duration: Option<String>,

    #[schemars(description = "Extra instructions, e.g. 'after food'")]
    pub instructions: Option<String>,
}

impl From<MedicineInput> for Medicine {
    fn from(input: MedicineInput) -> Self {
        Medicine {
            name: input.name,
            dose: input.dose,
            frequency: input.frequency,
            duration: input.duration.unwrap_or_default(),
            instructions: input.instructions.filter(|s| !s.trim().is_empty()),
        }
    }
}

/// Parameters for the `save_prescription` MCP tool.
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct SavePrescriptionParams {
    #[schemars(description = "Hospital or clinic that issued the prescription")]
    pub hospital_name: String,

    #[schemars(description = "Medicines on the prescription. Rows without a name are dropped.")]
    pub medicines: Vec<MedicineInput>,

    #[schemars(description = "User to save for. Defaults to the signed-in user.")]
    pub user: Option<String>,
}
