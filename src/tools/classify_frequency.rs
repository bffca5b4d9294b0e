use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct ClassifyFrequencyParams {
    #[schemars(description = "Frequency code as written on the prescription, e.g. '1-0-1' or 'BD'")]
    pub code: String,
}
