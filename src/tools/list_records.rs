use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct ListRecordsParams {
    #[schemars(description = "Only records whose hospital name contains this text (case-insensitive)")]
    pub hospital: Option<String>,

    #[schemars(description = "Maximum number of records to return, newest first")]
    pub limit: Option<usize>,

    #[schemars(description = "User to list for. Defaults to the signed-in user.")]
    pub user: Option<String>,
}
