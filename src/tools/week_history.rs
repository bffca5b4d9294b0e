use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct WeekHistoryParams {
    #[schemars(description = "User to resolve for. Defaults to the signed-in user.")]
    pub user: Option<String>,
}
