use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct TodayScheduleParams {
    #[schemars(description = "User to resolve for. Defaults to the signed-in user.")]
    pub user: Option<String>,
}
