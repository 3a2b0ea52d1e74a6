use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct StartSessionParams {
    #[schemars(description = "JSON object stored with the session, e.g. {\"mode\": \"mcp\"}")]
    pub metadata: Option<serde_json::Value>,
}
