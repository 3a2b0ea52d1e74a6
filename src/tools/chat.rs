use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct ChatParams {
    #[schemars(description = "The user's message")]
    pub message: String,

    #[schemars(description = "Session to read history from and record the turn in. Omit for a one-off answer.")]
    pub session_id: Option<String>,

    #[schemars(description = "Ground the answer in knowledge-base search results (default: true)")]
    pub use_context: Option<bool>,
}
