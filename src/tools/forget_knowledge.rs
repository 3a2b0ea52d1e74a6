use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct ForgetKnowledgeParams {
    #[schemars(description = "Chunk ids to delete. Unknown ids are ignored.")]
    pub ids: Vec<String>,

    #[schemars(description = "Must be true; deletion is permanent")]
    pub confirm: bool,
}
