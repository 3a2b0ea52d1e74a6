use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct AddKnowledgeParams {
    #[schemars(description = "Text to remember. Long text is split into chunks automatically.")]
    pub text: String,

    #[schemars(description = "Where the text came from, e.g. 'notes', 'voice', 'email' (default: 'mcp')")]
    pub source: Option<String>,

    #[schemars(description = "Flat JSON object of extra metadata. Values must be strings, numbers or booleans.")]
    pub metadata: Option<serde_json::Value>,

    #[schemars(description = "Detect whether the text updates something already known and merge it (default: true). Set false to always add.")]
    pub smart: Option<bool>,
}
