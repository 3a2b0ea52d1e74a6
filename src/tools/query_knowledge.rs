use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct QueryKnowledgeParams {
    #[schemars(description = "Natural language question to search the knowledge base with")]
    pub question: String,

    #[schemars(description = "Maximum number of chunks to return (default: retrieval.max_context_chunks)")]
    pub k: Option<usize>,
}
