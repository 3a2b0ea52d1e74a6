//! MCP `knowledge_stats` tool parameter definition.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Parameters for the `knowledge_stats` MCP tool.
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct KnowledgeStatsParams {
    /// Include the message count of this session.
    #[schemars(description = "Optional session id to report message counts for")]
    pub session_id: Option<String>,
}
