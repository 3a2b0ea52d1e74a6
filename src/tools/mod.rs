pub mod add_knowledge;
pub mod chat;
pub mod forget_knowledge;
pub mod knowledge_stats;
pub mod query_knowledge;
pub mod start_session;

use add_knowledge::AddKnowledgeParams;
use chat::ChatParams;
use forget_knowledge::ForgetKnowledgeParams;
use knowledge_stats::KnowledgeStatsParams;
use query_knowledge::QueryKnowledgeParams;
use rmcp::handler::server::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::{tool, tool_handler, tool_router, ServerHandler};
use serde::Serialize;
use start_session::StartSessionParams;
use std::sync::{Arc, Mutex};

use lore::agent::{Agent, SessionStats};
use lore::knowledge::types::{metadata_from_json, to_raw};
use lore::knowledge::RawMetadata;

/// The Lore MCP tool handler. Holds the shared agent and exposes all MCP
/// tools via the `#[tool_router]` macro.
#[derive(Clone)]
pub struct LoreTools {
    tool_router: ToolRouter<Self>,
    agent: Arc<Mutex<Agent>>,
}

fn to_json<T: Serialize>(value: &T) -> Result<String, String> {
    serde_json::to_string(value).map_err(|e| format!("serialization failed: {e}"))
}

fn raw_metadata(value: Option<&serde_json::Value>) -> Result<RawMetadata, String> {
    match value {
        None => Ok(RawMetadata::new()),
        Some(value) => metadata_from_json(value)
            .map(|m| to_raw(&m))
            .map_err(|e| e.to_string()),
    }
}

#[tool_router]
impl LoreTools {
    pub fn new(agent: Arc<Mutex<Agent>>) -> Self {
        Self {
            tool_router: Self::tool_router(),
            agent,
        }
    }

    /// Run `f` against the agent on the blocking pool. Model calls and SQLite
    /// are synchronous.
    async fn with_agent<T, F>(&self, f: F) -> Result<T, String>
    where
        F: FnOnce(&mut Agent) -> lore::error::Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let agent = Arc::clone(&self.agent);
        tokio::task::spawn_blocking(move || {
            let mut agent = agent
                .lock()
                .map_err(|e| format!("agent lock poisoned: {e}"))?;
            f(&mut agent).map_err(|e| e.to_string())
        })
        .await
        .map_err(|e| format!("agent task failed: {e}"))?
    }

    #[tool(description = "Add text to the personal knowledge base. By default the text is checked for whether it updates something already known (e.g. 'my rent is now 1400'); if so it is merged into that entry instead of stored twice.")]
    async fn add_knowledge(
        &self,
        Parameters(params): Parameters<AddKnowledgeParams>,
    ) -> Result<String, String> {
        if params.text.trim().is_empty() {
            return Err("text must not be empty".into());
        }
        let metadata = raw_metadata(params.metadata.as_ref())?;
        let source = params.source.unwrap_or_else(|| "mcp".into());
        let smart = params.smart.unwrap_or(true);
        let text = params.text;

        tracing::info!(text_len = text.len(), source = %source, smart, "add_knowledge called");

        if smart {
            let outcome = self
                .with_agent(move |agent| agent.ingest(&text, &source, &metadata))
                .await?;
            to_json(&outcome)
        } else {
            let ids = self
                .with_agent(move |agent| agent.add(&text, &source, &metadata))
                .await?;
            to_json(&serde_json::json!({ "action": "added", "doc_ids": ids }))
        }
    }

    #[tool(description = "Search the knowledge base. The question is rewritten with explicit dates before searching. Returns matching chunks with metadata and cosine distances (smaller is closer).")]
    async fn query_knowledge(
        &self,
        Parameters(params): Parameters<QueryKnowledgeParams>,
    ) -> Result<String, String> {
        tracing::info!(question = %params.question, k = ?params.k, "query_knowledge called");
        let question = params.question;
        let k = params.k;
        let result = self
            .with_agent(move |agent| agent.query(&question, k))
            .await?;
        to_json(&result)
    }

    #[tool(description = "Ask the assistant a question answered from the knowledge base and, when a session_id is given, the session's recent history. The turn is recorded in that session.")]
    async fn chat(&self, Parameters(params): Parameters<ChatParams>) -> Result<String, String> {
        tracing::info!(session = ?params.session_id, "chat called");
        let use_context = params.use_context.unwrap_or(true);
        let session_id = params.session_id;
        let message = params.message;
        let response = self
            .with_agent(move |agent| agent.answer(session_id.as_deref(), &message, use_context))
            .await?;
        to_json(&serde_json::json!({ "response": response }))
    }

    #[tool(description = "Start a conversation session. Pass the returned session_id to chat to keep history.")]
    async fn start_session(
        &self,
        Parameters(params): Parameters<StartSessionParams>,
    ) -> Result<String, String> {
        let metadata = params
            .metadata
            .unwrap_or_else(|| serde_json::json!({ "mode": "mcp" }));
        let session_id = self
            .with_agent(move |agent| agent.start_session(&metadata))
            .await?;
        tracing::info!(session_id = %session_id, "session started");
        to_json(&serde_json::json!({ "session_id": session_id }))
    }

    #[tool(description = "Permanently delete knowledge chunks by id. Requires confirm=true.")]
    async fn forget_knowledge(
        &self,
        Parameters(params): Parameters<ForgetKnowledgeParams>,
    ) -> Result<String, String> {
        if !params.confirm {
            return Err("confirm must be true to delete knowledge".into());
        }
        let ids = params.ids;
        let requested = ids.len();
        let deleted = self.with_agent(move |agent| agent.forget(&ids)).await?;
        tracing::info!(requested, deleted, "forget_knowledge completed");
        to_json(&serde_json::json!({ "requested": requested, "deleted": deleted }))
    }

    #[tool(description = "Knowledge base statistics: chunk count and the embedding and language models in use.")]
    async fn knowledge_stats(
        &self,
        Parameters(params): Parameters<KnowledgeStatsParams>,
    ) -> Result<String, String> {
        let session_id = params.session_id;
        let stats = self
            .with_agent(move |agent| {
                let mut stats = agent.stats()?;
                if let Some(id) = session_id {
                    stats.current_session = Some(SessionStats {
                        message_count: agent.log().message_count(&id)?,
                        session_id: id,
                    });
                }
                Ok(stats)
            })
            .await?;
        to_json(&stats)
    }
}

#[tool_handler]
impl ServerHandler for LoreTools {
    fn get_info(&self) -> rmcp::model::ServerInfo {
        rmcp::model::ServerInfo {
            instructions: Some(
                "Lore is a personal knowledge base. Use add_knowledge to remember things, \
                 query_knowledge to search, and chat for answers grounded in what was stored."
                    .into(),
            ),
            capabilities: rmcp::model::ServerCapabilities::builder()
                .enable_tools()
                .build(),
            ..Default::default()
        }
    }
}
