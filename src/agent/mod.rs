//! The personal knowledge agent.
//!
//! [`Agent`] owns the knowledge store and the conversation log and wires the
//! ingestion and conversation pipelines over them. Every surface (CLI, MCP
//! server) goes through it.

pub mod conversation;
pub mod ingest;
pub mod intent;
pub mod merge;
pub mod prompt;
pub mod reframe;

use std::sync::Arc;

use serde::Serialize;
use tracing::info;

pub use conversation::{ConversationPipeline, QueryResult};
pub use ingest::{IngestAction, IngestDetails, IngestOutcome, IngestionPipeline};
pub use intent::{IntentClassifier, UpdateIntent};
pub use merge::KnowledgeMerger;
pub use reframe::QueryReframer;

use crate::config::LoreConfig;
use crate::db::{self, HealthReport};
use crate::embedding::{self, EmbeddingProvider};
use crate::error::Result;
use crate::generation::{self, GenerationProvider};
use crate::history::{ConversationLog, Message};
use crate::knowledge::{Chunker, KnowledgeChunk, KnowledgeStore, RawMetadata};

#[derive(Debug, Clone, Serialize)]
pub struct SessionStats {
    pub session_id: String,
    pub message_count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct AgentStats {
    pub total_documents: usize,
    pub embedding_model: String,
    pub llm_model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_session: Option<SessionStats>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ResetSummary {
    pub vector_documents_deleted: usize,
    pub sessions_deleted: usize,
    pub messages_deleted: usize,
}

pub struct Agent {
    store: KnowledgeStore,
    log: ConversationLog,
    ingestion: IngestionPipeline,
    conversation: ConversationPipeline,
    current_session: Option<String>,
}

impl Agent {
    /// Open both databases and connect to the configured model providers.
    pub fn from_config(config: &LoreConfig) -> Result<Self> {
        let embedder = embedding::create_provider(&config.embedding, &config.ollama)?;
        let generator = generation::create_provider(&config.generation, &config.ollama)?;

        let store = KnowledgeStore::open(
            config.knowledge_db_path(),
            embedder,
            &config.generation.model,
        )?;
        let log = ConversationLog::open(config.history_db_path())?;
        Self::new(store, log, generator, config)
    }

    /// Assemble an agent from already-open stores.
    pub fn new(
        store: KnowledgeStore,
        log: ConversationLog,
        generator: Arc<dyn GenerationProvider>,
        config: &LoreConfig,
    ) -> Result<Self> {
        let llm = &config.generation;
        let ingestion = IngestionPipeline::new(
            Chunker::from_config(&config.chunking)?,
            IntentClassifier::new(generator.clone(), llm.intent_temperature),
            KnowledgeMerger::new(generator.clone(), llm.merge_temperature),
            config.retrieval.related_search_k,
            config.ingest.overflow,
        );
        let conversation = ConversationPipeline::new(
            QueryReframer::new(generator.clone(), llm.reframe_temperature),
            generator,
            llm.temperature,
            config.retrieval.max_context_chunks,
            config.retrieval.history_limit,
        );

        Ok(Self {
            store,
            log,
            ingestion,
            conversation,
            current_session: None,
        })
    }

    /// An agent over in-memory databases. Nothing is persisted.
    pub fn in_memory(
        embedder: Arc<dyn EmbeddingProvider>,
        generator: Arc<dyn GenerationProvider>,
        config: &LoreConfig,
    ) -> Result<Self> {
        let conn = db::open_memory_knowledge_database(embedder.dimensions())?;
        let store = KnowledgeStore::new(conn, embedder, generator.model_name())?;
        let log = ConversationLog::new(db::open_memory_history_database()?);
        Self::new(store, log, generator, config)
    }

    pub fn store(&self) -> &KnowledgeStore {
        &self.store
    }

    pub fn log(&self) -> &ConversationLog {
        &self.log
    }

    /// Start a session and make it current.
    pub fn start_session(&mut self, metadata: &serde_json::Value) -> Result<String> {
        let session_id = self.log.create_session(metadata)?;
        self.current_session = Some(session_id.clone());
        Ok(session_id)
    }

    pub fn current_session(&self) -> Option<&str> {
        self.current_session.as_deref()
    }

    /// Store `text` as new knowledge, skipping intent detection.
    pub fn add(&mut self, text: &str, source: &str, metadata: &RawMetadata) -> Result<Vec<String>> {
        self.ingestion.add(&mut self.store, text, source, metadata)
    }

    /// Add `text` or merge it into what is already known.
    pub fn ingest(&mut self, text: &str, source: &str, metadata: &RawMetadata) -> Result<IngestOutcome> {
        self.ingestion.ingest(&mut self.store, text, source, metadata)
    }

    pub fn query(&self, question: &str, k: Option<usize>) -> Result<QueryResult> {
        self.conversation.query(&self.store, question, k)
    }

    /// Answer within an explicit session, or without history when `None`.
    pub fn answer(&mut self, session_id: Option<&str>, message: &str, use_context: bool) -> Result<String> {
        self.conversation
            .answer(&self.store, &mut self.log, session_id, message, use_context)
    }

    /// Answer within the current session, if one was started.
    pub fn chat(&mut self, message: &str, use_context: bool) -> Result<String> {
        let session = self.current_session.as_deref();
        self.conversation
            .answer(&self.store, &mut self.log, session, message, use_context)
    }

    pub fn complete(&self, prompt: &str) -> String {
        self.conversation.complete(prompt)
    }

    pub fn history(&self, session_id: &str, limit: usize) -> Result<Vec<Message>> {
        self.log.history(session_id, limit)
    }

    /// Delete knowledge chunks by id. Unknown ids are ignored.
    pub fn forget(&mut self, ids: &[String]) -> Result<usize> {
        self.store.delete(ids)
    }

    pub fn get(&self, ids: &[String]) -> Result<Vec<KnowledgeChunk>> {
        self.store.get_by_ids(ids)
    }

    pub fn list(&self, limit: usize) -> Result<Vec<KnowledgeChunk>> {
        self.store.list(limit)
    }

    pub fn stats(&self) -> Result<AgentStats> {
        let store = self.store.stats()?;
        let current_session = match &self.current_session {
            Some(id) => Some(SessionStats {
                session_id: id.clone(),
                message_count: self.log.message_count(id)?,
            }),
            None => None,
        };

        Ok(AgentStats {
            total_documents: store.total_documents,
            embedding_model: store.embedding_model,
            llm_model: store.llm_model,
            current_session,
        })
    }

    /// Wipe knowledge, sessions and messages. The current session is dropped.
    pub fn reset_all(&mut self) -> Result<ResetSummary> {
        let vector_documents_deleted = self.store.reset()?;
        let counts = self.log.reset()?;
        self.current_session = None;

        let summary = ResetSummary {
            vector_documents_deleted,
            sessions_deleted: counts.sessions,
            messages_deleted: counts.messages,
        };
        info!(?summary, "all data reset");
        Ok(summary)
    }

    /// Recompute every stored vector with the configured embedding model.
    pub fn re_embed(&mut self, progress: impl FnMut(usize, usize)) -> Result<usize> {
        self.store.re_embed_all(progress)
    }

    pub fn health(&self) -> Result<HealthReport> {
        db::check_database_health(self.store.connection(), self.log.connection())
    }
}
