//! Retrieval-augmented answering.
//!
//! `query` is read-only: it reframes, searches and reports. `answer` adds
//! session history and the generated reply, and records both turns when a
//! session is active. Gateway failures during `answer` turn into an
//! explanatory reply instead of an error.

use std::sync::Arc;

use chrono::Local;
use serde::Serialize;
use tracing::{debug, warn};

use super::prompt::build_chat_prompt;
use super::reframe::QueryReframer;
use crate::error::{LoreError, Result};
use crate::generation::GenerationProvider;
use crate::history::{ConversationLog, Role};
use crate::knowledge::{KnowledgeStore, Metadata};

/// What a knowledge query retrieved.
#[derive(Debug, Clone, Serialize)]
pub struct QueryResult {
    /// The question as the user asked it.
    pub question: String,
    pub reframed_question: String,
    pub context: Vec<String>,
    pub metadata: Vec<Metadata>,
    pub distances: Vec<f64>,
    pub ids: Vec<String>,
}

impl QueryResult {
    fn empty(question: &str) -> Self {
        Self {
            question: question.to_string(),
            reframed_question: question.to_string(),
            context: Vec::new(),
            metadata: Vec::new(),
            distances: Vec::new(),
            ids: Vec::new(),
        }
    }
}

pub struct ConversationPipeline {
    reframer: QueryReframer,
    generator: Arc<dyn GenerationProvider>,
    temperature: f32,
    max_context_chunks: usize,
    history_limit: usize,
}

impl ConversationPipeline {
    pub fn new(
        reframer: QueryReframer,
        generator: Arc<dyn GenerationProvider>,
        temperature: f32,
        max_context_chunks: usize,
        history_limit: usize,
    ) -> Self {
        Self {
            reframer,
            generator,
            temperature,
            max_context_chunks,
            history_limit,
        }
    }

    pub fn max_context_chunks(&self) -> usize {
        self.max_context_chunks
    }

    /// Reframe `question` and return up to `k` chunks ranked against the
    /// reframed text. `None` uses the configured context size.
    pub fn query(
        &self,
        store: &KnowledgeStore,
        question: &str,
        k: Option<usize>,
    ) -> Result<QueryResult> {
        let k = k.unwrap_or(self.max_context_chunks);
        let reframed = self.reframer.reframe(question);
        let hits = store.search(&reframed, k, None)?;

        let mut result = QueryResult::empty(question);
        result.reframed_question = reframed;
        for hit in hits {
            result.ids.push(hit.id);
            result.context.push(hit.text);
            result.metadata.push(hit.metadata);
            result.distances.push(hit.distance);
        }
        debug!(question, found = result.ids.len(), "knowledge query");
        Ok(result)
    }

    /// Answer `message`, optionally grounded in retrieved knowledge and the
    /// session's recent history.
    ///
    /// History is read before the new turn is recorded, so the prompt never
    /// repeats the current message. Only log failures surface as errors.
    pub fn answer(
        &self,
        store: &KnowledgeStore,
        log: &mut ConversationLog,
        session_id: Option<&str>,
        message: &str,
        use_context: bool,
    ) -> Result<String> {
        if message.trim().is_empty() {
            return Err(LoreError::validation("message is empty"));
        }

        let context = if use_context {
            match self.query(store, message, None) {
                Ok(result) => Some(result.context),
                Err(e) => {
                    warn!(error = %e, "knowledge retrieval failed during chat");
                    None
                }
            }
        } else {
            Some(Vec::new())
        };

        let history = match session_id {
            Some(id) => log.history(id, self.history_limit)?,
            None => Vec::new(),
        };

        let response = match context {
            None => "I couldn't search your knowledge base just now, so I can't answer \
                     from your notes. Please check that the embedding model is reachable \
                     and try again."
                .to_string(),
            Some(context) => {
                let prompt = build_chat_prompt(message, &context, &history, Local::now());
                self.generate_or_explain(&prompt)
            }
        };

        if let Some(id) = session_id {
            log.append_message(id, Role::User, message)?;
            log.append_message(id, Role::Assistant, &response)?;
        }
        Ok(response)
    }

    /// A context-free completion, with the same fallback as [`Self::answer`].
    pub fn complete(&self, prompt: &str) -> String {
        self.generate_or_explain(prompt)
    }

    fn generate_or_explain(&self, prompt: &str) -> String {
        match self.generator.generate(prompt, self.temperature) {
            Ok(text) => text,
            Err(e) => {
                warn!(error = %e, "generation failed; returning explanation");
                format!(
                    "I couldn't reach the language model ({e}). \
                     Please check that Ollama is running and try again."
                )
            }
        }
    }
}
