//! Reconciles stored knowledge with an update into one passage.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::generation::GenerationProvider;

pub(crate) const MERGE_PROMPT_HEADER: &str = "You maintain a personal knowledge base.";

pub struct KnowledgeMerger {
    generator: Arc<dyn GenerationProvider>,
    temperature: f32,
}

impl KnowledgeMerger {
    pub fn new(generator: Arc<dyn GenerationProvider>, temperature: f32) -> Self {
        Self {
            generator,
            temperature,
        }
    }

    /// Merge `update` into `original`. Returns `original` unchanged when the
    /// model fails or replies with nothing.
    pub fn merge(&self, original: &str, update: &str, topic: &str) -> String {
        match self
            .generator
            .generate(&merge_prompt(original, update, topic), self.temperature)
        {
            Ok(merged) if !merged.trim().is_empty() => {
                debug!(topic, original_len = original.len(), merged_len = merged.len(), "merged knowledge");
                merged
            }
            Ok(_) => {
                warn!(topic, "merge returned an empty passage; keeping original");
                original.to_string()
            }
            Err(e) => {
                warn!(topic, error = %e, "merge failed; keeping original");
                original.to_string()
            }
        }
    }
}

fn merge_prompt(original: &str, update: &str, topic: &str) -> String {
    format!(
        "{MERGE_PROMPT_HEADER}\n\
         Merge an update into an existing entry.\n\n\
         Topic: {topic}\n\n\
         Existing entry:\n\"{original}\"\n\n\
         Update:\n\"{update}\"\n\n\
         Work out what changed. Keep every detail that is still true, replace facts \
         the update supersedes, and drop duplicates. Write one coherent, current entry \
         that keeps the context of the original.\n\n\
         Reply with the merged entry only, without commentary."
    )
}
