//! Text generation gateway.
//!
//! [`GenerationProvider`] is the seam every prompt-driven component
//! (reframer, intent classifier, merger, chat) goes through.

pub mod ollama;

use std::sync::Arc;

use crate::config::{GenerationConfig, OllamaConfig};
use crate::error::{GatewayError, LoreError, Result};

/// Produces a completion for a prompt. Synchronous, like [`crate::embedding::EmbeddingProvider`].
pub trait GenerationProvider: Send + Sync {
    /// Return the model's response to `prompt`, trimmed of surrounding whitespace.
    fn generate(&self, prompt: &str, temperature: f32) -> std::result::Result<String, GatewayError>;

    fn model_name(&self) -> &str;
}

/// Create a generation provider from config. Currently only `"ollama"`.
pub fn create_provider(
    config: &GenerationConfig,
    ollama_config: &OllamaConfig,
) -> Result<Arc<dyn GenerationProvider>> {
    match config.provider.as_str() {
        "ollama" => Ok(Arc::new(ollama::OllamaGeneration::new(
            crate::ollama::OllamaClient::new(ollama_config),
            &config.model,
        ))),
        other => Err(LoreError::validation(format!(
            "unknown generation provider: {other}. Supported: ollama"
        ))),
    }
}
