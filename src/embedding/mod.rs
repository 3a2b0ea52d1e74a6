//! Text-to-vector embedding gateway.
//!
//! Provides the [`EmbeddingProvider`] trait and an implementation backed by a
//! local Ollama server. The provider is created via [`create_provider`] from
//! configuration.

pub mod ollama;

use std::sync::Arc;

use crate::config::{EmbeddingConfig, OllamaConfig};
use crate::error::{GatewayError, LoreError, Result};

/// Turns text into a fixed-width vector.
///
/// All methods are synchronous. Callers in async contexts should use
/// `tokio::task::spawn_blocking`.
pub trait EmbeddingProvider: Send + Sync {
    /// Embed a single text string into a vector.
    fn embed(&self, text: &str) -> std::result::Result<Vec<f32>, GatewayError>;

    /// Embed a batch of texts in input order. Fails on the first failure.
    fn embed_batch(&self, texts: &[&str]) -> std::result::Result<Vec<Vec<f32>>, GatewayError> {
        texts.iter().map(|t| self.embed(t)).collect()
    }

    /// Name recorded alongside stored vectors.
    fn model_name(&self) -> &str;

    /// Width of the vectors this provider produces.
    fn dimensions(&self) -> usize;
}

/// Create an embedding provider from config.
///
/// Currently only `"ollama"` is supported.
pub fn create_provider(
    config: &EmbeddingConfig,
    ollama_config: &OllamaConfig,
) -> Result<Arc<dyn EmbeddingProvider>> {
    match config.provider.as_str() {
        "ollama" => Ok(Arc::new(ollama::OllamaEmbedding::new(
            crate::ollama::OllamaClient::new(ollama_config),
            &config.model,
            config.dimensions,
        ))),
        other => Err(LoreError::validation(format!(
            "unknown embedding provider: {other}. Supported: ollama"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_provider_is_rejected() {
        let config = EmbeddingConfig {
            provider: "onnx".into(),
            ..EmbeddingConfig::default()
        };
        let result = create_provider(&config, &OllamaConfig::default());
        assert!(matches!(result, Err(LoreError::Validation(_))));
    }

    #[test]
    fn ollama_provider_reports_config() {
        let provider =
            create_provider(&EmbeddingConfig::default(), &OllamaConfig::default()).unwrap();
        assert_eq!(provider.model_name(), "granite-embedding:30m");
        assert_eq!(provider.dimensions(), 384);
    }
}
