use tracing::debug;

use super::EmbeddingProvider;
use crate::error::GatewayError;
use crate::ollama::OllamaClient;

/// Embeddings from Ollama's `/api/embeddings` endpoint.
pub struct OllamaEmbedding {
    client: OllamaClient,
    model: String,
    dimensions: usize,
}

impl OllamaEmbedding {
    pub fn new(client: OllamaClient, model: &str, dimensions: usize) -> Self {
        Self {
            client,
            model: model.to_string(),
            dimensions,
        }
    }
}

impl EmbeddingProvider for OllamaEmbedding {
    fn embed(&self, text: &str) -> Result<Vec<f32>, GatewayError> {
        let vector = self.client.embed(&self.model, text)?;
        debug!(dims = vector.len(), "embedded text");
        Ok(vector)
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}
