use super::GenerationProvider;
use crate::error::GatewayError;
use crate::ollama::OllamaClient;

/// Completions from Ollama's `/api/generate` endpoint, non-streaming.
pub struct OllamaGeneration {
    client: OllamaClient,
    model: String,
}

impl OllamaGeneration {
    pub fn new(client: OllamaClient, model: &str) -> Self {
        Self {
            client,
            model: model.to_string(),
        }
    }
}

impl GenerationProvider for OllamaGeneration {
    fn generate(&self, prompt: &str, temperature: f32) -> Result<String, GatewayError> {
        self.client.generate(&self.model, prompt, temperature)
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
