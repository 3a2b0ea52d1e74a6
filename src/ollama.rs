//! Blocking HTTP client for a local Ollama server.
//!
//! Every call is a single attempt bounded by the agent's global timeout.
//! Callers decide what a failure means for them.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::OllamaConfig;
use crate::error::GatewayError;

#[derive(Debug, Clone)]
pub struct OllamaClient {
    base_url: String,
    agent: ureq::Agent,
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Debug, Serialize)]
struct GenerateOptions {
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: String,
}

#[derive(Debug, Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    prompt: &'a str,
}

#[derive(Debug, Deserialize)]
struct EmbedResponse {
    embedding: Vec<f32>,
}

#[derive(Debug, Deserialize)]
pub struct ModelInfo {
    pub name: String,
    pub size: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct ModelsResponse {
    models: Vec<ModelInfo>,
}

impl OllamaClient {
    pub fn new(config: &OllamaConfig) -> Self {
        Self::with_timeout(&config.base_url, Duration::from_secs(config.timeout_secs))
    }

    pub fn with_timeout(base_url: &str, timeout: Duration) -> Self {
        let agent = ureq::Agent::config_builder()
            .timeout_global(Some(timeout))
            .build()
            .into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            agent,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Single non-streaming completion. Returns the trimmed response text.
    pub fn generate(
        &self,
        model: &str,
        prompt: &str,
        temperature: f32,
    ) -> Result<String, GatewayError> {
        let url = format!("{}/api/generate", self.base_url);
        let request = GenerateRequest {
            model,
            prompt,
            stream: false,
            options: GenerateOptions { temperature },
        };

        debug!(model, prompt_len = prompt.len(), temperature, "ollama generate");
        let body = self.post_json(&url, &request)?;
        let response: GenerateResponse = decode(&url, &body)?;
        Ok(response.response.trim().to_string())
    }

    /// Embed one text. An empty vector in the response counts as malformed.
    pub fn embed(&self, model: &str, text: &str) -> Result<Vec<f32>, GatewayError> {
        let url = format!("{}/api/embeddings", self.base_url);
        let request = EmbedRequest {
            model,
            prompt: text,
        };

        debug!(model, text_len = text.len(), "ollama embed");
        let body = self.post_json(&url, &request)?;
        let response: EmbedResponse = decode(&url, &body)?;
        if response.embedding.is_empty() {
            return Err(GatewayError::Decode {
                url,
                message: "response contained an empty embedding".into(),
            });
        }
        Ok(response.embedding)
    }

    /// Models installed on the server.
    pub fn list_models(&self) -> Result<Vec<ModelInfo>, GatewayError> {
        let url = format!("{}/api/tags", self.base_url);
        let body = self
            .agent
            .get(&url)
            .call()
            .and_then(|mut resp| resp.body_mut().read_to_string())
            .map_err(|e| map_error(&url, e))?;
        let response: ModelsResponse = decode(&url, &body)?;
        Ok(response.models)
    }

    fn post_json<T: Serialize>(&self, url: &str, request: &T) -> Result<String, GatewayError> {
        let request_json = serde_json::to_string(request).map_err(|e| GatewayError::Decode {
            url: url.to_string(),
            message: format!("failed to serialize request: {e}"),
        })?;

        self.agent
            .post(url)
            .header("Content-Type", "application/json")
            .send(&request_json)
            .and_then(|mut resp| resp.body_mut().read_to_string())
            .map_err(|e| map_error(url, e))
    }
}

fn decode<T: for<'de> Deserialize<'de>>(url: &str, body: &str) -> Result<T, GatewayError> {
    serde_json::from_str(body).map_err(|e| GatewayError::Decode {
        url: url.to_string(),
        message: e.to_string(),
    })
}

fn map_error(url: &str, error: ureq::Error) -> GatewayError {
    let url = url.to_string();
    let mapped = match error {
        ureq::Error::StatusCode(status) => GatewayError::Status { url, status },
        ureq::Error::Timeout(_) => GatewayError::Timeout { url },
        other => GatewayError::Transport {
            url,
            message: other.to_string(),
        },
    };
    warn!(error = %mapped, "ollama request failed");
    mapped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trailing_slash_is_stripped() {
        let client = OllamaClient::with_timeout("http://localhost:11434/", Duration::from_secs(1));
        assert_eq!(client.base_url(), "http://localhost:11434");
    }

    #[test]
    fn generate_request_shape() {
        let request = GenerateRequest {
            model: "m",
            prompt: "p",
            stream: false,
            options: GenerateOptions { temperature: 0.5 },
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["stream"], false);
        assert_eq!(json["options"]["temperature"], 0.5);
        assert_eq!(json["prompt"], "p");
    }

    #[test]
    fn unreachable_server_is_a_transport_error() {
        // Port 9 (discard) is not an Ollama server on any test machine.
        let client = OllamaClient::with_timeout("http://127.0.0.1:9", Duration::from_secs(2));
        let err = client.generate("m", "hello", 0.1).unwrap_err();
        assert!(matches!(
            err,
            GatewayError::Transport { .. } | GatewayError::Timeout { .. }
        ));
    }
}
