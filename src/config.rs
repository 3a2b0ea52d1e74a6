use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::knowledge::store::MAX_KNN_K;

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct LoreConfig {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub ollama: OllamaConfig,
    pub embedding: EmbeddingConfig,
    pub generation: GenerationConfig,
    pub chunking: ChunkingConfig,
    pub retrieval: RetrievalConfig,
    pub ingest: IngestConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub transport: String,
    pub host: String,
    pub port: u16,
    pub log_level: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct StorageConfig {
    pub data_dir: String,
    pub knowledge_db: String,
    pub history_db: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct OllamaConfig {
    pub base_url: String,
    /// Upper bound on a single model call. A hung request fails the call.
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct EmbeddingConfig {
    pub provider: String,
    pub model: String,
    /// Width of the vectors the model produces. Fixed per knowledge database.
    pub dimensions: usize,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct GenerationConfig {
    pub provider: String,
    pub model: String,
    pub temperature: f32,
    pub reframe_temperature: f32,
    pub intent_temperature: f32,
    pub merge_temperature: f32,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ChunkingConfig {
    /// Window size in words.
    pub chunk_size: usize,
    /// Words shared between consecutive windows. Must be smaller than `chunk_size`.
    pub chunk_overlap: usize,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct RetrievalConfig {
    pub max_context_chunks: usize,
    pub history_limit: usize,
    /// How many neighbours to fetch when looking for the knowledge an update targets.
    pub related_search_k: usize,
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct IngestConfig {
    pub overflow: OverflowPolicy,
}

/// What to do when a merge produces more chunks than the document had ids for.
#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum OverflowPolicy {
    /// Keep only as many chunks as there were ids.
    #[default]
    Drop,
    /// Store the extra chunks under fresh ids in the same document.
    Append,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            transport: "stdio".into(),
            host: "127.0.0.1".into(),
            port: 7433,
            log_level: "info".into(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: default_lore_dir().to_string_lossy().into_owned(),
            knowledge_db: "knowledge.db".into(),
            history_db: "history.db".into(),
        }
    }
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434".into(),
            timeout_secs: 120,
        }
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: "ollama".into(),
            model: "granite-embedding:30m".into(),
            dimensions: 384,
        }
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            provider: "ollama".into(),
            model: "nemotron-3-nano:30b-cloud".into(),
            temperature: 0.7,
            reframe_temperature: 0.3,
            intent_temperature: 0.2,
            merge_temperature: 0.3,
        }
    }
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: 500,
            chunk_overlap: 50,
        }
    }
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            max_context_chunks: 10,
            history_limit: 10,
            related_search_k: 3,
        }
    }
}

/// Returns `~/.lore/`
pub fn default_lore_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".lore")
}

/// Returns the default config file path: `~/.lore/config.toml`
pub fn default_config_path() -> PathBuf {
    default_lore_dir().join("config.toml")
}

impl LoreConfig {
    /// Load config from TOML file (if it exists) then apply env var overrides.
    pub fn load() -> Result<Self> {
        Self::load_from(default_config_path())
    }

    /// Load from a specific path, then apply env var overrides.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut config = if path.exists() {
            let contents =
                std::fs::read_to_string(path).context("failed to read config file")?;
            toml::from_str(&contents).context("failed to parse config TOML")?
        } else {
            info!("no config file at {}, using defaults", path.display());
            LoreConfig::default()
        };

        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Apply environment variable overrides.
    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("LORE_DATA_DIR") {
            self.storage.data_dir = val;
        }
        if let Ok(val) = std::env::var("LORE_OLLAMA_URL") {
            self.ollama.base_url = val;
        }
        if let Ok(val) = std::env::var("LORE_LLM_MODEL") {
            self.generation.model = val;
        }
        if let Ok(val) = std::env::var("LORE_EMBEDDING_MODEL") {
            self.embedding.model = val;
        }
        if let Ok(val) = std::env::var("LORE_LOG_LEVEL") {
            self.server.log_level = val;
        }
    }

    /// Reject settings no component could work with.
    pub fn validate(&self) -> Result<()> {
        anyhow::ensure!(self.chunking.chunk_size > 0, "chunking.chunk_size must be positive");
        anyhow::ensure!(
            self.chunking.chunk_overlap < self.chunking.chunk_size,
            "chunking.chunk_overlap ({}) must be smaller than chunking.chunk_size ({})",
            self.chunking.chunk_overlap,
            self.chunking.chunk_size
        );
        anyhow::ensure!(self.embedding.dimensions > 0, "embedding.dimensions must be positive");
        anyhow::ensure!(self.ollama.timeout_secs > 0, "ollama.timeout_secs must be positive");
        for (name, value) in [
            ("retrieval.max_context_chunks", self.retrieval.max_context_chunks),
            ("retrieval.related_search_k", self.retrieval.related_search_k),
        ] {
            anyhow::ensure!(
                (1..=MAX_KNN_K).contains(&value),
                "{name} must be between 1 and {MAX_KNN_K}, got {value}"
            );
        }
        Ok(())
    }

    pub fn resolved_data_dir(&self) -> PathBuf {
        expand_tilde(&self.storage.data_dir)
    }

    pub fn knowledge_db_path(&self) -> PathBuf {
        self.resolved_data_dir().join(&self.storage.knowledge_db)
    }

    pub fn history_db_path(&self) -> PathBuf {
        self.resolved_data_dir().join(&self.storage.history_db)
    }
}

pub fn expand_tilde(path: &str) -> PathBuf {
    match (path.strip_prefix("~/"), dirs::home_dir()) {
        (Some(rest), Some(home)) => home.join(rest),
        _ => PathBuf::from(path),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = LoreConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.server.transport, "stdio");
        assert_eq!(config.chunking.chunk_size, 500);
        assert_eq!(config.chunking.chunk_overlap, 50);
        assert_eq!(config.retrieval.max_context_chunks, 10);
        assert_eq!(config.ingest.overflow, OverflowPolicy::Drop);
        assert!(config.knowledge_db_path().ends_with("knowledge.db"));
        assert!(config.history_db_path().ends_with("history.db"));
    }

    #[test]
    fn parse_toml_config() {
        let toml_str = r#"
[server]
log_level = "debug"

[storage]
data_dir = "/tmp/lore-test"

[chunking]
chunk_size = 200

[ingest]
overflow = "append"
"#;
        let config: LoreConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.server.log_level, "debug");
        assert_eq!(
            config.knowledge_db_path(),
            PathBuf::from("/tmp/lore-test/knowledge.db")
        );
        assert_eq!(config.chunking.chunk_size, 200);
        assert_eq!(config.ingest.overflow, OverflowPolicy::Append);
        // defaults still apply for unset fields
        assert_eq!(config.chunking.chunk_overlap, 50);
        assert_eq!(config.embedding.dimensions, 384);
    }

    #[test]
    fn overlap_not_smaller_than_size_is_rejected() {
        let mut config = LoreConfig::default();
        config.chunking.chunk_size = 10;
        config.chunking.chunk_overlap = 10;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("chunk_overlap"));
    }

    #[test]
    fn retrieval_limits_must_fit_knn_range() {
        let mut config = LoreConfig::default();
        config.retrieval.related_search_k = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("related_search_k"));

        let mut config = LoreConfig::default();
        config.retrieval.max_context_chunks = MAX_KNN_K + 1;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("max_context_chunks"));

        let mut config = LoreConfig::default();
        config.retrieval.max_context_chunks = MAX_KNN_K;
        config.retrieval.related_search_k = 1;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn env_overrides_apply() {
        let mut config = LoreConfig::default();
        std::env::set_var("LORE_OLLAMA_URL", "http://gpu-box:11434");
        std::env::set_var("LORE_LLM_MODEL", "mistral");
        std::env::set_var("LORE_LOG_LEVEL", "trace");

        config.apply_env_overrides();

        assert_eq!(config.ollama.base_url, "http://gpu-box:11434");
        assert_eq!(config.generation.model, "mistral");
        assert_eq!(config.server.log_level, "trace");

        std::env::remove_var("LORE_OLLAMA_URL");
        std::env::remove_var("LORE_LLM_MODEL");
        std::env::remove_var("LORE_LOG_LEVEL");
    }
}
