//! A personal knowledge base with retrieval-augmented chat.
//!
//! Lore stores free-form notes as embedded chunks in SQLite
//! ([sqlite-vec](https://github.com/asg017/sqlite-vec) for vector search) and
//! answers questions with a local language model served by
//! [Ollama](https://ollama.com/). New input that reads as an update to
//! something already known ("my rent is now 1400") is merged into the
//! existing entry instead of being stored twice.
//!
//! # Architecture
//!
//! - **Storage**: two SQLite files, one for knowledge chunks and vectors, one
//!   for conversation sessions and messages
//! - **Models**: Ollama over HTTP for both embeddings and generation
//! - **Pipelines**: query reframing, update-intent classification and merging
//!   run through the language model and fail open
//! - **Surfaces**: a CLI and an [MCP](https://modelcontextprotocol.io/) server
//!   (stdio or Streamable HTTP)
//!
//! # Modules
//!
//! - [`config`]: TOML configuration with environment variable overrides
//! - [`db`]: SQLite initialization, schema and health checks
//! - [`ollama`]: blocking HTTP client for the Ollama API
//! - [`embedding`] / [`generation`]: provider traits over the model gateway
//! - [`knowledge`]: chunking and the vector-backed knowledge store
//! - [`history`]: the conversation log
//! - [`agent`]: ingestion and conversation pipelines behind one facade

pub mod agent;
pub mod config;
pub mod db;
pub mod embedding;
pub mod error;
pub mod generation;
pub mod history;
pub mod knowledge;
pub mod ollama;
