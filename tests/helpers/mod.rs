#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use lore::agent::Agent;
use lore::config::LoreConfig;
use lore::db;
use lore::embedding::EmbeddingProvider;
use lore::error::GatewayError;
use lore::generation::GenerationProvider;
use lore::knowledge::{KnowledgeStore, MetadataValue, RawMetadata};

pub const DIMS: usize = 64;

fn refused(url: &str) -> GatewayError {
    GatewayError::Transport {
        url: url.into(),
        message: "connection refused".into(),
    }
}

/// Deterministic bag-of-words embedding: each lowercase word is hashed into
/// one of `DIMS - 1` buckets, the last dimension is a constant bias, and the
/// vector is L2-normalized. Texts sharing words land close together.
pub struct HashEmbedding {
    failing: AtomicBool,
    /// Calls left before every further call fails. `None` is unlimited.
    budget: Mutex<Option<usize>>,
}

impl HashEmbedding {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            failing: AtomicBool::new(false),
            budget: Mutex::new(None),
        })
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Succeed `calls` more times, then fail.
    pub fn fail_after(&self, calls: usize) {
        *self.budget.lock().unwrap() = Some(calls);
    }
}

fn fnv1a(word: &str) -> u64 {
    word.bytes().fold(0xcbf29ce484222325u64, |hash, b| {
        (hash ^ u64::from(b)).wrapping_mul(0x100000001b3)
    })
}

impl EmbeddingProvider for HashEmbedding {
    fn embed(&self, text: &str) -> Result<Vec<f32>, GatewayError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(refused("http://127.0.0.1:9/api/embeddings"));
        }
        if let Some(left) = self.budget.lock().unwrap().as_mut() {
            if *left == 0 {
                return Err(refused("http://127.0.0.1:9/api/embeddings"));
            }
            *left -= 1;
        }
        let mut v = vec![0.0f32; DIMS];
        for word in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
        {
            let bucket = (fnv1a(&word.to_lowercase()) % (DIMS as u64 - 1)) as usize;
            v[bucket] += 1.0;
        }
        v[DIMS - 1] = 0.5;
        let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        for x in &mut v {
            *x /= norm;
        }
        Ok(v)
    }

    fn model_name(&self) -> &str {
        "hash-embed"
    }

    fn dimensions(&self) -> usize {
        DIMS
    }
}

/// Answers each pipeline prompt with a scripted reply, chosen by the
/// prompt's opening line, and records every prompt it receives.
pub struct ScriptedGenerator {
    pub intent: Mutex<String>,
    /// `None` makes merge calls fail.
    pub merge: Mutex<Option<String>>,
    pub chat: Mutex<String>,
    pub prompts: Mutex<Vec<String>>,
    failing: AtomicBool,
}

pub const NEW_INFO: &str = r#"{"is_update": false, "topic": "", "reason": "new information"}"#;
pub const REFRAME_SUFFIX: &str = " (as of 2026-10-16)";

impl ScriptedGenerator {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            intent: Mutex::new(NEW_INFO.into()),
            merge: Mutex::new(None),
            chat: Mutex::new("Here is what I know.".into()),
            prompts: Mutex::new(Vec::new()),
            failing: AtomicBool::new(false),
        })
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Classify the next inputs as updates to `topic`, merging to `merged`.
    pub fn script_update(&self, topic: &str, merged: &str) {
        *self.intent.lock().unwrap() = format!(
            r#"Sure. {{"is_update": true, "topic": "{topic}", "reason": "the value changed"}}"#
        );
        *self.merge.lock().unwrap() = Some(merged.into());
    }

    pub fn prompts_starting_with(&self, header: &str) -> Vec<String> {
        self.prompts
            .lock()
            .unwrap()
            .iter()
            .filter(|p| p.starts_with(header) || p.contains(&format!("\n\n{header}")))
            .cloned()
            .collect()
    }

    pub fn last_chat_prompt(&self) -> Option<String> {
        self.prompts_starting_with(CHAT_HEADER).pop()
    }
}

pub const INTENT_HEADER: &str = "You classify personal knowledge-base input.";
pub const MERGE_HEADER: &str = "You maintain a personal knowledge base.";
pub const REFRAME_HEADER: &str = "You rewrite search queries for a personal knowledge base.";
pub const CHAT_HEADER: &str = "You are a helpful personal assistant";

impl GenerationProvider for ScriptedGenerator {
    fn generate(&self, prompt: &str, _temperature: f32) -> Result<String, GatewayError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        if self.failing.load(Ordering::SeqCst) {
            return Err(refused("http://127.0.0.1:9/api/generate"));
        }

        if prompt.starts_with(INTENT_HEADER) {
            Ok(self.intent.lock().unwrap().clone())
        } else if prompt.starts_with(MERGE_HEADER) {
            self.merge
                .lock()
                .unwrap()
                .clone()
                .ok_or_else(|| refused("http://127.0.0.1:9/api/generate"))
        } else if prompt.starts_with(REFRAME_HEADER) {
            let query = prompt
                .split_once("Query: \"")
                .and_then(|(_, rest)| rest.split_once("\"\n\n"))
                .map(|(query, _)| query)
                .unwrap_or_default();
            Ok(format!("{query}{REFRAME_SUFFIX}"))
        } else {
            Ok(self.chat.lock().unwrap().clone())
        }
    }

    fn model_name(&self) -> &str {
        "scripted-llm"
    }
}

pub fn test_config() -> LoreConfig {
    LoreConfig::default()
}

/// Config with tiny word windows, so short texts span several chunks.
pub fn small_chunk_config(chunk_size: usize) -> LoreConfig {
    let mut config = LoreConfig::default();
    config.chunking.chunk_size = chunk_size;
    config.chunking.chunk_overlap = 0;
    config
}

pub struct TestAgent {
    pub agent: Agent,
    pub embedder: Arc<HashEmbedding>,
    pub generator: Arc<ScriptedGenerator>,
}

pub fn test_agent(config: &LoreConfig) -> TestAgent {
    let embedder = HashEmbedding::new();
    let generator = ScriptedGenerator::new();
    let agent = Agent::in_memory(embedder.clone(), generator.clone(), config).unwrap();
    TestAgent {
        agent,
        embedder,
        generator,
    }
}

pub fn test_store() -> (KnowledgeStore, Arc<HashEmbedding>) {
    let embedder = HashEmbedding::new();
    let conn = db::open_memory_knowledge_database(DIMS).unwrap();
    let store = KnowledgeStore::new(conn, embedder.clone(), "scripted-llm").unwrap();
    (store, embedder)
}

pub fn meta(pairs: &[(&str, MetadataValue)]) -> RawMetadata {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), Some(v.clone())))
        .collect()
}

pub fn texts(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}
