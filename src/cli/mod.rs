pub mod add;
pub mod chat;
pub mod doctor;
pub mod list;
pub mod query;
pub mod re_embed;
pub mod reset;
pub mod stats;

use anyhow::{Context, Result};
use lore::agent::Agent;
use lore::config::LoreConfig;

/// Open the agent for a one-shot CLI command.
fn open_agent(config: &LoreConfig) -> Result<Agent> {
    Agent::from_config(config).with_context(|| {
        format!(
            "failed to open knowledge base in {}",
            config.resolved_data_dir().display()
        )
    })
}

/// First `max_chars` characters of `text` on one line.
fn preview(text: &str, max_chars: usize) -> String {
    let flat = text.split_whitespace().collect::<Vec<_>>().join(" ");
    match flat.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &flat[..idx]),
        None => flat,
    }
}
