//! CLI `add` command: store text, optionally checking whether it updates existing knowledge.

use anyhow::{bail, Context, Result};
use std::io::Read;
use std::path::Path;

use lore::agent::IngestAction;
use lore::config::LoreConfig;
use lore::knowledge::RawMetadata;

pub fn add(
    config: &LoreConfig,
    text: Option<String>,
    file: Option<&Path>,
    source: &str,
    smart: bool,
) -> Result<()> {
    let text = match (text, file) {
        (Some(text), _) => text,
        (None, Some(path)) => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?,
        (None, None) => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("failed to read text from stdin")?;
            buf
        }
    };
    if text.trim().is_empty() {
        bail!("nothing to add: text is empty");
    }

    let mut agent = super::open_agent(config)?;
    let metadata = RawMetadata::new();

    if !smart {
        let ids = agent.add(&text, source, &metadata)?;
        println!("Added {} chunk(s).", ids.len());
        for id in ids {
            println!("  {id}");
        }
        return Ok(());
    }

    let outcome = agent.ingest(&text, source, &metadata)?;
    match outcome.action {
        IngestAction::Added => println!("Added {} chunk(s).", outcome.doc_ids.len()),
        IngestAction::Updated => {
            let topic = outcome
                .details
                .intent
                .as_ref()
                .map(|i| i.topic.as_str())
                .unwrap_or_default();
            println!(
                "Updated existing knowledge (topic: {topic}), {} chunk(s) rewritten.",
                outcome.doc_ids.len()
            );
            if let Some(merged) = &outcome.details.merged_text {
                println!("\nMerged entry:\n{}", super::preview(merged, 400));
            }
            if !outcome.details.deleted_ids.is_empty() {
                println!("Removed {} stale chunk(s).", outcome.details.deleted_ids.len());
            }
            if outcome.details.dropped_chunks > 0 {
                println!(
                    "Note: {} merged chunk(s) exceeded the original document and were not stored.",
                    outcome.details.dropped_chunks
                );
            }
        }
    }
    for id in &outcome.doc_ids {
        println!("  {id}");
    }
    Ok(())
}
