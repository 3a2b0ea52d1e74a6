use anyhow::Result;

use lore::config::LoreConfig;

/// Print stored chunks, oldest first.
pub fn list(config: &LoreConfig, limit: usize) -> Result<()> {
    let agent = super::open_agent(config)?;
    let chunks = agent.list(limit)?;
    let total = agent.store().count()?;

    if chunks.is_empty() {
        println!("Knowledge base is empty.");
        return Ok(());
    }

    println!("Showing {} of {total} chunk(s)\n", chunks.len());
    for chunk in &chunks {
        let field = |key: &str| {
            chunk
                .metadata
                .get(key)
                .map(|v| v.to_string())
                .unwrap_or_else(|| "-".into())
        };
        let updated = if chunk.metadata.contains_key("updated") {
            " (updated)"
        } else {
            ""
        };
        println!("{}{updated}", chunk.id);
        println!(
            "  source: {}  chunk: {}/{}  at: {}",
            field("source"),
            field("chunk_index"),
            field("total_chunks"),
            chunk.updated_at
        );
        println!("  {}\n", super::preview(&chunk.text, 200));
    }
    Ok(())
}
