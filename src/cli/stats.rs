use anyhow::Result;

use lore::config::LoreConfig;

/// Display knowledge base statistics in the terminal.
pub fn stats(config: &LoreConfig) -> Result<()> {
    let agent = super::open_agent(config)?;
    let stats = agent.stats()?;
    let sessions = agent.log().session_count()?;

    println!("Knowledge Base Statistics");
    println!("{}", "=".repeat(40));
    println!("  Chunks:            {}", stats.total_documents);
    println!("  Sessions:          {sessions}");
    println!("  Embedding model:   {}", stats.embedding_model);
    println!("  Language model:    {}", stats.llm_model);
    println!("  Data directory:    {}", config.resolved_data_dir().display());
    Ok(())
}
