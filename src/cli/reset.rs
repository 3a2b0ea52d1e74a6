//! CLI `reset` command: delete all knowledge and conversation history after confirmation.

use anyhow::{bail, Result};
use std::io::Write;

use lore::config::LoreConfig;

pub fn reset(config: &LoreConfig, yes: bool) -> Result<()> {
    if !yes {
        println!("WARNING: This will permanently delete ALL knowledge, sessions and messages.");
        println!("Data directory: {}", config.resolved_data_dir().display());
        print!("\nType YES to confirm: ");
        std::io::stdout().flush()?;

        let mut input = String::new();
        std::io::stdin().read_line(&mut input)?;

        if input.trim() != "YES" {
            bail!("reset cancelled");
        }
    }

    let mut agent = super::open_agent(config)?;
    let summary = agent.reset_all()?;

    println!("Reset complete.");
    println!("  Knowledge chunks deleted: {}", summary.vector_documents_deleted);
    println!("  Sessions deleted:         {}", summary.sessions_deleted);
    println!("  Messages deleted:         {}", summary.messages_deleted);
    Ok(())
}
