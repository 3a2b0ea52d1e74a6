//! CLI `chat` command: an interactive session grounded in the knowledge base.

use anyhow::Result;
use std::io::{BufRead, Write};

use lore::config::LoreConfig;

pub fn chat(config: &LoreConfig, use_context: bool) -> Result<()> {
    let mut agent = super::open_agent(config)?;
    let session_id = agent.start_session(&serde_json::json!({ "mode": "cli" }))?;

    println!("Chat session {session_id}");
    println!("Type 'exit' to quit, '/stats' for knowledge base stats.\n");

    let stdin = std::io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        print!("you> ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next() else { break };
        let line = line?;
        let message = line.trim();

        match message {
            "" => continue,
            "exit" | "quit" => break,
            "/stats" => {
                let stats = agent.stats()?;
                println!("{}\n", serde_json::to_string_pretty(&stats)?);
                continue;
            }
            _ => {}
        }

        let response = agent.chat(message, use_context)?;
        println!("\nlore> {response}\n");
    }

    println!("Session saved.");
    Ok(())
}
