use anyhow::Result;

use lore::config::LoreConfig;

/// Search the knowledge base from the terminal.
pub fn query(config: &LoreConfig, question: &str, k: Option<usize>) -> Result<()> {
    let agent = super::open_agent(config)?;
    let result = agent.query(question, k)?;

    if result.reframed_question != result.question {
        println!("Searching for: {}\n", result.reframed_question);
    }

    if result.context.is_empty() {
        println!("No results found.");
        return Ok(());
    }

    println!("Found {} result(s)\n", result.context.len());
    for (i, (text, distance)) in result.context.iter().zip(&result.distances).enumerate() {
        let source = result.metadata[i]
            .get("source")
            .map(|v| v.to_string())
            .unwrap_or_else(|| "-".into());
        println!(
            "  {}. [{}] (similarity: {:.3}) {}",
            i + 1,
            source,
            1.0 - distance,
            super::preview(text, 160)
        );
        println!("     id: {}", result.ids[i]);
    }
    Ok(())
}
