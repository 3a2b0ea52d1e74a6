//! CLI `re-embed` command: regenerate all vectors with the configured embedding model.

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};

use lore::config::LoreConfig;

pub async fn re_embed(config: &LoreConfig) -> Result<()> {
    let mut agent = super::open_agent(config)?;

    let total = agent.store().count()?;
    if total == 0 {
        println!("No knowledge to re-embed.");
        return Ok(());
    }

    println!("Re-embedding {total} chunk(s) with model '{}'...", config.embedding.model);

    let pb = ProgressBar::new(total as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("  {bar:40.cyan/blue} {pos}/{len} ({eta})")?
            .progress_chars("##-"),
    );

    let progress = pb.clone();
    let count = tokio::task::spawn_blocking(move || {
        agent.re_embed(|done, _| progress.set_position(done as u64))
    })
    .await?
    .context("re-embedding failed")?;

    pb.finish_and_clear();

    println!("Re-embedded {count} chunk(s) with model '{}'.", config.embedding.model);
    Ok(())
}
