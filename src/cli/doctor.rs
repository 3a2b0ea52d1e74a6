//! CLI `doctor` command: run database and Ollama diagnostics and print a health report.

use anyhow::{Context, Result};

use lore::config::LoreConfig;
use lore::db;
use lore::ollama::OllamaClient;

/// Run diagnostics and print a health report.
pub fn doctor(config: &LoreConfig) -> Result<()> {
    let knowledge_path = config.knowledge_db_path();
    let history_path = config.history_db_path();

    println!("Lore Health Report");
    println!("==================");
    println!();

    if !knowledge_path.exists() {
        println!("Knowledge base:    not found at {}", knowledge_path.display());
        println!("Run `lore add` or `lore serve` to initialize.");
    } else {
        let knowledge = db::open_knowledge_database(&knowledge_path, config.embedding.dimensions)
            .context("failed to open knowledge database (dimension mismatch or corrupt file)")?;
        let history = db::open_history_database(&history_path)
            .context("failed to open history database")?;
        let report = db::check_database_health(&knowledge, &history)
            .context("failed to run health check")?;

        println!("Knowledge base:    {}", knowledge_path.display());
        println!("  File size:       {}", format_bytes(file_size(&knowledge_path)));
        println!("History:           {}", history_path.display());
        println!("  File size:       {}", format_bytes(file_size(&history_path)));
        println!("Schema version:    {}", report.schema_version);
        println!("sqlite-vec:        {}", report.sqlite_vec_version);
        println!();
        println!("Embedding model:");
        println!(
            "  Stored:          {}",
            report.embedding_model.as_deref().unwrap_or("(not set)")
        );
        println!("  Configured:      {}", config.embedding.model);
        if let Some(stored) = &report.embedding_model {
            if stored != &config.embedding.model {
                println!("  WARNING: model mismatch! Run `lore re-embed` to update vectors.");
            } else {
                println!("  Status:          OK (match)");
            }
        }
        println!();
        println!("Row counts:");
        println!("  Chunks:          {}", report.chunk_count);
        println!("  Vectors:         {}", report.vector_count);
        println!("  Sessions:        {}", report.session_count);
        println!("  Messages:        {}", report.message_count);
        if report.chunk_count != report.vector_count {
            println!("  WARNING: chunk and vector counts differ. Run `lore re-embed`.");
        }
        println!();
        println!("Integrity check:");
        println!("  Knowledge:       {}", report.knowledge_integrity);
        println!("  History:         {}", report.history_integrity);
        println!();
        if report.is_healthy() {
            println!("Databases:         PASSED");
        } else {
            println!("Databases:         FAILED");
        }
    }

    println!();
    check_ollama(config);
    Ok(())
}

fn check_ollama(config: &LoreConfig) {
    let client = OllamaClient::new(&config.ollama);
    println!("Ollama:            {}", client.base_url());
    match client.list_models() {
        Ok(models) => {
            println!("  Status:          reachable ({} model(s))", models.len());
            for wanted in [&config.embedding.model, &config.generation.model] {
                let installed = models
                    .iter()
                    .any(|m| m.name == *wanted || m.name == format!("{wanted}:latest"));
                let status = if installed { "installed" } else { "MISSING (ollama pull)" };
                println!("  {wanted:<16} {status}");
            }
        }
        Err(e) => println!("  Status:          UNREACHABLE ({e})"),
    }
}

fn file_size(path: &std::path::Path) -> u64 {
    std::fs::metadata(path).map(|m| m.len()).unwrap_or(0)
}

fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{bytes} B")
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}
