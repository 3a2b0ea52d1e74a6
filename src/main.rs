mod cli;
mod server;
mod tools;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use lore::config::LoreConfig;

#[derive(Parser)]
#[command(name = "lore", version, about = "Personal knowledge base with local RAG chat")]
struct Cli {
    /// Config file (defaults to ~/.lore/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Copy, ValueEnum)]
enum Transport {
    Stdio,
    Http,
}

#[derive(Subcommand)]
enum Command {
    /// Start the MCP server
    Serve {
        /// Overrides server.transport from the config
        #[arg(long, value_enum)]
        transport: Option<Transport>,
    },
    /// Add knowledge from text, a file, or stdin
    Add {
        /// Text to add
        #[arg(long, conflicts_with = "file")]
        text: Option<String>,
        /// Read the text from a file
        #[arg(long)]
        file: Option<PathBuf>,
        /// Source label stored with each chunk
        #[arg(long, default_value = "cli")]
        source: String,
        /// Detect updates to existing knowledge and merge them
        #[arg(long)]
        smart: bool,
    },
    /// Search the knowledge base
    Query {
        question: String,
        /// Number of results
        #[arg(short, long)]
        k: Option<usize>,
    },
    /// Interactive chat grounded in the knowledge base
    Chat {
        /// Answer without retrieving knowledge
        #[arg(long)]
        no_context: bool,
    },
    /// Show knowledge base statistics
    Stats,
    /// List stored chunks
    List {
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
    /// Delete all knowledge and conversation history
    Reset {
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
    /// Regenerate every vector with the configured embedding model
    ReEmbed,
    /// Check databases and the Ollama connection
    Doctor,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => LoreConfig::load_from(path)?,
        None => LoreConfig::load()?,
    };

    // Log to stderr so stdout stays clean for MCP JSON-RPC.
    let filter = EnvFilter::try_new(&config.server.log_level)
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Command::Serve { transport } => {
            let transport = transport.unwrap_or(match config.server.transport.as_str() {
                "http" => Transport::Http,
                _ => Transport::Stdio,
            });
            match transport {
                Transport::Stdio => server::serve_stdio(config).await?,
                Transport::Http => server::serve_http(config).await?,
            }
        }
        Command::Add {
            text,
            file,
            source,
            smart,
        } => cli::add::add(&config, text, file.as_deref(), &source, smart)?,
        Command::Query { question, k } => cli::query::query(&config, &question, k)?,
        Command::Chat { no_context } => cli::chat::chat(&config, !no_context)?,
        Command::Stats => cli::stats::stats(&config)?,
        Command::List { limit } => cli::list::list(&config, limit)?,
        Command::Reset { yes } => cli::reset::reset(&config, yes)?,
        Command::ReEmbed => cli::re_embed::re_embed(&config).await?,
        Command::Doctor => cli::doctor::doctor(&config)?,
    }

    Ok(())
}
