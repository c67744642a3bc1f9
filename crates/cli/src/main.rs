//! ask CLI
//!
//! Main entry point for the `ask` command-line tool.
//! Routes a question to a direct answer, a web search or an image search
//! and prints the streamed answer.

mod commands;

use ask_core::{config::AppConfig, logging, AppResult};
use clap::{Parser, Subcommand};
use commands::{ClassifyCommand, FetchCommand, QueryCommand};
use std::path::PathBuf;

/// ask - answer questions from a language model, the web or image search
#[derive(Parser, Debug)]
#[command(name = "ask")]
#[command(
    about = "Answer questions from a language model, the web or image search",
    long_about = None
)]
#[command(version)]
struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, env = "ASK_CONFIG")]
    config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true, env = "RUST_LOG")]
    log_level: Option<String>,

    /// Enable verbose output (sets log level to debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    no_color: bool,

    /// LLM provider (openai, ollama)
    #[arg(short, long, global = true, env = "ASK_PROVIDER")]
    provider: Option<String>,

    /// Answer model identifier
    #[arg(short, long, global = true, env = "ASK_MODEL")]
    model: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Answer a question
    Query(QueryCommand),

    /// Show how a question would be answered
    Classify(ClassifyCommand),

    /// Convert a page to text, optionally picking the passage closest to a question
    Fetch(FetchCommand),
}

#[tokio::main]
async fn main() -> AppResult<()> {
    let cli = Cli::parse();

    let config = AppConfig::load(cli.config)?.with_overrides(
        cli.provider,
        cli.model,
        cli.log_level,
        cli.verbose,
        cli.no_color,
    );

    logging::init_logging(config.log_level.as_deref(), config.no_color)?;

    tracing::debug!("Provider: {}", config.provider);
    tracing::debug!("Model: {} (fast: {})", config.model, config.fast_model);

    config.validate()?;

    let command_name = match &cli.command {
        Commands::Query(_) => "query",
        Commands::Classify(_) => "classify",
        Commands::Fetch(_) => "fetch",
    };
    let _span = tracing::info_span!("command", name = command_name).entered();

    let result = match cli.command {
        Commands::Query(cmd) => cmd.execute(&config).await,
        Commands::Classify(cmd) => cmd.execute(&config).await,
        Commands::Fetch(cmd) => cmd.execute(&config).await,
    };

    match &result {
        Ok(_) => tracing::info!("Command completed successfully"),
        Err(e) => tracing::error!("Command failed: {}", e),
    }

    result
}
