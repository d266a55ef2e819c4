//! Command-line front end. Results are printed as JSON on stdout; logs go
//! to stderr.

use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand};
use serde_json::json;
use tracing::{error, info};

use wordtally::config::{load_config, Config};
use wordtally::logging::init_logging;
use wordtally::{WordTally, WordTallyError};

const DEFAULT_CONFIG_FILE: &str = "wordtally.json";

/// Word counts across structured records and document attachments
#[derive(Parser)]
#[command(name = "wordtally", version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file (default: ./wordtally.json when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Recompute and cache the structured-content aggregate
    Content {
        /// Print the cached aggregate instead of recomputing
        #[arg(long)]
        cached: bool,
    },
    /// Chunked attachment counting
    Attachments {
        #[command(subcommand)]
        command: AttachmentCommands,
    },
    /// Show cached totals
    Show,
}

#[derive(Subcommand)]
enum AttachmentCommands {
    /// List candidate attachments
    List,
    /// Count the words in one chunk of attachments
    Chunk {
        /// Attachment ids to process
        ids: Vec<String>,
    },
    /// Persist an accumulated total
    Save { total: u64 },
    /// List, process every chunk and save in one go
    Run {
        /// Attachments per chunk (default: from config)
        #[arg(long)]
        chunk_size: Option<usize>,
    },
}

fn main() {
    let cli = Cli::parse();

    let config = match resolve_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", e);
            process::exit(1);
        }
    };

    if let Err(e) = init_logging(&config.logging, cli.verbose) {
        eprintln!("{}", e);
        process::exit(1);
    }

    match run(&cli.command, &config) {
        Ok(output) => println!("{}", output),
        Err(e) => {
            error!("Command failed: {}", e);
            eprintln!("{}", e);
            process::exit(1);
        }
    }
}

fn resolve_config(explicit: Option<&Path>) -> Result<Config, WordTallyError> {
    if let Some(path) = explicit {
        return Ok(load_config(path)?);
    }

    let fallback = Path::new(DEFAULT_CONFIG_FILE);
    if fallback.is_file() {
        Ok(load_config(fallback)?)
    } else {
        Ok(Config::default())
    }
}

fn run(command: &Commands, config: &Config) -> Result<String, WordTallyError> {
    let tally = WordTally::from_config(config)?;

    let value = match command {
        Commands::Content { cached: true } => json!(tally.cached_content()?),
        Commands::Content { cached: false } => json!(tally.refresh_content()?),
        Commands::Attachments { command } => match command {
            AttachmentCommands::List => json!(tally.list_pdf_candidates()),
            AttachmentCommands::Chunk { ids } => {
                json!({ "chunk_words": tally.process_pdf_chunk(ids) })
            }
            AttachmentCommands::Save { total } => {
                tally.save_pdf_total(*total)?;
                json!({ "saved": total })
            }
            AttachmentCommands::Run { chunk_size } => {
                let size = chunk_size.unwrap_or(config.attachments.chunk_size);
                info!(chunk_size = size, "Running attachment batch");
                let progress = tally.run_pdf_batch(size)?;
                json!({
                    "attachments": progress.attachment_ids.len(),
                    "total_words": progress.running_total,
                })
            }
        },
        Commands::Show => json!(tally.summary()?),
    };

    Ok(format!("{:#}", value))
}
