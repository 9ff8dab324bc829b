//! LexiBot CLI - Build and inspect the structural chunk index.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use lexi_core::{Chunk, ChunkStore, LexiConfig};
use lexi_embed::HashingEmbedder;
use lexi_ingest::{FileFailure, Indexer};
use lexi_store::SqliteStore;

/// Characters of chunk content shown by `lexi chunks`.
const PREVIEW_CHARS: usize = 150;

/// LexiBot - Structural chunking for regulations and handbooks
#[derive(Parser)]
#[command(name = "lexi")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Config file (default: lexibot/config.toml in the user config dir, then ./lexibot.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Rebuild the chunk index from a source directory
    Build {
        /// Directory of source documents
        #[arg(short, long)]
        source: Option<PathBuf>,

        /// Chunk store file, replaced by the rebuild
        #[arg(long)]
        store: Option<PathBuf>,
    },

    /// Segment a source directory and print chunks without indexing
    Chunks {
        /// Directory of source documents
        #[arg(short, long)]
        source: Option<PathBuf>,

        /// Number of chunks to print
        #[arg(short = 'n', long, default_value = "3")]
        limit: usize,

        /// Print chunks as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show chunk counts per source file
    Stats {
        /// Chunk store file
        #[arg(long)]
        store: Option<PathBuf>,
    },
}

fn setup_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber).ok();
}

fn load_config(path: Option<&Path>) -> Result<LexiConfig, Box<dyn std::error::Error>> {
    let config = match path {
        Some(path) => LexiConfig::load(path)?,
        None => LexiConfig::load_default()?,
    };
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    setup_logging(cli.verbose);

    let mut config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Build { source, store } => {
            if let Some(store) = store {
                config.store.path = store;
            }
            let source = source.unwrap_or_else(|| config.source.dir.clone());
            build(&config, &source).await?;
        }
        Commands::Chunks {
            source,
            limit,
            json,
        } => {
            let source = source.unwrap_or_else(|| config.source.dir.clone());
            chunks(&config, &source, limit, json)?;
        }
        Commands::Stats { store } => {
            let store = store.unwrap_or_else(|| config.store.path.clone());
            stats(&store).await?;
        }
    }

    Ok(())
}

fn indexer(config: &LexiConfig) -> Result<Indexer, Box<dyn std::error::Error>> {
    let embedder = HashingEmbedder::with_dimension(config.embedding.dimension)?;
    Ok(Indexer::new(config, Arc::new(embedder))?)
}

async fn build(config: &LexiConfig, source: &Path) -> Result<(), Box<dyn std::error::Error>> {
    info!("Building index from {}", source.display());

    let report = indexer(config)?.rebuild(source).await?;

    println!(
        "Indexed {} chunks from {} documents into {}",
        report.chunks,
        report.documents,
        report.store_path.display()
    );
    print_failures(&report.failures);

    Ok(())
}

fn chunks(
    config: &LexiConfig,
    source: &Path,
    limit: usize,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let output = indexer(config)?.preview(source)?;
    let shown: Vec<&Chunk> = output.chunks.iter().take(limit).collect();

    if json {
        println!("{}", serde_json::to_string_pretty(&shown)?);
        return Ok(());
    }

    println!(
        "{} chunks from {} documents ({} regulatory, {} handbook)\n",
        output.chunks.len(),
        output.documents(),
        output.regulatory_documents,
        output.handbook_documents
    );
    for chunk in shown {
        println!("{}\n", format_preview(chunk));
    }
    print_failures(&output.failures);

    Ok(())
}

async fn stats(path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    if !path.exists() {
        eprintln!(
            "No chunk store at {}. Run 'lexi build' first, or pass --store.",
            path.display()
        );
        std::process::exit(1);
    }

    let store = SqliteStore::open(path)?;
    let sources = store.source_stats().await?;

    println!("Chunk store: {}\n", path.display());
    for entry in &sources {
        println!("- {} [{}]: {} chunks", entry.source, entry.kind, entry.chunks);
    }
    println!("\nTotal: {} chunks", store.count().await?);

    Ok(())
}

fn format_preview(chunk: &Chunk) -> String {
    let preview: String = chunk.content.chars().take(PREVIEW_CHARS).collect();
    format!(
        "File: {} | Section: {} | Hash: {}\n{}",
        chunk.source_file,
        chunk.context_path,
        &chunk.content_hash()[..12],
        preview
    )
}

fn print_failures(failures: &[FileFailure]) {
    if failures.is_empty() {
        return;
    }

    eprintln!("{} file(s) skipped:", failures.len());
    for failure in failures {
        eprintln!("  {}: {}", failure.path.display(), failure.reason);
    }
}
