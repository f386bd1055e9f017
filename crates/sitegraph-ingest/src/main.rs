//! Sitegraph Ingest - CMS content ingestion tool

use anyhow::Result;
use clap::Parser;
use sitegraph_common::logging::{init_logging, LogConfig, LogLevel};
use sitegraph_ingest::{Ingestion, MemoryGraph, RawOptions};
use std::path::PathBuf;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "sitegraph-ingest")]
#[command(author, version, about = "Ingest a CMS sitemap into a content graph")]
struct Cli {
    /// Base URL of the CMS API
    #[arg(long, env = "SITEGRAPH_URL")]
    url: String,

    /// Route serving the sitemap payload
    #[arg(long)]
    sitemap_route: Option<String>,

    /// Route serving the global site data
    #[arg(long)]
    global_data_route: Option<String>,

    /// Prefix applied to discovered content-type names
    #[arg(long)]
    type_prefix: Option<String>,

    /// Suffix marking foreign-key fields
    #[arg(long)]
    foreign_key_suffix: Option<String>,

    /// Suffix marking remote-file fields
    #[arg(long)]
    remote_file_suffix: Option<String>,

    /// Exact key treated as an image URL (repeatable, legacy)
    #[arg(long = "image-key")]
    image_keys: Vec<String>,

    /// HTTP timeout in seconds
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// Write the resulting graph as JSON to this file
    #[arg(long)]
    dump: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut log_config = LogConfig::from_env()?;
    if cli.verbose {
        log_config.level = LogLevel::Debug;
    }
    init_logging(&log_config)?;

    let raw = RawOptions {
        url: Some(cli.url),
        sitemap_route: cli.sitemap_route,
        global_data_route: cli.global_data_route,
        type_prefix: cli.type_prefix,
        foreign_key_suffix: cli.foreign_key_suffix,
        remote_file_suffix: cli.remote_file_suffix,
        image_keys: (!cli.image_keys.is_empty()).then_some(cli.image_keys),
        timeout_secs: cli.timeout_secs,
        ..RawOptions::default()
    };

    let ingestion = Ingestion::new(raw)?;
    let graph = MemoryGraph::new();
    let stats = ingestion.run(&graph).await?;

    info!(
        nodes = stats.nodes_created,
        files = stats.files_created,
        failed_files = stats.files_failed,
        types = stats.types_discovered,
        elapsed_ms = stats.elapsed_ms,
        "Ingestion complete"
    );

    if let Some(path) = cli.dump {
        let file = std::fs::File::create(&path)?;
        serde_json::to_writer_pretty(file, &graph.snapshot())?;
        info!(path = %path.display(), "Graph written");
    }

    Ok(())
}
