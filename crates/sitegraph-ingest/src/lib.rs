//! Sitegraph Ingest Library
//!
//! Ingests a hierarchical sitemap and per-node content from a CMS-style HTTP
//! API into a content graph, rewriting foreign-key fields into graph
//! references and downloading remote files into file nodes.
//!
//! The graph itself is abstracted behind [`ContentGraph`]; [`MemoryGraph`] is
//! the bundled in-memory implementation.
//!
//! # Example
//!
//! ```no_run
//! use sitegraph_ingest::{Ingestion, MemoryGraph, RawOptions};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let ingestion = Ingestion::new(RawOptions {
//!         url: Some("https://cms.example.com/api".to_string()),
//!         ..RawOptions::default()
//!     })?;
//!
//!     let graph = MemoryGraph::new();
//!     let stats = ingestion.run(&graph).await?;
//!     tracing::info!("ingested {} nodes", stats.nodes_created);
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod foreign_keys;
pub mod graph;
pub mod pipeline;
pub mod registry;
pub mod remote_files;
pub mod schema;
pub mod sitemap;
pub mod value;

// Re-export commonly used types
pub use config::{Options, RawOptions};
pub use error::{IngestError, Result};
pub use graph::{node_id, ContentGraph, ContentNode, FileNode, MemoryGraph, NodeId};
pub use pipeline::{IngestStats, Ingestion, SourceOutcome};
pub use registry::TypeRegistry;
pub use schema::TypeDefinition;
