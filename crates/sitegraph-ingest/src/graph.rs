//! The content graph the ingestion pipeline writes into
//!
//! The host graph is abstracted behind [`ContentGraph`] so the pipeline can
//! target any node store; [`MemoryGraph`] is the in-memory implementation
//! used by the CLI and the test suite.
//!
//! Node ids are derived deterministically from CMS ids ([`node_id`]), so
//! re-ingesting the same site updates nodes instead of duplicating them, and
//! foreign-key fields can be rewritten into references without looking the
//! target node up first.

use crate::schema::TypeDefinition;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

/// Suffix marking a field as a graph reference.
pub const REFERENCE_SUFFIX: &str = "___NODE";

/// Namespace for deriving stable node ids from CMS id seeds.
const NODE_ID_NAMESPACE: Uuid = Uuid::NAMESPACE_OID;

/// Stable identifier of a node in the content graph.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeId(Uuid);

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Derive the stable graph id for a CMS id seed.
///
/// UUID v5 over a fixed namespace: equal seeds map to equal ids across runs
/// and processes, which is what makes foreign-key rewriting and re-ingestion
/// work.
pub fn node_id(seed: &str) -> NodeId {
    NodeId(Uuid::new_v5(&NODE_ID_NAMESPACE, format!("sitegraph:{seed}").as_bytes()))
}

/// Turn a marked key into its graph reference key, stripping `suffix` first.
///
/// `reference_key("author___ID", "___ID")` is `"author___NODE"`; with an
/// empty suffix the original key is kept whole (legacy image keys).
pub fn reference_key(key: &str, suffix: &str) -> String {
    let stripped = &key[..key.len() - suffix.len()];
    format!("{stripped}{REFERENCE_SUFFIX}")
}

/// Graph-facing metadata of a content node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeInternal {
    /// Decorated content-type name
    #[serde(rename = "type")]
    pub type_name: String,
    /// Digest of the raw fetched payload, used for change detection
    pub content_digest: String,
}

/// A materialized content node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentNode {
    pub id: NodeId,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    pub internal: NodeInternal,
    /// Transformed content fields
    pub fields: Map<String, Value>,
}

/// A materialized remote file, owned by the content node it was found on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileNode {
    pub id: NodeId,
    pub parent: NodeId,
    pub url: String,
    pub content_type: Option<String>,
    pub size: u64,
    pub content_digest: String,
}

/// The node store the pipeline writes into.
///
/// Methods take `&self`; implementations synchronize internally. The pipeline
/// itself is single-writer (see `pipeline`), but the global-data and sitemap
/// loaders run concurrently at the top level.
pub trait ContentGraph: Send + Sync {
    /// Register a content node. Registering an id again replaces the node.
    fn create_node(&self, node: ContentNode);

    /// Record a parent/child edge between two registered nodes.
    fn create_parent_child_link(&self, parent: &NodeId, child: &NodeId);

    /// Register a downloaded file and return its id.
    fn create_file_node(&self, file: FileNode) -> NodeId;

    /// Hand the generated type definitions to the host schema.
    fn define_types(&self, definitions: Vec<TypeDefinition>);
}

/// In-memory [`ContentGraph`] used by the CLI and tests.
#[derive(Debug, Default)]
pub struct MemoryGraph {
    inner: Mutex<GraphSnapshot>,
}

/// Owned copy of a [`MemoryGraph`]'s contents.
#[derive(Debug, Default, Clone, Serialize)]
pub struct GraphSnapshot {
    pub nodes: Vec<ContentNode>,
    pub files: Vec<FileNode>,
    pub links: Vec<(NodeId, NodeId)>,
    pub types: Vec<TypeDefinition>,
}

impl MemoryGraph {
    pub fn new() -> Self {
        Self::default()
    }

    fn inner(&self) -> MutexGuard<'_, GraphSnapshot> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn nodes(&self) -> Vec<ContentNode> {
        self.inner().nodes.clone()
    }

    pub fn node(&self, id: &NodeId) -> Option<ContentNode> {
        self.inner().nodes.iter().find(|n| &n.id == id).cloned()
    }

    pub fn files(&self) -> Vec<FileNode> {
        self.inner().files.clone()
    }

    pub fn links(&self) -> Vec<(NodeId, NodeId)> {
        self.inner().links.clone()
    }

    pub fn type_definitions(&self) -> Vec<TypeDefinition> {
        self.inner().types.clone()
    }

    pub fn snapshot(&self) -> GraphSnapshot {
        self.inner().clone()
    }
}

impl ContentGraph for MemoryGraph {
    fn create_node(&self, node: ContentNode) {
        let mut inner = self.inner();
        match inner.nodes.iter_mut().find(|n| n.id == node.id) {
            Some(existing) => *existing = node,
            None => inner.nodes.push(node),
        }
    }

    fn create_parent_child_link(&self, parent: &NodeId, child: &NodeId) {
        let mut inner = self.inner();
        inner.links.push((parent.clone(), child.clone()));
        if let Some(parent_node) = inner.nodes.iter_mut().find(|n| &n.id == parent) {
            if !parent_node.children.contains(child) {
                parent_node.children.push(child.clone());
            }
        }
    }

    fn create_file_node(&self, file: FileNode) -> NodeId {
        let id = file.id.clone();
        let mut inner = self.inner();
        match inner.files.iter_mut().find(|f| f.id == file.id) {
            Some(existing) => *existing = file,
            None => inner.files.push(file),
        }
        id
    }

    fn define_types(&self, definitions: Vec<TypeDefinition>) {
        self.inner().types = definitions;
    }
}
