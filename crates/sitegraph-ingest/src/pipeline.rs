//! Ingestion orchestration
//!
//! One [`Ingestion`] drives a full run: resolve options, probe the base URL,
//! fetch global data and the sitemap concurrently, then walk the sitemap
//! depth-first pre-order, fetching and transforming each node's content and
//! registering it with the graph.
//!
//! Ordering invariant: a node is registered with the graph strictly before
//! any of its children is fetched, so parent ids are always resolvable while
//! a child is processed. Siblings are processed sequentially in sitemap array
//! order. Any concurrent redesign of the traversal must keep the
//! register-before-children constraint.

use crate::client::CmsClient;
use crate::config::{Options, RawOptions};
use crate::error::{IngestError, Result};
use crate::foreign_keys::rewrite_foreign_keys;
use crate::graph::{node_id, ContentGraph, ContentNode, NodeId, NodeInternal};
use crate::registry::TypeRegistry;
use crate::remote_files::{load_remote_files, FileCounters};
use crate::schema::build_common_interface;
use crate::sitemap::{fetch_sitemap, SitemapNode};
use crate::value::json_type_name;
use serde::Serialize;
use serde_json::{Map, Value};
use sitegraph_common::digest::content_digest;
use std::time::Instant;
use tracing::{debug, info};

/// Seed for the synthetic global-data node's id.
const GLOBAL_DATA_SEED: &str = "-1";

/// Type name of the synthetic global-data node (not prefixed, not registered
/// with the type registry; it is not part of the sitemap's type space).
const GLOBAL_TYPE_NAME: &str = "Global";

/// Counters reported after a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IngestStats {
    pub nodes_created: usize,
    pub files_created: usize,
    pub files_failed: usize,
    pub types_discovered: usize,
    pub elapsed_ms: u64,
}

/// Result of the node-sourcing phase.
pub struct SourceOutcome {
    pub registry: TypeRegistry,
    pub stats: IngestStats,
}

/// A configured ingestion run.
pub struct Ingestion {
    options: Options,
    client: CmsClient,
}

impl Ingestion {
    /// Resolve options and build the HTTP client.
    pub fn new(raw: RawOptions) -> Result<Self> {
        let options = raw.resolve()?;
        let client = CmsClient::new(&options)?;
        Ok(Ingestion { options, client })
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    /// Source all nodes, then declare the common interface over the
    /// discovered types.
    pub async fn run<G: ContentGraph>(&self, graph: &G) -> Result<IngestStats> {
        let outcome = self.source_nodes(graph).await?;
        self.customize_schema(graph, &outcome.registry);
        Ok(outcome.stats)
    }

    /// Fetch and register every node: the synthetic global-data node plus the
    /// whole sitemap tree.
    pub async fn source_nodes<G: ContentGraph>(&self, graph: &G) -> Result<SourceOutcome> {
        let started = Instant::now();

        if !self.client.probe().await {
            return Err(IngestError::Option {
                option: "url",
                problem: "missing, invalid, or not reachable".to_string(),
                value: format!("\"{}\"", self.options.url),
            });
        }

        info!(url = %self.options.url, "Starting ingestion");
        let graph: &dyn ContentGraph = graph;
        let counters = FileCounters::default();
        let mut registry = TypeRegistry::new();

        // Global data and the sitemap have no ordering relationship; fetch
        // them concurrently.
        let (global_fields, sitemap_root) = tokio::try_join!(
            self.fetch_global_data(),
            fetch_sitemap(&self.client, &self.options),
        )?;

        self.create_global_node(graph, global_fields);
        let mut nodes_created = 1;

        info!("Fetching nodes from CMS");
        let mut work: Vec<(SitemapNode, Option<NodeId>)> = vec![(sitemap_root, None)];
        while let Some((mut sitemap_node, parent)) = work.pop() {
            let children = std::mem::take(&mut sitemap_node.children);

            let id = self
                .load_node(graph, &sitemap_node, parent.as_ref(), &mut registry, &counters)
                .await?;
            nodes_created += 1;

            // Reversed so siblings pop in sitemap array order.
            for child in children.into_iter().rev() {
                work.push((child, Some(id.clone())));
            }
        }

        let stats = IngestStats {
            nodes_created,
            files_created: counters.created(),
            files_failed: counters.failed(),
            types_discovered: registry.len(),
            elapsed_ms: started.elapsed().as_millis() as u64,
        };
        info!("Ingestion completed: {:?}", stats);

        Ok(SourceOutcome { registry, stats })
    }

    /// Declare the shared interface and retrofit every discovered type.
    pub fn customize_schema<G: ContentGraph>(&self, graph: &G, registry: &TypeRegistry) {
        let definitions = build_common_interface(&self.options, registry);
        debug!(count = definitions.len(), "Registering type definitions");
        graph.define_types(definitions);
    }

    /// Fetch one node's content, transform its fields, and register it.
    async fn load_node(
        &self,
        graph: &dyn ContentGraph,
        sitemap_node: &SitemapNode,
        parent: Option<&NodeId>,
        registry: &mut TypeRegistry,
        counters: &FileCounters,
    ) -> Result<NodeId> {
        debug!(path = %sitemap_node.path, "Fetching node data");

        let url = self.client.url_for(&sitemap_node.path)?;
        let payload = self
            .client
            .get_json(&url)
            .await
            .map_err(|source| IngestError::NodeFetch {
                path: sitemap_node.path.clone(),
                source,
            })?;

        // Digest over the raw payload, before any field is rewritten.
        let digest = content_digest(&payload);
        let raw_fields = match payload {
            Value::Object(map) => map,
            other => {
                return Err(IngestError::NodePayload {
                    path: sitemap_node.path.clone(),
                    type_name: json_type_name(&other),
                })
            },
        };

        let id = node_id(&sitemap_node.id.seed());

        // Remote files first, foreign keys second; the two passes own
        // disjoint key sets (resolver-enforced).
        let fields =
            load_remote_files(raw_fields, &id, &self.client, graph, &self.options, counters)
                .await?;
        let fields = rewrite_foreign_keys(fields, &self.options)?;

        graph.create_node(ContentNode {
            id: id.clone(),
            parent: parent.cloned(),
            children: vec![],
            internal: NodeInternal {
                type_name: sitemap_node.type_name.clone(),
                content_digest: digest,
            },
            fields,
        });
        registry.register(&sitemap_node.type_name);
        if let Some(parent_id) = parent {
            graph.create_parent_child_link(parent_id, &id);
        }

        Ok(id)
    }

    async fn fetch_global_data(&self) -> Result<Map<String, Value>> {
        let route = &self.options.global_data_route;
        debug!(route, "Fetching global site data");

        let url = self.client.url_for(route)?;
        let payload = self
            .client
            .get_json(&url)
            .await
            .map_err(|source| IngestError::GlobalDataFetch {
                route: route.clone(),
                source,
            })?;

        match payload {
            Value::Object(map) => Ok(map),
            other => Err(IngestError::NodePayload {
                path: route.clone(),
                type_name: json_type_name(&other),
            }),
        }
    }

    fn create_global_node(&self, graph: &dyn ContentGraph, fields: Map<String, Value>) {
        let digest = content_digest(&Value::Object(fields.clone()));
        graph.create_node(ContentNode {
            id: node_id(GLOBAL_DATA_SEED),
            parent: None,
            children: vec![],
            internal: NodeInternal {
                type_name: GLOBAL_TYPE_NAME.to_string(),
                content_digest: digest,
            },
            fields,
        });
    }
}
