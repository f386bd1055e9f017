//! Sitemap fetching, validation, and decoration
//!
//! The sitemap drives the whole traversal, so its shape is checked before any
//! node content is fetched. Validation is depth-first pre-order: each node's
//! own shape is checked (children only shallowly, as an array of objects),
//! then `path` and the decorated type name are computed, then children are
//! validated with this node's path as their parent path.

use crate::client::CmsClient;
use crate::config::Options;
use crate::error::{IngestError, Result};
use crate::value::upper_first;
use serde_json::Value;
use tracing::debug;

/// A sitemap node id: a non-empty string or a number.
#[derive(Debug, Clone, PartialEq)]
pub enum SitemapId {
    Text(String),
    Number(serde_json::Number),
}

impl SitemapId {
    /// Seed for deriving the node's stable graph id.
    ///
    /// Numbers render in decimal, so the id `42` and the string `"42"` seed
    /// the same graph id (matching foreign-key seeds, see `value::id_seed`).
    pub fn seed(&self) -> String {
        match self {
            SitemapId::Text(s) => s.clone(),
            SitemapId::Number(n) => n.to_string(),
        }
    }
}

impl std::fmt::Display for SitemapId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SitemapId::Text(s) => write!(f, "{s}"),
            SitemapId::Number(n) => write!(f, "{n}"),
        }
    }
}

/// A validated, decorated sitemap node.
#[derive(Debug, Clone, PartialEq)]
pub struct SitemapNode {
    pub id: SitemapId,
    pub url_segment: String,
    /// Decorated content-type name: `type_prefix` + upper-first raw type
    pub type_name: String,
    /// Full path from the root, used as the content fetch route
    pub path: String,
    pub children: Vec<SitemapNode>,
}

/// Fetch the sitemap payload and validate/decorate the whole tree.
pub async fn fetch_sitemap(client: &CmsClient, options: &Options) -> Result<SitemapNode> {
    let route = &options.sitemap_route;
    debug!(route, "Fetching sitemap");

    let url = client.url_for(route)?;
    let payload = client
        .get_json(&url)
        .await
        .map_err(|source| IngestError::SitemapFetch {
            route: route.clone(),
            source,
        })?;

    debug!("Validating and prepping sitemap");
    let root = payload.get("root").cloned().unwrap_or(Value::Null);
    validate_and_prep(&root, options)
}

/// Validate and decorate a sitemap tree, depth-first pre-order.
pub fn validate_and_prep(root: &Value, options: &Options) -> Result<SitemapNode> {
    validate_and_prep_node(root, "", options)
}

fn validate_and_prep_node(node: &Value, parent_path: &str, options: &Options) -> Result<SitemapNode> {
    let Some(object) = node.as_object() else {
        return Err(shape_error("root", Some(node), node));
    };

    let id = match object.get("id") {
        Some(Value::String(s)) if !s.is_empty() => SitemapId::Text(s.clone()),
        Some(Value::Number(n)) => SitemapId::Number(n.clone()),
        other => return Err(shape_error("id", other, node)),
    };

    let url_segment = match object.get("urlSegment") {
        Some(Value::String(s)) => s.clone(),
        other => return Err(shape_error("urlSegment", other, node)),
    };

    let raw_type = match object.get("type") {
        Some(Value::String(s)) if !s.is_empty() => s.clone(),
        other => return Err(shape_error("type", other, node)),
    };

    // Children are checked shallowly here; each child's full shape is checked
    // when the recursion reaches it.
    let raw_children = match object.get("children") {
        Some(Value::Array(items)) if items.iter().all(Value::is_object) => items,
        other => return Err(shape_error("children", other, node)),
    };

    let path = join_path(parent_path, &url_segment);
    let type_name = format!("{}{}", options.type_prefix, upper_first(&raw_type));

    let children = raw_children
        .iter()
        .map(|child| validate_and_prep_node(child, &path, options))
        .collect::<Result<Vec<_>>>()?;

    Ok(SitemapNode {
        id,
        url_segment,
        type_name,
        path,
        children,
    })
}

/// Join a parent path and a segment, collapsing an accidental leading `//`.
fn join_path(parent_path: &str, segment: &str) -> String {
    let mut path = format!("{parent_path}/{segment}");
    if path.starts_with("//") {
        path.remove(0);
    }
    path
}

fn shape_error(property: &'static str, value: Option<&Value>, node: &Value) -> IngestError {
    IngestError::SitemapNode {
        property,
        value: value.map(Value::to_string).unwrap_or_else(|| "undefined".to_string()),
        node: node.to_string(),
    }
}
