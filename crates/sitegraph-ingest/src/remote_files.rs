//! Remote-file field loading
//!
//! Fields marked by the remote-file suffix (or, legacy variant, by exact
//! membership in `imageKeys`) hold URLs of files to download and register as
//! file nodes owned by the content node being ingested.
//!
//! Files are best-effort enrichment: a failed download logs a warning and
//! leaves the original value in place, never aborting the run. This is the
//! one recoverable failure in the whole pipeline (see `error`). A
//! suffix-marked key holding something other than a URL string or an array of
//! URL strings is still a fatal type error, like a bad foreign-key field.
//!
//! Array policy: elements download concurrently and degrade per element.
//! Failed elements keep their original URL, successful ones become file ids,
//! and the key is renamed to the reference key only when every element
//! materialized, so a partially-degraded array never looks like a clean
//! reference field.

use crate::client::CmsClient;
use crate::config::Options;
use crate::error::{FieldKind, IngestError, Result};
use crate::graph::{node_id, reference_key, ContentGraph, FileNode, NodeId};
use crate::value::json_type_name;
use futures::future::{join_all, BoxFuture, FutureExt};
use serde_json::{Map, Value};
use sitegraph_common::digest::digest_bytes;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::{debug, warn};

/// Download counters for run statistics.
#[derive(Debug, Default)]
pub struct FileCounters {
    created: AtomicUsize,
    failed: AtomicUsize,
}

impl FileCounters {
    pub fn created(&self) -> usize {
        self.created.load(Ordering::Relaxed)
    }

    pub fn failed(&self) -> usize {
        self.failed.load(Ordering::Relaxed)
    }

    fn record_created(&self) {
        self.created.fetch_add(1, Ordering::Relaxed);
    }

    fn record_failed(&self) {
        self.failed.fetch_add(1, Ordering::Relaxed);
    }
}

/// Everything a recursive step needs, bundled so the signatures stay flat.
#[derive(Clone, Copy)]
struct Ctx<'a> {
    owner: &'a NodeId,
    client: &'a CmsClient,
    graph: &'a dyn ContentGraph,
    options: &'a Options,
    counters: &'a FileCounters,
}

/// Load all remote files referenced by a node's content fields.
pub async fn load_remote_files(
    fields: Map<String, Value>,
    owner: &NodeId,
    client: &CmsClient,
    graph: &dyn ContentGraph,
    options: &Options,
    counters: &FileCounters,
) -> Result<Map<String, Value>> {
    debug!("Looking for remote file fields on node");
    load_object(
        fields,
        Ctx {
            owner,
            client,
            graph,
            options,
            counters,
        },
    )
    .await
}

fn load_object<'a>(object: Map<String, Value>, ctx: Ctx<'a>) -> BoxFuture<'a, Result<Map<String, Value>>> {
    async move {
        let mut result = Map::new();

        for (key, value) in object {
            if key.ends_with(&ctx.options.remote_file_suffix) {
                let (new_key, new_value) = load_file_field(&key, value, ctx).await?;
                result.insert(new_key, new_value);
                continue;
            }

            match value {
                Value::Object(nested) => {
                    result.insert(key, Value::Object(load_object(nested, ctx).await?));
                },
                Value::Array(items) => {
                    result.insert(key, Value::Array(load_array(items, ctx).await?));
                },
                other if ctx.options.image_keys.iter().any(|image_key| image_key == &key) => {
                    let (new_key, new_value) = load_image_field(&key, other, ctx).await;
                    result.insert(new_key, new_value);
                },
                other => {
                    result.insert(key, other);
                },
            }
        }

        Ok(result)
    }
    .boxed()
}

fn load_array<'a>(items: Vec<Value>, ctx: Ctx<'a>) -> BoxFuture<'a, Result<Vec<Value>>> {
    async move {
        let mut result = Vec::with_capacity(items.len());

        for value in items {
            let new_value = match value {
                Value::Object(nested) => Value::Object(load_object(nested, ctx).await?),
                Value::Array(nested) => Value::Array(load_array(nested, ctx).await?),
                other => other,
            };
            result.push(new_value);
        }

        Ok(result)
    }
    .boxed()
}

/// Handle one suffix-marked field.
async fn load_file_field(key: &str, value: Value, ctx: Ctx<'_>) -> Result<(String, Value)> {
    let suffix = &ctx.options.remote_file_suffix;

    match value {
        Value::String(url) => {
            debug!(key, "Handling remote file field");
            match load_remote_file(&url, ctx).await {
                Some(file_id) => Ok((reference_key(key, suffix), Value::String(file_id.to_string()))),
                None => Ok((key.to_string(), Value::String(url))),
            }
        },
        Value::Array(items) if items.iter().all(Value::is_string) => {
            debug!(key, count = items.len(), "Handling remote file array");
            let urls: Vec<String> = items
                .iter()
                .filter_map(|item| item.as_str().map(String::from))
                .collect();

            let downloads = join_all(urls.iter().map(|url| load_remote_file(url, ctx))).await;
            let all_materialized = downloads.iter().all(Option::is_some);

            let elements: Vec<Value> = urls
                .into_iter()
                .zip(downloads)
                .map(|(url, file_id)| match file_id {
                    Some(id) => Value::String(id.to_string()),
                    None => Value::String(url),
                })
                .collect();

            if all_materialized {
                Ok((reference_key(key, suffix), Value::Array(elements)))
            } else {
                Ok((key.to_string(), Value::Array(elements)))
            }
        },
        other => {
            let (kind, offending) = match &other {
                Value::Array(items) => (
                    FieldKind::Array,
                    items.iter().find(|item| !item.is_string()).cloned().unwrap_or(Value::Null),
                ),
                value => (FieldKind::Field, value.clone()),
            };
            Err(IngestError::RemoteFile {
                kind,
                key: key.to_string(),
                value: offending.to_string(),
                type_name: json_type_name(&offending),
            })
        },
    }
}

/// Handle one legacy image key (scalar values only; containers are recursed
/// before membership is checked, as in the original variant).
async fn load_image_field(key: &str, value: Value, ctx: Ctx<'_>) -> (String, Value) {
    if let Value::String(url) = &value {
        debug!(key, url, "Loading image");
        if let Some(file_id) = load_remote_file(url, ctx).await {
            return (reference_key(key, ""), Value::String(file_id.to_string()));
        }
    }

    warn!(key, %value, "Unable to load image, using the original value of the field");
    (key.to_string(), value)
}

/// Download a file and register it with the graph.
///
/// Returns `None` on any failure; callers decide how the field degrades.
async fn load_remote_file(url: &str, ctx: Ctx<'_>) -> Option<NodeId> {
    debug!(url, "Loading remote file");

    let request_url = match ctx.client.url_for(url) {
        Ok(parsed) => parsed,
        Err(error) => {
            warn!(url, %error, "Invalid remote file URL, keeping the original field value");
            ctx.counters.record_failed();
            return None;
        },
    };

    match ctx.client.get_bytes(&request_url).await {
        Ok(content) => {
            let file = FileNode {
                id: node_id(&format!("file:{url}")),
                parent: ctx.owner.clone(),
                url: url.to_string(),
                content_type: content.content_type,
                size: content.bytes.len() as u64,
                content_digest: digest_bytes(&content.bytes),
            };
            ctx.counters.record_created();
            Some(ctx.graph.create_file_node(file))
        },
        Err(error) => {
            warn!(url, %error, "Problem loading remote file, keeping the original field value");
            ctx.counters.record_failed();
            None
        },
    }
}
