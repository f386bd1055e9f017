//! Foreign-key field rewriting
//!
//! Keys ending in the configured foreign-key suffix hold CMS ids (or arrays
//! of ids) pointing at other sitemap nodes. They are replaced with reference
//! fields holding the targets' stable graph ids, so the host graph can
//! resolve them without knowing anything about CMS id formats.
//!
//! A pure structural transform: the input map is consumed and a new map is
//! returned, nested objects and arrays included. The suffix check happens
//! before container recursion, so a marked key is never also treated as a
//! nested container.

use crate::config::Options;
use crate::error::{FieldKind, IngestError, Result};
use crate::graph::{node_id, reference_key};
use crate::value::{id_seed, is_id_like, json_type_name};
use serde_json::{Map, Value};
use tracing::trace;

/// Rewrite all foreign-key fields in a node's content fields.
pub fn rewrite_foreign_keys(fields: Map<String, Value>, options: &Options) -> Result<Map<String, Value>> {
    rewrite_object(fields, &options.foreign_key_suffix)
}

fn rewrite_object(object: Map<String, Value>, suffix: &str) -> Result<Map<String, Value>> {
    let mut result = Map::new();

    for (key, value) in object {
        if key.ends_with(suffix) {
            let (new_key, new_value) = rewrite_field(&key, value, suffix)?;
            result.insert(new_key, new_value);
        } else {
            let new_value = match value {
                Value::Object(nested) => Value::Object(rewrite_object(nested, suffix)?),
                Value::Array(items) => Value::Array(rewrite_array(items, suffix)?),
                other => other,
            };
            result.insert(key, new_value);
        }
    }

    Ok(result)
}

fn rewrite_array(items: Vec<Value>, suffix: &str) -> Result<Vec<Value>> {
    items
        .into_iter()
        .map(|value| {
            Ok(match value {
                Value::Object(nested) => Value::Object(rewrite_object(nested, suffix)?),
                Value::Array(nested) => Value::Array(rewrite_array(nested, suffix)?),
                other => other,
            })
        })
        .collect()
}

/// Replace one marked field with its reference field.
fn rewrite_field(key: &str, value: Value, suffix: &str) -> Result<(String, Value)> {
    let replacement = if is_id_like(&value) {
        trace!(key, %value, "Rewriting foreign key field");
        Value::String(node_id(&id_seed(&value)).to_string())
    } else if let Value::Array(items) = &value {
        if let Some(offending) = items.iter().find(|item| !is_id_like(item)) {
            return Err(IngestError::ForeignKey {
                kind: FieldKind::Array,
                key: key.to_string(),
                value: offending.to_string(),
                type_name: json_type_name(offending),
            });
        }
        trace!(key, "Rewriting foreign key array");
        Value::Array(
            items
                .iter()
                .map(|item| Value::String(node_id(&id_seed(item)).to_string()))
                .collect(),
        )
    } else {
        return Err(IngestError::ForeignKey {
            kind: FieldKind::Field,
            key: key.to_string(),
            value: value.to_string(),
            type_name: json_type_name(&value),
        });
    };

    Ok((reference_key(key, suffix), replacement))
}
