//! Common-interface generation over discovered content types
//!
//! After ingestion, every discovered concrete type is retrofitted to
//! implement one shared interface, so consumers can query all content nodes
//! uniformly regardless of their CMS type. The interface carries the graph's
//! base fields plus whatever the `commonInterface.fields` option adds.

use crate::config::Options;
use crate::registry::TypeRegistry;
use serde::Serialize;

/// Name of the host graph's base node interface.
pub const NODE_INTERFACE: &str = "Node";

/// A type definition handed to the host schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TypeDefinition {
    /// The shared interface, with its rendered field block
    Interface { name: String, body: String },
    /// A concrete object type and the interfaces it implements
    Object { name: String, interfaces: Vec<String> },
}

/// Build the shared interface plus one object type per registered concrete
/// type.
pub fn build_common_interface(options: &Options, registry: &TypeRegistry) -> Vec<TypeDefinition> {
    let interface = &options.common_interface;

    let mut definitions = vec![TypeDefinition::Interface {
        name: interface.name.clone(),
        body: render_interface_body(&interface.fields),
    }];

    for type_name in registry.all() {
        definitions.push(TypeDefinition::Object {
            name: type_name.clone(),
            interfaces: vec![NODE_INTERFACE.to_string(), interface.name.clone()],
        });
    }

    definitions
}

fn render_interface_body(fields: &std::collections::BTreeMap<String, String>) -> String {
    let mut body = String::from(
        "  id: ID!\n  parent: Node\n  children: [Node!]!\n  internal: Internal!\n",
    );
    for (name, type_name) in fields {
        body.push_str(&format!("  {name}: {type_name}\n"));
    }
    body
}
