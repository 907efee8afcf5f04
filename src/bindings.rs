//! Collects the external-resource bindings a compiled graph needs at deploy
//! time.
//!
//! Name resolution lives here and is shared with the code generators, so the
//! binding a node's fragment references and the binding the deployment
//! collaborator provisions can never drift apart.

use crate::artifact::{Binding, UsageSite};
use crate::graph::{Node, WorkflowGraph};
use crate::registry::{NodeDefinition, NodeRegistry};

/// Resolves the concrete binding name for a node: an explicit, non-placeholder
/// config value wins, then the node type's schema default, then the literal
/// fallback. The result is always sanitized to a bare identifier.
pub fn resolve_binding_name(
    node: &Node,
    definition: Option<&NodeDefinition>,
    config_key: &str,
    fallback: &str,
) -> String {
    if let Some(value) = node.config_str(config_key) {
        let value = value.trim();
        // "default" is the editor's unset placeholder, not a real name.
        if !value.is_empty() && value != "default" {
            return sanitize_binding_name(value);
        }
    }

    if let Some(default) = definition
        .and_then(|d| d.schema_default(config_key))
        .and_then(serde_json::Value::as_str)
    {
        return sanitize_binding_name(default);
    }

    sanitize_binding_name(fallback)
}

/// Reduces a raw name to a valid bare identifier usable in generated code.
pub fn sanitize_binding_name(raw: &str) -> String {
    let mut out: String = raw
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect();
    if out.is_empty() {
        out.push_str("BINDING");
    }
    if out.starts_with(|c: char| c.is_ascii_digit()) {
        out.insert(0, '_');
    }
    out
}

/// Walks every node in declaration order, resolves its declared binding
/// requirements, and merges them by `(kind, resolvedName)` while recording
/// each usage site for diagnostics.
pub fn collect_bindings(graph: &WorkflowGraph, registry: &NodeRegistry) -> Vec<Binding> {
    let mut bindings: Vec<Binding> = Vec::new();

    for node in &graph.nodes {
        let Some(definition) = registry.get_definition(&node.node_type) else {
            continue;
        };

        for requirement in &definition.bindings {
            if let Some(gate) = &requirement.enabled_by {
                if !node.config_bool(gate).unwrap_or(false) {
                    continue;
                }
            }

            let name = match &requirement.config_key {
                Some(key) => {
                    resolve_binding_name(node, Some(definition), key, &requirement.fallback)
                }
                None => sanitize_binding_name(&requirement.fallback),
            };

            let site = UsageSite {
                node_id: node.id.clone(),
                node_type: node.node_type.clone(),
            };

            match bindings
                .iter_mut()
                .find(|b| b.kind == requirement.kind && b.name == name)
            {
                Some(existing) => {
                    existing.required |= requirement.required;
                    existing.usage_sites.push(site);
                }
                None => bindings.push(Binding {
                    name,
                    kind: requirement.kind,
                    required: requirement.required,
                    usage_sites: vec![site],
                }),
            }
        }
    }

    bindings
}
