//! The node catalog: one [`NodeDefinition`] per node type, describing its
//! metadata, config schema, and declared resource bindings.
//!
//! The registry is a constructed value passed into the compiler, not ambient
//! state, so compilation stays pure and testable in isolation. The builtin
//! catalog covers every node type the stock generators know; editors with
//! custom palettes extend it through [`NodeRegistry::register`].

mod builtin;

use ahash::AHashMap;
use serde::Serialize;
use serde_json::Value;

use crate::artifact::BindingKind;

/// Node type tags understood by the builtin catalog and generators.
pub mod types {
    pub const ENTRY: &str = "entry";
    pub const RETURN: &str = "return";
    pub const HTTP_REQUEST: &str = "http-request";
    pub const KV_GET: &str = "kv-get";
    pub const KV_PUT: &str = "kv-put";
    pub const D1_QUERY: &str = "d1-query";
    pub const TRANSFORM: &str = "transform";
    pub const CONDITIONAL_ROUTER: &str = "conditional-router";
    pub const SLEEP: &str = "sleep";
    pub const VALIDATE: &str = "validate";
    pub const MCP_TOOL_INPUT: &str = "mcp-tool-input";
    pub const MCP_TOOL_OUTPUT: &str = "mcp-tool-output";
    pub const AI_GATEWAY: &str = "ai-gateway";
    pub const WORKERS_AI: &str = "workers-ai";
}

/// True for node types that can start a workflow.
pub fn is_entry_type(node_type: &str) -> bool {
    node_type == types::ENTRY || node_type == types::MCP_TOOL_INPUT
}

/// True for node types that produce the workflow's result.
pub fn is_return_type(node_type: &str) -> bool {
    node_type == types::RETURN || node_type == types::MCP_TOOL_OUTPUT
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeCategory {
    Trigger,
    Action,
    Data,
    Logic,
    Ai,
    Output,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfigKind {
    String,
    Number,
    Boolean,
    Object,
    Array,
}

/// One field of a node type's declarative config schema.
#[derive(Debug, Clone, Serialize)]
pub struct ConfigField {
    pub key: String,
    pub kind: ConfigKind,
    pub required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
}

impl ConfigField {
    pub fn new(key: &str, kind: ConfigKind) -> Self {
        Self {
            key: key.to_string(),
            kind,
            required: false,
            default: None,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn with_default(mut self, default: Value) -> Self {
        self.default = Some(default);
        self
    }
}

/// An abstract resource dependency a node type declares. The concrete binding
/// name is resolved against node config by `bindings::resolve_binding_name`.
#[derive(Debug, Clone, Serialize)]
pub struct BindingRequirement {
    pub kind: BindingKind,
    /// Config key holding an explicit binding name, when the type has one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config_key: Option<String>,
    /// Last-resort literal when neither config nor schema supplies a name.
    pub fallback: String,
    pub required: bool,
    /// Boolean config key gating this requirement (e.g. AI response caching).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enabled_by: Option<String>,
}

impl BindingRequirement {
    pub fn new(kind: BindingKind, fallback: &str) -> Self {
        Self {
            kind,
            config_key: None,
            fallback: fallback.to_string(),
            required: true,
            enabled_by: None,
        }
    }

    pub fn via_config(mut self, config_key: &str) -> Self {
        self.config_key = Some(config_key.to_string());
        self
    }

    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    pub fn gated_by(mut self, config_key: &str) -> Self {
        self.enabled_by = Some(config_key.to_string());
        self
    }
}

/// Everything the compiler knows about a node type.
#[derive(Debug, Clone, Serialize)]
pub struct NodeDefinition {
    pub node_type: String,
    pub name: String,
    pub description: String,
    pub category: NodeCategory,
    pub config_schema: Vec<ConfigField>,
    pub bindings: Vec<BindingRequirement>,
    /// Example output shown by the editor next to downstream references.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preset_output: Option<Value>,
}

impl NodeDefinition {
    pub fn schema_default(&self, key: &str) -> Option<&Value> {
        self.config_schema
            .iter()
            .find(|f| f.key == key)
            .and_then(|f| f.default.as_ref())
    }
}

/// The catalog of node definitions consumed by validation, code generation,
/// and binding collection.
pub struct NodeRegistry {
    definitions: AHashMap<String, NodeDefinition>,
}

impl NodeRegistry {
    /// An empty registry; useful for tests that exercise unknown-type paths.
    pub fn empty() -> Self {
        Self {
            definitions: AHashMap::new(),
        }
    }

    /// The full builtin catalog.
    pub fn builtin() -> Self {
        let mut registry = Self::empty();
        builtin::install(&mut registry);
        registry
    }

    pub fn register(&mut self, definition: NodeDefinition) {
        self.definitions
            .insert(definition.node_type.clone(), definition);
    }

    pub fn get_definition(&self, node_type: &str) -> Option<&NodeDefinition> {
        self.definitions.get(node_type)
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}

impl Default for NodeRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}
