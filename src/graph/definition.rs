use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::CompileError;

/// The complete, canonical definition of a workflow graph, ready for compilation.
/// This is the target structure for any custom canvas-format conversion.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorkflowGraph {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub edges: Vec<Edge>,
}

impl WorkflowGraph {
    /// Parses a graph from its JSON wire form (the shape the canvas editor saves).
    pub fn from_json(raw: &str) -> Result<Self, CompileError> {
        serde_json::from_str(raw).map_err(|e| CompileError::JsonParseError(e.to_string()))
    }

    pub fn node_by_id(&self, node_id: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == node_id)
    }
}

/// A single typed unit of work in the graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    pub id: String,
    #[serde(rename = "type")]
    pub node_type: String,
    #[serde(default)]
    pub position: Position,
    #[serde(default)]
    pub data: NodeData,
}

impl Node {
    pub fn new(id: impl Into<String>, node_type: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            node_type: node_type.into(),
            position: Position::default(),
            data: NodeData::default(),
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.data.label = label.into();
        self
    }

    pub fn with_config(mut self, key: impl Into<String>, value: Value) -> Self {
        self.data.config.insert(key.into(), value);
        self
    }

    /// The human-facing name of the node: its label when present, else its type.
    pub fn display_name(&self) -> &str {
        if self.data.label.is_empty() {
            &self.node_type
        } else {
            &self.data.label
        }
    }

    pub fn config(&self, key: &str) -> Option<&Value> {
        self.data.config.get(key)
    }

    pub fn config_str(&self, key: &str) -> Option<&str> {
        self.config(key).and_then(Value::as_str)
    }

    pub fn config_u64(&self, key: &str) -> Option<u64> {
        self.config(key).and_then(Value::as_u64)
    }

    pub fn config_f64(&self, key: &str) -> Option<f64> {
        self.config(key).and_then(Value::as_f64)
    }

    pub fn config_bool(&self, key: &str) -> Option<bool> {
        self.config(key).and_then(Value::as_bool)
    }

    pub fn config_array(&self, key: &str) -> Option<&Vec<Value>> {
        self.config(key).and_then(Value::as_array)
    }

    pub fn config_object(&self, key: &str) -> Option<&Map<String, Value>> {
        self.config(key).and_then(Value::as_object)
    }
}

/// Canvas coordinates. Carried through compilation untouched so a recompile
/// round-trip does not lose editor layout.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
}

/// The editable payload of a node: a display label plus type-specific config.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NodeData {
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub config: Map<String, Value>,
}

/// A directed dependency/data-flow link between two nodes. `source_handle`
/// disambiguates multi-output nodes such as a router's named cases.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Edge {
    #[serde(default)]
    pub id: String,
    pub source: String,
    pub target: String,
    #[serde(
        rename = "sourceHandle",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub source_handle: Option<String>,
}

impl Edge {
    pub fn new(id: impl Into<String>, source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            source: source.into(),
            target: target.into(),
            source_handle: None,
        }
    }

    pub fn with_handle(mut self, handle: impl Into<String>) -> Self {
        self.source_handle = Some(handle.into());
        self
    }
}
