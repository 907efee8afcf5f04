//! Common test utilities for building workflow graphs.
use flowforge::prelude::*;
use serde_json::json;

/// `entry -> http-request -> return`, the smallest deployable graph.
#[allow(dead_code)]
pub fn simple_graph() -> WorkflowGraph {
    WorkflowGraph {
        id: "wf-simple".to_string(),
        name: "Order Sync".to_string(),
        nodes: vec![
            Node::new("n1", "entry").with_label("Start"),
            Node::new("n2", "http-request")
                .with_label("Fetch Orders")
                .with_config("url", json!("https://api.example.com/orders"))
                .with_config("method", json!("GET")),
            Node::new("n3", "return")
                .with_label("Done")
                .with_config("value", json!("{{state.n2.output.body}}")),
        ],
        edges: vec![Edge::new("e1", "n1", "n2"), Edge::new("e2", "n2", "n3")],
    }
}

/// Two-node cycle: `a -> b -> a`.
#[allow(dead_code)]
pub fn cyclic_graph() -> WorkflowGraph {
    WorkflowGraph {
        id: "wf-cycle".to_string(),
        name: "Cycle".to_string(),
        nodes: vec![
            Node::new("a", "entry"),
            Node::new("b", "transform").with_config("code", json!("input")),
        ],
        edges: vec![Edge::new("e1", "a", "b"), Edge::new("e2", "b", "a")],
    }
}

/// Diamond: `entry -> (left, right) -> join -> return`.
#[allow(dead_code)]
pub fn diamond_graph() -> WorkflowGraph {
    WorkflowGraph {
        id: "wf-diamond".to_string(),
        name: "Diamond".to_string(),
        nodes: vec![
            Node::new("start", "entry"),
            Node::new("left", "transform").with_config("code", json!("input")),
            Node::new("right", "transform").with_config("code", json!("input")),
            Node::new("join", "transform").with_config("code", json!("input")),
            Node::new("end", "return"),
        ],
        edges: vec![
            Edge::new("e1", "start", "left"),
            Edge::new("e2", "start", "right"),
            Edge::new("e3", "left", "join"),
            Edge::new("e4", "right", "join"),
            Edge::new("e5", "join", "end"),
        ],
    }
}

/// Entry plus two KV writers sharing one literal namespace.
#[allow(dead_code)]
pub fn shared_namespace_graph() -> WorkflowGraph {
    WorkflowGraph {
        id: "wf-kv".to_string(),
        name: "Session Store".to_string(),
        nodes: vec![
            Node::new("n1", "entry"),
            Node::new("n2", "kv-put")
                .with_config("namespace", json!("SESSIONS"))
                .with_config("key", json!("a"))
                .with_config("value", json!("1")),
            Node::new("n3", "kv-put")
                .with_config("namespace", json!("SESSIONS"))
                .with_config("key", json!("b"))
                .with_config("value", json!("2")),
            Node::new("n4", "return"),
        ],
        edges: vec![
            Edge::new("e1", "n1", "n2"),
            Edge::new("e2", "n2", "n3"),
            Edge::new("e3", "n3", "n4"),
        ],
    }
}

/// Tool-invocable graph: `mcp-tool-input -> transform -> mcp-tool-output`.
#[allow(dead_code)]
pub fn tool_graph() -> WorkflowGraph {
    WorkflowGraph {
        id: "wf-tool".to_string(),
        name: "Lookup Customer".to_string(),
        nodes: vec![
            Node::new("in", "mcp-tool-input")
                .with_config("toolName", json!("lookup_customer"))
                .with_config("description", json!("Looks up a customer record"))
                .with_config(
                    "parameters",
                    json!([
                        { "name": "customerId", "type": "string", "required": true },
                        { "name": "verbose", "type": "boolean", "required": false }
                    ]),
                ),
            Node::new("t", "transform").with_config("code", json!("input")),
            Node::new("out", "mcp-tool-output"),
        ],
        edges: vec![Edge::new("e1", "in", "t"), Edge::new("e2", "t", "out")],
    }
}
