//! # Flowforge - Workflow Graph Compiler
//!
//! **Flowforge** compiles declarative workflow graphs, the node-and-edge
//! documents a visual canvas editor saves, into deployable worker modules:
//! JavaScript source exporting a durable-workflow entrypoint class plus a
//! fetch handler, together with the resource bindings and deployment
//! descriptor the artifact needs at provision time.
//!
//! ## Core Workflow
//!
//! The compiler is format-agnostic. It operates on a canonical
//! [`WorkflowGraph`](graph::WorkflowGraph) model:
//!
//! 1.  **Load Your Graph**: Parse the editor's JSON directly with
//!     [`WorkflowGraph::from_json`](graph::WorkflowGraph::from_json), or
//!     implement [`IntoWorkflow`](graph::IntoWorkflow) for a custom canvas
//!     format.
//! 2.  **Compile**: Use [`Compiler::builder`](codegen::Compiler::builder) to
//!     configure a compiler (node catalog, options, custom generators) and
//!     call `compile()`.
//! 3.  **Deploy**: Hand the resulting
//!     [`CompiledArtifact`](artifact::CompiledArtifact) to your deployment
//!     service; it carries the module source, the deduplicated bindings, and
//!     a wrangler-style descriptor.
//!
//! Compilation is synchronous, pure, and deterministic: the same graph
//! produces byte-identical output on every call, and nothing is persisted.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use flowforge::prelude::*;
//! use serde_json::json;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let graph = WorkflowGraph {
//!         id: "wf-1".to_string(),
//!         name: "Order Sync".to_string(),
//!         nodes: vec![
//!             Node::new("n1", "entry"),
//!             Node::new("n2", "http-request")
//!                 .with_config("url", json!("https://api.example.com/orders")),
//!             Node::new("n3", "return")
//!                 .with_config("value", json!("{{state.n2.output.body}}")),
//!         ],
//!         edges: vec![
//!             Edge::new("e1", "n1", "n2"),
//!             Edge::new("e2", "n2", "n3"),
//!         ],
//!     };
//!
//!     let compiler = Compiler::builder(graph).deployment_name("order-sync").build();
//!     let artifact = compiler.compile()?;
//!
//!     println!("class: {}", artifact.entrypoint_class_name);
//!     println!("bindings: {}", artifact.bindings.len());
//!     std::fs::write("index.js", &artifact.module_source)?;
//!     Ok(())
//! }
//! ```
//!
//! ## Template Expressions
//!
//! String config values may reference earlier nodes with `{{ ... }}`
//! templates: the canonical form `{{state.<nodeId>.<path>}}` and the legacy
//! bare form `{{<nodeRef>.<path>}}`, where the reference is tried as a step
//! name first and falls back to a node id. Resolution never fails at compile
//! time; a dangling reference reads `undefined` at runtime instead.

pub mod analysis;
pub mod artifact;
pub mod bindings;
pub mod codegen;
pub mod error;
pub mod graph;
pub mod prelude;
pub mod registry;

// Re-export the main compilation API
pub use codegen::{CompileOptions, Compiler, CompilerBuilder};
