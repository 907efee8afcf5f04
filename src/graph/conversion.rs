use super::definition::WorkflowGraph;
use crate::error::GraphConversionError;

/// A trait for custom canvas data models that can be converted into a
/// flowforge [`WorkflowGraph`].
///
/// This is the primary extension point for making flowforge format-agnostic.
/// Canvas editors tend to save graphs in their own wire shape; implementing
/// this trait on the structs that parse that shape provides the translation
/// layer the compiler consumes.
///
/// # Example
///
/// ```rust,no_run
/// use flowforge::graph::{IntoWorkflow, WorkflowGraph, Node};
/// use flowforge::error::GraphConversionError;
///
/// // 1. Define your custom structs for parsing your format.
/// struct MyCanvasNode { id: String, kind: String }
/// struct MyCanvas { id: String, title: String, nodes: Vec<MyCanvasNode> }
///
/// // 2. Implement `IntoWorkflow` for your top-level struct.
/// impl IntoWorkflow for MyCanvas {
///     fn into_workflow(self) -> Result<WorkflowGraph, GraphConversionError> {
///         let nodes = self
///             .nodes
///             .into_iter()
///             .map(|n| Node::new(n.id, n.kind))
///             .collect();
///
///         Ok(WorkflowGraph {
///             id: self.id,
///             name: self.title,
///             nodes,
///             edges: vec![], // convert your connections here as well
///         })
///     }
/// }
/// ```
pub trait IntoWorkflow {
    /// Consumes the object and converts it into a compilable workflow graph.
    fn into_workflow(self) -> Result<WorkflowGraph, GraphConversionError>;
}
