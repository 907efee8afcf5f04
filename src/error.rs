use thiserror::Error;

/// Errors that can occur during workflow compilation.
#[derive(Error, Debug, Clone)]
pub enum CompileError {
    #[error("failed to parse workflow graph JSON: {0}")]
    JsonParseError(String),

    #[error("workflow graph failed validation: {}", errors.join("; "))]
    InvalidGraph { errors: Vec<String> },

    #[error(
        "workflow graph '{graph_id}' contains a cycle; enable permit_cycles to compile it in declaration order"
    )]
    CyclicGraph { graph_id: String },

    #[error("no entry node found in workflow graph '{graph_id}'")]
    MissingEntryNode { graph_id: String },

    #[error("invalid configuration on node '{node_id}': {message}")]
    InvalidNodeConfig { node_id: String, message: String },

    #[error("failed to write debug output: {0}")]
    DebugDump(String),
}

/// Errors that can occur when converting a custom canvas format into a
/// flowforge `WorkflowGraph`.
#[derive(Error, Debug, Clone)]
pub enum GraphConversionError {
    #[error("invalid workflow data: {0}")]
    ValidationError(String),
}
