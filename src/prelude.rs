//! Prelude module for convenient imports
//!
//! Re-exports the most commonly used types so a single `use
//! flowforge::prelude::*;` covers typical compilation work.

// Core compilation API
pub use crate::codegen::{CompileOptions, Compiler, CompilerBuilder, GenContext, NodeGenerator};

// Graph model
pub use crate::graph::{Edge, IntoWorkflow, Node, NodeData, Position, WorkflowGraph};

// Node catalog
pub use crate::registry::{
    BindingRequirement, ConfigField, ConfigKind, NodeCategory, NodeDefinition, NodeRegistry,
};

// Analysis
pub use crate::analysis::{ValidationReport, execution_order, validate_graph};

// Compiled output
pub use crate::artifact::{
    Binding, BindingKind, CompiledArtifact, DeploymentDescriptor, ToolManifest, UsageSite,
};
pub use crate::bindings::collect_bindings;

// Error types
pub use crate::error::{CompileError, GraphConversionError};
