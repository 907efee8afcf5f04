//! The compile pipeline: validation, ordering, naming, per-node generation,
//! binding collection, and module assembly.

use ahash::AHashMap;

mod assemble;
pub mod expression;
pub mod generators;
pub mod naming;

use expression::ExprResolver;
pub use generators::{GenContext, NodeGenerator};
use naming::StepNames;

use crate::analysis::{execution_order, validate_graph};
use crate::artifact::{CompiledArtifact, DeploymentDescriptor, WorkflowRegistration};
use crate::bindings::collect_bindings;
use crate::error::CompileError;
use crate::graph::WorkflowGraph;
use crate::registry::NodeRegistry;

/// Caller-supplied knobs for a single compile call.
#[derive(Debug, Clone, Default)]
pub struct CompileOptions {
    /// Deployment name; defaults to a slug of the graph name.
    pub deployment_name: Option<String>,
    /// Designated entry node; defaults to the first entry-kind node.
    pub entry_node_id: Option<String>,
}

/// Compiles a workflow graph into a deployable artifact. Construct through
/// [`Compiler::builder`].
pub struct Compiler {
    graph: WorkflowGraph,
    registry: NodeRegistry,
    generators: AHashMap<String, Box<dyn NodeGenerator>>,
    options: CompileOptions,
    permit_cycles: bool,
}

pub struct CompilerBuilder {
    graph: WorkflowGraph,
    registry: NodeRegistry,
    generators: AHashMap<String, Box<dyn NodeGenerator>>,
    options: CompileOptions,
    permit_cycles: bool,
}

impl CompilerBuilder {
    pub fn new(graph: WorkflowGraph) -> Self {
        let mut generators: AHashMap<String, Box<dyn NodeGenerator>> = AHashMap::new();
        generators::register_default_generators(&mut generators);
        Self {
            graph,
            registry: NodeRegistry::builtin(),
            generators,
            options: CompileOptions::default(),
            permit_cycles: false,
        }
    }

    /// Replaces the builtin node catalog.
    pub fn with_registry(mut self, registry: NodeRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn with_options(mut self, options: CompileOptions) -> Self {
        self.options = options;
        self
    }

    pub fn deployment_name(mut self, name: &str) -> Self {
        self.options.deployment_name = Some(name.to_string());
        self
    }

    /// Maps a foreign type tag onto a builtin generator, for canvas formats
    /// with their own palette names.
    pub fn with_type_mapping(mut self, user_type_name: &str, builtin_type_name: &str) -> Self {
        if let Some(generator) = generators::create_generator_by_name(builtin_type_name) {
            self.generators.insert(user_type_name.to_string(), generator);
        }
        self
    }

    pub fn with_custom_generator(mut self, generator: Box<dyn NodeGenerator>) -> Self {
        self.generators
            .insert(generator.node_type().to_string(), generator);
        self
    }

    /// Allows compiling a cyclic graph in declaration order instead of
    /// failing. Off by default.
    pub fn permit_cycles(mut self, permit: bool) -> Self {
        self.permit_cycles = permit;
        self
    }

    pub fn build(self) -> Compiler {
        Compiler {
            graph: self.graph,
            registry: self.registry,
            generators: self.generators,
            options: self.options,
            permit_cycles: self.permit_cycles,
        }
    }
}

impl Compiler {
    pub fn builder(graph: WorkflowGraph) -> CompilerBuilder {
        CompilerBuilder::new(graph)
    }

    /// Runs the full pipeline. Pure and deterministic: the same graph and
    /// options produce byte-identical output, and nothing is persisted.
    pub fn compile(&self) -> Result<CompiledArtifact, CompileError> {
        tracing::info!(
            graph = %self.graph.id,
            nodes = self.graph.nodes.len(),
            edges = self.graph.edges.len(),
            "starting workflow compilation"
        );

        let report = validate_graph(
            &self.graph,
            &self.registry,
            self.options.entry_node_id.as_deref(),
        );
        for warning in &report.warnings {
            tracing::warn!(graph = %self.graph.id, "{warning}");
        }
        if !report.errors.is_empty() {
            return Err(CompileError::InvalidGraph {
                errors: report.errors,
            });
        }
        if report.has_cycle {
            if !self.permit_cycles {
                return Err(CompileError::CyclicGraph {
                    graph_id: self.graph.id.clone(),
                });
            }
            tracing::warn!(
                graph = %self.graph.id,
                "graph is cyclic; compiling in declaration order"
            );
        }

        let order = execution_order(&self.graph);
        let names = StepNames::assign(&self.graph);
        let ctx = GenContext {
            graph: &self.graph,
            registry: &self.registry,
            names: &names,
            resolver: ExprResolver::new(&names),
        };

        let mut fragments = Vec::with_capacity(order.len());
        for &index in &order {
            let node = &self.graph.nodes[index];
            let fragment = match self.generators.get(&node.node_type) {
                Some(generator) => generator.generate(node, &ctx)?,
                None => generators::passthrough_fragment(node, &ctx),
            };
            fragments.push(fragment);
        }
        tracing::debug!(fragments = fragments.len(), "node generation complete");

        #[cfg(feature = "debug-tools")]
        self.dump_fragments(&order, &fragments)?;

        let bindings = collect_bindings(&self.graph, &self.registry);
        tracing::debug!(bindings = bindings.len(), "binding collection complete");

        let class_name = assemble::entrypoint_class_name(&self.graph.name);
        let final_expr = assemble::final_result_expr(&self.graph, &order, &names);
        let module_source =
            assemble::assemble_module(&self.graph, &class_name, &fragments, &final_expr);

        let deployment_name = self
            .options
            .deployment_name
            .clone()
            .unwrap_or_else(|| assemble::slugify(&self.graph.name));
        let deployment = DeploymentDescriptor {
            name: deployment_name.clone(),
            main: "index.js".to_string(),
            compatibility_date: assemble::COMPATIBILITY_DATE.to_string(),
            workflows: vec![WorkflowRegistration {
                name: deployment_name,
                binding: assemble::WORKFLOW_BINDING.to_string(),
                class_name: class_name.clone(),
            }],
        };

        let tool_manifest = assemble::derive_tool_manifest(&self.graph);

        tracing::info!(
            graph = %self.graph.id,
            class = %class_name,
            bytes = module_source.len(),
            "compilation successful"
        );

        Ok(CompiledArtifact {
            module_source,
            entrypoint_class_name: class_name,
            bindings,
            deployment,
            tool_manifest,
        })
    }

    #[cfg(feature = "debug-tools")]
    fn dump_fragments(&self, order: &[usize], fragments: &[String]) -> Result<(), CompileError> {
        use std::fmt::Write as _;

        let mut listing = String::new();
        for (&index, fragment) in order.iter().zip(fragments) {
            let node = &self.graph.nodes[index];
            let _ = writeln!(listing, "// node {} ({})", node.id, node.node_type);
            listing.push_str(fragment);
            listing.push('\n');
        }

        std::fs::create_dir_all("tmp")
            .map_err(|e| CompileError::DebugDump(e.to_string()))?;
        std::fs::write(format!("tmp/{}_fragments.js", self.graph.id), listing)
            .map_err(|e| CompileError::DebugDump(e.to_string()))
    }
}
