use clap::Parser;
use flowforge::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

/// A workflow graph compiler CLI: turns a canvas-editor graph JSON into a
/// deployable worker module plus its binding and deployment manifests.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to the workflow graph JSON file
    graph_path: String,

    /// Deployment name (defaults to a slug of the graph name)
    #[arg(short, long)]
    name: Option<String>,

    /// Output directory for the compiled artifact files
    #[arg(short, long, default_value = "dist")]
    out: PathBuf,

    /// Designated entry node id (defaults to the first entry-kind node)
    #[arg(long)]
    entry: Option<String>,

    /// Compile cyclic graphs in declaration order instead of failing
    #[arg(long)]
    permit_cycles: bool,

    /// Only validate the graph and print the report
    #[arg(long)]
    check: bool,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let raw = fs::read_to_string(&cli.graph_path).unwrap_or_else(|e| {
        exit_with_error(&format!(
            "Failed to read graph file '{}': {}",
            cli.graph_path, e
        ))
    });
    let graph = WorkflowGraph::from_json(&raw)
        .unwrap_or_else(|e| exit_with_error(&format!("Failed to parse graph: {}", e)));

    println!(
        "Loaded workflow '{}' ({} nodes, {} edges)",
        graph.name,
        graph.nodes.len(),
        graph.edges.len()
    );

    if cli.check {
        run_check(&graph, cli.entry.as_deref());
        return;
    }

    let compile_start = Instant::now();
    let artifact = Compiler::builder(graph)
        .permit_cycles(cli.permit_cycles)
        .with_options(CompileOptions {
            deployment_name: cli.name.clone(),
            entry_node_id: cli.entry.clone(),
        })
        .build()
        .compile()
        .unwrap_or_else(|e| exit_with_error(&format!("Compilation failed: {}", e)));
    let compile_duration = compile_start.elapsed();

    write_artifact(&cli.out, &artifact);

    println!("\nCompilation successful in {:?}", compile_duration);
    println!("  Entrypoint class: {}", artifact.entrypoint_class_name);
    println!("  Module size:      {} bytes", artifact.module_source.len());
    println!("  Bindings:         {}", artifact.bindings.len());
    for binding in &artifact.bindings {
        println!(
            "    - {} ({}) used by {} node(s)",
            binding.name,
            binding.kind.as_str(),
            binding.usage_sites.len()
        );
    }
    if artifact.tool_manifest.is_some() {
        println!("  Tool manifest:    yes (agent-tool deployment supported)");
    }
}

fn run_check(graph: &WorkflowGraph, entry: Option<&str>) {
    let report = validate_graph(graph, &NodeRegistry::builtin(), entry);

    for warning in &report.warnings {
        println!("warning: {}", warning);
    }
    for error in &report.errors {
        println!("error: {}", error);
    }
    if report.has_cycle {
        println!("error: graph contains a cycle");
    }

    if report.is_deployable() {
        println!(
            "Graph is deployable (entry node: {})",
            report.entry_node_id.as_deref().unwrap_or("?")
        );
    } else {
        eprintln!(
            "\nGraph is not deployable: {} error(s), {} warning(s)",
            report.errors.len() + usize::from(report.has_cycle),
            report.warnings.len()
        );
        std::process::exit(1);
    }
}

fn write_artifact(out_dir: &Path, artifact: &CompiledArtifact) {
    fs::create_dir_all(out_dir).unwrap_or_else(|e| {
        exit_with_error(&format!(
            "Failed to create output directory '{}': {}",
            out_dir.display(),
            e
        ))
    });

    write_file(&out_dir.join("index.js"), &artifact.module_source);
    write_file(
        &out_dir.join("wrangler.json"),
        &to_pretty_json(&artifact.deployment),
    );
    write_file(
        &out_dir.join("bindings.json"),
        &to_pretty_json(&artifact.bindings),
    );
    if let Some(manifest) = &artifact.tool_manifest {
        write_file(&out_dir.join("tool-manifest.json"), &to_pretty_json(manifest));
    }
    println!("Artifact written to '{}'", out_dir.display());
}

fn to_pretty_json<T: serde::Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value)
        .unwrap_or_else(|e| exit_with_error(&format!("Failed to serialize artifact: {}", e)))
}

fn write_file(path: &Path, content: &str) {
    fs::write(path, content).unwrap_or_else(|e| {
        exit_with_error(&format!("Failed to write '{}': {}", path.display(), e))
    });
}

fn exit_with_error(message: &str) -> ! {
    eprintln!("\nError: {}", message);
    std::process::exit(1);
}
