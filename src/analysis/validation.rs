use ahash::{AHashMap, AHashSet};

use crate::graph::WorkflowGraph;
use crate::registry::{NodeRegistry, is_entry_type, is_return_type};

/// The accumulated outcome of validating a workflow graph. Errors are fatal
/// for compilation and deployment; warnings are not. Graph storage is allowed
/// to keep invalid graphs, so validation never mutates its input.
#[derive(Debug, Clone, Default)]
pub struct ValidationReport {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub has_cycle: bool,
    pub entry_node_id: Option<String>,
}

impl ValidationReport {
    pub fn is_deployable(&self) -> bool {
        self.errors.is_empty() && !self.has_cycle
    }
}

/// Runs every structural and semantic check, accumulating findings rather
/// than stopping at the first failure.
pub fn validate_graph(
    graph: &WorkflowGraph,
    registry: &NodeRegistry,
    explicit_entry: Option<&str>,
) -> ValidationReport {
    let mut report = ValidationReport::default();

    check_node_ids(graph, &mut report);
    check_node_types(graph, registry, &mut report);
    check_edges(graph, &mut report);
    resolve_entry(graph, explicit_entry, &mut report);

    if !graph.nodes.iter().any(|n| is_return_type(&n.node_type)) {
        report
            .warnings
            .push("graph has no return node; the workflow will produce no explicit result".into());
    }

    report.has_cycle = detect_cycle(graph);

    report
}

fn check_node_ids(graph: &WorkflowGraph, report: &mut ValidationReport) {
    let mut seen: AHashSet<&str> = AHashSet::new();
    for node in &graph.nodes {
        if node.id.is_empty() {
            report.errors.push("a node is missing its id".into());
        } else if !seen.insert(node.id.as_str()) {
            report
                .errors
                .push(format!("duplicate node id '{}'", node.id));
        }
    }
}

fn check_node_types(graph: &WorkflowGraph, registry: &NodeRegistry, report: &mut ValidationReport) {
    for node in &graph.nodes {
        if node.node_type.is_empty() {
            report
                .errors
                .push(format!("node '{}' has no type", node.id));
            continue;
        }

        let Some(definition) = registry.get_definition(&node.node_type) else {
            report.warnings.push(format!(
                "node '{}' has unknown type '{}'; it will compile to a passthrough step",
                node.id, node.node_type
            ));
            continue;
        };

        for field in definition.config_schema.iter().filter(|f| f.required) {
            let missing = match node.config(&field.key) {
                None | Some(serde_json::Value::Null) => true,
                Some(serde_json::Value::String(s)) => s.trim().is_empty(),
                Some(_) => false,
            };
            if missing {
                report.errors.push(format!(
                    "node '{}' ({}) is missing required config field '{}'",
                    node.id, node.node_type, field.key
                ));
            }
        }
    }
}

fn check_edges(graph: &WorkflowGraph, report: &mut ValidationReport) {
    let node_ids: AHashSet<&str> = graph.nodes.iter().map(|n| n.id.as_str()).collect();
    let mut seen_edge_ids: AHashSet<&str> = AHashSet::new();

    for (index, edge) in graph.edges.iter().enumerate() {
        if edge.id.is_empty() {
            report.warnings.push(format!(
                "edge #{index} has no id; one will be auto-assigned on save"
            ));
        } else if !seen_edge_ids.insert(edge.id.as_str()) {
            report
                .warnings
                .push(format!("duplicate edge id '{}'", edge.id));
        }

        if !node_ids.contains(edge.source.as_str()) {
            report.errors.push(format!(
                "edge '{}' references missing source node '{}'",
                edge_label(edge, index),
                edge.source
            ));
        }
        if !node_ids.contains(edge.target.as_str()) {
            report.errors.push(format!(
                "edge '{}' references missing target node '{}'",
                edge_label(edge, index),
                edge.target
            ));
        }

        if edge.source == edge.target {
            report.warnings.push(format!(
                "edge '{}' is a self-loop on node '{}'",
                edge_label(edge, index),
                edge.source
            ));
        }
    }
}

fn edge_label(edge: &crate::graph::Edge, index: usize) -> String {
    if edge.id.is_empty() {
        format!("#{index}")
    } else {
        edge.id.clone()
    }
}

fn resolve_entry(
    graph: &WorkflowGraph,
    explicit_entry: Option<&str>,
    report: &mut ValidationReport,
) {
    if let Some(wanted) = explicit_entry {
        if graph.node_by_id(wanted).is_some() {
            report.entry_node_id = Some(wanted.to_string());
        } else {
            report.errors.push(format!(
                "designated entry node '{wanted}' does not exist in the graph"
            ));
        }
        return;
    }

    let mut entries = graph.nodes.iter().filter(|n| is_entry_type(&n.node_type));
    match entries.next() {
        Some(first) => {
            report.entry_node_id = Some(first.id.clone());
            if entries.next().is_some() {
                report
                    .warnings
                    .push("graph has more than one entry node; the first one wins".into());
            }
        }
        None => {
            report.errors.push("graph has no entry node".into());
        }
    }
}

/// Depth-first cycle detection with an explicit recursion stack. Revisiting a
/// node that is still on the stack marks the graph cyclic; a self-loop counts.
fn detect_cycle(graph: &WorkflowGraph) -> bool {
    let index_of: AHashMap<&str, usize> = graph
        .nodes
        .iter()
        .enumerate()
        .map(|(i, n)| (n.id.as_str(), i))
        .collect();

    let mut adjacency: Vec<Vec<usize>> = vec![Vec::new(); graph.nodes.len()];
    for edge in &graph.edges {
        if let (Some(&from), Some(&to)) = (
            index_of.get(edge.source.as_str()),
            index_of.get(edge.target.as_str()),
        ) {
            adjacency[from].push(to);
        }
    }

    #[derive(Clone, Copy, PartialEq)]
    enum Mark {
        Unvisited,
        OnStack,
        Done,
    }

    let mut marks = vec![Mark::Unvisited; graph.nodes.len()];

    for start in 0..graph.nodes.len() {
        if marks[start] != Mark::Unvisited {
            continue;
        }
        // (node, next child index) frames instead of recursion
        let mut stack: Vec<(usize, usize)> = vec![(start, 0)];
        marks[start] = Mark::OnStack;

        while let Some(&mut (node, child)) = stack.last_mut() {
            if child < adjacency[node].len() {
                if let Some(frame) = stack.last_mut() {
                    frame.1 += 1;
                }
                let next = adjacency[node][child];
                match marks[next] {
                    Mark::OnStack => return true,
                    Mark::Unvisited => {
                        marks[next] = Mark::OnStack;
                        stack.push((next, 0));
                    }
                    Mark::Done => {}
                }
            } else {
                marks[node] = Mark::Done;
                stack.pop();
            }
        }
    }

    false
}
