use ahash::{AHashMap, AHashSet};

use crate::graph::WorkflowGraph;

/// Collision-free step names for every node, assigned in node-array order.
///
/// The name doubles as a generated-code identifier and as the literal step
/// label passed to the runtime's durable-step primitive, so assignment must
/// be stable across recompiles of an unchanged graph.
pub struct StepNames {
    names: Vec<String>,
    by_node_id: AHashMap<String, usize>,
    used: AHashSet<String>,
}

impl StepNames {
    pub fn assign(graph: &WorkflowGraph) -> Self {
        let mut names = Vec::with_capacity(graph.nodes.len());
        let mut by_node_id = AHashMap::with_capacity(graph.nodes.len());
        let mut used: AHashSet<String> = AHashSet::new();

        for (index, node) in graph.nodes.iter().enumerate() {
            let raw = node
                .config_str("stepName")
                .filter(|s| !s.trim().is_empty())
                .unwrap_or_else(|| {
                    if node.data.label.trim().is_empty() {
                        &node.node_type
                    } else {
                        &node.data.label
                    }
                });

            let base = identifier_from(raw);
            let mut candidate = base.clone();
            let mut suffix = 2u32;
            while used.contains(&candidate) {
                candidate = format!("{base}{suffix}");
                suffix += 1;
            }

            used.insert(candidate.clone());
            by_node_id.insert(node.id.clone(), index);
            names.push(candidate);
        }

        Self {
            names,
            by_node_id,
            used,
        }
    }

    pub fn for_node(&self, node_id: &str) -> Option<&str> {
        self.by_node_id
            .get(node_id)
            .map(|&i| self.names[i].as_str())
    }

    pub fn contains_name(&self, name: &str) -> bool {
        self.used.contains(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }
}

/// Words that cannot serve as a generated `const` name: JavaScript reserved
/// words plus the locals every compiled module declares.
const FORBIDDEN_NAMES: &[&str] = &[
    "await", "break", "case", "catch", "class", "const", "continue", "default", "delete", "do",
    "else", "export", "extends", "false", "finally", "for", "function", "if", "import", "in",
    "instanceof", "let", "new", "null", "of", "return", "super", "switch", "this", "throw", "true",
    "try", "typeof", "var", "void", "while", "with", "yield",
    // module-local bindings of the generated run()
    "state", "results", "event", "step", "env", "output", "inputData", "error",
];

/// Normalizes an arbitrary label into a bare camelCase identifier: segments
/// split at non-alphanumeric characters and camel-joined, `step` when nothing
/// survives, `_`-prefixed when the first character is not a letter. Names
/// that would shadow a reserved word or a generated local get a `Step`
/// suffix.
pub(crate) fn identifier_from(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut boundary = false;

    for ch in raw.chars() {
        if ch.is_ascii_alphanumeric() {
            if out.is_empty() {
                out.extend(ch.to_lowercase());
            } else if boundary {
                out.extend(ch.to_uppercase());
            } else {
                out.push(ch);
            }
            boundary = false;
        } else {
            boundary = true;
        }
    }

    if out.is_empty() {
        out.push_str("step");
    }
    if out.starts_with(|c: char| c.is_ascii_digit()) {
        out.insert(0, '_');
    }
    if FORBIDDEN_NAMES.contains(&out.as_str()) {
        out.push_str("Step");
    }
    out
}
