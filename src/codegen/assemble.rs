//! Stitches per-node fragments into a complete worker module and derives the
//! deployment-facing manifests.

use serde_json::{Map, Value, json};

use super::naming::StepNames;
use crate::artifact::ToolManifest;
use crate::graph::{Node, WorkflowGraph};
use crate::registry::types;

/// Pinned for every compiled module so recompiles of an unchanged graph stay
/// byte-identical.
pub(crate) const COMPATIBILITY_DATE: &str = "2025-04-01";

/// Binding name under which the workflow class is registered with the runtime.
pub(crate) const WORKFLOW_BINDING: &str = "WORKFLOW";

const DIGEST_HELPER: &str = r#"async function digestText(text) {
  const data = new TextEncoder().encode(text);
  const hash = await crypto.subtle.digest("SHA-256", data);
  return [...new Uint8Array(hash)].map((b) => b.toString(16).padStart(2, "0")).join("");
}
"#;

/// Derives the generated entrypoint class name from the graph name:
/// PascalCase plus a `Workflow` suffix, `CompiledWorkflow` when the name has
/// no usable characters.
pub(crate) fn entrypoint_class_name(graph_name: &str) -> String {
    let mut pascal = String::new();
    let mut boundary = true;
    for ch in graph_name.chars() {
        if ch.is_ascii_alphanumeric() {
            if boundary {
                pascal.extend(ch.to_uppercase());
            } else {
                pascal.push(ch);
            }
            boundary = false;
        } else {
            boundary = true;
        }
    }

    if pascal.is_empty() {
        return "CompiledWorkflow".to_string();
    }
    if pascal.starts_with(|c: char| c.is_ascii_digit()) {
        pascal.insert(0, 'W');
    }
    if !pascal.ends_with("Workflow") {
        pascal.push_str("Workflow");
    }
    pascal
}

/// Lowercase, dash-separated deployment name derived from the graph name.
pub(crate) fn slugify(graph_name: &str) -> String {
    let mut slug = String::new();
    let mut boundary = false;
    for ch in graph_name.chars() {
        if ch.is_ascii_alphanumeric() {
            if boundary && !slug.is_empty() {
                slug.push('-');
            }
            slug.extend(ch.to_lowercase());
            boundary = false;
        } else {
            boundary = true;
        }
    }
    if slug.is_empty() {
        slug.push_str("workflow");
    }
    slug
}

/// Concatenates the ordered fragments into one ES module exporting the
/// workflow entrypoint class and a default fetch handler.
pub(crate) fn assemble_module(
    graph: &WorkflowGraph,
    class_name: &str,
    fragments: &[String],
    final_expr: &str,
) -> String {
    let mut code = String::new();
    code.push_str("// Generated by flowforge. Do not edit; recompile the workflow instead.\n");
    code.push_str(&format!("// Workflow: {} ({})\n\n", graph.name, graph.id));
    code.push_str("import { WorkflowEntrypoint } from \"cloudflare:workers\";\n\n");

    if fragments.iter().any(|f| f.contains("digestText(")) {
        code.push_str(DIGEST_HELPER);
        code.push('\n');
    }

    code.push_str(&format!(
        "export class {class_name} extends WorkflowEntrypoint {{\n"
    ));
    code.push_str("  async run(event, step) {\n");
    code.push_str("    const state = {};\n");
    code.push_str("    const results = {};\n\n");
    for fragment in fragments {
        code.push_str(fragment);
        code.push('\n');
    }
    code.push_str(&format!("    return {final_expr};\n"));
    code.push_str("  }\n");
    code.push_str("}\n\n");

    code.push_str("export default {\n");
    code.push_str("  async fetch(request, env) {\n");
    code.push_str("    if (request.method !== \"POST\") {\n");
    code.push_str("      return new Response(\"Method not allowed\", { status: 405 });\n");
    code.push_str("    }\n");
    code.push_str("    let payload = {};\n");
    code.push_str("    try {\n");
    code.push_str("      payload = await request.json();\n");
    code.push_str("    } catch {\n");
    code.push_str("      // an empty or non-JSON body starts the workflow without parameters\n");
    code.push_str("    }\n");
    code.push_str(&format!(
        "    const instance = await env.{WORKFLOW_BINDING}.create({{ params: payload }});\n"
    ));
    code.push_str("    return Response.json({ id: instance.id, status: \"queued\" });\n");
    code.push_str("  },\n");
    code.push_str("};\n");

    code
}

/// Expression the generated `run` returns: the last return-kind step in
/// execution order, else the last ordered step, else `null`.
pub(crate) fn final_result_expr(
    graph: &WorkflowGraph,
    order: &[usize],
    names: &StepNames,
) -> String {
    let last_return = order
        .iter()
        .rev()
        .map(|&i| &graph.nodes[i])
        .find(|n| crate::registry::is_return_type(&n.node_type));
    let last = last_return.or_else(|| order.last().map(|&i| &graph.nodes[i]));

    match last.and_then(|n| names.for_node(&n.id)) {
        Some(name) => format!("results[{}]", super::expression::js_string(name)),
        None => "null".to_string(),
    }
}

/// Derives the agent-tool manifest from the designated tool-input node, when
/// one exists.
pub(crate) fn derive_tool_manifest(graph: &WorkflowGraph) -> Option<ToolManifest> {
    let node = graph
        .nodes
        .iter()
        .find(|n| n.node_type == types::MCP_TOOL_INPUT)?;

    let name = node
        .config_str("toolName")
        .filter(|s| !s.trim().is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| slugify(&graph.name));
    let description = node
        .config_str("description")
        .filter(|s| !s.trim().is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| format!("Invokes the {} workflow", graph.name));

    let mut properties = Map::new();
    let mut required = Vec::new();
    for parameter in parameter_objects(node) {
        let Some(param_name) = parameter.get("name").and_then(Value::as_str) else {
            continue;
        };
        let mut schema = Map::new();
        schema.insert(
            "type".to_string(),
            json!(
                parameter
                    .get("type")
                    .and_then(Value::as_str)
                    .unwrap_or("string")
            ),
        );
        if let Some(desc) = parameter.get("description").and_then(Value::as_str) {
            schema.insert("description".to_string(), json!(desc));
        }
        properties.insert(param_name.to_string(), Value::Object(schema));
        if parameter
            .get("required")
            .and_then(Value::as_bool)
            .unwrap_or(false)
        {
            required.push(json!(param_name));
        }
    }

    Some(ToolManifest {
        name,
        description,
        input_schema: json!({
            "type": "object",
            "properties": properties,
            "required": required,
        }),
    })
}

fn parameter_objects(node: &Node) -> Vec<Map<String, Value>> {
    node.config_array("parameters")
        .map(|items| {
            items
                .iter()
                .filter_map(|item| item.as_object().cloned())
                .collect()
        })
        .unwrap_or_default()
}
