//! End-to-end tests for the compile pipeline and generated module source.
mod common;
use common::*;
use flowforge::error::CompileError;
use flowforge::prelude::*;
use serde_json::json;

#[test]
fn compiles_entry_http_return_into_one_module() {
    let artifact = Compiler::builder(simple_graph())
        .build()
        .compile()
        .expect("compile failed");

    assert_eq!(artifact.entrypoint_class_name, "OrderSyncWorkflow");
    assert_eq!(
        artifact.module_source.matches("export class ").count(),
        1,
        "expected exactly one entrypoint class"
    );
    assert_eq!(
        artifact.module_source.matches("export default").count(),
        1,
        "expected exactly one default fetch handler"
    );
    assert!(
        artifact
            .module_source
            .contains("export class OrderSyncWorkflow extends WorkflowEntrypoint")
    );
    assert!(artifact.module_source.contains("async fetch(request, env)"));
}

#[test]
fn compilation_is_deterministic() {
    let first = Compiler::builder(simple_graph()).build().compile().unwrap();
    let second = Compiler::builder(simple_graph()).build().compile().unwrap();

    assert_eq!(first.module_source, second.module_source);
    assert_eq!(
        serde_json::to_string(&first.bindings).unwrap(),
        serde_json::to_string(&second.bindings).unwrap()
    );
    assert_eq!(
        serde_json::to_string(&first.deployment).unwrap(),
        serde_json::to_string(&second.deployment).unwrap()
    );
}

#[test]
fn canonical_template_resolves_to_state_accessor() {
    let mut graph = simple_graph();
    graph.nodes[1] = graph.nodes[1]
        .clone()
        .with_config("url", json!("{{state.n1.output.body}}"));

    let artifact = Compiler::builder(graph).build().compile().unwrap();
    assert!(
        artifact
            .module_source
            .contains("const url = state[\"n1\"].output.body;")
    );
}

#[test]
fn legacy_references_prefer_step_names_over_node_ids() {
    let mut graph = simple_graph();
    // "fetchOrders" is the step name derived from the label "Fetch Orders";
    // "n2" is only a node id.
    graph.nodes[2] = Node::new("n3", "return")
        .with_label("Done")
        .with_config("value", json!("{{fetchOrders.body}}"));

    let artifact = Compiler::builder(graph).build().compile().unwrap();
    assert!(
        artifact
            .module_source
            .contains("const output = results[\"fetchOrders\"].body;")
    );
}

#[test]
fn legacy_node_id_reference_defaults_to_output() {
    let mut graph = simple_graph();
    graph.nodes[2] = Node::new("n3", "return")
        .with_label("Done")
        .with_config("value", json!("{{n2}}"));

    let artifact = Compiler::builder(graph).build().compile().unwrap();
    assert!(
        artifact
            .module_source
            .contains("const output = state[\"n2\"].output;")
    );
}

#[test]
fn mixed_template_becomes_a_template_literal() {
    let mut graph = simple_graph();
    graph.nodes[2] = Node::new("n3", "return")
        .with_label("Done")
        .with_config("value", json!("Order: {{state.n2.output.body}}"));

    let artifact = Compiler::builder(graph).build().compile().unwrap();
    assert!(
        artifact
            .module_source
            .contains("const output = `Order: ${state[\"n2\"].output.body}`;")
    );
}

#[test]
fn step_names_are_unique_and_stable() {
    let mut graph = simple_graph();
    graph.nodes.push(
        Node::new("n4", "http-request")
            .with_label("Fetch Orders")
            .with_config("url", json!("https://api.example.com/more")),
    );
    graph.edges.push(Edge::new("e3", "n3", "n4"));

    let artifact = Compiler::builder(graph).build().compile().unwrap();
    assert!(artifact.module_source.contains("await step.do(\"fetchOrders\""));
    assert!(artifact.module_source.contains("await step.do(\"fetchOrders2\""));
}

#[test]
fn step_logging_envelope_carries_node_identity() {
    let artifact = Compiler::builder(simple_graph())
        .build()
        .compile()
        .unwrap();
    assert!(artifact.module_source.contains(
        "{ event: \"node:start\", nodeId: \"n2\", nodeType: \"http-request\", name: \"Fetch Orders\" }"
    ));
    assert!(artifact.module_source.contains("error: String(error)"));
}

#[test]
fn http_request_throws_on_non_2xx() {
    let artifact = Compiler::builder(simple_graph())
        .build()
        .compile()
        .unwrap();
    assert!(artifact.module_source.contains("if (!response.ok) {"));
    assert!(artifact.module_source.contains("throw new Error(`HTTP "));
    assert!(artifact.module_source.contains("AbortSignal.timeout(30000)"));
}

#[test]
fn d1_query_swallows_runtime_errors_into_a_result() {
    let graph = WorkflowGraph {
        id: "wf-d1".to_string(),
        name: "Report".to_string(),
        nodes: vec![
            Node::new("n1", "entry"),
            Node::new("n2", "d1-query")
                .with_config("query", json!("SELECT * FROM orders WHERE id = ?"))
                .with_config("params", json!(["{{state.n1.output.orderId}}"]))
                .with_config("mode", json!("first")),
            Node::new("n3", "return"),
        ],
        edges: vec![Edge::new("e1", "n1", "n2"), Edge::new("e2", "n2", "n3")],
    };

    let artifact = Compiler::builder(graph).build().compile().unwrap();
    assert!(artifact.module_source.contains("env.DB.prepare("));
    assert!(artifact.module_source.contains("await bound.first();"));
    assert!(
        artifact
            .module_source
            .contains("output = { success: false, error: error instanceof Error ? error.message : String(error) };")
    );
    // The fail-soft catch must be inside the step body, not a rethrow.
    assert!(artifact.module_source.contains("output = { success: true, result: queryResult };"));
}

#[test]
fn kv_put_without_namespace_uses_the_schema_default() {
    let graph = WorkflowGraph {
        id: "wf-kvdef".to_string(),
        name: "Cache Write".to_string(),
        nodes: vec![
            Node::new("n1", "entry"),
            Node::new("n2", "kv-put")
                .with_config("key", json!("order:{{state.n1.output.id}}"))
                .with_config("value", json!("{{state.n1.output}}"))
                .with_config("ttl", json!(600)),
            Node::new("n3", "return"),
        ],
        edges: vec![Edge::new("e1", "n1", "n2"), Edge::new("e2", "n2", "n3")],
    };

    let artifact = Compiler::builder(graph).build().compile().unwrap();
    assert!(artifact.module_source.contains("env.WORKFLOW_KV.put(key"));
    assert!(artifact.module_source.contains("{ expirationTtl: 600 }"));
    assert!(
        artifact
            .bindings
            .iter()
            .any(|b| b.kind == BindingKind::KvNamespace && b.name == "WORKFLOW_KV")
    );
}

#[test]
fn transform_rewrites_input_and_data_identifiers() {
    let graph = WorkflowGraph {
        id: "wf-t".to_string(),
        name: "Totals".to_string(),
        nodes: vec![
            Node::new("n1", "entry"),
            Node::new("n2", "transform").with_config("code", json!("input.total * 2")),
            Node::new("n3", "transform")
                .with_config("code", json!("const doubled = data.total * 2; return { doubled };")),
            Node::new("n4", "return"),
        ],
        edges: vec![
            Edge::new("e1", "n1", "n2"),
            Edge::new("e2", "n2", "n3"),
            Edge::new("e3", "n3", "n4"),
        ],
    };

    let artifact = Compiler::builder(graph).build().compile().unwrap();
    assert!(artifact.module_source.contains("const output = (inputData.total * 2);"));
    assert!(artifact.module_source.contains("const doubled = inputData.total * 2;"));
    assert!(artifact.module_source.contains("const output = (() => {"));
    // Property accesses must survive the naive rewrite untouched.
    assert!(!artifact.module_source.contains("inputData.inputData"));
}

#[test]
fn sleep_converts_relative_durations() {
    let graph = WorkflowGraph {
        id: "wf-sleep".to_string(),
        name: "Cooldown".to_string(),
        nodes: vec![
            Node::new("n1", "entry"),
            Node::new("n2", "sleep")
                .with_label("Wait")
                .with_config("value", json!(5))
                .with_config("unit", json!("minutes")),
            Node::new("n3", "return"),
        ],
        edges: vec![Edge::new("e1", "n1", "n2"), Edge::new("e2", "n2", "n3")],
    };

    let artifact = Compiler::builder(graph).build().compile().unwrap();
    assert!(artifact.module_source.contains("await step.sleep(\"wait\", 300000);"));
}

#[test]
fn validate_policy_controls_failure_mode() {
    let rules = json!([
        { "field": "email", "type": "required" },
        { "field": "email", "type": "email" }
    ]);
    let mut graph = WorkflowGraph {
        id: "wf-v".to_string(),
        name: "Signup".to_string(),
        nodes: vec![
            Node::new("n1", "entry"),
            Node::new("n2", "validate")
                .with_config("rules", rules.clone())
                .with_config("policy", json!("error")),
            Node::new("n3", "return"),
        ],
        edges: vec![Edge::new("e1", "n1", "n2"), Edge::new("e2", "n2", "n3")],
    };

    let hard = Compiler::builder(graph.clone()).build().compile().unwrap();
    assert!(hard.module_source.contains("throw new Error(`Validation failed:"));

    graph.nodes[1] = Node::new("n2", "validate")
        .with_config("rules", rules)
        .with_config("policy", json!("soft"));
    let soft = Compiler::builder(graph).build().compile().unwrap();
    assert!(soft.module_source.contains("output = { valid: false, errors };"));
    assert!(!soft.module_source.contains("throw new Error(`Validation failed:"));
}

#[test]
fn return_without_config_defaults_to_success() {
    let mut graph = simple_graph();
    graph.nodes[2] = Node::new("n3", "return").with_label("Done");

    let artifact = Compiler::builder(graph).build().compile().unwrap();
    assert!(artifact.module_source.contains("const output = \"success\";"));
}

#[test]
fn unknown_node_type_compiles_to_annotated_passthrough() {
    let mut graph = simple_graph();
    graph.nodes.insert(2, Node::new("nx", "quantum-flux"));
    graph.edges = vec![
        Edge::new("e1", "n1", "n2"),
        Edge::new("e2", "n2", "nx"),
        Edge::new("e3", "nx", "n3"),
    ];

    let artifact = Compiler::builder(graph).build().compile().unwrap();
    assert!(
        artifact
            .module_source
            .contains("// Unsupported node type \"quantum-flux\"; passing data through unchanged.")
    );
}

#[test]
fn cyclic_graph_is_rejected_unless_permitted() {
    let err = Compiler::builder(cyclic_graph())
        .build()
        .compile()
        .expect_err("cycle should fail");
    assert!(matches!(err, CompileError::CyclicGraph { .. }));

    // Opting in compiles the nodes in declaration order instead.
    let artifact = Compiler::builder(cyclic_graph())
        .permit_cycles(true)
        .build()
        .compile()
        .expect("permit_cycles should compile");
    let entry_at = artifact.module_source.find("nodeId: \"a\"").unwrap();
    let transform_at = artifact.module_source.find("nodeId: \"b\"").unwrap();
    assert!(entry_at < transform_at);
}

#[test]
fn deployment_descriptor_registers_the_workflow() {
    let artifact = Compiler::builder(simple_graph())
        .build()
        .compile()
        .unwrap();

    assert_eq!(artifact.deployment.name, "order-sync");
    assert_eq!(artifact.deployment.main, "index.js");
    assert_eq!(artifact.deployment.workflows.len(), 1);
    assert_eq!(artifact.deployment.workflows[0].binding, "WORKFLOW");
    assert_eq!(
        artifact.deployment.workflows[0].class_name,
        artifact.entrypoint_class_name
    );

    let named = Compiler::builder(simple_graph())
        .deployment_name("orders-prod")
        .build()
        .compile()
        .unwrap();
    assert_eq!(named.deployment.name, "orders-prod");
}

#[test]
fn tool_graph_derives_a_manifest() {
    let artifact = Compiler::builder(tool_graph()).build().compile().unwrap();
    let manifest = artifact.tool_manifest.expect("manifest expected");

    assert_eq!(manifest.name, "lookup_customer");
    assert_eq!(manifest.description, "Looks up a customer record");
    assert_eq!(manifest.input_schema["type"], "object");
    assert_eq!(
        manifest.input_schema["properties"]["customerId"]["type"],
        "string"
    );
    assert_eq!(manifest.input_schema["required"], json!(["customerId"]));

    // Plain worker graphs have no manifest.
    let plain = Compiler::builder(simple_graph()).build().compile().unwrap();
    assert!(plain.tool_manifest.is_none());
}

#[test]
fn graph_round_trips_through_the_editor_wire_format() {
    let raw = r#"{
        "id": "wf-wire",
        "name": "Wire",
        "nodes": [
            { "id": "n1", "type": "entry", "position": { "x": 0, "y": 0 }, "data": { "label": "Start", "config": {} } },
            { "id": "n2", "type": "return", "position": { "x": 100, "y": 0 }, "data": { "label": "", "config": { "value": "ok" } } }
        ],
        "edges": [
            { "id": "e1", "source": "n1", "target": "n2", "sourceHandle": "true" }
        ]
    }"#;

    let graph = WorkflowGraph::from_json(raw).expect("parse failed");
    assert_eq!(graph.nodes[0].node_type, "entry");
    assert_eq!(graph.edges[0].source_handle.as_deref(), Some("true"));

    let artifact = Compiler::builder(graph).build().compile().unwrap();
    assert!(artifact.module_source.contains("const output = \"ok\";"));
    // An unlabeled return node must not produce a reserved-word identifier.
    assert!(artifact.module_source.contains("await step.do(\"returnStep\""));
    assert!(!artifact.module_source.contains("const return ="));
}
