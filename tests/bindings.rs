//! Tests for resource-binding collection and name resolution.
mod common;
use common::*;
use flowforge::prelude::*;
use serde_json::json;

#[test]
fn shared_namespace_dedupes_to_one_binding() {
    let graph = shared_namespace_graph();
    let bindings = collect_bindings(&graph, &NodeRegistry::builtin());

    let kv: Vec<_> = bindings
        .iter()
        .filter(|b| b.kind == BindingKind::KvNamespace)
        .collect();
    assert_eq!(kv.len(), 1);
    assert_eq!(kv[0].name, "SESSIONS");
    assert_eq!(kv[0].usage_sites.len(), 2);
    assert_eq!(kv[0].usage_sites[0].node_id, "n2");
    assert_eq!(kv[0].usage_sites[1].node_id, "n3");
    assert!(kv[0].required);
}

#[test]
fn d1_binding_falls_back_to_db() {
    let graph = WorkflowGraph {
        id: "wf".to_string(),
        name: "Query".to_string(),
        nodes: vec![
            Node::new("n1", "d1-query").with_config("query", json!("SELECT 1")),
        ],
        edges: vec![],
    };

    let bindings = collect_bindings(&graph, &NodeRegistry::builtin());
    assert_eq!(bindings.len(), 1);
    assert_eq!(bindings[0].kind, BindingKind::D1Database);
    assert_eq!(bindings[0].name, "DB");
}

#[test]
fn explicit_names_are_sanitized_to_identifiers() {
    let graph = WorkflowGraph {
        id: "wf".to_string(),
        name: "Cache".to_string(),
        nodes: vec![
            Node::new("n1", "kv-get")
                .with_config("namespace", json!("my cache!"))
                .with_config("key", json!("k")),
        ],
        edges: vec![],
    };

    let bindings = collect_bindings(&graph, &NodeRegistry::builtin());
    assert_eq!(bindings[0].name, "my_cache_");
}

#[test]
fn placeholder_namespace_falls_through_to_schema_default() {
    let graph = WorkflowGraph {
        id: "wf".to_string(),
        name: "Cache".to_string(),
        nodes: vec![
            Node::new("n1", "kv-get")
                .with_config("namespace", json!("default"))
                .with_config("key", json!("k")),
        ],
        edges: vec![],
    };

    let bindings = collect_bindings(&graph, &NodeRegistry::builtin());
    assert_eq!(bindings[0].name, "WORKFLOW_KV");
}

#[test]
fn ai_cache_binding_is_gated_by_config() {
    let base = |cache: bool| WorkflowGraph {
        id: "wf".to_string(),
        name: "Infer".to_string(),
        nodes: vec![
            Node::new("n1", "workers-ai")
                .with_config("prompt", json!("Summarize {{state.n0.output}}"))
                .with_config("cache", json!(cache)),
        ],
        edges: vec![],
    };

    let without = collect_bindings(&base(false), &NodeRegistry::builtin());
    assert_eq!(without.len(), 1);
    assert_eq!(without[0].kind, BindingKind::Ai);
    assert_eq!(without[0].name, "AI");

    let with = collect_bindings(&base(true), &NodeRegistry::builtin());
    assert_eq!(with.len(), 2);
    let cache = with
        .iter()
        .find(|b| b.kind == BindingKind::KvNamespace)
        .expect("cache binding expected");
    assert_eq!(cache.name, "AI_CACHE");
    assert!(!cache.required);
}

#[test]
fn generated_code_and_bindings_agree_on_names() {
    // The generator and the collector share one resolution rule; a drift
    // between them would deploy a namespace the module never references.
    let graph = shared_namespace_graph();
    let artifact = Compiler::builder(graph.clone()).build().compile().unwrap();
    let bindings = collect_bindings(&graph, &NodeRegistry::builtin());

    for binding in bindings
        .iter()
        .filter(|b| b.kind == BindingKind::KvNamespace)
    {
        assert!(
            artifact
                .module_source
                .contains(&format!("env.{}.put", binding.name)),
            "module does not reference binding {}",
            binding.name
        );
    }
    assert_eq!(
        serde_json::to_string(&artifact.bindings).unwrap(),
        serde_json::to_string(&bindings).unwrap()
    );
}
