//! Builtin node definitions. Defaults here are the single source of truth
//! for binding-name resolution; the generators and the binding collector
//! both read them through the schema.

use serde_json::json;

use super::{
    BindingRequirement, ConfigField, ConfigKind, NodeCategory, NodeDefinition, NodeRegistry, types,
};
use crate::artifact::BindingKind;

fn def(
    node_type: &str,
    name: &str,
    description: &str,
    category: NodeCategory,
) -> NodeDefinition {
    NodeDefinition {
        node_type: node_type.to_string(),
        name: name.to_string(),
        description: description.to_string(),
        category,
        config_schema: Vec::new(),
        bindings: Vec::new(),
        preset_output: None,
    }
}

pub(super) fn install(registry: &mut NodeRegistry) {
    let mut entry = def(
        types::ENTRY,
        "Entry",
        "Receives the workflow trigger payload",
        NodeCategory::Trigger,
    );
    entry
        .config_schema
        .push(ConfigField::new("parameters", ConfigKind::Array));
    registry.register(entry);

    let mut ret = def(
        types::RETURN,
        "Return",
        "Produces the workflow result",
        NodeCategory::Output,
    );
    ret.config_schema
        .push(ConfigField::new("value", ConfigKind::String));
    ret.config_schema
        .push(ConfigField::new("returnValue", ConfigKind::Object));
    registry.register(ret);

    let mut http = def(
        types::HTTP_REQUEST,
        "HTTP Request",
        "Calls an external HTTP endpoint",
        NodeCategory::Action,
    );
    http.config_schema
        .push(ConfigField::new("url", ConfigKind::String).required());
    http.config_schema.push(
        ConfigField::new("method", ConfigKind::String).with_default(json!("GET")),
    );
    http.config_schema
        .push(ConfigField::new("headers", ConfigKind::Object));
    http.config_schema
        .push(ConfigField::new("body", ConfigKind::String));
    http.config_schema.push(
        ConfigField::new("timeout", ConfigKind::Number).with_default(json!(30000)),
    );
    http.preset_output = Some(json!({ "status": 200, "body": {} }));
    registry.register(http);

    let mut kv_get = def(
        types::KV_GET,
        "KV Get",
        "Reads a value from a key-value namespace",
        NodeCategory::Data,
    );
    kv_get.config_schema.push(
        ConfigField::new("namespace", ConfigKind::String).with_default(json!("WORKFLOW_KV")),
    );
    kv_get
        .config_schema
        .push(ConfigField::new("key", ConfigKind::String).required());
    kv_get.bindings.push(
        BindingRequirement::new(BindingKind::KvNamespace, "KV").via_config("namespace"),
    );
    registry.register(kv_get);

    let mut kv_put = def(
        types::KV_PUT,
        "KV Put",
        "Writes a value into a key-value namespace",
        NodeCategory::Data,
    );
    kv_put.config_schema.push(
        ConfigField::new("namespace", ConfigKind::String).with_default(json!("WORKFLOW_KV")),
    );
    kv_put
        .config_schema
        .push(ConfigField::new("key", ConfigKind::String).required());
    kv_put
        .config_schema
        .push(ConfigField::new("value", ConfigKind::String).required());
    kv_put
        .config_schema
        .push(ConfigField::new("ttl", ConfigKind::Number));
    kv_put
        .config_schema
        .push(ConfigField::new("expiration", ConfigKind::Number));
    kv_put
        .config_schema
        .push(ConfigField::new("metadata", ConfigKind::Object));
    kv_put.bindings.push(
        BindingRequirement::new(BindingKind::KvNamespace, "KV").via_config("namespace"),
    );
    registry.register(kv_put);

    let mut d1 = def(
        types::D1_QUERY,
        "D1 Query",
        "Runs a parameterized statement against a relational database",
        NodeCategory::Data,
    );
    d1.config_schema.push(
        ConfigField::new("database", ConfigKind::String).with_default(json!("DB")),
    );
    d1.config_schema
        .push(ConfigField::new("query", ConfigKind::String).required());
    d1.config_schema
        .push(ConfigField::new("params", ConfigKind::Array));
    d1.config_schema
        .push(ConfigField::new("mode", ConfigKind::String).with_default(json!("all")));
    d1.preset_output = Some(json!({ "success": true, "result": { "results": [] } }));
    d1.bindings.push(
        BindingRequirement::new(BindingKind::D1Database, "DB").via_config("database"),
    );
    registry.register(d1);

    let mut transform = def(
        types::TRANSFORM,
        "Transform",
        "Reshapes data with a user-authored expression",
        NodeCategory::Logic,
    );
    transform
        .config_schema
        .push(ConfigField::new("code", ConfigKind::String).required());
    registry.register(transform);

    let mut router = def(
        types::CONDITIONAL_ROUTER,
        "Conditional Router",
        "Routes execution by a named branch result",
        NodeCategory::Logic,
    );
    router
        .config_schema
        .push(ConfigField::new("left", ConfigKind::String));
    router.config_schema.push(
        ConfigField::new("operator", ConfigKind::String).with_default(json!("equals")),
    );
    router
        .config_schema
        .push(ConfigField::new("right", ConfigKind::String));
    router
        .config_schema
        .push(ConfigField::new("expression", ConfigKind::String));
    router.preset_output = Some(json!({ "branch": "true", "matched": true }));
    registry.register(router);

    let mut sleep = def(
        types::SLEEP,
        "Sleep",
        "Suspends the workflow for a duration or until a timestamp",
        NodeCategory::Action,
    );
    sleep
        .config_schema
        .push(ConfigField::new("duration", ConfigKind::Number));
    sleep
        .config_schema
        .push(ConfigField::new("value", ConfigKind::Number));
    sleep
        .config_schema
        .push(ConfigField::new("unit", ConfigKind::String));
    sleep
        .config_schema
        .push(ConfigField::new("until", ConfigKind::String));
    registry.register(sleep);

    let mut validate = def(
        types::VALIDATE,
        "Validate",
        "Checks the payload against a declarative rule list",
        NodeCategory::Logic,
    );
    validate
        .config_schema
        .push(ConfigField::new("rules", ConfigKind::Array).required());
    validate.config_schema.push(
        ConfigField::new("policy", ConfigKind::String).with_default(json!("error")),
    );
    registry.register(validate);

    let mut tool_input = def(
        types::MCP_TOOL_INPUT,
        "Tool Input",
        "Exposes the workflow as an invocable tool",
        NodeCategory::Trigger,
    );
    tool_input
        .config_schema
        .push(ConfigField::new("toolName", ConfigKind::String));
    tool_input
        .config_schema
        .push(ConfigField::new("description", ConfigKind::String));
    tool_input
        .config_schema
        .push(ConfigField::new("parameters", ConfigKind::Array));
    registry.register(tool_input);

    let mut tool_output = def(
        types::MCP_TOOL_OUTPUT,
        "Tool Output",
        "Maps the workflow result to a tool-call response",
        NodeCategory::Output,
    );
    tool_output
        .config_schema
        .push(ConfigField::new("value", ConfigKind::String));
    registry.register(tool_output);

    for (node_type, name) in [
        (types::WORKERS_AI, "Workers AI"),
        (types::AI_GATEWAY, "AI Gateway"),
    ] {
        let mut ai = def(
            node_type,
            name,
            "Runs a model inference call",
            NodeCategory::Ai,
        );
        ai.config_schema.push(
            ConfigField::new("model", ConfigKind::String)
                .with_default(json!("@cf/meta/llama-3.1-8b-instruct")),
        );
        ai.config_schema
            .push(ConfigField::new("prompt", ConfigKind::String).required());
        ai.config_schema
            .push(ConfigField::new("temperature", ConfigKind::Number));
        ai.config_schema
            .push(ConfigField::new("cache", ConfigKind::Boolean));
        ai.config_schema.push(
            ConfigField::new("cacheNamespace", ConfigKind::String).with_default(json!("AI_CACHE")),
        );
        ai.config_schema
            .push(ConfigField::new("cacheTtl", ConfigKind::Number).with_default(json!(3600)));
        if node_type == types::AI_GATEWAY {
            ai.config_schema
                .push(ConfigField::new("gateway", ConfigKind::String));
        }
        ai.bindings
            .push(BindingRequirement::new(BindingKind::Ai, "AI"));
        ai.bindings.push(
            BindingRequirement::new(BindingKind::KvNamespace, "AI_CACHE")
                .via_config("cacheNamespace")
                .optional()
                .gated_by("cache"),
        );
        registry.register(ai);
    }
}
