use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The abstract kind of an external resource a compiled workflow depends on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BindingKind {
    KvNamespace,
    D1Database,
    Ai,
}

impl BindingKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BindingKind::KvNamespace => "kv_namespace",
            BindingKind::D1Database => "d1_database",
            BindingKind::Ai => "ai",
        }
    }
}

/// A node that contributes to a binding, kept for deploy-time diagnostics.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageSite {
    pub node_id: String,
    pub node_type: String,
}

/// One deduplicated external-resource dependency of the compiled module.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Binding {
    pub name: String,
    pub kind: BindingKind,
    pub required: bool,
    pub usage_sites: Vec<UsageSite>,
}

/// One workflow registration entry in the deployment descriptor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowRegistration {
    pub name: String,
    pub binding: String,
    pub class_name: String,
}

/// The wrangler-style descriptor the deployment collaborator provisions from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeploymentDescriptor {
    pub name: String,
    pub main: String,
    pub compatibility_date: String,
    pub workflows: Vec<WorkflowRegistration>,
}

/// A JSON-Schema-shaped manifest describing how to invoke the compiled
/// workflow as an external callable tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolManifest {
    pub name: String,
    pub description: String,
    pub input_schema: Value,
}

/// Everything a single compile call produces. Stateless: built fresh on every
/// call and handed to the deployment collaborator, never persisted here.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompiledArtifact {
    pub module_source: String,
    pub entrypoint_class_name: String,
    pub bindings: Vec<Binding>,
    pub deployment: DeploymentDescriptor,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_manifest: Option<ToolManifest>,
}
