//! Per-node code generation strategies.
//!
//! Dispatch is by node type through a registry of boxed [`NodeGenerator`]
//! implementations, so new node types are added by registration rather than
//! by editing a monolithic switch. Every generated fragment shares a uniform
//! durable-step envelope with start/success/error logging keyed by node id,
//! node type, and display name.

use itertools::Itertools;
use serde_json::Value;

use super::expression::{ExprResolver, is_js_identifier, js_string};
use super::naming::StepNames;
use crate::bindings::resolve_binding_name;
use crate::error::CompileError;
use crate::graph::{Node, WorkflowGraph};
use crate::registry::{NodeRegistry, types};

/// Everything a generator may consult while emitting a node's fragment.
pub struct GenContext<'a> {
    pub graph: &'a WorkflowGraph,
    pub registry: &'a NodeRegistry,
    pub names: &'a StepNames,
    pub resolver: ExprResolver<'a>,
}

impl GenContext<'_> {
    pub fn step_name(&self, node: &Node) -> &str {
        self.names.for_node(&node.id).unwrap_or("step")
    }

    /// Source node of the first incoming edge, in edge-declaration order.
    pub fn incoming_source(&self, node: &Node) -> Option<&str> {
        self.graph
            .edges
            .iter()
            .find(|e| e.target == node.id)
            .map(|e| e.source.as_str())
    }

    /// Expression reading the node's input state: the upstream node's
    /// recorded output, falling back to the trigger payload.
    pub fn input_state_expr(&self, node: &Node) -> String {
        match self.incoming_source(node) {
            Some(source) => format!(
                "state[{id}] !== undefined ? state[{id}].output : event.payload",
                id = js_string(source)
            ),
            None => "event.payload".to_string(),
        }
    }
}

/// The contract for generating one node type's runtime fragment.
pub trait NodeGenerator: Send + Sync {
    fn node_type(&self) -> &str;
    fn generate(&self, node: &Node, ctx: &GenContext) -> Result<String, CompileError>;
}

// ---------------------------------------------------------------------------
// Fragment plumbing
// ---------------------------------------------------------------------------

/// Statement lines inside the durable-step closure, indented for the `try`
/// block. The body must leave an `output` binding in scope.
struct Body(String);

impl Body {
    fn new() -> Self {
        Self(String::new())
    }

    fn line(&mut self, statement: &str) {
        self.0.push_str("        ");
        self.0.push_str(statement);
        self.0.push('\n');
    }

    /// Embeds a multi-line block, indenting every line.
    fn block(&mut self, code: &str, extra_indent: usize) {
        for line in code.lines() {
            self.0.push_str("        ");
            for _ in 0..extra_indent {
                self.0.push(' ');
            }
            self.0.push_str(line);
            self.0.push('\n');
        }
    }

    fn finish(self) -> String {
        self.0
    }
}

fn log_json(node: &Node, event: &str, extra: &str) -> String {
    format!(
        "console.log(JSON.stringify({{ event: {}, nodeId: {}, nodeType: {}, name: {}{} }}));",
        js_string(event),
        js_string(&node.id),
        js_string(&node.node_type),
        js_string(node.display_name()),
        extra
    )
}

/// Wraps a body in the uniform durable-step envelope and records the result
/// in both the per-node state map and the per-step results map.
fn durable_step(node: &Node, ctx: &GenContext, body: &str) -> String {
    let name = ctx.step_name(node);
    let mut code = String::new();
    code.push_str(&format!(
        "    // {} [{}]\n",
        node.display_name(),
        node.node_type
    ));
    code.push_str(&format!(
        "    const {name} = await step.do({}, async () => {{\n",
        js_string(name)
    ));
    code.push_str(&format!("      {}\n", log_json(node, "node:start", "")));
    code.push_str("      try {\n");
    code.push_str(body);
    code.push_str(&format!("        {}\n", log_json(node, "node:success", "")));
    code.push_str("        return output;\n");
    code.push_str("      } catch (error) {\n");
    code.push_str(&format!(
        "        {}\n",
        log_json(node, "node:error", ", error: String(error)")
    ));
    code.push_str("        throw error;\n");
    code.push_str("      }\n");
    code.push_str("    });\n");
    code.push_str(&format!(
        "    state[{}] = {{ output: {name} }};\n",
        js_string(&node.id)
    ));
    code.push_str(&format!("    results[{}] = {name};\n", js_string(name)));
    code
}

/// Fragment for node types with no registered generator: annotated
/// passthrough, never a compile failure.
pub(crate) fn passthrough_fragment(node: &Node, ctx: &GenContext) -> String {
    let name = ctx.step_name(node);
    let mut code = String::new();
    code.push_str(&format!(
        "    // Unsupported node type {}; passing data through unchanged.\n",
        js_string(&node.node_type)
    ));
    code.push_str(&format!(
        "    const {name} = {};\n",
        ctx.input_state_expr(node)
    ));
    code.push_str(&format!(
        "    state[{}] = {{ output: {name} }};\n",
        js_string(&node.id)
    ));
    code.push_str(&format!("    results[{}] = {name};\n", js_string(name)));
    code
}

fn invalid_config(node: &Node, message: impl Into<String>) -> CompileError {
    CompileError::InvalidNodeConfig {
        node_id: node.id.clone(),
        message: message.into(),
    }
}

/// Parameter names declared on entry-kind nodes. Accepts both bare strings
/// and `{ name, ... }` objects; anything that is not a bare identifier is
/// dropped rather than breaking the generated destructuring.
fn declared_parameters(node: &Node) -> Vec<String> {
    node.config_array("parameters")
        .map(|items| {
            items
                .iter()
                .filter_map(|item| match item {
                    Value::String(s) => Some(s.clone()),
                    Value::Object(o) => o.get("name").and_then(Value::as_str).map(str::to_string),
                    _ => None,
                })
                .filter(|name| is_js_identifier(name))
                .collect()
        })
        .unwrap_or_default()
}

/// Result expression for return-kind nodes: a literal/template `value`, a
/// structured `returnValue`, or the literal `"success"`.
fn return_value_expr(node: &Node, ctx: &GenContext) -> String {
    if let Some(value) = node.config("value") {
        if !value.is_null() {
            return ctx.resolver.resolve_value(value);
        }
    }

    if let Some(return_value) = node.config_object("returnValue") {
        let kind = return_value
            .get("kind")
            .and_then(Value::as_str)
            .unwrap_or("literal");
        let value = return_value.get("value").cloned().unwrap_or(Value::Null);
        return match (kind, &value) {
            ("expression", Value::String(expr)) => ctx.resolver.resolve_inline(expr),
            ("variable", Value::String(reference)) => ctx.resolver.rewrite_reference(reference),
            _ => value.to_string(),
        };
    }

    js_string("success")
}

// ---------------------------------------------------------------------------
// Entry-kind generators
// ---------------------------------------------------------------------------

struct EntryGenerator;

impl NodeGenerator for EntryGenerator {
    fn node_type(&self) -> &str {
        types::ENTRY
    }

    fn generate(&self, node: &Node, ctx: &GenContext) -> Result<String, CompileError> {
        let mut body = Body::new();
        let parameters = declared_parameters(node);
        if parameters.is_empty() {
            body.line("const inputData = event.payload ?? {};");
            body.line("const output = inputData;");
        } else {
            let list = parameters.iter().join(", ");
            body.line(&format!("const {{ {list} }} = event.payload ?? {{}};"));
            body.line(&format!("const output = {{ {list} }};"));
        }
        Ok(durable_step(node, ctx, &body.finish()))
    }
}

struct McpToolInputGenerator;

impl NodeGenerator for McpToolInputGenerator {
    fn node_type(&self) -> &str {
        types::MCP_TOOL_INPUT
    }

    fn generate(&self, node: &Node, ctx: &GenContext) -> Result<String, CompileError> {
        let mut body = Body::new();
        body.line("const args = event.payload?.arguments ?? event.payload ?? {};");
        let parameters = declared_parameters(node);
        if parameters.is_empty() {
            body.line("const output = args;");
        } else {
            let list = parameters.iter().join(", ");
            body.line(&format!("const {{ {list} }} = args;"));
            body.line(&format!("const output = {{ {list} }};"));
        }
        Ok(durable_step(node, ctx, &body.finish()))
    }
}

// ---------------------------------------------------------------------------
// Return-kind generators
// ---------------------------------------------------------------------------

struct ReturnGenerator;

impl NodeGenerator for ReturnGenerator {
    fn node_type(&self) -> &str {
        types::RETURN
    }

    fn generate(&self, node: &Node, ctx: &GenContext) -> Result<String, CompileError> {
        let mut body = Body::new();
        body.line(&format!("const output = {};", return_value_expr(node, ctx)));
        Ok(durable_step(node, ctx, &body.finish()))
    }
}

struct McpToolOutputGenerator;

impl NodeGenerator for McpToolOutputGenerator {
    fn node_type(&self) -> &str {
        types::MCP_TOOL_OUTPUT
    }

    fn generate(&self, node: &Node, ctx: &GenContext) -> Result<String, CompileError> {
        let mut body = Body::new();
        body.line(&format!("const result = {};", return_value_expr(node, ctx)));
        body.line("const output = { content: [{ type: \"text\", text: typeof result === \"string\" ? result : JSON.stringify(result) }] };");
        Ok(durable_step(node, ctx, &body.finish()))
    }
}

// ---------------------------------------------------------------------------
// HTTP
// ---------------------------------------------------------------------------

struct HttpRequestGenerator;

impl NodeGenerator for HttpRequestGenerator {
    fn node_type(&self) -> &str {
        types::HTTP_REQUEST
    }

    fn generate(&self, node: &Node, ctx: &GenContext) -> Result<String, CompileError> {
        let url = ctx
            .resolver
            .resolve_template(node.config_str("url").unwrap_or_default());
        let method = node
            .config_str("method")
            .unwrap_or("GET")
            .to_ascii_uppercase();
        let timeout = node.config_u64("timeout").unwrap_or(30000);

        let mut body = Body::new();
        body.line(&format!("const url = {url};"));
        body.line("const init = {");
        body.line(&format!("  method: {},", js_string(&method)));
        if let Some(headers) = node.config("headers") {
            if !headers.is_null() {
                body.line(&format!(
                    "  headers: {},",
                    ctx.resolver.resolve_value(headers)
                ));
            }
        }
        body.line(&format!("  signal: AbortSignal.timeout({timeout}),"));
        body.line("};");

        if method != "GET" && method != "HEAD" {
            if let Some(request_body) = node.config("body") {
                if !request_body.is_null() {
                    body.line(&format!(
                        "const requestBody = {};",
                        ctx.resolver.resolve_value(request_body)
                    ));
                    body.line("init.body = typeof requestBody === \"string\" ? requestBody : JSON.stringify(requestBody);");
                }
            }
        }

        body.line("const response = await fetch(url, init);");
        body.line("if (!response.ok) {");
        body.line("  throw new Error(`HTTP ${init.method} ${url} failed with status ${response.status}`);");
        body.line("}");
        body.line("const responseText = await response.text();");
        body.line("let responseBody;");
        body.line("try {");
        body.line("  responseBody = JSON.parse(responseText);");
        body.line("} catch {");
        body.line("  responseBody = responseText;");
        body.line("}");
        body.line("const output = { status: response.status, body: responseBody };");
        Ok(durable_step(node, ctx, &body.finish()))
    }
}

// ---------------------------------------------------------------------------
// KV
// ---------------------------------------------------------------------------

struct KvGetGenerator;

impl NodeGenerator for KvGetGenerator {
    fn node_type(&self) -> &str {
        types::KV_GET
    }

    fn generate(&self, node: &Node, ctx: &GenContext) -> Result<String, CompileError> {
        let namespace = resolve_binding_name(
            node,
            ctx.registry.get_definition(&node.node_type),
            "namespace",
            "KV",
        );
        let key = ctx
            .resolver
            .resolve_template(node.config_str("key").unwrap_or_default());

        let mut body = Body::new();
        body.line(&format!("const key = {key};"));
        body.line(&format!("const raw = await env.{namespace}.get(key);"));
        body.line("let output;");
        body.line("try {");
        body.line("  output = raw === null ? null : JSON.parse(raw);");
        body.line("} catch {");
        body.line("  output = raw;");
        body.line("}");
        Ok(durable_step(node, ctx, &body.finish()))
    }
}

struct KvPutGenerator;

impl NodeGenerator for KvPutGenerator {
    fn node_type(&self) -> &str {
        types::KV_PUT
    }

    fn generate(&self, node: &Node, ctx: &GenContext) -> Result<String, CompileError> {
        let namespace = resolve_binding_name(
            node,
            ctx.registry.get_definition(&node.node_type),
            "namespace",
            "KV",
        );
        let key = ctx
            .resolver
            .resolve_template(node.config_str("key").unwrap_or_default());
        let value = ctx
            .resolver
            .resolve_value(node.config("value").unwrap_or(&Value::Null));

        let mut options = Vec::new();
        if let Some(ttl) = node.config_u64("ttl") {
            options.push(format!("expirationTtl: {ttl}"));
        }
        if let Some(expiration) = node.config_u64("expiration") {
            options.push(format!("expiration: {expiration}"));
        }
        if let Some(metadata) = node.config("metadata") {
            if !metadata.is_null() {
                options.push(format!("metadata: {}", ctx.resolver.resolve_value(metadata)));
            }
        }

        let mut body = Body::new();
        body.line(&format!("const key = {key};"));
        body.line(&format!("const value = {value};"));
        let serialized = "typeof value === \"string\" ? value : JSON.stringify(value)";
        if options.is_empty() {
            body.line(&format!("await env.{namespace}.put(key, {serialized});"));
        } else {
            body.line(&format!(
                "await env.{namespace}.put(key, {serialized}, {{ {} }});",
                options.join(", ")
            ));
        }
        body.line("const output = { key, written: true };");
        Ok(durable_step(node, ctx, &body.finish()))
    }
}

// ---------------------------------------------------------------------------
// D1
// ---------------------------------------------------------------------------

struct D1QueryGenerator;

impl NodeGenerator for D1QueryGenerator {
    fn node_type(&self) -> &str {
        types::D1_QUERY
    }

    fn generate(&self, node: &Node, ctx: &GenContext) -> Result<String, CompileError> {
        let database = resolve_binding_name(
            node,
            ctx.registry.get_definition(&node.node_type),
            "database",
            "DB",
        );
        let sql = ctx
            .resolver
            .resolve_template(node.config_str("query").unwrap_or_default());
        let mode = match node.config_str("mode") {
            Some("run") => "run",
            Some("first") => "first",
            _ => "all",
        };
        let params: Vec<String> = node
            .config_array("params")
            .map(|items| items.iter().map(|p| ctx.resolver.resolve_value(p)).collect())
            .unwrap_or_default();

        // Runtime failures are swallowed into a structured result here, while
        // http-request throws. The asymmetry is the contract, not an accident.
        let mut body = Body::new();
        body.line("let output;");
        body.line("try {");
        body.line(&format!("  const statement = env.{database}.prepare({sql});"));
        if params.is_empty() {
            body.line(&format!("  const queryResult = await statement.{mode}();"));
        } else {
            body.line(&format!("  const bound = statement.bind({});", params.join(", ")));
            body.line(&format!("  const queryResult = await bound.{mode}();"));
        }
        body.line("  output = { success: true, result: queryResult };");
        body.line("} catch (error) {");
        body.line("  output = { success: false, error: error instanceof Error ? error.message : String(error) };");
        body.line("}");
        Ok(durable_step(node, ctx, &body.finish()))
    }
}

// ---------------------------------------------------------------------------
// Transform
// ---------------------------------------------------------------------------

struct TransformGenerator;

impl NodeGenerator for TransformGenerator {
    fn node_type(&self) -> &str {
        types::TRANSFORM
    }

    fn generate(&self, node: &Node, ctx: &GenContext) -> Result<String, CompileError> {
        let code = node
            .config_str("code")
            .ok_or_else(|| invalid_config(node, "transform node has no code"))?;
        let rewritten = rewrite_user_identifiers(code);

        let mut body = Body::new();
        body.line(&format!("const inputData = {};", ctx.input_state_expr(node)));
        if contains_token(&rewritten, "return") {
            body.line("const output = (() => {");
            body.block(&rewritten, 2);
            body.line("})();");
        } else {
            let expression = rewritten.trim().trim_end_matches(';').trim_end();
            body.line(&format!("const output = ({expression});"));
        }
        Ok(durable_step(node, ctx, &body.finish()))
    }
}

/// Naive identifier rewrite: bare `input` and `data` tokens become
/// `inputData`. Property accesses (`obj.data`) are left alone; no real
/// parsing is attempted, so the embedded code is trusted as written.
fn rewrite_user_identifiers(code: &str) -> String {
    let chars: Vec<char> = code.chars().collect();
    let mut out = String::with_capacity(code.len());
    let mut previous_significant: Option<char> = None;
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        if c.is_ascii_alphabetic() || c == '_' || c == '$' {
            let start = i;
            while i < chars.len()
                && (chars[i].is_ascii_alphanumeric() || chars[i] == '_' || chars[i] == '$')
            {
                i += 1;
            }
            let token: String = chars[start..i].iter().collect();
            if previous_significant != Some('.') && (token == "input" || token == "data") {
                out.push_str("inputData");
            } else {
                out.push_str(&token);
            }
            previous_significant = Some('a');
        } else {
            out.push(c);
            if !c.is_whitespace() {
                previous_significant = Some(c);
            }
            i += 1;
        }
    }
    out
}

fn contains_token(code: &str, token: &str) -> bool {
    code.split(|c: char| !c.is_ascii_alphanumeric() && c != '_' && c != '$')
        .any(|t| t == token)
}

// ---------------------------------------------------------------------------
// Conditional router
// ---------------------------------------------------------------------------

struct ConditionalRouterGenerator;

impl NodeGenerator for ConditionalRouterGenerator {
    fn node_type(&self) -> &str {
        types::CONDITIONAL_ROUTER
    }

    fn generate(&self, node: &Node, ctx: &GenContext) -> Result<String, CompileError> {
        let condition = if let Some(expression) = node
            .config_str("expression")
            .filter(|s| !s.trim().is_empty())
        {
            format!("Boolean({})", ctx.resolver.resolve_inline(expression))
        } else if node.config("left").is_some() && node.config("right").is_some() {
            let left = ctx
                .resolver
                .resolve_value(node.config("left").unwrap_or(&Value::Null));
            let right = ctx
                .resolver
                .resolve_value(node.config("right").unwrap_or(&Value::Null));
            let operator = node.config_str("operator").unwrap_or("equals");
            match operator {
                "equals" => format!("{left} === {right}"),
                "not_equals" => format!("{left} !== {right}"),
                "greater_than" => format!("{left} > {right}"),
                "greater_than_or_equal" => format!("{left} >= {right}"),
                "less_than" => format!("{left} < {right}"),
                "less_than_or_equal" => format!("{left} <= {right}"),
                "contains" => format!("String({left}).includes(String({right}))"),
                other => {
                    return Err(invalid_config(
                        node,
                        format!("unsupported comparison operator '{other}'"),
                    ));
                }
            }
        } else {
            return Err(invalid_config(
                node,
                "router needs either an expression or left/operator/right operands",
            ));
        };

        let mut body = Body::new();
        body.line(&format!("const inputData = {};", ctx.input_state_expr(node)));
        body.line(&format!("const matched = {condition};"));
        body.line("const output = { branch: matched ? \"true\" : \"false\", matched, input: inputData };");
        Ok(durable_step(node, ctx, &body.finish()))
    }
}

// ---------------------------------------------------------------------------
// Sleep
// ---------------------------------------------------------------------------

const UNIT_TABLE: &[(&str, f64)] = &[
    ("ms", 1.0),
    ("seconds", 1000.0),
    ("minutes", 60_000.0),
    ("hours", 3_600_000.0),
    ("days", 86_400_000.0),
    ("weeks", 604_800_000.0),
];

struct SleepGenerator;

impl NodeGenerator for SleepGenerator {
    fn node_type(&self) -> &str {
        types::SLEEP
    }

    // Sleeps use the runtime's native durable sleep primitives rather than
    // step.do, with the same logging lines around them.
    fn generate(&self, node: &Node, ctx: &GenContext) -> Result<String, CompileError> {
        let name = ctx.step_name(node);
        let mut code = String::new();
        code.push_str(&format!(
            "    // {} [{}]\n",
            node.display_name(),
            node.node_type
        ));
        code.push_str(&format!("    {}\n", log_json(node, "node:start", "")));

        let sleep_call = match sleep_target(node) {
            SleepTarget::Millis(ms) => {
                format!("await step.sleep({}, {ms});", js_string(name))
            }
            SleepTarget::Until(timestamp) => format!(
                "await step.sleepUntil({}, new Date({timestamp}));",
                js_string(name)
            ),
        };
        code.push_str(&format!("    {sleep_call}\n"));
        code.push_str(&format!("    {}\n", log_json(node, "node:success", "")));
        code.push_str(&format!(
            "    const {name} = {};\n",
            ctx.input_state_expr(node)
        ));
        code.push_str(&format!(
            "    state[{}] = {{ output: {name} }};\n",
            js_string(&node.id)
        ));
        code.push_str(&format!("    results[{}] = {name};\n", js_string(name)));
        Ok(code)
    }
}

enum SleepTarget {
    Millis(u64),
    Until(String),
}

fn sleep_target(node: &Node) -> SleepTarget {
    if let Some(duration) = node.config_u64("duration") {
        return SleepTarget::Millis(duration);
    }
    if let Some(value) = node.config_f64("value") {
        let unit = node.config_str("unit").unwrap_or("ms");
        let multiplier = UNIT_TABLE
            .iter()
            .find(|(u, _)| *u == unit)
            .map(|(_, m)| *m)
            .unwrap_or(1.0);
        return SleepTarget::Millis((value * multiplier) as u64);
    }
    if let Some(until) = node.config("until") {
        match until {
            Value::String(ts) => return SleepTarget::Until(js_string(ts)),
            Value::Number(epoch) => return SleepTarget::Until(epoch.to_string()),
            _ => {}
        }
    }
    SleepTarget::Millis(1000)
}

// ---------------------------------------------------------------------------
// Validate
// ---------------------------------------------------------------------------

struct ValidateGenerator;

impl NodeGenerator for ValidateGenerator {
    fn node_type(&self) -> &str {
        types::VALIDATE
    }

    fn generate(&self, node: &Node, ctx: &GenContext) -> Result<String, CompileError> {
        let mut body = Body::new();
        body.line(&format!("const inputData = {};", ctx.input_state_expr(node)));
        body.line("const errors = [];");

        for rule in node.config_array("rules").into_iter().flatten() {
            let Some(rule) = rule.as_object() else {
                continue;
            };
            let field = rule.get("field").and_then(Value::as_str).unwrap_or("");
            let rule_type = rule.get("type").and_then(Value::as_str).unwrap_or("required");
            let message = rule
                .get("message")
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| format!("{field} failed {rule_type} check"));
            let push = format!(
                "errors.push({{ field: {}, message: {} }});",
                js_string(field),
                js_string(&message)
            );

            body.line("{");
            body.line(&format!("  const value = inputData?.[{}];", js_string(field)));
            match rule_type {
                "required" => {
                    body.line("  if (value === undefined || value === null || value === \"\") {");
                    body.line(&format!("    {push}"));
                    body.line("  }");
                }
                "email" => {
                    body.line("  if (value !== undefined && value !== null && !/^[^\\s@]+@[^\\s@]+\\.[^\\s@]+$/.test(String(value))) {");
                    body.line(&format!("    {push}"));
                    body.line("  }");
                }
                "url" => {
                    body.line("  if (value !== undefined && value !== null) {");
                    body.line("    try {");
                    body.line("      new URL(String(value));");
                    body.line("    } catch {");
                    body.line(&format!("      {push}"));
                    body.line("    }");
                    body.line("  }");
                }
                "length" => {
                    let mut checks = Vec::new();
                    if let Some(min) = rule.get("min").and_then(Value::as_u64) {
                        checks.push(format!("String(value).length < {min}"));
                    }
                    if let Some(max) = rule.get("max").and_then(Value::as_u64) {
                        checks.push(format!("String(value).length > {max}"));
                    }
                    if !checks.is_empty() {
                        body.line(&format!(
                            "  if (value !== undefined && value !== null && ({})) {{",
                            checks.join(" || ")
                        ));
                        body.line(&format!("    {push}"));
                        body.line("  }");
                    }
                }
                "range" => {
                    let mut checks = Vec::new();
                    if let Some(min) = rule.get("min").and_then(Value::as_f64) {
                        checks.push(format!("Number(value) < {min}"));
                    }
                    if let Some(max) = rule.get("max").and_then(Value::as_f64) {
                        checks.push(format!("Number(value) > {max}"));
                    }
                    if !checks.is_empty() {
                        body.line(&format!(
                            "  if (value !== undefined && value !== null && ({})) {{",
                            checks.join(" || ")
                        ));
                        body.line(&format!("    {push}"));
                        body.line("  }");
                    }
                }
                "regex" => {
                    if let Some(pattern) = rule.get("pattern").and_then(Value::as_str) {
                        body.line(&format!(
                            "  if (value !== undefined && value !== null && !new RegExp({}).test(String(value))) {{",
                            js_string(pattern)
                        ));
                        body.line(&format!("    {push}"));
                        body.line("  }");
                    }
                }
                "custom" => {
                    if let Some(expression) = rule.get("expression").and_then(Value::as_str) {
                        body.line(&format!(
                            "  if (!({})) {{",
                            ctx.resolver.resolve_inline(expression)
                        ));
                        body.line(&format!("    {push}"));
                        body.line("  }");
                    }
                }
                _ => {}
            }
            body.line("}");
        }

        let policy = node.config_str("policy").unwrap_or("error");
        if policy == "error" {
            body.line("if (errors.length > 0) {");
            body.line("  throw new Error(`Validation failed: ${JSON.stringify(errors)}`);");
            body.line("}");
            body.line("const output = { valid: true, data: inputData };");
        } else {
            body.line("let output;");
            body.line("if (errors.length > 0) {");
            body.line("  output = { valid: false, errors };");
            body.line("} else {");
            body.line("  output = { valid: true, data: inputData };");
            body.line("}");
        }
        Ok(durable_step(node, ctx, &body.finish()))
    }
}

// ---------------------------------------------------------------------------
// AI inference
// ---------------------------------------------------------------------------

fn ai_fragment(node: &Node, ctx: &GenContext, gateway: bool) -> Result<String, CompileError> {
    let definition = ctx.registry.get_definition(&node.node_type);
    let model = node
        .config_str("model")
        .filter(|s| !s.trim().is_empty())
        .map(str::to_string)
        .or_else(|| {
            definition
                .and_then(|d| d.schema_default("model"))
                .and_then(Value::as_str)
                .map(str::to_string)
        })
        .unwrap_or_else(|| "@cf/meta/llama-3.1-8b-instruct".to_string());
    let prompt = ctx
        .resolver
        .resolve_template(node.config_str("prompt").unwrap_or_default());

    let mut run_args = String::from("model, { prompt");
    if let Some(temperature) = node.config_f64("temperature") {
        run_args.push_str(&format!(", temperature: {temperature}"));
    }
    run_args.push_str(" }");

    let gateway_id = if gateway {
        node.config_str("gateway").filter(|s| !s.trim().is_empty())
    } else {
        None
    };
    let invoke = match gateway_id {
        Some(id) => format!(
            "await env.AI.run({run_args}, {{ gateway: {{ id: {} }} }})",
            js_string(id)
        ),
        None => format!("await env.AI.run({run_args})"),
    };

    let mut body = Body::new();
    body.line(&format!("const model = {};", js_string(&model)));
    body.line(&format!("const prompt = {prompt};"));

    if node.config_bool("cache").unwrap_or(false) {
        let namespace = resolve_binding_name(node, definition, "cacheNamespace", "AI_CACHE");
        let ttl = node.config_u64("cacheTtl").unwrap_or(3600);
        body.line("const cacheKey = `ai:${model}:${await digestText(prompt)}`;");
        body.line(&format!("const cached = await env.{namespace}.get(cacheKey);"));
        body.line("let output;");
        body.line("if (cached !== null) {");
        body.line("  output = JSON.parse(cached);");
        body.line("} else {");
        body.line(&format!("  output = {invoke};"));
        body.line(&format!(
            "  await env.{namespace}.put(cacheKey, JSON.stringify(output), {{ expirationTtl: {ttl} }});"
        ));
        body.line("}");
    } else {
        body.line(&format!("const output = {invoke};"));
    }
    Ok(durable_step(node, ctx, &body.finish()))
}

struct WorkersAiGenerator;

impl NodeGenerator for WorkersAiGenerator {
    fn node_type(&self) -> &str {
        types::WORKERS_AI
    }

    fn generate(&self, node: &Node, ctx: &GenContext) -> Result<String, CompileError> {
        ai_fragment(node, ctx, false)
    }
}

struct AiGatewayGenerator;

impl NodeGenerator for AiGatewayGenerator {
    fn node_type(&self) -> &str {
        types::AI_GATEWAY
    }

    fn generate(&self, node: &Node, ctx: &GenContext) -> Result<String, CompileError> {
        ai_fragment(node, ctx, true)
    }
}

// ---------------------------------------------------------------------------
// Registration
// ---------------------------------------------------------------------------

fn default_generators() -> Vec<Box<dyn NodeGenerator>> {
    vec![
        Box::new(EntryGenerator),
        Box::new(ReturnGenerator),
        Box::new(HttpRequestGenerator),
        Box::new(KvGetGenerator),
        Box::new(KvPutGenerator),
        Box::new(D1QueryGenerator),
        Box::new(TransformGenerator),
        Box::new(ConditionalRouterGenerator),
        Box::new(SleepGenerator),
        Box::new(ValidateGenerator),
        Box::new(McpToolInputGenerator),
        Box::new(McpToolOutputGenerator),
        Box::new(WorkersAiGenerator),
        Box::new(AiGatewayGenerator),
    ]
}

pub(super) fn register_default_generators(
    registry: &mut ahash::AHashMap<String, Box<dyn NodeGenerator>>,
) {
    for generator in default_generators() {
        registry.insert(generator.node_type().to_string(), generator);
    }
}

pub(super) fn create_generator_by_name(name: &str) -> Option<Box<dyn NodeGenerator>> {
    match name {
        types::ENTRY => Some(Box::new(EntryGenerator)),
        types::RETURN => Some(Box::new(ReturnGenerator)),
        types::HTTP_REQUEST => Some(Box::new(HttpRequestGenerator)),
        types::KV_GET => Some(Box::new(KvGetGenerator)),
        types::KV_PUT => Some(Box::new(KvPutGenerator)),
        types::D1_QUERY => Some(Box::new(D1QueryGenerator)),
        types::TRANSFORM => Some(Box::new(TransformGenerator)),
        types::CONDITIONAL_ROUTER => Some(Box::new(ConditionalRouterGenerator)),
        types::SLEEP => Some(Box::new(SleepGenerator)),
        types::VALIDATE => Some(Box::new(ValidateGenerator)),
        types::MCP_TOOL_INPUT => Some(Box::new(McpToolInputGenerator)),
        types::MCP_TOOL_OUTPUT => Some(Box::new(McpToolOutputGenerator)),
        types::WORKERS_AI => Some(Box::new(WorkersAiGenerator)),
        types::AI_GATEWAY => Some(Box::new(AiGatewayGenerator)),
        _ => None,
    }
}
