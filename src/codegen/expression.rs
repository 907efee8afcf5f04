//! Rewrites `{{ ... }}` template references inside config values into
//! generated state accessors.
//!
//! Two addressing grammars are supported: the canonical
//! `state.<nodeId>.<dotted.path>` and the legacy bare `<nodeRef>.<dotted.path>`
//! where the first segment may be a step name or a node id. Resolution is
//! total: every input rewrites to *some* accessor, so a reference to a
//! nonexistent node surfaces at runtime as an undefined read, never as a
//! compile failure.

use itertools::Itertools;
use serde_json::Value;

use super::naming::StepNames;

pub struct ExprResolver<'a> {
    names: &'a StepNames,
}

enum Part<'s> {
    Literal(&'s str),
    Template(&'s str),
}

impl<'a> ExprResolver<'a> {
    pub fn new(names: &'a StepNames) -> Self {
        Self { names }
    }

    /// Resolves a string config value to a JavaScript expression. A string
    /// that is exactly one template becomes a bare accessor; mixed content
    /// becomes a template literal; template-free strings stay string literals.
    pub fn resolve_template(&self, raw: &str) -> String {
        let parts = split_parts(raw);

        let template_count = parts
            .iter()
            .filter(|p| matches!(p, Part::Template(_)))
            .count();
        if template_count == 0 {
            return js_string(raw);
        }
        if template_count == 1 && parts.len() == 1 {
            if let Some(Part::Template(expr)) = parts.first() {
                return self.rewrite_reference(expr);
            }
        }

        let mut out = String::from("`");
        for part in &parts {
            match part {
                Part::Literal(text) => out.push_str(&escape_template_literal(text)),
                Part::Template(expr) => {
                    out.push_str("${");
                    out.push_str(&self.rewrite_reference(expr));
                    out.push('}');
                }
            }
        }
        out.push('`');
        out
    }

    /// Resolves templates inside a free-form code snippet, leaving everything
    /// outside `{{ ... }}` untouched. Used where the config value is already
    /// an expression rather than display text.
    pub fn resolve_inline(&self, raw: &str) -> String {
        let mut out = String::with_capacity(raw.len());
        for part in split_parts(raw) {
            match part {
                Part::Literal(text) => out.push_str(text),
                Part::Template(expr) => out.push_str(&self.rewrite_reference(expr)),
            }
        }
        out
    }

    /// Embeds an arbitrary config value as a JavaScript expression, resolving
    /// templates in nested strings.
    pub fn resolve_value(&self, value: &Value) -> String {
        match value {
            Value::String(s) => self.resolve_template(s),
            Value::Null | Value::Bool(_) | Value::Number(_) => value.to_string(),
            Value::Array(items) => {
                format!("[{}]", items.iter().map(|v| self.resolve_value(v)).join(", "))
            }
            Value::Object(map) => {
                if map.is_empty() {
                    "{}".to_string()
                } else {
                    format!(
                        "{{ {} }}",
                        map.iter()
                            .map(|(k, v)| format!("{}: {}", js_string(k), self.resolve_value(v)))
                            .join(", ")
                    )
                }
            }
        }
    }

    /// Rewrites one template expression into a state accessor.
    pub fn rewrite_reference(&self, expr: &str) -> String {
        let segments: Vec<&str> = expr.trim().split('.').collect();

        if segments[0] == "state" && segments.len() >= 2 {
            return state_accessor(segments[1], &segments[2..]);
        }

        let node_ref = segments[0];
        let path = &segments[1..];

        if self.names.contains_name(node_ref) {
            return format!("results[{}]{}", js_string(node_ref), path_accessor(path));
        }
        // Not a step name: treat the first segment as a node id, whether or
        // not such a node exists. A bad reference reads undefined at runtime.
        state_accessor(node_ref, path)
    }
}

fn state_accessor(node_id: &str, path: &[&str]) -> String {
    if path.is_empty() {
        format!("state[{}].output", js_string(node_id))
    } else {
        format!("state[{}]{}", js_string(node_id), path_accessor(path))
    }
}

fn path_accessor(segments: &[&str]) -> String {
    let mut out = String::new();
    for segment in segments {
        if is_js_identifier(segment) {
            out.push('.');
            out.push_str(segment);
        } else {
            out.push('[');
            out.push_str(&js_string(segment));
            out.push(']');
        }
    }
    out
}

fn split_parts(raw: &str) -> Vec<Part<'_>> {
    let mut parts = Vec::new();
    let mut rest = raw;

    while let Some(open) = rest.find("{{") {
        let Some(close) = rest[open + 2..].find("}}") else {
            break;
        };
        if open > 0 {
            parts.push(Part::Literal(&rest[..open]));
        }
        parts.push(Part::Template(rest[open + 2..open + 2 + close].trim()));
        rest = &rest[open + 2 + close + 2..];
    }
    if !rest.is_empty() {
        parts.push(Part::Literal(rest));
    }
    parts
}

pub(crate) fn is_js_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' || c == '$' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}

fn escape_template_literal(s: &str) -> String {
    s.replace('\\', "\\\\").replace('`', "\\`").replace("${", "\\${")
}

/// Quotes a string as a JavaScript string literal.
pub(crate) fn js_string(s: &str) -> String {
    serde_json::to_string(s).unwrap_or_else(|_| format!("\"{s}\""))
}
