//! A small JSONPath subset for pulling values out of recorded bodies.
//!
//! Supported syntax: optional `$` root, `.key`, `['key']` / `["key"]`, `[n]`
//! (negative counts from the end), `[*]` / `.*`, `..` recursive descent and
//! an optional surrounding `{...}`. A path without `$` is read as if it had
//! one, so `data.id` and `$.data.id` are the same.

use std::str::FromStr;

use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum JsonPathError {
    #[error("empty path segment")]
    EmptySegment,

    #[error("unclosed bracket")]
    UnclosedBracket,

    #[error("invalid bracket selector {0:?}")]
    InvalidSelector(String),

    #[error("unexpected character {0:?}")]
    Unexpected(char),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Selector {
    Name(String),
    Index(i64),
    Wildcard,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Step {
    Child(Selector),
    Descendant(Selector),
}

/// A parsed path, reusable across documents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JsonPath {
    steps: Vec<Step>,
}

impl FromStr for JsonPath {
    type Err = JsonPathError;

    fn from_str(expr: &str) -> Result<Self, Self::Err> {
        let mut text = expr.trim();
        if let Some(inner) = text.strip_prefix('{').and_then(|t| t.strip_suffix('}')) {
            text = inner.trim();
        }
        let mut steps = Vec::new();
        let mut rest = match text.strip_prefix('$') {
            Some(tail) => tail,
            None if !text.is_empty() && !text.starts_with(['.', '[']) => {
                let (name, tail) = split_name(text);
                steps.push(Step::Child(Selector::Name(name.to_string())));
                tail
            }
            None => text,
        };

        while let Some(first) = rest.chars().next() {
            if let Some(tail) = rest.strip_prefix("..") {
                let (selector, tail) = if tail.starts_with('[') {
                    bracket(tail)?
                } else {
                    dotted(tail)?
                };
                steps.push(Step::Descendant(selector));
                rest = tail;
            } else if let Some(tail) = rest.strip_prefix('.') {
                let (selector, tail) = dotted(tail)?;
                steps.push(Step::Child(selector));
                rest = tail;
            } else if rest.starts_with('[') {
                let (selector, tail) = bracket(rest)?;
                steps.push(Step::Child(selector));
                rest = tail;
            } else {
                return Err(JsonPathError::Unexpected(first));
            }
        }

        Ok(Self { steps })
    }
}

fn split_name(s: &str) -> (&str, &str) {
    let end = s.find(['.', '[']).unwrap_or(s.len());
    s.split_at(end)
}

/// Selector after a `.`: a member name or `*`.
fn dotted(s: &str) -> Result<(Selector, &str), JsonPathError> {
    if let Some(tail) = s.strip_prefix('*') {
        return Ok((Selector::Wildcard, tail));
    }
    let (name, tail) = split_name(s);
    if name.is_empty() {
        return Err(JsonPathError::EmptySegment);
    }
    Ok((Selector::Name(name.to_string()), tail))
}

/// Selector in `[...]`; `s` starts with the opening bracket.
fn bracket(s: &str) -> Result<(Selector, &str), JsonPathError> {
    let inner = &s[1..];

    if let Some(quote) = inner.chars().next().filter(|c| *c == '\'' || *c == '"') {
        let quoted = &inner[1..];
        let end = quoted.find(quote).ok_or(JsonPathError::UnclosedBracket)?;
        let tail = quoted[end + 1..]
            .strip_prefix(']')
            .ok_or(JsonPathError::UnclosedBracket)?;
        return Ok((Selector::Name(quoted[..end].to_string()), tail));
    }

    let close = inner.find(']').ok_or(JsonPathError::UnclosedBracket)?;
    let content = inner[..close].trim();
    let tail = &inner[close + 1..];
    let selector = if content == "*" {
        Selector::Wildcard
    } else {
        content
            .parse::<i64>()
            .map(Selector::Index)
            .map_err(|_| JsonPathError::InvalidSelector(content.to_string()))?
    };
    Ok((selector, tail))
}

impl JsonPath {
    /// Every node the path selects, in document order.
    pub fn select<'a>(&self, doc: &'a Value) -> Vec<&'a Value> {
        let mut nodes = vec![doc];
        for step in &self.steps {
            let mut next = Vec::new();
            match step {
                Step::Child(selector) => {
                    for node in nodes {
                        apply(selector, node, &mut next);
                    }
                }
                Step::Descendant(selector) => {
                    let mut all = Vec::new();
                    for node in nodes {
                        collect_descendants(node, &mut all);
                    }
                    for node in all {
                        apply(selector, node, &mut next);
                    }
                }
            }
            nodes = next;
        }
        nodes
    }
}

fn apply<'a>(selector: &Selector, node: &'a Value, out: &mut Vec<&'a Value>) {
    match (selector, node) {
        (Selector::Name(name), Value::Object(map)) => out.extend(map.get(name)),
        (Selector::Index(idx), Value::Array(items)) => {
            let len = items.len() as i64;
            let pos = if *idx < 0 { len + idx } else { *idx };
            if (0..len).contains(&pos) {
                out.push(&items[pos as usize]);
            }
        }
        (Selector::Wildcard, Value::Object(map)) => out.extend(map.values()),
        (Selector::Wildcard, Value::Array(items)) => out.extend(items.iter()),
        _ => {}
    }
}

fn collect_descendants<'a>(node: &'a Value, out: &mut Vec<&'a Value>) {
    out.push(node);
    match node {
        Value::Object(map) => map.values().for_each(|v| collect_descendants(v, out)),
        Value::Array(items) => items.iter().for_each(|v| collect_descendants(v, out)),
        _ => {}
    }
}

/// Plain-text rendering of a JSON value: strings without quotes, everything
/// else as compact JSON.
pub fn json_value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
        other => other.to_string(),
    }
}

/// Evaluate `expr` against `doc`. Multiple matches are joined by a single
/// space; a malformed path or no match yields `""`.
pub fn evaluate(doc: &Value, expr: &str) -> String {
    let path = match expr.parse::<JsonPath>() {
        Ok(path) => path,
        Err(e) => {
            tracing::warn!(expr, error = %e, "invalid JSONPath expression");
            return String::new();
        }
    };
    path.select(doc)
        .into_iter()
        .map(json_value_to_string)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Parse `text` as JSON, then [`evaluate`]. Non-JSON text yields `""`.
pub fn evaluate_str(text: &str, expr: &str) -> String {
    match serde_json::from_str::<Value>(text) {
        Ok(doc) => evaluate(&doc, expr),
        Err(e) => {
            tracing::warn!(error = %e, "body is not valid JSON");
            String::new()
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
