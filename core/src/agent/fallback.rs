//! Recovers tool calls that a model wrote into its text instead of using the
//! native tool-calling channel.
//!
//! The grammar is narrow on purpose: a brace-balanced, JSON-like object whose
//! `name` (or `tool`/`action`) names a registered tool. Arguments are read from
//! `parameters`, `arguments`, `args` or `input`; if none is present the rest of
//! the object is taken as the argument map.

use crate::traits::ToolCall;
use serde_json::{Map, Value};

const NAME_KEYS: &[&str] = &["name", "tool", "action"];
const ARGUMENT_KEYS: &[&str] = &["parameters", "arguments", "args", "input"];

/// Cheap pre-check before any parsing is attempted.
pub fn looks_like_tool_call(text: &str) -> bool {
    text.contains('{') && (text.contains("name") || text.contains("parameters"))
}

/// First embedded call naming a tool for which `is_known` holds.
pub fn decode_tool_call(text: &str, is_known: impl Fn(&str) -> bool) -> Option<ToolCall> {
    if !looks_like_tool_call(text) {
        return None;
    }

    json_object_spans(text)
        .into_iter()
        .filter_map(parse_span)
        .filter_map(|value| call_from_value(&value))
        .find(|call| is_known(&call.name))
}

/// Top-level `{...}` spans, ignoring braces inside JSON strings.
pub fn json_object_spans(text: &str) -> Vec<&str> {
    let mut spans = Vec::new();
    let mut depth = 0usize;
    let mut start = None;
    let mut in_string = false;
    let mut escape_next = false;

    for (i, ch) in text.char_indices() {
        if in_string {
            if escape_next {
                escape_next = false;
            } else if ch == '\\' {
                escape_next = true;
            } else if ch == '"' {
                in_string = false;
            }
            continue;
        }

        match ch {
            '"' if depth > 0 => in_string = true,
            '{' => {
                if depth == 0 {
                    start = Some(i);
                }
                depth += 1;
            }
            '}' if depth > 0 => {
                depth -= 1;
                if depth == 0
                    && let Some(s) = start.take()
                {
                    spans.push(&text[s..=i]);
                }
            }
            _ => {}
        }
    }

    spans
}

fn parse_span(span: &str) -> Option<Value> {
    serde_json::from_str::<Value>(span)
        .or_else(|_| serde_json::from_str::<Value>(&span.replace('\'', "\"")))
        .ok()
}

fn call_from_value(value: &Value) -> Option<ToolCall> {
    let object = value.as_object()?;

    if let Some(function) = object.get("function").filter(|f| f.is_object())
        && let Some(call) = call_from_value(function)
    {
        return Some(call);
    }

    let (name_key, name) = NAME_KEYS.iter().find_map(|key| {
        object
            .get(*key)
            .and_then(|v| v.as_str())
            .filter(|s| !s.trim().is_empty())
            .map(|s| (*key, s.trim().to_string()))
    })?;

    let arguments = ARGUMENT_KEYS
        .iter()
        .find_map(|key| object.get(*key))
        .map(normalize_arguments)
        .unwrap_or_else(|| {
            let rest: Map<String, Value> = object
                .iter()
                .filter(|(k, _)| k.as_str() != name_key)
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect();
            Value::Object(rest)
        });

    let arguments = serde_json::to_string(&arguments).ok()?;
    let digest = md5::compute(format!("{}:{}", name, arguments).as_bytes());

    Some(ToolCall {
        id: format!("call_{:x}", digest),
        name,
        arguments,
    })
}

/// OpenAI-style argument strings hold JSON themselves.
fn normalize_arguments(value: &Value) -> Value {
    match value {
        Value::String(s) => serde_json::from_str::<Value>(s)
            .ok()
            .filter(|v| v.is_object())
            .unwrap_or_else(|| Value::Object(Map::new())),
        other => other.clone(),
    }
}
