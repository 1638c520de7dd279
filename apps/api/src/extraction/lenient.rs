//! Forgiving `deserialize_with` hooks for model-produced JSON.
//!
//! The extraction prompts ask for strict types, but models drift: lists come back
//! as comma-separated strings, integers as `"2"`, text as `null`. These hooks
//! normalise such drift so every key is always populated.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Text field: `null` → `""`, list → items joined with `"; "`.
pub fn string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Array(items) => items
            .iter()
            .filter_map(scalar_text)
            .collect::<Vec<_>>()
            .join("; "),
        other => scalar_text(&other).unwrap_or_default(),
    })
}

/// List field: `null` → `[]`, `"a, b"` → `["a", "b"]`, blanks dropped.
pub fn string_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Array(items) => items.iter().filter_map(scalar_text).collect(),
        Value::String(s) => split_list(&s),
        other => scalar_text(&other).into_iter().collect(),
    })
}

/// Count field: integers pass through, `"2 years"` → 2, anything else → 0.
pub fn count<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().map(|f| f.max(0.0) as u64))
            .map(|v| u32::try_from(v).unwrap_or(u32::MAX))
            .unwrap_or(0),
        Value::String(s) => s
            .trim()
            .chars()
            .take_while(|c| c.is_ascii_digit())
            .collect::<String>()
            .parse()
            .unwrap_or(0),
        _ => 0,
    })
}

/// Splits a comma-separated list, trimming items and dropping empties.
pub fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.trim().to_string()).filter(|s| !s.is_empty()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
