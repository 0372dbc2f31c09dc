//! Text form of store values
//!
//! Bound elements show a written value the way a browser would stringify
//! it, so arrays join their items with commas and objects collapse to a
//! fixed placeholder.

use serde_json::Value;

/// Placeholder shown for object values
pub const OBJECT_TEXT: &str = "[object Object]";

/// Stringify a value for display in a bound element
pub fn display_text(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => number_text(n),
        Value::String(s) => s.clone(),
        Value::Array(items) => items
            .iter()
            .map(|item| match item {
                Value::Null => String::new(),
                other => display_text(other),
            })
            .collect::<Vec<_>>()
            .join(","),
        Value::Object(_) => OBJECT_TEXT.to_string(),
    }
}

fn number_text(n: &serde_json::Number) -> String {
    if let Some(i) = n.as_i64() {
        return i.to_string();
    }
    if let Some(u) = n.as_u64() {
        return u.to_string();
    }
    match n.as_f64() {
        // -0 prints as 0
        Some(f) if f == 0.0 => "0".to_string(),
        Some(f) => f.to_string(),
        None => n.to_string(),
    }
}
