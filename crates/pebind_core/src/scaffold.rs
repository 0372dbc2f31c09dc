//! Page scaffolding
//!
//! Builds a starting document from a store: one element per scalar leaf,
//! bound to the selector path a write to that leaf produces and showing the
//! leaf's current text.

use serde_json::Value;

use crate::document::{Element, MemoryDocument};
use crate::path::{selector_path, AccessPath, Segment};
use crate::text::display_text;

/// Every scalar leaf of `store`, paired with the selector path a write to it produces
pub fn bindable_paths(name: &str, store: &Value) -> Vec<(String, Value)> {
    let mut leaves = Vec::new();
    walk(name, store, &AccessPath::new(), &mut |selector, value, _| {
        leaves.push((selector, value.clone()));
    });
    leaves
}

/// One element per leaf; leaves held directly or indirectly by arrays get
/// `li`, the rest `span`
pub fn scaffold(name: &str, store: &Value, attribute: &str) -> MemoryDocument {
    let mut document = MemoryDocument::new();
    walk(name, store, &AccessPath::new(), &mut |selector, value, in_list| {
        let tag = if in_list { "li" } else { "span" };
        document.insert(
            Element::new(tag)
                .with_attribute(attribute, selector)
                .with_text(display_text(value)),
        );
    });
    document
}

fn walk(name: &str, value: &Value, path: &AccessPath, visit: &mut dyn FnMut(String, &Value, bool)) {
    let in_list = path.iter().any(|segment| matches!(segment, Segment::Index(_)))
        || value.is_array();
    let entries: Vec<(String, &Value)> = match value {
        Value::Object(map) => map.iter().map(|(k, v)| (k.clone(), v)).collect(),
        Value::Array(items) => items.iter().enumerate().map(|(i, v)| (i.to_string(), v)).collect(),
        _ => return,
    };

    for (key, child) in entries {
        match child {
            Value::Object(_) | Value::Array(_) => {
                walk(name, child, &path.pushed(Segment::from_key(&key)), visit);
            }
            leaf => visit(selector_path(name, path, &key), leaf, in_list),
        }
    }
}
