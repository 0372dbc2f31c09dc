//! Root store access
//!
//! The caller owns the store behind a [`SharedStore`]; the binder keeps a
//! clone of the handle and never copies the value. Observed views address
//! their target by the raw key sequence from the root, and the helpers here
//! resolve and mutate those targets with host-like property semantics:
//! objects take any key, arrays take canonical indices and `length`.

use serde_json::Value;
use std::cell::RefCell;
use std::rc::Rc;

use crate::error::{BindError, Result};
use crate::path::array_index;

/// Caller-owned root store shared with a binder
pub type SharedStore = Rc<RefCell<Value>>;

/// Wrap a value as a shared store
pub fn shared(value: Value) -> SharedStore {
    Rc::new(RefCell::new(value))
}

/// Objects and arrays are composite; everything else is a leaf
pub fn is_composite(value: &Value) -> bool {
    matches!(value, Value::Object(_) | Value::Array(_))
}

/// Result of reading one key from a composite
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum Lookup {
    /// The key holds an object or array
    Composite,
    /// The key holds a scalar, null, or nothing at all
    Leaf(Option<Value>),
}

pub(crate) fn read_key(target: &Value, key: &str) -> Lookup {
    if let Value::Array(items) = target {
        if key == "length" {
            return Lookup::Leaf(Some(Value::from(items.len())));
        }
    }
    match step(target, key) {
        Some(value) if is_composite(value) => Lookup::Composite,
        Some(value) => Lookup::Leaf(Some(value.clone())),
        None => Lookup::Leaf(None),
    }
}

fn step<'v>(value: &'v Value, key: &str) -> Option<&'v Value> {
    match value {
        Value::Object(map) => map.get(key),
        Value::Array(items) => array_index(key).and_then(|i| items.get(i)),
        _ => None,
    }
}

fn step_mut<'v>(value: &'v mut Value, key: &str) -> Option<&'v mut Value> {
    match value {
        Value::Object(map) => map.get_mut(key),
        Value::Array(items) => array_index(key).and_then(move |i| items.get_mut(i)),
        _ => None,
    }
}

/// Follow `location` from the root; `None` if any step is missing
pub(crate) fn resolve<'v>(root: &'v Value, location: &[String]) -> Option<&'v Value> {
    location.iter().try_fold(root, |value, key| step(value, key))
}

/// Follow `location` to a composite that can take a write
pub(crate) fn resolve_composite_mut<'v>(
    root: &'v mut Value,
    location: &[String],
) -> Option<&'v mut Value> {
    location
        .iter()
        .try_fold(root, |value, key| step_mut(value, key))
        .filter(|value| is_composite(value))
}

/// Integral value in `0..=u32::MAX`; `2.0` counts as `2`
fn array_length(value: &Value) -> Option<usize> {
    let len = match value.as_u64() {
        Some(n) => n,
        None => {
            let f = value.as_f64()?;
            if f < 0.0 || f.fract() != 0.0 {
                return None;
            }
            f as u64
        }
    };
    if len > u64::from(u32::MAX) {
        return None;
    }
    usize::try_from(len).ok()
}

/// Assign `value` to `prop` on a composite target
///
/// `path` names the target in error messages.
pub(crate) fn assign(target: &mut Value, path: &str, prop: &str, value: Value) -> Result<()> {
    match target {
        Value::Object(map) => {
            map.insert(prop.to_string(), value);
            Ok(())
        }
        Value::Array(items) if prop == "length" => {
            let len = array_length(&value)
                .ok_or_else(|| BindError::InvalidArrayLength(value.to_string()))?;
            items.resize(len, Value::Null);
            Ok(())
        }
        Value::Array(items) => {
            let index =
                array_index(prop).ok_or_else(|| BindError::InvalidArrayIndex(prop.to_string()))?;
            let len = items.len();
            if index < len {
                items[index] = value;
            } else if index == len {
                items.push(value);
            } else {
                return Err(BindError::SparseIndex { index, len });
            }
            Ok(())
        }
        _ => Err(BindError::NotAnObject {
            path: path.to_string(),
            prop: prop.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn keys(location: &[&str]) -> Vec<String> {
        location.iter().map(|k| k.to_string()).collect()
    }

    #[test]
    fn test_read_key() {
        let store = json!({"title": "A", "list": [{"text": "B"}], "none": null});

        assert_eq!(read_key(&store, "title"), Lookup::Leaf(Some(json!("A"))));
        assert_eq!(read_key(&store, "list"), Lookup::Composite);
        assert_eq!(read_key(&store, "none"), Lookup::Leaf(Some(Value::Null)));
        assert_eq!(read_key(&store, "missing"), Lookup::Leaf(None));

        let list = &store["list"];
        assert_eq!(read_key(list, "0"), Lookup::Composite);
        assert_eq!(read_key(list, "00"), Lookup::Leaf(None));
        assert_eq!(read_key(list, "length"), Lookup::Leaf(Some(json!(1))));
    }

    #[test]
    fn test_resolve() {
        let mut store = json!({"list": [{"text": "B"}, {"text": "C"}]});

        assert_eq!(resolve(&store, &keys(&["list", "1", "text"])), Some(&json!("C")));
        assert_eq!(resolve(&store, &keys(&["list", "2"])), None);
        assert_eq!(resolve(&store, &[]), Some(&store.clone()));

        assert!(resolve_composite_mut(&mut store, &keys(&["list", "0"])).is_some());
        assert!(resolve_composite_mut(&mut store, &keys(&["list", "0", "text"])).is_none());
    }

    #[test]
    fn test_assign_object() {
        let mut target = json!({"a": 1});
        assign(&mut target, "store", "a", json!(2)).unwrap();
        assign(&mut target, "store", "b", json!("new")).unwrap();
        assert_eq!(target, json!({"a": 2, "b": "new"}));
    }

    #[test]
    fn test_assign_array() {
        let mut target = json!(["a", "b"]);

        assign(&mut target, "store.list", "1", json!("B")).unwrap();
        assign(&mut target, "store.list", "2", json!("c")).unwrap();
        assert_eq!(target, json!(["a", "B", "c"]));

        assert!(matches!(
            assign(&mut target, "store.list", "5", json!("x")),
            Err(BindError::SparseIndex { index: 5, len: 3 })
        ));
        assert!(matches!(
            assign(&mut target, "store.list", "x", json!("x")),
            Err(BindError::InvalidArrayIndex(_))
        ));

        assign(&mut target, "store.list", "length", json!(1)).unwrap();
        assert_eq!(target, json!(["a"]));
        assign(&mut target, "store.list", "length", json!(3)).unwrap();
        assert_eq!(target, json!(["a", null, null]));
        assert!(matches!(
            assign(&mut target, "store.list", "length", json!(-1)),
            Err(BindError::InvalidArrayLength(_))
        ));

        assign(&mut target, "store.list", "length", json!(2.0)).unwrap();
        assert_eq!(target, json!(["a", null]));
        assert!(matches!(
            assign(&mut target, "store.list", "length", json!(1.5)),
            Err(BindError::InvalidArrayLength(ref v)) if v == "1.5"
        ));
        assert!(matches!(
            assign(&mut target, "store.list", "length", json!("2")),
            Err(BindError::InvalidArrayLength(_))
        ));
        assert!(matches!(
            assign(&mut target, "store.list", "length", json!(4294967296u64)),
            Err(BindError::InvalidArrayLength(_))
        ));
        assert_eq!(target, json!(["a", null]));
    }

    #[test]
    fn test_assign_scalar_target() {
        let mut target = json!("text");
        let err = assign(&mut target, "store.title", "x", json!(1)).unwrap_err();
        assert!(matches!(err, BindError::NotAnObject { .. }));
    }
}
