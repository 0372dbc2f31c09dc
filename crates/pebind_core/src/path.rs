//! Access paths and selector paths
//!
//! A chain of nested reads through an observed view records one [`Segment`]
//! per composite value it steps into. When the chain ends in a write, the
//! recorded [`AccessPath`] is joined with the symbolic root name and the
//! written property to form the selector path that bound elements declare:
//!
//! ```rust
//! use pebind_core::path::{selector_path, AccessPath, Segment};
//!
//! let mut path = AccessPath::new();
//! path.push(Segment::from_key("listitems"));
//! path.push(Segment::from_key("1"));
//!
//! assert_eq!(selector_path("store", &path, "text"), "store.listitems[1].text");
//! ```

use smallvec::SmallVec;
use std::fmt;

use crate::error::{BindError, Result};

/// One step of an access path
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Segment {
    /// Rendered as `.key`
    Property(String),
    /// Rendered as `[key]`, keeping the key text as it was read
    Index(String),
}

impl Segment {
    /// Classify a raw key: numeric-looking keys become indices
    pub fn from_key(key: &str) -> Self {
        if is_numeric_key(key) {
            Segment::Index(key.to_string())
        } else {
            Segment::Property(key.to_string())
        }
    }

    /// The raw key text
    pub fn key(&self) -> &str {
        match self {
            Segment::Property(key) | Segment::Index(key) => key,
        }
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Segment::Property(key) => write!(f, ".{}", key),
            Segment::Index(key) => write!(f, "[{}]", key),
        }
    }
}

/// Whether a key parses as a finite number (surrounding whitespace ignored)
pub fn is_numeric_key(key: &str) -> bool {
    let trimmed = key.trim();
    !trimmed.is_empty() && trimmed.parse::<f64>().map_or(false, f64::is_finite)
}

/// Canonical array index: `0` or a digit run without a leading zero
pub fn array_index(key: &str) -> Option<usize> {
    let canonical = key == "0"
        || (!key.is_empty()
            && !key.starts_with('0')
            && key.bytes().all(|b| b.is_ascii_digit()));
    if canonical {
        key.parse().ok()
    } else {
        None
    }
}

/// Ordered segments recorded by a chain of nested reads
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AccessPath {
    segments: SmallVec<[Segment; 4]>,
}

impl AccessPath {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, segment: Segment) {
        self.segments.push(segment);
    }

    /// Copy of this path with one more segment
    pub fn pushed(&self, segment: Segment) -> Self {
        let mut path = self.clone();
        path.push(segment);
        path
    }

    /// Return the recorded segments, leaving this path empty
    pub fn take(&mut self) -> Self {
        std::mem::take(self)
    }

    pub fn clear(&mut self) {
        self.segments.clear();
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Segment> {
        self.segments.iter()
    }
}

impl FromIterator<Segment> for AccessPath {
    fn from_iter<I: IntoIterator<Item = Segment>>(iter: I) -> Self {
        Self {
            segments: iter.into_iter().collect(),
        }
    }
}

impl fmt::Display for AccessPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for segment in &self.segments {
            write!(f, "{}", segment)?;
        }
        Ok(())
    }
}

/// Build the selector path for a write of `prop` after reading `path`
///
/// The written property is always dotted, even when it is numeric, and an
/// empty property adds nothing.
pub fn selector_path(name: &str, path: &AccessPath, prop: &str) -> String {
    let mut selector = format!("{}{}", name, path);
    if !prop.is_empty() {
        selector.push('.');
        selector.push_str(prop);
    }
    selector
}

/// A parsed `root.key[index]...` expression
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PathExpression {
    pub root: String,
    pub keys: Vec<String>,
}

/// Parse a path expression such as `store.listitems[1].text`
///
/// Bracketed keys may be quoted (`store["a b"]`). Keys are returned raw, in
/// read order, without the root.
pub fn parse_expression(expr: &str) -> Result<PathExpression> {
    let invalid = |reason: &str| BindError::InvalidExpression {
        expr: expr.to_string(),
        reason: reason.to_string(),
    };

    let source = expr.trim();
    let delimiters = &['.', '['][..];

    let root_end = source.find(delimiters).unwrap_or(source.len());
    let root = &source[..root_end];
    if root.is_empty() {
        return Err(invalid("missing root name"));
    }

    let mut keys = Vec::new();
    let mut rest = &source[root_end..];
    while let Some(first) = rest.chars().next() {
        match first {
            '.' => {
                let body = &rest[1..];
                let end = body.find(delimiters).unwrap_or(body.len());
                if end == 0 {
                    return Err(invalid("empty property name"));
                }
                keys.push(body[..end].to_string());
                rest = &body[end..];
            }
            '[' => {
                let body = &rest[1..];
                let (key, consumed) = parse_bracket(body).ok_or_else(|| invalid("malformed index"))?;
                keys.push(key);
                rest = &body[consumed..];
            }
            _ => return Err(invalid("unexpected characters after index")),
        }
    }

    Ok(PathExpression {
        root: root.to_string(),
        keys,
    })
}

/// Parse the inside of `[...]`, returning the key and bytes consumed including `]`
fn parse_bracket(body: &str) -> Option<(String, usize)> {
    let quote = body.chars().next().filter(|c| *c == '"' || *c == '\'');
    match quote {
        Some(q) => {
            let inner = &body[1..];
            let close = inner.find(q)?;
            if !inner[close + 1..].starts_with(']') {
                return None;
            }
            Some((inner[..close].to_string(), close + 3))
        }
        None => {
            let close = body.find(']')?;
            let key = body[..close].trim();
            if key.is_empty() {
                return None;
            }
            Some((key.to_string(), close + 1))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_segment_classification() {
        assert_eq!(Segment::from_key("title"), Segment::Property("title".into()));
        assert_eq!(Segment::from_key("0"), Segment::Index("0".into()));
        assert_eq!(Segment::from_key("01"), Segment::Index("01".into()));
        assert_eq!(Segment::from_key("1.5"), Segment::Index("1.5".into()));
        assert_eq!(Segment::from_key("NaN"), Segment::Property("NaN".into()));
        assert_eq!(Segment::from_key("inf"), Segment::Property("inf".into()));
        assert_eq!(Segment::from_key(""), Segment::Property("".into()));

        assert_eq!(Segment::from_key("01").to_string(), "[01]");
        assert_eq!(Segment::from_key("items").to_string(), ".items");
        assert_eq!(Segment::from_key("01").key(), "01");
        assert_eq!(Segment::from_key("items").key(), "items");
    }

    #[test]
    fn test_array_index() {
        assert_eq!(array_index("0"), Some(0));
        assert_eq!(array_index("12"), Some(12));
        assert_eq!(array_index("01"), None);
        assert_eq!(array_index("-1"), None);
        assert_eq!(array_index("1.0"), None);
        assert_eq!(array_index(""), None);
    }

    #[test]
    fn test_selector_path() {
        let path: AccessPath = ["listitems", "0"].iter().map(|k| Segment::from_key(k)).collect();

        assert_eq!(selector_path("store", &path, "text"), "store.listitems[0].text");
        assert_eq!(selector_path("store", &path, ""), "store.listitems[0]");
        assert_eq!(selector_path("store", &AccessPath::new(), "title"), "store.title");
        // The written property stays dotted even when numeric
        assert_eq!(
            selector_path("store", &AccessPath::new().pushed(Segment::from_key("list")), "1"),
            "store.list.1"
        );
    }

    #[test]
    fn test_take_resets() {
        let mut path = AccessPath::new();
        path.push(Segment::from_key("a"));
        path.push(Segment::from_key("2"));

        let taken = path.take();
        assert_eq!(taken.len(), 2);
        assert_eq!(taken.to_string(), ".a[2]");
        assert!(path.is_empty());
        assert_eq!(path.to_string(), "");

        let mut path: AccessPath = ["x", "0"].into_iter().map(Segment::from_key).collect();
        assert_eq!(path.to_string(), ".x[0]");
        path.clear();
        assert!(path.is_empty());
    }

    #[test]
    fn test_parse_expression() {
        let parsed = parse_expression("store.listitems[1].text").unwrap();
        assert_eq!(parsed.root, "store");
        assert_eq!(parsed.keys, vec!["listitems", "1", "text"]);

        let parsed = parse_expression("  store[\"a b\"]['c']  ").unwrap();
        assert_eq!(parsed.keys, vec!["a b", "c"]);

        let parsed = parse_expression("store").unwrap();
        assert!(parsed.keys.is_empty());
    }

    #[test]
    fn test_parse_expression_errors() {
        for bad in [".title", "", "store..title", "store[", "store[]", "store[1]x", "store['a]"] {
            assert!(
                matches!(parse_expression(bad), Err(BindError::InvalidExpression { .. })),
                "expected '{}' to be rejected",
                bad
            );
        }
    }
}
