//! Document port
//!
//! The binder never touches a concrete document. Each write asks a
//! [`Document`] for the elements whose binding attribute equals the write's
//! selector path, then overwrites their text through [`TextSink`].
//!
//! [`MemoryDocument`] is the in-process implementation used by the CLI and
//! tests. The `web` feature adds a browser implementation in [`crate::web`].

use indexmap::IndexMap;
use slotmap::{new_key_type, SlotMap};
use thiserror::Error;

new_key_type! {
    /// Unique identifier for an element in a [`MemoryDocument`]
    pub struct ElementId;
}

/// A document query failed in the host
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("document query for '{selector}' failed: {reason}")]
pub struct DocumentError {
    pub selector: String,
    pub reason: String,
}

/// Something whose visible text can be replaced
pub trait TextSink {
    fn set_text(&mut self, text: &str);
}

impl<T: TextSink + ?Sized> TextSink for &mut T {
    fn set_text(&mut self, text: &str) {
        (**self).set_text(text)
    }
}

/// Elements matched by a single query
pub type BoundElements<'a> = Vec<Box<dyn TextSink + 'a>>;

/// Query side of a document
pub trait Document {
    /// All elements whose `attribute` value is exactly `selector_path`
    ///
    /// Called once per write. Implementations query the whole document each
    /// time rather than caching earlier results.
    fn find_bound_elements(
        &mut self,
        attribute: &str,
        selector_path: &str,
    ) -> Result<BoundElements<'_>, DocumentError>;
}

/// An element of a [`MemoryDocument`]
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Element {
    tag: String,
    attributes: IndexMap<String, String>,
    text: String,
}

impl Element {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            ..Default::default()
        }
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    pub fn attributes(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attributes.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

impl TextSink for Element {
    fn set_text(&mut self, text: &str) {
        self.text.clear();
        self.text.push_str(text);
    }
}

/// Flat in-memory document, kept in insertion order
#[derive(Clone, Debug, Default)]
pub struct MemoryDocument {
    elements: SlotMap<ElementId, Element>,
}

impl MemoryDocument {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, element: Element) -> ElementId {
        self.elements.insert(element)
    }

    pub fn element(&self, id: ElementId) -> Option<&Element> {
        self.elements.get(id)
    }

    /// Current text of an element
    pub fn text(&self, id: ElementId) -> Option<&str> {
        self.elements.get(id).map(Element::text)
    }

    /// Ids of every element whose `attribute` is exactly `value`
    pub fn find_by_attribute(&self, attribute: &str, value: &str) -> Vec<ElementId> {
        self.elements
            .iter()
            .filter(|(_, el)| el.attribute(attribute) == Some(value))
            .map(|(id, _)| id)
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ElementId, &Element)> {
        self.elements.iter()
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Render as markup, one element per line
    pub fn to_html(&self) -> String {
        let mut html = String::new();
        for (_, element) in self.elements.iter() {
            html.push('<');
            html.push_str(&element.tag);
            for (name, value) in element.attributes() {
                html.push(' ');
                html.push_str(name);
                html.push_str("=\"");
                html.push_str(&escape_html(value));
                html.push('"');
            }
            html.push('>');
            html.push_str(&escape_html(&element.text));
            html.push_str("</");
            html.push_str(&element.tag);
            html.push_str(">\n");
        }
        html
    }
}

impl FromIterator<Element> for MemoryDocument {
    fn from_iter<I: IntoIterator<Item = Element>>(iter: I) -> Self {
        let mut document = Self::new();
        for element in iter {
            document.insert(element);
        }
        document
    }
}

impl Document for MemoryDocument {
    fn find_bound_elements(
        &mut self,
        attribute: &str,
        selector_path: &str,
    ) -> Result<BoundElements<'_>, DocumentError> {
        Ok(self
            .elements
            .values_mut()
            .filter(|el| el.attribute(attribute) == Some(selector_path))
            .map(|el| Box::new(el) as Box<dyn TextSink + '_>)
            .collect())
    }
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            other => escaped.push(other),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    const ATTR: &str = "data-pe-text";

    fn sample() -> (MemoryDocument, ElementId, ElementId, ElementId) {
        let mut doc = MemoryDocument::new();
        let title = doc.insert(Element::new("h1").with_attribute(ATTR, "store.title").with_text("A"));
        let first = doc.insert(
            Element::new("li")
                .with_attribute(ATTR, "store.listitems[0].text")
                .with_text("B"),
        );
        let prefixed = doc.insert(
            Element::new("p")
                .with_attribute(ATTR, "store.title.sub")
                .with_text("S"),
        );
        (doc, title, first, prefixed)
    }

    #[test]
    fn test_exact_match_only() {
        let (doc, title, _, prefixed) = sample();

        assert_eq!(doc.find_by_attribute(ATTR, "store.title"), vec![title]);
        assert_eq!(doc.find_by_attribute(ATTR, "store.title.sub"), vec![prefixed]);
        assert!(doc.find_by_attribute(ATTR, "store").is_empty());
        assert!(doc.find_by_attribute("data-other", "store.title").is_empty());

        let element = doc.element(title).unwrap();
        assert_eq!(element.attribute(ATTR), Some("store.title"));
    }

    #[test]
    fn test_sinks_overwrite_text() {
        let (mut doc, title, first, prefixed) = sample();

        {
            let mut sinks = doc.find_bound_elements(ATTR, "store.title").unwrap();
            assert_eq!(sinks.len(), 1);
            for sink in sinks.iter_mut() {
                sink.set_text("Z");
            }
        }

        assert_eq!(doc.text(title), Some("Z"));
        assert_eq!(doc.text(first), Some("B"));
        assert_eq!(doc.text(prefixed), Some("S"));
    }

    #[test]
    fn test_no_match_is_empty() {
        let (mut doc, ..) = sample();
        let sinks = doc.find_bound_elements(ATTR, "store.missing").unwrap();
        assert!(sinks.is_empty());
    }

    #[test]
    fn test_to_html() {
        let doc: MemoryDocument = [Element::new("h1")
            .with_attribute(ATTR, "store.title")
            .with_text("a < b & \"c\"")]
        .into_iter()
        .collect();

        assert_eq!(
            doc.to_html(),
            "<h1 data-pe-text=\"store.title\">a &lt; b &amp; &quot;c&quot;</h1>\n"
        );
    }
}
