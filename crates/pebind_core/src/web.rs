//! Browser document adapter
//!
//! Enabled with the `web` feature. Each write runs a fresh
//! `querySelectorAll("[attribute='path']")` against the page and replaces
//! the `textContent` of every match.

use wasm_bindgen::JsCast;

use crate::document::{BoundElements, Document, DocumentError, TextSink};

/// The page's `document`, seen through the binder's document port
pub struct WebDocument {
    document: web_sys::Document,
}

impl WebDocument {
    pub fn new(document: web_sys::Document) -> Self {
        Self { document }
    }

    /// The current window's document, if there is one
    pub fn from_window() -> Option<Self> {
        web_sys::window()?.document().map(Self::new)
    }
}

struct ElementSink(web_sys::Element);

impl TextSink for ElementSink {
    fn set_text(&mut self, text: &str) {
        self.0.set_text_content(Some(text));
    }
}

impl Document for WebDocument {
    fn find_bound_elements(
        &mut self,
        attribute: &str,
        selector_path: &str,
    ) -> Result<BoundElements<'_>, DocumentError> {
        let query = attribute_query(attribute, selector_path);
        let nodes = self
            .document
            .query_selector_all(&query)
            .map_err(|err| DocumentError {
                selector: selector_path.to_string(),
                reason: format!("{:?}", err),
            })?;

        Ok((0..nodes.length())
            .filter_map(|i| nodes.item(i))
            .filter_map(|node| node.dyn_into::<web_sys::Element>().ok())
            .map(|element| Box::new(ElementSink(element)) as Box<dyn TextSink + '_>)
            .collect())
    }
}

/// `[attribute='value']` with the value quoted for CSS
fn attribute_query(attribute: &str, value: &str) -> String {
    let mut quoted = String::with_capacity(value.len());
    for c in value.chars() {
        if c == '\\' || c == '\'' {
            quoted.push('\\');
        }
        quoted.push(c);
    }
    format!("[{}='{}']", attribute, quoted)
}
