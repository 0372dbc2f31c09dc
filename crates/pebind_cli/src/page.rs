//! Page files
//!
//! A page lists the elements to bind, in document order:
//!
//! ```toml
//! [[element]]
//! tag = "h1"
//! bind = "store.title"
//! text = "Hello"
//! ```

use anyhow::{Context, Result};
use pebind_core::{Element, MemoryDocument};
use serde::Deserialize;
use std::fs;
use std::path::Path;

#[derive(Debug, Deserialize)]
struct PageFile {
    #[serde(default, rename = "element")]
    elements: Vec<ElementEntry>,
}

#[derive(Debug, Deserialize)]
struct ElementEntry {
    #[serde(default = "default_tag")]
    tag: String,
    /// Selector path; elements without one are rendered but never updated
    #[serde(default)]
    bind: Option<String>,
    #[serde(default)]
    text: String,
}

fn default_tag() -> String {
    "span".to_string()
}

/// Load a page file, putting each `bind` value under `attribute`
pub fn load(path: &Path, attribute: &str) -> Result<MemoryDocument> {
    let content =
        fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    parse(&content, attribute).with_context(|| format!("Failed to parse {}", path.display()))
}

pub fn parse(content: &str, attribute: &str) -> Result<MemoryDocument> {
    let page: PageFile = toml::from_str(content).context("Invalid page file")?;
    Ok(page
        .elements
        .into_iter()
        .map(|entry| {
            let element = Element::new(entry.tag).with_text(entry.text);
            match entry.bind {
                Some(bind) => element.with_attribute(attribute, bind),
                None => element,
            }
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_page() {
        let doc = parse(
            r#"
            [[element]]
            tag = "h1"
            bind = "store.title"
            text = "A"

            [[element]]
            text = "static"
            "#,
            "data-pe-text",
        )
        .unwrap();

        assert_eq!(doc.len(), 2);
        assert_eq!(
            doc.to_html(),
            "<h1 data-pe-text=\"store.title\">A</h1>\n<span>static</span>\n"
        );
    }

    #[test]
    fn test_empty_page() {
        assert!(parse("", "data-pe-text").unwrap().is_empty());
    }
}
