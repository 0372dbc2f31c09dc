//! pebind core
//!
//! Reactive data binding from a JSON store to document text:
//!
//! - **Observed views**: reads through a bound store record the access path
//!   into nested objects and arrays
//! - **Write propagation**: every write rebuilds its selector path and
//!   overwrites the text of each element bound to exactly that path
//! - **Document port**: the binder talks to documents through [`Document`]
//!   and [`TextSink`], with an in-memory implementation and an optional
//!   browser one (`web` feature)
//!
//! # Example
//!
//! ```rust
//! use pebind_core::{scaffold, shared, BoundHandle};
//! use serde_json::json;
//!
//! let data = json!({
//!     "title": "A",
//!     "listitems": [{"text": "B"}, {"text": "C"}]
//! });
//! let document = scaffold::scaffold("store", &data, "data-pe-text");
//! let handle = BoundHandle::create(shared(data), "store", document).unwrap();
//!
//! let item = handle.data.get("listitems").into_view().unwrap();
//! let outcome = item.get("1").into_view().unwrap().set("text", "Y").unwrap();
//!
//! assert_eq!(outcome.selector_path, "store.listitems[1].text");
//! assert_eq!(outcome.updated, 1);
//! ```

pub mod binder;
pub mod config;
pub mod document;
pub mod error;
pub mod path;
pub mod scaffold;
pub mod store;
pub mod text;
#[cfg(feature = "web")]
pub mod web;

pub use binder::{BinderBuilder, BinderStats, BoundHandle, ObservedView, PathState, Read, WriteOutcome};
pub use config::{BinderConfig, PathTracking, DEFAULT_ATTRIBUTE};
pub use document::{BoundElements, Document, DocumentError, Element, ElementId, MemoryDocument, TextSink};
pub use error::{BindError, Result};
pub use path::{parse_expression, selector_path, AccessPath, PathExpression, Segment};
pub use store::{shared, SharedStore};
pub use text::display_text;

#[cfg(feature = "web")]
pub use web::WebDocument;
