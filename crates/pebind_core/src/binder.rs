//! Reactive binder
//!
//! Binding a store under a symbolic name yields a [`BoundHandle`] whose
//! `data` field is the root [`ObservedView`]. Reads through a view step into
//! nested objects and arrays, recording one path segment each; a write
//! through a view assigns into the store, rebuilds the selector path
//! (`name` + recorded segments + `.prop`) and overwrites the text of every
//! document element bound to exactly that path.
//!
//! # Path tracking
//!
//! With [`PathTracking::ChainLocal`] (the default) each view carries the
//! path that produced it, so independent chains can be interleaved freely.
//!
//! With [`PathTracking::Shared`] the binder keeps a single buffer, modelled
//! as [`PathState`]: nested reads move it to `Accumulating` and every write
//! flushes it back to `Idle`, whether or not the write succeeded. A read
//! chain that is abandoned, or interleaved with another chain, leaves
//! segments behind that end up in the next write's selector path.
//!
//! # Example
//!
//! ```rust
//! use pebind_core::{shared, BoundHandle, Element, MemoryDocument};
//! use serde_json::json;
//!
//! let mut document = MemoryDocument::new();
//! let title = document.insert(
//!     Element::new("h1")
//!         .with_attribute("data-pe-text", "store.title")
//!         .with_text("A"),
//! );
//!
//! let store = shared(json!({"title": "A", "listitems": [{"text": "B"}]}));
//! let handle = BoundHandle::create(store.clone(), "store", document).unwrap();
//!
//! let outcome = handle.data.set("title", "Z").unwrap();
//! assert_eq!(outcome.selector_path, "store.title");
//! assert_eq!(handle.document().text(title), Some("Z"));
//! assert_eq!(store.borrow()["title"], "Z");
//! ```

use serde_json::Value;
use std::cell::{Cell, Ref, RefCell};
use std::fmt;
use std::rc::Rc;

use crate::config::{BinderConfig, PathTracking};
use crate::document::Document;
use crate::error::{BindError, Result};
use crate::path::{parse_expression, selector_path, AccessPath, PathExpression, Segment};
use crate::store::{self, Lookup, SharedStore};
use crate::text::display_text;

/// State of the shared path buffer
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum PathState {
    /// No nested read since the last write
    #[default]
    Idle,
    /// Segments recorded by nested reads, waiting for a write
    Accumulating(AccessPath),
}

impl PathState {
    fn record(&mut self, segment: Segment) {
        match self {
            PathState::Idle => *self = PathState::Accumulating(AccessPath::new().pushed(segment)),
            PathState::Accumulating(path) => path.push(segment),
        }
    }

    /// Return the pending path and go back to `Idle`
    fn flush(&mut self) -> AccessPath {
        match std::mem::take(self) {
            PathState::Idle => AccessPath::new(),
            PathState::Accumulating(path) => path,
        }
    }

    pub fn is_idle(&self) -> bool {
        matches!(self, PathState::Idle)
    }

    /// Segments waiting for the next write, if any
    pub fn pending(&self) -> Option<&AccessPath> {
        match self {
            PathState::Idle => None,
            PathState::Accumulating(path) => Some(path),
        }
    }
}

/// Counters over the lifetime of a binding
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BinderStats {
    pub writes: u64,
    pub matched_writes: u64,
    pub unmatched_writes: u64,
    pub elements_updated: u64,
}

/// What a single write did
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WriteOutcome {
    /// Selector path the write was propagated to
    pub selector_path: String,
    /// Number of elements whose text was overwritten
    pub updated: usize,
}

struct BinderCore<D> {
    name: String,
    store: SharedStore,
    document: RefCell<D>,
    config: BinderConfig,
    state: RefCell<PathState>,
    stats: Cell<BinderStats>,
}

impl<D: Document> BinderCore<D> {
    fn record(&self, segment: Segment) {
        tracing::trace!(name = %self.name, segment = %segment, "recorded path segment");
        self.state.borrow_mut().record(segment);
    }

    fn flush(&self) -> AccessPath {
        self.state.borrow_mut().flush()
    }

    /// Overwrite the text of every element bound to `selector`
    fn dispatch(&self, selector: &str, value: &Value) -> Result<usize> {
        let text = display_text(value);
        let mut document = self
            .document
            .try_borrow_mut()
            .map_err(|_| BindError::DocumentBusy)?;
        let mut sinks = document.find_bound_elements(&self.config.attribute, selector)?;
        for sink in sinks.iter_mut() {
            sink.set_text(&text);
        }
        Ok(sinks.len())
    }

    fn note_write(&self, updated: usize) {
        let mut stats = self.stats.get();
        stats.writes += 1;
        if updated > 0 {
            stats.matched_writes += 1;
            stats.elements_updated += updated as u64;
        } else {
            stats.unmatched_writes += 1;
        }
        self.stats.set(stats);
    }

    /// Human-readable name for a location, used in errors
    fn describe(&self, location: &[String]) -> String {
        let path: AccessPath = location.iter().map(|key| Segment::from_key(key)).collect();
        format!("{}{}", self.name, path)
    }
}

/// Observed view of an object or array inside the store
///
/// Views are cheap to clone and share their binder. A view addresses its
/// target by position, so replacing an ancestor detaches it: reads through a
/// detached view see nothing and writes fail with [`BindError::Detached`].
pub struct ObservedView<D: Document> {
    core: Rc<BinderCore<D>>,
    location: Vec<String>,
    chain: AccessPath,
}

impl<D: Document> Clone for ObservedView<D> {
    fn clone(&self) -> Self {
        Self {
            core: Rc::clone(&self.core),
            location: self.location.clone(),
            chain: self.chain.clone(),
        }
    }
}

impl<D: Document> fmt::Debug for ObservedView<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObservedView")
            .field("name", &self.core.name)
            .field("location", &self.location)
            .field("chain", &self.chain.to_string())
            .finish()
    }
}

impl<D: Document> ObservedView<D> {
    /// Read `key` from this view's target
    ///
    /// Objects and arrays come back as child views after recording a path
    /// segment. Scalars and null come back as leaves; a missing key comes
    /// back as `Leaf(None)`. Neither records anything.
    pub fn get(&self, key: &str) -> Read<D> {
        let lookup = match self.core.store.try_borrow() {
            Ok(root) => store::resolve(&root, &self.location).map(|target| store::read_key(target, key)),
            Err(_) => {
                tracing::warn!(name = %self.core.name, key, "store borrowed elsewhere during read");
                None
            }
        };

        match lookup {
            Some(Lookup::Composite) => {
                let segment = Segment::from_key(key);
                let chain = match self.core.config.tracking {
                    PathTracking::ChainLocal => self.chain.pushed(segment),
                    PathTracking::Shared => {
                        self.core.record(segment);
                        AccessPath::new()
                    }
                };
                let mut location = self.location.clone();
                location.push(key.to_string());
                Read::View(ObservedView {
                    core: Rc::clone(&self.core),
                    location,
                    chain,
                })
            }
            Some(Lookup::Leaf(value)) => Read::Leaf(value),
            None => Read::Leaf(None),
        }
    }

    /// Assign `value` to `prop` and propagate it to bound elements
    ///
    /// The pending shared path is reset before anything else, so a failed
    /// write still leaves the buffer `Idle`. A write issued while the
    /// document is being updated fails with [`BindError::DocumentBusy`]
    /// before the store is touched.
    pub fn set(&self, prop: &str, value: impl Into<Value>) -> Result<WriteOutcome> {
        let value = value.into();
        let flushed = self.core.flush();
        let path = match self.core.config.tracking {
            PathTracking::ChainLocal => self.chain.clone(),
            PathTracking::Shared => flushed,
        };
        let selector = selector_path(&self.core.name, &path, prop);

        if self.core.document.try_borrow_mut().is_err() {
            return Err(BindError::DocumentBusy);
        }

        {
            let mut root = self
                .core
                .store
                .try_borrow_mut()
                .map_err(|_| BindError::StoreBusy)?;
            let target = store::resolve_composite_mut(&mut root, &self.location)
                .ok_or_else(|| BindError::Detached(self.core.describe(&self.location)))?;
            store::assign(target, &self.core.describe(&self.location), prop, value.clone())?;
        }

        let updated = self.core.dispatch(&selector, &value)?;
        self.core.note_write(updated);
        tracing::debug!(selector = %selector, updated, "propagated write");

        Ok(WriteOutcome {
            selector_path: selector,
            updated,
        })
    }

    /// Snapshot of the target without recording anything
    pub fn value(&self) -> Option<Value> {
        let root = self.core.store.try_borrow().ok()?;
        store::resolve(&root, &self.location).cloned()
    }

    /// Whether the target is still an object or array in the store
    pub fn is_attached(&self) -> bool {
        self.core
            .store
            .try_borrow()
            .map(|root| store::resolve(&root, &self.location).map_or(false, store::is_composite))
            .unwrap_or(false)
    }

    /// Raw keys from the root to this view's target
    pub fn location(&self) -> &[String] {
        &self.location
    }

    /// Path carried by this view (always empty under shared tracking)
    pub fn chain(&self) -> &AccessPath {
        &self.chain
    }
}

/// Result of reading through an [`ObservedView`]
pub enum Read<D: Document> {
    /// The key holds an object or array
    View(ObservedView<D>),
    /// The key holds a scalar or null; `None` when the key is absent
    Leaf(Option<Value>),
}

impl<D: Document> Read<D> {
    pub fn into_view(self) -> Option<ObservedView<D>> {
        match self {
            Read::View(view) => Some(view),
            Read::Leaf(_) => None,
        }
    }

    /// The leaf value, if this read produced one
    pub fn leaf(&self) -> Option<&Value> {
        match self {
            Read::View(_) => None,
            Read::Leaf(value) => value.as_ref(),
        }
    }

    pub fn is_view(&self) -> bool {
        matches!(self, Read::View(_))
    }

    /// Owned value of either variant
    pub fn into_value(self) -> Option<Value> {
        match self {
            Read::View(view) => view.value(),
            Read::Leaf(value) => value,
        }
    }
}

impl<D: Document> fmt::Debug for Read<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Read::View(view) => f.debug_tuple("View").field(view).finish(),
            Read::Leaf(value) => f.debug_tuple("Leaf").field(value).finish(),
        }
    }
}

/// A store bound to a document under a symbolic name
pub struct BoundHandle<D: Document> {
    /// Root view; reads and writes must go through it to be observed
    pub data: ObservedView<D>,
}

impl<D: Document> BoundHandle<D> {
    /// Bind `data` as `name` with the default configuration
    pub fn create(data: SharedStore, name: &str, document: D) -> Result<Self> {
        Self::builder().data(data).name(name).document(document).build()
    }

    pub fn builder() -> BinderBuilder<D> {
        BinderBuilder::default()
    }

    pub fn name(&self) -> &str {
        &self.data.core.name
    }

    /// Another handle to the caller's store
    pub fn store(&self) -> SharedStore {
        Rc::clone(&self.data.core.store)
    }

    pub fn config(&self) -> &BinderConfig {
        &self.data.core.config
    }

    /// Borrow the document for inspection
    pub fn document(&self) -> Ref<'_, D> {
        self.data.core.document.borrow()
    }

    /// Current state of the shared path buffer
    pub fn path_state(&self) -> PathState {
        self.data.core.state.borrow().clone()
    }

    pub fn stats(&self) -> BinderStats {
        self.data.core.stats.get()
    }

    /// Evaluate a read expression such as `store.listitems[0]`
    ///
    /// Each step goes through [`ObservedView::get`], so under shared
    /// tracking the segments it records stay pending until the next write.
    pub fn read(&self, expr: &str) -> Result<Read<D>> {
        let parsed = self.parse_rooted(expr)?;
        let mut current = Read::View(self.data.clone());
        for (depth, key) in parsed.keys.iter().enumerate() {
            current = match current {
                Read::View(view) => view.get(key),
                Read::Leaf(_) => return Err(self.not_an_object(&parsed.keys[..depth], key)),
            };
        }
        Ok(current)
    }

    /// Evaluate an assignment such as `store.listitems[1].text = value`
    pub fn assign(&self, expr: &str, value: impl Into<Value>) -> Result<WriteOutcome> {
        let parsed = self.parse_rooted(expr)?;
        let Some((prop, parents)) = parsed.keys.split_last() else {
            return Err(BindError::InvalidExpression {
                expr: expr.to_string(),
                reason: "nothing to assign to".to_string(),
            });
        };

        let mut view = self.data.clone();
        for (depth, key) in parents.iter().enumerate() {
            view = view
                .get(key)
                .into_view()
                .ok_or_else(|| self.not_an_object(&parents[..depth], key))?;
        }
        view.set(prop, value)
    }

    fn parse_rooted(&self, expr: &str) -> Result<PathExpression> {
        let parsed = parse_expression(expr)?;
        if parsed.root != self.name() {
            return Err(BindError::ForeignRoot {
                expr: expr.to_string(),
                name: self.name().to_string(),
            });
        }
        Ok(parsed)
    }

    fn not_an_object(&self, location: &[String], key: &str) -> BindError {
        BindError::NotAnObject {
            path: self.data.core.describe(location),
            prop: key.to_string(),
        }
    }
}

impl<D: Document> fmt::Debug for BoundHandle<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoundHandle")
            .field("name", &self.name())
            .field("config", self.config())
            .field("stats", &self.stats())
            .finish()
    }
}

/// Builder for [`BoundHandle`]
///
/// `data`, `name` and `document` are required; `build` fails before any
/// wrapping happens if one is missing.
pub struct BinderBuilder<D> {
    data: Option<SharedStore>,
    name: Option<String>,
    document: Option<D>,
    config: BinderConfig,
}

impl<D> Default for BinderBuilder<D> {
    fn default() -> Self {
        Self {
            data: None,
            name: None,
            document: None,
            config: BinderConfig::default(),
        }
    }
}

impl<D: Document> BinderBuilder<D> {
    pub fn data(mut self, data: SharedStore) -> Self {
        self.data = Some(data);
        self
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn document(mut self, document: D) -> Self {
        self.document = Some(document);
        self
    }

    pub fn config(mut self, config: BinderConfig) -> Self {
        self.config = config;
        self
    }

    pub fn tracking(mut self, tracking: PathTracking) -> Self {
        self.config.tracking = tracking;
        self
    }

    pub fn attribute(mut self, attribute: impl Into<String>) -> Self {
        self.config.attribute = attribute.into();
        self
    }

    pub fn build(self) -> Result<BoundHandle<D>> {
        let data = self.data.ok_or(BindError::MissingArgument("data"))?;
        let name = self
            .name
            .filter(|name| !name.is_empty())
            .ok_or(BindError::MissingArgument("name"))?;
        let document = self.document.ok_or(BindError::MissingArgument("document"))?;

        let composite = store::is_composite(&*data.try_borrow().map_err(|_| BindError::StoreBusy)?);
        if !composite {
            return Err(BindError::RootNotComposite);
        }

        tracing::debug!(
            name = %name,
            attribute = %self.config.attribute,
            tracking = ?self.config.tracking,
            "bound store"
        );

        let core = Rc::new(BinderCore {
            name,
            store: data,
            document: RefCell::new(document),
            config: self.config,
            state: RefCell::new(PathState::Idle),
            stats: Cell::new(BinderStats::default()),
        });

        Ok(BoundHandle {
            data: ObservedView {
                core,
                location: Vec::new(),
                chain: AccessPath::new(),
            },
        })
    }
}
