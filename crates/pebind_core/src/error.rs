//! Error types for pebind_core

use thiserror::Error;

use crate::document::DocumentError;

/// Errors that can occur while binding a store or propagating a write
#[derive(Error, Debug)]
pub enum BindError {
    /// A required construction argument was not supplied
    #[error("missing required argument: {0}")]
    MissingArgument(&'static str),

    /// The root store must be an object or an array
    #[error("root store must be an object or an array")]
    RootNotComposite,

    /// A property write or nested read went through a scalar value
    #[error("cannot access '{prop}' on non-object value at '{path}'")]
    NotAnObject { path: String, prop: String },

    /// Arrays only accept canonical indices and `length`
    #[error("'{0}' is not a valid array index")]
    InvalidArrayIndex(String),

    /// Writing past the end of an array would leave holes
    #[error("index {index} is past the end of an array of length {len}")]
    SparseIndex { index: usize, len: usize },

    /// `length` must be assigned a non-negative integer
    #[error("invalid array length: {0}")]
    InvalidArrayLength(String),

    /// The view's location no longer exists in the store
    #[error("target '{0}' no longer exists in the store")]
    Detached(String),

    /// The store is already borrowed by the caller
    #[error("store is borrowed elsewhere")]
    StoreBusy,

    /// A text sink tried to write back into the binder mid-update
    #[error("document is busy with another update")]
    DocumentBusy,

    /// Malformed path expression
    #[error("invalid path expression '{expr}': {reason}")]
    InvalidExpression { expr: String, reason: String },

    /// Path expression rooted at a different symbolic name
    #[error("path expression '{expr}' is not rooted at '{name}'")]
    ForeignRoot { expr: String, name: String },

    /// Document query failed in the host
    #[error(transparent)]
    Document(#[from] DocumentError),
}

/// Result type for pebind_core operations
pub type Result<T> = std::result::Result<T, BindError>;
