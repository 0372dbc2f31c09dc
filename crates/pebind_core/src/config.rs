//! Binder configuration

use serde::{Deserialize, Serialize};

/// Attribute the demo pages use to declare bindings
pub const DEFAULT_ATTRIBUTE: &str = "data-pe-text";

/// How a chain of reads records its access path
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PathTracking {
    /// Every view carries the path that led to it; chains never interfere
    #[default]
    ChainLocal,
    /// One buffer per binder, appended by every nested read and flushed by
    /// every write. Interleaved chains corrupt each other's pending path.
    Shared,
}

/// Settings applied when a store is bound
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct BinderConfig {
    /// Element attribute holding the selector path
    pub attribute: String,
    pub tracking: PathTracking,
}

impl Default for BinderConfig {
    fn default() -> Self {
        Self {
            attribute: DEFAULT_ATTRIBUTE.to_string(),
            tracking: PathTracking::default(),
        }
    }
}

impl BinderConfig {
    pub fn with_attribute(mut self, attribute: impl Into<String>) -> Self {
        self.attribute = attribute.into();
        self
    }

    pub fn with_tracking(mut self, tracking: PathTracking) -> Self {
        self.tracking = tracking;
        self
    }
}
