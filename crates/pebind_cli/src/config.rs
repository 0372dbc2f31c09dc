//! pebind configuration file handling
//!
//! `pebind.toml` supplies defaults for the binder and the store:
//!
//! ```toml
//! [binder]
//! attribute = "data-pe-text"
//! tracking = "chain-local"
//!
//! [store]
//! name = "store"
//! path = "store.json"
//! ```

use anyhow::{Context, Result};
use pebind_core::BinderConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Config file looked up in the working directory
pub const CONFIG_FILE: &str = "pebind.toml";

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct PebindConfig {
    #[serde(default)]
    pub binder: BinderConfig,
    #[serde(default)]
    pub store: StoreConfig,
}

/// Where the store comes from and what it is called
#[derive(Debug, Deserialize, Serialize)]
pub struct StoreConfig {
    #[serde(default = "default_name")]
    pub name: String,
    #[serde(default)]
    pub path: Option<PathBuf>,
}

fn default_name() -> String {
    "store".to_string()
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            path: None,
        }
    }
}

impl PebindConfig {
    /// Load a config file
    ///
    /// A relative `[store] path` is taken relative to the file's directory.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let mut config = Self::from_toml(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        if let Some(dir) = path.parent() {
            config.resolve_paths(dir);
        }
        Ok(config)
    }

    fn resolve_paths(&mut self, base: &Path) {
        if let Some(store) = self.store.path.as_mut() {
            if store.is_relative() {
                *store = base.join(&*store);
            }
        }
    }

    /// Load `explicit` if given, else `pebind.toml` if present, else defaults
    pub fn discover(explicit: Option<&Path>) -> Result<Self> {
        match explicit {
            Some(path) => Self::load(path),
            None => {
                let default_path = Path::new(CONFIG_FILE);
                if default_path.exists() {
                    Self::load(default_path)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).context("Invalid pebind config")
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize config")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pebind_core::PathTracking;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = PebindConfig::from_toml("").unwrap();
        assert_eq!(config.binder, BinderConfig::default());
        assert_eq!(config.store.name, "store");
        assert!(config.store.path.is_none());
    }

    #[test]
    fn test_full_config() {
        let config = PebindConfig::from_toml(
            r#"
            [binder]
            attribute = "data-bind"
            tracking = "shared"

            [store]
            name = "app"
            path = "data/app.json"
            "#,
        )
        .unwrap();

        assert_eq!(config.binder.attribute, "data-bind");
        assert_eq!(config.binder.tracking, PathTracking::Shared);
        assert_eq!(config.store.name, "app");
        assert_eq!(config.store.path, Some(PathBuf::from("data/app.json")));
    }

    #[test]
    fn test_round_trip() {
        let config = PebindConfig::default();
        let parsed = PebindConfig::from_toml(&config.to_toml().unwrap()).unwrap();
        assert_eq!(parsed.binder, config.binder);
    }

    #[test]
    fn test_store_path_is_relative_to_config() {
        let demos = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../demos");
        let config = PebindConfig::load(&demos.join("pebind.toml")).unwrap();
        assert_eq!(config.store.path, Some(demos.join("store.json")));

        let mut config = PebindConfig::from_toml("[store]\npath = \"/srv/store.json\"").unwrap();
        config.resolve_paths(Path::new("conf"));
        assert_eq!(config.store.path, Some(PathBuf::from("/srv/store.json")));

        let mut config = PebindConfig::from_toml("[store]\npath = \"data/app.json\"").unwrap();
        config.resolve_paths(Path::new("conf"));
        assert_eq!(config.store.path, Some(PathBuf::from("conf/data/app.json")));
    }

    #[test]
    fn test_unknown_tracking_is_rejected() {
        assert!(PebindConfig::from_toml("[binder]\ntracking = \"global\"").is_err());
    }
}
