//! Database configuration.

use idbkv_core::{Schema, DEFAULT_VERSION};
use serde::{Deserialize, Serialize};

use crate::error::Result;

fn default_version() -> u32 {
    DEFAULT_VERSION
}

/// Name, store list and version of a database.
///
/// Serializable so it can live in an application's own config file:
///
/// ```json
/// { "name": "animals", "stores": ["horses", "insects"], "version": 2 }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Database name.
    pub name: String,
    /// Store names. Duplicates are ignored.
    #[serde(default)]
    pub stores: Vec<String>,
    /// Schema version. Raising it with a changed store list triggers an upgrade.
    #[serde(default = "default_version")]
    pub version: u32,
}

impl DatabaseConfig {
    /// A version 1 config.
    pub fn new<I, S>(name: impl Into<String>, stores: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            stores: stores.into_iter().map(Into::into).collect(),
            version: DEFAULT_VERSION,
        }
    }

    /// Add a store.
    pub fn with_store(mut self, store: impl Into<String>) -> Self {
        self.stores.push(store.into());
        self
    }

    /// Set the version.
    pub fn with_version(mut self, version: u32) -> Self {
        self.version = version;
        self
    }

    /// Validate into a [`Schema`]. Fails on version 0.
    pub fn to_schema(&self) -> Result<Schema> {
        Ok(Schema::new(
            self.name.clone(),
            self.stores.iter().cloned(),
            self.version,
        )?)
    }
}
