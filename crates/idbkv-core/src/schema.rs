//! Database schemas and upgrade planning.
//!
//! A schema names the database, the stores it should contain and the version
//! it should be opened at. When the stored version is lower than the schema
//! version the engine runs an upgrade: stores that are no longer wanted are
//! deleted and missing ones are created. Data in stores common to both
//! versions is left alone.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

/// Version used when none is given.
pub const DEFAULT_VERSION: u32 = 1;

/// Desired shape of a database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schema {
    pub name: String,
    pub stores: BTreeSet<String>,
    pub version: u32,
}

impl Schema {
    /// Create a schema. Version `0` is rejected.
    pub fn new<I, S>(name: impl Into<String>, stores: I, version: u32) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        if version == 0 {
            return Err(CoreError::InvalidVersion(version));
        }
        Ok(Self {
            name: name.into(),
            stores: stores.into_iter().map(Into::into).collect(),
            version,
        })
    }

    pub fn has_store(&self, store: &str) -> bool {
        self.stores.contains(store)
    }

    /// Compute the steps that turn `existing` into the desired store set.
    pub fn plan_upgrade<'a, I>(&self, existing: I) -> UpgradePlan
    where
        I: IntoIterator<Item = &'a str>,
    {
        let existing: BTreeSet<&str> = existing.into_iter().collect();

        let delete = existing
            .iter()
            .filter(|name| !self.stores.contains(**name))
            .map(|name| name.to_string())
            .collect();

        let create = self
            .stores
            .iter()
            .filter(|name| !existing.contains(name.as_str()))
            .cloned()
            .collect();

        UpgradePlan { create, delete }
    }
}

/// Store changes applied during an upgrade.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpgradePlan {
    /// Stores to create, in name order.
    pub create: Vec<String>,
    /// Stores to delete, in name order.
    pub delete: Vec<String>,
}

impl UpgradePlan {
    pub fn is_empty(&self) -> bool {
        self.create.is_empty() && self.delete.is_empty()
    }
}
