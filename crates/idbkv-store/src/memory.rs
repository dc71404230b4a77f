//! In-process implementation of the engine traits.
//!
//! This emulates the host object-store contract without a browser: named,
//! versioned databases that outlive connections, upgrades on version
//! increase, blocked upgrades and deletions while other connections are
//! open, and single-transaction updates. It is used off-browser and in tests.
//! Nothing is persisted beyond the lifetime of the factory.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use tracing::{debug, trace};

use idbkv_core::{shallow_merge, Key, KeyQuery, Schema, Value};

use crate::error::{Result, StoreError};
use crate::traits::{Connection, Factory};
use crate::upgrade::{apply_upgrade, UpgradeTarget};

/// In-process engine.
///
/// Clones share the same set of databases, so two handles opened from
/// clones of one factory see each other's data.
#[derive(Clone, Default)]
pub struct MemoryFactory {
    registry: Arc<RwLock<Registry>>,
}

#[derive(Default)]
struct Registry {
    /// Databases indexed by name.
    databases: HashMap<String, MemoryDatabase>,

    /// Next connection identifier.
    next_connection: u64,
}

struct MemoryDatabase {
    version: u32,
    stores: BTreeMap<String, BTreeMap<Key, Value>>,
    /// Identifiers of connections that have not been closed.
    open: BTreeSet<u64>,
}

impl MemoryDatabase {
    fn new() -> Self {
        Self {
            version: 0,
            stores: BTreeMap::new(),
            open: BTreeSet::new(),
        }
    }
}

impl UpgradeTarget for MemoryDatabase {
    fn existing_stores(&self) -> Vec<String> {
        self.stores.keys().cloned().collect()
    }

    fn create_store(&mut self, name: &str) -> Result<()> {
        if self.stores.contains_key(name) {
            return Err(StoreError::Host {
                name: "ConstraintError".into(),
                message: format!("object store {name} already exists"),
            });
        }
        self.stores.insert(name.to_string(), BTreeMap::new());
        Ok(())
    }

    fn delete_store(&mut self, name: &str) -> Result<()> {
        self.stores
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound {
                store: name.to_string(),
            })
    }
}

impl MemoryFactory {
    /// Create a factory with no databases.
    pub fn new() -> Self {
        Self::default()
    }

    /// Names of the databases that currently exist.
    pub fn database_names(&self) -> Vec<String> {
        let registry = self.registry.read().unwrap();
        let mut names: Vec<String> = registry.databases.keys().cloned().collect();
        names.sort();
        names
    }

    /// Stored version of a database, if it exists.
    pub fn version_of(&self, name: &str) -> Option<u32> {
        let registry = self.registry.read().unwrap();
        registry.databases.get(name).map(|db| db.version)
    }

    /// Number of open connections to a database.
    pub fn open_connections(&self, name: &str) -> usize {
        let registry = self.registry.read().unwrap();
        registry
            .databases
            .get(name)
            .map(|db| db.open.len())
            .unwrap_or(0)
    }
}

#[async_trait(?Send)]
impl Factory for MemoryFactory {
    type Connection = MemoryConnection;

    async fn open(&self, schema: &Schema) -> Result<MemoryConnection> {
        let mut registry = self.registry.write().unwrap();

        let id = registry.next_connection;
        registry.next_connection += 1;

        let created = !registry.databases.contains_key(&schema.name);
        let db = registry
            .databases
            .entry(schema.name.clone())
            .or_insert_with(MemoryDatabase::new);

        if schema.version < db.version {
            return Err(StoreError::VersionError {
                requested: schema.version,
                current: db.version,
            });
        }

        if schema.version > db.version {
            if !db.open.is_empty() {
                return Err(StoreError::Blocked {
                    name: schema.name.clone(),
                });
            }

            let old_version = db.version;
            if let Err(e) = apply_upgrade(schema, old_version, db) {
                // A database whose first upgrade fails is not kept.
                if created {
                    registry.databases.remove(&schema.name);
                }
                return Err(e);
            }
            db.version = schema.version;
        }

        db.open.insert(id);
        let store_names = db.stores.keys().cloned().collect();
        let version = db.version;

        debug!(database = %schema.name, version, connection = id, "opened database");

        Ok(MemoryConnection {
            id,
            name: schema.name.clone(),
            version,
            store_names,
            registry: Arc::clone(&self.registry),
            closed: AtomicBool::new(false),
        })
    }

    async fn delete_database(&self, name: &str) -> Result<()> {
        let mut registry = self.registry.write().unwrap();

        if let Some(db) = registry.databases.get(name) {
            if !db.open.is_empty() {
                return Err(StoreError::Blocked {
                    name: name.to_string(),
                });
            }
        }

        registry.databases.remove(name);
        debug!(database = %name, "deleted database");
        Ok(())
    }
}

/// A connection to a database held by a [`MemoryFactory`].
///
/// Closed automatically when dropped.
pub struct MemoryConnection {
    id: u64,
    name: String,
    version: u32,
    store_names: Vec<String>,
    registry: Arc<RwLock<Registry>>,
    closed: AtomicBool,
}

impl MemoryConnection {
    /// Run `f` against a store's records under the registry lock.
    fn with_store<T>(
        &self,
        store: &str,
        f: impl FnOnce(&mut BTreeMap<Key, Value>) -> T,
    ) -> Result<T> {
        if self.closed.load(Ordering::Acquire) {
            return Err(StoreError::InvalidState(
                "the database connection is closing".into(),
            ));
        }
        if !self.store_names.iter().any(|name| name == store) {
            return Err(StoreError::NotFound {
                store: store.to_string(),
            });
        }

        let mut registry = self.registry.write().unwrap();
        let records = registry
            .databases
            .get_mut(&self.name)
            .and_then(|db| db.stores.get_mut(store))
            .ok_or_else(|| StoreError::NotFound {
                store: store.to_string(),
            })?;

        Ok(f(records))
    }
}

#[async_trait(?Send)]
impl Connection for MemoryConnection {
    fn name(&self) -> &str {
        &self.name
    }

    fn version(&self) -> u32 {
        self.version
    }

    fn store_names(&self) -> Vec<String> {
        self.store_names.clone()
    }

    async fn put(&self, store: &str, key: &Key, value: &Value) -> Result<Key> {
        trace!(database = %self.name, store, %key, "put");
        self.with_store(store, |records| {
            records.insert(key.clone(), value.clone());
            key.clone()
        })
    }

    async fn get(&self, store: &str, key: &Key) -> Result<Option<Value>> {
        trace!(database = %self.name, store, %key, "get");
        self.with_store(store, |records| records.get(key).cloned())
    }

    async fn get_all(&self, store: &str) -> Result<Vec<Value>> {
        self.with_store(store, |records| records.values().cloned().collect())
    }

    async fn get_all_keys(&self, store: &str) -> Result<Vec<Key>> {
        self.with_store(store, |records| records.keys().cloned().collect())
    }

    async fn update(&self, store: &str, key: &Key, patch: &Value) -> Result<Value> {
        trace!(database = %self.name, store, %key, "update");
        // Read and write under one lock: the in-process transaction.
        self.with_store(store, |records| {
            let merged = shallow_merge(records.get(key).cloned(), patch.clone());
            records.insert(key.clone(), merged.clone());
            merged
        })
    }

    async fn delete(&self, store: &str, key: &Key) -> Result<()> {
        trace!(database = %self.name, store, %key, "delete");
        self.with_store(store, |records| {
            records.remove(key);
        })
    }

    async fn clear(&self, store: &str) -> Result<()> {
        self.with_store(store, |records| records.clear())
    }

    async fn count(&self, store: &str, query: &KeyQuery) -> Result<u64> {
        self.with_store(store, |records| match query {
            KeyQuery::All => records.len() as u64,
            KeyQuery::Key(key) => u64::from(records.contains_key(key)),
            KeyQuery::Range(range) => records.keys().filter(|k| range.contains(k)).count() as u64,
        })
    }

    fn close(&self) {
        if self.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        let mut registry = self.registry.write().unwrap();
        if let Some(db) = registry.databases.get_mut(&self.name) {
            db.open.remove(&self.id);
        }
        debug!(database = %self.name, connection = self.id, "closed connection");
    }
}

impl Drop for MemoryConnection {
    fn drop(&mut self) {
        self.close();
    }
}
