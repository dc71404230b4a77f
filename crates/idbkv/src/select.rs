//! Choosing between the real engine and the dummy fallback.
//!
//! Selection is driven by an explicit [`Environment`]. Only
//! [`Environment::detect`] looks at the global scope, so everything else can
//! be exercised off-browser.

use async_trait::async_trait;
use idbkv_core::{Key, KeyQuery, Value};
use idbkv_store::Factory;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::DatabaseConfig;
use crate::database::Database;
use crate::dummy::{DummyDatabase, DummyStore};
use crate::error::Result;
use crate::store::Store;
use crate::traits::{KeyValueDatabase, KeyValueStore};

/// Global property whose presence forces the dummy backend.
pub const FORCE_DUMMY_MARKER: &str = "__idbkv_force_dummy";

/// Which backend the selector picks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    Real,
    Dummy,
}

/// Capabilities of the running environment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Environment {
    /// A persistent object-store engine is reachable.
    pub storage_available: bool,
    /// The dummy override marker is present.
    pub force_dummy: bool,
}

impl Environment {
    pub fn new(storage_available: bool, force_dummy: bool) -> Self {
        Self {
            storage_available,
            force_dummy,
        }
    }

    /// Probe the global scope once.
    ///
    /// Off wasm32 there is no host object store, so storage is reported
    /// unavailable.
    #[cfg(target_arch = "wasm32")]
    pub fn detect() -> Self {
        let global = js_sys::global();
        let has = |property: &str| {
            js_sys::Reflect::has(&global, &js_sys::JsString::from(property)).unwrap_or(false)
        };
        let storage_available = has("indexedDB")
            && js_sys::Reflect::get(&global, &js_sys::JsString::from("indexedDB"))
                .map(|factory| !factory.is_null() && !factory.is_undefined())
                .unwrap_or(false);
        let env = Self::new(storage_available, has(FORCE_DUMMY_MARKER));
        debug!(?env, "detected environment");
        env
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn detect() -> Self {
        let env = Self::default();
        debug!(?env, "detected environment");
        env
    }

    /// `Real` only when storage is available and not overridden.
    pub fn backend(&self) -> BackendKind {
        if self.storage_available && !self.force_dummy {
            BackendKind::Real
        } else {
            BackendKind::Dummy
        }
    }
}

/// A real or dummy database.
#[derive(Debug)]
pub enum AnyDatabase<F: Factory> {
    Real(Database<F>),
    Dummy(DummyDatabase),
}

impl<F: Factory> Clone for AnyDatabase<F> {
    fn clone(&self) -> Self {
        match self {
            AnyDatabase::Real(db) => AnyDatabase::Real(db.clone()),
            AnyDatabase::Dummy(db) => AnyDatabase::Dummy(db.clone()),
        }
    }
}

impl<F: Factory> AnyDatabase<F> {
    pub fn kind(&self) -> BackendKind {
        match self {
            AnyDatabase::Real(_) => BackendKind::Real,
            AnyDatabase::Dummy(_) => BackendKind::Dummy,
        }
    }

    pub fn is_dummy(&self) -> bool {
        self.kind() == BackendKind::Dummy
    }
}

/// A store of an [`AnyDatabase`].
#[derive(Debug)]
pub enum AnyStore<F: Factory> {
    Real(Store<F>),
    Dummy(DummyStore),
}

impl<F: Factory> Clone for AnyStore<F> {
    fn clone(&self) -> Self {
        match self {
            AnyStore::Real(store) => AnyStore::Real(store.clone()),
            AnyStore::Dummy(store) => AnyStore::Dummy(store.clone()),
        }
    }
}

/// Build the database `config` describes on the backend `env` allows.
///
/// The config is validated either way.
pub fn select<F: Factory>(
    env: &Environment,
    factory: F,
    config: &DatabaseConfig,
) -> Result<AnyDatabase<F>> {
    let schema = config.to_schema()?;
    match env.backend() {
        BackendKind::Real => {
            debug!(database = %schema.name, "using persistent storage");
            Ok(AnyDatabase::Real(Database::with_schema(factory, schema)))
        }
        BackendKind::Dummy => {
            warn!(
                database = %schema.name,
                storage_available = env.storage_available,
                force_dummy = env.force_dummy,
                "persistent storage unavailable, using dummy database"
            );
            Ok(AnyDatabase::Dummy(DummyDatabase::new(schema.name)))
        }
    }
}

/// Detect the environment and open `config` on the browser's IndexedDB, or
/// on the dummy when it is unavailable.
#[cfg(all(target_arch = "wasm32", feature = "web"))]
pub fn open_default(config: &DatabaseConfig) -> Result<AnyDatabase<idbkv_store::IdbFactory>> {
    let env = Environment::detect();
    if env.backend() == BackendKind::Real {
        match idbkv_store::IdbFactory::from_global() {
            Ok(factory) => return select(&env, factory, config),
            Err(e) => warn!(error = %e, "indexedDB detected but not usable"),
        }
    }
    let schema = config.to_schema()?;
    warn!(database = %schema.name, "using dummy database");
    Ok(AnyDatabase::Dummy(DummyDatabase::new(schema.name)))
}

#[async_trait(?Send)]
impl<F: Factory> KeyValueDatabase for AnyDatabase<F> {
    type Store = AnyStore<F>;

    fn name(&self) -> &str {
        match self {
            AnyDatabase::Real(db) => db.name(),
            AnyDatabase::Dummy(db) => KeyValueDatabase::name(db),
        }
    }

    fn store(&self, name: &str) -> AnyStore<F> {
        match self {
            AnyDatabase::Real(db) => AnyStore::Real(db.store(name)),
            AnyDatabase::Dummy(db) => AnyStore::Dummy(db.store(name)),
        }
    }

    async fn close(&self) -> Result<()> {
        match self {
            AnyDatabase::Real(db) => db.close().await,
            AnyDatabase::Dummy(db) => db.close().await,
        }
    }

    async fn remove(&self) -> Result<()> {
        match self {
            AnyDatabase::Real(db) => db.remove().await,
            AnyDatabase::Dummy(db) => db.remove().await,
        }
    }
}

#[async_trait(?Send)]
impl<F: Factory> KeyValueStore for AnyStore<F> {
    fn name(&self) -> &str {
        match self {
            AnyStore::Real(store) => store.name(),
            AnyStore::Dummy(store) => store.name(),
        }
    }

    async fn put(&self, key: Key, value: Value) -> Result<Key> {
        match self {
            AnyStore::Real(store) => store.put(key, value).await,
            AnyStore::Dummy(store) => store.put(key, value).await,
        }
    }

    async fn get(&self, key: Key) -> Result<Option<Value>> {
        match self {
            AnyStore::Real(store) => store.get(key).await,
            AnyStore::Dummy(store) => store.get(key).await,
        }
    }

    async fn get_all(&self) -> Result<Vec<Value>> {
        match self {
            AnyStore::Real(store) => store.get_all().await,
            AnyStore::Dummy(store) => store.get_all().await,
        }
    }

    async fn get_all_keys(&self) -> Result<Vec<Key>> {
        match self {
            AnyStore::Real(store) => store.get_all_keys().await,
            AnyStore::Dummy(store) => store.get_all_keys().await,
        }
    }

    async fn update(&self, key: Key, partial: Value) -> Result<(Key, Value)> {
        match self {
            AnyStore::Real(store) => store.update(key, partial).await,
            AnyStore::Dummy(store) => store.update(key, partial).await,
        }
    }

    async fn remove(&self, key: Key) -> Result<()> {
        match self {
            AnyStore::Real(store) => store.remove(key).await,
            AnyStore::Dummy(store) => store.remove(key).await,
        }
    }

    async fn clear(&self) -> Result<()> {
        match self {
            AnyStore::Real(store) => store.clear().await,
            AnyStore::Dummy(store) => store.clear().await,
        }
    }

    async fn count(&self, query: KeyQuery) -> Result<u64> {
        match self {
            AnyStore::Real(store) => store.count(query).await,
            AnyStore::Dummy(store) => store.count(query).await,
        }
    }
}
