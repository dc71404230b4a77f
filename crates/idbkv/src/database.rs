//! The database handle.
//!
//! A [`Database`] names a host database, its stores and its version. No I/O
//! happens until the first operation; the connection is then opened once and
//! shared by every [`Store`] handle of the database.

use std::future::Future;
use std::rc::Rc;

use idbkv_core::Schema;
use idbkv_store::{Connection, Factory, StoreError};
use tokio::sync::Mutex;
use tracing::debug;

use crate::config::DatabaseConfig;
use crate::error::Result;
use crate::store::Store;

struct Inner<F: Factory> {
    factory: F,
    schema: Schema,
    /// Lazily opened connection. Holding the guard across the open makes
    /// concurrent callers wait for the same open.
    connection: Mutex<Option<Rc<F::Connection>>>,
}

/// Handle to a named, versioned database on an engine.
///
/// Cloning is cheap; clones share the connection.
pub struct Database<F: Factory> {
    inner: Rc<Inner<F>>,
}

impl<F: Factory> Clone for Database<F> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<F: Factory> std::fmt::Debug for Database<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database")
            .field("schema", &self.inner.schema)
            .finish_non_exhaustive()
    }
}

impl<F: Factory> Database<F> {
    /// A version 1 database with the given stores.
    pub fn new<I, S>(factory: F, name: impl Into<String>, stores: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::open(factory, &DatabaseConfig::new(name, stores))
    }

    /// A database described by `config`.
    pub fn open(factory: F, config: &DatabaseConfig) -> Result<Self> {
        Ok(Self::with_schema(factory, config.to_schema()?))
    }

    /// A database described by an already validated schema.
    pub fn with_schema(factory: F, schema: Schema) -> Self {
        Self {
            inner: Rc::new(Inner {
                factory,
                schema,
                connection: Mutex::new(None),
            }),
        }
    }

    /// Database name.
    pub fn name(&self) -> &str {
        &self.inner.schema.name
    }

    /// Requested version.
    pub fn version(&self) -> u32 {
        self.inner.schema.version
    }

    /// Requested stores, in name order.
    pub fn store_names(&self) -> Vec<String> {
        self.inner.schema.stores.iter().cloned().collect()
    }

    /// The schema the database is opened with.
    pub fn schema(&self) -> &Schema {
        &self.inner.schema
    }

    /// The engine.
    pub fn factory(&self) -> &F {
        &self.inner.factory
    }

    /// Whether a connection is currently open.
    ///
    /// Reports `false` while an open or close is in flight.
    pub fn is_open(&self) -> bool {
        self.inner
            .connection
            .try_lock()
            .map(|slot| slot.is_some())
            .unwrap_or(false)
    }

    /// Handle to one store. Does not touch the engine.
    pub fn store(&self, name: impl Into<String>) -> Store<F> {
        Store::new(self.clone(), name.into())
    }

    /// The open connection, opening it first if needed.
    ///
    /// A failed open is not remembered; the next call tries again.
    pub async fn connection(&self) -> Result<Rc<F::Connection>> {
        let mut slot = self.inner.connection.lock().await;
        if let Some(connection) = slot.as_ref() {
            return Ok(Rc::clone(connection));
        }

        let schema = &self.inner.schema;
        debug!(database = %schema.name, version = schema.version, "opening connection");
        let connection = Rc::new(self.inner.factory.open(schema).await?);
        *slot = Some(Rc::clone(&connection));
        Ok(connection)
    }

    /// Run `op` against the open connection.
    pub async fn execute<T, Op, Fut>(&self, op: Op) -> Result<T>
    where
        Op: FnOnce(Rc<F::Connection>) -> Fut,
        Fut: Future<Output = std::result::Result<T, StoreError>>,
    {
        let connection = self.connection().await?;
        Ok(op(connection).await?)
    }

    /// Close the connection. The next operation reopens it.
    ///
    /// A no-op if nothing is open.
    pub async fn close(&self) -> Result<()> {
        let mut slot = self.inner.connection.lock().await;
        if let Some(connection) = slot.take() {
            debug!(database = %self.name(), "closing connection");
            connection.close();
        }
        Ok(())
    }

    /// Close, then delete the whole database.
    ///
    /// Fails with the engine's blocked error while other connections to the
    /// database are open.
    pub async fn remove(&self) -> Result<()> {
        self.close().await?;
        debug!(database = %self.name(), "removing database");
        self.inner.factory.delete_database(self.name()).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use idbkv_core::{Key, Value};
    use idbkv_store::MemoryFactory;

    #[tokio::test]
    async fn test_lazy_open() {
        let factory = MemoryFactory::new();
        let db = Database::new(factory.clone(), "lazy", ["s"]).unwrap();
        assert!(!db.is_open());
        assert!(factory.database_names().is_empty());

        db.store("s").put(1, "one").await.unwrap();
        assert!(db.is_open());
        assert_eq!(factory.database_names(), vec!["lazy"]);
    }

    #[tokio::test]
    async fn test_close_then_reopen() {
        let factory = MemoryFactory::new();
        let db = Database::new(factory.clone(), "reopen", ["s"]).unwrap();
        let store = db.store("s");
        store.put("k", "v").await.unwrap();

        db.close().await.unwrap();
        assert!(!db.is_open());
        assert_eq!(factory.open_connections("reopen"), 0);

        assert_eq!(store.get("k").await.unwrap(), Some(Value::from("v")));
        assert!(db.is_open());
    }

    #[tokio::test]
    async fn test_close_never_opened() {
        let factory = MemoryFactory::new();
        let db = Database::new(factory.clone(), "idle", ["s"]).unwrap();
        db.close().await.unwrap();
        assert!(factory.database_names().is_empty());
    }

    #[tokio::test]
    async fn test_execute_shares_connection() {
        let db = Database::new(MemoryFactory::new(), "shared", ["s"]).unwrap();
        let first = db.connection().await.unwrap();
        let second = db.connection().await.unwrap();
        assert!(Rc::ptr_eq(&first, &second));

        let key = db
            .execute(|conn| async move { conn.put("s", &Key::from(1), &Value::Null).await })
            .await
            .unwrap();
        assert_eq!(key, Key::from(1));
    }

    #[tokio::test]
    async fn test_remove_deletes_database() {
        let factory = MemoryFactory::new();
        let db = Database::new(factory.clone(), "gone", ["s"]).unwrap();
        db.store("s").put(1, 1).await.unwrap();

        db.remove().await.unwrap();
        assert!(factory.database_names().is_empty());
        assert!(!db.is_open());
    }
}
