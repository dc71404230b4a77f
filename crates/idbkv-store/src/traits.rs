//! Engine traits: the contract every host object-store engine satisfies.
//!
//! A [`Factory`] opens versioned databases and deletes them. An open database
//! is a [`Connection`], which runs single-request transactions against one
//! named store at a time. Futures are not `Send`: the host engine lives on a
//! single-threaded cooperative executor.

use async_trait::async_trait;
use idbkv_core::{Key, KeyQuery, Schema, Value};

use crate::error::Result;

/// Opens and deletes named databases.
#[async_trait(?Send)]
pub trait Factory {
    /// The connection type produced by [`Factory::open`].
    type Connection: Connection;

    /// Open the database described by `schema`.
    ///
    /// If the stored version is lower than `schema.version` (or the database
    /// does not exist yet) the engine runs an upgrade, creating and deleting
    /// stores so the database holds exactly `schema.stores`.
    async fn open(&self, schema: &Schema) -> Result<Self::Connection>;

    /// Delete the named database and all of its stores.
    ///
    /// Fails with [`StoreError::Blocked`](crate::StoreError::Blocked) while
    /// other connections to it are open.
    async fn delete_database(&self, name: &str) -> Result<()>;
}

/// An open database connection.
///
/// Every operation runs in its own transaction scoped to one store.
/// [`Connection::update`] runs its read and write in the same readwrite
/// transaction.
#[async_trait(?Send)]
pub trait Connection {
    // ─────────────────────────────────────────────────────────────────────────
    // Metadata
    // ─────────────────────────────────────────────────────────────────────────

    /// Database name.
    fn name(&self) -> &str;

    /// Version the database was opened at.
    fn version(&self) -> u32;

    /// Names of the stores in the database, in name order.
    fn store_names(&self) -> Vec<String>;

    // ─────────────────────────────────────────────────────────────────────────
    // Record Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Insert or overwrite the record at `key`. Returns the key.
    async fn put(&self, store: &str, key: &Key, value: &Value) -> Result<Key>;

    /// Read the record at `key`.
    async fn get(&self, store: &str, key: &Key) -> Result<Option<Value>>;

    /// All records, in ascending key order.
    async fn get_all(&self, store: &str) -> Result<Vec<Value>>;

    /// All keys, in ascending order.
    async fn get_all_keys(&self, store: &str) -> Result<Vec<Key>>;

    /// Shallow-merge `patch` onto the record at `key` and write it back.
    ///
    /// The read and the write share one readwrite transaction. Returns the
    /// merged value.
    async fn update(&self, store: &str, key: &Key, patch: &Value) -> Result<Value>;

    /// Delete the record at `key`. Deleting an absent key succeeds.
    async fn delete(&self, store: &str, key: &Key) -> Result<()>;

    /// Delete every record in the store.
    async fn clear(&self, store: &str) -> Result<()>;

    /// Number of records matching `query`.
    async fn count(&self, store: &str, query: &KeyQuery) -> Result<u64>;

    // ─────────────────────────────────────────────────────────────────────────
    // Lifecycle
    // ─────────────────────────────────────────────────────────────────────────

    /// Close the connection. Further operations fail. Idempotent.
    fn close(&self);
}
