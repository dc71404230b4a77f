//! The shared contract of real and dummy handles.
//!
//! [`Store`](crate::Store) and [`DummyStore`](crate::DummyStore) both
//! implement [`KeyValueStore`], so callers can be written once and run
//! against whichever one the selector picked.

use async_trait::async_trait;
use idbkv_core::{Key, KeyQuery, Value};
use idbkv_store::Factory;

use crate::database::Database;
use crate::error::Result;
use crate::store::Store;

/// Record operations on one store.
#[async_trait(?Send)]
pub trait KeyValueStore {
    /// Store name.
    fn name(&self) -> &str;

    /// Insert or overwrite. Returns the key.
    async fn put(&self, key: Key, value: Value) -> Result<Key>;

    /// The record at `key`, or `None`.
    async fn get(&self, key: Key) -> Result<Option<Value>>;

    /// Every record, in ascending key order.
    async fn get_all(&self) -> Result<Vec<Value>>;

    /// Every key, in ascending order.
    async fn get_all_keys(&self) -> Result<Vec<Key>>;

    /// Shallow-merge `partial` onto the record at `key` and write it back.
    async fn update(&self, key: Key, partial: Value) -> Result<(Key, Value)>;

    /// Delete the record at `key`.
    async fn remove(&self, key: Key) -> Result<()>;

    /// Delete every record.
    async fn clear(&self) -> Result<()>;

    /// Number of records matching `query`.
    async fn count(&self, query: KeyQuery) -> Result<u64>;
}

/// Lifecycle of a database and access to its stores.
#[async_trait(?Send)]
pub trait KeyValueDatabase {
    /// The store handle type.
    type Store: KeyValueStore;

    /// Database name.
    fn name(&self) -> &str;

    /// Handle to one store.
    fn store(&self, name: &str) -> Self::Store;

    /// Release the connection.
    async fn close(&self) -> Result<()>;

    /// Close, then delete the database.
    async fn remove(&self) -> Result<()>;
}

#[async_trait(?Send)]
impl<F: Factory> KeyValueStore for Store<F> {
    fn name(&self) -> &str {
        Store::name(self)
    }

    async fn put(&self, key: Key, value: Value) -> Result<Key> {
        Store::put(self, key, value).await
    }

    async fn get(&self, key: Key) -> Result<Option<Value>> {
        Store::get(self, key).await
    }

    async fn get_all(&self) -> Result<Vec<Value>> {
        Store::get_all(self).await
    }

    async fn get_all_keys(&self) -> Result<Vec<Key>> {
        Store::get_all_keys(self).await
    }

    async fn update(&self, key: Key, partial: Value) -> Result<(Key, Value)> {
        Store::update(self, key, partial).await
    }

    async fn remove(&self, key: Key) -> Result<()> {
        Store::remove(self, key).await
    }

    async fn clear(&self) -> Result<()> {
        Store::clear(self).await
    }

    async fn count(&self, query: KeyQuery) -> Result<u64> {
        Store::count(self, query).await
    }
}

#[async_trait(?Send)]
impl<F: Factory> KeyValueDatabase for Database<F> {
    type Store = Store<F>;

    fn name(&self) -> &str {
        Database::name(self)
    }

    fn store(&self, name: &str) -> Store<F> {
        Database::store(self, name)
    }

    async fn close(&self) -> Result<()> {
        Database::close(self).await
    }

    async fn remove(&self) -> Result<()> {
        Database::remove(self).await
    }
}
