//! No-op fallback used where persistent storage is unavailable.
//!
//! Dummy handles accept every call and never fail. Nothing is stored, so
//! reads always come back absent or empty.

use async_trait::async_trait;
use idbkv_core::{Key, KeyQuery, Value};
use tracing::trace;

use crate::error::Result;
use crate::traits::{KeyValueDatabase, KeyValueStore};

/// A database that stores nothing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DummyDatabase {
    name: String,
}

impl DummyDatabase {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// A store that stores nothing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DummyStore {
    database: String,
    name: String,
}

#[async_trait(?Send)]
impl KeyValueDatabase for DummyDatabase {
    type Store = DummyStore;

    fn name(&self) -> &str {
        &self.name
    }

    fn store(&self, name: &str) -> DummyStore {
        DummyStore {
            database: self.name.clone(),
            name: name.to_string(),
        }
    }

    async fn close(&self) -> Result<()> {
        trace!(database = %self.name, "dummy close");
        Ok(())
    }

    async fn remove(&self) -> Result<()> {
        trace!(database = %self.name, "dummy remove");
        Ok(())
    }
}

#[async_trait(?Send)]
impl KeyValueStore for DummyStore {
    fn name(&self) -> &str {
        &self.name
    }

    async fn put(&self, key: Key, _value: Value) -> Result<Key> {
        trace!(database = %self.database, store = %self.name, %key, "dummy put");
        Ok(key)
    }

    async fn get(&self, key: Key) -> Result<Option<Value>> {
        trace!(database = %self.database, store = %self.name, %key, "dummy get");
        Ok(None)
    }

    async fn get_all(&self) -> Result<Vec<Value>> {
        trace!(database = %self.database, store = %self.name, "dummy get_all");
        Ok(Vec::new())
    }

    async fn get_all_keys(&self) -> Result<Vec<Key>> {
        trace!(database = %self.database, store = %self.name, "dummy get_all_keys");
        Ok(Vec::new())
    }

    async fn update(&self, key: Key, partial: Value) -> Result<(Key, Value)> {
        trace!(database = %self.database, store = %self.name, %key, "dummy update");
        Ok((key, partial))
    }

    async fn remove(&self, key: Key) -> Result<()> {
        trace!(database = %self.database, store = %self.name, %key, "dummy remove");
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        trace!(database = %self.database, store = %self.name, "dummy clear");
        Ok(())
    }

    async fn count(&self, query: KeyQuery) -> Result<u64> {
        trace!(database = %self.database, store = %self.name, ?query, "dummy count");
        Ok(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn block_on<T>(fut: impl std::future::Future<Output = T>) -> T {
        tokio::runtime::Builder::new_current_thread()
            .build()
            .unwrap()
            .block_on(fut)
    }

    #[tokio::test]
    async fn test_update_echoes_partial() {
        let store = DummyDatabase::new("db").store("s");
        let partial = Value::object([("a", 1)]);
        let (key, value) = store.update(Key::from(1), partial.clone()).await.unwrap();
        assert_eq!(key, Key::from(1));
        assert_eq!(value, partial);
        assert_eq!(store.get(Key::from(1)).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_lifecycle_never_fails() {
        let db = DummyDatabase::new("db");
        db.close().await.unwrap();
        db.remove().await.unwrap();
        db.close().await.unwrap();
        assert_eq!(db.store("s").name(), "s");
    }

    proptest! {
        #[test]
        fn test_dummy_stays_empty(keys in prop::collection::vec(any::<i32>(), 0..16)) {
            let store = DummyDatabase::new("db").store("s");
            block_on(async {
                for k in &keys {
                    let key = store.put(Key::from(*k), Value::from(*k)).await.unwrap();
                    prop_assert_eq!(key, Key::from(*k));
                }
                for k in &keys {
                    prop_assert_eq!(store.get(Key::from(*k)).await.unwrap(), None);
                    prop_assert_eq!(store.count(KeyQuery::from(*k)).await.unwrap(), 0);
                }
                prop_assert!(store.get_all().await.unwrap().is_empty());
                prop_assert!(store.get_all_keys().await.unwrap().is_empty());
                Ok::<(), TestCaseError>(())
            })?;
        }
    }
}
