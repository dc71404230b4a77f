//! The store handle.
//!
//! Every operation goes through [`Database::execute`], so the first call on
//! any store of a database opens the shared connection.

use std::rc::Rc;

use idbkv_core::{Key, KeyQuery, Value};
use idbkv_store::{Connection, Factory};
use tracing::trace;

use crate::database::Database;
use crate::error::Result;

/// Handle to one named store of a [`Database`].
pub struct Store<F: Factory> {
    database: Database<F>,
    name: Rc<str>,
}

impl<F: Factory> Clone for Store<F> {
    fn clone(&self) -> Self {
        Self {
            database: self.database.clone(),
            name: Rc::clone(&self.name),
        }
    }
}

impl<F: Factory> std::fmt::Debug for Store<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store")
            .field("database", &self.database.name())
            .field("name", &self.name)
            .finish()
    }
}

impl<F: Factory> Store<F> {
    pub(crate) fn new(database: Database<F>, name: String) -> Self {
        Self {
            database,
            name: name.into(),
        }
    }

    /// Store name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The database this store belongs to.
    pub fn database(&self) -> &Database<F> {
        &self.database
    }

    /// Insert or overwrite the record at `key`. Returns the key.
    pub async fn put(&self, key: impl Into<Key>, value: impl Into<Value>) -> Result<Key> {
        let (key, value) = (key.into(), value.into());
        trace!(store = %self.name, %key, "put");
        let name = Rc::clone(&self.name);
        self.database
            .execute(move |conn| async move { conn.put(&name, &key, &value).await })
            .await
    }

    /// The record at `key`, or `None`.
    pub async fn get(&self, key: impl Into<Key>) -> Result<Option<Value>> {
        let key = key.into();
        trace!(store = %self.name, %key, "get");
        let name = Rc::clone(&self.name);
        self.database
            .execute(move |conn| async move { conn.get(&name, &key).await })
            .await
    }

    /// Every record, in ascending key order.
    pub async fn get_all(&self) -> Result<Vec<Value>> {
        trace!(store = %self.name, "get_all");
        let name = Rc::clone(&self.name);
        self.database
            .execute(move |conn| async move { conn.get_all(&name).await })
            .await
    }

    /// Every key, in ascending order.
    pub async fn get_all_keys(&self) -> Result<Vec<Key>> {
        trace!(store = %self.name, "get_all_keys");
        let name = Rc::clone(&self.name);
        self.database
            .execute(move |conn| async move { conn.get_all_keys(&name).await })
            .await
    }

    /// Shallow-merge `partial` onto the record at `key` and write it back.
    ///
    /// An absent record is treated as empty, so `partial` is stored as is.
    /// The read and the write run in one engine transaction.
    pub async fn update(
        &self,
        key: impl Into<Key>,
        partial: impl Into<Value>,
    ) -> Result<(Key, Value)> {
        let (key, partial) = (key.into(), partial.into());
        trace!(store = %self.name, %key, "update");
        let name = Rc::clone(&self.name);
        let merged = self
            .database
            .execute({
                let key = key.clone();
                move |conn| async move { conn.update(&name, &key, &partial).await }
            })
            .await?;
        Ok((key, merged))
    }

    /// Delete the record at `key`. An absent key is not an error.
    pub async fn remove(&self, key: impl Into<Key>) -> Result<()> {
        let key = key.into();
        trace!(store = %self.name, %key, "remove");
        let name = Rc::clone(&self.name);
        self.database
            .execute(move |conn| async move { conn.delete(&name, &key).await })
            .await
    }

    /// Delete every record.
    pub async fn clear(&self) -> Result<()> {
        trace!(store = %self.name, "clear");
        let name = Rc::clone(&self.name);
        self.database
            .execute(move |conn| async move { conn.clear(&name).await })
            .await
    }

    /// Number of records matching an exact key, a key range, or
    /// [`KeyQuery::All`].
    pub async fn count(&self, query: impl Into<KeyQuery>) -> Result<u64> {
        let query = query.into();
        trace!(store = %self.name, ?query, "count");
        let name = Rc::clone(&self.name);
        self.database
            .execute(move |conn| async move { conn.count(&name, &query).await })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use idbkv_core::KeyRange;
    use idbkv_store::{MemoryFactory, StoreError};

    use crate::error::Error;

    fn animals() -> Database<MemoryFactory> {
        Database::new(MemoryFactory::new(), "animals", ["horses", "birds"]).unwrap()
    }

    #[tokio::test]
    async fn test_put_returns_key() {
        let horses = animals().store("horses");
        assert_eq!(horses.put("h", "neigh").await.unwrap(), Key::from("h"));
    }

    #[tokio::test]
    async fn test_update_absent_stores_partial() {
        let horses = animals().store("horses");
        let partial = Value::object([("legs", 4)]);

        let (key, merged) = horses.update("h", partial.clone()).await.unwrap();
        assert_eq!(key, Key::from("h"));
        assert_eq!(merged, partial);
        assert_eq!(horses.get("h").await.unwrap(), Some(partial));
    }

    #[tokio::test]
    async fn test_count_by_range() {
        let birds = animals().store("birds");
        for i in 0..10 {
            birds.put(i, i).await.unwrap();
        }
        let range = KeyRange::bound(3, 6, false, true).unwrap();
        assert_eq!(birds.count(range).await.unwrap(), 3);
        assert_eq!(birds.count(KeyQuery::All).await.unwrap(), 10);
        assert_eq!(birds.count(20).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_unknown_store_not_found() {
        let fish = animals().store("fish");
        let result = fish.get(1).await;
        assert!(matches!(
            result,
            Err(Error::Store(StoreError::NotFound { store })) if store == "fish"
        ));
    }
}
