//! Callback calling convention.
//!
//! The `async` methods are the primary API. These extension traits run the
//! same operations on the local executor and hand the outcome to a callback,
//! for callers that cannot await. On native targets the callbacks must be
//! issued from inside a `tokio::task::LocalSet`.

use std::future::Future;

use idbkv_core::{Key, KeyQuery, Value};

use crate::error::Result;
use crate::traits::{KeyValueDatabase, KeyValueStore};

fn spawn<Fut>(future: Fut)
where
    Fut: Future<Output = ()> + 'static,
{
    #[cfg(target_arch = "wasm32")]
    wasm_bindgen_futures::spawn_local(future);

    #[cfg(not(target_arch = "wasm32"))]
    {
        tokio::task::spawn_local(future);
    }
}

/// Callback forms of the [`KeyValueStore`] operations.
pub trait CallbackStore: KeyValueStore + Clone + 'static {
    fn put_cb<C>(&self, key: impl Into<Key>, value: impl Into<Value>, callback: C)
    where
        C: FnOnce(Result<Key>) + 'static,
    {
        let (store, key, value) = (self.clone(), key.into(), value.into());
        spawn(async move { callback(store.put(key, value).await) });
    }

    fn get_cb<C>(&self, key: impl Into<Key>, callback: C)
    where
        C: FnOnce(Result<Option<Value>>) + 'static,
    {
        let (store, key) = (self.clone(), key.into());
        spawn(async move { callback(store.get(key).await) });
    }

    fn get_all_cb<C>(&self, callback: C)
    where
        C: FnOnce(Result<Vec<Value>>) + 'static,
    {
        let store = self.clone();
        spawn(async move { callback(store.get_all().await) });
    }

    fn get_all_keys_cb<C>(&self, callback: C)
    where
        C: FnOnce(Result<Vec<Key>>) + 'static,
    {
        let store = self.clone();
        spawn(async move { callback(store.get_all_keys().await) });
    }

    fn update_cb<C>(&self, key: impl Into<Key>, partial: impl Into<Value>, callback: C)
    where
        C: FnOnce(Result<(Key, Value)>) + 'static,
    {
        let (store, key, partial) = (self.clone(), key.into(), partial.into());
        spawn(async move { callback(store.update(key, partial).await) });
    }

    fn remove_cb<C>(&self, key: impl Into<Key>, callback: C)
    where
        C: FnOnce(Result<()>) + 'static,
    {
        let (store, key) = (self.clone(), key.into());
        spawn(async move { callback(store.remove(key).await) });
    }

    fn clear_cb<C>(&self, callback: C)
    where
        C: FnOnce(Result<()>) + 'static,
    {
        let store = self.clone();
        spawn(async move { callback(store.clear().await) });
    }

    fn count_cb<C>(&self, query: impl Into<KeyQuery>, callback: C)
    where
        C: FnOnce(Result<u64>) + 'static,
    {
        let (store, query) = (self.clone(), query.into());
        spawn(async move { callback(store.count(query).await) });
    }
}

impl<S> CallbackStore for S where S: KeyValueStore + Clone + 'static {}

/// Callback forms of the [`KeyValueDatabase`] lifecycle operations.
pub trait CallbackDatabase: KeyValueDatabase + Clone + 'static {
    fn close_cb<C>(&self, callback: C)
    where
        C: FnOnce(Result<()>) + 'static,
    {
        let db = self.clone();
        spawn(async move { callback(db.close().await) });
    }

    fn remove_cb<C>(&self, callback: C)
    where
        C: FnOnce(Result<()>) + 'static,
    {
        let db = self.clone();
        spawn(async move { callback(db.remove().await) });
    }
}

impl<D> CallbackDatabase for D where D: KeyValueDatabase + Clone + 'static {}
