//! # IndexedDB Engine
//!
//! The browser's persistent object store, reached through `web-sys`.
//!
//! Every host request is bridged to a future (see [`request`]). Upgrades run
//! inside the open request's `upgradeneeded` event through
//! [`apply_upgrade`]. [`IdbConnection::update`] issues its write from the
//! read's success handler so both stay inside one readwrite transaction.
//! An open that reports `blocked` fails with [`StoreError::Blocked`] and its
//! queued request is detached so it cannot change the version without the
//! schema's stores.

mod convert;
mod request;

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use async_trait::async_trait;
use tracing::{debug, trace, warn};
use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{
    DomStringList, Event, IdbDatabase, IdbObjectStore, IdbOpenDbRequest, IdbRequest,
    IdbTransactionMode, IdbVersionChangeEvent, Window, WorkerGlobalScope,
};

use idbkv_core::{shallow_merge, Key, KeyQuery, Schema, Value};

use crate::error::{Result, StoreError};
use crate::traits::{Connection, Factory};
use crate::upgrade::{apply_upgrade, UpgradeTarget};

use convert::{key_from_js, key_to_js, query_to_js, value_from_js, value_to_js};
use request::{await_request, host_error, receive, reply_channel, send, Reply, RequestHandlers};

fn string_list(list: &DomStringList) -> Vec<String> {
    let mut names: Vec<String> = (0..list.length()).filter_map(|i| list.item(i)).collect();
    names.sort();
    names
}

/// Handle to the host's `indexedDB` factory.
#[derive(Clone, Debug)]
pub struct IdbFactory {
    inner: web_sys::IdbFactory,
}

impl IdbFactory {
    /// Wrap an existing host factory.
    pub fn new(inner: web_sys::IdbFactory) -> Self {
        Self { inner }
    }

    /// The factory of the current global scope, window or worker.
    ///
    /// Fails with [`StoreError::Unavailable`] when the scope has none.
    pub fn from_global() -> Result<Self> {
        let global = js_sys::global();
        let factory = if let Some(window) = global.dyn_ref::<Window>() {
            window.indexed_db()
        } else if let Some(worker) = global.dyn_ref::<WorkerGlobalScope>() {
            worker.indexed_db()
        } else {
            return Err(StoreError::Unavailable);
        };

        match factory {
            Ok(Some(inner)) => Ok(Self::new(inner)),
            Ok(None) | Err(_) => Err(StoreError::Unavailable),
        }
    }

    fn install_upgrade(
        request: &IdbOpenDbRequest,
        schema: &Schema,
        reply: &Reply<JsValue>,
    ) -> Closure<dyn FnMut(IdbVersionChangeEvent)> {
        let request = request.clone();
        let schema = schema.clone();
        let reply = Rc::clone(reply);

        let on_upgrade = Closure::<dyn FnMut(IdbVersionChangeEvent)>::new(
            move |event: IdbVersionChangeEvent| {
                let old_version = event.old_version() as u32;
                let upgraded = request
                    .result()
                    .map_err(host_error)
                    .and_then(|db| {
                        db.dyn_into::<IdbDatabase>().map_err(|_| {
                            StoreError::Conversion("open result is not a database".into())
                        })
                    })
                    .and_then(|db| {
                        apply_upgrade(&schema, old_version, &mut UpgradingDatabase { db: &db })
                    });

                if let Err(e) = upgraded {
                    debug!(database = %schema.name, error = %e, "upgrade failed, aborting");
                    send(&reply, Err(e));
                    if let Some(transaction) = request.transaction() {
                        let _ = transaction.abort();
                    }
                }
            },
        );
        request.set_onupgradeneeded(Some(on_upgrade.as_ref().unchecked_ref()));
        on_upgrade
    }

    fn install_blocked(
        request: &IdbOpenDbRequest,
        name: &str,
        reply: &Reply<JsValue>,
    ) -> Closure<dyn FnMut(Event)> {
        let name = name.to_string();
        let reply = Rc::clone(reply);
        let on_blocked = Closure::<dyn FnMut(Event)>::new(move |_event: Event| {
            send(&reply, Err(StoreError::Blocked { name: name.clone() }));
        });
        request.set_onblocked(Some(on_blocked.as_ref().unchecked_ref()));
        on_blocked
    }

    /// Wait for an open or delete request, installing the upgrade handler
    /// when a schema is given. Handlers are removed before returning.
    async fn settle(
        request: &IdbOpenDbRequest,
        name: &str,
        schema: Option<&Schema>,
    ) -> Result<JsValue> {
        let (reply, receiver) = reply_channel();
        let result = {
            let _handlers = {
                let reply = Rc::clone(&reply);
                RequestHandlers::new(request, move |result| send(&reply, result))
            };
            let _on_upgrade = schema.map(|schema| Self::install_upgrade(request, schema, &reply));
            let _on_blocked = Self::install_blocked(request, name, &reply);
            receive(receiver).await
        };
        request.set_onupgradeneeded(None);
        request.set_onblocked(None);
        result
    }
}

/// Detach an open request that reported `blocked`.
///
/// The host keeps the request queued until the other connections close. When
/// it proceeds, its version change is aborted and any database it still yields
/// is closed, so the next open runs the upgrade with the schema attached.
fn abandon_open(request: &IdbOpenDbRequest, name: &str) {
    let on_upgrade = {
        let request = request.clone();
        let name = name.to_string();
        Closure::once_into_js(move |_event: Event| {
            debug!(database = %name, "aborting version change of a blocked open");
            if let Some(transaction) = request.transaction() {
                let _ = transaction.abort();
            }
        })
    };
    let on_success = {
        let request = request.clone();
        Closure::once_into_js(move |_event: Event| {
            if let Ok(db) = request.result().and_then(|db| db.dyn_into::<IdbDatabase>()) {
                db.close();
            }
        })
    };
    let on_error = Closure::once_into_js(|event: Event| event.prevent_default());

    request.set_onupgradeneeded(Some(on_upgrade.unchecked_ref()));
    request.set_onsuccess(Some(on_success.unchecked_ref()));
    request.set_onerror(Some(on_error.unchecked_ref()));
}

/// Detach a delete request that reported `blocked`. The host still deletes
/// the database once the other connections close.
fn abandon_delete(request: &IdbOpenDbRequest, name: &str) {
    let on_success = {
        let name = name.to_string();
        Closure::once_into_js(move |_event: Event| {
            debug!(database = %name, "blocked deletion completed");
        })
    };
    let on_error = Closure::once_into_js(|event: Event| event.prevent_default());

    request.set_onsuccess(Some(on_success.unchecked_ref()));
    request.set_onerror(Some(on_error.unchecked_ref()));
}

#[async_trait(?Send)]
impl Factory for IdbFactory {
    type Connection = IdbConnection;

    async fn open(&self, schema: &Schema) -> Result<IdbConnection> {
        debug!(database = %schema.name, version = schema.version, "opening database");
        let request = self
            .inner
            .open_with_u32(&schema.name, schema.version)
            .map_err(host_error)?;

        let result = Self::settle(&request, &schema.name, Some(schema)).await;
        if matches!(result, Err(StoreError::Blocked { .. })) {
            warn!(
                database = %schema.name,
                version = schema.version,
                "open blocked by other connections"
            );
            abandon_open(&request, &schema.name);
        }

        let db: IdbDatabase = result?
            .dyn_into()
            .map_err(|_| StoreError::Conversion("open result is not a database".into()))?;
        Ok(IdbConnection::new(db))
    }

    /// A blocked deletion fails with [`StoreError::Blocked`] but stays queued
    /// on the host, which completes it once the other connections close.
    async fn delete_database(&self, name: &str) -> Result<()> {
        debug!(database = %name, "deleting database");
        let request = self.inner.delete_database(name).map_err(host_error)?;

        let result = Self::settle(&request, name, None).await;
        if matches!(result, Err(StoreError::Blocked { .. })) {
            warn!(database = %name, "deletion blocked by other connections");
            abandon_delete(&request, name);
        }
        result.map(|_| ())
    }
}

/// The database handed to `upgradeneeded`.
struct UpgradingDatabase<'a> {
    db: &'a IdbDatabase,
}

impl UpgradeTarget for UpgradingDatabase<'_> {
    fn existing_stores(&self) -> Vec<String> {
        string_list(&self.db.object_store_names())
    }

    fn create_store(&mut self, name: &str) -> Result<()> {
        self.db
            .create_object_store(name)
            .map(|_| ())
            .map_err(host_error)
    }

    fn delete_store(&mut self, name: &str) -> Result<()> {
        self.db.delete_object_store(name).map_err(host_error)
    }
}

/// An open IndexedDB connection.
#[derive(Debug)]
pub struct IdbConnection {
    db: IdbDatabase,
    name: String,
    version: u32,
    store_names: Vec<String>,
    closed: Cell<bool>,
}

impl IdbConnection {
    fn new(db: IdbDatabase) -> Self {
        let name = db.name();
        let version = db.version() as u32;
        let store_names = string_list(&db.object_store_names());
        debug!(database = %name, version, stores = store_names.len(), "database open");
        Self {
            db,
            name,
            version,
            store_names,
            closed: Cell::new(false),
        }
    }

    /// The underlying host database.
    pub fn raw(&self) -> &IdbDatabase {
        &self.db
    }

    fn object_store(&self, store: &str, mode: IdbTransactionMode) -> Result<IdbObjectStore> {
        if self.closed.get() {
            return Err(StoreError::InvalidState(
                "the database connection is closing".into(),
            ));
        }
        if !self.store_names.iter().any(|s| s == store) {
            return Err(StoreError::NotFound {
                store: store.to_string(),
            });
        }
        self.db
            .transaction_with_str_and_mode(store, mode)
            .and_then(|transaction| transaction.object_store(store))
            .map_err(host_error)
    }

    fn reading(&self, store: &str) -> Result<IdbObjectStore> {
        self.object_store(store, IdbTransactionMode::Readonly)
    }

    fn writing(&self, store: &str) -> Result<IdbObjectStore> {
        self.object_store(store, IdbTransactionMode::Readwrite)
    }
}

/// Merge `patch` onto the record read by an update and queue the write.
fn merge_and_put(
    object_store: &IdbObjectStore,
    key: &JsValue,
    current: JsValue,
    patch: Value,
) -> Result<(IdbRequest, Value)> {
    let existing = if current.is_undefined() {
        None
    } else {
        Some(value_from_js(&current)?)
    };
    let merged = shallow_merge(existing, patch);
    let request = object_store
        .put_with_key(&value_to_js(&merged)?, key)
        .map_err(host_error)?;
    Ok((request, merged))
}

#[async_trait(?Send)]
impl Connection for IdbConnection {
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
        let request = self
            .writing(store)?
            .put_with_key(&value_to_js(value)?, &key_to_js(key))
            .map_err(host_error)?;
        key_from_js(&await_request(&request).await?)
    }

    async fn get(&self, store: &str, key: &Key) -> Result<Option<Value>> {
        trace!(database = %self.name, store, %key, "get");
        let request = self.reading(store)?.get(&key_to_js(key)).map_err(host_error)?;
        let value = await_request(&request).await?;
        if value.is_undefined() {
            return Ok(None);
        }
        value_from_js(&value).map(Some)
    }

    async fn get_all(&self, store: &str) -> Result<Vec<Value>> {
        let request = self.reading(store)?.get_all().map_err(host_error)?;
        let values: js_sys::Array = await_request(&request).await?.unchecked_into();
        values.iter().map(|v| value_from_js(&v)).collect()
    }

    async fn get_all_keys(&self, store: &str) -> Result<Vec<Key>> {
        let request = self.reading(store)?.get_all_keys().map_err(host_error)?;
        let keys: js_sys::Array = await_request(&request).await?.unchecked_into();
        keys.iter().map(|k| key_from_js(&k)).collect()
    }

    async fn update(&self, store: &str, key: &Key, patch: &Value) -> Result<Value> {
        trace!(database = %self.name, store, %key, "update");
        let object_store = self.writing(store)?;
        let js_key = key_to_js(key);
        let get_request = object_store.get(&js_key).map_err(host_error)?;

        let (reply, receiver) = reply_channel::<Value>();
        let put_handlers = Rc::new(RefCell::new(None::<RequestHandlers>));

        let on_read = {
            let reply = Rc::clone(&reply);
            let put_handlers = Rc::clone(&put_handlers);
            let patch = patch.clone();
            move |current: Result<JsValue>| {
                let queued =
                    current.and_then(|current| merge_and_put(&object_store, &js_key, current, patch));
                match queued {
                    Ok((put_request, merged)) => {
                        let reply = Rc::clone(&reply);
                        let handlers = RequestHandlers::new(&put_request, move |written| {
                            send(&reply, written.map(|_| merged));
                        });
                        *put_handlers.borrow_mut() = Some(handlers);
                    }
                    Err(e) => send(&reply, Err(e)),
                }
            }
        };
        let _get_handlers = RequestHandlers::new(&get_request, on_read);

        let result = receive(receiver).await;
        put_handlers.borrow_mut().take();
        result
    }

    async fn delete(&self, store: &str, key: &Key) -> Result<()> {
        trace!(database = %self.name, store, %key, "delete");
        let request = self
            .writing(store)?
            .delete(&key_to_js(key))
            .map_err(host_error)?;
        await_request(&request).await.map(|_| ())
    }

    async fn clear(&self, store: &str) -> Result<()> {
        debug!(database = %self.name, store, "clear");
        let request = self.writing(store)?.clear().map_err(host_error)?;
        await_request(&request).await.map(|_| ())
    }

    async fn count(&self, store: &str, query: &KeyQuery) -> Result<u64> {
        let object_store = self.reading(store)?;
        let request = match query_to_js(query)? {
            Some(query) => object_store.count_with_key(&query),
            None => object_store.count(),
        }
        .map_err(host_error)?;
        await_request(&request)
            .await?
            .as_f64()
            .map(|n| n as u64)
            .ok_or_else(|| StoreError::Conversion("count is not a number".into()))
    }

    fn close(&self) {
        if !self.closed.replace(true) {
            debug!(database = %self.name, "closing connection");
            self.db.close();
        }
    }
}

impl Drop for IdbConnection {
    fn drop(&mut self) {
        self.close();
    }
}
