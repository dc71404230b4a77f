//! # idbkv
//!
//! Minimal key-value storage over a host object-store engine, with a no-op
//! fallback for environments that have none.
//!
//! ## Overview
//!
//! - **Database**: a named, versioned collection of stores. Opened lazily on
//!   first use, once, and shared by all of its store handles.
//! - **Store**: one named key-value collection inside a database.
//! - **Upgrade**: raising the version with a changed store list deletes
//!   stores no longer listed and creates missing ones. Records in stores kept
//!   across versions survive.
//! - **Dummy**: a stand-in with the same API that persists nothing and never
//!   fails, picked by the selector when storage is unavailable or overridden.
//!
//! ## Usage
//!
//! ```rust
//! use idbkv::{Database, KeyQuery, Value};
//! use idbkv::engine::MemoryFactory;
//!
//! # tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(async {
//! let db = Database::new(MemoryFactory::new(), "animals", ["horses"])?;
//! let horses = db.store("horses");
//!
//! horses.put("silver", Value::object([("legs", 4)])).await?;
//! let (_, horse) = horses.update("silver", Value::object([("color", "grey")])).await?;
//! assert_eq!(horse.as_object().map(|o| o.len()), Some(2));
//! assert_eq!(horses.count(KeyQuery::All).await?, 1);
//!
//! db.close().await?;
//! # Ok::<(), idbkv::Error>(())
//! # }).unwrap();
//! ```
//!
//! ## Backends
//!
//! Any [`engine::Factory`] can back a [`Database`]. On `wasm32` with the `web`
//! feature, [`open_default`] picks the browser's IndexedDB or the dummy.
//! Elsewhere, [`engine::MemoryFactory`] provides the same semantics in
//! process.
//!
//! ## Re-exports
//!
//! - `idbkv::core` - Keys, ranges, values, merge and schema
//! - `idbkv::engine` - Engine contract and engines

pub mod callback;
pub mod config;
pub mod database;
pub mod dummy;
pub mod error;
pub mod select;
pub mod store;
pub mod traits;

// Re-export component crates
pub use idbkv_core as core;
pub use idbkv_store as engine;

pub use callback::{CallbackDatabase, CallbackStore};
pub use config::DatabaseConfig;
pub use database::Database;
pub use dummy::{DummyDatabase, DummyStore};
pub use error::{Error, Result};
pub use select::{select, AnyDatabase, AnyStore, BackendKind, Environment, FORCE_DUMMY_MARKER};
pub use store::Store;
pub use traits::{KeyValueDatabase, KeyValueStore};

#[cfg(all(target_arch = "wasm32", feature = "web"))]
pub use select::open_default;

pub use idbkv_core::{shallow_merge, Key, KeyQuery, KeyRange, Value};
