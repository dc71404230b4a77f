//! # idbkv Store
//!
//! Host object-store engines for idbkv. Provides the trait-based engine
//! contract with an IndexedDB implementation for browsers and an in-process
//! implementation for native targets and tests.
//!
//! ## Overview
//!
//! An engine is a [`Factory`] that opens versioned, named databases. Each
//! open database is a [`Connection`] running single-store transactions. Both
//! engines share the upgrade logic in [`apply_upgrade`], which reconciles a
//! database's stores with its [`Schema`](idbkv_core::Schema) whenever the
//! requested version is higher than the stored one.
//!
//! ## Key Types
//!
//! - [`Factory`] - Opens and deletes databases
//! - [`Connection`] - Record operations on an open database
//! - [`MemoryFactory`] - In-process engine with IndexedDB semantics
//! - `IdbFactory` - Browser IndexedDB engine (wasm32 with the `web` feature)
//! - [`StoreError`] - Engine failures
//!
//! ## Usage
//!
//! ```rust,no_run
//! use idbkv_core::{Key, Schema, Value};
//! use idbkv_store::{Connection, Factory, MemoryFactory};
//!
//! async fn example() -> idbkv_store::Result<()> {
//!     let factory = MemoryFactory::new();
//!     let schema = Schema::new("notes", ["drafts"], 1)?;
//!     let conn = factory.open(&schema).await?;
//!
//!     conn.put("drafts", &Key::from("a"), &Value::from("hello")).await?;
//!     let value = conn.get("drafts", &Key::from("a")).await?;
//!     assert_eq!(value, Some(Value::from("hello")));
//!     Ok(())
//! }
//! ```
//!
//! ## Design Notes
//!
//! - **Single-store transactions**: every operation is its own transaction
//! - **Atomic update**: the read and write of an update share a transaction
//! - **Upgrade by diff**: stores are created and deleted, never migrated

pub mod error;
pub mod memory;
pub mod traits;
pub mod upgrade;

#[cfg(all(target_arch = "wasm32", feature = "web"))]
pub mod idb;

pub use error::{Result, StoreError};
pub use memory::{MemoryConnection, MemoryFactory};
pub use traits::{Connection, Factory};
pub use upgrade::{apply_upgrade, UpgradeTarget};

#[cfg(all(target_arch = "wasm32", feature = "web"))]
pub use idb::{IdbConnection, IdbFactory};
