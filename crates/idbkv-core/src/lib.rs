//! # idbkv Core
//!
//! Pure data model for idbkv: keys, key ranges, record values and schemas.
//!
//! This crate contains no I/O and no host bindings. Storage engines in
//! `idbkv-store` and the handles in `idbkv` are built on top of it.
//!
//! ## Key Types
//!
//! - [`Key`] - A record key, ordered the way the host object-store engine orders keys
//! - [`KeyRange`] / [`KeyQuery`] - Key selection for counting
//! - [`Value`] - A structured record value
//! - [`Schema`] - Database name, desired store set and version
//! - [`UpgradePlan`] - Stores to create and delete when the version is raised
//!
//! ## Merging
//!
//! `update` operations merge a partial object onto the stored record with
//! [`shallow_merge`]. Only top-level fields are merged.

pub mod error;
pub mod key;
pub mod merge;
pub mod range;
pub mod schema;
pub mod value;

pub use error::{CoreError, Result};
pub use key::{Key, MAX_SAFE_INTEGER};
pub use merge::shallow_merge;
pub use range::{KeyQuery, KeyRange};
pub use schema::{Schema, UpgradePlan, DEFAULT_VERSION};
pub use value::Value;
