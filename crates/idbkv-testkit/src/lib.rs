//! # idbkv Testkit
//!
//! Testing utilities for idbkv.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Fixtures**: a fresh in-process engine with unique database names
//! - **Generators**: Proptest strategies for keys and record values
//!
//! ## Test Fixtures
//!
//! ```rust
//! use idbkv_testkit::TestFixture;
//!
//! let fixture = TestFixture::new();
//! let a = fixture.unique_name("animals");
//! let b = fixture.unique_name("animals");
//! assert_ne!(a, b);
//! ```
//!
//! ## Property Testing
//!
//! ```rust,ignore
//! use proptest::prelude::*;
//! use idbkv_testkit::generators::key;
//!
//! proptest! {
//!     #[test]
//!     fn keys_are_totally_ordered(a in key(), b in key()) {
//!         prop_assert_eq!(a.cmp(&b), b.cmp(&a).reverse());
//!     }
//! }
//! ```

pub mod fixtures;
pub mod generators;

pub use fixtures::{init_tracing, TestFixture};
