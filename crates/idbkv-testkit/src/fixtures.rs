//! Test fixtures and helpers.
//!
//! Common setup code for integration tests.

use std::cell::Cell;

use idbkv_core::Schema;
use idbkv_store::MemoryFactory;

/// A fresh in-process engine plus a name generator.
#[derive(Default)]
pub struct TestFixture {
    pub factory: MemoryFactory,
    counter: Cell<u32>,
}

impl TestFixture {
    /// Create a new fixture with an empty engine.
    pub fn new() -> Self {
        Self::default()
    }

    /// A database name not yet handed out by this fixture.
    pub fn unique_name(&self, prefix: &str) -> String {
        let n = self.counter.get();
        self.counter.set(n + 1);
        format!("{prefix}-{n}")
    }

    /// A valid schema with a unique name.
    pub fn schema(&self, prefix: &str, stores: &[&str], version: u32) -> Schema {
        Schema::new(self.unique_name(prefix), stores.iter().copied(), version)
            .expect("fixture schema is valid")
    }

    /// Another handle to the same engine, as a second tab would have.
    pub fn factory(&self) -> MemoryFactory {
        self.factory.clone()
    }
}

/// Install a fmt subscriber writing through the test harness.
///
/// Safe to call from every test; only the first call installs.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}
