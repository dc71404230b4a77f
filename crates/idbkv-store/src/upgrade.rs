//! Schema upgrades.
//!
//! Upgrades are a create/delete diff between the stores a database holds and
//! the stores its schema asks for. There is no data-migration hook: stores
//! kept across versions keep their records, deleted stores lose theirs.

use idbkv_core::{Schema, UpgradePlan};
use tracing::debug;

use crate::error::Result;

/// Something stores can be created in and deleted from during an upgrade.
pub trait UpgradeTarget {
    /// Names of the stores currently present.
    fn existing_stores(&self) -> Vec<String>;

    /// Create an empty store.
    fn create_store(&mut self, name: &str) -> Result<()>;

    /// Delete a store and its records.
    fn delete_store(&mut self, name: &str) -> Result<()>;
}

/// Reconcile `target`'s stores with `schema`.
///
/// Deletions run before creations. Returns the plan that was applied.
pub fn apply_upgrade<T>(schema: &Schema, old_version: u32, target: &mut T) -> Result<UpgradePlan>
where
    T: UpgradeTarget + ?Sized,
{
    let existing = target.existing_stores();
    let plan = schema.plan_upgrade(existing.iter().map(String::as_str));

    debug!(
        database = %schema.name,
        from = old_version,
        to = schema.version,
        create = plan.create.len(),
        delete = plan.delete.len(),
        "upgrading database"
    );

    for name in &plan.delete {
        debug!(database = %schema.name, store = %name, "deleting store");
        target.delete_store(name)?;
    }

    for name in &plan.create {
        debug!(database = %schema.name, store = %name, "creating store");
        target.create_store(name)?;
    }

    Ok(plan)
}
