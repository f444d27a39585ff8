use crate::{PackageId, Result, SystemAllowlist};
use std::collections::BTreeSet;
use std::sync::Arc;

/// Read side of the whitelist, consumed by the monitor.
///
/// Implementations are shared between the polling thread and whatever edits
/// the whitelist, so every call must return a fresh snapshot.
pub trait WhitelistStore: Send + Sync {
    /// The fixed system subset this store was built with.
    fn system(&self) -> &SystemAllowlist;

    /// User-selected packages only. Never contains system packages.
    fn list_user_allowed(&self) -> Result<BTreeSet<PackageId>>;

    /// Effective membership: system subset or user subset.
    fn is_allowed(&self, package: &PackageId) -> Result<bool> {
        if self.system().contains(package) {
            return Ok(true);
        }
        Ok(self.list_user_allowed()?.contains(package))
    }

    /// Effective whitelist: system subset ∪ user subset.
    fn list_allowed(&self) -> Result<BTreeSet<PackageId>> {
        let mut all = self.list_user_allowed()?;
        all.extend(self.system().iter().cloned());
        Ok(all)
    }
}

/// Write side of the whitelist, used by the operator-facing surfaces.
///
/// System packages are accepted by `add` but never stored.
pub trait WhitelistEditor: WhitelistStore {
    /// Replace the whole user subset.
    fn replace(&self, packages: BTreeSet<PackageId>) -> Result<()>;

    fn add(&self, package: &PackageId) -> Result<()> {
        let mut current = self.list_user_allowed()?;
        if self.system().contains(package) || !current.insert(package.clone()) {
            return Ok(());
        }
        self.replace(current)
    }

    fn remove(&self, package: &PackageId) -> Result<()> {
        let mut current = self.list_user_allowed()?;
        if !current.remove(package) {
            return Ok(());
        }
        self.replace(current)
    }

    fn clear(&self) -> Result<()> {
        self.replace(BTreeSet::new())
    }
}

/// Shared store handle held by the monitor.
pub type WhitelistStoreRef = Arc<dyn WhitelistStore>;
