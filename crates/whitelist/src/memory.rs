use crate::{PackageId, Result, SystemAllowlist, WhitelistEditor, WhitelistError, WhitelistStore};
use std::collections::BTreeSet;
use std::sync::RwLock;

/// Non-persistent whitelist, for tests and for running without a database.
#[derive(Debug)]
pub struct InMemoryWhitelist {
    system: SystemAllowlist,
    user: RwLock<BTreeSet<PackageId>>,
}

impl InMemoryWhitelist {
    pub fn new(system: SystemAllowlist) -> Self {
        Self {
            system,
            user: RwLock::new(BTreeSet::new()),
        }
    }

    pub fn with_user<I, P>(system: SystemAllowlist, user: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PackageId>,
    {
        let user = user
            .into_iter()
            .map(Into::into)
            .filter(|id| !system.contains(id))
            .collect();
        Self {
            system,
            user: RwLock::new(user),
        }
    }
}

impl WhitelistStore for InMemoryWhitelist {
    fn system(&self) -> &SystemAllowlist {
        &self.system
    }

    fn list_user_allowed(&self) -> Result<BTreeSet<PackageId>> {
        let guard = self.user.read().map_err(|_| WhitelistError::Poisoned)?;
        Ok(guard.clone())
    }

    fn is_allowed(&self, package: &PackageId) -> Result<bool> {
        if self.system.contains(package) {
            return Ok(true);
        }
        let guard = self.user.read().map_err(|_| WhitelistError::Poisoned)?;
        Ok(guard.contains(package))
    }
}

impl WhitelistEditor for InMemoryWhitelist {
    fn replace(&self, packages: BTreeSet<PackageId>) -> Result<()> {
        let mut guard = self.user.write().map_err(|_| WhitelistError::Poisoned)?;
        *guard = packages
            .into_iter()
            .filter(|id| !self.system.contains(id))
            .collect();
        tracing::debug!(count = guard.len(), "user whitelist replaced");
        Ok(())
    }
}
