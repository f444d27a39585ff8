//! The fixed, never-persisted part of the whitelist.

use crate::PackageId;
use std::collections::BTreeSet;

/// Package ids that are always allowed regardless of user configuration:
/// system UI and the common home-screen launchers.
pub const SYSTEM_PACKAGES: &[&str] = &[
    "com.android.systemui",
    "com.miui.home",
    "com.mi.android.globallauncher",
    "com.android.launcher3",
    "com.google.android.apps.nexuslauncher",
];

/// System allowlist: [`SYSTEM_PACKAGES`] plus the kiosk's own package id.
///
/// Built once at startup. The kiosk can never block itself because its own
/// id is always a member.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SystemAllowlist {
    own_package: PackageId,
    packages: BTreeSet<PackageId>,
}

impl SystemAllowlist {
    pub fn new(own_package: PackageId) -> Self {
        let mut packages: BTreeSet<PackageId> =
            SYSTEM_PACKAGES.iter().map(|id| PackageId::from(*id)).collect();
        packages.insert(own_package.clone());

        Self {
            own_package,
            packages,
        }
    }

    /// Add an extra always-allowed package (e.g. a vendor launcher).
    pub fn with_extra<I, P>(mut self, extra: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PackageId>,
    {
        self.packages.extend(extra.into_iter().map(Into::into));
        self
    }

    pub fn own_package(&self) -> &PackageId {
        &self.own_package
    }

    pub fn contains(&self, package: &PackageId) -> bool {
        self.packages.contains(package)
    }

    pub fn packages(&self) -> &BTreeSet<PackageId> {
        &self.packages
    }

    pub fn iter(&self) -> impl Iterator<Item = &PackageId> {
        self.packages.iter()
    }
}
