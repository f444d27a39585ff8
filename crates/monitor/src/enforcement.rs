//! Enforcement: hand a denied package to the blocking surface.

use crate::provider::{BlockingSurfaceRef, ProviderError};
use kiosk_whitelist::PackageId;
use serde::{Deserialize, Serialize};

/// Payload carried to the blocking surface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockRequest {
    /// The denied package, shown on the blocking surface.
    pub package: PackageId,
    pub requested_at_ms: i64,
}

/// Fires the blocking surface for denied packages.
#[derive(Clone)]
pub struct Enforcer {
    surface: BlockingSurfaceRef,
}

impl Enforcer {
    pub fn new(surface: BlockingSurfaceRef) -> Self {
        Self { surface }
    }

    /// Launch the blocking surface for `package`. Does not wait for the UI.
    pub fn trigger(&self, package: &PackageId, now_ms: i64) -> Result<BlockRequest, ProviderError> {
        let request = BlockRequest {
            package: package.clone(),
            requested_at_ms: now_ms,
        };

        tracing::warn!(package = %package, "blocking non-whitelisted app");
        self.surface.present(&request)?;
        Ok(request)
    }
}

/// Resolves a human-readable app name for a package.
pub trait AppLabelResolver: Send + Sync {
    fn label(&self, package: &PackageId) -> Option<String>;
}

/// Resolver that knows no labels; the notice falls back to the package id.
pub struct NoLabels;

impl AppLabelResolver for NoLabels {
    fn label(&self, _package: &PackageId) -> Option<String> {
        None
    }
}

/// The only ways off the blocking surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockerExit {
    GoHome,
    LockDevice,
}

/// What the blocking surface shows for one request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockNotice {
    pub package: PackageId,
    pub app_label: String,
}

impl BlockNotice {
    pub const UNKNOWN_APP: &'static str = "Unknown App";

    pub fn new(request: &BlockRequest, resolver: &dyn AppLabelResolver) -> Self {
        let app_label = resolver
            .label(&request.package)
            .filter(|label| !label.trim().is_empty())
            .unwrap_or_else(|| {
                if request.package.is_empty() {
                    Self::UNKNOWN_APP.to_string()
                } else {
                    request.package.to_string()
                }
            });

        Self {
            package: request.package.clone(),
            app_label,
        }
    }

    pub fn message(&self) -> String {
        format!("Access Blocked!\n\n\"{}\" is not allowed.", self.app_label)
    }

    pub fn exits(&self) -> [BlockerExit; 2] {
        [BlockerExit::GoHome, BlockerExit::LockDevice]
    }

    /// Back navigation never returns to the blocked app.
    pub fn on_back(&self) -> BlockerExit {
        BlockerExit::GoHome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scripted::RecordingSurface;
    use std::collections::HashMap;
    use std::sync::Arc;

    struct MapLabels(HashMap<&'static str, &'static str>);

    impl AppLabelResolver for MapLabels {
        fn label(&self, package: &PackageId) -> Option<String> {
            self.0.get(package.as_str()).map(|s| s.to_string())
        }
    }

    fn request(package: &str) -> BlockRequest {
        BlockRequest {
            package: PackageId::from(package),
            requested_at_ms: 1_000,
        }
    }

    #[test]
    fn test_trigger_presents_payload() {
        let surface = Arc::new(RecordingSurface::new());
        let enforcer = Enforcer::new(surface.clone());

        let sent = enforcer.trigger(&PackageId::from("com.other.app"), 4_200).unwrap();
        assert_eq!(surface.presented(), vec![sent.clone()]);
        assert_eq!(sent.requested_at_ms, 4_200);
    }

    #[test]
    fn test_trigger_surfaces_launch_failure() {
        let surface = Arc::new(RecordingSurface::new());
        surface.fail_next(ProviderError::Platform("activity start refused".into()));
        let enforcer = Enforcer::new(surface.clone());

        assert!(enforcer.trigger(&PackageId::from("com.other.app"), 1).is_err());
        assert_eq!(surface.len(), 1);
    }

    #[test]
    fn test_notice_uses_resolved_label() {
        let labels = MapLabels(HashMap::from([("com.other.app", "Other")]));
        let notice = BlockNotice::new(&request("com.other.app"), &labels);
        assert_eq!(notice.app_label, "Other");
        assert_eq!(notice.message(), "Access Blocked!\n\n\"Other\" is not allowed.");
    }

    #[test]
    fn test_notice_falls_back_to_package_id() {
        let notice = BlockNotice::new(&request("com.other.app"), &NoLabels);
        assert_eq!(notice.app_label, "com.other.app");

        let labels = MapLabels(HashMap::from([("com.other.app", "  ")]));
        let notice = BlockNotice::new(&request("com.other.app"), &labels);
        assert_eq!(notice.app_label, "com.other.app");

        let notice = BlockNotice::new(&request(""), &NoLabels);
        assert_eq!(notice.app_label, BlockNotice::UNKNOWN_APP);
    }

    #[test]
    fn test_back_goes_home() {
        let notice = BlockNotice::new(&request("com.other.app"), &NoLabels);
        assert_eq!(notice.on_back(), BlockerExit::GoHome);
        assert_eq!(notice.exits(), [BlockerExit::GoHome, BlockerExit::LockDevice]);
    }
}
