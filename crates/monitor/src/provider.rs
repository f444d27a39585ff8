//! Provider traits for the platform side of the monitor.
//!
//! These traits abstract platform-specific implementations,
//! allowing the polling and decision logic to remain pure and testable.

use crate::enforcement::BlockRequest;
use crate::state::UsageEvent;
use kiosk_whitelist::PackageId;
use std::sync::Arc;
use thiserror::Error;

/// Failure of a platform call. Always transient from the monitor's view.
#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    /// The user has not granted the permission this source needs.
    #[error("permission not granted: {0}")]
    PermissionDenied(String),

    /// The platform does not offer this capability.
    #[error("not supported on this platform")]
    Unsupported,

    /// The platform call itself failed.
    #[error("platform call failed: {0}")]
    Platform(String),
}

/// Primary foreground source: the platform usage-event log.
pub trait UsageEventSource: Send + Sync {
    /// Events in `[start_ms, end_ms)`, oldest first.
    fn query_events(&self, start_ms: i64, end_ms: i64) -> Result<Vec<UsageEvent>, ProviderError>;
}

/// Fallback foreground source: the list of running top-level tasks.
pub trait RunningTaskSource: Send + Sync {
    /// Owning package of the top-most task, if the platform still exposes it.
    fn top_task_package(&self) -> Result<Option<PackageId>, ProviderError>;
}

/// Launcher for the blocking surface.
///
/// `present` must bring the surface to the front immediately, route back
/// navigation to the home surface and leave no history entry for the
/// interrupted app. It is fire-and-forget: `Ok` means the launch was handed
/// to the platform, not that the user saw it.
pub trait BlockingSurface: Send + Sync {
    fn present(&self, request: &BlockRequest) -> Result<(), ProviderError>;

    /// Packages `present` may bring to the front. They belong in the system
    /// allowlist, or the monitor would block its own exit.
    fn home_packages(&self) -> Vec<PackageId> {
        Vec::new()
    }
}

pub type UsageEventSourceRef = Arc<dyn UsageEventSource>;
pub type RunningTaskSourceRef = Arc<dyn RunningTaskSource>;
pub type BlockingSurfaceRef = Arc<dyn BlockingSurface>;

/// Null implementation for testing or unsupported platforms.
pub struct NullProvider;

impl NullProvider {
    pub fn new() -> Self {
        Self
    }
}

impl Default for NullProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl UsageEventSource for NullProvider {
    fn query_events(&self, _start_ms: i64, _end_ms: i64) -> Result<Vec<UsageEvent>, ProviderError> {
        Ok(Vec::new())
    }
}

impl RunningTaskSource for NullProvider {
    fn top_task_package(&self) -> Result<Option<PackageId>, ProviderError> {
        Ok(None)
    }
}

impl BlockingSurface for NullProvider {
    fn present(&self, request: &BlockRequest) -> Result<(), ProviderError> {
        tracing::warn!(package = %request.package, "no blocking surface on this platform");
        Ok(())
    }
}
