//! Foreground monitor and enforcement engine for kiosk mode.
//!
//! This crate keeps a device on a fixed set of permitted apps. Every poll
//! cycle it:
//! - asks the platform which app came to the foreground
//! - checks that app against the system allowlist and the user whitelist
//! - launches the blocking surface for anything else, once per debounce window
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     Domain Layer                             │
//! │  state.rs    - UsageEvent, PollCursor, BlockMemo            │
//! │  decision.rs - Allow/deny verdicts and debounce (pure)      │
//! │  provider.rs - Traits for platform event/task sources       │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                  Infrastructure Layer                        │
//! │  platform/macos.rs - macOS-specific implementation          │
//! │  scripted.rs       - Scripted providers for tests           │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                   Application Layer                          │
//! │  observer.rs - Two-strategy foreground detection            │
//! │  cycle.rs    - detect → decide → enforce                    │
//! │  poller.rs   - Single-flight background scheduling          │
//! │  monitor.rs  - start / stop / is_running                    │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```ignore
//! use kiosk_monitor::{platform::PlatformProvider, KioskMonitor, MonitorConfig};
//! use kiosk_whitelist::{InMemoryWhitelist, PackageId, SystemAllowlist};
//! use std::sync::Arc;
//!
//! let provider = Arc::new(PlatformProvider::new());
//! let store = Arc::new(InMemoryWhitelist::new(SystemAllowlist::new(
//!     PackageId::from("com.kiosk.kioskmode"),
//! )));
//!
//! let mut monitor = KioskMonitor::new(
//!     MonitorConfig::default(),
//!     provider.clone(),
//!     provider.clone(),
//!     provider,
//!     store,
//! )?;
//! monitor.start();
//! ```

mod clock;
mod config;
mod cycle;
mod decision;
mod enforcement;
mod monitor;
mod observer;
mod poller;
mod provider;
mod state;

pub mod platform;
pub mod scripted;

pub use clock::{Clock, ClockRef, ManualClock, SystemClock};
pub use config::{
    ConfigError, MonitorConfig, DEFAULT_DEBOUNCE_WINDOW, DEFAULT_LOOKBACK_OVERLAP,
    DEFAULT_POLL_INTERVAL,
};
pub use cycle::{CheckCycle, CycleOutcome, MonitorCallback, MonitorEvent};
pub use decision::{AllowReason, DecisionEngine, Verdict};
pub use enforcement::{AppLabelResolver, BlockNotice, BlockRequest, BlockerExit, Enforcer, NoLabels};
pub use monitor::KioskMonitor;
pub use observer::ForegroundObserver;
pub use poller::PollScheduler;
pub use provider::{
    BlockingSurface, BlockingSurfaceRef, NullProvider, ProviderError, RunningTaskSource,
    RunningTaskSourceRef, UsageEventSource, UsageEventSourceRef,
};
pub use state::{BlockMemo, Detection, ForegroundSample, PollCursor, UsageEvent, UsageEventKind};
