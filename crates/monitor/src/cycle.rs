//! One poll cycle: detect, decide, maybe act.

use crate::clock::ClockRef;
use crate::decision::{AllowReason, DecisionEngine, Verdict};
use crate::enforcement::Enforcer;
use crate::observer::ForegroundObserver;
use crate::state::PollCursor;
use kiosk_whitelist::PackageId;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Event emitted to monitor listeners.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type")]
pub enum MonitorEvent {
    Started,
    Stopped,
    Blocked { package: PackageId, at_ms: i64 },
}

/// Callback type for monitor events.
pub type MonitorCallback = Arc<dyn Fn(MonitorEvent) + Send + Sync + 'static>;

/// What a single cycle did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// Nothing came to the foreground, or no source could tell.
    NoDetermination,
    Allowed {
        package: PackageId,
        reason: AllowReason,
    },
    Blocked {
        package: PackageId,
    },
    /// Denied, but the blocking surface failed to launch.
    BlockFailed {
        package: PackageId,
    },
    /// The whitelist could not be read; no action taken.
    Failed,
}

/// State and collaborators of a running monitor.
///
/// Built fresh on every start, so the cursor and block memo never outlive
/// one run.
pub struct CheckCycle {
    clock: ClockRef,
    observer: ForegroundObserver,
    engine: DecisionEngine,
    enforcer: Enforcer,
    callback: Option<MonitorCallback>,
}

impl CheckCycle {
    pub fn new(
        clock: ClockRef,
        observer: ForegroundObserver,
        engine: DecisionEngine,
        enforcer: Enforcer,
    ) -> Self {
        Self {
            clock,
            observer,
            engine,
            enforcer,
            callback: None,
        }
    }

    pub fn with_callback(mut self, callback: MonitorCallback) -> Self {
        self.callback = Some(callback);
        self
    }

    pub fn cursor(&self) -> PollCursor {
        self.observer.cursor()
    }

    pub fn engine(&self) -> &DecisionEngine {
        &self.engine
    }

    pub fn run_once(&mut self) -> CycleOutcome {
        let now_ms = self.clock.now_ms();

        let Some(sample) = self.observer.observe(now_ms) else {
            return CycleOutcome::NoDetermination;
        };
        let package = sample.package;
        tracing::trace!(package = %package, source = ?sample.source, "foreground app");

        let verdict = match self.engine.decide(&package, now_ms) {
            Ok(verdict) => verdict,
            Err(e) => {
                tracing::error!(package = %package, error = %e, "whitelist read failed, skipping cycle");
                return CycleOutcome::Failed;
            }
        };

        match verdict {
            Verdict::Allow(reason) => CycleOutcome::Allowed { package, reason },
            Verdict::Deny => self.enforce(package, now_ms),
        }
    }

    fn enforce(&mut self, package: PackageId, now_ms: i64) -> CycleOutcome {
        match self.enforcer.trigger(&package, now_ms) {
            Ok(_) => {
                if let Some(callback) = &self.callback {
                    callback(MonitorEvent::Blocked {
                        package: package.clone(),
                        at_ms: now_ms,
                    });
                }
                CycleOutcome::Blocked { package }
            }
            Err(e) => {
                // The memo already holds this block; no retry until the debounce lapses.
                tracing::error!(package = %package, error = %e, "failed to present blocking surface");
                CycleOutcome::BlockFailed { package }
            }
        }
    }
}
