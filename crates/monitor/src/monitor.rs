//! Start/stop surface of the kiosk monitor.

use crate::clock::{ClockRef, SystemClock};
use crate::config::{ConfigError, MonitorConfig};
use crate::cycle::{CheckCycle, MonitorCallback, MonitorEvent};
use crate::decision::DecisionEngine;
use crate::enforcement::Enforcer;
use crate::observer::ForegroundObserver;
use crate::poller::PollScheduler;
use crate::provider::{BlockingSurfaceRef, RunningTaskSourceRef, UsageEventSourceRef};
use kiosk_whitelist::WhitelistStoreRef;
use std::sync::Arc;

/// The kiosk monitor: wires observer, decision engine and enforcer onto a
/// [`PollScheduler`].
pub struct KioskMonitor {
    config: MonitorConfig,
    clock: ClockRef,
    events: UsageEventSourceRef,
    tasks: RunningTaskSourceRef,
    surface: BlockingSurfaceRef,
    store: WhitelistStoreRef,
    callback: Option<MonitorCallback>,
    scheduler: PollScheduler,
}

impl KioskMonitor {
    pub fn new(
        config: MonitorConfig,
        events: UsageEventSourceRef,
        tasks: RunningTaskSourceRef,
        surface: BlockingSurfaceRef,
        store: WhitelistStoreRef,
    ) -> Result<Self, ConfigError> {
        config.validate()?;

        let unprotected: Vec<_> = surface
            .home_packages()
            .into_iter()
            .filter(|package| !store.system().contains(package))
            .collect();
        if !unprotected.is_empty() {
            tracing::warn!(
                packages = ?unprotected,
                "blocking surface redirects to packages outside the system allowlist"
            );
        }

        Ok(Self {
            config,
            clock: Arc::new(SystemClock),
            events,
            tasks,
            surface,
            store,
            callback: None,
            scheduler: PollScheduler::new(),
        })
    }

    pub fn with_clock(mut self, clock: ClockRef) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_callback(mut self, callback: MonitorCallback) -> Self {
        self.callback = Some(callback);
        self
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    /// Start monitoring. No effect if already running.
    ///
    /// Every start begins with an empty block memo and a cursor at "now".
    pub fn start(&mut self) {
        if self.scheduler.is_running() {
            tracing::debug!("monitor already running");
            return;
        }

        let mut cycle = self.build_cycle();
        self.scheduler.start(self.config.poll_interval(), move || {
            cycle.run_once();
        });

        if self.scheduler.is_running() {
            tracing::info!(
                own_package = %self.store.system().own_package(),
                interval_ms = self.config.poll_interval_ms,
                "kiosk monitor started"
            );
            self.emit(MonitorEvent::Started);
        }
    }

    /// Stop monitoring. No effect if already stopped.
    pub fn stop(&mut self) {
        if !self.scheduler.is_running() {
            return;
        }
        self.scheduler.stop();
        tracing::info!("kiosk monitor stopped");
        self.emit(MonitorEvent::Stopped);
    }

    pub fn is_running(&self) -> bool {
        self.scheduler.is_running()
    }

    fn build_cycle(&self) -> CheckCycle {
        let observer = ForegroundObserver::new(
            Arc::clone(&self.events),
            Arc::clone(&self.tasks),
            self.config.overlap_ms(),
            self.clock.now_ms(),
        );
        let engine = DecisionEngine::new(
            Arc::clone(&self.store),
            self.config.debounce_ms(),
        );
        let cycle = CheckCycle::new(
            Arc::clone(&self.clock),
            observer,
            engine,
            Enforcer::new(Arc::clone(&self.surface)),
        );

        match &self.callback {
            Some(callback) => cycle.with_callback(Arc::clone(callback)),
            None => cycle,
        }
    }

    fn emit(&self, event: MonitorEvent) {
        if let Some(callback) = &self.callback {
            callback(event);
        }
    }
}

impl Drop for KioskMonitor {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::NullProvider;
    use kiosk_whitelist::{InMemoryWhitelist, PackageId, SystemAllowlist};
    use std::sync::Mutex;
    use std::time::Duration;

    fn null_monitor(config: MonitorConfig) -> Result<KioskMonitor, ConfigError> {
        let provider = Arc::new(NullProvider);
        let store = Arc::new(InMemoryWhitelist::new(SystemAllowlist::new(PackageId::from(
            "com.kiosk.kioskmode",
        ))));
        KioskMonitor::new(config, provider.clone(), provider.clone(), provider, store)
    }

    #[test]
    fn test_monitor_lifecycle() {
        let events = Arc::new(Mutex::new(Vec::new()));
        let events_clone = Arc::clone(&events);
        let callback: MonitorCallback = Arc::new(move |event: MonitorEvent| {
            events_clone.lock().unwrap().push(event);
        });

        let mut monitor = null_monitor(MonitorConfig {
            poll_interval_ms: 100,
            ..Default::default()
        })
        .unwrap()
        .with_callback(callback);
        assert!(!monitor.is_running());

        monitor.start();
        monitor.start();
        assert!(monitor.is_running());
        std::thread::sleep(Duration::from_millis(50));

        monitor.stop();
        monitor.stop();
        assert!(!monitor.is_running());

        assert_eq!(
            *events.lock().unwrap(),
            vec![MonitorEvent::Started, MonitorEvent::Stopped]
        );
    }

    #[test]
    fn test_invalid_config_rejected() {
        let result = null_monitor(MonitorConfig {
            poll_interval_ms: 500,
            debounce_window_ms: 1_000,
            ..Default::default()
        });
        assert!(matches!(result, Err(ConfigError::DebounceTooShort { .. })));
    }
}
