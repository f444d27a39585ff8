//! Scripted providers for tests and replays.
//!
//! These capture every call for later inspection, the same way an in-memory
//! event bus captures emitted events.

use crate::enforcement::BlockRequest;
use crate::provider::{BlockingSurface, ProviderError, RunningTaskSource, UsageEventSource};
use crate::state::UsageEvent;
use kiosk_whitelist::PackageId;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

/// Usage-event log backed by a vector. Queries return the events that fall
/// inside the requested window, so overlapping windows re-deliver events the
/// way the real log does.
#[derive(Default)]
pub struct ScriptedEventSource {
    events: Mutex<Vec<UsageEvent>>,
    queries: Mutex<Vec<(i64, i64)>>,
    failures: Mutex<VecDeque<ProviderError>>,
    delay: Mutex<Option<Duration>>,
}

impl ScriptedEventSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an event to the log.
    pub fn push(&self, event: UsageEvent) {
        self.events.lock().unwrap().push(event);
    }

    /// Make the next query fail with `err`. Calls stack up in order.
    pub fn fail_next(&self, err: ProviderError) {
        self.failures.lock().unwrap().push_back(err);
    }

    /// Block every query for `delay` before answering.
    pub fn set_delay(&self, delay: Option<Duration>) {
        *self.delay.lock().unwrap() = delay;
    }

    /// All `(start, end)` windows queried so far.
    pub fn queries(&self) -> Vec<(i64, i64)> {
        self.queries.lock().unwrap().clone()
    }

    pub fn query_count(&self) -> usize {
        self.queries.lock().unwrap().len()
    }
}

impl UsageEventSource for ScriptedEventSource {
    fn query_events(&self, start_ms: i64, end_ms: i64) -> Result<Vec<UsageEvent>, ProviderError> {
        self.queries.lock().unwrap().push((start_ms, end_ms));

        let delay = *self.delay.lock().unwrap();
        if let Some(delay) = delay {
            std::thread::sleep(delay);
        }

        if let Some(err) = self.failures.lock().unwrap().pop_front() {
            return Err(err);
        }

        let mut events: Vec<UsageEvent> = self
            .events
            .lock()
            .unwrap()
            .iter()
            .filter(|e| e.timestamp_ms >= start_ms && e.timestamp_ms < end_ms)
            .cloned()
            .collect();
        events.sort_by_key(|e| e.timestamp_ms);
        Ok(events)
    }
}

/// Running-task list with a settable top task.
#[derive(Default)]
pub struct ScriptedTaskSource {
    top: Mutex<Option<PackageId>>,
    error: Mutex<Option<ProviderError>>,
}

impl ScriptedTaskSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_top(&self, package: Option<&str>) {
        *self.top.lock().unwrap() = package.map(PackageId::from);
    }

    /// Fail every lookup with `err` until cleared with [`Self::recover`].
    pub fn fail_with(&self, err: ProviderError) {
        *self.error.lock().unwrap() = Some(err);
    }

    pub fn recover(&self) {
        *self.error.lock().unwrap() = None;
    }
}

impl RunningTaskSource for ScriptedTaskSource {
    fn top_task_package(&self) -> Result<Option<PackageId>, ProviderError> {
        if let Some(err) = self.error.lock().unwrap().clone() {
            return Err(err);
        }
        Ok(self.top.lock().unwrap().clone())
    }
}

/// Blocking surface that records every presentation.
#[derive(Default)]
pub struct RecordingSurface {
    presented: Mutex<Vec<BlockRequest>>,
    failures: Mutex<VecDeque<ProviderError>>,
    home: Vec<PackageId>,
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// Report `packages` as the surfaces a block redirects to.
    pub fn with_home<I, P>(mut self, packages: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PackageId>,
    {
        self.home = packages.into_iter().map(Into::into).collect();
        self
    }

    pub fn fail_next(&self, err: ProviderError) {
        self.failures.lock().unwrap().push_back(err);
    }

    /// Every request passed to `present`, including failed ones.
    pub fn presented(&self) -> Vec<BlockRequest> {
        self.presented.lock().unwrap().clone()
    }

    pub fn presented_packages(&self) -> Vec<String> {
        self.presented
            .lock()
            .unwrap()
            .iter()
            .map(|r| r.package.to_string())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.presented.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.presented.lock().unwrap().is_empty()
    }
}

impl BlockingSurface for RecordingSurface {
    fn present(&self, request: &BlockRequest) -> Result<(), ProviderError> {
        self.presented.lock().unwrap().push(request.clone());
        match self.failures.lock().unwrap().pop_front() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn home_packages(&self) -> Vec<PackageId> {
        self.home.clone()
    }
}
