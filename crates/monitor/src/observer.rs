//! Foreground detection: usage-event log first, running tasks as fallback.

use crate::provider::{RunningTaskSourceRef, UsageEventSourceRef};
use crate::state::{Detection, ForegroundSample, PollCursor, UsageEvent};
use kiosk_whitelist::PackageId;

/// Resolves which app came to the foreground since the previous cycle.
///
/// Owns the [`PollCursor`]; only the polling thread touches it.
pub struct ForegroundObserver {
    events: UsageEventSourceRef,
    tasks: RunningTaskSourceRef,
    cursor: PollCursor,
    overlap_ms: i64,
}

impl ForegroundObserver {
    pub fn new(
        events: UsageEventSourceRef,
        tasks: RunningTaskSourceRef,
        overlap_ms: i64,
        start_ms: i64,
    ) -> Self {
        Self {
            events,
            tasks,
            cursor: PollCursor::starting_at(start_ms),
            overlap_ms,
        }
    }

    pub fn cursor(&self) -> PollCursor {
        self.cursor
    }

    /// Resolve the foreground package for the window ending at `now_ms`.
    ///
    /// `None` means no determination this cycle; it is never an error.
    pub fn observe(&mut self, now_ms: i64) -> Option<ForegroundSample> {
        if let Some(package) = self.from_usage_events(now_ms) {
            return Some(ForegroundSample {
                package,
                observed_at_ms: now_ms,
                source: Detection::UsageEvents,
            });
        }

        self.from_running_tasks().map(|package| ForegroundSample {
            package,
            observed_at_ms: now_ms,
            source: Detection::RunningTasks,
        })
    }

    fn from_usage_events(&mut self, now_ms: i64) -> Option<PackageId> {
        let start_ms = self.cursor.window_start(self.overlap_ms);

        match self.events.query_events(start_ms, now_ms) {
            Ok(events) => {
                // Cursor moves on any successful query, match or not.
                self.cursor.advance(now_ms);
                last_foreground_entry(&events, start_ms, now_ms)
            }
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    cursor_ms = self.cursor.last_checked_at_ms(),
                    "usage event query failed, keeping cursor"
                );
                None
            }
        }
    }

    fn from_running_tasks(&self) -> Option<PackageId> {
        match self.tasks.top_task_package() {
            Ok(package) => package,
            Err(e) => {
                tracing::debug!(error = %e, "running task lookup unavailable");
                None
            }
        }
    }
}

/// Latest foreground entry inside `[start_ms, end_ms)`.
///
/// Events are scanned in order; later entries supersede earlier ones.
fn last_foreground_entry(events: &[UsageEvent], start_ms: i64, end_ms: i64) -> Option<PackageId> {
    events
        .iter()
        .filter(|e| e.kind.is_foreground_entry())
        .filter(|e| e.timestamp_ms >= start_ms && e.timestamp_ms < end_ms)
        .last()
        .map(|e| e.package.clone())
}
