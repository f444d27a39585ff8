//! Values that flow through a poll cycle.

use kiosk_whitelist::PackageId;
use serde::{Deserialize, Serialize};

/// Kind of a usage-log event, as reported by the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UsageEventKind {
    MovedToForeground,
    /// Newer platforms report resumes instead of foreground moves.
    ActivityResumed,
    MovedToBackground,
    ActivityPaused,
    /// Any other platform event code.
    Other(i32),
}

impl UsageEventKind {
    /// Whether this event means an app became the visible, active one.
    pub fn is_foreground_entry(&self) -> bool {
        matches!(self, Self::MovedToForeground | Self::ActivityResumed)
    }
}

/// One entry from the platform usage-event log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageEvent {
    pub kind: UsageEventKind,
    pub package: PackageId,
    pub timestamp_ms: i64,
}

impl UsageEvent {
    pub fn new(kind: UsageEventKind, package: impl Into<PackageId>, timestamp_ms: i64) -> Self {
        Self {
            kind,
            package: package.into(),
            timestamp_ms,
        }
    }

    pub fn foreground(package: impl Into<PackageId>, timestamp_ms: i64) -> Self {
        Self::new(UsageEventKind::MovedToForeground, package, timestamp_ms)
    }
}

/// Which strategy produced a foreground sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Detection {
    UsageEvents,
    RunningTasks,
}

/// The foreground package resolved for one cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForegroundSample {
    pub package: PackageId,
    pub observed_at_ms: i64,
    pub source: Detection,
}

/// Lower bound of the next usage-event query. Never moves backwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollCursor {
    last_checked_at_ms: i64,
}

impl PollCursor {
    pub fn starting_at(now_ms: i64) -> Self {
        Self {
            last_checked_at_ms: now_ms,
        }
    }

    pub fn last_checked_at_ms(&self) -> i64 {
        self.last_checked_at_ms
    }

    /// Start of the next query window: the last check minus the overlap.
    pub fn window_start(&self, overlap_ms: i64) -> i64 {
        self.last_checked_at_ms.saturating_sub(overlap_ms)
    }

    /// Advance to `now_ms`. A clock that stepped backwards leaves the cursor where it was.
    pub fn advance(&mut self, now_ms: i64) {
        self.last_checked_at_ms = self.last_checked_at_ms.max(now_ms);
    }
}

/// Last package the monitor blocked, and when.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlockMemo {
    pub last_blocked: Option<PackageId>,
    pub last_blocked_at_ms: i64,
}

impl BlockMemo {
    /// Whether `package` was blocked less than `window_ms` before `now_ms`.
    pub fn is_recent(&self, package: &PackageId, now_ms: i64, window_ms: i64) -> bool {
        self.last_blocked.as_ref() == Some(package)
            && now_ms.saturating_sub(self.last_blocked_at_ms) < window_ms
    }

    pub fn record(&mut self, package: PackageId, now_ms: i64) {
        self.last_blocked = Some(package);
        self.last_blocked_at_ms = now_ms;
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_foreground_entry_kinds() {
        assert!(UsageEventKind::MovedToForeground.is_foreground_entry());
        assert!(UsageEventKind::ActivityResumed.is_foreground_entry());
        assert!(!UsageEventKind::MovedToBackground.is_foreground_entry());
        assert!(!UsageEventKind::ActivityPaused.is_foreground_entry());
        assert!(!UsageEventKind::Other(23).is_foreground_entry());
    }

    #[test]
    fn test_cursor_never_regresses() {
        let mut cursor = PollCursor::starting_at(10_000);
        cursor.advance(10_300);
        assert_eq!(cursor.last_checked_at_ms(), 10_300);

        cursor.advance(9_000);
        assert_eq!(cursor.last_checked_at_ms(), 10_300);
        assert_eq!(cursor.window_start(2_000), 8_300);
    }

    #[test]
    fn test_memo_recency() {
        let mut memo = BlockMemo::default();
        let pkg = PackageId::from("com.other.app");
        assert!(!memo.is_recent(&pkg, 1_000, 2_000));

        memo.record(pkg.clone(), 1_000);
        assert!(memo.is_recent(&pkg, 2_999, 2_000));
        assert!(!memo.is_recent(&pkg, 3_000, 2_000));
        assert!(!memo.is_recent(&PackageId::from("com.third.app"), 1_500, 2_000));

        memo.clear();
        assert!(!memo.is_recent(&pkg, 1_500, 2_000));
    }
}
