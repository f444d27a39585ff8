//! Monitor timing configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Default delay between the end of one cycle and the start of the next.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(300);

/// Default look-back overlap added in front of each usage-event window.
pub const DEFAULT_LOOKBACK_OVERLAP: Duration = Duration::from_millis(1500);

/// Default minimum time between two blocks of the same package.
pub const DEFAULT_DEBOUNCE_WINDOW: Duration = Duration::from_millis(2000);

/// Accepted poll interval range, in milliseconds.
pub const MIN_POLL_INTERVAL_MS: u64 = 100;
pub const MAX_POLL_INTERVAL_MS: u64 = 1000;

/// The debounce window must cover at least this many poll intervals.
pub const MIN_DEBOUNCE_INTERVALS: u64 = 4;

/// Upper bounds for the millisecond settings.
pub const MAX_LOOKBACK_OVERLAP_MS: u64 = 5_000;
pub const MAX_DEBOUNCE_WINDOW_MS: u64 = 60_000;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("poll interval {0}ms outside {min}..={max}ms", min = MIN_POLL_INTERVAL_MS, max = MAX_POLL_INTERVAL_MS)]
    PollIntervalOutOfRange(u64),

    #[error("debounce window {debounce_ms}ms must be at least {factor}x the poll interval ({poll_interval_ms}ms)", factor = MIN_DEBOUNCE_INTERVALS)]
    DebounceTooShort {
        debounce_ms: u64,
        poll_interval_ms: u64,
    },

    #[error("debounce window {0}ms exceeds {max}ms", max = MAX_DEBOUNCE_WINDOW_MS)]
    DebounceTooLong(u64),

    #[error("look-back overlap {0}ms exceeds {max}ms", max = MAX_LOOKBACK_OVERLAP_MS)]
    OverlapTooLong(u64),

    /// An event re-read by the overlap must still fall inside the debounce
    /// window of the block it caused.
    #[error("look-back overlap {overlap_ms}ms plus poll interval {poll_interval_ms}ms exceeds the debounce window ({debounce_ms}ms)")]
    OverlapOutlivesDebounce {
        overlap_ms: u64,
        poll_interval_ms: u64,
        debounce_ms: u64,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    pub poll_interval_ms: u64,
    pub lookback_overlap_ms: u64,
    pub debounce_window_ms: u64,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: DEFAULT_POLL_INTERVAL.as_millis() as u64,
            lookback_overlap_ms: DEFAULT_LOOKBACK_OVERLAP.as_millis() as u64,
            debounce_window_ms: DEFAULT_DEBOUNCE_WINDOW.as_millis() as u64,
        }
    }
}

impl MonitorConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn overlap_ms(&self) -> i64 {
        i64::try_from(self.lookback_overlap_ms).unwrap_or(i64::MAX)
    }

    pub fn debounce_ms(&self) -> i64 {
        i64::try_from(self.debounce_window_ms).unwrap_or(i64::MAX)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(MIN_POLL_INTERVAL_MS..=MAX_POLL_INTERVAL_MS).contains(&self.poll_interval_ms) {
            return Err(ConfigError::PollIntervalOutOfRange(self.poll_interval_ms));
        }
        if self.debounce_window_ms < self.poll_interval_ms * MIN_DEBOUNCE_INTERVALS {
            return Err(ConfigError::DebounceTooShort {
                debounce_ms: self.debounce_window_ms,
                poll_interval_ms: self.poll_interval_ms,
            });
        }
        if self.debounce_window_ms > MAX_DEBOUNCE_WINDOW_MS {
            return Err(ConfigError::DebounceTooLong(self.debounce_window_ms));
        }
        if self.lookback_overlap_ms > MAX_LOOKBACK_OVERLAP_MS {
            return Err(ConfigError::OverlapTooLong(self.lookback_overlap_ms));
        }
        if self.lookback_overlap_ms + self.poll_interval_ms > self.debounce_window_ms {
            return Err(ConfigError::OverlapOutlivesDebounce {
                overlap_ms: self.lookback_overlap_ms,
                poll_interval_ms: self.poll_interval_ms,
                debounce_ms: self.debounce_window_ms,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = MonitorConfig::default();
        assert_eq!(config.poll_interval_ms, 300);
        assert_eq!(config.lookback_overlap_ms, 1500);
        assert_eq!(config.debounce_window_ms, 2000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rejects_short_debounce() {
        let config = MonitorConfig {
            poll_interval_ms: 500,
            debounce_window_ms: 1500,
            ..Default::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::DebounceTooShort {
                debounce_ms: 1500,
                poll_interval_ms: 500
            })
        );
    }

    #[test]
    fn test_rejects_interval_out_of_range() {
        let config = MonitorConfig {
            poll_interval_ms: 20,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::PollIntervalOutOfRange(20)));
    }

    #[test]
    fn test_rejects_overlap_reaching_past_debounce() {
        let config = MonitorConfig {
            lookback_overlap_ms: 2000,
            ..Default::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::OverlapOutlivesDebounce {
                overlap_ms: 2000,
                poll_interval_ms: 300,
                debounce_ms: 2000
            })
        );

        let config = MonitorConfig {
            lookback_overlap_ms: 1700,
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rejects_unbounded_values() {
        let config = MonitorConfig {
            lookback_overlap_ms: u64::MAX,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::OverlapTooLong(u64::MAX)));

        let config = MonitorConfig {
            debounce_window_ms: u64::MAX,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::DebounceTooLong(u64::MAX)));
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: MonitorConfig = serde_json::from_str(r#"{"poll_interval_ms": 400}"#).unwrap();
        assert_eq!(config.poll_interval_ms, 400);
        assert_eq!(config.debounce_window_ms, 2000);
        assert!(config.validate().is_ok());
    }
}
