//! Time window a query is restricted to.

use chrono::{DateTime, Duration, Utc};

/// An inclusive time range, sent to the service as epoch seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    /// Start of the window (inclusive).
    pub start: DateTime<Utc>,
    /// End of the window (inclusive).
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    /// The window covering `lookback` up to `now`.
    ///
    /// Returns `None` if the start falls outside the representable range.
    #[must_use]
    pub fn trailing(lookback: Duration, now: DateTime<Utc>) -> Option<Self> {
        Some(Self {
            start: now.checked_sub_signed(lookback)?,
            end: now,
        })
    }

    /// Start of the window in seconds since the Unix epoch.
    #[must_use]
    pub fn start_epoch_secs(&self) -> i64 {
        self.start.timestamp()
    }

    /// End of the window in seconds since the Unix epoch.
    #[must_use]
    pub fn end_epoch_secs(&self) -> i64 {
        self.end.timestamp()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_trailing_window() {
        let now = Utc.with_ymd_and_hms(2024, 3, 2, 12, 0, 0).unwrap();
        let window = TimeWindow::trailing(Duration::hours(24), now).unwrap();

        assert_eq!(window.end_epoch_secs(), now.timestamp());
        assert_eq!(window.end_epoch_secs() - window.start_epoch_secs(), 86_400);
    }

    #[test]
    fn test_trailing_window_out_of_range() {
        let now = Utc.with_ymd_and_hms(2024, 3, 2, 12, 0, 0).unwrap();
        assert!(TimeWindow::trailing(Duration::hours(1_000_000_000_000), now).is_none());
        assert!(TimeWindow::trailing(Duration::MAX, now).is_none());
    }
}
