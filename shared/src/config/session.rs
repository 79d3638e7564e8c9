//! Parameters of one session retrieval run.

use crate::export::export_file_name;
use crate::poll::PollPolicy;
use crate::query::{session_query, InsightsQuery, StartQueryRequest, TimeWindow, DEFAULT_RESULT_LIMIT};
use chrono::{DateTime, Duration, Utc};
use std::path::PathBuf;
use thiserror::Error;
use validator::Validate;

/// Default log group holding span records.
pub const DEFAULT_LOG_GROUP: &str = "aws/spans";

/// Default field the session filter applies to.
pub const DEFAULT_FILTER_FIELD: &str = "attributes.session.id";

/// Default lookback window in hours.
pub const DEFAULT_LOOKBACK_HOURS: i64 = 24;

/// Longest accepted lookback window in days (the longest log retention the
/// service offers).
pub const MAX_LOOKBACK_DAYS: i64 = 3653;

/// Errors that can occur during configuration validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The session ID is empty.
    #[error("Session ID cannot be empty")]
    EmptySessionId,

    /// The session ID cannot be used in a file name.
    #[error("Session ID cannot contain path separators or NUL: '{0}'")]
    UnsafeSessionId(String),

    /// The lookback window is zero or negative.
    #[error("Lookback window must be positive")]
    NonPositiveLookback,

    /// The lookback window is longer than any retained data.
    #[error("Lookback window cannot exceed {MAX_LOOKBACK_DAYS} days")]
    LookbackTooLong,

    /// The lookback window reaches before the earliest representable time.
    #[error("Lookback window starts before the earliest representable time")]
    LookbackOutOfRange,

    /// The poll interval is zero.
    #[error("Poll interval must be greater than zero")]
    ZeroPollInterval,

    /// Validation failed with details.
    #[error("Validation failed: {0}")]
    ValidationError(#[from] validator::ValidationErrors),
}

/// Everything a retrieval run needs, passed explicitly to the driver.
///
/// # Example
///
/// ```
/// use chrono::Duration;
/// use shared::config::SessionConfig;
///
/// let config = SessionConfig::new("session-42")
///     .with_lookback(Duration::hours(6))
///     .with_output_dir("/tmp");
///
/// assert!(config.validate_config().is_ok());
/// assert_eq!(
///     config.export_path().to_str(),
///     Some("/tmp/session_session-42_full.json")
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Validate)]
pub struct SessionConfig {
    /// The session to retrieve, used verbatim in the filter and file name.
    #[validate(length(min = 1, message = "Session ID cannot be empty"))]
    pub session_id: String,

    /// Log group to search.
    #[validate(length(min = 1, message = "Log group cannot be empty"))]
    pub log_group: String,

    /// Field the session filter applies to.
    #[validate(length(min = 1, message = "Filter field cannot be empty"))]
    pub filter_field: String,

    /// How far back from submission time to search.
    pub lookback: Duration,

    /// Maximum number of records to retrieve.
    #[validate(range(min = 1, max = 10_000, message = "Limit must be between 1 and 10000"))]
    pub limit: u32,

    /// Directory the export is written to.
    pub output_dir: PathBuf,

    /// Polling behaviour while the query runs.
    pub poll: PollPolicy,
}

impl SessionConfig {
    /// Creates a configuration with defaults for everything but the session.
    #[must_use]
    pub fn new(session_id: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            log_group: DEFAULT_LOG_GROUP.to_string(),
            filter_field: DEFAULT_FILTER_FIELD.to_string(),
            lookback: Duration::hours(DEFAULT_LOOKBACK_HOURS),
            limit: DEFAULT_RESULT_LIMIT,
            output_dir: PathBuf::from("."),
            poll: PollPolicy::default(),
        }
    }

    /// Sets the log group.
    #[must_use]
    pub fn with_log_group(mut self, log_group: impl Into<String>) -> Self {
        self.log_group = log_group.into();
        self
    }

    /// Sets the filter field.
    #[must_use]
    pub fn with_filter_field(mut self, field: impl Into<String>) -> Self {
        self.filter_field = field.into();
        self
    }

    /// Sets the lookback window.
    #[must_use]
    pub fn with_lookback(mut self, lookback: Duration) -> Self {
        self.lookback = lookback;
        self
    }

    /// Sets the result limit.
    #[must_use]
    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = limit;
        self
    }

    /// Sets the output directory.
    #[must_use]
    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    /// Sets the poll policy.
    #[must_use]
    pub fn with_poll_policy(mut self, poll: PollPolicy) -> Self {
        self.poll = poll;
        self
    }

    /// The query selecting this session's records.
    #[must_use]
    pub fn query(&self) -> InsightsQuery {
        session_query(&self.filter_field, &self.session_id, self.limit)
    }

    /// The submission for a run starting at `now`.
    ///
    /// # Errors
    ///
    /// Returns an error if the lookback window cannot be subtracted from `now`.
    pub fn start_request(&self, now: DateTime<Utc>) -> Result<StartQueryRequest, ConfigError> {
        let window =
            TimeWindow::trailing(self.lookback, now).ok_or(ConfigError::LookbackOutOfRange)?;
        Ok(StartQueryRequest::new(
            self.log_group.clone(),
            window,
            &self.query(),
        ))
    }

    /// Where the export is written.
    #[must_use]
    pub fn export_path(&self) -> PathBuf {
        self.output_dir.join(export_file_name(&self.session_id))
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The session ID is empty or contains `/`, `\` or NUL
    /// - The lookback window is not positive or longer than [`MAX_LOOKBACK_DAYS`]
    /// - The poll interval is zero
    /// - The log group or filter field is empty, or the limit is out of range
    pub fn validate_config(&self) -> Result<(), ConfigError> {
        if self.session_id.is_empty() {
            return Err(ConfigError::EmptySessionId);
        }
        if self.session_id.contains(['/', '\\', '\0']) {
            return Err(ConfigError::UnsafeSessionId(self.session_id.clone()));
        }
        if self.lookback <= Duration::zero() {
            return Err(ConfigError::NonPositiveLookback);
        }
        if self.lookback > Duration::days(MAX_LOOKBACK_DAYS) {
            return Err(ConfigError::LookbackTooLong);
        }
        if self.poll.interval.is_zero() {
            return Err(ConfigError::ZeroPollInterval);
        }
        self.validate()?;
        Ok(())
    }
}
