//! Lifecycle of an asynchronous, server-side query.

use crate::models::RawLogRecord;
use serde::{Deserialize, Deserializer, Serialize};

/// Opaque identifier of an in-flight query.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QueryHandle(String);

impl QueryHandle {
    /// Wraps a query id returned by the service.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the raw query id.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for QueryHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Status reported by the service for a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum QueryStatus {
    /// Accepted but not started.
    Scheduled,
    /// Executing.
    Running,
    /// Finished; results are available.
    Complete,
    /// Execution failed.
    Failed,
    /// Cancelled on the service side.
    Cancelled,
    /// Exceeded the service's execution limit.
    Timeout,
    /// The service could not report a status, or reported one this crate
    /// does not know.
    Unknown,
}

impl QueryStatus {
    /// Maps a wire name (`"Complete"`, `"Running"`, ...) to a status.
    #[must_use]
    pub fn from_wire(name: &str) -> Self {
        match name.to_ascii_lowercase().as_str() {
            "scheduled" => Self::Scheduled,
            "running" => Self::Running,
            "complete" => Self::Complete,
            "failed" => Self::Failed,
            "cancelled" => Self::Cancelled,
            "timeout" => Self::Timeout,
            _ => Self::Unknown,
        }
    }
}

impl<'de> Deserialize<'de> for QueryStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        Ok(Self::from_wire(&name))
    }
}

impl QueryStatus {
    /// Returns true once the query will not change status any more.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            Self::Complete | Self::Failed | Self::Cancelled | Self::Timeout
        )
    }

    /// Returns true for terminal statuses that carry no results.
    #[must_use]
    pub fn is_failure(self) -> bool {
        matches!(self, Self::Failed | Self::Cancelled | Self::Timeout)
    }
}

impl std::fmt::Display for QueryStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Scheduled => write!(f, "scheduled"),
            Self::Running => write!(f, "running"),
            Self::Complete => write!(f, "complete"),
            Self::Failed => write!(f, "failed"),
            Self::Cancelled => write!(f, "cancelled"),
            Self::Timeout => write!(f, "timeout"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

/// Execution statistics the service reports alongside results.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryStatistics {
    /// Records that matched the query.
    #[serde(default)]
    pub records_matched: f64,
    /// Records scanned by the query.
    #[serde(default)]
    pub records_scanned: f64,
    /// Bytes scanned by the query.
    #[serde(default)]
    pub bytes_scanned: f64,
}

/// Result of one status poll.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryResults {
    /// Current status of the query.
    pub status: QueryStatus,
    /// Result rows in service order; only meaningful when complete.
    #[serde(default)]
    pub results: Vec<RawLogRecord>,
    /// Execution statistics, when reported.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub statistics: Option<QueryStatistics>,
}

impl QueryResults {
    /// Creates a result with no rows.
    #[must_use]
    pub fn pending(status: QueryStatus) -> Self {
        Self {
            status,
            results: Vec::new(),
            statistics: None,
        }
    }

    /// Creates a completed result.
    #[must_use]
    pub fn complete(results: Vec<RawLogRecord>) -> Self {
        Self {
            status: QueryStatus::Complete,
            results,
            statistics: None,
        }
    }
}
