//! Query construction and query lifecycle types.
//!
//! This module builds the Logs Insights query that selects every span of a
//! session, and models the asynchronous query the service runs for it.
//!
//! # Example
//!
//! ```
//! use chrono::{Duration, Utc};
//! use shared::query::{session_query, StartQueryRequest, TimeWindow};
//!
//! let query = session_query("attributes.session.id", "abc", 100);
//! let window = TimeWindow::trailing(Duration::hours(24), Utc::now()).unwrap();
//! let request = StartQueryRequest::new("aws/spans", window, &query);
//!
//! assert!(request.query_string.contains("filter attributes.session.id = \"abc\""));
//! assert_eq!(request.limit, 100);
//! ```

mod ast;
mod status;
mod window;

pub use ast::*;
pub use status::{QueryHandle, QueryResults, QueryStatistics, QueryStatus};
pub use window::TimeWindow;

use crate::models::{MESSAGE_FIELD, TIMESTAMP_FIELD};
use serde::Serialize;

/// Builds the query selecting all records of one session, oldest first.
#[must_use]
pub fn session_query(filter_field: &str, session_id: &str, limit: u32) -> InsightsQuery {
    InsightsQuery::new([TIMESTAMP_FIELD, MESSAGE_FIELD])
        .with_filter(filter_field, session_id)
        .with_sort_ascending(TIMESTAMP_FIELD)
        .with_limit(limit)
}

/// Parameters of a query submission, shaped like the service's `StartQuery` body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StartQueryRequest {
    /// Log group to search.
    pub log_group_name: String,
    /// Window start, epoch seconds.
    pub start_time: i64,
    /// Window end, epoch seconds.
    pub end_time: i64,
    /// Rendered query string.
    pub query_string: String,
    /// Result cap, mirrored from the query's `limit` stage.
    pub limit: u32,
}

impl StartQueryRequest {
    /// Creates a submission for `query` over `window`.
    #[must_use]
    pub fn new(log_group: impl Into<String>, window: TimeWindow, query: &InsightsQuery) -> Self {
        Self {
            log_group_name: log_group.into(),
            start_time: window.start_epoch_secs(),
            end_time: window.end_epoch_secs(),
            query_string: query.to_string(),
            limit: query.limit.unwrap_or(DEFAULT_RESULT_LIMIT),
        }
    }
}

/// The service's own cap on query results.
pub const DEFAULT_RESULT_LIMIT: u32 = 10_000;
