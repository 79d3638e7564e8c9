//! Clients for the remote log-query service.
//!
//! The `LogQueryClient` trait abstracts the two remote operations the
//! pipeline needs, so the driver can run against the real service
//! ([`CloudWatchLogsClient`]) or a scripted stand-in ([`ScriptedQueryClient`]).

mod cloudwatch;
mod scripted;

pub use cloudwatch::{ClientConfig, CloudWatchLogsClient};
pub use scripted::ScriptedQueryClient;

use crate::query::{QueryHandle, QueryResults, StartQueryRequest};
use async_trait::async_trait;
use thiserror::Error;

/// Errors that can occur while talking to the log-query service.
#[derive(Debug, Error)]
pub enum QueryClientError {
    /// The request could not be sent or the response could not be read.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The service answered with an error.
    #[error("Service rejected the request ({status}): {error_type}: {message}")]
    Service {
        /// HTTP status code.
        status: u16,
        /// Service error type, e.g. `MalformedQueryException`.
        error_type: String,
        /// Service error message.
        message: String,
    },

    /// The client configuration is unusable.
    #[error("Invalid client configuration: {0}")]
    Config(String),

    /// Failed to acquire lock on the scripted client state.
    #[error("Failed to acquire lock on scripted client")]
    LockError,

    /// A scripted client ran out of responses.
    #[error("No scripted response left after {0} polls")]
    ScriptExhausted(usize),
}

/// Trait for log-query service clients.
///
/// Every call is a full round trip; implementations do not cache.
#[async_trait]
pub trait LogQueryClient: Send + Sync {
    /// Submits a query and returns its handle.
    ///
    /// # Errors
    ///
    /// Returns an error if the service rejects the query or cannot be reached.
    async fn start_query(&self, request: &StartQueryRequest)
        -> Result<QueryHandle, QueryClientError>;

    /// Fetches the current status of a query, and its results once complete.
    ///
    /// # Errors
    ///
    /// Returns an error if the service cannot be reached or answers with an error.
    async fn get_query_results(&self, handle: &QueryHandle)
        -> Result<QueryResults, QueryClientError>;
}
