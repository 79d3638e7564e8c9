//! In-memory query client replaying scripted responses.

use super::{LogQueryClient, QueryClientError};
use crate::query::{QueryHandle, QueryResults, QueryStatus, StartQueryRequest};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

#[derive(Debug, Default)]
struct ScriptState {
    query_id: String,
    rejection: Option<String>,
    responses: VecDeque<QueryResults>,
    submissions: Vec<StartQueryRequest>,
    polls: usize,
}

/// A [`LogQueryClient`] that answers polls from a fixed script.
///
/// Clones share state, so a test can hand one clone to the driver and
/// inspect the recorded calls through another.
///
/// # Example
///
/// ```
/// use shared::client::{LogQueryClient, ScriptedQueryClient};
/// use shared::query::{QueryHandle, QueryResults, QueryStatus};
///
/// let client = ScriptedQueryClient::new("q-1").with_responses([
///     QueryResults::pending(QueryStatus::Running),
///     QueryResults::complete(vec![]),
/// ]);
///
/// tokio_test::block_on(async {
///     let handle = QueryHandle::new("q-1");
///     assert_eq!(client.get_query_results(&handle).await.unwrap().status, QueryStatus::Running);
///     assert_eq!(client.get_query_results(&handle).await.unwrap().status, QueryStatus::Complete);
/// });
/// assert_eq!(client.poll_count(), 2);
/// ```
#[derive(Debug, Clone, Default)]
pub struct ScriptedQueryClient {
    state: Arc<Mutex<ScriptState>>,
}

impl ScriptedQueryClient {
    /// Creates a client that hands out `query_id` on submission.
    #[must_use]
    pub fn new(query_id: impl Into<String>) -> Self {
        Self {
            state: Arc::new(Mutex::new(ScriptState {
                query_id: query_id.into(),
                ..ScriptState::default()
            })),
        }
    }

    /// Appends poll responses, returned one per call in order.
    #[must_use]
    pub fn with_responses(self, responses: impl IntoIterator<Item = QueryResults>) -> Self {
        if let Ok(mut state) = self.state.lock() {
            state.responses.extend(responses);
        }
        self
    }

    /// Appends bare statuses as poll responses.
    #[must_use]
    pub fn with_statuses(self, statuses: impl IntoIterator<Item = QueryStatus>) -> Self {
        self.with_responses(statuses.into_iter().map(QueryResults::pending))
    }

    /// Makes every submission fail with the given message.
    #[must_use]
    pub fn rejecting(self, message: impl Into<String>) -> Self {
        if let Ok(mut state) = self.state.lock() {
            state.rejection = Some(message.into());
        }
        self
    }

    /// Returns the submissions received so far.
    #[must_use]
    pub fn submissions(&self) -> Vec<StartQueryRequest> {
        self.state
            .lock()
            .map(|state| state.submissions.clone())
            .unwrap_or_default()
    }

    /// Returns how many polls were made.
    #[must_use]
    pub fn poll_count(&self) -> usize {
        self.state.lock().map(|state| state.polls).unwrap_or(0)
    }
}

#[async_trait]
impl LogQueryClient for ScriptedQueryClient {
    async fn start_query(
        &self,
        request: &StartQueryRequest,
    ) -> Result<QueryHandle, QueryClientError> {
        let mut state = self.state.lock().map_err(|_| QueryClientError::LockError)?;
        state.submissions.push(request.clone());

        if let Some(ref message) = state.rejection {
            return Err(QueryClientError::Service {
                status: 400,
                error_type: "MalformedQueryException".to_string(),
                message: message.clone(),
            });
        }

        Ok(QueryHandle::new(state.query_id.clone()))
    }

    async fn get_query_results(
        &self,
        _handle: &QueryHandle,
    ) -> Result<QueryResults, QueryClientError> {
        let mut state = self.state.lock().map_err(|_| QueryClientError::LockError)?;
        state.polls += 1;
        let polls = state.polls;
        state
            .responses
            .pop_front()
            .ok_or(QueryClientError::ScriptExhausted(polls))
    }
}
