//! Polling a submitted query until it reaches a terminal status.
//!
//! The default [`PollPolicy`] waits one second between polls and never gives
//! up. Attempt caps, a total wait budget and exponential backoff are opt-in.
//! Waiting goes through the [`Sleeper`] trait so tests can run the loop
//! without real delays.

use crate::client::{LogQueryClient, QueryClientError};
use crate::query::{QueryHandle, QueryResults};
use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// Default delay between two polls.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// How the delay between polls evolves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Backoff {
    /// Always wait `interval`.
    #[default]
    Fixed,
    /// Multiply the delay by `multiplier` after every poll, up to `max_interval`.
    Exponential {
        /// Growth factor per poll.
        multiplier: u32,
        /// Upper bound for a single delay.
        max_interval: Duration,
    },
}

/// When and how long to keep polling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    /// Delay before the second poll.
    pub interval: Duration,
    /// Maximum number of polls; `None` means unbounded.
    pub max_attempts: Option<u32>,
    /// Maximum total time spent waiting between polls; `None` means unbounded.
    pub max_wait: Option<Duration>,
    /// Delay growth strategy.
    pub backoff: Backoff,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            max_attempts: None,
            max_wait: None,
            backoff: Backoff::Fixed,
        }
    }
}

impl PollPolicy {
    /// Sets the base interval.
    #[must_use]
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Caps the number of polls.
    #[must_use]
    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = Some(attempts);
        self
    }

    /// Caps the total time spent waiting.
    #[must_use]
    pub fn with_max_wait(mut self, max_wait: Duration) -> Self {
        self.max_wait = Some(max_wait);
        self
    }

    /// Sets the backoff strategy.
    #[must_use]
    pub fn with_backoff(mut self, backoff: Backoff) -> Self {
        self.backoff = backoff;
        self
    }

    /// Delay to wait after poll number `attempt` (1-based).
    #[must_use]
    pub fn delay_after(&self, attempt: u32) -> Duration {
        match self.backoff {
            Backoff::Fixed => self.interval,
            Backoff::Exponential {
                multiplier,
                max_interval,
            } => {
                let exponent = attempt.saturating_sub(1);
                let factor = multiplier.max(1).saturating_pow(exponent);
                self.interval.saturating_mul(factor).min(max_interval)
            }
        }
    }
}

/// Something that can wait.
#[async_trait]
pub trait Sleeper: Send + Sync {
    /// Waits for `duration`.
    async fn sleep(&self, duration: Duration);
}

/// Sleeps on the tokio timer.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Errors that stop the poll loop before the query reaches a terminal status.
#[derive(Debug, Error)]
pub enum PollError {
    /// A status request failed.
    #[error("Failed to poll query status: {0}")]
    Client(#[from] QueryClientError),

    /// `max_attempts` polls were made without a terminal status.
    #[error("Query still not finished after {0} polls")]
    AttemptsExhausted(u32),

    /// Waiting any longer would exceed `max_wait`.
    #[error("Query still not finished after waiting {0:?}")]
    WaitBudgetExceeded(Duration),
}

/// Polls `handle` until the service reports a terminal status.
///
/// Returns the terminal response, whether it is a success or a failure; the
/// caller decides what a failed status means.
///
/// # Errors
///
/// Returns an error if a poll request fails or the policy's limits are hit.
pub async fn poll_until_terminal<C, S>(
    client: &C,
    handle: &QueryHandle,
    policy: &PollPolicy,
    sleeper: &S,
) -> Result<QueryResults, PollError>
where
    C: LogQueryClient + ?Sized,
    S: Sleeper + ?Sized,
{
    let mut attempt: u32 = 0;
    let mut waited = Duration::ZERO;

    loop {
        attempt += 1;
        let response = client.get_query_results(handle).await?;
        tracing::debug!(query_id = %handle, attempt, status = %response.status, "Polled query");

        if response.status.is_terminal() {
            return Ok(response);
        }

        if policy.max_attempts.is_some_and(|max| attempt >= max) {
            return Err(PollError::AttemptsExhausted(attempt));
        }

        let delay = policy.delay_after(attempt);
        if let Some(budget) = policy.max_wait {
            if waited + delay > budget {
                return Err(PollError::WaitBudgetExceeded(waited));
            }
        }

        sleeper.sleep(delay).await;
        waited += delay;
    }
}


#[cfg(test)]
mod tests {
    use super::testing::RecordingSleeper;
    use super::*;
    use crate::client::ScriptedQueryClient;
    use crate::query::QueryStatus;

    fn handle() -> QueryHandle {
        QueryHandle::new("q-1")
    }

    #[tokio::test]
    async fn test_polls_until_complete() {
        let client = ScriptedQueryClient::new("q-1").with_responses([
            QueryResults::pending(QueryStatus::Running),
            QueryResults::pending(QueryStatus::Running),
            QueryResults::complete(vec![]),
        ]);
        let sleeper = RecordingSleeper::default();

        let result = poll_until_terminal(&client, &handle(), &PollPolicy::default(), &sleeper)
            .await
            .unwrap();

        assert_eq!(result.status, QueryStatus::Complete);
        assert_eq!(client.poll_count(), 3);
        assert_eq!(sleeper.delays(), vec![Duration::from_secs(1); 2]);
    }

    #[tokio::test]
    async fn test_scheduled_then_running_then_complete() {
        let client = ScriptedQueryClient::new("q-1").with_statuses([
            QueryStatus::Scheduled,
            QueryStatus::Running,
            QueryStatus::Running,
            QueryStatus::Complete,
        ]);
        let sleeper = RecordingSleeper::default();

        let result = poll_until_terminal(&client, &handle(), &PollPolicy::default(), &sleeper)
            .await
            .unwrap();

        assert_eq!(result.status, QueryStatus::Complete);
        assert_eq!(client.poll_count(), 4);
        assert_eq!(sleeper.delays().len(), 3);
    }

    #[tokio::test]
    async fn test_failure_status_is_returned_immediately() {
        let client = ScriptedQueryClient::new("q-1")
            .with_statuses([QueryStatus::Failed, QueryStatus::Complete]);
        let sleeper = RecordingSleeper::default();

        let result = poll_until_terminal(&client, &handle(), &PollPolicy::default(), &sleeper)
            .await
            .unwrap();

        assert_eq!(result.status, QueryStatus::Failed);
        assert_eq!(client.poll_count(), 1);
        assert!(sleeper.delays().is_empty());
    }

    #[tokio::test]
    async fn test_cancelled_and_timeout_are_terminal() {
        for status in [QueryStatus::Cancelled, QueryStatus::Timeout] {
            let client = ScriptedQueryClient::new("q-1").with_statuses([status]);
            let result = poll_until_terminal(
                &client,
                &handle(),
                &PollPolicy::default(),
                &RecordingSleeper::default(),
            )
            .await
            .unwrap();

            assert_eq!(result.status, status);
        }
    }

    #[tokio::test]
    async fn test_max_attempts() {
        let client = ScriptedQueryClient::new("q-1").with_statuses([QueryStatus::Running; 5]);
        let sleeper = RecordingSleeper::default();
        let policy = PollPolicy::default().with_max_attempts(3);

        let err = poll_until_terminal(&client, &handle(), &policy, &sleeper)
            .await
            .unwrap_err();

        assert!(matches!(err, PollError::AttemptsExhausted(3)));
        assert_eq!(client.poll_count(), 3);
        assert_eq!(sleeper.delays().len(), 2);
    }

    #[tokio::test]
    async fn test_max_wait() {
        let client = ScriptedQueryClient::new("q-1").with_statuses([QueryStatus::Running; 10]);
        let sleeper = RecordingSleeper::default();
        let policy = PollPolicy::default().with_max_wait(Duration::from_millis(2_500));

        let err = poll_until_terminal(&client, &handle(), &policy, &sleeper)
            .await
            .unwrap_err();

        assert!(matches!(err, PollError::WaitBudgetExceeded(d) if d == Duration::from_secs(2)));
        assert_eq!(sleeper.delays().len(), 2);
    }

    #[tokio::test]
    async fn test_client_error_stops_polling() {
        let client = ScriptedQueryClient::new("q-1");

        let err = poll_until_terminal(
            &client,
            &handle(),
            &PollPolicy::default(),
            &RecordingSleeper::default(),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, PollError::Client(_)));
    }

    #[test]
    fn test_fixed_delay() {
        let policy = PollPolicy::default();
        assert_eq!(policy.delay_after(1), Duration::from_secs(1));
        assert_eq!(policy.delay_after(50), Duration::from_secs(1));
    }

    #[test]
    fn test_exponential_delay() {
        let policy = PollPolicy::default()
            .with_interval(Duration::from_millis(500))
            .with_backoff(Backoff::Exponential {
                multiplier: 2,
                max_interval: Duration::from_secs(3),
            });

        assert_eq!(policy.delay_after(1), Duration::from_millis(500));
        assert_eq!(policy.delay_after(2), Duration::from_secs(1));
        assert_eq!(policy.delay_after(3), Duration::from_secs(2));
        assert_eq!(policy.delay_after(4), Duration::from_secs(3));
        assert_eq!(policy.delay_after(40), Duration::from_secs(3));
    }
}
