//! The retrieval pipeline: submit, poll, parse, render, export.
//!
//! [`Driver`] walks a session through
//! `Idle → Submitted → Polling → Retrieved → Rendered → Exported → Done`.
//! Any error moves it to `Failed` and ends the run. Nothing is retried.

use crate::client::{LogQueryClient, QueryClientError};
use crate::config::{ConfigError, SessionConfig};
use crate::export::{export, ExportDocument, ExportError};
use crate::parse::parse_records;
use crate::poll::{poll_until_terminal, PollError, Sleeper, TokioSleeper};
use crate::query::{QueryHandle, QueryStatistics, QueryStatus};
use crate::render::render_report;
use chrono::Utc;
use std::io::Write;
use std::path::PathBuf;
use thiserror::Error;

/// Where a run currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DriverState {
    /// Nothing submitted yet.
    Idle,
    /// The service accepted the query.
    Submitted,
    /// Waiting for the query to finish.
    Polling,
    /// Results are in memory.
    Retrieved,
    /// The report has been written.
    Rendered,
    /// The export file has been written.
    Exported,
    /// The run finished successfully.
    Done,
    /// The run stopped on an error.
    Failed,
}

impl std::fmt::Display for DriverState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Submitted => write!(f, "submitted"),
            Self::Polling => write!(f, "polling"),
            Self::Retrieved => write!(f, "retrieved"),
            Self::Rendered => write!(f, "rendered"),
            Self::Exported => write!(f, "exported"),
            Self::Done => write!(f, "done"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// Errors that end a run.
#[derive(Debug, Error)]
pub enum DriverError {
    /// The configuration is invalid.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(#[from] ConfigError),

    /// The service rejected the query.
    #[error("Query submission failed: {0}")]
    Submission(#[source] QueryClientError),

    /// The query ended in a failure status.
    #[error("Query {query_id} finished with status {status}")]
    QueryFailed {
        /// The failed query.
        query_id: QueryHandle,
        /// The terminal status reported by the service.
        status: QueryStatus,
    },

    /// Polling stopped before a terminal status.
    #[error(transparent)]
    Poll(#[from] PollError),

    /// The console report could not be written.
    #[error("Failed to write report: {0}")]
    Report(#[from] std::io::Error),

    /// The export could not be written.
    #[error(transparent)]
    Export(#[from] ExportError),
}

/// What a successful run produced.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    /// The query that was run.
    pub query_id: QueryHandle,
    /// Records returned by the query.
    pub records: usize,
    /// Records that parsed and were exported.
    pub exported: usize,
    /// Location of the export.
    pub export_path: PathBuf,
    /// Execution statistics, when the service reported them.
    pub statistics: Option<QueryStatistics>,
}

/// Runs the retrieval pipeline for one session.
///
/// # Example
///
/// ```
/// use shared::client::ScriptedQueryClient;
/// use shared::config::SessionConfig;
/// use shared::driver::{Driver, DriverState};
/// use shared::models::RawLogRecord;
/// use shared::poll::TokioSleeper;
/// use shared::query::QueryResults;
///
/// let dir = tempfile::tempdir().unwrap();
/// let client = ScriptedQueryClient::new("q-1").with_responses([QueryResults::complete(vec![
///     RawLogRecord::from_message("2024-01-01 00:00:00.000", r#"{"name":"checkout"}"#),
/// ])]);
/// let config = SessionConfig::new("s-1").with_output_dir(dir.path());
///
/// let mut driver = Driver::new(client, TokioSleeper);
/// let mut out = Vec::new();
/// let summary = tokio_test::block_on(driver.run(&config, &mut out)).unwrap();
///
/// assert_eq!(summary.exported, 1);
/// assert_eq!(driver.state(), DriverState::Done);
/// ```
#[derive(Debug)]
pub struct Driver<C, S = TokioSleeper> {
    client: C,
    sleeper: S,
    state: DriverState,
}

impl<C, S> Driver<C, S>
where
    C: LogQueryClient,
    S: Sleeper,
{
    /// Creates an idle driver.
    #[must_use]
    pub fn new(client: C, sleeper: S) -> Self {
        Self {
            client,
            sleeper,
            state: DriverState::Idle,
        }
    }

    /// Returns the current state.
    #[must_use]
    pub fn state(&self) -> DriverState {
        self.state
    }

    /// Runs the pipeline, writing the console report to `out`.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid, the query is
    /// rejected or fails, polling gives up, or the report or export cannot be
    /// written. No export is written unless the query completed.
    pub async fn run<W: Write>(
        &mut self,
        config: &SessionConfig,
        out: &mut W,
    ) -> Result<RunSummary, DriverError> {
        let result = self.execute(config, out).await;
        if let Err(ref e) = result {
            tracing::error!(state = %self.state, error = %e, "Run failed");
            self.transition(DriverState::Failed);
        }
        result
    }

    async fn execute<W: Write>(
        &mut self,
        config: &SessionConfig,
        out: &mut W,
    ) -> Result<RunSummary, DriverError> {
        config.validate_config()?;

        let request = config.start_request(Utc::now())?;
        let handle = self
            .client
            .start_query(&request)
            .await
            .map_err(DriverError::Submission)?;
        self.transition(DriverState::Submitted);
        tracing::info!(query_id = %handle, session_id = %config.session_id, "Query started");
        writeln!(out, "Query started: {handle}\n")?;

        self.transition(DriverState::Polling);
        let response = poll_until_terminal(&self.client, &handle, &config.poll, &self.sleeper).await?;
        if response.status.is_failure() {
            writeln!(out, "Query failed: {}", response.status)?;
            return Err(DriverError::QueryFailed {
                query_id: handle,
                status: response.status,
            });
        }
        self.transition(DriverState::Retrieved);
        tracing::info!(query_id = %handle, records = response.results.len(), "Query complete");
        if let Some(stats) = response.statistics {
            tracing::debug!(
                query_id = %handle,
                records_matched = stats.records_matched,
                records_scanned = stats.records_scanned,
                bytes_scanned = stats.bytes_scanned,
                "Query statistics"
            );
        }

        let results = parse_records(&response.results);
        render_report(out, &results)?;
        self.transition(DriverState::Rendered);

        let document = ExportDocument::from_results(config.session_id.clone(), Utc::now(), &results);
        let export_path = config.export_path();
        export(&document, &export_path)?;
        self.transition(DriverState::Exported);
        writeln!(out, "\nExported full details to: {}", export_path.display())?;

        self.transition(DriverState::Done);
        Ok(RunSummary {
            query_id: handle,
            records: document.span_count,
            exported: document.spans.len(),
            export_path,
            statistics: response.statistics,
        })
    }

    fn transition(&mut self, next: DriverState) {
        tracing::debug!(from = %self.state, to = %next, "Driver transition");
        self.state = next;
    }
}
