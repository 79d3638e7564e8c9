//! Sessiontrace CLI
//!
//! Command-line interface for retrieving the spans of one session.
//!
//! # Usage
//!
//! ```bash
//! sessiontrace --help
//! sessiontrace fetch --session-id 4f2c9e
//! sessiontrace query --session-id 4f2c9e
//! ```

#![deny(unsafe_code)]

use anyhow::Context;
use clap::{Args, Parser, Subcommand, ValueEnum};
use shared::chrono;
use shared::client::{ClientConfig, CloudWatchLogsClient};
use shared::config::{SessionConfig, DEFAULT_LOG_GROUP, DEFAULT_LOOKBACK_HOURS};
use shared::driver::Driver;
use shared::poll::{Backoff, PollPolicy, TokioSleeper};
use std::path::PathBuf;
use std::time::Duration;

/// Sessiontrace CLI - fetch, print and export the spans of one session
#[derive(Parser)]
#[command(name = "sessiontrace")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// AWS region of the log-query service
    #[arg(long, env = "AWS_REGION", default_value = "us-east-1", global = true)]
    region: String,

    /// Service endpoint URL (defaults to the regional endpoint)
    #[arg(long, env = "SESSIONTRACE_ENDPOINT", global = true)]
    endpoint: Option<String>,

    /// Per-request timeout in seconds
    #[arg(long, default_value_t = 30, global = true)]
    request_timeout_secs: u64,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch a session's spans, print them and write the JSON export
    Fetch(FetchArgs),
    /// Print the query that would be submitted, without running it
    Query(QueryArgs),
}

#[derive(Args)]
struct QueryArgs {
    /// Session identifier to filter on
    #[arg(short, long, env = "SESSIONTRACE_SESSION_ID")]
    session_id: String,

    /// Log group holding the span records
    #[arg(long, env = "SESSIONTRACE_LOG_GROUP", default_value = DEFAULT_LOG_GROUP)]
    log_group: String,

    /// How many hours back to search
    #[arg(long, default_value_t = DEFAULT_LOOKBACK_HOURS)]
    lookback_hours: i64,

    /// Maximum number of records to retrieve (1-10000)
    #[arg(long, default_value_t = 10_000)]
    limit: u32,
}

#[derive(Args)]
struct FetchArgs {
    #[command(flatten)]
    query: QueryArgs,

    /// Directory the export file is written to
    #[arg(short, long, env = "SESSIONTRACE_OUTPUT_DIR", default_value = ".")]
    output_dir: PathBuf,

    /// Delay between status polls, in milliseconds
    #[arg(long, default_value_t = 1_000)]
    poll_interval_ms: u64,

    /// Give up after this many polls (unbounded by default)
    #[arg(long)]
    max_polls: Option<u32>,

    /// Give up after waiting this many seconds in total (unbounded by default)
    #[arg(long)]
    max_wait_secs: Option<u64>,

    /// How the poll delay evolves
    #[arg(long, value_enum, default_value_t = BackoffArg::Fixed)]
    backoff: BackoffArg,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum BackoffArg {
    /// Same delay between every poll
    Fixed,
    /// Double the delay after every poll, up to 30 seconds
    Exponential,
}

impl QueryArgs {
    fn session_config(&self) -> anyhow::Result<SessionConfig> {
        let lookback = chrono::Duration::try_hours(self.lookback_hours)
            .with_context(|| format!("lookback of {} hours is out of range", self.lookback_hours))?;
        Ok(SessionConfig::new(self.session_id.clone())
            .with_log_group(self.log_group.clone())
            .with_lookback(lookback)
            .with_limit(self.limit))
    }
}

impl FetchArgs {
    fn poll_policy(&self) -> PollPolicy {
        let mut policy = PollPolicy::default()
            .with_interval(Duration::from_millis(self.poll_interval_ms))
            .with_backoff(match self.backoff {
                BackoffArg::Fixed => Backoff::Fixed,
                BackoffArg::Exponential => Backoff::Exponential {
                    multiplier: 2,
                    max_interval: Duration::from_secs(30),
                },
            });
        if let Some(max) = self.max_polls {
            policy = policy.with_max_attempts(max);
        }
        if let Some(secs) = self.max_wait_secs {
            policy = policy.with_max_wait(Duration::from_secs(secs));
        }
        policy
    }

    fn session_config(&self) -> anyhow::Result<SessionConfig> {
        Ok(self
            .query
            .session_config()?
            .with_output_dir(self.output_dir.clone())
            .with_poll_policy(self.poll_policy()))
    }
}

impl Cli {
    fn client_config(&self) -> ClientConfig {
        let config =
            ClientConfig::for_region(self.region.clone()).with_timeout_secs(self.request_timeout_secs);
        match self.endpoint {
            Some(ref endpoint) => config.with_endpoint(endpoint.clone()),
            None => config,
        }
    }
}

fn init_tracing() {
    // Logs go to stderr so the report on stdout stays clean.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Fetch(ref args)) => {
            let config = args.session_config()?;
            config
                .validate_config()
                .context("invalid fetch arguments")?;

            let client = CloudWatchLogsClient::new(&cli.client_config())?;
            let mut driver = Driver::new(client, TokioSleeper);
            let mut stdout = std::io::stdout();

            let summary = driver.run(&config, &mut stdout).await?;
            tracing::info!(
                query_id = %summary.query_id,
                records = summary.records,
                exported = summary.exported,
                records_matched = summary.statistics.map(|s| s.records_matched),
                "Session export finished"
            );
        }
        Some(Commands::Query(ref args)) => {
            let config = args.session_config()?;
            config
                .validate_config()
                .context("invalid query arguments")?;
            println!("{}", config.query());
        }
        None => {
            println!("Sessiontrace CLI v{}", env!("CARGO_PKG_VERSION"));
            println!("Use --help for usage information");
        }
    }

    Ok(())
}
