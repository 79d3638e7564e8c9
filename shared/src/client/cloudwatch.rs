//! HTTP client for the CloudWatch Logs Insights JSON API.
//!
//! Requests are sent unsigned. Point `endpoint` at a signing proxy or a local
//! emulator when the service requires credentials.

use super::{LogQueryClient, QueryClientError};
use crate::query::{QueryHandle, QueryResults, StartQueryRequest};
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const TARGET_PREFIX: &str = "Logs_20140328";
const AMZ_JSON: &str = "application/x-amz-json-1.1";

/// Default AWS region.
pub const DEFAULT_REGION: &str = "us-east-1";

/// Default per-request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Connection settings for [`CloudWatchLogsClient`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Base URL of the service.
    pub endpoint: String,
    /// Region the endpoint belongs to.
    pub region: String,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

impl ClientConfig {
    /// Configuration for the public regional endpoint.
    #[must_use]
    pub fn for_region(region: impl Into<String>) -> Self {
        let region = region.into();
        Self {
            endpoint: format!("https://logs.{region}.amazonaws.com"),
            region,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    /// Overrides the endpoint URL.
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Overrides the request timeout.
    #[must_use]
    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::for_region(DEFAULT_REGION)
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GetQueryResultsRequest<'a> {
    query_id: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StartQueryResponse {
    query_id: String,
}

#[derive(Debug, Default, Deserialize)]
struct ServiceErrorBody {
    #[serde(rename = "__type", default)]
    error_type: String,
    #[serde(default, alias = "Message")]
    message: String,
}

impl ServiceErrorBody {
    /// `__type` may be fully qualified (`com.amazonaws...#ResourceNotFoundException`).
    fn short_type(&self) -> &str {
        self.error_type
            .rsplit('#')
            .next()
            .unwrap_or(&self.error_type)
    }
}

/// Client for the CloudWatch Logs `StartQuery` / `GetQueryResults` operations.
#[derive(Debug, Clone)]
pub struct CloudWatchLogsClient {
    client: Client,
    endpoint: String,
    region: String,
}

impl CloudWatchLogsClient {
    /// Creates a client from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the endpoint is empty or the HTTP client cannot be built.
    pub fn new(config: &ClientConfig) -> Result<Self, QueryClientError> {
        let endpoint = config.endpoint.trim_end_matches('/');
        if endpoint.is_empty() {
            return Err(QueryClientError::Config("endpoint cannot be empty".to_string()));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            endpoint: format!("{endpoint}/"),
            region: config.region.clone(),
        })
    }

    /// Region the client talks to.
    #[must_use]
    pub fn region(&self) -> &str {
        &self.region
    }

    async fn call<B, R>(&self, operation: &str, body: &B) -> Result<R, QueryClientError>
    where
        B: Serialize + Sync,
        R: DeserializeOwned,
    {
        let payload = serde_json::to_vec(body)
            .map_err(|e| QueryClientError::Config(format!("unserializable request: {e}")))?;

        tracing::debug!(
            operation,
            region = %self.region,
            endpoint = %self.endpoint,
            "Calling log-query service"
        );

        let response = self
            .client
            .post(&self.endpoint)
            .header(CONTENT_TYPE, AMZ_JSON)
            .header("X-Amz-Target", format!("{TARGET_PREFIX}.{operation}"))
            .body(payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error: ServiceErrorBody = response.json().await.unwrap_or_default();
            return Err(QueryClientError::Service {
                status: status.as_u16(),
                error_type: error.short_type().to_string(),
                message: error.message,
            });
        }

        Ok(response.json().await?)
    }
}

#[async_trait]
impl LogQueryClient for CloudWatchLogsClient {
    async fn start_query(
        &self,
        request: &StartQueryRequest,
    ) -> Result<QueryHandle, QueryClientError> {
        let response: StartQueryResponse = self.call("StartQuery", request).await?;
        Ok(QueryHandle::new(response.query_id))
    }

    async fn get_query_results(
        &self,
        handle: &QueryHandle,
    ) -> Result<QueryResults, QueryClientError> {
        let request = GetQueryResultsRequest {
            query_id: handle.as_str(),
        };
        self.call("GetQueryResults", &request).await
    }
}
