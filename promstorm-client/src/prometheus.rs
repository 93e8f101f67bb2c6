//! Prometheus HTTP API client.
//!
//! ## Endpoints
//!
//! - **Label values**: `GET /api/v1/label/<name>/values`, answered with
//!   `{"status": "...", "data": ["..."]}`
//! - **Range query**: `GET /api/v1/query_range?query=&start=&end=&step=`,
//!   answered with `{"status": "...", "data": {"resultType": "...", "result": ...}}`
//!
//! Both requests carry `Authorization: Bearer <token>` when a token is set.
//!
//! ## Example
//!
//! ```rust,no_run
//! use promstorm_client::PrometheusClient;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = PrometheusClient::builder()
//!         .endpoint("http://prometheus.local:9090")
//!         .build()?;
//!
//!     for job in client.label_values("job").await? {
//!         println!("job: {}", job);
//!     }
//!     Ok(())
//! }
//! ```

use std::time::Duration;

use reqwest::{Client, RequestBuilder, StatusCode, Url};
use serde::Deserialize;

use promstorm_types::QueryWindow;

use crate::ClientError;

/// Status value of a successful API envelope.
const STATUS_SUCCESS: &str = "success";

/// Longest body excerpt kept in error messages.
const MAX_ERROR_BODY: usize = 1024;

/// Client for the Prometheus query API.
///
/// Cloning is cheap: clones share the underlying connection pool.
#[derive(Clone)]
pub struct PrometheusClient {
    client: Client,
    endpoint: Url,
    bearer_token: Option<String>,
    label_timeout: Duration,
    query_timeout: Option<Duration>,
}

impl PrometheusClient {
    /// Create a new builder for configuring the client.
    pub fn builder() -> PrometheusClientBuilder {
        PrometheusClientBuilder::default()
    }

    /// The base URL all requests are issued against.
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Fetch every value of `label` known to the server.
    ///
    /// Values are returned exactly as sent: order kept, duplicates kept.
    pub async fn label_values(&self, label: &str) -> Result<Vec<String>, ClientError> {
        let url = self.api_url(&["api", "v1", "label", label, "values"])?;

        let response = self
            .authorize(self.client.get(url))
            .timeout(self.label_timeout)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        let decoded: LabelValuesResponse = serde_json::from_str(&body).map_err(|e| {
            ClientError::Decode(format!(
                "{} (HTTP {}: {})",
                e,
                status.as_u16(),
                excerpt(&body)
            ))
        })?;

        if decoded.status != STATUS_SUCCESS {
            return Err(ClientError::Api {
                status: decoded.status,
            });
        }

        Ok(decoded.data.unwrap_or_default())
    }

    /// Run one range query over `window` and discard the result.
    ///
    /// Any 200 response with a decodable body counts as success; the
    /// envelope's `status` field is not inspected.
    pub async fn query_range(&self, query: &str, window: &QueryWindow) -> Result<(), ClientError> {
        self.fetch_range(query, window).await.map(|_| ())
    }

    /// Run one range query over `window` and return the decoded envelope.
    pub async fn fetch_range(
        &self,
        query: &str,
        window: &QueryWindow,
    ) -> Result<RangeQueryResponse, ClientError> {
        let url = self.api_url(&["api", "v1", "query_range"])?;

        let mut request = self.authorize(self.client.get(url)).query(&[
            ("query", query.to_string()),
            ("start", window.start_unix().to_string()),
            ("end", window.end_unix().to_string()),
            ("step", window.step_secs().to_string()),
        ]);
        if let Some(timeout) = self.query_timeout {
            request = request.timeout(timeout);
        }

        let response = request.send().await?;

        let status = response.status();
        if status != StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::Http {
                status: status.as_u16(),
                body: excerpt(&body).to_string(),
            });
        }

        let body = response.bytes().await?;
        serde_json::from_slice(&body).map_err(|e| ClientError::Decode(e.to_string()))
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.bearer_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// Append path segments to the endpoint, percent-encoding each one.
    fn api_url(&self, segments: &[&str]) -> Result<Url, ClientError> {
        let mut url = self.endpoint.clone();
        url.path_segments_mut()
            .map_err(|_| ClientError::InvalidEndpoint(self.endpoint.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }
}

impl std::fmt::Debug for PrometheusClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrometheusClient")
            .field("endpoint", &self.endpoint.as_str())
            .field("bearer_token", &self.bearer_token.as_ref().map(|_| "<redacted>"))
            .field("label_timeout", &self.label_timeout)
            .field("query_timeout", &self.query_timeout)
            .finish()
    }
}

/// Builder for PrometheusClient.
#[derive(Debug, Default)]
pub struct PrometheusClientBuilder {
    endpoint: Option<String>,
    bearer_token: Option<String>,
    label_timeout: Option<Duration>,
    query_timeout: Option<Duration>,
}

impl PrometheusClientBuilder {
    /// Set the API base URL (e.g., "http://localhost:9090").
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Set the bearer token sent in the `Authorization` header.
    ///
    /// An empty token means no header is sent.
    pub fn bearer_token(mut self, token: impl Into<String>) -> Self {
        let token = token.into();
        self.bearer_token = (!token.is_empty()).then_some(token);
        self
    }

    /// Set the timeout for label enumeration (default: 10 seconds).
    pub fn label_timeout(mut self, timeout: Duration) -> Self {
        self.label_timeout = Some(timeout);
        self
    }

    /// Set a timeout for each range query (default: none).
    pub fn query_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.query_timeout = timeout;
        self
    }

    /// Build the client.
    pub fn build(self) -> Result<PrometheusClient, ClientError> {
        let raw = self
            .endpoint
            .unwrap_or_else(|| "http://localhost:9090".to_string());
        let endpoint =
            Url::parse(&raw).map_err(|e| ClientError::InvalidEndpoint(format!("{raw}: {e}")))?;
        if endpoint.cannot_be_a_base() {
            return Err(ClientError::InvalidEndpoint(raw));
        }

        let client = Client::builder()
            .user_agent(concat!("promstorm/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(PrometheusClient {
            client,
            endpoint,
            bearer_token: self.bearer_token,
            label_timeout: self.label_timeout.unwrap_or(Duration::from_secs(10)),
            query_timeout: self.query_timeout,
        })
    }
}

/// Cut a response body down to something fit for a log line.
fn excerpt(body: &str) -> &str {
    if body.len() <= MAX_ERROR_BODY {
        return body;
    }
    let mut end = MAX_ERROR_BODY;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    &body[..end]
}

/// Envelope of the label values endpoint.
#[derive(Debug, Deserialize)]
pub struct LabelValuesResponse {
    /// `"success"` or `"error"`.
    #[serde(default)]
    pub status: String,
    /// The label values.
    #[serde(default)]
    pub data: Option<Vec<String>>,
}

/// Envelope of the range query endpoint.
#[derive(Debug, Deserialize)]
pub struct RangeQueryResponse {
    /// `"success"` or `"error"`.
    #[serde(default)]
    pub status: String,
    /// The query result.
    #[serde(default)]
    pub data: Option<RangeQueryData>,
}

/// Payload of a range query response.
#[derive(Debug, Deserialize)]
pub struct RangeQueryData {
    /// Usually `"matrix"` for range queries.
    #[serde(default, rename = "resultType")]
    pub result_type: String,
    /// Raw result; never interpreted.
    #[serde(default)]
    pub result: serde_json::Value,
}
