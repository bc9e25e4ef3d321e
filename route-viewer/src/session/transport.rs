//! Transport seam for the solve stream.
//!
//! The controller only needs "send this problem, give me the body as a byte
//! stream". [`HttpSolveTransport`] does that over HTTP; tests substitute
//! in-memory streams.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use futures::{Stream, StreamExt};
use serde_json::Value;

use crate::stream::TransportError;

use super::options::SolveOptions;

/// Default base URL of the solve service.
const DEFAULT_BASE_URL: &str = "http://localhost:8000";

/// Path of the streaming solve endpoint.
const SOLVE_STREAM_PATH: &str = "/solve-stream";

/// Response body as a stream of raw chunks.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Vec<u8>, TransportError>> + Send>>;

/// Opens one streamed solve request.
///
/// Dropping the returned stream must abort the underlying request.
pub trait SolveTransport: Send + Sync + 'static {
    fn open(
        &self,
        problem: &Value,
        options: &SolveOptions,
    ) -> impl Future<Output = Result<ByteStream, TransportError>> + Send;
}

/// Configuration for the HTTP solve transport.
#[derive(Debug, Clone)]
pub struct SolverClientConfig {
    /// Base URL of the solve service
    pub base_url: String,
    /// Connect timeout in seconds. The body itself is unbounded because
    /// a solve runs for up to the requested time limit.
    pub connect_timeout_secs: u64,
}

impl SolverClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    /// Set the connect timeout.
    pub fn with_connect_timeout(mut self, secs: u64) -> Self {
        self.connect_timeout_secs = secs;
        self
    }
}

impl Default for SolverClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            connect_timeout_secs: 10,
        }
    }
}

/// Solve transport over HTTP.
#[derive(Debug, Clone)]
pub struct HttpSolveTransport {
    http: reqwest::Client,
    base_url: String,
}

impl HttpSolveTransport {
    pub fn new(config: SolverClientConfig) -> Result<Self, TransportError> {
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Full URL of the streaming endpoint.
    pub fn endpoint(&self) -> String {
        format!("{}{}", self.base_url, SOLVE_STREAM_PATH)
    }
}

impl SolveTransport for HttpSolveTransport {
    async fn open(
        &self,
        problem: &Value,
        options: &SolveOptions,
    ) -> Result<ByteStream, TransportError> {
        let response = self
            .http
            .post(self.endpoint())
            .query(&options.query_params())
            .json(problem)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Status {
                status: status.as_u16(),
            });
        }

        let body = response
            .bytes_stream()
            .map(|chunk| chunk.map(|bytes| bytes.to_vec()).map_err(TransportError::from));

        Ok(Box::pin(body))
    }
}
