//! HTTP data source.
//!
//! Issues plain `GET` requests with a shared [`reqwest::Client`] and hands the
//! body back untouched.  Status and transport failures are translated into
//! [`FetchError`] so the dashboard can show a readable message.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;

use super::DataSource;
use crate::error::FetchError;

/// A telemetry endpoint reached over HTTP(S).
pub struct HttpSource {
    client: reqwest::Client,
    /// Per-request timeout.  `None` waits for as long as the OS allows.
    timeout: Option<Duration>,
    /// A human-readable label used in log lines.
    label: String,
}

impl HttpSource {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            timeout: None,
            label: label.into(),
        }
    }

    /// Abort any request that takes longer than `timeout`.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    fn classify(&self, err: reqwest::Error) -> FetchError {
        match self.timeout {
            Some(limit) if err.is_timeout() => FetchError::Timeout(limit),
            _ => FetchError::Network(err.to_string()),
        }
    }
}

#[async_trait]
impl DataSource for HttpSource {
    fn name(&self) -> &str {
        &self.label
    }

    async fn fetch(&self, url: &str) -> Result<Bytes, FetchError> {
        let mut request = self.client.get(url);
        if let Some(limit) = self.timeout {
            request = request.timeout(limit);
        }

        let response = request.send().await.map_err(|e| self.classify(e))?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::HttpStatus {
                status: status.as_u16(),
            });
        }

        response.bytes().await.map_err(|e| self.classify(e))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
