//! Fetch error taxonomy.
//!
//! Every way a poll can fail ends up as a [`FetchError`].  Its [`Display`]
//! output is what the dashboard shows in the status bar, so messages are
//! short and human-readable.
//!
//! There are two families:
//!
//! * **HTTP status failures** — the server answered, but not with a 2xx.
//! * **Network / decode failures** — the request never completed, timed out,
//!   or the body was not the JSON we expected.
//!
//! None of these are fatal.  The polling resource keeps the last good reading
//! and tries again on the next tick.

use std::time::Duration;

use thiserror::Error;

/// A single failed poll.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    /// The server responded with a non-success status code.
    #[error("Failed to fetch (HTTP {status})")]
    HttpStatus { status: u16 },

    /// Connection, DNS, TLS or body-read failure.
    #[error("{0}")]
    Network(String),

    /// The request did not complete within the configured timeout.
    #[error("Request timed out after {}ms", .0.as_millis())]
    Timeout(Duration),

    /// The body was received but could not be decoded as the expected JSON.
    #[error("Invalid JSON: {0}")]
    Decode(String),
}

impl FetchError {
    /// `true` for the "server answered with an error status" family.
    pub fn is_http_status(&self) -> bool {
        matches!(self, FetchError::HttpStatus { .. })
    }
}

impl From<serde_json::Error> for FetchError {
    fn from(e: serde_json::Error) -> Self {
        FetchError::Decode(e.to_string())
    }
}
