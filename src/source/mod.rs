//! Data source abstraction layer.
//!
//! This module defines the [`DataSource`] trait and the telemetry payload type
//! [`SensorReading`].  The concrete HTTP transport lives in [`http`].
//!
//! ## For contributors — adding a new transport
//!
//! 1. Create a new file in this directory (e.g. `mqtt_bridge.rs`).
//! 2. Define a struct and implement [`DataSource`] for it.
//! 3. Add `mod mqtt_bridge;` below and re-export your struct.
//! 4. Construct it in `main.rs` instead of [`HttpSource`].
//!
//! The polling resource, decoding and UI are all transport-agnostic: a source
//! only has to hand back the raw response body.

mod http;
mod sensor_reading;

pub use http::HttpSource;
pub use sensor_reading::{SensorReading, METRICS};

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::FetchError;

/// Trait that every data source must implement.
///
/// The polling resource calls [`fetch()`](DataSource::fetch) from spawned
/// tokio tasks, possibly several at once when a response is slower than the
/// poll interval, so implementations must be [`Send`] + [`Sync`].
#[async_trait]
pub trait DataSource: Send + Sync {
    /// Human-readable label used in log lines.
    fn name(&self) -> &str;

    /// Fetch the raw body behind `url`.
    ///
    /// A non-success response must be reported as
    /// [`FetchError::HttpStatus`]; decoding is left to the caller.
    async fn fetch(&self, url: &str) -> Result<Bytes, FetchError>;
}
