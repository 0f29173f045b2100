//! Background telemetry polling.
//!
//! A [`PollingResource`] keeps one JSON resource fresh: on activation it
//! fetches immediately, then again every `interval`, and publishes the latest
//! `{data, error, loading}` through a [`watch`] channel that the UI reads.
//!
//! ## Lifecycle
//!
//! ```text
//!  activate(k1) ──► [fetch now] ─ interval ─► [fetch] ─ interval ─► ...
//!  activate(k2) ──► abort k1 timer + in-flight, reset state, start over
//!  deactivate() ──► abort timer + in-flight, key cleared, data frozen
//! ```
//!
//! ## Stale results
//!
//! Every activation bumps a generation counter stored alongside the state.
//! Each fetch carries the generation it was issued under plus a per-activation
//! sequence number.  The check and the write happen together inside
//! [`watch::Sender::send_if_modified`], so a settlement from a superseded key
//! can never land, even if it races the abort.
//!
//! Requests are allowed to overlap when the server is slower than the poll
//! interval, up to [`MAX_IN_FLIGHT`] at once.  Only a result newer than the
//! last applied one is kept; an older straggler that settles late is dropped.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use tokio::sync::watch;
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::error::FetchError;
use crate::source::DataSource;

/// How often the resource re-fetches when no interval is configured.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(5000);

/// Upper bound on concurrent requests for one activation.  Ticks that find
/// this many still pending are skipped.
pub const MAX_IN_FLIGHT: usize = 4;

/// Outcome of the most recent applied attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchStatus {
    /// Nothing has settled since activation.
    Pending,
    Success,
    Failed,
}

/// Live view of a polled resource.
#[derive(Debug, Clone)]
pub struct ResourceState<K, T> {
    /// Key this state belongs to.  `None` before the first activation.
    pub key: Option<K>,
    /// Last successfully decoded payload for `key`.
    pub data: Option<T>,
    /// Message of the last failure, cleared by the next success.
    pub error: Option<String>,
    /// `true` from activation until the first settlement, success or not.
    pub loading: bool,
    pub status: FetchStatus,
    /// When the last settlement was applied.
    pub last_updated: Option<DateTime<Utc>>,
    generation: u64,
    applied_seq: u64,
}

impl<K, T> Default for ResourceState<K, T> {
    fn default() -> Self {
        Self {
            key: None,
            data: None,
            error: None,
            loading: false,
            status: FetchStatus::Pending,
            last_updated: None,
            generation: 0,
            applied_seq: 0,
        }
    }
}

/// Identifies which activation, and which tick within it, issued a fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Ticket {
    generation: u64,
    seq: u64,
}

type UrlForKey<K> = Arc<dyn Fn(&K) -> String + Send + Sync>;

/// Polls `url_for_key(key)` on a fixed interval for the active key.
///
/// Must be used from within a tokio runtime: activation spawns the timer task.
pub struct PollingResource<K, T> {
    source: Arc<dyn DataSource>,
    url_for_key: UrlForKey<K>,
    interval: Duration,
    state: Arc<watch::Sender<ResourceState<K, T>>>,
    active: Option<(K, JoinHandle<()>)>,
}

impl<K, T> PollingResource<K, T>
where
    K: Clone + PartialEq + fmt::Debug + Send + Sync + 'static,
    T: DeserializeOwned + Clone + Send + Sync + 'static,
{
    /// Create an inactive resource.
    ///
    /// A zero `interval` is bumped to one millisecond; [`tokio::time::interval`]
    /// rejects zero periods.
    pub fn new(
        source: Arc<dyn DataSource>,
        url_for_key: impl Fn(&K) -> String + Send + Sync + 'static,
        interval: Duration,
    ) -> Self {
        let (state, _) = watch::channel(ResourceState::default());
        Self {
            source,
            url_for_key: Arc::new(url_for_key),
            interval: interval.max(Duration::from_millis(1)),
            state: Arc::new(state),
            active: None,
        }
    }

    /// Subscribe to state changes.
    pub fn subscribe(&self) -> watch::Receiver<ResourceState<K, T>> {
        self.state.subscribe()
    }

    /// Clone of the current state.
    pub fn snapshot(&self) -> ResourceState<K, T> {
        self.state.borrow().clone()
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn active_key(&self) -> Option<&K> {
        self.active.as_ref().map(|(key, _)| key)
    }

    /// Start polling `key`.
    ///
    /// If `key` is already being polled this does nothing.  Otherwise any
    /// previous timer and in-flight requests are abandoned, state is reset to
    /// `loading` with no data, and the first fetch is issued immediately.
    pub fn activate(&mut self, key: K) {
        if self.active_key() == Some(&key) {
            return;
        }
        self.start(key);
    }

    /// Restart polling on the current key, discarding its data.
    pub fn restart(&mut self) {
        if let Some(key) = self.active_key().cloned() {
            self.start(key);
        }
    }

    /// Stop polling and clear the state's key.  Nothing issued before this
    /// call can change state after it.
    pub fn deactivate(&mut self) {
        let Some((key, task)) = self.active.take() else {
            return;
        };
        task.abort();
        // Retire the generation; the last data and error stay visible.
        self.state.send_modify(|s| {
            s.generation += 1;
            s.key = None;
        });
        info!(key = ?key, "polling stopped");
    }

    fn start(&mut self, key: K) {
        if let Some((_, task)) = self.active.take() {
            task.abort();
        }

        let mut generation = 0;
        self.state.send_modify(|s| {
            s.generation += 1;
            generation = s.generation;
            s.key = Some(key.clone());
            s.data = None;
            s.error = None;
            s.loading = true;
            s.status = FetchStatus::Pending;
            s.last_updated = None;
            s.applied_seq = 0;
        });

        let url = (self.url_for_key)(&key);
        info!(
            key = ?key,
            url = %url,
            interval_ms = self.interval.as_millis() as u64,
            source = self.source.name(),
            "polling started"
        );

        let task = tokio::spawn(run_poll_loop::<K, T>(
            Arc::clone(&self.source),
            url,
            self.interval,
            Arc::clone(&self.state),
            generation,
        ));
        self.active = Some((key, task));
    }
}

impl<K, T> Drop for PollingResource<K, T> {
    fn drop(&mut self) {
        if let Some((_, task)) = self.active.take() {
            task.abort();
            self.state.send_if_modified(|s| {
                s.generation += 1;
                false
            });
        }
    }
}

/// Timer loop for one activation.
///
/// Fetches live in a [`JoinSet`] owned by this future, so aborting the task
/// also aborts every request it issued.
async fn run_poll_loop<K, T>(
    source: Arc<dyn DataSource>,
    url: String,
    interval: Duration,
    state: Arc<watch::Sender<ResourceState<K, T>>>,
    generation: u64,
) where
    K: fmt::Debug + Send + Sync + 'static,
    T: DeserializeOwned + Send + Sync + 'static,
{
    // The first tick completes immediately.
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let mut in_flight = JoinSet::new();
    let mut seq = 0;

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                if in_flight.len() >= MAX_IN_FLIGHT {
                    warn!(
                        url = %url,
                        in_flight = in_flight.len(),
                        "skipping poll, earlier requests still pending"
                    );
                    continue;
                }
                seq += 1;
                let ticket = Ticket { generation, seq };
                let source = Arc::clone(&source);
                let state = Arc::clone(&state);
                let url = url.clone();
                in_flight.spawn(async move {
                    let outcome = fetch_decoded::<T>(source.as_ref(), &url).await;
                    apply_settlement(&state, ticket, outcome);
                });
            }
            Some(_) = in_flight.join_next(), if !in_flight.is_empty() => {}
        }
    }
}

async fn fetch_decoded<T: DeserializeOwned>(
    source: &dyn DataSource,
    url: &str,
) -> Result<T, FetchError> {
    let body = source.fetch(url).await?;
    Ok(serde_json::from_slice(&body)?)
}

/// Write a settled fetch into `state` unless it is stale.
///
/// Returns `true` if the state changed.
fn apply_settlement<K: fmt::Debug, T>(
    state: &watch::Sender<ResourceState<K, T>>,
    ticket: Ticket,
    outcome: Result<T, FetchError>,
) -> bool {
    state.send_if_modified(|s| {
        if s.generation != ticket.generation {
            debug!(
                generation = ticket.generation,
                current = s.generation,
                "dropping result from superseded activation"
            );
            return false;
        }
        if ticket.seq <= s.applied_seq {
            debug!(
                seq = ticket.seq,
                applied = s.applied_seq,
                "dropping out-of-order result"
            );
            return false;
        }

        s.applied_seq = ticket.seq;
        s.loading = false;
        s.last_updated = Some(Utc::now());
        match outcome {
            Ok(data) => {
                s.data = Some(data);
                s.error = None;
                s.status = FetchStatus::Success;
            }
            Err(e) => {
                warn!(
                    key = ?s.key,
                    error = %e,
                    http_status = e.is_http_status(),
                    "poll failed"
                );
                s.error = Some(e.to_string());
                s.status = FetchStatus::Failed;
            }
        }
        true
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
