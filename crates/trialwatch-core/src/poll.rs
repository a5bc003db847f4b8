//! Interval polling of a remote resource.
//!
//! `start_polling()` spawns a tokio task that calls the supplied fetch once
//! per tick and publishes the outcome into a `watch` slot. Fetches never
//! overlap: the next one is issued only after the previous one resolved, and
//! ticks missed while a slow fetch was outstanding are skipped. A failed fetch
//! is classified and stored, the loop keeps ticking.
//!
//! The returned [`PollHandle`] owns the loop. Cancelling it (explicitly or by
//! dropping it) stops the loop before any further fetch is issued.

use std::fmt::Display;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::Result;

/// Smallest accepted polling period; `tokio::time::interval` rejects zero.
const MIN_INTERVAL: Duration = Duration::from_millis(1);

/// What the consumer currently knows about a polled resource.
#[derive(Debug, Clone, PartialEq)]
pub enum ResourceState<T> {
    /// Nothing has resolved yet.
    Loading,
    Loaded(T),
    /// The last fetch reported the resource as missing.
    NotFound(String),
    /// The last fetch failed for any other reason.
    Errored(String),
}

impl<T> ResourceState<T> {
    pub fn is_loading(&self) -> bool {
        matches!(self, ResourceState::Loading)
    }

    pub fn loaded(&self) -> Option<&T> {
        match self {
            ResourceState::Loaded(value) => Some(value),
            _ => None,
        }
    }
}

/// Handle to a running poll loop.
pub struct PollHandle<T> {
    cancel: CancellationToken,
    state: watch::Receiver<ResourceState<T>>,
    fetches: Arc<AtomicU64>,
    task: JoinHandle<()>,
}

impl<T: Clone> PollHandle<T> {
    /// Current state of the resource.
    pub fn state(&self) -> ResourceState<T> {
        self.state.borrow().clone()
    }

    /// A receiver that is notified each time a fetch result is published.
    pub fn subscribe(&self) -> watch::Receiver<ResourceState<T>> {
        self.state.clone()
    }

    /// Number of fetches issued so far.
    pub fn fetch_count(&self) -> u64 {
        self.fetches.load(Ordering::SeqCst)
    }

    /// Stop the loop. Safe to call more than once.
    pub fn cancel(&self) {
        if !self.cancel.is_cancelled() {
            debug!("Cancelling poll loop");
        }
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Whether the background task has exited.
    pub fn is_stopped(&self) -> bool {
        self.task.is_finished()
    }
}

impl<T> Drop for PollHandle<T> {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// Start polling `fetch(id)` every `period`. The first fetch is issued
/// immediately.
///
/// Must be called from within a tokio runtime.
pub fn start_polling<Id, T, F, Fut>(fetch: F, id: Id, period: Duration) -> PollHandle<T>
where
    Id: Clone + Display + Send + Sync + 'static,
    T: Clone + Send + Sync + 'static,
    F: Fn(Id) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T>> + Send + 'static,
{
    let cancel = CancellationToken::new();
    let (sender, receiver) = watch::channel(ResourceState::Loading);
    let fetches = Arc::new(AtomicU64::new(0));

    let task = tokio::spawn(poll_task(
        fetch,
        id,
        period.max(MIN_INTERVAL),
        sender,
        cancel.clone(),
        fetches.clone(),
    ));

    PollHandle {
        cancel,
        state: receiver,
        fetches,
        task,
    }
}

// ─── Background poll task ────────────────────────────────────────────────────

async fn poll_task<Id, T, F, Fut>(
    fetch: F,
    id: Id,
    period: Duration,
    sender: watch::Sender<ResourceState<T>>,
    cancel: CancellationToken,
    fetches: Arc<AtomicU64>,
) where
    Id: Clone + Display,
    F: Fn(Id) -> Fut,
    Fut: Future<Output = Result<T>>,
{
    info!(resource = %id, period_ms = period.as_millis() as u64, "Polling started");

    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    // At most one fetch is in flight, so every completed fetch is also the
    // latest issued one and can be published unconditionally.
    let mut issued: u64 = 0;

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {}
        }
        if cancel.is_cancelled() {
            break;
        }

        issued += 1;
        let seq = issued;
        fetches.fetch_add(1, Ordering::SeqCst);
        debug!(resource = %id, seq, "Fetching");

        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            r = fetch(id.clone()) => r,
        };

        let next = match result {
            Ok(value) => ResourceState::Loaded(value),
            Err(e) if e.is_not_found() => {
                warn!(resource = %id, error = %e, "Resource not found");
                ResourceState::NotFound(e.to_string())
            }
            Err(e) => {
                warn!(resource = %id, error = %e, "Fetch failed");
                ResourceState::Errored(e.to_string())
            }
        };
        sender.send_replace(next);
    }

    info!(resource = %id, fetches = issued, "Polling stopped");
}
