// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Long-running operation watcher.
//!
//! Provisioning calls on the platform return before the resource is ready,
//! and the platform has no push notification for status changes. The watcher
//! polls a [`StatusSource`] at a fixed interval from a background task and
//! forwards status *transitions* to the caller through a [`StatusStream`].
//!
//! # Behavior
//!
//! - One fetch per tick (sleep, then poll). A failed fetch is logged and the
//!   tick is skipped.
//! - A snapshot is emitted only when its status differs from the last
//!   emitted one.
//! - The stream ends right after a terminal status (success or failure).
//! - Cancelling the token, dropping the stream or reaching the deadline stops
//!   the poll loop, abandoning an in-flight fetch or a send blocked on a full
//!   buffer.
//!
//! Statuses that begin and end between two ticks are never observed.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! use clevercloud_provider_core::watcher::{PollError, StatusSource, WatchOptions, Watcher};
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let source: Arc<dyn StatusSource<String>> = Arc::new(|_id: String| async move {
//!     // Query the platform here.
//!     Ok::<_, PollError>("ACTIVE".to_string())
//! });
//!
//! let watcher = Watcher::new(source, WatchOptions::new(Duration::from_secs(2)));
//! let ready = watcher.wait("postgresql_1234", CancellationToken::new()).await?;
//! println!("ready: {ready}");
//! # Ok(())
//! # }
//! ```

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;

use async_trait::async_trait;
use futures::Stream;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

pub use crate::error::{PollError, WatchError};

/// Buffered snapshots between the poll loop and the consumer.
const CHANNEL_CAPACITY: usize = 16;

/// Consecutive fetch failures after which each further failure is a warning.
const FAILURE_WARN_THRESHOLD: u32 = 5;

/// A value describing the state of a remote resource at one point in time.
pub trait StatusSnapshot: Clone + Send + 'static {
    /// The platform's status string, e.g. `DEPLOYING` or `ACTIVE`.
    fn status(&self) -> &str;
}

impl StatusSnapshot for String {
    fn status(&self) -> &str {
        self
    }
}

/// Generic status snapshot for resources that only need a few fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusReport {
    pub resource_id: String,
    pub status: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub endpoint: Option<String>,
}

impl StatusSnapshot for StatusReport {
    fn status(&self) -> &str {
        &self.status
    }
}

/// Fetches the current snapshot of a resource.
#[async_trait]
pub trait StatusSource<S: StatusSnapshot>: Send + Sync {
    async fn fetch(&self, resource_id: &str) -> Result<S, PollError>;
}

#[async_trait]
impl<S, F, Fut> StatusSource<S> for F
where
    S: StatusSnapshot,
    F: Fn(String) -> Fut + Send + Sync,
    Fut: Future<Output = Result<S, PollError>> + Send + 'static,
{
    async fn fetch(&self, resource_id: &str) -> Result<S, PollError> {
        (self)(resource_id.to_string()).await
    }
}

/// Polling cadence, terminal statuses and deadline of a watch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchOptions {
    /// Delay before each fetch.
    pub poll_interval: Duration,
    /// Statuses meaning the operation succeeded.
    pub success_statuses: Vec<String>,
    /// Statuses meaning the operation failed.
    pub failure_statuses: Vec<String>,
    /// Stop watching after this long. `None` watches until cancelled.
    pub timeout: Option<Duration>,
}

impl Default for WatchOptions {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(2),
            success_statuses: vec!["ACTIVE".to_string()],
            failure_statuses: vec!["FAILED".to_string()],
            timeout: None,
        }
    }
}

impl WatchOptions {
    /// Default terminal statuses with the given poll interval.
    pub fn new(poll_interval: Duration) -> Self {
        Self {
            poll_interval,
            ..Self::default()
        }
    }

    /// Set the poll interval.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Replace the success statuses.
    pub fn with_success_statuses<I, T>(mut self, statuses: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.success_statuses = statuses.into_iter().map(Into::into).collect();
        self
    }

    /// Replace the failure statuses.
    pub fn with_failure_statuses<I, T>(mut self, statuses: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.failure_statuses = statuses.into_iter().map(Into::into).collect();
        self
    }

    /// Set the deadline.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Watch until cancelled.
    pub fn without_timeout(mut self) -> Self {
        self.timeout = None;
        self
    }

    pub fn is_success(&self, status: &str) -> bool {
        self.success_statuses.iter().any(|s| s == status)
    }

    pub fn is_failure(&self, status: &str) -> bool {
        self.failure_statuses.iter().any(|s| s == status)
    }

    pub fn is_terminal(&self, status: &str) -> bool {
        self.is_success(status) || self.is_failure(status)
    }
}

/// Watches remote resources until they reach a terminal status.
pub struct Watcher<S: StatusSnapshot> {
    source: Arc<dyn StatusSource<S>>,
    options: Arc<WatchOptions>,
}

impl<S: StatusSnapshot> Clone for Watcher<S> {
    fn clone(&self) -> Self {
        Self {
            source: Arc::clone(&self.source),
            options: Arc::clone(&self.options),
        }
    }
}

impl<S: StatusSnapshot> std::fmt::Debug for Watcher<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Watcher")
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl<S: StatusSnapshot> Watcher<S> {
    pub fn new(source: Arc<dyn StatusSource<S>>, options: WatchOptions) -> Self {
        Self {
            source,
            options: Arc::new(options),
        }
    }

    pub fn options(&self) -> &WatchOptions {
        &self.options
    }

    /// Start polling `resource_id` in a background task.
    ///
    /// The returned stream owns a child of `cancel`: cancelling `cancel` or
    /// dropping the stream stops the task. Must be called within a tokio
    /// runtime.
    pub fn watch(
        &self,
        resource_id: impl Into<String>,
        cancel: CancellationToken,
    ) -> StatusStream<S> {
        let resource_id = resource_id.into();
        let cancel = cancel.child_token();
        let deadline = self.options.timeout.map(|t| Instant::now() + t);
        let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);

        let poll_loop = PollLoop {
            source: Arc::clone(&self.source),
            options: Arc::clone(&self.options),
            resource_id,
            deadline,
            tx,
            cancel: cancel.clone(),
        };
        tokio::spawn(poll_loop.run());

        StatusStream {
            rx,
            cancel,
            terminated: false,
        }
    }

    /// Watch `resource_id` until it reaches a terminal status.
    ///
    /// Returns the success snapshot, or the reason the operation did not
    /// succeed.
    pub async fn wait(
        &self,
        resource_id: impl Into<String>,
        cancel: CancellationToken,
    ) -> Result<S, WatchError> {
        let resource_id = resource_id.into();
        let mut stream = self.watch(resource_id.clone(), cancel.clone());

        let mut last = None;
        while let Some(snapshot) = stream.recv().await {
            last = Some(snapshot);
        }

        match last {
            Some(snapshot) if self.options.is_success(snapshot.status()) => Ok(snapshot),
            Some(snapshot) if self.options.is_failure(snapshot.status()) => {
                Err(WatchError::Failed {
                    resource_id,
                    status: snapshot.status().to_string(),
                })
            }
            _ if cancel.is_cancelled() => Err(WatchError::Cancelled { resource_id }),
            _ => match self.options.timeout {
                Some(timeout) => Err(WatchError::TimedOut {
                    resource_id,
                    timeout_secs: timeout.as_secs(),
                }),
                None => Err(WatchError::Closed { resource_id }),
            },
        }
    }
}

/// Why the poll loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Exit {
    Terminal,
    Cancelled,
    ConsumerGone,
    DeadlineExceeded,
}

struct PollLoop<S: StatusSnapshot> {
    source: Arc<dyn StatusSource<S>>,
    options: Arc<WatchOptions>,
    resource_id: String,
    deadline: Option<Instant>,
    tx: mpsc::Sender<S>,
    cancel: CancellationToken,
}

impl<S: StatusSnapshot> PollLoop<S> {
    async fn run(self) {
        info!(
            resource_id = %self.resource_id,
            poll_interval = ?self.options.poll_interval,
            "Operation watcher started"
        );

        let exit = self.poll().await;

        match exit {
            Exit::DeadlineExceeded => warn!(
                resource_id = %self.resource_id,
                "Operation watcher deadline exceeded"
            ),
            _ => info!(
                resource_id = %self.resource_id,
                exit = ?exit,
                "Operation watcher stopped"
            ),
        }
    }

    async fn poll(&self) -> Exit {
        let mut last_emitted: Option<String> = None;
        let mut consecutive_failures = 0u32;

        loop {
            tokio::select! {
                biased;

                _ = self.cancel.cancelled() => return Exit::Cancelled,
                _ = self.tx.closed() => return Exit::ConsumerGone,
                _ = deadline_elapsed(self.deadline) => return Exit::DeadlineExceeded,
                _ = tokio::time::sleep(self.options.poll_interval) => {}
            }

            let fetched = tokio::select! {
                biased;

                _ = self.cancel.cancelled() => return Exit::Cancelled,
                _ = self.tx.closed() => return Exit::ConsumerGone,
                _ = deadline_elapsed(self.deadline) => return Exit::DeadlineExceeded,
                result = self.source.fetch(&self.resource_id) => result,
            };

            let snapshot = match fetched {
                Ok(snapshot) => {
                    consecutive_failures = 0;
                    snapshot
                }
                Err(e) => {
                    consecutive_failures += 1;
                    if consecutive_failures >= FAILURE_WARN_THRESHOLD {
                        warn!(
                            resource_id = %self.resource_id,
                            error = %e,
                            consecutive_failures,
                            "Status fetch keeps failing, retrying on next tick"
                        );
                    } else {
                        debug!(
                            resource_id = %self.resource_id,
                            error = %e,
                            "Status fetch failed, retrying on next tick"
                        );
                    }
                    continue;
                }
            };

            let status = snapshot.status().to_string();
            if last_emitted.as_deref() == Some(status.as_str()) {
                continue;
            }

            let terminal = self.options.is_terminal(&status);
            debug!(
                resource_id = %self.resource_id,
                status = %status,
                previous = ?last_emitted,
                terminal,
                "Status transition"
            );

            tokio::select! {
                biased;

                _ = self.cancel.cancelled() => return Exit::Cancelled,
                _ = deadline_elapsed(self.deadline) => return Exit::DeadlineExceeded,
                sent = self.tx.send(snapshot) => {
                    if sent.is_err() {
                        return Exit::ConsumerGone;
                    }
                }
            }

            if terminal {
                return Exit::Terminal;
            }
            last_emitted = Some(status);
        }
    }
}

async fn deadline_elapsed(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

/// Status transitions of one watched resource.
///
/// Ends after a terminal snapshot, or as soon as the watch is cancelled.
/// Dropping the stream stops the background poll loop.
pub struct StatusStream<S> {
    rx: mpsc::Receiver<S>,
    cancel: CancellationToken,
    terminated: bool,
}

impl<S> StatusStream<S> {
    /// Receive the next transition, or `None` once the stream has ended.
    pub async fn recv(&mut self) -> Option<S> {
        std::future::poll_fn(|cx| self.poll_recv(cx)).await
    }

    /// Stop the poll loop. Buffered snapshots are discarded.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    fn poll_recv(&mut self, cx: &mut Context<'_>) -> Poll<Option<S>> {
        if self.terminated || self.cancel.is_cancelled() {
            return Poll::Ready(None);
        }

        match self.rx.poll_recv(cx) {
            Poll::Ready(None) => {
                self.terminated = true;
                Poll::Ready(None)
            }
            other => other,
        }
    }
}

impl<S> Stream for StatusStream<S> {
    type Item = S;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<S>> {
        self.get_mut().poll_recv(cx)
    }
}

impl<S> Drop for StatusStream<S> {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

impl<S> std::fmt::Debug for StatusStream<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StatusStream")
            .field("cancelled", &self.cancel.is_cancelled())
            .field("terminated", &self.terminated)
            .finish()
    }
}
