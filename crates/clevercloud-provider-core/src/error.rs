// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Error types for clevercloud-provider-core.

use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

/// Result type using the crate-level [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Any error produced by this crate.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    InvalidHost(#[from] InvalidHostError),

    #[error(transparent)]
    Backup(#[from] BackupError),

    #[error(transparent)]
    Watch(#[from] WatchError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Telemetry(#[from] TelemetryError),
}

/// A host string still contains illegal characters after normalization.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid host {raw:?}: contains illegal character {offending:?}")]
pub struct InvalidHostError {
    /// The entry as the user declared it.
    pub raw: String,
    /// First illegal character found.
    pub offending: char,
}

/// Failure of a single status fetch.
///
/// The watcher treats every variant as transient: the tick is skipped and
/// the resource is polled again on the next one.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PollError {
    /// The request did not complete (network, 5xx, rate limit).
    #[error("transport error: {0}")]
    Transport(String),

    /// The platform does not know the resource yet.
    #[error("resource not found: {0}")]
    NotFound(String),

    /// The response could not be decoded.
    #[error("decode error: {0}")]
    Decode(String),
}

/// Why no backup matched a selector.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BackupNotFoundError {
    /// The collection is empty.
    #[error("no backups available yet, wait for the first backup to complete")]
    NoBackups,

    /// No backup carries the requested identifier.
    #[error("no backup with id {id}, check the backup identifier")]
    IdNotFound { id: Uuid },

    /// Every backup is newer than the cutoff.
    #[error(
        "no backup created at or before {cutoff}, the oldest available backup dates from {oldest}"
    )]
    NoneBeforeDate {
        cutoff: DateTime<Utc>,
        oldest: DateTime<Utc>,
    },
}

/// A backup selector string is neither `latest`, a UUID nor a timestamp.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error(
    "invalid backup selector {input:?}: expected \"latest\", a backup UUID or an RFC 3339 timestamp"
)]
pub struct SelectorParseError {
    pub input: String,
}

/// Parse-then-select failure, keeping the two classes apart.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BackupError {
    #[error(transparent)]
    Parse(#[from] SelectorParseError),

    #[error(transparent)]
    NotFound(#[from] BackupNotFoundError),
}

/// Outcome of waiting for an operation that did not end in success.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WatchError {
    /// The resource reached a failure terminal status.
    #[error("resource {resource_id} reached failure status {status}")]
    Failed { resource_id: String, status: String },

    /// The deadline elapsed before a terminal status was observed.
    #[error("resource {resource_id} did not reach a terminal status within {timeout_secs}s")]
    TimedOut {
        resource_id: String,
        timeout_secs: u64,
    },

    /// The caller cancelled the watch.
    #[error("watch of resource {resource_id} was cancelled")]
    Cancelled { resource_id: String },

    /// The stream ended without a terminal status.
    #[error("status stream of resource {resource_id} closed unexpectedly")]
    Closed { resource_id: String },
}

/// Configuration errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// An environment variable has an invalid value.
    #[error("invalid value for {0}: {1}")]
    Invalid(&'static str, &'static str),
}

/// Logging bootstrap errors.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// The default directive could not be parsed.
    #[error("invalid log filter directive: {0}")]
    Directive(String),

    /// A global subscriber is already installed.
    #[error("failed to install tracing subscriber: {0}")]
    Install(String),
}
