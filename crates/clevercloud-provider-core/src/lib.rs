// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Clever Cloud provider core
//!
//! Computational pieces shared by the resources and data sources of the
//! Clever Cloud provisioning provider. The schema declarations, API client
//! and CRUD glue live elsewhere and call into this crate.
//!
//! # Components
//!
//! - [`hostname`] - normalizes user-declared hosts
//! - [`vhost`] - reconciles declared routes with the platform's
//! - [`watcher`] - polls a resource until its provisioning ends
//! - [`backup`] - resolves `latest` / UUID / date selectors against backups
//! - [`env_drift`] - decides whether an environment change needs a restart
//!
//! Everything except the watcher is synchronous and pure.
//!
//! # Example
//!
//! ```
//! use std::collections::HashMap;
//!
//! use clevercloud_provider_core::{env_drift, vhost};
//!
//! let plan = vhost::reconcile(["Example.com/", "example.com.", "api.example.com/v1/"]);
//! assert_eq!(plan.fqdns(), vec!["api.example.com/v1", "example.com/"]);
//!
//! let extra = vhost::diff(["example.com/"], ["example.com/", "app-42.cleverapps.io/"]);
//! assert_eq!(extra, vec!["app-42.cleverapps.io/"]);
//!
//! let desired = HashMap::from([("PORT".to_string(), "8080".to_string())]);
//! assert!(env_drift::requires_restart(&desired, &HashMap::new()));
//! ```

pub mod backup;
pub mod config;
pub mod env_drift;
pub mod error;
pub mod hostname;
pub mod telemetry;
pub mod vhost;
pub mod watcher;

pub use backup::{BackupRecord, Selector};
pub use config::ProviderConfig;
pub use env_drift::{EnvDiff, requires_restart};
pub use error::{
    BackupError, BackupNotFoundError, ConfigError, Error, InvalidHostError, PollError, Result,
    SelectorParseError, TelemetryError, WatchError,
};
pub use hostname::{Host, normalize};
pub use vhost::{Reconciliation, VHost, VHostChanges};
pub use watcher::{StatusReport, StatusSnapshot, StatusSource, StatusStream, WatchOptions, Watcher};
