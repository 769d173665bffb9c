// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! VHost set reconciliation.
//!
//! An application's public routes are declared as a set of raw strings
//! (`example.com`, `Example.com/api/`). This module turns that set into a
//! canonical, ordered list of [`VHost`]s and computes which routes the
//! platform attached on its own and must be removed.
//!
//! Two comparison modes coexist:
//! - [`reconcile`] and [`plan_changes`] compare normalized forms.
//! - [`diff`] compares raw strings, because deletion calls must address the
//!   platform's own representation of a route.

use std::collections::{BTreeSet, HashSet};
use std::fmt;

use serde::Serialize;
use tracing::{debug, warn};

use crate::error::InvalidHostError;
use crate::hostname::{self, Host};

/// A publicly routable endpoint: host plus path prefix.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct VHost {
    host: Host,
    path_prefix: String,
}

impl VHost {
    /// Build a vhost from an already normalized host.
    ///
    /// A missing leading slash is added; an empty prefix becomes `/`.
    pub fn new(host: Host, path_prefix: impl Into<String>) -> Self {
        let path_prefix = path_prefix.into();
        let path_prefix = if path_prefix.starts_with('/') {
            path_prefix
        } else {
            format!("/{path_prefix}")
        };
        Self { host, path_prefix }
    }

    /// Parse one raw route entry.
    ///
    /// Returns `Ok(None)` when the entry has no host (blank input).
    pub fn parse(raw: &str) -> Result<Option<Self>, InvalidHostError> {
        let (host_part, rest) = hostname::split_host_path(raw);
        let host = hostname::normalize(&host_part).map_err(|e| InvalidHostError {
            raw: raw.to_string(),
            offending: e.offending,
        })?;

        if host.is_empty() {
            return Ok(None);
        }

        Ok(Some(Self {
            host,
            path_prefix: path_prefix_from(&rest),
        }))
    }

    pub fn host(&self) -> &Host {
        &self.host
    }

    pub fn path_prefix(&self) -> &str {
        &self.path_prefix
    }

    /// Host followed by the path prefix, e.g. `example.com/` or `example.com/api`.
    pub fn fqdn(&self) -> String {
        format!("{}{}", self.host, self.path_prefix)
    }

    /// Whether this route lives under the platform's default domain.
    pub fn is_default_domain(&self, suffix: &str) -> bool {
        is_default_domain(&self.host, suffix)
    }
}

impl fmt::Display for VHost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.host, self.path_prefix)
    }
}

/// Derive a path prefix from the remainder returned by [`hostname::split_host_path`].
fn path_prefix_from(rest: &str) -> String {
    let Some(path) = rest.strip_prefix('/') else {
        // No path, or only a query/fragment.
        return "/".to_string();
    };
    let path = match path.find(['?', '#']) {
        Some(idx) => &path[..idx],
        None => path,
    };
    let path = path.strip_suffix('/').unwrap_or(path);

    format!("/{path}")
}

/// Normalized plan of desired vhosts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reconciliation {
    /// Deduplicated vhosts, ordered by host then path.
    pub vhosts: BTreeSet<VHost>,
    /// One error per entry that failed to normalize.
    pub errors: Vec<InvalidHostError>,
}

impl Reconciliation {
    /// The vhosts rendered as `host/path` strings, in order.
    pub fn fqdns(&self) -> Vec<String> {
        self.vhosts.iter().map(VHost::fqdn).collect()
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Normalize, deduplicate and order a set of raw route entries.
///
/// Invalid entries are reported in [`Reconciliation::errors`] without
/// preventing the other entries from being normalized. Entries without a
/// host are dropped.
pub fn reconcile<I>(desired_raw: I) -> Reconciliation
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    let mut plan = Reconciliation::default();

    for entry in desired_raw {
        let raw = entry.as_ref();
        match VHost::parse(raw) {
            Ok(Some(vhost)) => {
                plan.vhosts.insert(vhost);
            }
            Ok(None) => debug!(raw = raw, "Skipping vhost entry without host"),
            Err(e) => {
                warn!(raw = raw, error = %e, "Invalid vhost entry");
                plan.errors.push(e);
            }
        }
    }

    debug!(
        vhosts = plan.vhosts.len(),
        errors = plan.errors.len(),
        "Reconciled desired vhosts"
    );

    plan
}

/// Entries of `observed` that are not in `desired`, by exact string equality.
///
/// The result is deduplicated and sorted. No normalization is applied, so a
/// route the platform reports in another case or format than the desired one
/// is considered extra.
pub fn diff<D, O>(desired: D, observed: O) -> Vec<String>
where
    D: IntoIterator,
    D::Item: AsRef<str>,
    O: IntoIterator,
    O::Item: AsRef<str>,
{
    let desired: HashSet<String> = desired
        .into_iter()
        .map(|d| d.as_ref().to_string())
        .collect();

    observed
        .into_iter()
        .filter(|o| !desired.contains(o.as_ref()))
        .map(|o| o.as_ref().to_string())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Routes to attach and detach to move from `observed` to `desired`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VHostChanges {
    /// Desired vhosts the platform does not have yet.
    pub to_add: Vec<VHost>,
    /// Observed entries, verbatim, whose vhost is not desired.
    pub to_remove: Vec<String>,
    /// Desired entries that failed to normalize.
    pub errors: Vec<InvalidHostError>,
}

impl VHostChanges {
    pub fn is_empty(&self) -> bool {
        self.to_add.is_empty() && self.to_remove.is_empty()
    }
}

/// Compute the update plan between desired entries and the platform's routes.
///
/// Comparison happens on normalized vhosts; removals keep the raw observed
/// form. Observed entries that do not normalize are always removed.
pub fn plan_changes<D, O>(desired_raw: D, observed_raw: O) -> VHostChanges
where
    D: IntoIterator,
    D::Item: AsRef<str>,
    O: IntoIterator,
    O::Item: AsRef<str>,
{
    let desired = reconcile(desired_raw);

    let mut attached: BTreeSet<VHost> = BTreeSet::new();
    let mut to_remove: BTreeSet<String> = BTreeSet::new();

    for entry in observed_raw {
        let raw = entry.as_ref();
        match VHost::parse(raw) {
            Ok(Some(vhost)) => {
                if !desired.vhosts.contains(&vhost) {
                    to_remove.insert(raw.to_string());
                }
                attached.insert(vhost);
            }
            Ok(None) => {}
            Err(_) => {
                to_remove.insert(raw.to_string());
            }
        }
    }

    let to_add: Vec<VHost> = desired.vhosts.difference(&attached).cloned().collect();

    debug!(
        add = to_add.len(),
        remove = to_remove.len(),
        "Planned vhost changes"
    );

    VHostChanges {
        to_add,
        to_remove: to_remove.into_iter().collect(),
        errors: desired.errors,
    }
}

/// Whether `host` is the default domain `suffix` or one of its subdomains.
pub fn is_default_domain(host: &Host, suffix: &str) -> bool {
    let suffix = suffix.trim().trim_matches('.').to_lowercase();
    if suffix.is_empty() {
        return false;
    }

    let host = host.as_str();
    host == suffix
        || host
            .strip_suffix(suffix.as_str())
            .is_some_and(|head| head.ends_with('.'))
}
