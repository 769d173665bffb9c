// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Environment drift detection.
//!
//! Changing an application's environment only takes effect after a restart,
//! so the update path asks [`requires_restart`] before choosing between a
//! restart-inclusive and a restart-free update call.

use std::collections::{BTreeSet, HashMap};

use serde::Serialize;
use tracing::debug;

/// Whether the desired environment differs from the one last applied.
pub fn requires_restart(
    desired: &HashMap<String, String>,
    previously_applied: &HashMap<String, String>,
) -> bool {
    if desired == previously_applied {
        return false;
    }

    let diff = EnvDiff::between(desired, previously_applied);
    debug!(
        added = ?diff.added,
        removed = ?diff.removed,
        changed = ?diff.changed,
        "Environment drift detected, restart required"
    );
    true
}

/// Key-level difference between two environments.
///
/// Only variable names are kept; values may hold secrets.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EnvDiff {
    /// Keys only in the desired environment.
    pub added: BTreeSet<String>,
    /// Keys only in the applied environment.
    pub removed: BTreeSet<String>,
    /// Keys present in both with different values.
    pub changed: BTreeSet<String>,
}

impl EnvDiff {
    pub fn between(desired: &HashMap<String, String>, applied: &HashMap<String, String>) -> Self {
        let mut diff = EnvDiff::default();

        for (key, value) in desired {
            match applied.get(key) {
                None => {
                    diff.added.insert(key.clone());
                }
                Some(old) if old != value => {
                    diff.changed.insert(key.clone());
                }
                Some(_) => {}
            }
        }

        diff.removed = applied
            .keys()
            .filter(|key| !desired.contains_key(*key))
            .cloned()
            .collect();

        diff
    }

    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.changed.is_empty()
    }
}
