// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Backup selection.
//!
//! Database add-ons expose their backups as an unordered list. A data source
//! picks one of them through a single selector string:
//! - `latest` - the most recent backup
//! - a backup UUID - that exact backup
//! - an RFC 3339 timestamp or `YYYY-MM-DD` date - the most recent backup not
//!   newer than that instant (a bare date covers the whole day, UTC)

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::error::{BackupError, BackupNotFoundError, SelectorParseError};

/// A backup as reported by the platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackupRecord {
    #[serde(alias = "backup_id")]
    pub id: Uuid,
    pub creation_date: DateTime<Utc>,
    #[serde(alias = "delete_at")]
    pub deletion_date: DateTime<Utc>,
    pub download_url: String,
}

/// How to pick one backup out of a collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selector {
    /// Most recent backup.
    Latest,
    /// Backup with this exact identifier.
    ById(Uuid),
    /// Most recent backup created at or before this instant.
    BeforeOrAt(DateTime<Utc>),
}

impl FromStr for Selector {
    type Err = SelectorParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let input = s.trim();

        if input.eq_ignore_ascii_case("latest") {
            return Ok(Selector::Latest);
        }

        if let Ok(id) = Uuid::try_parse(input) {
            return Ok(Selector::ById(id));
        }

        if let Ok(ts) = DateTime::parse_from_rfc3339(input) {
            return Ok(Selector::BeforeOrAt(ts.with_timezone(&Utc)));
        }

        if let Ok(date) = NaiveDate::parse_from_str(input, "%Y-%m-%d") {
            // A bare date includes every backup taken that day.
            let end_of_day = NaiveTime::from_hms_nano_opt(23, 59, 59, 999_999_999)
                .unwrap_or_default();
            return Ok(Selector::BeforeOrAt(date.and_time(end_of_day).and_utc()));
        }

        Err(SelectorParseError {
            input: s.to_string(),
        })
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Selector::Latest => f.write_str("latest"),
            Selector::ById(id) => write!(f, "{id}"),
            Selector::BeforeOrAt(ts) => write!(f, "{}", ts.to_rfc3339()),
        }
    }
}

/// Pick the backup designated by `selector`.
///
/// Backups sharing the same creation date keep their input order.
pub fn select<'a>(
    records: &'a [BackupRecord],
    selector: &Selector,
) -> Result<&'a BackupRecord, BackupNotFoundError> {
    if records.is_empty() {
        return Err(BackupNotFoundError::NoBackups);
    }

    let selected = match selector {
        Selector::Latest => newest_first(records.iter()).into_iter().next(),
        Selector::ById(id) => records.iter().find(|r| r.id == *id),
        Selector::BeforeOrAt(cutoff) => {
            newest_first(records.iter().filter(|r| r.creation_date <= *cutoff))
                .into_iter()
                .next()
        }
    };

    match selected {
        Some(record) => {
            debug!(
                selector = %selector,
                backup_id = %record.id,
                creation_date = %record.creation_date,
                "Selected backup"
            );
            Ok(record)
        }
        None => Err(not_found(records, selector)),
    }
}

/// Parse `raw` as a [`Selector`] and apply it.
pub fn select_str<'a>(
    records: &'a [BackupRecord],
    raw: &str,
) -> Result<&'a BackupRecord, BackupError> {
    let selector: Selector = raw.parse()?;
    Ok(select(records, &selector)?)
}

fn newest_first<'a>(records: impl Iterator<Item = &'a BackupRecord>) -> Vec<&'a BackupRecord> {
    let mut sorted: Vec<&BackupRecord> = records.collect();
    sorted.sort_by(|a, b| b.creation_date.cmp(&a.creation_date));
    sorted
}

fn not_found(records: &[BackupRecord], selector: &Selector) -> BackupNotFoundError {
    match selector {
        Selector::ById(id) => BackupNotFoundError::IdNotFound { id: *id },
        Selector::BeforeOrAt(cutoff) => match records.iter().map(|r| r.creation_date).min() {
            Some(oldest) => BackupNotFoundError::NoneBeforeDate {
                cutoff: *cutoff,
                oldest,
            },
            None => BackupNotFoundError::NoBackups,
        },
        Selector::Latest => BackupNotFoundError::NoBackups,
    }
}
