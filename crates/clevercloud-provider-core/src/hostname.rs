// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Hostname normalization.
//!
//! Users declare routes loosely: `HTTPS://Example.COM/`, `example.com.`,
//! ` example.com `. The platform stores bare lowercase domains, so every
//! declared entry goes through [`normalize`] before it is compared with what
//! the platform reports.

use std::fmt;
use std::str::FromStr;

use serde::{Serialize, Serializer};
use url::Url;

use crate::error::InvalidHostError;

const SCHEME_PREFIXES: [&str; 2] = ["https://", "http://"];

/// A normalized host: lowercase, without scheme, path, trailing dot or slash.
///
/// The empty host is valid and means "no host declared".
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Host(String);

impl Host {
    /// Normalize a raw host string. Same as [`normalize`].
    pub fn parse(raw: &str) -> Result<Self, InvalidHostError> {
        normalize(raw)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for Host {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Host {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl FromStr for Host {
    type Err = InvalidHostError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        normalize(s)
    }
}

impl Serialize for Host {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

/// Normalize a raw host string into a [`Host`].
///
/// Whitespace-only input yields the empty host. Whitespace or control
/// characters left inside the host are rejected.
pub fn normalize(raw: &str) -> Result<Host, InvalidHostError> {
    let (host_part, _) = split_host_path(raw);

    let host = host_part.trim_end_matches('.');
    let host = host.strip_suffix('/').unwrap_or(host);
    let host = host.to_lowercase();

    if let Some(offending) = host.chars().find(|c| c.is_whitespace() || c.is_control()) {
        return Err(InvalidHostError {
            raw: raw.to_string(),
            offending,
        });
    }

    Ok(Host(host))
}

/// Split a raw entry into its authority and the remainder.
///
/// The remainder starts at the first `/`, `?` or `#` following the authority
/// and is empty when there is none. Both parts are slices of the trimmed
/// input: nothing is decoded, encoded or resolved.
pub fn split_host_path(raw: &str) -> (String, String) {
    let trimmed = raw.trim();
    let without_scheme = url_remainder(trimmed).unwrap_or_else(|| strip_scheme(trimmed));

    match without_scheme.find(['/', '?', '#']) {
        Some(idx) => (
            without_scheme[..idx].to_string(),
            without_scheme[idx..].to_string(),
        ),
        None => (without_scheme.to_string(), String::new()),
    }
}

/// Text following `://` when `raw` parses as a URL with a non-empty authority.
///
/// The url crate rewrites hosts (IDNA, IPv4 shorthand) and paths, and drops
/// tabs and newlines, so only its verdict is used here.
fn url_remainder(raw: &str) -> Option<&str> {
    let url = Url::parse(raw).ok()?;
    if !url.has_authority() {
        return None;
    }

    let (_, rest) = raw.split_once("://")?;
    let authority_len = rest.find(['/', '?', '#']).unwrap_or(rest.len());
    (authority_len > 0).then_some(rest)
}

fn strip_scheme(raw: &str) -> &str {
    for prefix in SCHEME_PREFIXES {
        let matches = raw
            .get(..prefix.len())
            .is_some_and(|head| head.eq_ignore_ascii_case(prefix));
        if matches {
            return &raw[prefix.len()..];
        }
    }
    raw
}
