// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Tracing subscriber setup for the plugin process.

use tracing_subscriber::EnvFilter;

use crate::error::TelemetryError;

/// Filter used when `RUST_LOG` is unset.
pub const DEFAULT_DIRECTIVE: &str = "clevercloud_provider_core=info";

/// Install a global `fmt` subscriber writing to stderr.
///
/// `RUST_LOG` takes precedence over `default_directive`. Stdout is left
/// alone since the plugin host may use it for its own protocol.
pub fn init_tracing(default_directive: &str) -> Result<(), TelemetryError> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(default_directive)
            .map_err(|e| TelemetryError::Directive(e.to_string()))?,
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| TelemetryError::Install(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_init_fails_without_panicking() {
        // The first call may lose against another test's subscriber; the
        // second one always finds a subscriber installed.
        let _ = init_tracing(DEFAULT_DIRECTIVE);
        assert!(matches!(
            init_tracing(DEFAULT_DIRECTIVE),
            Err(TelemetryError::Install(_))
        ));
    }
}
