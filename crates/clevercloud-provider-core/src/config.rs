// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Configuration loading from environment variables.

use std::time::Duration;

use tracing::debug;

use crate::error::ConfigError;
use crate::watcher::WatchOptions;

const DEFAULT_POLL_INTERVAL_MS: u64 = 2_000;
const DEFAULT_WATCH_TIMEOUT_SECS: u64 = 1_200;
const DEFAULT_DOMAIN: &str = "cleverapps.io";

/// Provider core configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderConfig {
    /// Delay between two status fetches of a watched resource.
    pub poll_interval: Duration,
    /// How long to wait for a terminal status. `None` waits forever.
    pub watch_timeout: Option<Duration>,
    /// Domain under which the platform assigns default routes.
    pub default_domain: String,
    /// Statuses meaning a provisioning operation succeeded.
    pub success_statuses: Vec<String>,
    /// Statuses meaning a provisioning operation failed.
    pub failure_statuses: Vec<String>,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
            watch_timeout: Some(Duration::from_secs(DEFAULT_WATCH_TIMEOUT_SECS)),
            default_domain: DEFAULT_DOMAIN.to_string(),
            success_statuses: vec!["ACTIVE".to_string()],
            failure_statuses: vec!["FAILED".to_string()],
        }
    }
}

impl ProviderConfig {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from environment variables.
    ///
    /// Optional (with defaults):
    /// - `CLEVERCLOUD_POLL_INTERVAL_MS`: Watcher poll interval (default: 2000)
    /// - `CLEVERCLOUD_WATCH_TIMEOUT_SECS`: Watcher deadline, 0 disables it (default: 1200)
    /// - `CLEVERCLOUD_DEFAULT_DOMAIN`: Default route domain (default: "cleverapps.io")
    /// - `CLEVERCLOUD_SUCCESS_STATUSES`: Comma-separated success statuses (default: "ACTIVE")
    /// - `CLEVERCLOUD_FAILURE_STATUSES`: Comma-separated failure statuses (default: "FAILED")
    pub fn from_env() -> Result<Self, ConfigError> {
        let poll_interval_ms: u64 = std::env::var("CLEVERCLOUD_POLL_INTERVAL_MS")
            .unwrap_or_else(|_| DEFAULT_POLL_INTERVAL_MS.to_string())
            .parse()
            .map_err(|_| {
                ConfigError::Invalid("CLEVERCLOUD_POLL_INTERVAL_MS", "must be a positive integer")
            })?;
        if poll_interval_ms == 0 {
            return Err(ConfigError::Invalid(
                "CLEVERCLOUD_POLL_INTERVAL_MS",
                "must be a positive integer",
            ));
        }

        let watch_timeout_secs: u64 = std::env::var("CLEVERCLOUD_WATCH_TIMEOUT_SECS")
            .unwrap_or_else(|_| DEFAULT_WATCH_TIMEOUT_SECS.to_string())
            .parse()
            .map_err(|_| {
                ConfigError::Invalid(
                    "CLEVERCLOUD_WATCH_TIMEOUT_SECS",
                    "must be a non-negative integer",
                )
            })?;

        let default_domain = std::env::var("CLEVERCLOUD_DEFAULT_DOMAIN")
            .unwrap_or_else(|_| DEFAULT_DOMAIN.to_string());

        let success_statuses = status_list("CLEVERCLOUD_SUCCESS_STATUSES", "ACTIVE")?;
        let failure_statuses = status_list("CLEVERCLOUD_FAILURE_STATUSES", "FAILED")?;

        Ok(Self {
            poll_interval: Duration::from_millis(poll_interval_ms),
            watch_timeout: (watch_timeout_secs > 0).then(|| Duration::from_secs(watch_timeout_secs)),
            default_domain,
            success_statuses,
            failure_statuses,
        })
    }

    /// Load a `.env` file when present, then read the environment.
    pub fn load() -> Result<Self, ConfigError> {
        if let Err(e) = dotenvy::dotenv() {
            debug!("No .env file loaded: {}", e);
        }
        Self::from_env()
    }

    /// Set the poll interval.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Set or clear the watch deadline.
    pub fn with_watch_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.watch_timeout = timeout;
        self
    }

    /// Set the default route domain.
    pub fn with_default_domain(mut self, domain: impl Into<String>) -> Self {
        self.default_domain = domain.into();
        self
    }

    /// Watcher options derived from this configuration.
    pub fn watch_options(&self) -> WatchOptions {
        let options = WatchOptions::new(self.poll_interval)
            .with_success_statuses(self.success_statuses.iter().cloned())
            .with_failure_statuses(self.failure_statuses.iter().cloned());

        match self.watch_timeout {
            Some(timeout) => options.with_timeout(timeout),
            None => options.without_timeout(),
        }
    }
}

fn status_list(var: &'static str, default: &str) -> Result<Vec<String>, ConfigError> {
    let raw = std::env::var(var).unwrap_or_else(|_| default.to_string());
    let statuses: Vec<String> = raw
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect();

    if statuses.is_empty() {
        return Err(ConfigError::Invalid(var, "must list at least one status"));
    }
    Ok(statuses)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::Mutex;

    // Held by every test that reads or writes CLEVERCLOUD_* variables.
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    const VARS: [&str; 5] = [
        "CLEVERCLOUD_POLL_INTERVAL_MS",
        "CLEVERCLOUD_WATCH_TIMEOUT_SECS",
        "CLEVERCLOUD_DEFAULT_DOMAIN",
        "CLEVERCLOUD_SUCCESS_STATUSES",
        "CLEVERCLOUD_FAILURE_STATUSES",
    ];

    /// Starts from an environment without provider variables and puts the
    /// previous values back on drop.
    struct EnvGuard {
        saved: Vec<(&'static str, Option<String>)>,
    }

    impl EnvGuard {
        fn clean() -> Self {
            let saved = VARS.iter().map(|var| (*var, env::var(var).ok())).collect();
            for var in VARS {
                // SAFETY: callers hold ENV_MUTEX
                unsafe { env::remove_var(var) };
            }
            Self { saved }
        }

        fn set(&mut self, key: &'static str, value: &str) {
            debug_assert!(VARS.contains(&key), "{key} is not restored on drop");
            // SAFETY: callers hold ENV_MUTEX
            unsafe { env::set_var(key, value) };
        }
    }

    impl Drop for EnvGuard {
        fn drop(&mut self) {
            for (key, value) in self.saved.drain(..) {
                // SAFETY: callers hold ENV_MUTEX
                unsafe {
                    match value {
                        Some(v) => env::set_var(key, v),
                        None => env::remove_var(key),
                    }
                }
            }
        }
    }

    #[test]
    fn test_config_from_env_with_defaults() {
        let _lock = ENV_MUTEX.lock().unwrap();
        let _guard = EnvGuard::clean();

        let config = ProviderConfig::from_env().unwrap();

        assert_eq!(config, ProviderConfig::default());
        assert_eq!(config.poll_interval, Duration::from_secs(2));
        assert_eq!(config.watch_timeout, Some(Duration::from_secs(1200)));
        assert_eq!(config.default_domain, "cleverapps.io");
    }

    #[test]
    fn test_config_from_env_all_custom() {
        let _lock = ENV_MUTEX.lock().unwrap();
        let mut guard = EnvGuard::clean();

        guard.set("CLEVERCLOUD_POLL_INTERVAL_MS", "250");
        guard.set("CLEVERCLOUD_WATCH_TIMEOUT_SECS", "0");
        guard.set("CLEVERCLOUD_DEFAULT_DOMAIN", "example.net");
        guard.set("CLEVERCLOUD_SUCCESS_STATUSES", "ACTIVE, UP");
        guard.set("CLEVERCLOUD_FAILURE_STATUSES", "FAILED,,ERROR");

        let config = ProviderConfig::from_env().unwrap();

        assert_eq!(config.poll_interval, Duration::from_millis(250));
        assert_eq!(config.watch_timeout, None);
        assert_eq!(config.default_domain, "example.net");
        assert_eq!(config.success_statuses, vec!["ACTIVE", "UP"]);
        assert_eq!(config.failure_statuses, vec!["FAILED", "ERROR"]);
    }

    #[test]
    fn test_config_invalid_poll_interval() {
        let _lock = ENV_MUTEX.lock().unwrap();
        let mut guard = EnvGuard::clean();

        guard.set("CLEVERCLOUD_POLL_INTERVAL_MS", "soon");
        let err = ProviderConfig::from_env().unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid("CLEVERCLOUD_POLL_INTERVAL_MS", _)
        ));

        guard.set("CLEVERCLOUD_POLL_INTERVAL_MS", "0");
        assert!(ProviderConfig::from_env().is_err());
    }

    #[test]
    fn test_config_empty_status_list() {
        let _lock = ENV_MUTEX.lock().unwrap();
        let mut guard = EnvGuard::clean();

        guard.set("CLEVERCLOUD_SUCCESS_STATUSES", " , ");
        let err = ProviderConfig::from_env().unwrap_err();
        assert!(err.to_string().contains("CLEVERCLOUD_SUCCESS_STATUSES"));
    }

    #[test]
    fn test_watch_options_follow_config() {
        let config = ProviderConfig::new()
            .with_poll_interval(Duration::from_millis(100))
            .with_watch_timeout(None)
            .with_default_domain("example.net");

        let options = config.watch_options();

        assert_eq!(options.poll_interval, Duration::from_millis(100));
        assert!(options.timeout.is_none());
        assert!(options.is_success("ACTIVE"));
        assert!(options.is_failure("FAILED"));
    }
}
