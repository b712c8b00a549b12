// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Sync client configuration.
//!
//! Configuration is read from a TOML file. Every key is optional:
//!
//! ```toml
//! url = "wss://sync.example.com/ws"   # overrides the origin-derived URL
//! path = "/ws"
//! token_param = "token"
//! backoff_base_ms = 1000
//! backoff_cap_ms = 30000
//! connect_timeout_secs = 10
//! heartbeat_interval_ms = 30000        # 0 disables the heartbeat
//! heartbeat_timeout_ms = 10000
//! ```

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tandem_core::BackoffPolicy;

use crate::error::ConfigError;

/// Configuration for the sync client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ClientConfig {
    /// Full `ws://` or `wss://` endpoint. When absent the endpoint mirrors
    /// the application origin.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Path of the sync endpoint on the origin (default: `/ws`).
    pub path: String,
    /// Query parameter carrying the bearer credential (default: `token`).
    pub token_param: String,
    /// Delay before the first reconnect, in milliseconds (default: 1000).
    pub backoff_base_ms: u64,
    /// Upper bound on reconnect delay, in milliseconds (default: 30000).
    pub backoff_cap_ms: u64,
    /// Max time to wait for the transport to open, in seconds (default: 10).
    pub connect_timeout_secs: u64,
    /// Idle time before a liveness ping, in milliseconds (default: 30000). 0 = disabled.
    pub heartbeat_interval_ms: u64,
    /// Max time to wait for any traffic after a ping, in milliseconds (default: 10000).
    pub heartbeat_timeout_ms: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        ClientConfig {
            url: None,
            path: "/ws".to_string(),
            token_param: "token".to_string(),
            backoff_base_ms: 1000,
            backoff_cap_ms: 30_000,
            connect_timeout_secs: 10,
            heartbeat_interval_ms: 30_000,
            heartbeat_timeout_ms: 10_000,
        }
    }
}

/// Liveness ping timing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Heartbeat {
    pub interval: Duration,
    pub timeout: Duration,
}

impl ClientConfig {
    /// Loads configuration from a TOML file.
    ///
    /// A missing file yields the defaults. The result is validated.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let config = Self::read(path)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads a TOML file without validating values, for callers that layer
    /// overrides on top before calling [`validate`](Self::validate).
    pub fn read(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(ClientConfig::default());
        }
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Parses and validates configuration from a TOML string.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: ClientConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Renders the configuration as TOML.
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string(self)?)
    }

    /// Checks that every value is usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(url) = &self.url {
            let parsed = url::Url::parse(url)
                .map_err(|e| ConfigError::invalid("url", format!("'{url}': {e}")))?;
            if !matches!(parsed.scheme(), "ws" | "wss") {
                return Err(ConfigError::invalid(
                    "url",
                    format!("'{url}' must use ws:// or wss://"),
                ));
            }
        }
        if !self.path.starts_with('/') {
            return Err(ConfigError::invalid(
                "path",
                format!("'{}' must start with '/'", self.path),
            ));
        }
        if self.token_param.is_empty() {
            return Err(ConfigError::invalid("token_param", "must not be empty"));
        }
        if self.connect_timeout_secs == 0 {
            return Err(ConfigError::invalid(
                "connect_timeout_secs",
                "must be at least 1",
            ));
        }
        if self.heartbeat_interval_ms > 0 && self.heartbeat_timeout_ms == 0 {
            return Err(ConfigError::invalid(
                "heartbeat_timeout_ms",
                "must be non-zero while the heartbeat is enabled",
            ));
        }
        self.backoff()?;
        Ok(())
    }

    /// Builds the reconnect backoff policy.
    pub fn backoff(&self) -> Result<BackoffPolicy, ConfigError> {
        Ok(BackoffPolicy::new(
            Duration::from_millis(self.backoff_base_ms),
            Duration::from_millis(self.backoff_cap_ms),
        )?)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    /// Heartbeat timing, or `None` when disabled.
    pub fn heartbeat(&self) -> Option<Heartbeat> {
        (self.heartbeat_interval_ms > 0).then(|| Heartbeat {
            interval: Duration::from_millis(self.heartbeat_interval_ms),
            timeout: Duration::from_millis(self.heartbeat_timeout_ms),
        })
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
