// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Application environment and connection URL construction.
//!
//! The sync endpoint mirrors the origin the application was loaded from:
//! `wss` for a secure origin, `ws` otherwise, same host and port, with the
//! bearer credential carried as a query parameter. A configured `url`
//! replaces the origin-derived endpoint; the credential is still appended.

use std::sync::{Arc, PoisonError, RwLock};

use url::Url;

use crate::config::ClientConfig;
use crate::error::ConfigError;

/// Facts about the hosting application the sync client needs.
pub trait Environment: Send + Sync {
    /// True when the application origin is served over TLS.
    fn is_secure_origin(&self) -> bool;

    /// Host name or address of the application origin.
    fn host(&self) -> String;

    /// Explicit port of the application origin, if not the scheme default.
    fn port(&self) -> Option<u16>;

    /// Current bearer credential, or `None` when no session is active.
    ///
    /// Read once per connection attempt.
    fn credential(&self) -> Option<String>;
}

/// Shared, updatable holder for the bearer credential.
///
/// The session layer sets it after login and clears it on logout; the sync
/// client only reads it.
#[derive(Debug, Clone, Default)]
pub struct CredentialSlot {
    inner: Arc<RwLock<Option<String>>>,
}

impl CredentialSlot {
    pub fn new(token: Option<String>) -> Self {
        CredentialSlot {
            inner: Arc::new(RwLock::new(token)),
        }
    }

    pub fn set(&self, token: impl Into<String>) {
        *self.inner.write().unwrap_or_else(PoisonError::into_inner) = Some(token.into());
    }

    pub fn clear(&self) {
        *self.inner.write().unwrap_or_else(PoisonError::into_inner) = None;
    }

    pub fn get(&self) -> Option<String> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

/// Environment derived from an origin URL such as `https://app.example.com`.
#[derive(Debug, Clone)]
pub struct OriginEnvironment {
    secure: bool,
    host: String,
    port: Option<u16>,
    credential: CredentialSlot,
}

impl OriginEnvironment {
    pub fn new(secure: bool, host: impl Into<String>, port: Option<u16>, credential: CredentialSlot) -> Self {
        OriginEnvironment {
            secure,
            host: host.into(),
            port,
            credential,
        }
    }

    /// Parses an `http://` or `https://` origin.
    pub fn parse(origin: &str, credential: CredentialSlot) -> Result<Self, ConfigError> {
        let url = Url::parse(origin)
            .map_err(|e| ConfigError::invalid("origin", format!("'{origin}': {e}")))?;
        let secure = match url.scheme() {
            "https" => true,
            "http" => false,
            other => {
                return Err(ConfigError::invalid(
                    "origin",
                    format!("unsupported scheme '{other}', expected http or https"),
                ))
            }
        };
        let host = url
            .host_str()
            .ok_or_else(|| ConfigError::invalid("origin", format!("'{origin}' has no host")))?;
        Ok(OriginEnvironment::new(secure, host, url.port(), credential))
    }

    /// The credential slot this environment reads from.
    pub fn credentials(&self) -> &CredentialSlot {
        &self.credential
    }
}

impl Environment for OriginEnvironment {
    fn is_secure_origin(&self) -> bool {
        self.secure
    }

    fn host(&self) -> String {
        self.host.clone()
    }

    fn port(&self) -> Option<u16> {
        self.port
    }

    fn credential(&self) -> Option<String> {
        self.credential.get()
    }
}

/// Builds the transport target for one connection attempt.
pub fn connection_url(
    env: &dyn Environment,
    config: &ClientConfig,
    credential: &str,
) -> Result<Url, ConfigError> {
    let mut url = match &config.url {
        Some(url) => {
            Url::parse(url).map_err(|e| ConfigError::invalid("url", format!("'{url}': {e}")))?
        }
        None => origin_url(env, &config.path)?,
    };
    url.query_pairs_mut()
        .append_pair(&config.token_param, credential);
    Ok(url)
}

fn origin_url(env: &dyn Environment, path: &str) -> Result<Url, ConfigError> {
    let scheme = if env.is_secure_origin() { "wss" } else { "ws" };
    let host = env.host();
    // Bare IPv6 literals need brackets inside a URL.
    let host = if host.contains(':') && !host.starts_with('[') {
        format!("[{host}]")
    } else {
        host
    };

    let mut url = Url::parse(&format!("{scheme}://{host}"))
        .map_err(|e| ConfigError::invalid("host", format!("'{host}': {e}")))?;
    url.set_port(env.port())
        .map_err(|()| ConfigError::invalid("port", format!("'{host}' cannot carry a port")))?;
    url.set_path(path);
    Ok(url)
}

#[cfg(test)]
#[path = "environment_tests.rs"]
mod tests;
