// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! tandem-client: Real-time sync client
//!
//! Keeps one WebSocket connection to the sync server alive for the
//! application session, joins the active workspace's channel, turns inbound
//! events into cache invalidations and fans them out to subscribers.
//!
//! # Main Components
//!
//! - [`SyncClient`] - The facade: start/stop, send, subscribe, workspace selection
//! - [`ClientConfig`] - Endpoint, backoff and heartbeat settings
//! - [`Environment`] - Origin and credential lookup for the connection URL
//! - [`CacheInvalidator`] - Where cache invalidations go
//!
//! # Usage
//!
//! ```rust,ignore
//! use tandem_client::{ClientConfig, CredentialSlot, OriginEnvironment, SyncClient};
//!
//! let credential = CredentialSlot::new(Some(token));
//! let env = OriginEnvironment::parse("https://app.example.com", credential)?;
//! let (tx, mut invalidated) = tokio::sync::mpsc::unbounded_channel();
//!
//! let client = SyncClient::new(ClientConfig::default(), Arc::new(env), Arc::new(tx))?;
//! let _sub = client.on_message(|envelope| {
//!     println!("{}", envelope.kind());
//!     Ok(())
//! });
//! client.start();
//! client.set_active_workspace(Some("ws1"));
//! ```

pub mod client;
pub mod config;
pub mod connection;
pub mod dispatch;
pub mod environment;
pub mod error;
pub mod registry;
pub mod subscription;
pub mod transport;

#[cfg(test)]
mod test_helpers;

pub use client::SyncClient;
pub use config::{ClientConfig, Heartbeat};
pub use connection::ConnectionState;
pub use dispatch::{CacheInvalidator, NoopInvalidator};
pub use environment::{connection_url, CredentialSlot, Environment, OriginEnvironment};
pub use error::{ConfigError, HandlerError, HandlerResult, TransportError};
pub use registry::{DispatchReport, Unsubscribe};
pub use tandem_core::{CacheKey, Envelope, EventKind};
