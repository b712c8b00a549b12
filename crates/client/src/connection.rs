// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Connection lifecycle management.
//!
//! [`ConnectionManager`] is the connection state machine. It owns the
//! [`ConnectionState`] and the backoff counter and decides, for each
//! lifecycle event, what happens next:
//!
//! ```text
//! Disconnected --start(has credential)--> Connecting
//! Connecting   --open ok-----------------> Connected
//! Connecting   --open fail / abnormal----> Reconnecting
//! Connected    --abnormal close----------> Reconnecting
//! Connected    --stop / clean close------> Disconnected
//! Reconnecting --timer fires-------------> Connecting
//! Reconnecting --stop--------------------> Disconnected
//! ```
//!
//! Each attempt is tagged with an epoch. Results from an attempt that was
//! superseded (by `stop` or a newer attempt) carry a stale epoch and are
//! ignored. Attempts themselves run in background tasks spawned by
//! [`spawn_attempt`] so the driver stays responsive while connecting.

use std::fmt;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tandem_core::BackoffPolicy;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::error::TransportError;
use crate::transport::{Connector, Transport, NORMAL_CLOSURE};

/// State of the sync connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Not connected and not trying to connect.
    Disconnected,
    /// Attempting to open the transport.
    Connecting,
    /// Transport open.
    Connected,
    /// Waiting out a backoff delay before the next attempt.
    Reconnecting,
}

impl ConnectionState {
    fn to_u8(self) -> u8 {
        match self {
            ConnectionState::Disconnected => 0,
            ConnectionState::Connecting => 1,
            ConnectionState::Connected => 2,
            ConnectionState::Reconnecting => 3,
        }
    }

    fn from_u8(value: u8) -> Self {
        match value {
            1 => ConnectionState::Connecting,
            2 => ConnectionState::Connected,
            3 => ConnectionState::Reconnecting,
            _ => ConnectionState::Disconnected,
        }
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ConnectionState::Disconnected => "disconnected",
            ConnectionState::Connecting => "connecting",
            ConnectionState::Connected => "connected",
            ConnectionState::Reconnecting => "reconnecting",
        })
    }
}

/// Connection state visible to both the driver task and facade handles.
///
/// Uses atomic fields for lock-free reads. The state word also carries a stop
/// generation: [`stop`](Self::stop) bumps it, and a [`publish`](Self::publish)
/// made under an older generation is refused, so a transition the driver
/// computed before seeing the stop cannot overwrite it.
#[derive(Debug)]
pub struct SharedConnectionState {
    /// Stop generation in the high bits, state in the low byte.
    word: AtomicU64,
    attempt: AtomicU32,
}

const STATE_BITS: u32 = 8;
const STATE_MASK: u64 = 0xff;

fn pack(generation: u64, state: ConnectionState) -> u64 {
    (generation << STATE_BITS) | u64::from(state.to_u8())
}

impl SharedConnectionState {
    /// Create a new shared state initialized to disconnected.
    pub fn new() -> Self {
        Self {
            word: AtomicU64::new(pack(0, ConnectionState::Disconnected)),
            attempt: AtomicU32::new(0),
        }
    }

    pub fn get(&self) -> ConnectionState {
        ConnectionState::from_u8((self.word.load(Ordering::Acquire) & STATE_MASK) as u8)
    }

    /// Current stop generation.
    pub fn generation(&self) -> u64 {
        self.word.load(Ordering::Acquire) >> STATE_BITS
    }

    /// Publishes `state` if no stop happened after `generation`.
    pub fn publish(&self, generation: u64, state: ConnectionState) -> bool {
        self.word
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |current| {
                (current >> STATE_BITS == generation).then_some(pack(generation, state))
            })
            .is_ok()
    }

    /// Forces `Disconnected` and starts a new generation, which it returns.
    pub fn stop(&self) -> u64 {
        let previous = self
            .word
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |current| {
                Some(pack((current >> STATE_BITS) + 1, ConnectionState::Disconnected))
            })
            .unwrap_or_else(|current| current);
        self.attempt.store(0, Ordering::Release);
        (previous >> STATE_BITS) + 1
    }

    /// Number of consecutive failed attempts since the last successful open.
    pub fn attempt(&self) -> u32 {
        self.attempt.load(Ordering::Acquire)
    }

    pub fn set_attempt(&self, attempt: u32) {
        self.attempt.store(attempt, Ordering::Release);
    }

    pub fn is_connected(&self) -> bool {
        self.get() == ConnectionState::Connected
    }

    /// Get a human-readable status string.
    pub fn status_string(&self) -> String {
        let attempt = self.attempt();
        match self.get() {
            ConnectionState::Connecting | ConnectionState::Reconnecting if attempt > 0 => {
                format!("{} (attempt {})", self.get(), attempt)
            }
            state => state.to_string(),
        }
    }
}

impl Default for SharedConnectionState {
    fn default() -> Self {
        Self::new()
    }
}

/// Why a transport closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseReason {
    /// Normal closure. Never reconnects.
    Clean,
    /// Anything else: network failure, server error, missing close code.
    Abnormal,
}

impl CloseReason {
    /// Classifies a close code. Only normal closure (1000) is clean.
    pub fn from_code(code: Option<u16>) -> Self {
        match code {
            Some(NORMAL_CLOSURE) => CloseReason::Clean,
            _ => CloseReason::Abnormal,
        }
    }
}

/// The connection state machine.
#[derive(Debug)]
pub struct ConnectionManager {
    state: ConnectionState,
    /// Failures since the last successful open.
    attempt: u32,
    epoch: u64,
    /// Stop generation the published state belongs to.
    generation: u64,
    backoff: BackoffPolicy,
    shared: Arc<SharedConnectionState>,
}

impl ConnectionManager {
    pub fn new(backoff: BackoffPolicy, shared: Arc<SharedConnectionState>) -> Self {
        let generation = shared.generation();
        shared.publish(generation, ConnectionState::Disconnected);
        shared.set_attempt(0);
        ConnectionManager {
            state: ConnectionState::Disconnected,
            attempt: 0,
            epoch: 0,
            generation,
            backoff,
            shared,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    /// Epoch of the most recent attempt.
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn is_connected(&self) -> bool {
        self.state == ConnectionState::Connected
    }

    /// Handles an explicit start request.
    ///
    /// Returns the epoch of a new attempt, or `None` when there is nothing to
    /// do: no credential yet, or a connection is already active.
    pub fn start(&mut self, has_credential: bool) -> Option<u64> {
        if self.state != ConnectionState::Disconnected {
            tracing::debug!(state = %self.state, "start ignored, connection already active");
            return None;
        }
        if !has_credential {
            tracing::debug!("no credential available, staying disconnected");
            return None;
        }
        Some(self.begin_attempt())
    }

    /// Handles the backoff timer firing.
    ///
    /// The credential is re-read for every attempt; if it has gone away the
    /// machine settles in `Disconnected` instead of connecting.
    pub fn retry(&mut self, has_credential: bool) -> Option<u64> {
        if self.state != ConnectionState::Reconnecting {
            return None;
        }
        if !has_credential {
            tracing::info!("credential no longer available, abandoning reconnect");
            self.attempt = 0;
            self.transition(ConnectionState::Disconnected);
            return None;
        }
        Some(self.begin_attempt())
    }

    /// Handles a successful open. Returns `false` for a stale attempt.
    pub fn opened(&mut self, epoch: u64) -> bool {
        if epoch != self.epoch || self.state != ConnectionState::Connecting {
            return false;
        }
        self.attempt = 0;
        self.transition(ConnectionState::Connected);
        true
    }

    /// Handles a failed open. Returns the reconnect delay, or `None` for a
    /// stale attempt.
    pub fn failed(&mut self, epoch: u64) -> Option<Duration> {
        if epoch != self.epoch || self.state != ConnectionState::Connecting {
            return None;
        }
        self.closed(CloseReason::Abnormal)
    }

    /// Handles the transport closing.
    ///
    /// Returns the delay after which a retry must be attempted, or `None`
    /// when the machine stops (clean close) or was not connected.
    pub fn closed(&mut self, reason: CloseReason) -> Option<Duration> {
        match (self.state, reason) {
            (ConnectionState::Disconnected | ConnectionState::Reconnecting, _) => None,
            (_, CloseReason::Clean) => {
                self.attempt = 0;
                self.transition(ConnectionState::Disconnected);
                None
            }
            (_, CloseReason::Abnormal) => {
                let delay = self.backoff.delay(self.attempt);
                self.attempt = self.attempt.saturating_add(1);
                self.transition(ConnectionState::Reconnecting);
                Some(delay)
            }
        }
    }

    /// Adopts a stop generation handed out by [`SharedConnectionState::stop`].
    ///
    /// Until this runs, transitions are kept local and not published.
    pub fn acknowledge_stop(&mut self, generation: u64) {
        self.generation = self.generation.max(generation);
    }

    /// Handles an explicit stop. Returns `false` if already disconnected.
    ///
    /// Bumps the epoch so any in-flight attempt is ignored when it reports.
    pub fn stop(&mut self) -> bool {
        if self.state == ConnectionState::Disconnected {
            return false;
        }
        self.epoch += 1;
        self.attempt = 0;
        self.transition(ConnectionState::Disconnected);
        true
    }

    fn begin_attempt(&mut self) -> u64 {
        self.epoch += 1;
        self.transition(ConnectionState::Connecting);
        self.epoch
    }

    fn transition(&mut self, to: ConnectionState) {
        tracing::debug!(from = %self.state, %to, attempt = self.attempt, "connection state");
        self.state = to;
        if self.shared.publish(self.generation, to) {
            self.shared.set_attempt(self.attempt);
        } else {
            tracing::trace!(%to, "stop pending, state not published");
        }
    }
}

/// Result of a background connection attempt.
pub enum ConnectionEvent {
    /// The transport opened.
    Opened {
        epoch: u64,
        transport: Box<dyn Transport>,
    },
    /// The attempt failed.
    Failed { epoch: u64, error: TransportError },
}

impl fmt::Debug for ConnectionEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Opened { epoch, .. } => f
                .debug_struct("Opened")
                .field("epoch", epoch)
                .field("transport", &"<transport>")
                .finish(),
            Self::Failed { epoch, error } => f
                .debug_struct("Failed")
                .field("epoch", epoch)
                .field("error", error)
                .finish(),
        }
    }
}

/// Runs one connection attempt in a background task.
///
/// The outcome is reported on `events` unless `cancel` fires first, in which
/// case nothing is sent.
pub fn spawn_attempt(
    connector: Arc<dyn Connector>,
    url: Url,
    epoch: u64,
    timeout: Duration,
    cancel: CancellationToken,
    events: mpsc::UnboundedSender<ConnectionEvent>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let result = tokio::select! {
            _ = cancel.cancelled() => return,
            result = tokio::time::timeout(timeout, connector.connect(url)) => result,
        };

        let event = match result {
            Ok(Ok(transport)) => ConnectionEvent::Opened { epoch, transport },
            Ok(Err(error)) => ConnectionEvent::Failed { epoch, error },
            Err(_) => ConnectionEvent::Failed {
                epoch,
                error: TransportError::ConnectTimeout(timeout.as_secs()),
            },
        };
        let _ = events.send(event);
    })
}

#[cfg(test)]
#[path = "connection_tests.rs"]
mod tests;
