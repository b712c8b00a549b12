// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Workspace subscription tracking.
//!
//! At most one workspace channel is joined at a time. The manager records the
//! target the application wants and the workspace actually joined on the
//! current connection, and emits the control messages that reconcile the two:
//! always a leave for the old workspace before a join for the new one.
//!
//! The server forgets joins when a connection drops, so the joined workspace
//! is cleared on connection loss and the target is re-joined on the next
//! `connection-established` signal.

use tandem_core::Envelope;

#[derive(Debug, Default)]
pub struct SubscriptionManager {
    /// Workspace the application wants joined.
    target: Option<String>,
    /// Workspace joined on the current connection.
    joined: Option<String>,
}

impl SubscriptionManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// The recorded subscription target.
    pub fn target(&self) -> Option<&str> {
        self.target.as_deref()
    }

    /// The workspace joined on the current connection, if any.
    pub fn joined(&self) -> Option<&str> {
        self.joined.as_deref()
    }

    /// Records a new active workspace.
    ///
    /// Returns the control messages to send, in order. When not connected the
    /// target is only recorded and nothing is returned; the join happens on
    /// the next [`on_connection_established`](Self::on_connection_established).
    pub fn set_active_workspace(&mut self, id: Option<String>, connected: bool) -> Vec<Envelope> {
        if id == self.target {
            return Vec::new();
        }
        tracing::debug!(from = ?self.target, to = ?id, connected, "active workspace changed");
        self.target = id;

        if !connected {
            return Vec::new();
        }

        let mut messages = Vec::with_capacity(2);
        if let Some(previous) = self.joined.take() {
            messages.push(Envelope::unsubscribe(&previous));
        }
        if let Some(next) = &self.target {
            messages.push(Envelope::subscribe(next));
            self.joined = Some(next.clone());
        }
        messages
    }

    /// Handles a fresh connection. Returns the join for the recorded target.
    pub fn on_connection_established(&mut self) -> Option<Envelope> {
        self.joined = self.target.clone();
        self.joined.as_deref().map(Envelope::subscribe)
    }

    /// Handles the connection going away; the server drops our join with it.
    pub fn on_connection_lost(&mut self) {
        self.joined = None;
    }
}

#[cfg(test)]
#[path = "subscription_tests.rs"]
mod tests;
