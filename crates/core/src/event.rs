// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Server-pushed event taxonomy.
//!
//! The wire carries event types as strings. `EventKind` names the ones the
//! client gives meaning to; anything else is still a valid envelope and is
//! delivered to handlers untouched.

use std::fmt;

/// Event types the server pushes that the client recognizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Connected,
    TaskCreated,
    TaskUpdated,
    TaskDeleted,
    ListCreated,
    ListUpdated,
    ListDeleted,
    WorkspaceUpdated,
    NotificationCreated,
    MessageCreated,
    ChannelUpdated,
    PresenceUpdated,
    CallIncoming,
    CallInitiate,
    CallAnswer,
    CallIceCandidate,
    CallEnd,
}

impl EventKind {
    /// Every recognized kind, in wire-table order.
    pub const ALL: [EventKind; 17] = [
        EventKind::Connected,
        EventKind::TaskCreated,
        EventKind::TaskUpdated,
        EventKind::TaskDeleted,
        EventKind::ListCreated,
        EventKind::ListUpdated,
        EventKind::ListDeleted,
        EventKind::WorkspaceUpdated,
        EventKind::NotificationCreated,
        EventKind::MessageCreated,
        EventKind::ChannelUpdated,
        EventKind::PresenceUpdated,
        EventKind::CallIncoming,
        EventKind::CallInitiate,
        EventKind::CallAnswer,
        EventKind::CallIceCandidate,
        EventKind::CallEnd,
    ];

    /// Returns the wire name of this kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Connected => "connected",
            EventKind::TaskCreated => "task:created",
            EventKind::TaskUpdated => "task:updated",
            EventKind::TaskDeleted => "task:deleted",
            EventKind::ListCreated => "list:created",
            EventKind::ListUpdated => "list:updated",
            EventKind::ListDeleted => "list:deleted",
            EventKind::WorkspaceUpdated => "workspace:updated",
            EventKind::NotificationCreated => "notification:created",
            EventKind::MessageCreated => "message:created",
            EventKind::ChannelUpdated => "channel:updated",
            EventKind::PresenceUpdated => "presence:updated",
            EventKind::CallIncoming => "call:incoming",
            EventKind::CallInitiate => "call:initiate",
            EventKind::CallAnswer => "call:answer",
            EventKind::CallIceCandidate => "call:ice-candidate",
            EventKind::CallEnd => "call:end",
        }
    }

    /// Parses a wire type. Returns `None` for types the client does not know.
    pub fn parse(s: &str) -> Option<Self> {
        EventKind::ALL.into_iter().find(|kind| kind.as_str() == s)
    }

    /// True for peer-connection signaling, which never touches caches.
    pub fn is_signaling(&self) -> bool {
        matches!(
            self,
            EventKind::CallIncoming
                | EventKind::CallInitiate
                | EventKind::CallAnswer
                | EventKind::CallIceCandidate
                | EventKind::CallEnd
        )
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;
