// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Built-in handling of inbound events.
//!
//! The dispatcher first applies the local meaning of an event (which caches
//! it makes stale) and then forwards the event, known or unknown, to every
//! registered handler. [`effects`] is the single table of what each event
//! means locally; a new collaborative feature adds a row there.

use std::sync::Arc;

use serde_json::Value;
use tandem_core::{CacheKey, Envelope, EventKind};
use tokio::sync::mpsc;

use crate::registry::{DispatchReport, HandlerRegistry};

/// Receives cache invalidations.
pub trait CacheInvalidator: Send + Sync {
    fn invalidate(&self, key: &CacheKey);
}

/// Forwards invalidations into a channel.
impl CacheInvalidator for mpsc::UnboundedSender<CacheKey> {
    fn invalidate(&self, key: &CacheKey) {
        // A closed receiver means nobody caches anymore
        let _ = self.send(key.clone());
    }
}

/// Discards invalidations.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopInvalidator;

impl CacheInvalidator for NoopInvalidator {
    fn invalidate(&self, _key: &CacheKey) {}
}

/// A kind of cache an event makes stale, before scoping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    WorkspaceTasks,
    WorkspaceSummary,
    WorkspaceLists,
    Workspace,
    WorkspaceChannels,
    WorkspacePresence,
    ChannelMessages,
    UserPresence,
    Notifications,
}

/// What each recognized event invalidates.
///
/// Connection hellos and call signaling have no cache effect; they only
/// reach handlers.
pub fn effects(kind: EventKind) -> &'static [Effect] {
    match kind {
        EventKind::TaskCreated | EventKind::TaskUpdated | EventKind::TaskDeleted => {
            &[Effect::WorkspaceTasks, Effect::WorkspaceSummary]
        }
        EventKind::ListCreated | EventKind::ListUpdated | EventKind::ListDeleted => {
            &[Effect::WorkspaceLists]
        }
        EventKind::WorkspaceUpdated => &[Effect::Workspace, Effect::WorkspaceSummary],
        EventKind::NotificationCreated => &[Effect::Notifications],
        EventKind::MessageCreated => &[Effect::ChannelMessages, Effect::WorkspaceChannels],
        EventKind::ChannelUpdated => &[Effect::WorkspaceChannels],
        EventKind::PresenceUpdated => &[Effect::UserPresence, Effect::WorkspacePresence],
        EventKind::Connected
        | EventKind::CallIncoming
        | EventKind::CallInitiate
        | EventKind::CallAnswer
        | EventKind::CallIceCandidate
        | EventKind::CallEnd => &[],
    }
}

/// Resolves the cache keys an envelope invalidates.
///
/// Workspace-scoped keys use the active workspace, falling back to the
/// payload's `workspaceId`; with neither they are skipped.
pub fn invalidations(envelope: &Envelope, active_workspace: Option<&str>) -> Vec<CacheKey> {
    let Some(kind) = envelope.event_kind() else {
        return Vec::new();
    };
    let workspace = active_workspace.or_else(|| envelope.workspace_id());

    let mut keys = Vec::new();
    for effect in effects(kind) {
        match effect {
            Effect::WorkspaceTasks => keys.extend(scoped(workspace, |workspace_id| {
                CacheKey::WorkspaceTasks { workspace_id }
            })),
            Effect::WorkspaceSummary => keys.extend(scoped(workspace, |workspace_id| {
                CacheKey::WorkspaceSummary { workspace_id }
            })),
            Effect::WorkspaceLists => keys.extend(scoped(workspace, |workspace_id| {
                CacheKey::WorkspaceLists { workspace_id }
            })),
            Effect::Workspace => keys.extend(scoped(workspace, |workspace_id| {
                CacheKey::Workspace { workspace_id }
            })),
            Effect::WorkspaceChannels => keys.extend(scoped(workspace, |workspace_id| {
                CacheKey::WorkspaceChannels { workspace_id }
            })),
            Effect::WorkspacePresence => keys.extend(scoped(workspace, |workspace_id| {
                CacheKey::WorkspacePresence { workspace_id }
            })),
            Effect::ChannelMessages => {
                if let Some(channel_id) = envelope.payload_str("channelId") {
                    keys.push(CacheKey::ChannelMessages {
                        channel_id: channel_id.to_string(),
                    });
                }
            }
            Effect::UserPresence => keys.extend(
                affected_users(envelope)
                    .into_iter()
                    .map(|user_id| CacheKey::UserPresence { user_id }),
            ),
            Effect::Notifications => keys.push(CacheKey::Notifications),
        }
    }
    keys
}

fn scoped(workspace: Option<&str>, key: impl FnOnce(String) -> CacheKey) -> Option<CacheKey> {
    workspace.map(|id| key(id.to_string()))
}

/// Users named by a presence event: `userId`, or every string in `userIds`.
fn affected_users(envelope: &Envelope) -> Vec<String> {
    if let Some(user_id) = envelope.payload_str("userId") {
        return vec![user_id.to_string()];
    }
    match envelope.payload().get("userIds") {
        Some(Value::Array(ids)) => ids
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    }
}

/// Applies built-in effects, then fans out to the handler registry.
pub struct EventDispatcher {
    invalidator: Arc<dyn CacheInvalidator>,
    registry: HandlerRegistry,
}

impl EventDispatcher {
    pub fn new(invalidator: Arc<dyn CacheInvalidator>, registry: HandlerRegistry) -> Self {
        EventDispatcher {
            invalidator,
            registry,
        }
    }

    /// Handles one inbound envelope.
    pub fn dispatch(&self, envelope: &Envelope, active_workspace: Option<&str>) -> DispatchReport {
        for key in invalidations(envelope, active_workspace) {
            tracing::debug!(event = envelope.kind(), cache = %key, "invalidating");
            self.invalidator.invalidate(&key);
        }
        let report = self.registry.dispatch(envelope);
        tracing::trace!(
            event = envelope.kind(),
            delivered = report.delivered,
            failed = report.failed,
            "dispatched"
        );
        report
    }
}

#[cfg(test)]
#[path = "dispatch_tests.rs"]
mod tests;
