// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Semantic cache keys.
//!
//! Inbound events invalidate caches by meaning ("the task list of workspace
//! ws1"), not by any particular caching library's key format. A consumer maps
//! each key onto its own scheme; [`CacheKey::path`] gives a stable
//! slash-separated rendering for consumers that key by string.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A cache an inbound event can make stale.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "cache", rename_all = "snake_case")]
pub enum CacheKey {
    /// Tasks belonging to a workspace.
    WorkspaceTasks { workspace_id: String },
    /// Aggregate counters and summaries for a workspace.
    WorkspaceSummary { workspace_id: String },
    /// Lists belonging to a workspace.
    WorkspaceLists { workspace_id: String },
    /// The workspace record itself.
    Workspace { workspace_id: String },
    /// Chat channels belonging to a workspace.
    WorkspaceChannels { workspace_id: String },
    /// Who is online in a workspace.
    WorkspacePresence { workspace_id: String },
    /// Messages in one channel.
    ChannelMessages { channel_id: String },
    /// Presence of one user.
    UserPresence { user_id: String },
    /// The current user's notifications.
    Notifications,
}

impl CacheKey {
    /// Returns the key as slash-separated segments, e.g. `workspace/ws1/tasks`.
    pub fn path(&self) -> String {
        match self {
            CacheKey::WorkspaceTasks { workspace_id } => format!("workspace/{workspace_id}/tasks"),
            CacheKey::WorkspaceSummary { workspace_id } => {
                format!("workspace/{workspace_id}/summary")
            }
            CacheKey::WorkspaceLists { workspace_id } => format!("workspace/{workspace_id}/lists"),
            CacheKey::Workspace { workspace_id } => format!("workspace/{workspace_id}"),
            CacheKey::WorkspaceChannels { workspace_id } => {
                format!("workspace/{workspace_id}/channels")
            }
            CacheKey::WorkspacePresence { workspace_id } => {
                format!("workspace/{workspace_id}/presence")
            }
            CacheKey::ChannelMessages { channel_id } => format!("channel/{channel_id}/messages"),
            CacheKey::UserPresence { user_id } => format!("user/{user_id}/presence"),
            CacheKey::Notifications => "notifications".to_string(),
        }
    }

    /// Workspace this key is scoped to, if any.
    pub fn workspace_id(&self) -> Option<&str> {
        match self {
            CacheKey::WorkspaceTasks { workspace_id }
            | CacheKey::WorkspaceSummary { workspace_id }
            | CacheKey::WorkspaceLists { workspace_id }
            | CacheKey::Workspace { workspace_id }
            | CacheKey::WorkspaceChannels { workspace_id }
            | CacheKey::WorkspacePresence { workspace_id } => Some(workspace_id),
            CacheKey::ChannelMessages { .. }
            | CacheKey::UserPresence { .. }
            | CacheKey::Notifications => None,
        }
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}

#[cfg(test)]
#[path = "cache_tests.rs"]
mod tests;
