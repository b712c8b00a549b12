// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! WebSocket protocol envelope for client-server communication.
//!
//! Every frame in either direction is a JSON object:
//!
//! ```text
//! {"type": "task:created", "payload": {"workspaceId": "ws1", ...}}
//! ```
//!
//! There is no version field. Types the client does not recognize still
//! decode; they are forwarded rather than rejected. The client sends two
//! control types, `subscribe` and `unsubscribe`, each carrying a
//! `workspaceId`.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{Error, Result};
use crate::event::EventKind;

/// Control type that joins a workspace channel.
pub const SUBSCRIBE: &str = "subscribe";
/// Control type that leaves a workspace channel.
pub const UNSUBSCRIBE: &str = "unsubscribe";

/// Payload field naming the workspace a message concerns.
pub const WORKSPACE_ID: &str = "workspaceId";

/// A `{type, payload}` message.
///
/// Envelopes are read-only once built; consumers receive `&Envelope`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    payload: Map<String, Value>,
}

impl Envelope {
    /// Creates an envelope with the given type and payload object.
    pub fn new(kind: impl Into<String>, payload: Map<String, Value>) -> Self {
        Envelope {
            kind: kind.into(),
            payload,
        }
    }

    /// Creates an envelope with an empty payload.
    pub fn bare(kind: impl Into<String>) -> Self {
        Envelope::new(kind, Map::new())
    }

    /// Creates a `subscribe` control message for a workspace.
    pub fn subscribe(workspace_id: &str) -> Self {
        Envelope::new(SUBSCRIBE, workspace_payload(workspace_id))
    }

    /// Creates an `unsubscribe` control message for a workspace.
    pub fn unsubscribe(workspace_id: &str) -> Self {
        Envelope::new(UNSUBSCRIBE, workspace_payload(workspace_id))
    }

    /// The wire type string.
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// The recognized event kind, if the type is one the client knows.
    pub fn event_kind(&self) -> Option<EventKind> {
        EventKind::parse(&self.kind)
    }

    pub fn payload(&self) -> &Map<String, Value> {
        &self.payload
    }

    /// Returns a payload field if it is a string.
    pub fn payload_str(&self, field: &str) -> Option<&str> {
        self.payload.get(field).and_then(Value::as_str)
    }

    /// The payload's `workspaceId`, if present.
    pub fn workspace_id(&self) -> Option<&str> {
        self.payload_str(WORKSPACE_ID)
    }

    /// Serializes the envelope to JSON.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(Error::Encode)
    }

    /// Deserializes an envelope from JSON.
    ///
    /// A missing `payload` decodes as an empty object. A payload that is not
    /// an object, or a missing or non-string `type`, is an error.
    pub fn from_json(s: &str) -> Result<Self> {
        serde_json::from_str(s).map_err(Error::Decode)
    }
}

fn workspace_payload(workspace_id: &str) -> Map<String, Value> {
    let mut payload = Map::new();
    payload.insert(
        WORKSPACE_ID.to_string(),
        Value::String(workspace_id.to_string()),
    );
    payload
}

#[cfg(test)]
#[path = "protocol_tests.rs"]
mod tests;
