//! Shared types for the SDK.
//!
//! [`Event`] and [`Recording`] are what a recorder produces and what gets
//! uploaded as a session document. The remaining types mirror the server's
//! response bodies.

use serde::{Deserialize, Serialize};
use serde_json::Value;

// =============================================================================
// Recording Types
// =============================================================================

/// A single captured UI event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    /// What happened, e.g. `"tap"` or `"screen_view"`.
    #[serde(rename = "type")]
    pub kind: String,
    /// Screen the event happened on.
    pub screen: String,
    /// Milliseconds since the Unix epoch.
    pub timestamp: i64,
}

/// One recording: when it started, when it ended, and everything in between.
///
/// Unknown fields are ignored on deserialization, so a stored session (which
/// also carries `sessionId` and `internalId`) reads back as a `Recording`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recording {
    /// Milliseconds since the Unix epoch.
    pub started_at: i64,
    /// Milliseconds since the Unix epoch.
    pub ended_at: i64,
    #[serde(default)]
    pub events: Vec<Event>,
}

impl Recording {
    /// Events sorted by timestamp. Capture order is kept for equal timestamps.
    pub fn ordered_events(&self) -> Vec<Event> {
        let mut events = self.events.clone();
        events.sort_by_key(|e| e.timestamp);
        events
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}

// =============================================================================
// Sessions API Types
// =============================================================================

/// Response from creating a session.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedSession {
    /// Application-level session id.
    pub session_id: String,
    /// Store-assigned id; equal to `session_id` at creation. Sent as
    /// `internalId`; older servers of this API answered `_id` instead.
    pub internal_id: String,
}

/// A page of sessions, newest first, without their events.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SessionList {
    pub sessions: Vec<Value>,
    pub count: usize,
}

/// Response from updating a session.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateOutcome {
    pub updated: bool,
    pub session_id: String,
}

/// Response from deleting a session.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteOutcome {
    pub deleted: bool,
    pub session_id: String,
}

/// Response from the health endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Health {
    pub status: String,
    pub db: String,
}
