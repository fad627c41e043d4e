//! Push channel event types.
//!
//! Every frame on the push channel is a generic envelope
//! `{"type": "...", "payload": {...}}`; the payloads for the notification
//! events the engine consumes are decoded into [`PushEvent`]. Unknown types
//! pass through the envelope untouched so other features can share the
//! channel.

use serde::{Deserialize, Serialize};

use crate::api::ApiError;
use crate::model::{NotificationCategory, NotificationPriority, NotificationRecord, PayloadData};

/// Raw frame envelope as it arrives from the transport.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Envelope {
    /// Event type identifier, used for routing.
    #[serde(rename = "type")]
    pub event_type: String,
    /// Event-specific payload (JSON value).
    #[serde(default)]
    pub payload: serde_json::Value,
}

impl Envelope {
    pub fn new(event_type: impl Into<String>, payload: impl Serialize) -> Self {
        Self {
            event_type: event_type.into(),
            payload: serde_json::to_value(payload).unwrap_or(serde_json::Value::Null),
        }
    }
}

/// Event type constants for the notification feed.
pub mod event_types {
    /// A new record was created for this inbox.
    pub const RECEIVED: &str = "notification_received";
    /// An existing record changed read state.
    pub const UPDATED: &str = "notification_updated";
    /// A record was archived and left the visible feed.
    pub const ARCHIVED: &str = "notification_archived";
    /// A record was permanently deleted.
    pub const DELETED: &str = "notification_deleted";
    /// Every unread record was flipped to read at once.
    pub const ALL_READ: &str = "all_notifications_read";

    /// True when `event_type` is one of the notification events above.
    pub fn is_notification_event(event_type: &str) -> bool {
        matches!(event_type, RECEIVED | UPDATED | ARCHIVED | DELETED | ALL_READ)
    }
}

/// Payload of a `notification_received` event.
///
/// Carries the full record minus the receiver-side fields; a fresh record
/// is always unread and unarchived.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ReceivedPayload {
    pub id: String,
    pub category: NotificationCategory,
    pub title: String,
    pub message: String,
    pub priority: NotificationPriority,
    #[serde(default)]
    pub data: PayloadData,
    pub created_at: i64,
}

impl ReceivedPayload {
    /// Build the full record this event announces.
    pub fn into_record(self, owner: impl Into<String>) -> NotificationRecord {
        NotificationRecord {
            id: self.id,
            owner: owner.into(),
            category: self.category,
            title: self.title,
            message: self.message,
            priority: self.priority,
            is_read: false,
            is_archived: false,
            payload: self.data,
            created_at: self.created_at,
            updated_at: self.created_at,
            read_at: None,
            expires_at: None,
        }
    }
}

/// Payload of a `notification_updated` event.
///
/// Only the fields that changed are present; absent fields leave the
/// local record untouched.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UpdatedPayload {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_read: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub read_at: Option<i64>,
}

/// All notification events carried on the push channel.
///
/// Events are serialized using serde's adjacently tagged representation:
/// `{"type": "event_name", "payload": {...}}`, matching [`Envelope`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "payload")]
pub enum PushEvent {
    #[serde(rename = "notification_received")]
    Received(ReceivedPayload),

    #[serde(rename = "notification_updated")]
    Updated(UpdatedPayload),

    #[serde(rename = "notification_archived")]
    Archived { id: String },

    #[serde(rename = "notification_deleted")]
    Deleted { id: String },

    #[serde(rename = "all_notifications_read")]
    AllRead,
}

impl PushEvent {
    /// Get the wire type string for this event.
    pub fn event_type(&self) -> &'static str {
        match self {
            PushEvent::Received(_) => event_types::RECEIVED,
            PushEvent::Updated(_) => event_types::UPDATED,
            PushEvent::Archived { .. } => event_types::ARCHIVED,
            PushEvent::Deleted { .. } => event_types::DELETED,
            PushEvent::AllRead => event_types::ALL_READ,
        }
    }

    /// Decode a raw envelope into a notification event.
    ///
    /// Fails with [`ApiError::Decode`] when the payload is missing required
    /// fields or has the wrong shape for its declared type.
    pub fn decode(envelope: &Envelope) -> Result<PushEvent, ApiError> {
        let value = serde_json::to_value(envelope).map_err(|e| ApiError::decode(e.to_string()))?;
        serde_json::from_value(value).map_err(|e| ApiError::decode(e.to_string()))
    }
}
