//! Record and event fixtures shared by the integration tests.

use inbox_engine::model::{
    NotificationCategory, NotificationPriority, NotificationRecord, PayloadData,
};
use inbox_engine::push::{Envelope, PushEvent, ReceivedPayload};
use uuid::Uuid;

/// Owner shared by every record in the fixture backend.
pub const OWNER: &str = "user-inbox-1";

/// Base timestamp (unix seconds) that per-record offsets are added to.
pub const BASE_TS: i64 = 1_700_000_000;

pub fn fresh_id() -> String {
    format!("n-{}", Uuid::new_v4())
}

/// Unread medium-priority news record.
pub fn record(id: &str, created_at: i64) -> NotificationRecord {
    NotificationRecord {
        id: id.to_string(),
        owner: OWNER.to_string(),
        category: NotificationCategory::News,
        title: format!("Title of {}", id),
        message: format!("Message of {}", id),
        priority: NotificationPriority::Medium,
        is_read: false,
        is_archived: false,
        payload: PayloadData::default(),
        created_at,
        updated_at: created_at,
        read_at: None,
        expires_at: None,
    }
}

pub fn record_with(
    id: &str,
    created_at: i64,
    category: NotificationCategory,
    priority: NotificationPriority,
) -> NotificationRecord {
    let mut record = record(id, created_at);
    record.category = category;
    record.priority = priority;
    record
}

pub fn read_record(id: &str, created_at: i64, read_at: i64) -> NotificationRecord {
    let mut record = record(id, created_at);
    record.mark_read(read_at);
    record.updated_at = read_at;
    record
}

/// The `notification_received` payload announcing `record`.
pub fn received_payload(record: &NotificationRecord) -> ReceivedPayload {
    ReceivedPayload {
        id: record.id.clone(),
        category: record.category,
        title: record.title.clone(),
        message: record.message.clone(),
        priority: record.priority,
        data: record.payload.clone(),
        created_at: record.created_at,
    }
}

pub fn received_event(record: &NotificationRecord) -> PushEvent {
    PushEvent::Received(received_payload(record))
}

/// The raw frame carrying `event`, as the transport would deliver it.
pub fn frame(event: &PushEvent) -> Envelope {
    let value = serde_json::to_value(event).expect("event serializes");
    serde_json::from_value(value).expect("event shape matches the envelope")
}
