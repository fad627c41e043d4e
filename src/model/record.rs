//! Notification record models.

use serde::{Deserialize, Serialize};

/// Category of a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationCategory {
    Hackathon,
    News,
    Channel,
    Problem,
    Resource,
    ProjectApproval,
    Custom,
    System,
}

impl NotificationCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationCategory::Hackathon => "hackathon",
            NotificationCategory::News => "news",
            NotificationCategory::Channel => "channel",
            NotificationCategory::Problem => "problem",
            NotificationCategory::Resource => "resource",
            NotificationCategory::ProjectApproval => "project_approval",
            NotificationCategory::Custom => "custom",
            NotificationCategory::System => "system",
        }
    }
}

/// Priority of a notification.
///
/// The ordering is for display emphasis only; delivery order is always
/// `created_at` descending regardless of priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationPriority {
    Low,
    Medium,
    High,
    Urgent,
}

impl NotificationPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationPriority::Low => "low",
            NotificationPriority::Medium => "medium",
            NotificationPriority::High => "high",
            NotificationPriority::Urgent => "urgent",
        }
    }
}

/// Opaque structured payload attached to a notification.
///
/// The engine never inspects these fields; they are carried through
/// unchanged for the rendering layer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PayloadData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub metadata: serde_json::Value,
}

/// One inbox entry.
///
/// All records handled by one engine instance share one `owner`. Wire form
/// is camelCase JSON, matching the platform's query service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationRecord {
    /// Unique identifier, primary key of the page store.
    pub id: String,
    /// Identifier of the receiving user.
    pub owner: String,
    pub category: NotificationCategory,
    pub title: String,
    pub message: String,
    pub priority: NotificationPriority,
    /// Monotonic forward (false -> true) for a single record; only the bulk
    /// mark-all-read sweep flips records in bulk.
    pub is_read: bool,
    /// Once true, stays true until the record is deleted.
    pub is_archived: bool,
    #[serde(default)]
    pub payload: PayloadData,
    /// Unix seconds. Default display order is `created_at` descending.
    pub created_at: i64,
    pub updated_at: i64,
    /// Set exactly once, when `is_read` flips true.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub read_at: Option<i64>,
    /// Server-owned; the engine does not enforce expiry locally.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<i64>,
}

impl NotificationRecord {
    /// Flip the record to read, stamping `read_at` only on the first flip.
    pub fn mark_read(&mut self, at: i64) {
        self.is_read = true;
        if self.read_at.is_none() {
            self.read_at = Some(at);
        }
    }
}
