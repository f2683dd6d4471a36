//! Status history entries

use super::status::FlowStatus;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One immutable status change
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowHistoryEntry {
    pub id: Uuid,
    pub flow_id: Uuid,
    /// Position within the flow's history, starting at 1
    pub seq: i64,
    /// None for the entry that created the flow
    pub from_status: Option<FlowStatus>,
    pub to_status: FlowStatus,
    pub changed_by: Option<String>,
    /// Display name of `changed_by`, when the staff member is known
    pub changed_by_name: Option<String>,
    pub changed_at: DateTime<Utc>,
    pub room_id: Option<Uuid>,
    pub notes: Option<String>,
    /// Seconds spent in `from_status`
    pub duration_seconds: Option<i64>,
}
