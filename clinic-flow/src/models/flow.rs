//! Patient flow record
//!
//! One record per (tenant, appointment), created lazily by the first status
//! change and closed (never deleted) when it reaches `completed`.

use super::status::{FlowStatus, Priority};
use chrono::{DateTime, Utc};
use clinic_common::{Error, Result};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// First time a flow reached each status
///
/// Each field is filled at most once; later visits to the same status leave it untouched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusTimestamps {
    pub checked_in_at: Option<DateTime<Utc>>,
    pub rooming_at: Option<DateTime<Utc>>,
    pub vitals_complete_at: Option<DateTime<Utc>>,
    pub ready_for_provider_at: Option<DateTime<Utc>>,
    pub with_provider_at: Option<DateTime<Utc>>,
    pub checkout_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl StatusTimestamps {
    pub fn get(&self, status: FlowStatus) -> Option<DateTime<Utc>> {
        match status {
            FlowStatus::CheckedIn => self.checked_in_at,
            FlowStatus::Rooming => self.rooming_at,
            FlowStatus::VitalsComplete => self.vitals_complete_at,
            FlowStatus::ReadyForProvider => self.ready_for_provider_at,
            FlowStatus::WithProvider => self.with_provider_at,
            FlowStatus::Checkout => self.checkout_at,
            FlowStatus::Completed => self.completed_at,
        }
    }

    fn slot(&mut self, status: FlowStatus) -> &mut Option<DateTime<Utc>> {
        match status {
            FlowStatus::CheckedIn => &mut self.checked_in_at,
            FlowStatus::Rooming => &mut self.rooming_at,
            FlowStatus::VitalsComplete => &mut self.vitals_complete_at,
            FlowStatus::ReadyForProvider => &mut self.ready_for_provider_at,
            FlowStatus::WithProvider => &mut self.with_provider_at,
            FlowStatus::Checkout => &mut self.checkout_at,
            FlowStatus::Completed => &mut self.completed_at,
        }
    }

    /// Record `at` for `status` unless already set; returns true when filled
    pub fn fill(&mut self, status: FlowStatus, at: DateTime<Utc>) -> bool {
        let slot = self.slot(status);
        if slot.is_some() {
            return false;
        }
        *slot = Some(at);
        true
    }

    /// Number of statuses ever reached
    pub fn reached_count(&self) -> usize {
        FlowStatus::ALL.iter().filter(|s| self.get(**s).is_some()).count()
    }
}

/// Current state of one visit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatientFlow {
    pub id: Uuid,
    pub tenant_id: String,
    pub appointment_id: String,
    pub patient_id: String,
    pub provider_id: String,
    pub location_id: String,
    pub status: FlowStatus,
    pub status_changed_at: DateTime<Utc>,
    #[serde(flatten)]
    pub reached: StatusTimestamps,
    pub room_id: Option<Uuid>,
    pub medical_assistant_id: Option<String>,
    pub priority: Priority,
    pub notes: Option<String>,
    /// Clinic-local date (YYYY-MM-DD) the flow was created on
    pub service_date: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PatientFlow {
    /// Whether the flow still holds its room
    pub fn is_active(&self) -> bool {
        !self.status.is_terminal()
    }
}

/// Status change request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetStatusRequest {
    pub status: FlowStatus,
    pub room_id: Option<Uuid>,
    /// Staff member making the change (None for system-driven changes)
    pub changed_by: Option<String>,
    pub notes: Option<String>,
    pub priority: Option<Priority>,
}

impl SetStatusRequest {
    pub fn new(status: FlowStatus) -> Self {
        Self {
            status,
            room_id: None,
            changed_by: None,
            notes: None,
            priority: None,
        }
    }

    pub fn with_room(mut self, room_id: Uuid) -> Self {
        self.room_id = Some(room_id);
        self
    }

    pub fn with_actor(mut self, changed_by: impl Into<String>) -> Self {
        self.changed_by = Some(changed_by.into());
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = Some(priority);
        self
    }
}

/// Partial update of a flow without a status change
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FlowPatch {
    pub priority: Option<Priority>,
    pub room_id: Option<Uuid>,
    pub provider_id: Option<String>,
    pub medical_assistant_id: Option<String>,
    pub notes: Option<String>,
}

impl FlowPatch {
    pub fn is_empty(&self) -> bool {
        self.priority.is_none()
            && self.room_id.is_none()
            && self.provider_id.is_none()
            && self.medical_assistant_id.is_none()
            && self.notes.is_none()
    }

    pub fn validate(&self) -> Result<()> {
        if self.is_empty() {
            return Err(Error::Validation("No fields to update".to_string()));
        }
        if matches!(self.provider_id.as_deref(), Some(id) if id.trim().is_empty()) {
            return Err(Error::Validation("provider_id cannot be empty".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_fill_is_first_time_only() {
        let first = Utc.with_ymd_and_hms(2026, 10, 18, 9, 0, 0).unwrap();
        let later = Utc.with_ymd_and_hms(2026, 10, 18, 9, 30, 0).unwrap();

        let mut reached = StatusTimestamps::default();
        assert!(reached.fill(FlowStatus::Rooming, first));
        assert!(!reached.fill(FlowStatus::Rooming, later));
        assert_eq!(reached.get(FlowStatus::Rooming), Some(first));
        assert_eq!(reached.reached_count(), 1);
    }

    #[test]
    fn test_set_status_request_from_json() {
        let req: SetStatusRequest =
            serde_json::from_str(r#"{"status":"with_provider","priority":"add-on"}"#).unwrap();
        assert_eq!(req.status, FlowStatus::WithProvider);
        assert_eq!(req.priority, Some(Priority::AddOn));
        assert!(req.room_id.is_none());
    }

    #[test]
    fn test_flow_patch_validation() {
        assert!(matches!(FlowPatch::default().validate(), Err(Error::Validation(_))));
        let patch = FlowPatch {
            provider_id: Some("  ".to_string()),
            ..Default::default()
        };
        assert!(patch.validate().is_err());
        let patch = FlowPatch {
            priority: Some(Priority::Urgent),
            ..Default::default()
        };
        assert!(patch.validate().is_ok());
    }
}
