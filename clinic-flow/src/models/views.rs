//! Read-only projections returned by the aggregation views

use super::assignment::TimeSlot;
use super::room::ExamRoom;
use super::status::{FlowStatus, Priority};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One room on the room board
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomBoardEntry {
    pub room: ExamRoom,
    /// Absent when the room is empty
    pub current_patient: Option<BoardPatient>,
    /// Provider who normally holds the room right now
    pub assigned_provider: Option<AssignedProvider>,
}

/// The active flow occupying a room
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoardPatient {
    pub flow_id: Uuid,
    pub appointment_id: String,
    pub patient_id: String,
    pub provider_id: String,
    pub status: FlowStatus,
    pub priority: Priority,
    pub status_changed_at: DateTime<Utc>,
    pub wait_time_minutes: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssignedProvider {
    pub assignment_id: Uuid,
    pub provider_id: String,
    pub provider_name: Option<String>,
    pub time_slot: TimeSlot,
}

/// One patient waiting for, or with, a provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderQueueEntry {
    pub flow_id: Uuid,
    pub appointment_id: String,
    pub patient_id: String,
    pub status: FlowStatus,
    pub priority: Priority,
    pub room_id: Option<Uuid>,
    pub room_name: Option<String>,
    /// Minutes since the last status change
    pub wait_minutes: i64,
    pub appointment_type: Option<String>,
    pub scheduled_start: Option<DateTime<Utc>>,
    pub ready_for_provider_at: Option<DateTime<Utc>>,
}

/// Today's wait-time statistics for one location
///
/// Averages are minutes rounded to one decimal, None when no flow has both
/// endpoints of the interval.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaitTimeStats {
    pub location_id: String,
    pub avg_checkin_to_rooming: Option<f64>,
    pub avg_rooming_to_vitals: Option<f64>,
    pub avg_vitals_to_provider: Option<f64>,
    pub avg_with_provider: Option<f64>,
    pub avg_total_visit: Option<f64>,
    pub waiting_count: i64,
    pub with_provider_count: i64,
    pub completed_count: i64,
    pub total_flows: i64,
}

impl WaitTimeStats {
    pub fn empty(location_id: impl Into<String>) -> Self {
        Self {
            location_id: location_id.into(),
            avg_checkin_to_rooming: None,
            avg_rooming_to_vitals: None,
            avg_vitals_to_provider: None,
            avg_with_provider: None,
            avg_total_visit: None,
            waiting_count: 0,
            with_provider_count: 0,
            completed_count: 0,
            total_flows: 0,
        }
    }
}
