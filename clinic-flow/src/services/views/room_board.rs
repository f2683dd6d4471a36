//! Room board: one entry per active room at a location

use super::FlowViews;
use crate::db::{assignments, flows, rooms};
use crate::models::{AssignedProvider, BoardPatient, PatientFlow, RoomBoardEntry, TimeSlot};
use clinic_common::time;
use clinic_common::Result;
use std::collections::HashMap;
use tracing::{debug, warn};
use uuid::Uuid;

impl FlowViews {
    /// Current occupant and usual provider of every active room at a location
    ///
    /// Empty rooms are included with no `current_patient`.
    pub async fn get_room_board(
        &self,
        tenant_id: &str,
        location_id: &str,
    ) -> Result<Vec<RoomBoardEntry>> {
        let now = self.clock.now();
        let today = self.service_day.date_key(now);
        let weekday = self.service_day.weekday(now);
        let slot = TimeSlot::current(self.service_day.is_morning(now));

        let active_rooms = rooms::list_rooms(&self.db, tenant_id, Some(location_id), true).await?;

        let mut occupants: HashMap<Uuid, PatientFlow> = HashMap::new();
        for flow in flows::list_room_occupants(&self.db, tenant_id, location_id, &today).await? {
            let Some(room_id) = flow.room_id else {
                continue;
            };
            if let Some(first) = occupants.get(&room_id) {
                warn!(
                    room_id = %room_id,
                    kept = %first.appointment_id,
                    ignored = %flow.appointment_id,
                    "Room has more than one active flow"
                );
                continue;
            }
            occupants.insert(room_id, flow);
        }

        let mut providers: HashMap<Uuid, AssignedProvider> = HashMap::new();
        for row in assignments::list_for_location_day(&self.db, tenant_id, location_id, weekday).await? {
            let assignment = row.assignment;
            let slot_match = assignment.time_slot == slot;
            if !slot_match && assignment.time_slot != TimeSlot::AllDay {
                continue;
            }
            // A slot-specific assignment beats all_day
            let replace = match providers.get(&assignment.room_id) {
                None => true,
                Some(existing) => slot_match && existing.time_slot != slot,
            };
            if !replace {
                continue;
            }
            providers.insert(
                assignment.room_id,
                AssignedProvider {
                    assignment_id: assignment.id,
                    provider_id: assignment.provider_id,
                    provider_name: row.provider_name,
                    time_slot: assignment.time_slot,
                },
            );
        }

        let board: Vec<RoomBoardEntry> = active_rooms
            .into_iter()
            .map(|room| {
                let current_patient = occupants.remove(&room.id).map(|flow| BoardPatient {
                    flow_id: flow.id,
                    appointment_id: flow.appointment_id,
                    patient_id: flow.patient_id,
                    provider_id: flow.provider_id,
                    status: flow.status,
                    priority: flow.priority,
                    status_changed_at: flow.status_changed_at,
                    wait_time_minutes: time::elapsed_minutes(flow.status_changed_at, now),
                });
                let assigned_provider = providers.remove(&room.id);
                RoomBoardEntry {
                    room,
                    current_patient,
                    assigned_provider,
                }
            })
            .collect();

        debug!(
            tenant_id = %tenant_id,
            location_id = %location_id,
            rooms = board.len(),
            "Built room board"
        );

        Ok(board)
    }
}
