//! Patient flow state machine
//!
//! Every status change runs as one transaction: read the flow (or create it
//! from the appointment), fill the first-reached timestamp, append history,
//! mirror the coarse status onto the appointment. The live event is published
//! only after commit and its failure never reaches the caller.

use crate::db::{flows, history, rooms, AppointmentDirectory};
use crate::models::{
    CoarseStatus, FlowHistoryEntry, FlowPatch, FlowStatus, PatientFlow, SetStatusRequest,
    StatusTimestamps, TransitionPolicy,
};
use chrono::{DateTime, Utc};
use clinic_common::db::begin_write;
use clinic_common::events::{FlowEvent, FlowNotifier, NotifyError};
use clinic_common::time::{self, Clock, ServiceDay};
use clinic_common::{uuid_utils, Error, Result};
use sqlx::{SqliteConnection, SqlitePool};
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Flow record store plus transition logic
pub struct FlowEngine {
    db: SqlitePool,
    appointments: Arc<dyn AppointmentDirectory>,
    notifier: Arc<dyn FlowNotifier>,
    clock: Arc<dyn Clock>,
    service_day: ServiceDay,
    policy: TransitionPolicy,
}

/// Result of the transactional part of a status change
struct Transition {
    flow: PatientFlow,
    previous_status: Option<FlowStatus>,
}

impl FlowEngine {
    pub fn new(
        db: SqlitePool,
        appointments: Arc<dyn AppointmentDirectory>,
        notifier: Arc<dyn FlowNotifier>,
        clock: Arc<dyn Clock>,
        service_day: ServiceDay,
        policy: TransitionPolicy,
    ) -> Self {
        Self {
            db,
            appointments,
            notifier,
            clock,
            service_day,
            policy,
        }
    }

    pub fn policy(&self) -> TransitionPolicy {
        self.policy
    }

    /// Move a visit to `request.status`, creating its flow on first use
    ///
    /// **Algorithm:**
    /// 1. Begin a write transaction (holds the write lock until commit)
    /// 2. Load the flow, or look up the appointment and build a new one
    /// 3. Check the transition policy and room occupancy
    /// 4. Fill the first-reached timestamp if unset, reset statusChangedAt
    /// 5. Append a history row with the time spent in the previous status
    /// 6. Mirror the coarse status onto the appointment
    /// 7. Commit, then publish the live event (best-effort)
    pub async fn set_status(
        &self,
        tenant_id: &str,
        appointment_id: &str,
        request: SetStatusRequest,
    ) -> Result<PatientFlow> {
        let now = self.clock.now();

        let mut tx = begin_write(&self.db).await?;
        let transition = self
            .apply_status(&mut tx, tenant_id, appointment_id, &request, now)
            .await
            .map_err(concurrent_claim_as_conflict)?;
        tx.commit().await?;

        let Transition {
            flow,
            previous_status,
        } = transition;

        info!(
            tenant_id = %tenant_id,
            appointment_id = %appointment_id,
            flow_id = %flow.id,
            from = ?previous_status,
            status = %flow.status,
            room_id = ?flow.room_id,
            milestones = flow.reached.reached_count(),
            "Patient flow status changed"
        );

        self.publish(FlowEvent::PatientFlowChanged {
            tenant_id: tenant_id.to_string(),
            flow_id: flow.id,
            appointment_id: flow.appointment_id.clone(),
            patient_id: flow.patient_id.clone(),
            room_id: flow.room_id,
            status: flow.status,
            previous_status,
            status_changed_at: flow.status_changed_at,
            timestamp: self.clock.now(),
        });

        Ok(flow)
    }

    async fn apply_status(
        &self,
        conn: &mut SqliteConnection,
        tenant_id: &str,
        appointment_id: &str,
        request: &SetStatusRequest,
        now: DateTime<Utc>,
    ) -> Result<Transition> {
        let existing = flows::find_by_appointment(conn, tenant_id, appointment_id).await?;
        self.policy
            .check(existing.as_ref().map(|f| f.status), request.status)?;

        if let Some(room_id) = request.room_id {
            ensure_room_usable(conn, tenant_id, room_id).await?;
        }

        let (flow, previous_status, duration_seconds) = match existing {
            None => {
                let appointment = self
                    .appointments
                    .lookup(conn, tenant_id, appointment_id)
                    .await?
                    .ok_or_else(|| Error::NotFound(format!("Appointment {}", appointment_id)))?;

                let mut reached = StatusTimestamps::default();
                reached.fill(request.status, now);

                let flow = PatientFlow {
                    id: uuid_utils::generate(),
                    tenant_id: tenant_id.to_string(),
                    appointment_id: appointment_id.to_string(),
                    patient_id: appointment.patient_id,
                    provider_id: appointment.provider_id,
                    location_id: appointment.location_id,
                    status: request.status,
                    status_changed_at: now,
                    reached,
                    room_id: request.room_id,
                    medical_assistant_id: None,
                    priority: request.priority.unwrap_or_default(),
                    notes: request.notes.clone(),
                    service_date: self.service_day.date_key(now),
                    created_at: now,
                    updated_at: now,
                };

                if flow.room_id.is_some() && flow.is_active() {
                    ensure_room_free(conn, &flow).await?;
                }

                flows::insert_flow(conn, &flow).await?;
                debug!(flow_id = %flow.id, appointment_id = %appointment_id, "Created patient flow");

                (flow, None, None)
            }
            Some(mut flow) => {
                let previous_status = flow.status;
                let previous_room = flow.room_id;
                let duration = time::elapsed_seconds(flow.status_changed_at, now);

                flow.reached.fill(request.status, now);
                flow.status = request.status;
                flow.status_changed_at = now;
                if let Some(room_id) = request.room_id {
                    flow.room_id = Some(room_id);
                }
                if let Some(notes) = &request.notes {
                    flow.notes = Some(notes.clone());
                }
                if let Some(priority) = request.priority {
                    flow.priority = priority;
                }
                flow.updated_at = now;

                let reclaims_room =
                    flow.room_id != previous_room || previous_status.is_terminal();
                if flow.room_id.is_some() && flow.is_active() && reclaims_room {
                    ensure_room_free(conn, &flow).await?;
                }

                flows::save_flow(conn, &flow).await?;

                (flow, Some(previous_status), Some(duration))
            }
        };

        let entry = FlowHistoryEntry {
            id: uuid_utils::generate(),
            flow_id: flow.id,
            seq: history::next_seq(conn, flow.id).await?,
            from_status: previous_status,
            to_status: request.status,
            changed_by: request.changed_by.clone(),
            changed_by_name: None,
            changed_at: now,
            room_id: flow.room_id,
            notes: request.notes.clone(),
            duration_seconds,
        };
        history::append_entry(conn, tenant_id, &entry).await?;

        self.appointments
            .mirror_status(
                conn,
                tenant_id,
                appointment_id,
                CoarseStatus::from(request.status),
                now,
            )
            .await?;

        Ok(Transition {
            flow,
            previous_status,
        })
    }

    /// Patch room, priority, staff or notes without a status change
    ///
    /// Writes no history row.
    pub async fn update_flow(
        &self,
        tenant_id: &str,
        appointment_id: &str,
        patch: FlowPatch,
    ) -> Result<PatientFlow> {
        patch.validate()?;
        let now = self.clock.now();

        let mut tx = begin_write(&self.db).await?;

        let mut flow = flows::find_by_appointment(&mut tx, tenant_id, appointment_id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("Patient flow for appointment {}", appointment_id)))?;

        if let Some(room_id) = patch.room_id {
            ensure_room_usable(&mut tx, tenant_id, room_id).await?;
            let moved = flow.room_id != Some(room_id);
            flow.room_id = Some(room_id);
            if moved && flow.is_active() {
                ensure_room_free(&mut tx, &flow).await?;
            }
        }
        if let Some(priority) = patch.priority {
            flow.priority = priority;
        }
        if let Some(provider_id) = patch.provider_id {
            flow.provider_id = provider_id;
        }
        if let Some(ma_id) = patch.medical_assistant_id {
            flow.medical_assistant_id = Some(ma_id);
        }
        if let Some(notes) = patch.notes {
            flow.notes = Some(notes);
        }
        flow.updated_at = now;

        flows::save_flow(&mut tx, &flow)
            .await
            .map_err(concurrent_claim_as_conflict)?;
        tx.commit().await?;

        info!(
            tenant_id = %tenant_id,
            appointment_id = %appointment_id,
            flow_id = %flow.id,
            "Patient flow details updated"
        );

        self.publish(FlowEvent::FlowDetailsUpdated {
            tenant_id: tenant_id.to_string(),
            flow_id: flow.id,
            appointment_id: flow.appointment_id.clone(),
            room_id: flow.room_id,
            priority: flow.priority,
            timestamp: self.clock.now(),
        });

        Ok(flow)
    }

    /// Current flow for an appointment
    pub async fn get_flow(&self, tenant_id: &str, appointment_id: &str) -> Result<PatientFlow> {
        let mut conn = self.db.acquire().await?;
        flows::find_by_appointment(&mut conn, tenant_id, appointment_id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("Patient flow for appointment {}", appointment_id)))
    }

    fn publish(&self, event: FlowEvent) {
        let event_type = event.event_type();
        match self.notifier.notify(event) {
            Ok(()) => debug!("Published {}", event_type),
            Err(NotifyError::NoSubscribers(_)) => {
                debug!("No live subscribers for {}", event_type)
            }
            Err(e) => warn!("Failed to publish {}: {}", event_type, e),
        }
    }
}

async fn ensure_room_usable(
    conn: &mut SqliteConnection,
    tenant_id: &str,
    room_id: Uuid,
) -> Result<()> {
    let room = rooms::get_room(conn, tenant_id, room_id)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Room {}", room_id)))?;

    if !room.is_active {
        return Err(Error::Validation(format!(
            "Room {} ({}) is inactive",
            room.name, room.room_number
        )));
    }

    Ok(())
}

/// Reject a room already held by another active flow on the same service day
async fn ensure_room_free(conn: &mut SqliteConnection, flow: &PatientFlow) -> Result<()> {
    let Some(room_id) = flow.room_id else {
        return Ok(());
    };

    let occupant =
        flows::find_room_occupant(conn, &flow.tenant_id, room_id, &flow.service_date, flow.id)
            .await?;

    match occupant {
        Some(other) => Err(Error::Conflict(format!(
            "Room {} is occupied by appointment {}",
            room_id, other
        ))),
        None => Ok(()),
    }
}

/// Unique violations here mean a concurrent writer claimed the room or created the flow first
fn concurrent_claim_as_conflict(err: Error) -> Error {
    if err.is_unique_violation() {
        Error::Conflict(format!("Concurrent update rejected: {}", err))
    } else {
        err
    }
}
