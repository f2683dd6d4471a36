//! Room registry and provider room assignments
//!
//! Rooms are created and edited by administrators and never deleted.
//! Assignments only annotate the room board; they never reserve a room.

use crate::db::{assignments, rooms};
use crate::models::{AssignmentRequest, ExamRoom, NewRoom, RoomAssignment, RoomPatch};
use clinic_common::db::begin_write;
use clinic_common::time::Clock;
use clinic_common::{uuid_utils, Error, Result};
use sqlx::SqlitePool;
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

pub struct RoomRegistry {
    db: SqlitePool,
    clock: Arc<dyn Clock>,
}

impl RoomRegistry {
    pub fn new(db: SqlitePool, clock: Arc<dyn Clock>) -> Self {
        Self { db, clock }
    }

    /// Rooms ordered by display order, then room number
    pub async fn list_rooms(
        &self,
        tenant_id: &str,
        location_id: Option<&str>,
        active_only: bool,
    ) -> Result<Vec<ExamRoom>> {
        debug!(tenant_id = %tenant_id, location_id = ?location_id, "Listing rooms");
        rooms::list_rooms(&self.db, tenant_id, location_id, active_only).await
    }

    pub async fn get_room(&self, tenant_id: &str, room_id: Uuid) -> Result<ExamRoom> {
        let mut conn = self.db.acquire().await?;
        rooms::get_room(&mut conn, tenant_id, room_id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("Room {}", room_id)))
    }

    /// Create a room; a duplicate room number within the location is a conflict
    pub async fn create_room(&self, tenant_id: &str, new_room: NewRoom) -> Result<ExamRoom> {
        new_room.validate()?;
        let now = self.clock.now();

        let room = ExamRoom {
            id: uuid_utils::generate(),
            tenant_id: tenant_id.to_string(),
            location_id: new_room.location_id,
            name: new_room.name.trim().to_string(),
            room_number: new_room.room_number.trim().to_string(),
            room_type: new_room.room_type,
            is_active: true,
            display_order: new_room.display_order,
            equipment: new_room.equipment,
            notes: new_room.notes,
            created_at: now,
            updated_at: now,
        };

        rooms::insert_room(&self.db, &room)
            .await
            .map_err(|e| duplicate_room_number(e, &room.room_number))?;

        info!(
            tenant_id = %tenant_id,
            room_id = %room.id,
            location_id = %room.location_id,
            room_number = %room.room_number,
            "Created room"
        );

        Ok(room)
    }

    /// Apply a partial patch; an empty patch is rejected before touching the store
    pub async fn update_room(
        &self,
        tenant_id: &str,
        room_id: Uuid,
        patch: RoomPatch,
    ) -> Result<ExamRoom> {
        patch.validate()?;
        let now = self.clock.now();

        let mut tx = begin_write(&self.db).await?;
        let mut room = rooms::get_room(&mut tx, tenant_id, room_id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("Room {}", room_id)))?;

        if let Some(name) = patch.name {
            room.name = name.trim().to_string();
        }
        if let Some(room_number) = patch.room_number {
            room.room_number = room_number.trim().to_string();
        }
        if let Some(room_type) = patch.room_type {
            room.room_type = room_type;
        }
        if let Some(is_active) = patch.is_active {
            room.is_active = is_active;
        }
        if let Some(display_order) = patch.display_order {
            room.display_order = display_order;
        }
        if let Some(equipment) = patch.equipment {
            room.equipment = equipment;
        }
        if let Some(notes) = patch.notes {
            room.notes = Some(notes);
        }
        room.updated_at = now;

        rooms::save_room(&mut tx, &room)
            .await
            .map_err(|e| duplicate_room_number(e, &room.room_number))?;
        tx.commit().await?;

        info!(
            tenant_id = %tenant_id,
            room_id = %room.id,
            is_active = room.is_active,
            "Updated room"
        );

        Ok(room)
    }

    /// Insert or reactivate an assignment
    pub async fn set_room_assignment(
        &self,
        tenant_id: &str,
        request: AssignmentRequest,
    ) -> Result<RoomAssignment> {
        request.validate()?;
        // Existence check keeps the room reference tenant-scoped
        self.get_room(tenant_id, request.room_id).await?;

        let assignment = assignments::upsert_assignment(
            &self.db,
            tenant_id,
            &request,
            uuid_utils::generate(),
            self.clock.now(),
        )
        .await?;

        info!(
            tenant_id = %tenant_id,
            assignment_id = %assignment.id,
            room_id = %assignment.room_id,
            provider_id = %assignment.provider_id,
            day_of_week = assignment.day_of_week,
            time_slot = assignment.time_slot.as_str(),
            "Room assignment set"
        );

        Ok(assignment)
    }

    /// Deactivate an assignment
    pub async fn remove_room_assignment(&self, tenant_id: &str, assignment_id: Uuid) -> Result<()> {
        let found = assignments::deactivate_assignment(
            &self.db,
            tenant_id,
            assignment_id,
            self.clock.now(),
        )
        .await?;

        if !found {
            return Err(Error::NotFound(format!("Room assignment {}", assignment_id)));
        }

        info!(tenant_id = %tenant_id, assignment_id = %assignment_id, "Room assignment removed");
        Ok(())
    }

    pub async fn list_room_assignments(
        &self,
        tenant_id: &str,
        room_id: Option<Uuid>,
    ) -> Result<Vec<RoomAssignment>> {
        assignments::list_active_assignments(&self.db, tenant_id, room_id).await
    }
}

fn duplicate_room_number(err: Error, room_number: &str) -> Error {
    if err.is_unique_violation() {
        Error::Conflict(format!("Room number {} already exists at this location", room_number))
    } else {
        err
    }
}
