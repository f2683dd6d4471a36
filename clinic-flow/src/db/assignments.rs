//! Room assignment database operations

use super::{ts_column, uuid_column};
use crate::models::{AssignmentRequest, RoomAssignment, TimeSlot};
use chrono::{DateTime, Utc};
use clinic_common::{time, Result};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

const ASSIGNMENT_COLUMNS: &str = "a.id, a.tenant_id, a.room_id, a.provider_id, a.day_of_week, \
     a.time_slot, a.is_active, a.created_at, a.updated_at";

fn map_assignment(row: &SqliteRow) -> Result<RoomAssignment> {
    let time_slot: String = row.try_get("time_slot")?;
    let day_of_week: i64 = row.try_get("day_of_week")?;

    Ok(RoomAssignment {
        id: uuid_column(row, "id")?,
        tenant_id: row.try_get("tenant_id")?,
        room_id: uuid_column(row, "room_id")?,
        provider_id: row.try_get("provider_id")?,
        day_of_week: day_of_week.clamp(0, 6) as u8,
        time_slot: time_slot.parse::<TimeSlot>()?,
        is_active: row.try_get("is_active")?,
        created_at: ts_column(row, "created_at")?,
        updated_at: ts_column(row, "updated_at")?,
    })
}

/// Insert or reactivate a (room, provider, weekday, slot) assignment
pub async fn upsert_assignment(
    pool: &SqlitePool,
    tenant_id: &str,
    request: &AssignmentRequest,
    new_id: Uuid,
    now: DateTime<Utc>,
) -> Result<RoomAssignment> {
    let now_ms = time::to_millis(now);

    sqlx::query(
        r#"
        INSERT INTO room_assignments (
            id, tenant_id, room_id, provider_id, day_of_week, time_slot,
            is_active, created_at, updated_at
        ) VALUES (?, ?, ?, ?, ?, ?, 1, ?, ?)
        ON CONFLICT(tenant_id, room_id, provider_id, day_of_week, time_slot) DO UPDATE SET
            is_active = 1,
            updated_at = excluded.updated_at
        "#,
    )
    .bind(new_id.to_string())
    .bind(tenant_id)
    .bind(request.room_id.to_string())
    .bind(&request.provider_id)
    .bind(request.day_of_week as i64)
    .bind(request.time_slot.as_str())
    .bind(now_ms)
    .bind(now_ms)
    .execute(pool)
    .await?;

    let sql = format!(
        r#"
        SELECT {ASSIGNMENT_COLUMNS} FROM room_assignments a
        WHERE a.tenant_id = ? AND a.room_id = ? AND a.provider_id = ?
          AND a.day_of_week = ? AND a.time_slot = ?
        "#
    );

    let row = sqlx::query(&sql)
        .bind(tenant_id)
        .bind(request.room_id.to_string())
        .bind(&request.provider_id)
        .bind(request.day_of_week as i64)
        .bind(request.time_slot.as_str())
        .fetch_one(pool)
        .await?;

    map_assignment(&row)
}

/// Deactivate an assignment; returns false when it does not exist
pub async fn deactivate_assignment(
    pool: &SqlitePool,
    tenant_id: &str,
    assignment_id: Uuid,
    now: DateTime<Utc>,
) -> Result<bool> {
    let result = sqlx::query(
        "UPDATE room_assignments SET is_active = 0, updated_at = ? WHERE tenant_id = ? AND id = ?",
    )
    .bind(time::to_millis(now))
    .bind(tenant_id)
    .bind(assignment_id.to_string())
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Active assignments, optionally for one room
pub async fn list_active_assignments(
    pool: &SqlitePool,
    tenant_id: &str,
    room_id: Option<Uuid>,
) -> Result<Vec<RoomAssignment>> {
    let room_id = room_id.map(|id| id.to_string());
    let sql = format!(
        r#"
        SELECT {ASSIGNMENT_COLUMNS} FROM room_assignments a
        WHERE a.tenant_id = ? AND a.is_active = 1
          AND (? IS NULL OR a.room_id = ?)
        ORDER BY a.room_id, a.day_of_week, a.time_slot, a.provider_id
        "#
    );

    let rows = sqlx::query(&sql)
        .bind(tenant_id)
        .bind(&room_id)
        .bind(&room_id)
        .fetch_all(pool)
        .await?;

    rows.iter().map(map_assignment).collect()
}

/// Active assignment with the provider's display name
pub struct BoardAssignmentRow {
    pub assignment: RoomAssignment,
    pub provider_name: Option<String>,
}

/// Active assignments for a location's rooms on one weekday
pub async fn list_for_location_day(
    pool: &SqlitePool,
    tenant_id: &str,
    location_id: &str,
    day_of_week: u8,
) -> Result<Vec<BoardAssignmentRow>> {
    let sql = format!(
        r#"
        SELECT {ASSIGNMENT_COLUMNS}, s.display_name AS provider_name
        FROM room_assignments a
        JOIN exam_rooms r ON r.id = a.room_id AND r.tenant_id = a.tenant_id
        LEFT JOIN staff s ON s.tenant_id = a.tenant_id AND s.id = a.provider_id
        WHERE a.tenant_id = ? AND r.location_id = ? AND a.day_of_week = ? AND a.is_active = 1
        ORDER BY a.created_at
        "#
    );

    let rows = sqlx::query(&sql)
        .bind(tenant_id)
        .bind(location_id)
        .bind(day_of_week as i64)
        .fetch_all(pool)
        .await?;

    rows.iter()
        .map(|row| {
            Ok(BoardAssignmentRow {
                assignment: map_assignment(row)?,
                provider_name: row.try_get("provider_name")?,
            })
        })
        .collect()
}
