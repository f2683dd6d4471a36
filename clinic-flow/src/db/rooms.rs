//! Exam room database operations

use super::{ts_column, uuid_column};
use crate::models::{ExamRoom, RoomType};
use clinic_common::{time, Error, Result};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection, SqlitePool};
use uuid::Uuid;

const ROOM_COLUMNS: &str = "id, tenant_id, location_id, name, room_number, room_type, is_active, \
     display_order, equipment, notes, created_at, updated_at";

fn map_room(row: &SqliteRow) -> Result<ExamRoom> {
    let room_type: String = row.try_get("room_type")?;
    let equipment: String = row.try_get("equipment")?;
    let equipment: Vec<String> = serde_json::from_str(&equipment)
        .map_err(|e| Error::Internal(format!("Failed to deserialize equipment: {}", e)))?;

    Ok(ExamRoom {
        id: uuid_column(row, "id")?,
        tenant_id: row.try_get("tenant_id")?,
        location_id: row.try_get("location_id")?,
        name: row.try_get("name")?,
        room_number: row.try_get("room_number")?,
        room_type: room_type.parse::<RoomType>()?,
        is_active: row.try_get("is_active")?,
        display_order: row.try_get("display_order")?,
        equipment,
        notes: row.try_get("notes")?,
        created_at: ts_column(row, "created_at")?,
        updated_at: ts_column(row, "updated_at")?,
    })
}

/// List rooms ordered by display order, then room number
pub async fn list_rooms(
    pool: &SqlitePool,
    tenant_id: &str,
    location_id: Option<&str>,
    active_only: bool,
) -> Result<Vec<ExamRoom>> {
    let sql = format!(
        r#"
        SELECT {ROOM_COLUMNS}
        FROM exam_rooms
        WHERE tenant_id = ?
          AND (? IS NULL OR location_id = ?)
          AND (? = 0 OR is_active = 1)
        ORDER BY display_order, room_number
        "#
    );

    let rows = sqlx::query(&sql)
        .bind(tenant_id)
        .bind(location_id)
        .bind(location_id)
        .bind(active_only)
        .fetch_all(pool)
        .await?;

    rows.iter().map(map_room).collect()
}

/// Load one room
pub async fn get_room(
    conn: &mut SqliteConnection,
    tenant_id: &str,
    room_id: Uuid,
) -> Result<Option<ExamRoom>> {
    let sql = format!("SELECT {ROOM_COLUMNS} FROM exam_rooms WHERE tenant_id = ? AND id = ?");

    let row = sqlx::query(&sql)
        .bind(tenant_id)
        .bind(room_id.to_string())
        .fetch_optional(&mut *conn)
        .await?;

    row.as_ref().map(map_room).transpose()
}

/// Insert a new room
pub async fn insert_room(pool: &SqlitePool, room: &ExamRoom) -> Result<()> {
    let equipment = serde_json::to_string(&room.equipment)
        .map_err(|e| Error::Internal(format!("Failed to serialize equipment: {}", e)))?;

    sqlx::query(
        r#"
        INSERT INTO exam_rooms (
            id, tenant_id, location_id, name, room_number, room_type, is_active,
            display_order, equipment, notes, created_at, updated_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(room.id.to_string())
    .bind(&room.tenant_id)
    .bind(&room.location_id)
    .bind(&room.name)
    .bind(&room.room_number)
    .bind(room.room_type.as_str())
    .bind(room.is_active)
    .bind(room.display_order)
    .bind(&equipment)
    .bind(&room.notes)
    .bind(time::to_millis(room.created_at))
    .bind(time::to_millis(room.updated_at))
    .execute(pool)
    .await?;

    Ok(())
}

/// Write back every editable field of a room
pub async fn save_room(conn: &mut SqliteConnection, room: &ExamRoom) -> Result<()> {
    let equipment = serde_json::to_string(&room.equipment)
        .map_err(|e| Error::Internal(format!("Failed to serialize equipment: {}", e)))?;

    sqlx::query(
        r#"
        UPDATE exam_rooms
        SET name = ?, room_number = ?, room_type = ?, is_active = ?,
            display_order = ?, equipment = ?, notes = ?, updated_at = ?
        WHERE tenant_id = ? AND id = ?
        "#,
    )
    .bind(&room.name)
    .bind(&room.room_number)
    .bind(room.room_type.as_str())
    .bind(room.is_active)
    .bind(room.display_order)
    .bind(&equipment)
    .bind(&room.notes)
    .bind(time::to_millis(room.updated_at))
    .bind(&room.tenant_id)
    .bind(room.id.to_string())
    .execute(&mut *conn)
    .await?;

    Ok(())
}
