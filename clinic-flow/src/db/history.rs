//! Flow status history database operations
//!
//! The table is append-only; triggers reject UPDATE and DELETE.

use super::{opt_uuid_column, ts_column, uuid_column};
use crate::models::status::parse_status;
use crate::models::FlowHistoryEntry;
use clinic_common::{time, Result};
use sqlx::{Row, SqliteConnection, SqlitePool};
use uuid::Uuid;

/// Next sequence number for a flow's history
pub async fn next_seq(conn: &mut SqliteConnection, flow_id: Uuid) -> Result<i64> {
    let seq: i64 = sqlx::query_scalar(
        "SELECT COALESCE(MAX(seq), 0) + 1 FROM flow_status_history WHERE flow_id = ?",
    )
    .bind(flow_id.to_string())
    .fetch_one(&mut *conn)
    .await?;

    Ok(seq)
}

/// Append one entry
pub async fn append_entry(
    conn: &mut SqliteConnection,
    tenant_id: &str,
    entry: &FlowHistoryEntry,
) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO flow_status_history (
            id, tenant_id, flow_id, seq, from_status, to_status,
            changed_by, changed_at, room_id, notes, duration_seconds
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(entry.id.to_string())
    .bind(tenant_id)
    .bind(entry.flow_id.to_string())
    .bind(entry.seq)
    .bind(entry.from_status.map(|s| s.as_str()))
    .bind(entry.to_status.as_str())
    .bind(&entry.changed_by)
    .bind(time::to_millis(entry.changed_at))
    .bind(entry.room_id.map(|id| id.to_string()))
    .bind(&entry.notes)
    .bind(entry.duration_seconds)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// History of one flow in write order, with actor display names
pub async fn list_for_flow(
    pool: &SqlitePool,
    tenant_id: &str,
    flow_id: Uuid,
) -> Result<Vec<FlowHistoryEntry>> {
    let rows = sqlx::query(
        r#"
        SELECT h.id, h.flow_id, h.seq, h.from_status, h.to_status, h.changed_by,
               s.display_name AS changed_by_name,
               h.changed_at, h.room_id, h.notes, h.duration_seconds
        FROM flow_status_history h
        LEFT JOIN staff s ON s.tenant_id = h.tenant_id AND s.id = h.changed_by
        WHERE h.tenant_id = ? AND h.flow_id = ?
        ORDER BY h.seq
        "#,
    )
    .bind(tenant_id)
    .bind(flow_id.to_string())
    .fetch_all(pool)
    .await?;

    rows.iter()
        .map(|row| {
            let from_status: Option<String> = row.try_get("from_status")?;
            let to_status: String = row.try_get("to_status")?;
            Ok(FlowHistoryEntry {
                id: uuid_column(row, "id")?,
                flow_id: uuid_column(row, "flow_id")?,
                seq: row.try_get("seq")?,
                from_status: from_status.as_deref().map(parse_status).transpose()?,
                to_status: parse_status(&to_status)?,
                changed_by: row.try_get("changed_by")?,
                changed_by_name: row.try_get("changed_by_name")?,
                changed_at: ts_column(row, "changed_at")?,
                room_id: opt_uuid_column(row, "room_id")?,
                notes: row.try_get("notes")?,
                duration_seconds: row.try_get("duration_seconds")?,
            })
        })
        .collect()
}
