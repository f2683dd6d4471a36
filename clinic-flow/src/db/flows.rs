//! Patient flow database operations

use super::{opt_ts_column, opt_uuid_column, ts_column, uuid_column};
use crate::models::status::{parse_priority, parse_status};
use crate::models::{PatientFlow, StatusTimestamps};
use chrono::{DateTime, Utc};
use clinic_common::{time, Result};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection, SqlitePool};
use uuid::Uuid;

pub(crate) const FLOW_COLUMNS: &str = "f.id, f.tenant_id, f.appointment_id, f.patient_id, \
     f.provider_id, f.location_id, f.status, f.status_changed_at, f.checked_in_at, f.rooming_at, \
     f.vitals_complete_at, f.ready_for_provider_at, f.with_provider_at, f.checkout_at, \
     f.completed_at, f.room_id, f.medical_assistant_id, f.priority, f.notes, f.service_date, \
     f.created_at, f.updated_at";

pub(crate) fn map_flow(row: &SqliteRow) -> Result<PatientFlow> {
    let status: String = row.try_get("status")?;
    let priority: String = row.try_get("priority")?;

    Ok(PatientFlow {
        id: uuid_column(row, "id")?,
        tenant_id: row.try_get("tenant_id")?,
        appointment_id: row.try_get("appointment_id")?,
        patient_id: row.try_get("patient_id")?,
        provider_id: row.try_get("provider_id")?,
        location_id: row.try_get("location_id")?,
        status: parse_status(&status)?,
        status_changed_at: ts_column(row, "status_changed_at")?,
        reached: StatusTimestamps {
            checked_in_at: opt_ts_column(row, "checked_in_at")?,
            rooming_at: opt_ts_column(row, "rooming_at")?,
            vitals_complete_at: opt_ts_column(row, "vitals_complete_at")?,
            ready_for_provider_at: opt_ts_column(row, "ready_for_provider_at")?,
            with_provider_at: opt_ts_column(row, "with_provider_at")?,
            checkout_at: opt_ts_column(row, "checkout_at")?,
            completed_at: opt_ts_column(row, "completed_at")?,
        },
        room_id: opt_uuid_column(row, "room_id")?,
        medical_assistant_id: row.try_get("medical_assistant_id")?,
        priority: parse_priority(&priority)?,
        notes: row.try_get("notes")?,
        service_date: row.try_get("service_date")?,
        created_at: ts_column(row, "created_at")?,
        updated_at: ts_column(row, "updated_at")?,
    })
}

fn opt_millis(ts: Option<DateTime<Utc>>) -> Option<i64> {
    ts.map(time::to_millis)
}

/// Load the flow for an appointment
pub async fn find_by_appointment(
    conn: &mut SqliteConnection,
    tenant_id: &str,
    appointment_id: &str,
) -> Result<Option<PatientFlow>> {
    let sql = format!(
        "SELECT {FLOW_COLUMNS} FROM patient_flows f WHERE f.tenant_id = ? AND f.appointment_id = ?"
    );

    let row = sqlx::query(&sql)
        .bind(tenant_id)
        .bind(appointment_id)
        .fetch_optional(&mut *conn)
        .await?;

    row.as_ref().map(map_flow).transpose()
}

/// Insert a newly created flow
pub async fn insert_flow(conn: &mut SqliteConnection, flow: &PatientFlow) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO patient_flows (
            id, tenant_id, appointment_id, patient_id, provider_id, location_id,
            status, status_changed_at,
            checked_in_at, rooming_at, vitals_complete_at, ready_for_provider_at,
            with_provider_at, checkout_at, completed_at,
            room_id, medical_assistant_id, priority, notes, service_date,
            created_at, updated_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(flow.id.to_string())
    .bind(&flow.tenant_id)
    .bind(&flow.appointment_id)
    .bind(&flow.patient_id)
    .bind(&flow.provider_id)
    .bind(&flow.location_id)
    .bind(flow.status.as_str())
    .bind(time::to_millis(flow.status_changed_at))
    .bind(opt_millis(flow.reached.checked_in_at))
    .bind(opt_millis(flow.reached.rooming_at))
    .bind(opt_millis(flow.reached.vitals_complete_at))
    .bind(opt_millis(flow.reached.ready_for_provider_at))
    .bind(opt_millis(flow.reached.with_provider_at))
    .bind(opt_millis(flow.reached.checkout_at))
    .bind(opt_millis(flow.reached.completed_at))
    .bind(flow.room_id.map(|id| id.to_string()))
    .bind(&flow.medical_assistant_id)
    .bind(flow.priority.as_str())
    .bind(&flow.notes)
    .bind(&flow.service_date)
    .bind(time::to_millis(flow.created_at))
    .bind(time::to_millis(flow.updated_at))
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// Write back the mutable state of an existing flow
///
/// First-reached columns are only filled when still NULL.
pub async fn save_flow(conn: &mut SqliteConnection, flow: &PatientFlow) -> Result<()> {
    sqlx::query(
        r#"
        UPDATE patient_flows
        SET status = ?,
            status_changed_at = ?,
            checked_in_at = COALESCE(checked_in_at, ?),
            rooming_at = COALESCE(rooming_at, ?),
            vitals_complete_at = COALESCE(vitals_complete_at, ?),
            ready_for_provider_at = COALESCE(ready_for_provider_at, ?),
            with_provider_at = COALESCE(with_provider_at, ?),
            checkout_at = COALESCE(checkout_at, ?),
            completed_at = COALESCE(completed_at, ?),
            room_id = ?,
            provider_id = ?,
            medical_assistant_id = ?,
            priority = ?,
            notes = ?,
            updated_at = ?
        WHERE tenant_id = ? AND id = ?
        "#,
    )
    .bind(flow.status.as_str())
    .bind(time::to_millis(flow.status_changed_at))
    .bind(opt_millis(flow.reached.checked_in_at))
    .bind(opt_millis(flow.reached.rooming_at))
    .bind(opt_millis(flow.reached.vitals_complete_at))
    .bind(opt_millis(flow.reached.ready_for_provider_at))
    .bind(opt_millis(flow.reached.with_provider_at))
    .bind(opt_millis(flow.reached.checkout_at))
    .bind(opt_millis(flow.reached.completed_at))
    .bind(flow.room_id.map(|id| id.to_string()))
    .bind(&flow.provider_id)
    .bind(&flow.medical_assistant_id)
    .bind(flow.priority.as_str())
    .bind(&flow.notes)
    .bind(time::to_millis(flow.updated_at))
    .bind(&flow.tenant_id)
    .bind(flow.id.to_string())
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// Appointment id of another active flow holding `room_id` on `service_date`
pub async fn find_room_occupant(
    conn: &mut SqliteConnection,
    tenant_id: &str,
    room_id: Uuid,
    service_date: &str,
    excluding_flow: Uuid,
) -> Result<Option<String>> {
    let occupant: Option<String> = sqlx::query_scalar(
        r#"
        SELECT appointment_id FROM patient_flows
        WHERE tenant_id = ? AND room_id = ? AND service_date = ?
          AND status <> 'completed' AND id <> ?
        LIMIT 1
        "#,
    )
    .bind(tenant_id)
    .bind(room_id.to_string())
    .bind(service_date)
    .bind(excluding_flow.to_string())
    .fetch_optional(&mut *conn)
    .await?;

    Ok(occupant)
}

/// Active flows of one service day, ordered by check-in
pub async fn list_active_flows(
    pool: &SqlitePool,
    tenant_id: &str,
    service_date: &str,
    location_id: Option<&str>,
) -> Result<Vec<PatientFlow>> {
    let sql = format!(
        r#"
        SELECT {FLOW_COLUMNS}
        FROM patient_flows f
        WHERE f.tenant_id = ? AND f.service_date = ? AND f.status <> 'completed'
          AND (? IS NULL OR f.location_id = ?)
        ORDER BY COALESCE(f.checked_in_at, f.created_at), f.created_at
        "#
    );

    let rows = sqlx::query(&sql)
        .bind(tenant_id)
        .bind(service_date)
        .bind(location_id)
        .bind(location_id)
        .fetch_all(pool)
        .await?;

    rows.iter().map(map_flow).collect()
}

/// Active flows holding a room at a location on one service day
pub async fn list_room_occupants(
    pool: &SqlitePool,
    tenant_id: &str,
    location_id: &str,
    service_date: &str,
) -> Result<Vec<PatientFlow>> {
    let sql = format!(
        r#"
        SELECT {FLOW_COLUMNS}
        FROM patient_flows f
        JOIN exam_rooms r ON r.id = f.room_id AND r.tenant_id = f.tenant_id
        WHERE f.tenant_id = ? AND r.location_id = ? AND f.service_date = ?
          AND f.status <> 'completed'
        ORDER BY f.status_changed_at
        "#
    );

    let rows = sqlx::query(&sql)
        .bind(tenant_id)
        .bind(location_id)
        .bind(service_date)
        .fetch_all(pool)
        .await?;

    rows.iter().map(map_flow).collect()
}

/// Provider queue row: the flow plus room name and appointment details
pub struct QueueRow {
    pub flow: PatientFlow,
    pub room_name: Option<String>,
    pub appointment_type: Option<String>,
    pub scheduled_start: Option<DateTime<Utc>>,
}

/// Today's flows for a provider in vitals_complete, ready_for_provider or with_provider
pub async fn list_provider_queue(
    pool: &SqlitePool,
    tenant_id: &str,
    provider_id: &str,
    service_date: &str,
) -> Result<Vec<QueueRow>> {
    let sql = format!(
        r#"
        SELECT {FLOW_COLUMNS},
               r.name AS room_name,
               a.appointment_type AS appointment_type,
               a.scheduled_start AS scheduled_start
        FROM patient_flows f
        LEFT JOIN exam_rooms r ON r.id = f.room_id AND r.tenant_id = f.tenant_id
        LEFT JOIN appointments a ON a.id = f.appointment_id AND a.tenant_id = f.tenant_id
        WHERE f.tenant_id = ? AND f.provider_id = ? AND f.service_date = ?
          AND f.status IN ('vitals_complete', 'ready_for_provider', 'with_provider')
        "#
    );

    let rows = sqlx::query(&sql)
        .bind(tenant_id)
        .bind(provider_id)
        .bind(service_date)
        .fetch_all(pool)
        .await?;

    rows.iter()
        .map(|row| {
            Ok(QueueRow {
                flow: map_flow(row)?,
                room_name: row.try_get("room_name")?,
                appointment_type: row.try_get("appointment_type")?,
                scheduled_start: opt_ts_column(row, "scheduled_start")?,
            })
        })
        .collect()
}

/// Raw per-location wait-time aggregates, averages in minutes
pub struct WaitTimeRow {
    pub location_id: String,
    pub checkin_to_rooming: Option<f64>,
    pub rooming_to_vitals: Option<f64>,
    pub vitals_to_provider: Option<f64>,
    pub with_provider: Option<f64>,
    pub total_visit: Option<f64>,
    pub waiting_count: i64,
    pub with_provider_count: i64,
    pub completed_count: i64,
    pub total_flows: i64,
}

/// Average only over flows that have both endpoints of an interval
pub async fn wait_time_aggregates(
    pool: &SqlitePool,
    tenant_id: &str,
    service_date: &str,
    location_id: Option<&str>,
) -> Result<Vec<WaitTimeRow>> {
    let rows = sqlx::query(
        r#"
        SELECT location_id,
               AVG(CASE WHEN checked_in_at IS NOT NULL AND rooming_at IS NOT NULL
                        THEN (rooming_at - checked_in_at) / 60000.0 END) AS checkin_to_rooming,
               AVG(CASE WHEN rooming_at IS NOT NULL AND vitals_complete_at IS NOT NULL
                        THEN (vitals_complete_at - rooming_at) / 60000.0 END) AS rooming_to_vitals,
               AVG(CASE WHEN ready_for_provider_at IS NOT NULL AND with_provider_at IS NOT NULL
                        THEN (with_provider_at - ready_for_provider_at) / 60000.0 END) AS vitals_to_provider,
               AVG(CASE WHEN with_provider_at IS NOT NULL AND completed_at IS NOT NULL
                        THEN (completed_at - with_provider_at) / 60000.0 END) AS with_provider,
               AVG(CASE WHEN checked_in_at IS NOT NULL AND completed_at IS NOT NULL
                        THEN (completed_at - checked_in_at) / 60000.0 END) AS total_visit,
               SUM(CASE WHEN status NOT IN ('with_provider', 'completed') THEN 1 ELSE 0 END) AS waiting_count,
               SUM(CASE WHEN status = 'with_provider' THEN 1 ELSE 0 END) AS with_provider_count,
               SUM(CASE WHEN status = 'completed' THEN 1 ELSE 0 END) AS completed_count,
               COUNT(*) AS total_flows
        FROM patient_flows
        WHERE tenant_id = ? AND service_date = ?
          AND (? IS NULL OR location_id = ?)
        GROUP BY location_id
        ORDER BY location_id
        "#,
    )
    .bind(tenant_id)
    .bind(service_date)
    .bind(location_id)
    .bind(location_id)
    .fetch_all(pool)
    .await?;

    rows.iter()
        .map(|row| {
            Ok(WaitTimeRow {
                location_id: row.try_get("location_id")?,
                checkin_to_rooming: row.try_get("checkin_to_rooming")?,
                rooming_to_vitals: row.try_get("rooming_to_vitals")?,
                vitals_to_provider: row.try_get("vitals_to_provider")?,
                with_provider: row.try_get("with_provider")?,
                total_visit: row.try_get("total_visit")?,
                waiting_count: row.try_get("waiting_count")?,
                with_provider_count: row.try_get("with_provider_count")?,
                completed_count: row.try_get("completed_count")?,
                total_flows: row.try_get("total_flows")?,
            })
        })
        .collect()
}
