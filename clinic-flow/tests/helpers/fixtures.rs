//! Seed data for flow tests

use chrono::{DateTime, TimeZone, Utc};
use clinic_common::time;
use clinic_flow::models::{FlowHistoryEntry, NewRoom, RoomType};
use clinic_flow::services::RoomRegistry;
use sqlx::SqlitePool;
use uuid::Uuid;

pub const TENANT: &str = "tenant-a";
pub const LOCATION: &str = "loc-main";
pub const OTHER_LOCATION: &str = "loc-north";
pub const PROVIDER: &str = "prov-1";

/// Monday 2026-10-19 08:00 UTC
pub fn clinic_morning() -> DateTime<Utc> {
    at(8, 0)
}

/// 2026-10-19 at hh:mm UTC
pub fn at(hour: u32, minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 10, 19, hour, minute, 0).unwrap()
}

/// Insert an appointment for `PROVIDER` at `LOCATION` unless overridden
pub async fn seed_appointment(
    pool: &SqlitePool,
    tenant_id: &str,
    appointment_id: &str,
    provider_id: &str,
    location_id: &str,
    scheduled_start: DateTime<Utc>,
) {
    sqlx::query(
        r#"
        INSERT INTO appointments (id, tenant_id, patient_id, provider_id, location_id,
                                  scheduled_start, appointment_type, status)
        VALUES (?, ?, ?, ?, ?, ?, 'follow_up', 'scheduled')
        "#,
    )
    .bind(appointment_id)
    .bind(tenant_id)
    .bind(format!("patient-{}", appointment_id))
    .bind(provider_id)
    .bind(location_id)
    .bind(time::to_millis(scheduled_start))
    .execute(pool)
    .await
    .unwrap();
}

pub async fn seed_staff(pool: &SqlitePool, tenant_id: &str, staff_id: &str, name: &str) {
    sqlx::query("INSERT INTO staff (id, tenant_id, display_name, role) VALUES (?, ?, ?, 'clinical')")
        .bind(staff_id)
        .bind(tenant_id)
        .bind(name)
        .execute(pool)
        .await
        .unwrap();
}

/// Create an active exam room and return its id
pub async fn seed_room(
    rooms: &RoomRegistry,
    tenant_id: &str,
    location_id: &str,
    room_number: &str,
    display_order: i64,
) -> Uuid {
    rooms
        .create_room(
            tenant_id,
            NewRoom {
                location_id: location_id.to_string(),
                name: format!("Exam {}", room_number),
                room_number: room_number.to_string(),
                room_type: RoomType::Exam,
                display_order,
                equipment: vec!["otoscope".to_string()],
                notes: None,
            },
        )
        .await
        .unwrap()
        .id
}

/// Coarse status currently mirrored on the appointment
pub async fn appointment_status(pool: &SqlitePool, tenant_id: &str, appointment_id: &str) -> String {
    sqlx::query_scalar("SELECT status FROM appointments WHERE tenant_id = ? AND id = ?")
        .bind(tenant_id)
        .bind(appointment_id)
        .fetch_one(pool)
        .await
        .unwrap()
}

/// Raw history row count for a tenant
pub async fn history_rows(pool: &SqlitePool, tenant_id: &str) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM flow_status_history WHERE tenant_id = ?")
        .bind(tenant_id)
        .fetch_one(pool)
        .await
        .unwrap()
}

/// Sum of recorded dwell times
pub fn total_duration(history: &[FlowHistoryEntry]) -> i64 {
    history.iter().filter_map(|h| h.duration_seconds).sum()
}
