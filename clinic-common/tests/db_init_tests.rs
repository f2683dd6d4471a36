//! Integration tests for database initialization
//!
//! Covers first-run creation, reopening an existing file, and the store-level
//! guarantees the flow service relies on (append-only history, one active
//! occupant per room per day).

use clinic_common::db::init::{init_database, init_memory_database};
use sqlx::SqlitePool;

async fn insert_room(pool: &SqlitePool, id: &str, number: &str) {
    sqlx::query(
        "INSERT INTO exam_rooms (id, tenant_id, location_id, name, room_number, created_at, updated_at)
         VALUES (?, 'tenant-a', 'loc-1', ?, ?, 0, 0)",
    )
    .bind(id)
    .bind(format!("Room {}", number))
    .bind(number)
    .execute(pool)
    .await
    .unwrap();
}

async fn insert_flow(pool: &SqlitePool, id: &str, appointment: &str, room: Option<&str>, status: &str) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO patient_flows (id, tenant_id, appointment_id, patient_id, provider_id, location_id,
                                    status, status_changed_at, room_id, service_date, created_at, updated_at)
         VALUES (?, 'tenant-a', ?, 'pat', 'prov', 'loc-1', ?, 0, ?, '2026-10-18', 0, 0)",
    )
    .bind(id)
    .bind(appointment)
    .bind(status)
    .bind(room)
    .execute(pool)
    .await
    .map(|_| ())
}

#[tokio::test]
async fn test_database_creation_when_missing() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("nested").join("clinic.db");

    let result = init_database(&db_path).await;

    assert!(result.is_ok(), "Database initialization failed: {:?}", result.err());
    assert!(db_path.exists(), "Database file was not created");
}

#[tokio::test]
async fn test_database_opens_existing() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("clinic.db");

    let pool1 = init_database(&db_path).await.unwrap();
    insert_room(&pool1, "room-1", "101").await;
    pool1.close().await;

    let pool2 = init_database(&db_path).await.expect("reopen should succeed");
    let rooms: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM exam_rooms")
        .fetch_one(&pool2)
        .await
        .unwrap();
    assert_eq!(rooms, 1, "existing data must survive re-initialization");
}

#[tokio::test]
async fn test_history_rows_cannot_be_rewritten() {
    let pool = init_memory_database().await.unwrap();
    insert_flow(&pool, "flow-1", "appt-1", None, "checked_in").await.unwrap();

    sqlx::query(
        "INSERT INTO flow_status_history (id, tenant_id, flow_id, seq, to_status, changed_at)
         VALUES ('h1', 'tenant-a', 'flow-1', 1, 'checked_in', 0)",
    )
    .execute(&pool)
    .await
    .unwrap();

    let update = sqlx::query("UPDATE flow_status_history SET to_status = 'completed'")
        .execute(&pool)
        .await;
    assert!(update.is_err(), "history must be append-only");

    let delete = sqlx::query("DELETE FROM flow_status_history").execute(&pool).await;
    assert!(delete.is_err(), "history must be append-only");
}

#[tokio::test]
async fn test_room_holds_one_active_flow_per_day() {
    let pool = init_memory_database().await.unwrap();
    insert_room(&pool, "room-1", "101").await;

    insert_flow(&pool, "flow-1", "appt-1", Some("room-1"), "rooming").await.unwrap();
    let second = insert_flow(&pool, "flow-2", "appt-2", Some("room-1"), "rooming").await;
    assert!(second.is_err(), "second active occupant must be rejected");

    // A completed flow no longer holds the room
    sqlx::query("UPDATE patient_flows SET status = 'completed' WHERE id = 'flow-1'")
        .execute(&pool)
        .await
        .unwrap();
    insert_flow(&pool, "flow-2", "appt-2", Some("room-1"), "rooming").await.unwrap();
}

#[tokio::test]
async fn test_one_flow_per_appointment() {
    let pool = init_memory_database().await.unwrap();
    insert_flow(&pool, "flow-1", "appt-1", None, "checked_in").await.unwrap();
    let duplicate = insert_flow(&pool, "flow-2", "appt-1", None, "checked_in").await;
    assert!(duplicate.is_err());
}
