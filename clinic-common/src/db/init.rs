//! Database initialization
//!
//! Creates the database file on first run and idempotently creates every table
//! the flow service reads or writes. Timestamps are INTEGER unix milliseconds.

use crate::Result;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use tracing::info;

/// Current schema version recorded in `schema_version`
pub const SCHEMA_VERSION: i64 = 1;

/// Busy timeout applied to every pooled connection
const BUSY_TIMEOUT: Duration = Duration::from_millis(5000);

/// Initialize database connection and create tables if needed
pub async fn init_database(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    // Create parent directory if it doesn't exist
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    // Pragmas are per-connection, so they live on the connect options rather
    // than being executed once against the pool.
    let options = SqliteConnectOptions::from_str(&format!("sqlite://{}", db_path.display()))?
        .create_if_missing(true)
        .foreign_keys(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(BUSY_TIMEOUT);

    let pool = SqlitePoolOptions::new()
        .max_connections(20)
        .min_connections(1)
        .connect_with(options)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    create_schema(&pool).await?;

    Ok(pool)
}

/// Single-connection in-memory database with the full schema
///
/// The one connection is never recycled, so the database lives as long as the pool.
pub async fn init_memory_database() -> Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await?;

    create_schema(&pool).await?;

    Ok(pool)
}

/// Create every table and index (idempotent - safe to call multiple times)
pub async fn create_schema(pool: &SqlitePool) -> Result<()> {
    create_schema_version_table(pool).await?;

    // External collaborators the flow service reads (and mirrors status into)
    create_appointments_table(pool).await?;
    create_staff_table(pool).await?;

    // Patient flow tables
    create_exam_rooms_table(pool).await?;
    create_patient_flows_table(pool).await?;
    create_flow_status_history_table(pool).await?;
    create_room_assignments_table(pool).await?;

    sqlx::query("INSERT OR IGNORE INTO schema_version (version, applied_at) VALUES (?, ?)")
        .bind(SCHEMA_VERSION)
        .bind(crate::time::to_millis(crate::time::now()))
        .execute(pool)
        .await?;

    Ok(())
}

async fn create_schema_version_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at INTEGER NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Create the appointments table
///
/// Owned by the scheduling service; the flow service looks appointments up and
/// writes the coarse-grained `status` mirror.
pub async fn create_appointments_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS appointments (
            id TEXT NOT NULL,
            tenant_id TEXT NOT NULL,
            patient_id TEXT NOT NULL,
            provider_id TEXT NOT NULL,
            location_id TEXT NOT NULL,
            scheduled_start INTEGER NOT NULL,
            appointment_type TEXT,
            status TEXT NOT NULL DEFAULT 'scheduled',
            updated_at INTEGER,
            PRIMARY KEY (tenant_id, id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Create the staff table (display names for history actors)
pub async fn create_staff_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS staff (
            id TEXT NOT NULL,
            tenant_id TEXT NOT NULL,
            display_name TEXT NOT NULL,
            role TEXT,
            PRIMARY KEY (tenant_id, id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Create the exam_rooms table
///
/// Rooms are never deleted; `is_active = 0` retires them so historical flows
/// keep a valid room reference.
pub async fn create_exam_rooms_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS exam_rooms (
            id TEXT PRIMARY KEY,
            tenant_id TEXT NOT NULL,
            location_id TEXT NOT NULL,
            name TEXT NOT NULL,
            room_number TEXT NOT NULL,
            room_type TEXT NOT NULL DEFAULT 'exam'
                CHECK (room_type IN ('exam', 'procedure', 'consult', 'triage')),
            is_active INTEGER NOT NULL DEFAULT 1,
            display_order INTEGER NOT NULL DEFAULT 0,
            equipment TEXT NOT NULL DEFAULT '[]',
            notes TEXT,
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL,
            UNIQUE (tenant_id, location_id, room_number)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_exam_rooms_location ON exam_rooms(tenant_id, location_id)",
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Create the patient_flows table
///
/// One row per (tenant, appointment). `service_date` is the clinic-local date
/// the flow was created on; "today's" views filter on it.
pub async fn create_patient_flows_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS patient_flows (
            id TEXT PRIMARY KEY,
            tenant_id TEXT NOT NULL,
            appointment_id TEXT NOT NULL,
            patient_id TEXT NOT NULL,
            provider_id TEXT NOT NULL,
            location_id TEXT NOT NULL,
            status TEXT NOT NULL,
            status_changed_at INTEGER NOT NULL,
            checked_in_at INTEGER,
            rooming_at INTEGER,
            vitals_complete_at INTEGER,
            ready_for_provider_at INTEGER,
            with_provider_at INTEGER,
            checkout_at INTEGER,
            completed_at INTEGER,
            room_id TEXT REFERENCES exam_rooms(id),
            medical_assistant_id TEXT,
            priority TEXT NOT NULL DEFAULT 'normal'
                CHECK (priority IN ('normal', 'urgent', 'add_on')),
            notes TEXT,
            service_date TEXT NOT NULL,
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL,
            UNIQUE (tenant_id, appointment_id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    // One active occupant per room per day; racing writers hit this constraint
    sqlx::query(
        r#"
        CREATE UNIQUE INDEX IF NOT EXISTS idx_patient_flows_room_occupancy
        ON patient_flows(tenant_id, room_id, service_date)
        WHERE room_id IS NOT NULL AND status <> 'completed'
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_patient_flows_provider_day ON patient_flows(tenant_id, provider_id, service_date)",
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_patient_flows_location_day ON patient_flows(tenant_id, location_id, service_date)",
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Create the flow_status_history table
///
/// Append-only: triggers reject UPDATE and DELETE. `seq` totally orders the
/// entries of one flow.
pub async fn create_flow_status_history_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS flow_status_history (
            id TEXT PRIMARY KEY,
            tenant_id TEXT NOT NULL,
            flow_id TEXT NOT NULL REFERENCES patient_flows(id),
            seq INTEGER NOT NULL,
            from_status TEXT,
            to_status TEXT NOT NULL,
            changed_by TEXT,
            changed_at INTEGER NOT NULL,
            room_id TEXT,
            notes TEXT,
            duration_seconds INTEGER,
            UNIQUE (flow_id, seq)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TRIGGER IF NOT EXISTS trg_flow_status_history_no_update
        BEFORE UPDATE ON flow_status_history
        BEGIN
            SELECT RAISE(ABORT, 'flow_status_history is append-only');
        END
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TRIGGER IF NOT EXISTS trg_flow_status_history_no_delete
        BEFORE DELETE ON flow_status_history
        BEGIN
            SELECT RAISE(ABORT, 'flow_status_history is append-only');
        END
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Create the room_assignments table
///
/// A provider's usual claim on a room for a weekday (0 = Sunday) and time slot.
/// Annotates the room board only; never gates occupancy.
pub async fn create_room_assignments_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS room_assignments (
            id TEXT PRIMARY KEY,
            tenant_id TEXT NOT NULL,
            room_id TEXT NOT NULL REFERENCES exam_rooms(id),
            provider_id TEXT NOT NULL,
            day_of_week INTEGER NOT NULL CHECK (day_of_week BETWEEN 0 AND 6),
            time_slot TEXT NOT NULL DEFAULT 'all_day'
                CHECK (time_slot IN ('all_day', 'morning', 'afternoon')),
            is_active INTEGER NOT NULL DEFAULT 1,
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL,
            UNIQUE (tenant_id, room_id, provider_id, day_of_week, time_slot)
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}
