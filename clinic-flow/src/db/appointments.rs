//! Appointment directory
//!
//! Appointments belong to the scheduling service. The flow engine only needs
//! to look one up when a flow is created and to mirror the coarse status back.

use crate::models::CoarseStatus;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use clinic_common::{time, Result};
use sqlx::{Row, SqliteConnection};
use tracing::{debug, warn};

/// What the flow engine needs to know about an appointment
#[derive(Debug, Clone, PartialEq)]
pub struct AppointmentRef {
    pub appointment_id: String,
    pub patient_id: String,
    pub provider_id: String,
    pub location_id: String,
    pub scheduled_start: DateTime<Utc>,
    pub appointment_type: Option<String>,
}

/// Appointment lookup and status mirror
///
/// Both calls receive the connection of the status change's open transaction so
/// the mirror write commits or rolls back with it.
#[async_trait]
pub trait AppointmentDirectory: Send + Sync {
    async fn lookup(
        &self,
        conn: &mut SqliteConnection,
        tenant_id: &str,
        appointment_id: &str,
    ) -> Result<Option<AppointmentRef>>;

    /// Idempotent
    async fn mirror_status(
        &self,
        conn: &mut SqliteConnection,
        tenant_id: &str,
        appointment_id: &str,
        status: CoarseStatus,
        at: DateTime<Utc>,
    ) -> Result<()>;
}

/// Directory backed by the shared `appointments` table
#[derive(Debug, Clone, Copy, Default)]
pub struct SqliteAppointmentDirectory;

#[async_trait]
impl AppointmentDirectory for SqliteAppointmentDirectory {
    async fn lookup(
        &self,
        conn: &mut SqliteConnection,
        tenant_id: &str,
        appointment_id: &str,
    ) -> Result<Option<AppointmentRef>> {
        let row = sqlx::query(
            r#"
            SELECT id, patient_id, provider_id, location_id, scheduled_start, appointment_type
            FROM appointments
            WHERE tenant_id = ? AND id = ?
            "#,
        )
        .bind(tenant_id)
        .bind(appointment_id)
        .fetch_optional(&mut *conn)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        Ok(Some(AppointmentRef {
            appointment_id: row.try_get("id")?,
            patient_id: row.try_get("patient_id")?,
            provider_id: row.try_get("provider_id")?,
            location_id: row.try_get("location_id")?,
            scheduled_start: time::from_millis(row.try_get("scheduled_start")?)?,
            appointment_type: row.try_get("appointment_type")?,
        }))
    }

    async fn mirror_status(
        &self,
        conn: &mut SqliteConnection,
        tenant_id: &str,
        appointment_id: &str,
        status: CoarseStatus,
        at: DateTime<Utc>,
    ) -> Result<()> {
        let result = sqlx::query(
            "UPDATE appointments SET status = ?, updated_at = ? WHERE tenant_id = ? AND id = ?",
        )
        .bind(status.as_str())
        .bind(time::to_millis(at))
        .bind(tenant_id)
        .bind(appointment_id)
        .execute(&mut *conn)
        .await?;

        if result.rows_affected() == 0 {
            warn!(
                tenant_id = %tenant_id,
                appointment_id = %appointment_id,
                "Appointment missing; coarse status not mirrored"
            );
        } else {
            debug!(appointment_id = %appointment_id, status = %status, "Mirrored appointment status");
        }

        Ok(())
    }
}
