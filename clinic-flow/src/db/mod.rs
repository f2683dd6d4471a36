//! Database access for clinic-flow
//!
//! Single-statement reads take any sqlx executor so they run against the pool
//! or inside an open transaction. Writes that belong to a status change take
//! the transaction's connection.

pub mod appointments;
pub mod assignments;
pub mod flows;
pub mod history;
pub mod rooms;

use chrono::{DateTime, Utc};
use clinic_common::{time, uuid_utils, Result};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use uuid::Uuid;

pub use appointments::{AppointmentDirectory, AppointmentRef, SqliteAppointmentDirectory};

pub(crate) fn uuid_column(row: &SqliteRow, column: &str) -> Result<Uuid> {
    let value: String = row.try_get(column)?;
    uuid_utils::parse_column(column, &value)
}

pub(crate) fn opt_uuid_column(row: &SqliteRow, column: &str) -> Result<Option<Uuid>> {
    let value: Option<String> = row.try_get(column)?;
    value
        .map(|v| uuid_utils::parse_column(column, &v))
        .transpose()
}

pub(crate) fn ts_column(row: &SqliteRow, column: &str) -> Result<DateTime<Utc>> {
    let millis: i64 = row.try_get(column)?;
    time::from_millis(millis)
}

pub(crate) fn opt_ts_column(row: &SqliteRow, column: &str) -> Result<Option<DateTime<Utc>>> {
    let millis: Option<i64> = row.try_get(column)?;
    time::from_millis_opt(millis)
}
