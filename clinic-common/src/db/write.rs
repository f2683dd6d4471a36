//! Write transactions
//!
//! Every unit of work that writes starts with `BEGIN IMMEDIATE`, so the write
//! lock is taken before the first read. A second writer then waits on the
//! connection's busy timeout instead of failing with `SQLITE_BUSY` when its
//! read snapshot goes stale.

use crate::Result;
use sqlx::{Sqlite, SqlitePool, Transaction};

/// Begin a transaction that holds the database write lock from its first statement
///
/// Dropping the returned transaction without committing rolls it back.
pub async fn begin_write(pool: &SqlitePool) -> Result<Transaction<'static, Sqlite>> {
    Ok(pool.begin_with("BEGIN IMMEDIATE").await?)
}
