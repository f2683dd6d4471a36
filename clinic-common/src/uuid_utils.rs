//! UUID utilities

use uuid::Uuid;

/// Generate a new UUIDv4 for flow, history, room and assignment rows
pub fn generate() -> Uuid {
    Uuid::new_v4()
}

/// Parse a UUID column value read from the database
pub fn parse_column(column: &str, s: &str) -> crate::Result<Uuid> {
    Uuid::parse_str(s).map_err(|e| crate::Error::Internal(format!("Invalid {} UUID '{}': {}", column, s, e)))
}
