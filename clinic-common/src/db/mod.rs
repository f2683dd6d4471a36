//! Database initialization, schema and write transactions

pub mod init;
pub mod write;

pub use init::*;
pub use write::begin_write;
