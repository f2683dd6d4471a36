//! # Clinic Common Library
//!
//! Shared code for the clinic practice-management services including:
//! - Error type shared by data access and services
//! - Configuration loading (TOML + environment + defaults)
//! - Flow event types and the EventBus
//! - Database initialization
//! - Clock, timestamp and UUID utilities
//! - SSE helpers

pub mod config;
pub mod db;
pub mod error;
pub mod events;
pub mod sse;
pub mod time;
pub mod uuid_utils;

pub use error::{Error, Result};
