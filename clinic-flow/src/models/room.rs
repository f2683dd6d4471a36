//! Exam room definitions

use chrono::{DateTime, Utc};
use clinic_common::{Error, Result};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

/// Kind of room
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RoomType {
    #[default]
    Exam,
    Procedure,
    Consult,
    Triage,
}

impl RoomType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RoomType::Exam => "exam",
            RoomType::Procedure => "procedure",
            RoomType::Consult => "consult",
            RoomType::Triage => "triage",
        }
    }
}

impl FromStr for RoomType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "exam" => Ok(RoomType::Exam),
            "procedure" => Ok(RoomType::Procedure),
            "consult" => Ok(RoomType::Consult),
            "triage" => Ok(RoomType::Triage),
            other => Err(Error::Validation(format!("Unknown room type: {}", other))),
        }
    }
}

/// A room at a clinical location
///
/// Rooms are retired with `is_active = false`, never deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExamRoom {
    pub id: Uuid,
    pub tenant_id: String,
    pub location_id: String,
    pub name: String,
    pub room_number: String,
    pub room_type: RoomType,
    pub is_active: bool,
    /// Ordering hint for lists and the room board
    pub display_order: i64,
    /// Equipment tags
    pub equipment: Vec<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Room creation request
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewRoom {
    pub location_id: String,
    pub name: String,
    pub room_number: String,
    #[serde(default)]
    pub room_type: RoomType,
    #[serde(default)]
    pub display_order: i64,
    #[serde(default)]
    pub equipment: Vec<String>,
    pub notes: Option<String>,
}

impl NewRoom {
    pub fn validate(&self) -> Result<()> {
        if self.location_id.trim().is_empty() {
            return Err(Error::Validation("location_id is required".to_string()));
        }
        if self.name.trim().is_empty() {
            return Err(Error::Validation("name is required".to_string()));
        }
        if self.room_number.trim().is_empty() {
            return Err(Error::Validation("room_number is required".to_string()));
        }
        Ok(())
    }
}

/// Partial room update; at least one field must be present
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RoomPatch {
    pub name: Option<String>,
    pub room_number: Option<String>,
    pub room_type: Option<RoomType>,
    pub is_active: Option<bool>,
    pub display_order: Option<i64>,
    pub equipment: Option<Vec<String>>,
    pub notes: Option<String>,
}

impl RoomPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.room_number.is_none()
            && self.room_type.is_none()
            && self.is_active.is_none()
            && self.display_order.is_none()
            && self.equipment.is_none()
            && self.notes.is_none()
    }

    pub fn validate(&self) -> Result<()> {
        if self.is_empty() {
            return Err(Error::Validation("No fields to update".to_string()));
        }
        if matches!(self.name.as_deref(), Some(name) if name.trim().is_empty()) {
            return Err(Error::Validation("name cannot be empty".to_string()));
        }
        if matches!(self.room_number.as_deref(), Some(number) if number.trim().is_empty()) {
            return Err(Error::Validation("room_number cannot be empty".to_string()));
        }
        Ok(())
    }
}
