//! Provider room assignments

use chrono::{DateTime, Utc};
use clinic_common::{Error, Result};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

/// Part of the day an assignment covers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TimeSlot {
    #[default]
    AllDay,
    Morning,
    Afternoon,
}

impl TimeSlot {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimeSlot::AllDay => "all_day",
            TimeSlot::Morning => "morning",
            TimeSlot::Afternoon => "afternoon",
        }
    }

    /// Slot for the current half of the day
    pub fn current(is_morning: bool) -> Self {
        if is_morning {
            TimeSlot::Morning
        } else {
            TimeSlot::Afternoon
        }
    }
}

impl FromStr for TimeSlot {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "all_day" => Ok(TimeSlot::AllDay),
            "morning" => Ok(TimeSlot::Morning),
            "afternoon" => Ok(TimeSlot::Afternoon),
            other => Err(Error::Validation(format!("Unknown time slot: {}", other))),
        }
    }
}

/// A provider's usual claim on a room
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomAssignment {
    pub id: Uuid,
    pub tenant_id: String,
    pub room_id: Uuid,
    pub provider_id: String,
    /// 0 = Sunday .. 6 = Saturday
    pub day_of_week: u8,
    pub time_slot: TimeSlot,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Upsert request for a (room, provider, weekday, slot) tuple
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssignmentRequest {
    pub room_id: Uuid,
    pub provider_id: String,
    pub day_of_week: u8,
    #[serde(default)]
    pub time_slot: TimeSlot,
}

impl AssignmentRequest {
    pub fn validate(&self) -> Result<()> {
        if self.provider_id.trim().is_empty() {
            return Err(Error::Validation("provider_id is required".to_string()));
        }
        if self.day_of_week > 6 {
            return Err(Error::Validation(format!(
                "day_of_week must be 0-6, got {}",
                self.day_of_week
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_validation() {
        let mut req = AssignmentRequest {
            room_id: Uuid::new_v4(),
            provider_id: "prov-1".to_string(),
            day_of_week: 7,
            time_slot: TimeSlot::AllDay,
        };
        assert!(matches!(req.validate(), Err(Error::Validation(_))));
        req.day_of_week = 0;
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_time_slot_defaults_to_all_day() {
        let req: AssignmentRequest = serde_json::from_str(&format!(
            r#"{{"room_id":"{}","provider_id":"p","day_of_week":2}}"#,
            Uuid::new_v4()
        ))
        .unwrap();
        assert_eq!(req.time_slot, TimeSlot::AllDay);
        assert_eq!(TimeSlot::current(false), TimeSlot::Afternoon);
    }
}
