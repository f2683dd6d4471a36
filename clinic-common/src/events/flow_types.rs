//! Patient flow type definitions
//!
//! Supporting types for visit status and priority, shared by the flow service
//! and every consumer of its live events.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Operational status of a visit, in intended clinical order
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum FlowStatus {
    CheckedIn,
    Rooming,
    VitalsComplete,
    ReadyForProvider,
    WithProvider,
    Checkout,
    Completed,
}

impl FlowStatus {
    /// All statuses in clinical order
    pub const ALL: [FlowStatus; 7] = [
        FlowStatus::CheckedIn,
        FlowStatus::Rooming,
        FlowStatus::VitalsComplete,
        FlowStatus::ReadyForProvider,
        FlowStatus::WithProvider,
        FlowStatus::Checkout,
        FlowStatus::Completed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FlowStatus::CheckedIn => "checked_in",
            FlowStatus::Rooming => "rooming",
            FlowStatus::VitalsComplete => "vitals_complete",
            FlowStatus::ReadyForProvider => "ready_for_provider",
            FlowStatus::WithProvider => "with_provider",
            FlowStatus::Checkout => "checkout",
            FlowStatus::Completed => "completed",
        }
    }

    /// Position in clinical order (0 = checked_in)
    pub fn ordinal(&self) -> usize {
        *self as usize
    }

    /// `completed` closes the flow
    pub fn is_terminal(&self) -> bool {
        matches!(self, FlowStatus::Completed)
    }

    /// Statuses that put a flow on its provider's queue
    pub fn is_provider_queue(&self) -> bool {
        matches!(
            self,
            FlowStatus::VitalsComplete | FlowStatus::ReadyForProvider | FlowStatus::WithProvider
        )
    }

    /// Live "waiting" count: any non-terminal status other than with_provider
    pub fn is_waiting(&self) -> bool {
        !self.is_terminal() && *self != FlowStatus::WithProvider
    }
}

impl std::fmt::Display for FlowStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FlowStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FlowStatus::ALL
            .iter()
            .copied()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| format!("Unknown flow status: {}", s))
    }
}

/// Visit priority; sorts urgent first, then add-on, then normal
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    #[default]
    Normal,
    Urgent,
    #[serde(alias = "add-on")]
    AddOn,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Normal => "normal",
            Priority::Urgent => "urgent",
            Priority::AddOn => "add_on",
        }
    }

    /// Queue rank: lower is seen first
    pub fn rank(&self) -> u8 {
        match self {
            Priority::Urgent => 0,
            Priority::AddOn => 1,
            Priority::Normal => 2,
        }
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "normal" => Ok(Priority::Normal),
            "urgent" => Ok(Priority::Urgent),
            "add_on" | "add-on" => Ok(Priority::AddOn),
            other => Err(format!("Unknown priority: {}", other)),
        }
    }
}
