//! Flow status rules
//!
//! The fine-grained [`FlowStatus`] lives in `clinic-common` because it is part of
//! the live event contract. This module adds what only the flow service needs:
//! the coarse appointment mirror, first-reached columns and the transition policy.

use clinic_common::{Error, Result};
use serde::{Deserialize, Serialize};

pub use clinic_common::events::{FlowStatus, Priority};

/// Coarse-grained status mirrored onto the appointment record
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CoarseStatus {
    CheckedIn,
    InRoom,
    Completed,
}

impl CoarseStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CoarseStatus::CheckedIn => "checked_in",
            CoarseStatus::InRoom => "in_room",
            CoarseStatus::Completed => "completed",
        }
    }
}

impl std::fmt::Display for CoarseStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<FlowStatus> for CoarseStatus {
    fn from(status: FlowStatus) -> Self {
        match status {
            FlowStatus::CheckedIn => CoarseStatus::CheckedIn,
            FlowStatus::Rooming
            | FlowStatus::VitalsComplete
            | FlowStatus::ReadyForProvider
            | FlowStatus::WithProvider => CoarseStatus::InRoom,
            FlowStatus::Checkout | FlowStatus::Completed => CoarseStatus::Completed,
        }
    }
}

/// Column holding the first time a flow reached `status`
pub fn first_reached_column(status: FlowStatus) -> &'static str {
    match status {
        FlowStatus::CheckedIn => "checked_in_at",
        FlowStatus::Rooming => "rooming_at",
        FlowStatus::VitalsComplete => "vitals_complete_at",
        FlowStatus::ReadyForProvider => "ready_for_provider_at",
        FlowStatus::WithProvider => "with_provider_at",
        FlowStatus::Checkout => "checkout_at",
        FlowStatus::Completed => "completed_at",
    }
}

/// Which status changes the engine accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransitionPolicy {
    /// Any status may follow any status (walk-backs allowed)
    #[default]
    Permissive,
    /// Explicit transition table, see [`TransitionPolicy::allows`]
    Ordered,
}

impl TransitionPolicy {
    pub fn from_enforced(enforce: bool) -> Self {
        if enforce {
            TransitionPolicy::Ordered
        } else {
            TransitionPolicy::Permissive
        }
    }

    /// Ordered table:
    /// - a new flow may start at any status
    /// - repeating the current status is always allowed
    /// - nothing leaves `completed`
    /// - otherwise only forward moves, plus the walk-back `checkout -> with_provider`
    pub fn allows(&self, from: Option<FlowStatus>, to: FlowStatus) -> bool {
        let Some(from) = from else {
            return true;
        };
        match self {
            TransitionPolicy::Permissive => true,
            TransitionPolicy::Ordered => {
                if from == to {
                    true
                } else if from.is_terminal() {
                    false
                } else {
                    to > from || (from == FlowStatus::Checkout && to == FlowStatus::WithProvider)
                }
            }
        }
    }

    pub fn check(&self, from: Option<FlowStatus>, to: FlowStatus) -> Result<()> {
        if self.allows(from, to) {
            Ok(())
        } else {
            Err(Error::Validation(format!(
                "Transition {} -> {} is not allowed",
                from.map(|s| s.as_str()).unwrap_or("none"),
                to
            )))
        }
    }
}

/// Parse a status string from a request body or a database column
pub fn parse_status(value: &str) -> Result<FlowStatus> {
    value.parse().map_err(Error::Validation)
}

/// Parse a priority string from a request body or a database column
pub fn parse_priority(value: &str) -> Result<Priority> {
    value.parse().map_err(Error::Validation)
}
