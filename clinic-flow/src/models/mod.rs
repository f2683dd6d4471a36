//! Data models for clinic-flow

pub mod assignment;
pub mod flow;
pub mod history;
pub mod room;
pub mod status;
pub mod views;

pub use assignment::{AssignmentRequest, RoomAssignment, TimeSlot};
pub use flow::{FlowPatch, PatientFlow, SetStatusRequest, StatusTimestamps};
pub use history::FlowHistoryEntry;
pub use room::{ExamRoom, NewRoom, RoomPatch, RoomType};
pub use status::{CoarseStatus, FlowStatus, Priority, TransitionPolicy};
pub use views::{AssignedProvider, BoardPatient, ProviderQueueEntry, RoomBoardEntry, WaitTimeStats};
