//! Business services

pub mod flow_engine;
pub mod room_registry;
pub mod views;

pub use flow_engine::FlowEngine;
pub use room_registry::RoomRegistry;
pub use views::FlowViews;
