//! HTTP API handlers for clinic-flow

pub mod assignments;
pub mod flows;
pub mod health;
pub mod rooms;
pub mod sse;
pub mod views;

pub use assignments::assignment_routes;
pub use flows::flow_routes;
pub use health::health_routes;
pub use rooms::room_routes;
pub use sse::sse_routes;
pub use views::view_routes;

use serde::Deserialize;

/// `?location_id=` filter shared by list endpoints
#[derive(Debug, Default, Deserialize)]
pub struct LocationFilter {
    pub location_id: Option<String>,
}
