//! Aggregation views
//!
//! Read-only projections recomputed from the flow, history and room tables on
//! every call. Nothing here is cached or persisted.

mod history;
mod provider_queue;
mod room_board;
mod wait_times;

use clinic_common::time::{Clock, ServiceDay};
use sqlx::SqlitePool;
use std::sync::Arc;

pub use provider_queue::queue_order;
pub use wait_times::round_minutes;

pub struct FlowViews {
    db: SqlitePool,
    clock: Arc<dyn Clock>,
    service_day: ServiceDay,
}

impl FlowViews {
    pub fn new(db: SqlitePool, clock: Arc<dyn Clock>, service_day: ServiceDay) -> Self {
        Self {
            db,
            clock,
            service_day,
        }
    }

    /// Service date key for "today"
    pub fn today(&self) -> String {
        self.service_day.date_key(self.clock.now())
    }
}
