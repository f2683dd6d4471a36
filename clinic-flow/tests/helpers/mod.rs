//! Test Helper Utilities
//!
//! Shared utilities for testing clinic-flow

#![allow(dead_code)]

pub mod fixtures;
pub mod notifiers;

pub use fixtures::{
    appointment_status, at, clinic_morning, history_rows, seed_appointment, seed_room,
    seed_staff, total_duration, LOCATION, OTHER_LOCATION, PROVIDER, TENANT,
};
pub use notifiers::{FailingNotifier, RecordingNotifier};

use clinic_common::db::init_memory_database;
use clinic_common::events::FlowNotifier;
use clinic_common::time::{Clock, FixedClock, ServiceDay};
use clinic_flow::db::SqliteAppointmentDirectory;
use clinic_flow::models::TransitionPolicy;
use clinic_flow::services::{FlowEngine, FlowViews, RoomRegistry};
use sqlx::SqlitePool;
use std::sync::Arc;

/// Services wired around an in-memory database and a fixed clock
pub struct TestHarness {
    pub pool: SqlitePool,
    pub clock: Arc<FixedClock>,
    pub engine: FlowEngine,
    pub rooms: RoomRegistry,
    pub views: FlowViews,
}

impl TestHarness {
    /// Advance the clock by whole minutes
    pub fn advance_minutes(&self, minutes: i64) {
        self.clock.advance(chrono::Duration::minutes(minutes));
    }

    pub fn advance_seconds(&self, seconds: i64) {
        self.clock.advance(chrono::Duration::seconds(seconds));
    }
}

/// Permissive engine that records published events
pub async fn create_harness() -> (TestHarness, Arc<RecordingNotifier>) {
    let notifier = Arc::new(RecordingNotifier::default());
    let harness = create_harness_with(TransitionPolicy::Permissive, notifier.clone()).await;
    (harness, notifier)
}

pub async fn create_harness_with(
    policy: TransitionPolicy,
    notifier: Arc<dyn FlowNotifier>,
) -> TestHarness {
    let pool = init_memory_database().await.unwrap();
    let clock = Arc::new(FixedClock::new(clinic_morning()));
    let dyn_clock: Arc<dyn Clock> = clock.clone();
    let service_day = ServiceDay::utc();

    let engine = FlowEngine::new(
        pool.clone(),
        Arc::new(SqliteAppointmentDirectory),
        notifier,
        dyn_clock.clone(),
        service_day,
        policy,
    );
    let rooms = RoomRegistry::new(pool.clone(), dyn_clock.clone());
    let views = FlowViews::new(pool.clone(), dyn_clock, service_day);

    TestHarness {
        pool,
        clock,
        engine,
        rooms,
        views,
    }
}
