//! clinic-flow library - Patient Flow & Room Orchestration
//!
//! Tracks each visit from check-in to completion, mediates room occupancy,
//! keeps an append-only status history and serves live aggregate views
//! (room board, provider queue, wait times) to real-time clients.

use axum::Router;
use chrono::{DateTime, Utc};
use clinic_common::events::EventBus;
use clinic_common::time::{Clock, ServiceDay, SystemClock};
use sqlx::SqlitePool;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod services;

pub use error::{ApiError, ApiResult};

use config::FlowConfig;
use db::SqliteAppointmentDirectory;
use models::TransitionPolicy;
use services::{FlowEngine, FlowViews, RoomRegistry};

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: SqlitePool,
    /// Status transitions and flow patches
    pub engine: Arc<FlowEngine>,
    /// Room CRUD and provider assignments
    pub rooms: Arc<RoomRegistry>,
    /// Read-only aggregation views
    pub views: Arc<FlowViews>,
    /// Live flow events, also the engine's notifier
    pub event_bus: EventBus,
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    /// Wire the services for a running server
    pub fn new(db: SqlitePool, config: &FlowConfig) -> Self {
        Self::with_clock(
            db,
            EventBus::new(config.event_capacity),
            Arc::new(SystemClock),
            config.service_day,
            config.transition_policy,
        )
    }

    /// Wire the services around an explicit clock and event bus
    pub fn with_clock(
        db: SqlitePool,
        event_bus: EventBus,
        clock: Arc<dyn Clock>,
        service_day: ServiceDay,
        policy: TransitionPolicy,
    ) -> Self {
        let engine = FlowEngine::new(
            db.clone(),
            Arc::new(SqliteAppointmentDirectory),
            Arc::new(event_bus.clone()),
            clock.clone(),
            service_day,
            policy,
        );
        let rooms = RoomRegistry::new(db.clone(), clock.clone());
        let views = FlowViews::new(db.clone(), clock.clone(), service_day);

        Self {
            db,
            engine: Arc::new(engine),
            rooms: Arc::new(rooms),
            views: Arc::new(views),
            event_bus,
            startup_time: clock.now(),
        }
    }
}

/// Build application router
///
/// Every flow, room and view route is scoped under `/api/tenants/:tenant_id`;
/// `/health` is not.
pub fn build_router(state: AppState) -> Router {
    let tenant_routes = Router::new()
        .merge(api::flow_routes())
        .merge(api::room_routes())
        .merge(api::assignment_routes())
        .merge(api::view_routes())
        .merge(api::sse_routes());

    Router::new()
        .nest("/api/tenants/:tenant_id", tenant_routes)
        .merge(api::health_routes())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
