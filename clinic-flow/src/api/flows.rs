//! Flow endpoints
//!
//! - POST  /flows/:appointment_id/status - change status (creates the flow on first use)
//! - PATCH /flows/:appointment_id - patch room, priority, staff or notes
//! - GET   /flows/:appointment_id - current flow
//! - GET   /flows/:appointment_id/history - chronological status history
//! - GET   /flows?location_id= - today's open flows

use super::LocationFilter;
use crate::models::{FlowHistoryEntry, FlowPatch, PatientFlow, SetStatusRequest};
use crate::{ApiResult, AppState};
use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Json, Router,
};

/// POST /api/tenants/:tenant_id/flows/:appointment_id/status
pub async fn set_status(
    State(state): State<AppState>,
    Path((tenant_id, appointment_id)): Path<(String, String)>,
    Json(request): Json<SetStatusRequest>,
) -> ApiResult<Json<PatientFlow>> {
    let flow = state
        .engine
        .set_status(&tenant_id, &appointment_id, request)
        .await?;
    Ok(Json(flow))
}

/// PATCH /api/tenants/:tenant_id/flows/:appointment_id
pub async fn update_flow(
    State(state): State<AppState>,
    Path((tenant_id, appointment_id)): Path<(String, String)>,
    Json(patch): Json<FlowPatch>,
) -> ApiResult<Json<PatientFlow>> {
    let flow = state
        .engine
        .update_flow(&tenant_id, &appointment_id, patch)
        .await?;
    Ok(Json(flow))
}

/// GET /api/tenants/:tenant_id/flows/:appointment_id
pub async fn get_flow(
    State(state): State<AppState>,
    Path((tenant_id, appointment_id)): Path<(String, String)>,
) -> ApiResult<Json<PatientFlow>> {
    Ok(Json(state.engine.get_flow(&tenant_id, &appointment_id).await?))
}

/// GET /api/tenants/:tenant_id/flows/:appointment_id/history
pub async fn get_flow_history(
    State(state): State<AppState>,
    Path((tenant_id, appointment_id)): Path<(String, String)>,
) -> ApiResult<Json<Vec<FlowHistoryEntry>>> {
    Ok(Json(
        state
            .views
            .get_flow_history(&tenant_id, &appointment_id)
            .await?,
    ))
}

/// GET /api/tenants/:tenant_id/flows
pub async fn list_active_flows(
    State(state): State<AppState>,
    Path(tenant_id): Path<String>,
    Query(filter): Query<LocationFilter>,
) -> ApiResult<Json<Vec<PatientFlow>>> {
    Ok(Json(
        state
            .views
            .list_active_flows(&tenant_id, filter.location_id.as_deref())
            .await?,
    ))
}

/// Build flow routes
pub fn flow_routes() -> Router<AppState> {
    Router::new()
        .route("/flows", get(list_active_flows))
        .route("/flows/:appointment_id", get(get_flow).patch(update_flow))
        .route("/flows/:appointment_id/status", post(set_status))
        .route("/flows/:appointment_id/history", get(get_flow_history))
}
