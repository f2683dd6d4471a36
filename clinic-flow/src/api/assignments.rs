//! Room assignment endpoints

use crate::models::{AssignmentRequest, RoomAssignment};
use crate::{ApiResult, AppState};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get},
    Json, Router,
};
use serde::Deserialize;
use uuid::Uuid;

#[derive(Debug, Default, Deserialize)]
pub struct AssignmentQuery {
    pub room_id: Option<Uuid>,
}

/// GET /api/tenants/:tenant_id/room-assignments
pub async fn list_assignments(
    State(state): State<AppState>,
    Path(tenant_id): Path<String>,
    Query(query): Query<AssignmentQuery>,
) -> ApiResult<Json<Vec<RoomAssignment>>> {
    Ok(Json(
        state
            .rooms
            .list_room_assignments(&tenant_id, query.room_id)
            .await?,
    ))
}

/// PUT /api/tenants/:tenant_id/room-assignments
pub async fn set_assignment(
    State(state): State<AppState>,
    Path(tenant_id): Path<String>,
    Json(request): Json<AssignmentRequest>,
) -> ApiResult<Json<RoomAssignment>> {
    Ok(Json(
        state.rooms.set_room_assignment(&tenant_id, request).await?,
    ))
}

/// DELETE /api/tenants/:tenant_id/room-assignments/:assignment_id
pub async fn remove_assignment(
    State(state): State<AppState>,
    Path((tenant_id, assignment_id)): Path<(String, Uuid)>,
) -> ApiResult<StatusCode> {
    state
        .rooms
        .remove_room_assignment(&tenant_id, assignment_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Build room assignment routes
pub fn assignment_routes() -> Router<AppState> {
    Router::new()
        .route("/room-assignments", get(list_assignments).put(set_assignment))
        .route("/room-assignments/:assignment_id", delete(remove_assignment))
}
