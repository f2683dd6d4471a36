//! Room registry endpoints

use crate::models::{ExamRoom, NewRoom, RoomPatch};
use crate::{ApiResult, AppState};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use uuid::Uuid;

#[derive(Debug, Default, Deserialize)]
pub struct RoomListQuery {
    pub location_id: Option<String>,
    /// Include deactivated rooms (default false)
    #[serde(default)]
    pub include_inactive: bool,
}

/// GET /api/tenants/:tenant_id/rooms
pub async fn list_rooms(
    State(state): State<AppState>,
    Path(tenant_id): Path<String>,
    Query(query): Query<RoomListQuery>,
) -> ApiResult<Json<Vec<ExamRoom>>> {
    let rooms = state
        .rooms
        .list_rooms(&tenant_id, query.location_id.as_deref(), !query.include_inactive)
        .await?;
    Ok(Json(rooms))
}

/// POST /api/tenants/:tenant_id/rooms
pub async fn create_room(
    State(state): State<AppState>,
    Path(tenant_id): Path<String>,
    Json(new_room): Json<NewRoom>,
) -> ApiResult<(StatusCode, Json<ExamRoom>)> {
    let room = state.rooms.create_room(&tenant_id, new_room).await?;
    Ok((StatusCode::CREATED, Json(room)))
}

/// GET /api/tenants/:tenant_id/rooms/:room_id
pub async fn get_room(
    State(state): State<AppState>,
    Path((tenant_id, room_id)): Path<(String, Uuid)>,
) -> ApiResult<Json<ExamRoom>> {
    Ok(Json(state.rooms.get_room(&tenant_id, room_id).await?))
}

/// PATCH /api/tenants/:tenant_id/rooms/:room_id
pub async fn update_room(
    State(state): State<AppState>,
    Path((tenant_id, room_id)): Path<(String, Uuid)>,
    Json(patch): Json<RoomPatch>,
) -> ApiResult<Json<ExamRoom>> {
    Ok(Json(state.rooms.update_room(&tenant_id, room_id, patch).await?))
}

/// Build room routes
pub fn room_routes() -> Router<AppState> {
    Router::new()
        .route("/rooms", get(list_rooms).post(create_room))
        .route("/rooms/:room_id", get(get_room).patch(update_room))
}
