//! Aggregation view endpoints

use super::LocationFilter;
use crate::models::{ProviderQueueEntry, RoomBoardEntry, WaitTimeStats};
use crate::{ApiResult, AppState};
use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};

/// GET /api/tenants/:tenant_id/locations/:location_id/room-board
pub async fn room_board(
    State(state): State<AppState>,
    Path((tenant_id, location_id)): Path<(String, String)>,
) -> ApiResult<Json<Vec<RoomBoardEntry>>> {
    Ok(Json(
        state.views.get_room_board(&tenant_id, &location_id).await?,
    ))
}

/// GET /api/tenants/:tenant_id/providers/:provider_id/queue
pub async fn provider_queue(
    State(state): State<AppState>,
    Path((tenant_id, provider_id)): Path<(String, String)>,
) -> ApiResult<Json<Vec<ProviderQueueEntry>>> {
    Ok(Json(
        state
            .views
            .get_provider_queue(&tenant_id, &provider_id)
            .await?,
    ))
}

/// GET /api/tenants/:tenant_id/wait-times
pub async fn wait_times(
    State(state): State<AppState>,
    Path(tenant_id): Path<String>,
    Query(filter): Query<LocationFilter>,
) -> ApiResult<Json<Vec<WaitTimeStats>>> {
    Ok(Json(
        state
            .views
            .get_wait_times(&tenant_id, filter.location_id.as_deref())
            .await?,
    ))
}

/// Build view routes
pub fn view_routes() -> Router<AppState> {
    Router::new()
        .route("/locations/:location_id/room-board", get(room_board))
        .route("/providers/:provider_id/queue", get(provider_queue))
        .route("/wait-times", get(wait_times))
}
