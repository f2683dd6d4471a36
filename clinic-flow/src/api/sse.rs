//! Server-Sent Events for live flow updates

use crate::AppState;
use axum::{
    extract::{Path, State},
    response::sse::{Event, Sse},
    routing::get,
    Router,
};
use futures::stream::Stream;
use std::convert::Infallible;

/// GET /api/tenants/:tenant_id/events
///
/// Streams this tenant's flow events; other tenants' events are never sent.
pub async fn event_stream(
    State(state): State<AppState>,
    Path(tenant_id): Path<String>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    clinic_common::sse::create_tenant_event_stream(&state.event_bus, tenant_id)
}

/// Build SSE routes
pub fn sse_routes() -> Router<AppState> {
    Router::new().route("/events", get(event_stream))
}
