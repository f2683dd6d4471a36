//! Server-Sent Events (SSE) utilities
//!
//! Shared SSE implementations for clinic services.

use crate::events::EventBus;
use axum::response::sse::{Event, KeepAlive, Sse};
use futures::stream::Stream;
use std::convert::Infallible;
use std::time::Duration;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info, warn};

/// Heartbeat period for all SSE streams
pub const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(15);

/// Create an SSE stream of one tenant's flow events
///
/// Sends a `ConnectionStatus` event first, then forwards every event on the
/// bus whose tenant matches, with a heartbeat comment every 15 seconds.
/// Subscribers that fall behind skip the missed events (no replay).
///
/// # Example
/// ```rust,ignore
/// pub async fn event_stream(
///     State(state): State<AppState>,
///     Path(tenant_id): Path<String>,
/// ) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
///     clinic_common::sse::create_tenant_event_stream(&state.event_bus, tenant_id)
/// }
/// ```
pub fn create_tenant_event_stream(
    event_bus: &EventBus,
    tenant_id: String,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    info!(tenant_id = %tenant_id, "New SSE client connected to flow events");

    let mut rx = event_bus.subscribe();

    let stream = async_stream::stream! {
        yield Ok(Event::default()
            .event("ConnectionStatus")
            .data("connected"));

        loop {
            tokio::select! {
                _ = tokio::time::sleep(HEARTBEAT_INTERVAL) => {
                    debug!("SSE: Sending heartbeat");
                    yield Ok(Event::default().comment("heartbeat"));
                }

                received = rx.recv() => {
                    match received {
                        Ok(event) => {
                            if event.tenant_id() != tenant_id {
                                continue;
                            }
                            let event_type = event.event_type();
                            match serde_json::to_string(&event) {
                                Ok(json) => {
                                    debug!("SSE: Broadcasting flow event: {}", event_type);
                                    yield Ok(Event::default().event(event_type).data(json));
                                }
                                Err(e) => {
                                    warn!("SSE: Failed to serialize event {}: {}", event_type, e);
                                }
                            }
                        }
                        Err(RecvError::Lagged(skipped)) => {
                            warn!(tenant_id = %tenant_id, skipped, "SSE subscriber lagged; events dropped");
                        }
                        Err(RecvError::Closed) => {
                            info!("SSE: Event bus closed, ending stream");
                            break;
                        }
                    }
                }
            }
        }
    };

    Sse::new(stream).keep_alive(KeepAlive::new().interval(HEARTBEAT_INTERVAL).text("heartbeat"))
}
