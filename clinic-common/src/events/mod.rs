//! Event types for the clinic event system
//!
//! Provides the live flow event definitions and the EventBus that fans them
//! out to real-time subscribers.

mod flow_types;

pub use flow_types::{FlowStatus, Priority};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::broadcast;
use uuid::Uuid;

/// Live flow events
///
/// Every event is scoped to one tenant; SSE streams only forward events whose
/// `tenant_id` matches the subscriber. Delivery is best-effort with no
/// acknowledgment or replay.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum FlowEvent {
    /// A status transition was committed
    ///
    /// Triggers:
    /// - SSE: Refresh room board, provider queue and tracker views
    PatientFlowChanged {
        tenant_id: String,
        flow_id: Uuid,
        appointment_id: String,
        patient_id: String,
        /// Room held by the flow after the transition
        room_id: Option<Uuid>,
        /// Status written by the transition
        status: FlowStatus,
        /// Status before the transition (None when the flow was created)
        previous_status: Option<FlowStatus>,
        /// The flow's new statusChangedAt
        status_changed_at: DateTime<Utc>,
        /// Wall-clock time the event was produced
        timestamp: DateTime<Utc>,
    },

    /// Room, priority or staff assignment changed without a status change
    ///
    /// Triggers:
    /// - SSE: Refresh room board and provider queue
    FlowDetailsUpdated {
        tenant_id: String,
        flow_id: Uuid,
        appointment_id: String,
        room_id: Option<Uuid>,
        priority: Priority,
        timestamp: DateTime<Utc>,
    },
}

impl FlowEvent {
    /// Event name used as the SSE `event:` field
    pub fn event_type(&self) -> &'static str {
        match self {
            FlowEvent::PatientFlowChanged { .. } => "PatientFlowChanged",
            FlowEvent::FlowDetailsUpdated { .. } => "FlowDetailsUpdated",
        }
    }

    /// Tenant the event belongs to
    pub fn tenant_id(&self) -> &str {
        match self {
            FlowEvent::PatientFlowChanged { tenant_id, .. }
            | FlowEvent::FlowDetailsUpdated { tenant_id, .. } => tenant_id,
        }
    }
}

/// Live notification could not be delivered
///
/// Never surfaced to the caller of a transition; logged only.
#[derive(Debug, Error)]
pub enum NotifyError {
    /// Nobody is listening on the channel
    #[error("no subscribers for {0}")]
    NoSubscribers(&'static str),

    /// Channel is unavailable
    #[error("notification channel unavailable: {0}")]
    ChannelUnavailable(String),
}

/// Publisher handle for committed flow changes
///
/// Injected into the flow engine at construction so tests can substitute a
/// recording or failing publisher.
pub trait FlowNotifier: Send + Sync {
    fn notify(&self, event: FlowEvent) -> Result<(), NotifyError>;
}

/// Notifier that drops every event
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopNotifier;

impl FlowNotifier for NoopNotifier {
    fn notify(&self, _event: FlowEvent) -> Result<(), NotifyError> {
        Ok(())
    }
}

// ========================================
// EventBus Implementation
// ========================================

/// Central event distribution bus for flow events
///
/// The EventBus uses tokio::broadcast internally, providing:
/// - Non-blocking publish (slow subscribers don't block producers)
/// - Multiple concurrent subscribers
/// - Automatic cleanup when subscribers drop
/// - Lagged message detection for slow subscribers
///
/// Created once at startup and handed to the services that publish or
/// subscribe; there is no global instance.
///
/// # Examples
///
/// ```
/// use clinic_common::events::EventBus;
///
/// let event_bus = EventBus::new(1000);
/// let rx = event_bus.subscribe();
/// assert_eq!(event_bus.subscriber_count(), 1);
/// # drop(rx);
/// ```
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<FlowEvent>,
    capacity: usize,
}

impl EventBus {
    /// Creates a new EventBus with specified channel capacity
    ///
    /// # Arguments
    ///
    /// * `capacity` - Number of events to buffer before slow subscribers lag
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx, capacity }
    }

    /// Subscribe to all future events
    ///
    /// Events emitted before subscription are not received.
    pub fn subscribe(&self) -> broadcast::Receiver<FlowEvent> {
        self.tx.subscribe()
    }

    /// Emit an event to all subscribers
    ///
    /// Returns `Ok(subscriber_count)` if at least one subscriber exists.
    #[allow(clippy::result_large_err)]
    pub fn emit(&self, event: FlowEvent) -> Result<usize, broadcast::error::SendError<FlowEvent>> {
        self.tx.send(event)
    }

    /// Get the current number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Get the configured channel capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl FlowNotifier for EventBus {
    fn notify(&self, event: FlowEvent) -> Result<(), NotifyError> {
        let event_type = event.event_type();
        self.emit(event)
            .map(|_| ())
            .map_err(|_| NotifyError::NoSubscribers(event_type))
    }
}
