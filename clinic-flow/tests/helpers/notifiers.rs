//! Notifier doubles

use clinic_common::events::{FlowEvent, FlowNotifier, NotifyError};
use std::sync::Mutex;

/// Keeps every published event
#[derive(Default)]
pub struct RecordingNotifier {
    events: Mutex<Vec<FlowEvent>>,
}

impl RecordingNotifier {
    pub fn events(&self) -> Vec<FlowEvent> {
        self.events.lock().unwrap().clone()
    }
}

impl FlowNotifier for RecordingNotifier {
    fn notify(&self, event: FlowEvent) -> Result<(), NotifyError> {
        self.events.lock().unwrap().push(event);
        Ok(())
    }
}

/// Channel that is always down
#[derive(Default)]
pub struct FailingNotifier;

impl FlowNotifier for FailingNotifier {
    fn notify(&self, _event: FlowEvent) -> Result<(), NotifyError> {
        Err(NotifyError::ChannelUnavailable("test channel down".to_string()))
    }
}
