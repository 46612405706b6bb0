//! Event sink that records everything it sees.

use std::sync::{Arc, Mutex};

use skein_core::{EventSink, RunEvent};

/// An [`EventSink`] that stores every event for later assertions
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    events: Arc<Mutex<Vec<RunEvent>>>,
}

impl RecordingSink {
    /// Create an empty recorder
    pub fn new() -> Self {
        Self::default()
    }

    /// Every event received so far, in emission order
    pub fn events(&self) -> Vec<RunEvent> {
        self.events.lock().expect("recorder lock poisoned").clone()
    }

    /// Count events matching a predicate
    pub fn count_matching(&self, predicate: impl Fn(&RunEvent) -> bool) -> usize {
        self.events
            .lock()
            .expect("recorder lock poisoned")
            .iter()
            .filter(|event| predicate(event))
            .count()
    }
}

impl EventSink for RecordingSink {
    fn on_event(&self, event: &RunEvent) {
        self.events
            .lock()
            .expect("recorder lock poisoned")
            .push(event.clone());
    }
}
