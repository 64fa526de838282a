//! Event channel between pipelines and the presentation layer.

use tokio::sync::mpsc;

use super::types::OrchestratorEvent;

/// Receiving half, drained by a single consumer.
pub type EventStream = mpsc::UnboundedReceiver<OrchestratorEvent>;

/// Sending half, cloned into every pipeline task.
#[derive(Debug, Clone)]
pub struct EventSink {
    tx: mpsc::UnboundedSender<OrchestratorEvent>,
}

/// Creates a connected sink/stream pair.
pub fn event_channel() -> (EventSink, EventStream) {
    let (tx, rx) = mpsc::unbounded_channel();
    (EventSink { tx }, rx)
}

impl EventSink {
    /// Sends an event. A closed channel just means nobody is listening.
    pub fn emit(&self, event: OrchestratorEvent) {
        let _ = self.tx.send(event);
    }

    pub fn progress(&self, percent: u8) {
        self.emit(OrchestratorEvent::Progress { percent });
    }

    /// Run-level status message.
    pub fn status(&self, message: impl Into<String>) {
        self.emit(OrchestratorEvent::Status {
            program: None,
            message: message.into(),
        });
    }

    /// Status message about one program.
    pub fn program_status(&self, program: &str, message: impl Into<String>) {
        self.emit(OrchestratorEvent::Status {
            program: Some(program.to_string()),
            message: message.into(),
        });
    }
}
