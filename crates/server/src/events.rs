//! Event pump: the single consumer of the orchestrator event stream.
//!
//! Run start/finish announcements go through the pump as well, so a client
//! never sees `running: false` ahead of the run's terminal status line.

use std::sync::Arc;

use tokio::sync::{mpsc, RwLock};
use tokio::task::JoinHandle;
use tracing::debug;

use quickinstall_core::{EventStream, OrchestratorEvent};

use crate::api::WsBroadcaster;
use crate::state::StatusSnapshot;

/// Sending half for run start/finish announcements.
#[derive(Debug, Clone)]
pub struct RunStateSink {
    tx: mpsc::UnboundedSender<bool>,
}

impl RunStateSink {
    /// Queues a run-state change behind every event already emitted.
    pub fn announce(&self, running: bool) {
        // Closed only once the pump is gone
        let _ = self.tx.send(running);
    }
}

struct EventPump {
    events: EventStream,
    run_states: mpsc::UnboundedReceiver<bool>,
    status: Arc<RwLock<StatusSnapshot>>,
    broadcaster: WsBroadcaster,
}

impl EventPump {
    async fn run(mut self) {
        loop {
            tokio::select! {
                biased;
                Some(running) = self.run_states.recv() => {
                    // A finished run's events all precede its announcement
                    if !running {
                        while let Ok(event) = self.events.try_recv() {
                            self.forward(event).await;
                        }
                    }
                    self.broadcaster.run_state(running);
                }
                event = self.events.recv() => match event {
                    Some(event) => self.forward(event).await,
                    None => break,
                },
            }
        }
        debug!("Event stream closed");
    }

    async fn forward(&self, event: OrchestratorEvent) {
        if let OrchestratorEvent::Status { program: None, message } = &event {
            debug!("Run status: {}", message);
        }
        self.status.write().await.apply(&event);
        self.broadcaster.orchestrator_event(event);
    }
}

/// Drains `events` until every sender is gone, keeping `status` current and
/// forwarding each event to WebSocket clients.
///
/// Returns the sink for run-state announcements along with the task handle.
pub fn spawn_event_pump(
    events: EventStream,
    status: Arc<RwLock<StatusSnapshot>>,
    broadcaster: WsBroadcaster,
) -> (RunStateSink, JoinHandle<()>) {
    let (tx, run_states) = mpsc::unbounded_channel();
    let pump = EventPump {
        events,
        run_states,
        status,
        broadcaster,
    };
    (RunStateSink { tx }, tokio::spawn(pump.run()))
}
