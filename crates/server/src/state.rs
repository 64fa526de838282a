use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::RwLock;

use quickinstall_core::{Catalog, Config, Orchestrator, OrchestratorEvent, SelectionState};

use crate::api::WsBroadcaster;
use crate::events::RunStateSink;

/// Last progress and status seen on the event stream.
#[derive(Debug, Clone, Default, Serialize)]
pub struct StatusSnapshot {
    pub progress: Option<u8>,
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub program: Option<String>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl StatusSnapshot {
    pub fn apply(&mut self, event: &OrchestratorEvent) {
        match event {
            OrchestratorEvent::Progress { percent } => self.progress = Some(*percent),
            OrchestratorEvent::Status { program, message } => {
                self.status = Some(message.clone());
                self.program = program.clone();
            }
        }
        self.updated_at = Some(Utc::now());
    }
}

/// Shared application state
pub struct AppState {
    config: Config,
    catalog: Arc<Catalog>,
    selection: Arc<RwLock<SelectionState>>,
    orchestrator: Arc<Orchestrator>,
    status: Arc<RwLock<StatusSnapshot>>,
    run_states: RunStateSink,
    ws_broadcaster: WsBroadcaster,
}

impl AppState {
    pub fn new(
        config: Config,
        orchestrator: Arc<Orchestrator>,
        status: Arc<RwLock<StatusSnapshot>>,
        run_states: RunStateSink,
        ws_broadcaster: WsBroadcaster,
    ) -> Self {
        Self {
            config,
            catalog: Arc::clone(orchestrator.catalog()),
            selection: Arc::clone(orchestrator.selection()),
            orchestrator,
            status,
            run_states,
            ws_broadcaster,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn selection(&self) -> &RwLock<SelectionState> {
        &self.selection
    }

    pub fn orchestrator(&self) -> &Arc<Orchestrator> {
        &self.orchestrator
    }

    pub async fn status(&self) -> StatusSnapshot {
        self.status.read().await.clone()
    }

    /// Run start/finish announcements, ordered with the event stream.
    pub fn run_states(&self) -> &RunStateSink {
        &self.run_states
    }

    pub fn ws_broadcaster(&self) -> &WsBroadcaster {
        &self.ws_broadcaster
    }
}
