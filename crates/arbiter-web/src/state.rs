//! Shared application state for the web server.

use std::sync::Arc;

use arbiter_llm::orchestrator::Orchestrator;

/// Shared state injected into every Axum handler.
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Orchestrator,
}

impl AppState {
    pub fn new(orchestrator: Orchestrator) -> Self {
        Self { orchestrator }
    }
}

pub type SharedState = Arc<AppState>;
