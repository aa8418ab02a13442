//! Application state for the API server

use crate::RetrievalOrchestrator;
use std::sync::Arc;

/// Shared application state accessible to all route handlers
///
/// Cloned for each request (cheap Arc clone).
#[derive(Clone)]
pub struct AppState {
    /// The retrieval orchestrator serving every request
    pub orchestrator: Arc<RetrievalOrchestrator>,
}

impl AppState {
    /// Create a new AppState
    pub fn new(orchestrator: Arc<RetrievalOrchestrator>) -> Self {
        Self { orchestrator }
    }
}
