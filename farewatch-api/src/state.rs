use farewatch_search::SearchOrchestrator;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<SearchOrchestrator>,
}

impl AppState {
    pub fn new(orchestrator: SearchOrchestrator) -> Self {
        Self {
            orchestrator: Arc::new(orchestrator),
        }
    }
}
