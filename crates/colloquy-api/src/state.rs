use std::sync::Arc;

use colloquy_persist::StateManager;
use colloquy_run::RunOrchestrator;

use crate::config::Config;

/// Shared application state passed to all handlers.
///
/// Every dependency is constructed once at startup and passed explicitly;
/// there are no lazily-initialized globals.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub manager: Arc<StateManager>,
    pub orchestrator: Arc<RunOrchestrator>,
}

impl AppState {
    pub fn new(
        config: Config,
        manager: Arc<StateManager>,
        orchestrator: Arc<RunOrchestrator>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            manager,
            orchestrator,
        }
    }
}
