//! Application state for Axum handlers.

use cairn_core::HealthCheck;
use cairn_service::UserService;
use shaku::HasComponent;
use std::sync::Arc;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub user_service: Arc<dyn UserService>,
    /// Probes consulted by `/ready`.
    pub health_checks: Vec<Arc<dyn HealthCheck>>,
}

impl AppState {
    /// Creates a new application state.
    pub fn new(user_service: Arc<dyn UserService>) -> Self {
        Self {
            user_service,
            health_checks: Vec::new(),
        }
    }

    /// Resolves the user service from a Shaku module.
    pub fn from_module<M: HasComponent<dyn UserService>>(module: &M) -> Self {
        Self::new(module.resolve())
    }

    /// Adds a readiness probe.
    #[must_use]
    pub fn with_health_check(mut self, check: Arc<dyn HealthCheck>) -> Self {
        self.health_checks.push(check);
        self
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field(
                "health_checks",
                &self.health_checks.iter().map(|c| c.name()).collect::<Vec<_>>(),
            )
            .finish_non_exhaustive()
    }
}
