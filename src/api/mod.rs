pub mod handlers;
pub mod routes;

pub use routes::*;

use crate::processing::IncidentService;
use crate::state::IncidentStore;
use std::sync::Arc;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<IncidentService>,
}

impl AppState {
    pub fn new(service: Arc<IncidentService>) -> Self {
        Self { service }
    }

    /// Build state around a store handle
    pub fn from_store(store: Arc<dyn IncidentStore>) -> Self {
        Self::new(Arc::new(IncidentService::new(store)))
    }
}
