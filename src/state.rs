//! Shared application state. The gateway is the only thing requests share.

use crate::config::Settings;
use crate::gateway::ModelGateway;
use crate::registry::ResourceRegistry;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub gateway: Arc<dyn ModelGateway>,
    /// Fixed after bootstrap; never mutated while serving.
    pub registry: Arc<ResourceRegistry>,
    pub settings: Arc<Settings>,
}

impl AppState {
    pub fn new(settings: Settings, gateway: Arc<dyn ModelGateway>, registry: ResourceRegistry) -> Self {
        AppState {
            gateway,
            registry: Arc::new(registry),
            settings: Arc::new(settings),
        }
    }
}
