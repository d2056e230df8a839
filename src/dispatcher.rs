//! Dispatcher: one request in, exactly one response out.

use crate::config::Settings;
use crate::error::ConfigError;
use crate::gateway::ModelGateway;
use crate::pipeline;
use crate::registry::ResourceRegistry;
use crate::state::AppState;
use axum::{body::Body, extract::Request, response::Response, Router};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower::ServiceExt;

#[derive(Clone)]
pub struct Dispatcher {
    router: Router,
    state: AppState,
}

impl Dispatcher {
    pub fn new(state: AppState) -> Self {
        Dispatcher {
            router: pipeline::assemble(state.clone()),
            state,
        }
    }

    /// Discover resources under the configured root and assemble the pipeline.
    /// Any discovery failure aborts here, before a single request is served.
    pub fn bootstrap(settings: Settings, gateway: Arc<dyn ModelGateway>) -> Result<Self, ConfigError> {
        let registry = ResourceRegistry::from_root(&settings.resource_root)?;
        if registry.is_empty() {
            tracing::warn!(root = %settings.resource_root.display(), "no resources discovered");
        }
        Ok(Self::with_registry(settings, gateway, registry))
    }

    pub fn with_registry(settings: Settings, gateway: Arc<dyn ModelGateway>, registry: ResourceRegistry) -> Self {
        Self::new(AppState::new(settings, gateway, registry))
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn router(&self) -> Router {
        self.router.clone()
    }

    pub async fn dispatch(&self, request: Request<Body>) -> Response {
        match self.router.clone().oneshot(request).await {
            Ok(response) => response,
            Err(never) => match never {},
        }
    }

    /// Serve until the listener fails.
    pub async fn serve(self, listener: TcpListener) -> std::io::Result<()> {
        if let Ok(addr) = listener.local_addr() {
            tracing::info!(
                addr = %addr,
                resources = self.state.registry.resources().len(),
                routes = self.state.registry.bindings().len(),
                "listening"
            );
        }
        axum::serve(listener, self.router).await
    }
}
