//! Versioned resource routes built from the registry.
//! Every binding gets its own method router carrying the envelope and validation stages,
//! so those stages never run for unmatched methods or routes outside the group.

use crate::actions::{Action, RequestContext};
use crate::error::AppError;
use crate::gateway::ModelGateway;
use crate::middleware::{init_envelope, validate, RouteScope};
use crate::registry::{ActionLabel, ResourceRegistry, RouteBinding};
use crate::response::ResponseBody;
use axum::{
    extract::Request,
    middleware,
    routing::{on, MethodFilter, MethodRouter},
    Router,
};
use std::sync::Arc;

async fn run_action(
    action: Arc<dyn Action>,
    gateway: Arc<dyn ModelGateway>,
    mut req: Request,
) -> Result<ResponseBody, AppError> {
    let ctx = req
        .extensions_mut()
        .remove::<RequestContext>()
        .ok_or_else(|| AppError::Internal("request context missing".into()))?;
    let envelope = req.extensions_mut().remove::<ResponseBody>().unwrap_or_default();
    action.handle(ctx, envelope, gateway.as_ref()).await
}

fn method_router(binding: &RouteBinding, filter: MethodFilter, gateway: Arc<dyn ModelGateway>) -> MethodRouter {
    let action = binding.action.clone();
    let scope = RouteScope {
        resource: binding.resource.clone(),
        model: binding.model.clone(),
        kind: match &binding.label {
            ActionLabel::Kind(kind) => Some(*kind),
            ActionLabel::Custom(_) => None,
        },
    };
    on(filter, move |req: Request| {
        let action = action.clone();
        let gateway = gateway.clone();
        async move { run_action(action, gateway, req).await }
    })
    .route_layer(middleware::from_fn_with_state(scope, validate))
    .route_layer(middleware::from_fn(init_envelope))
}

/// One route per binding, relative to the versioned prefix.
pub fn resource_routes(registry: &ResourceRegistry, gateway: Arc<dyn ModelGateway>) -> Router {
    let mut router = Router::new();
    for binding in registry.bindings() {
        let Ok(filter) = MethodFilter::try_from(binding.method.clone()) else {
            tracing::warn!(method = %binding.method, path = %binding.path, "unroutable method, skipping");
            continue;
        };
        router = router.route(&binding.path, method_router(binding, filter, gateway.clone()));
    }
    router
}
