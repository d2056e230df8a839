//! Pipeline assembly. Outermost first:
//!
//! error handling, panic catching, CORS preflight (when enabled), body size
//! limit, JSON body parsing, routing, then inside `/v1` only envelope initialization and
//! request validation in front of the action.

use crate::error::AppError;
use crate::middleware::{handle_errors, panic_response, parse_json_body, preflight};
use crate::routes::{common_routes, resource_routes};
use crate::state::AppState;
use axum::{http::Uri, middleware, Router};
use tower_http::{catch_panic::CatchPanicLayer, limit::RequestBodyLimitLayer};

pub const API_PREFIX: &str = "/v1";

async fn not_found(uri: Uri) -> AppError {
    AppError::NotFound(format!("no route for {}", uri.path()))
}

pub fn assemble(state: AppState) -> Router {
    let v1 = resource_routes(&state.registry, state.gateway.clone());

    let mut app = Router::new()
        .merge(common_routes(state.clone()))
        .nest(API_PREFIX, v1)
        .fallback(not_found)
        .layer(middleware::from_fn_with_state(state.settings.body_limit, parse_json_body))
        .layer(RequestBodyLimitLayer::new(state.settings.body_limit));

    if state.settings.cors {
        app = app.layer(middleware::from_fn(preflight));
    }

    app.layer(CatchPanicLayer::custom(panic_response))
        .layer(middleware::from_fn_with_state(state.settings.clone(), handle_errors))
}
