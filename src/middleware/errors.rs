//! Outermost stage: every failure leaves here as a JSON envelope.

use crate::config::Settings;
use crate::error::{AppError, ErrorReport};
use axum::{
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::any::Any;
use std::sync::Arc;

/// Log server errors raised anywhere below and, when enabled, re-render them with detail.
pub async fn handle_errors(State(settings): State<Arc<Settings>>, req: Request, next: Next) -> Response {
    let method = req.method().clone();
    let uri = req.uri().clone();
    let response = next.run(req).await;

    // The body-limit layer and the router answer with bare 413 and 405 responses.
    if !is_json(&response) {
        match response.status() {
            StatusCode::PAYLOAD_TOO_LARGE => return AppError::PayloadTooLarge.into_response(),
            StatusCode::METHOD_NOT_ALLOWED => {
                let allow = response.headers().get(header::ALLOW).cloned();
                let mut rendered = AppError::MethodNotAllowed(method.to_string()).into_response();
                if let Some(allow) = allow {
                    rendered.headers_mut().insert(header::ALLOW, allow);
                }
                return rendered;
            }
            _ => {}
        }
    }

    let Some(report) = response.extensions().get::<ErrorReport>().cloned() else {
        return response;
    };
    tracing::error!(
        method = %method,
        uri = %uri,
        status = report.status.as_u16(),
        code = report.code,
        detail = %report.detail,
        "request failed"
    );
    if settings.display_error_details {
        report.render(true)
    } else {
        response
    }
}

fn is_json(response: &Response) -> bool {
    response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("application/json"))
}

/// Turns a panic inside the chain into an internal error carrying the panic message.
pub fn panic_response(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        (*s).to_string()
    } else {
        "unknown panic payload".to_string()
    };
    AppError::Internal(format!("panic: {}", detail)).into_response()
}
