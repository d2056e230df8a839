//! Typed errors and HTTP mapping.

use crate::response::{ErrorDetail, ResponseBody};
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::path::PathBuf;
use thiserror::Error;

/// Boot-time failures. Any of these aborts process start.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("unreadable resource root {}: {source}", path.display())]
    UnreadableRoot {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid descriptor {}: {message}", path.display())]
    InvalidDescriptor { path: PathBuf, message: String },
    #[error("duplicate route {method} {path}: claimed by {first} and {second}")]
    DuplicateRoute {
        method: String,
        path: String,
        first: String,
        second: String,
    },
    #[error("route {path} conflicts with {existing}: parameter names differ")]
    RouteShape { path: String, existing: String },
    #[error("unsupported method {0} for a route")]
    UnsupportedMethod(String),
    #[error("settings: {0}")]
    Settings(String),
}

/// Faults raised by a model gateway. Never expected on the happy path.
#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("database: {0}")]
    Db(#[from] sqlx::Error),
    #[error("invalid key for {table}: {message}")]
    InvalidKey { table: String, message: String },
    #[error("{0}")]
    Backend(String),
}

/// Operator-facing failures of a scaffolding job. Each names the path involved.
#[derive(Error, Debug)]
pub enum ScaffoldError {
    #[error("invalid entity name '{0}'")]
    InvalidName(String),
    #[error("template: {0}")]
    Template(String),
    #[error("unable to create directory: {}: {source}", path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("already exists: {} (use --force to overwrite)", path.display())]
    AlreadyExists { path: PathBuf },
    #[error("unable to create: {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ScaffoldError {
    /// The filesystem path the job failed on, when there is one.
    pub fn path(&self) -> Option<&PathBuf> {
        match self {
            ScaffoldError::CreateDir { path, .. }
            | ScaffoldError::AlreadyExists { path }
            | ScaffoldError::Write { path, .. } => Some(path),
            ScaffoldError::InvalidName(_) | ScaffoldError::Template(_) => None,
        }
    }
}

/// Per-request failures. Client errors render their message directly; server
/// errors render a generic message and leave an [`ErrorReport`] for the
/// outermost error stage to log and optionally expand.
#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("validation: {0}")]
    Validation(String),
    #[error(transparent)]
    Gateway(#[from] GatewayError),
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("payload too large")]
    PayloadTooLarge,
    #[error("method {0} not allowed")]
    MethodNotAllowed(String),
    #[error("internal: {0}")]
    Internal(String),
}

pub const GENERIC_ERROR_MESSAGE: &str = "An error occurred.";

/// Attached to the extensions of a server-error response.
#[derive(Clone, Debug)]
pub struct ErrorReport {
    pub status: StatusCode,
    pub code: &'static str,
    pub detail: String,
}

impl ErrorReport {
    /// Render the final envelope. `display_details` is off in production.
    pub fn render(&self, display_details: bool) -> Response {
        let details = display_details.then(|| serde_json::Value::String(self.detail.clone()));
        ResponseBody::failure(
            self.status,
            ErrorDetail {
                code: self.code.to_string(),
                message: GENERIC_ERROR_MESSAGE.to_string(),
                details,
            },
        )
        .into_response()
    }
}

impl AppError {
    pub fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            AppError::Config(_) => (StatusCode::INTERNAL_SERVER_ERROR, "config_error"),
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            AppError::Validation(_) => (StatusCode::UNPROCESSABLE_ENTITY, "validation_error"),
            AppError::Gateway(_) => (StatusCode::INTERNAL_SERVER_ERROR, "gateway_error"),
            AppError::BadRequest(_) => (StatusCode::BAD_REQUEST, "bad_request"),
            AppError::PayloadTooLarge => (StatusCode::PAYLOAD_TOO_LARGE, "payload_too_large"),
            AppError::MethodNotAllowed(_) => (StatusCode::METHOD_NOT_ALLOWED, "method_not_allowed"),
            AppError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
        }
    }

    fn is_server_error(&self) -> bool {
        self.status_and_code().0.is_server_error()
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        if self.is_server_error() {
            let report = ErrorReport {
                status,
                code,
                detail: self.to_string(),
            };
            let mut response = report.render(false);
            response.extensions_mut().insert(report);
            return response;
        }
        ResponseBody::failure(
            status,
            ErrorDetail {
                code: code.to_string(),
                message: self.to_string(),
                details: None,
            },
        )
        .into_response()
    }
}
