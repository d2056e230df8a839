//! Permissive CORS preflight. Mounted only when `CORS=true`.

use axum::{
    extract::Request,
    http::{header, HeaderValue, Method, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};

const ALLOW_HEADERS: &str = "X-Requested-With, Content-Type, Accept, Origin, Authorization";
const ALLOW_METHODS: &str = "GET, POST, PATCH, DELETE, OPTIONS";

/// Answer `OPTIONS` on any path; everything else goes down the chain untouched.
pub async fn preflight(req: Request, next: Next) -> Response {
    if req.method() != Method::OPTIONS {
        return next.run(req).await;
    }
    (
        StatusCode::OK,
        [
            (header::ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*")),
            (header::ACCESS_CONTROL_ALLOW_CREDENTIALS, HeaderValue::from_static("true")),
            (header::ACCESS_CONTROL_ALLOW_HEADERS, HeaderValue::from_static(ALLOW_HEADERS)),
            (header::ACCESS_CONTROL_ALLOW_METHODS, HeaderValue::from_static(ALLOW_METHODS)),
            (header::CONTENT_TYPE, HeaderValue::from_static("application/json")),
        ],
    )
        .into_response()
}
