//! JSON body parsing with a size limit.

use crate::error::AppError;
use axum::{
    body::Body,
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};
use serde_json::Value;

/// Parsed JSON request body, attached to the request extensions.
#[derive(Clone, Debug)]
pub struct JsonBody(pub Value);

fn is_json(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .map(|mime| {
            let mime = mime.trim().to_ascii_lowercase();
            mime == "application/json" || mime.ends_with("+json")
        })
        .unwrap_or(false)
}

/// Buffer and parse JSON bodies up to `limit` bytes. Other content types pass through.
pub async fn parse_json_body(State(limit): State<usize>, req: Request, next: Next) -> Result<Response, AppError> {
    if !is_json(req.headers()) {
        return Ok(next.run(req).await);
    }
    let (mut parts, body) = req.into_parts();
    let bytes = axum::body::to_bytes(body, limit)
        .await
        .map_err(|_| AppError::PayloadTooLarge)?;
    if !bytes.iter().all(u8::is_ascii_whitespace) {
        let value: Value = serde_json::from_slice(&bytes)
            .map_err(|e| AppError::BadRequest(format!("malformed JSON body: {}", e)))?;
        parts.extensions.insert(JsonBody(value));
    }
    Ok(next.run(Request::from_parts(parts, Body::from(bytes))).await)
}
