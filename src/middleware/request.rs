//! Per-route stages of the versioned group: envelope initialization and request validation.
//!
//! Validation turns the raw request into a [`RequestContext`] the action can trust:
//! a key of the model's type, a JSON object body for writes that passed the
//! descriptor rules, and the query parameters.

use crate::actions::{ActionKind, RequestContext, KEY_PARAM};
use crate::config::ResourceModel;
use crate::error::AppError;
use crate::middleware::body::JsonBody;
use crate::response::ResponseBody;
use crate::validation::RequestValidator;
use axum::{
    extract::{Path, Query, Request, State},
    middleware::Next,
    response::Response,
};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// What the validation stage of one route knows about its target.
#[derive(Clone, Debug)]
pub struct RouteScope {
    pub resource: String,
    pub model: Arc<ResourceModel>,
    /// `None` for custom actions.
    pub kind: Option<ActionKind>,
}

pub async fn init_envelope(mut req: Request, next: Next) -> Response {
    req.extensions_mut().insert(ResponseBody::new());
    next.run(req).await
}

pub async fn validate(
    State(scope): State<RouteScope>,
    params: Option<Path<HashMap<String, String>>>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let Query(query) = Query::<HashMap<String, String>>::try_from_uri(req.uri())
        .map_err(|e| AppError::BadRequest(format!("malformed query string: {}", e)))?;
    let params = params.map(|Path(p)| p).unwrap_or_default();

    let mut ctx = RequestContext::new(&scope.resource, scope.model.clone(), req.method().clone());
    if let Some(raw) = params.get(KEY_PARAM) {
        ctx.key = Some(scope.model.parse_key(raw)?);
    }

    let body = req.extensions_mut().remove::<JsonBody>().map(|JsonBody(v)| v);
    match scope.kind {
        Some(ActionKind::Create) | Some(ActionKind::Update) => {
            let Some(Value::Object(map)) = body else {
                return Err(AppError::BadRequest("body must be a JSON object".into()));
            };
            RequestValidator::check_columns(&map, &scope.model)?;
            if scope.kind == Some(ActionKind::Create) {
                RequestValidator::validate(&map, &scope.model.validation)?;
            } else {
                RequestValidator::validate_partial(&map, &scope.model.validation)?;
            }
            ctx.body = Some(map);
        }
        _ => {
            if scope.kind == Some(ActionKind::Search) {
                RequestValidator::paging(&query)?;
            }
            if let Some(Value::Object(map)) = body {
                RequestValidator::validate_partial(&map, &scope.model.validation)?;
                ctx.body = Some(map);
            }
        }
    }

    ctx.params = params;
    ctx.query = query;
    req.extensions_mut().insert(ctx);
    Ok(next.run(req).await)
}
