#![allow(dead_code)]

use axum::{
    body::{to_bytes, Body},
    http::{HeaderMap, Method, Request, StatusCode},
};
use resource_forge::{ActionKind, Dispatcher, Scaffolder};
use serde_json::Value;
use std::path::Path;

/// Write artifacts for `entity` under `root`, panicking on any failure.
pub fn forge(root: &Path, entity: &str, kinds: &[ActionKind]) {
    let scaffolder = Scaffolder::new(root).unwrap();
    for outcome in scaffolder.forge_resource(entity, kinds) {
        outcome.result.unwrap();
    }
}

pub struct Reply {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

pub async fn send(dispatcher: &Dispatcher, method: Method, uri: &str, body: Option<Value>) -> Reply {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(v) => {
            builder = builder.header("content-type", "application/json");
            Body::from(v.to_string())
        }
        None => Body::empty(),
    };
    let response = dispatcher.dispatch(builder.body(body).unwrap()).await;
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    Reply { status, headers, body }
}
