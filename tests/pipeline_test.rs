//! End-to-end requests through the assembled pipeline, backed by the in-memory gateway.

#![allow(clippy::unwrap_used)]

mod common;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use common::{forge, send};
use resource_forge::{
    Action, ActionKind, AppError, Dispatcher, GatewayError, MemoryGateway, ModelGateway, RequestContext,
    ResourceModel, ResourceRegistry, ResponseBody, SearchQuery, Settings,
};
use serde_json::{json, Map, Value};
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;

struct Harness {
    _root: TempDir,
    gateway: Arc<MemoryGateway>,
    dispatcher: Dispatcher,
}

fn settings_for(root: &TempDir) -> Settings {
    Settings {
        resource_root: root.path().to_path_buf(),
        ..Settings::default()
    }
}

fn harness_with(configure: impl FnOnce(&mut Settings)) -> Harness {
    let root = TempDir::new().unwrap();
    forge(root.path(), "widget", &ActionKind::ALL);
    let mut settings = settings_for(&root);
    configure(&mut settings);
    let gateway = Arc::new(MemoryGateway::new());
    let dispatcher = Dispatcher::bootstrap(settings, gateway.clone()).unwrap();
    Harness {
        _root: root,
        gateway,
        dispatcher,
    }
}

fn harness() -> Harness {
    harness_with(|_| {})
}

fn widget() -> ResourceModel {
    ResourceModel::for_resource("Widget")
}

#[tokio::test]
async fn delete_missing_record_is_404_with_null_data() {
    let h = harness();
    let reply = send(&h.dispatcher, Method::DELETE, "/v1/widget/42", None).await;
    assert_eq!(reply.status, StatusCode::NOT_FOUND);
    assert_eq!(reply.body["data"], Value::Null);
    assert_eq!(reply.body["status"], 404);
}

#[tokio::test]
async fn delete_existing_record_is_200_and_record_is_gone() {
    let h = harness();
    h.gateway
        .insert(&widget(), json!({ "id": 42, "name": "sprocket" }).as_object().unwrap())
        .await
        .unwrap();

    let reply = send(&h.dispatcher, Method::DELETE, "/v1/widget/42", None).await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.body["data"], Value::Null);
    assert_eq!(reply.body["status"], 200);
    assert!(h.gateway.find_by_key(&widget(), &json!(42)).await.unwrap().is_none());

    let again = send(&h.dispatcher, Method::DELETE, "/v1/widget/42", None).await;
    assert_eq!(again.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn create_read_update_search() {
    let h = harness();

    let created = send(&h.dispatcher, Method::POST, "/v1/widget", Some(json!({ "name": "bolt", "color": "red" }))).await;
    assert_eq!(created.status, StatusCode::CREATED);
    let id = created.body["data"]["id"].as_i64().unwrap();

    let read = send(&h.dispatcher, Method::GET, &format!("/v1/widget/{id}"), None).await;
    assert_eq!(read.status, StatusCode::OK);
    assert_eq!(read.body["data"]["name"], "bolt");

    let updated = send(&h.dispatcher, Method::PATCH, &format!("/v1/widget/{id}"), Some(json!({ "color": "blue" }))).await;
    assert_eq!(updated.status, StatusCode::OK);
    assert_eq!(updated.body["data"]["color"], "blue");
    assert_eq!(updated.body["data"]["name"], "bolt");

    send(&h.dispatcher, Method::POST, "/v1/widget", Some(json!({ "name": "nut", "color": "red" }))).await;
    let found = send(&h.dispatcher, Method::GET, "/v1/widget?color=red", None).await;
    assert_eq!(found.status, StatusCode::OK);
    assert_eq!(found.body["meta"]["count"], 1);
    assert_eq!(found.body["data"][0]["name"], "nut");

    let paged = send(&h.dispatcher, Method::GET, "/v1/widget?limit=1", None).await;
    assert_eq!(paged.body["meta"]["count"], 1);
}

#[tokio::test]
async fn read_of_missing_record_is_404() {
    let h = harness();
    let reply = send(&h.dispatcher, Method::GET, "/v1/widget/7", None).await;
    assert_eq!(reply.status, StatusCode::NOT_FOUND);
    assert_eq!(reply.body["data"], Value::Null);
}

#[tokio::test]
async fn malformed_key_is_rejected_before_the_action() {
    let h = harness();
    let reply = send(&h.dispatcher, Method::DELETE, "/v1/widget/abc", None).await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert_eq!(reply.body["error"]["code"], "bad_request");
    assert_eq!(reply.body["data"], Value::Null);
}

#[tokio::test]
async fn write_without_object_body_is_rejected() {
    let h = harness();
    let reply = send(&h.dispatcher, Method::POST, "/v1/widget", None).await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);

    let reply = send(&h.dispatcher, Method::POST, "/v1/widget", Some(json!([1, 2]))).await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert_eq!(h.gateway.len(&widget()).await, 0);
}

#[tokio::test]
async fn malformed_json_is_rejected() {
    let h = harness();
    let request = Request::builder()
        .method(Method::POST)
        .uri("/v1/widget")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{ nope"))
        .unwrap();
    let response = h.dispatcher.router().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn oversized_body_is_413_envelope() {
    let h = harness_with(|s| s.body_limit = 16);
    let reply = send(
        &h.dispatcher,
        Method::POST,
        "/v1/widget",
        Some(json!({ "name": "a name well past sixteen bytes" })),
    )
    .await;
    assert_eq!(reply.status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(reply.body["error"]["code"], "payload_too_large");
}

#[tokio::test]
async fn descriptor_rules_are_enforced() {
    let root = TempDir::new().unwrap();
    forge(root.path(), "widget", &[ActionKind::Read]);
    std::fs::write(
        root.path().join("Widget").join("WidgetCreateAction.json"),
        json!({
            "resource": "Widget",
            "action": "create",
            "table": "widget",
            "columns": ["name", "color"],
            "validation": { "name": { "required": true, "max_length": 8 } }
        })
        .to_string(),
    )
    .unwrap();
    let gateway = Arc::new(MemoryGateway::new());
    let dispatcher = Dispatcher::bootstrap(settings_for(&root), gateway.clone()).unwrap();

    let missing = send(&dispatcher, Method::POST, "/v1/widget", Some(json!({ "color": "red" }))).await;
    assert_eq!(missing.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(missing.body["error"]["code"], "validation_error");

    let unknown = send(&dispatcher, Method::POST, "/v1/widget", Some(json!({ "name": "a", "secret": 1 }))).await;
    assert_eq!(unknown.status, StatusCode::UNPROCESSABLE_ENTITY);

    let ok = send(&dispatcher, Method::POST, "/v1/widget", Some(json!({ "name": "a" }))).await;
    assert_eq!(ok.status, StatusCode::CREATED);
    assert_eq!(gateway.len(&widget()).await, 1);
}

#[tokio::test]
async fn cors_preflight_only_when_enabled() {
    let on = harness_with(|s| s.cors = true);
    let reply = send(&on.dispatcher, Method::OPTIONS, "/v1/widget/1", None).await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
    assert_eq!(reply.headers[header::ACCESS_CONTROL_ALLOW_CREDENTIALS], "true");
    assert_eq!(
        reply.headers[header::ACCESS_CONTROL_ALLOW_HEADERS],
        "X-Requested-With, Content-Type, Accept, Origin, Authorization"
    );
    assert!(reply.headers[header::ACCESS_CONTROL_ALLOW_METHODS]
        .to_str()
        .unwrap()
        .contains("PATCH"));
    let anywhere = send(&on.dispatcher, Method::OPTIONS, "/anything/at/all", None).await;
    assert_eq!(anywhere.status, StatusCode::OK);

    let off = harness();
    let reply = send(&off.dispatcher, Method::OPTIONS, "/v1/widget/1", None).await;
    assert_eq!(reply.status, StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(reply.body["error"]["code"], "method_not_allowed");
    assert!(!reply.headers.contains_key(header::ACCESS_CONTROL_ALLOW_ORIGIN));
}

#[tokio::test]
async fn malformed_paging_is_rejected() {
    let h = harness();
    let reply = send(&h.dispatcher, Method::GET, "/v1/widget?limit=abc", None).await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert_eq!(reply.body["error"]["code"], "bad_request");

    let reply = send(&h.dispatcher, Method::GET, "/v1/widget?offset=-3", None).await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);

    let reply = send(&h.dispatcher, Method::GET, "/v1/widget?limit=5&offset=0", None).await;
    assert_eq!(reply.status, StatusCode::OK);
}

#[tokio::test]
async fn unsupported_method_is_405_envelope() {
    let h = harness();
    let reply = send(&h.dispatcher, Method::PUT, "/v1/widget/1", None).await;
    assert_eq!(reply.status, StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(reply.headers[header::CONTENT_TYPE], "application/json");
    assert_eq!(reply.body["error"]["code"], "method_not_allowed");
    assert_eq!(reply.body["error"]["message"], "method PUT not allowed");
    assert_eq!(reply.body["data"], Value::Null);
    assert!(reply.headers.contains_key(header::ALLOW));
}

#[tokio::test]
async fn health_and_version_sit_outside_the_group() {
    let h = harness();
    let health = send(&h.dispatcher, Method::GET, "/health", None).await;
    assert_eq!(health.status, StatusCode::OK);
    assert_eq!(health.body, json!({ "status": "ok" }));

    let ready = send(&h.dispatcher, Method::GET, "/ready", None).await;
    assert_eq!(ready.status, StatusCode::OK);
    assert_eq!(ready.body["resources"], 1);

    let version = send(&h.dispatcher, Method::GET, "/version", None).await;
    assert_eq!(version.body["name"], "resource-forge");
}

#[tokio::test]
async fn unknown_route_is_404_envelope() {
    let h = harness();
    let reply = send(&h.dispatcher, Method::GET, "/v1/gadget", None).await;
    assert_eq!(reply.status, StatusCode::NOT_FOUND);
    assert_eq!(reply.body["error"]["code"], "not_found");
}

/// Every call fails the way a lost database connection would.
struct FailingGateway;

#[async_trait]
impl ModelGateway for FailingGateway {
    async fn find_by_key(&self, _: &ResourceModel, _: &Value) -> Result<Option<Value>, GatewayError> {
        Err(GatewayError::Backend("disk on fire".into()))
    }
    async fn destroy(&self, _: &ResourceModel, _: &Value) -> Result<i64, GatewayError> {
        Err(GatewayError::Backend("disk on fire".into()))
    }
    async fn search(&self, _: &ResourceModel, _: &SearchQuery) -> Result<Vec<Value>, GatewayError> {
        Err(GatewayError::Backend("disk on fire".into()))
    }
    async fn insert(&self, _: &ResourceModel, _: &Map<String, Value>) -> Result<Value, GatewayError> {
        Err(GatewayError::Backend("disk on fire".into()))
    }
    async fn update(&self, _: &ResourceModel, _: &Value, _: &Map<String, Value>) -> Result<Option<Value>, GatewayError> {
        Err(GatewayError::Backend("disk on fire".into()))
    }
    async fn ping(&self) -> Result<(), GatewayError> {
        Err(GatewayError::Backend("disk on fire".into()))
    }
}

async fn failing(display_error_details: bool) -> (TempDir, Dispatcher) {
    let root = TempDir::new().unwrap();
    forge(root.path(), "widget", &ActionKind::ALL);
    let settings = Settings {
        display_error_details,
        ..settings_for(&root)
    };
    let dispatcher = Dispatcher::bootstrap(settings, Arc::new(FailingGateway)).unwrap();
    (root, dispatcher)
}

#[tokio::test]
async fn gateway_faults_are_generic_unless_details_enabled() {
    let (_root, quiet) = failing(false).await;
    let reply = send(&quiet, Method::GET, "/v1/widget/1", None).await;
    assert_eq!(reply.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(reply.body["error"]["message"], "An error occurred.");
    assert!(reply.body["error"].get("details").is_none());
    assert!(!reply.body.to_string().contains("disk on fire"));

    let (_root, verbose) = failing(true).await;
    let reply = send(&verbose, Method::DELETE, "/v1/widget/1", None).await;
    assert_eq!(reply.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(reply.body["error"]["message"], "An error occurred.");
    assert!(reply.body["error"]["details"].as_str().unwrap().contains("disk on fire"));
}

#[tokio::test]
async fn readiness_reports_gateway_outage() {
    let (_root, dispatcher) = failing(false).await;
    let reply = send(&dispatcher, Method::GET, "/ready", None).await;
    assert_eq!(reply.status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(reply.body["database"], "unavailable");
}

struct PanickingAction;

#[async_trait]
impl Action for PanickingAction {
    async fn handle(&self, _: RequestContext, _: ResponseBody, _: &dyn ModelGateway) -> Result<ResponseBody, AppError> {
        panic!("action exploded")
    }
}

struct ExistsAction;

#[async_trait]
impl Action for ExistsAction {
    async fn handle(
        &self,
        ctx: RequestContext,
        envelope: ResponseBody,
        gateway: &dyn ModelGateway,
    ) -> Result<ResponseBody, AppError> {
        let exists = gateway.find_by_key(&ctx.model, ctx.require_key()?).await?.is_some();
        Ok(envelope.set_data(json!({ "exists": exists })))
    }
}

#[tokio::test]
async fn custom_actions_share_the_pipeline() {
    let root = TempDir::new().unwrap();
    forge(root.path(), "widget", &ActionKind::ALL);
    let mut registry = ResourceRegistry::from_root(root.path()).unwrap();
    registry
        .register_custom("exists", Method::GET, "/widget/:id/exists", widget(), Arc::new(ExistsAction))
        .unwrap();
    registry
        .register_custom("boom", Method::GET, "/widget/:id/boom", widget(), Arc::new(PanickingAction))
        .unwrap();

    let gateway = Arc::new(MemoryGateway::new());
    gateway
        .insert(&widget(), json!({ "id": 3 }).as_object().unwrap())
        .await
        .unwrap();
    let settings = Settings {
        display_error_details: true,
        ..settings_for(&root)
    };
    let dispatcher = Dispatcher::with_registry(settings, gateway, registry);

    let yes = send(&dispatcher, Method::GET, "/v1/widget/3/exists", None).await;
    assert_eq!(yes.status, StatusCode::OK);
    assert_eq!(yes.body["data"]["exists"], true);

    let bad_key = send(&dispatcher, Method::GET, "/v1/widget/x/exists", None).await;
    assert_eq!(bad_key.status, StatusCode::BAD_REQUEST);

    let boom = send(&dispatcher, Method::GET, "/v1/widget/3/boom", None).await;
    assert_eq!(boom.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(boom.body["error"]["message"], "An error occurred.");
    assert!(boom.body["error"]["details"].as_str().unwrap().contains("action exploded"));
}
