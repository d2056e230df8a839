//! Example consumer: serves the discovered resources plus a custom
//! `GET /v1/<resource>/:id/exists` action on every resource that has a read action.
//!
//! Run from repo root: `cargo run -p example-consumer`

use async_trait::async_trait;
use axum::http::{Method, StatusCode};
use resource_forge::{
    Action, ActionKind, AppError, Dispatcher, MemoryGateway, ModelGateway, PgGateway, RequestContext,
    ResourceRegistry, ResponseBody, Settings,
};
use serde_json::json;
use std::sync::Arc;
use tokio::net::TcpListener;

/// Answers whether a record exists without returning it.
struct ExistsAction;

#[async_trait]
impl Action for ExistsAction {
    async fn handle(
        &self,
        ctx: RequestContext,
        envelope: ResponseBody,
        gateway: &dyn ModelGateway,
    ) -> Result<ResponseBody, AppError> {
        let key = ctx.require_key()?;
        let exists = gateway.find_by_key(&ctx.model, key).await?.is_some();
        Ok(envelope
            .set_data(json!({ "exists": exists }))
            .set_status(StatusCode::OK))
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("resource_forge=info,example_consumer=info")),
        )
        .init();

    let settings = Settings::from_env()?;
    let discovered = resource_forge::discover(&settings.resource_root)?;
    let mut registry = ResourceRegistry::from_discovered(&discovered)?;
    for resource in &discovered {
        if let Some((_, model)) = resource.bindings.iter().find(|(k, _)| *k == ActionKind::Read) {
            let path = format!("/{}/:id/exists", model.path_segment);
            registry.register_custom("exists", Method::GET, &path, model.clone(), Arc::new(ExistsAction))?;
        }
    }

    let gateway: Arc<dyn ModelGateway> = match std::env::var("MEMORY").as_deref() {
        Ok("true") => Arc::new(MemoryGateway::new()),
        _ => Arc::new(PgGateway::connect_lazy(settings.database.connect_options()?)),
    };

    let listener = TcpListener::bind("127.0.0.1:3000").await?;
    Dispatcher::with_registry(settings, gateway, registry).serve(listener).await?;
    Ok(())
}
