//! Generic CRUD actions. None of them knows the record shape: they see a key,
//! a JSON body and the resource model.

use crate::actions::{Action, RequestContext};
use crate::error::AppError;
use crate::gateway::{ModelGateway, SearchQuery};
use crate::response::ResponseBody;
use crate::validation::RequestValidator;
use async_trait::async_trait;
use axum::http::StatusCode;
use serde_json::Value;

pub struct CreateAction;
pub struct ReadAction;
pub struct UpdateAction;
pub struct DeleteAction;
pub struct SearchAction;

#[async_trait]
impl Action for CreateAction {
    async fn handle(
        &self,
        ctx: RequestContext,
        envelope: ResponseBody,
        gateway: &dyn ModelGateway,
    ) -> Result<ResponseBody, AppError> {
        let body = ctx.require_body()?;
        let row = gateway.insert(&ctx.model, body).await?;
        Ok(envelope.set_data(row).set_status(StatusCode::CREATED))
    }
}

#[async_trait]
impl Action for ReadAction {
    async fn handle(
        &self,
        ctx: RequestContext,
        envelope: ResponseBody,
        gateway: &dyn ModelGateway,
    ) -> Result<ResponseBody, AppError> {
        let key = ctx.require_key()?;
        Ok(match gateway.find_by_key(&ctx.model, key).await? {
            Some(row) => envelope.set_data(row).set_status(StatusCode::OK),
            None => envelope.set_data(Value::Null).set_status(StatusCode::NOT_FOUND),
        })
    }
}

#[async_trait]
impl Action for UpdateAction {
    async fn handle(
        &self,
        ctx: RequestContext,
        envelope: ResponseBody,
        gateway: &dyn ModelGateway,
    ) -> Result<ResponseBody, AppError> {
        let key = ctx.require_key()?;
        let body = ctx.require_body()?;
        Ok(match gateway.update(&ctx.model, key, body).await? {
            Some(row) => envelope.set_data(row).set_status(StatusCode::OK),
            None => envelope.set_data(Value::Null).set_status(StatusCode::NOT_FOUND),
        })
    }
}

#[async_trait]
impl Action for DeleteAction {
    /// 200 only when the gateway reports exactly one row destroyed; anything else is 404.
    async fn handle(
        &self,
        ctx: RequestContext,
        envelope: ResponseBody,
        gateway: &dyn ModelGateway,
    ) -> Result<ResponseBody, AppError> {
        let key = ctx.require_key()?;
        let found = gateway.find_by_key(&ctx.model, key).await?.is_some();
        let destroyed = gateway.destroy(&ctx.model, key).await?;
        tracing::debug!(resource = %ctx.resource, key = %key, found, destroyed, "delete");
        let status = if destroyed == 1 {
            StatusCode::OK
        } else {
            StatusCode::NOT_FOUND
        };
        Ok(envelope.set_data(Value::Null).set_status(status))
    }
}

#[async_trait]
impl Action for SearchAction {
    /// `limit` and `offset` page the result; any other allowed column is an exact-match filter.
    async fn handle(
        &self,
        ctx: RequestContext,
        envelope: ResponseBody,
        gateway: &dyn ModelGateway,
    ) -> Result<ResponseBody, AppError> {
        let (limit, offset) = RequestValidator::paging(&ctx.query)?;
        let mut filters: Vec<(String, Value)> = ctx
            .query
            .iter()
            .filter(|(k, _)| !matches!(k.as_str(), "limit" | "offset") && ctx.model.allows_column(k))
            .map(|(k, v)| (k.clone(), Value::String(v.clone())))
            .collect();
        filters.sort_by(|a, b| a.0.cmp(&b.0));

        let rows = gateway
            .search(&ctx.model, &SearchQuery::new(filters, limit, offset))
            .await?;
        Ok(envelope.set_many(rows).set_status(StatusCode::OK))
    }
}
