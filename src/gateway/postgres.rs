//! PostgreSQL gateway using the safe SQL builder.

use crate::config::ResourceModel;
use crate::error::GatewayError;
use crate::gateway::{ModelGateway, SearchQuery};
use crate::sql::{self, KeyParam};
use async_trait::async_trait;
use serde_json::{Map, Value};
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::{PgPool, Row};

#[derive(Clone)]
pub struct PgGateway {
    pool: PgPool,
}

impl PgGateway {
    pub fn new(pool: PgPool) -> Self {
        PgGateway { pool }
    }

    /// Lazily connecting pool; the first query opens the connection.
    pub fn connect_lazy(options: PgConnectOptions) -> Self {
        let pool = PgPoolOptions::new().max_connections(5).connect_lazy_with(options);
        PgGateway { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn fetch_one_row(
        &self,
        sql: &str,
        body: Option<Value>,
        key: Option<KeyParam>,
    ) -> Result<Option<Value>, GatewayError> {
        tracing::debug!(sql = %sql, key = ?key, "query");
        let mut query = sqlx::query(sql);
        if let Some(body) = body {
            query = query.bind(body);
        }
        if let Some(key) = key {
            query = key.bind(query);
        }
        let row = query.fetch_optional(&self.pool).await?;
        Ok(match row {
            Some(r) => Some(r.try_get::<Value, _>(0)?),
            None => None,
        })
    }
}

/// Body keys in a stable order, with the map as the jsonb parameter.
fn write_columns(body: &Map<String, Value>) -> Vec<&str> {
    body.keys().map(String::as_str).collect()
}

#[async_trait]
impl ModelGateway for PgGateway {
    async fn find_by_key(&self, model: &ResourceModel, key: &Value) -> Result<Option<Value>, GatewayError> {
        let key = KeyParam::from_json(model, key)?;
        self.fetch_one_row(&sql::select_by_key(model), None, Some(key)).await
    }

    async fn destroy(&self, model: &ResourceModel, key: &Value) -> Result<i64, GatewayError> {
        let key = KeyParam::from_json(model, key)?;
        let sql = sql::delete(model);
        tracing::debug!(sql = %sql, key = ?key, "query");
        let result = key.bind(sqlx::query(&sql)).execute(&self.pool).await?;
        Ok(i64::try_from(result.rows_affected()).unwrap_or(i64::MAX))
    }

    async fn search(&self, model: &ResourceModel, query: &SearchQuery) -> Result<Vec<Value>, GatewayError> {
        let columns: Vec<&str> = query.filters.iter().map(|(c, _)| c.as_str()).collect();
        let sql = sql::select_list(model, &columns, query.limit, query.offset);
        tracing::debug!(sql = %sql, filters = ?query.filters, "query");
        let mut q = sqlx::query(&sql);
        if !query.filters.is_empty() {
            let filters: Map<String, Value> = query.filters.iter().cloned().collect();
            q = q.bind(Value::Object(filters));
        }
        let rows = q.fetch_all(&self.pool).await?;
        rows.iter()
            .map(|r| r.try_get::<Value, _>(0).map_err(GatewayError::from))
            .collect()
    }

    async fn insert(&self, model: &ResourceModel, body: &Map<String, Value>) -> Result<Value, GatewayError> {
        let columns = write_columns(body);
        let sql = sql::insert(model, &columns);
        let param = (!columns.is_empty()).then(|| Value::Object(body.clone()));
        self.fetch_one_row(&sql, param, None)
            .await?
            .ok_or_else(|| GatewayError::Backend(format!("insert into {} returned no row", model.table_name)))
    }

    async fn update(
        &self,
        model: &ResourceModel,
        key: &Value,
        body: &Map<String, Value>,
    ) -> Result<Option<Value>, GatewayError> {
        let key = KeyParam::from_json(model, key)?;
        let columns = sql::update_columns(model, write_columns(body));
        let sql = sql::update(model, &columns);
        let param = (!columns.is_empty()).then(|| Value::Object(body.clone()));
        self.fetch_one_row(&sql, param, Some(key)).await
    }

    async fn ping(&self) -> Result<(), GatewayError> {
        sqlx::query("SELECT 1").fetch_optional(&self.pool).await?;
        Ok(())
    }
}
