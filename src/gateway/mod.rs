//! Model gateway: the data-access capability actions use. The only shared
//! mutable resource in the process; each call is atomic from the caller's view.

mod memory;
mod postgres;

pub use memory::MemoryGateway;
pub use postgres::PgGateway;

use crate::config::ResourceModel;
use crate::error::GatewayError;
use async_trait::async_trait;
use serde_json::{Map, Value};

pub const DEFAULT_LIMIT: u32 = 100;
pub const MAX_LIMIT: u32 = 1000;

/// Exact-match filters plus paging for a search.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SearchQuery {
    pub filters: Vec<(String, Value)>,
    pub limit: u32,
    pub offset: u32,
}

impl SearchQuery {
    /// Limit defaults to 100 and is capped at 1000; offset defaults to 0.
    pub fn new(filters: Vec<(String, Value)>, limit: Option<u32>, offset: Option<u32>) -> Self {
        SearchQuery {
            filters,
            limit: limit.unwrap_or(DEFAULT_LIMIT).min(MAX_LIMIT),
            offset: offset.unwrap_or(0),
        }
    }
}

#[async_trait]
pub trait ModelGateway: Send + Sync {
    async fn find_by_key(&self, model: &ResourceModel, key: &Value) -> Result<Option<Value>, GatewayError>;

    /// Number of rows removed. Exactly one means the record existed and is gone.
    async fn destroy(&self, model: &ResourceModel, key: &Value) -> Result<i64, GatewayError>;

    async fn search(&self, model: &ResourceModel, query: &SearchQuery) -> Result<Vec<Value>, GatewayError>;

    async fn insert(&self, model: &ResourceModel, body: &Map<String, Value>) -> Result<Value, GatewayError>;

    async fn update(
        &self,
        model: &ResourceModel,
        key: &Value,
        body: &Map<String, Value>,
    ) -> Result<Option<Value>, GatewayError>;

    /// Readiness probe.
    async fn ping(&self) -> Result<(), GatewayError>;
}
