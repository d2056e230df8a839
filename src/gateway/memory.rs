//! In-process gateway. Rows live in one ordered map per table behind a single lock,
//! so every call is atomic with respect to every other.

use crate::config::{KeyType, ResourceModel};
use crate::error::GatewayError;
use crate::gateway::{ModelGateway, SearchQuery};
use crate::sql::KeyParam;
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap};
use tokio::sync::RwLock;

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
enum RowKey {
    Int(i64),
    Text(String),
}

impl From<KeyParam> for RowKey {
    fn from(key: KeyParam) -> Self {
        match key {
            KeyParam::Int(n) => RowKey::Int(n.into()),
            KeyParam::BigInt(n) => RowKey::Int(n),
            KeyParam::Uuid(u) => RowKey::Text(u.to_string()),
            KeyParam::Text(s) => RowKey::Text(s),
        }
    }
}

type Table = BTreeMap<RowKey, Map<String, Value>>;

#[derive(Default)]
pub struct MemoryGateway {
    tables: RwLock<HashMap<String, Table>>,
}

fn table_id(model: &ResourceModel) -> String {
    match &model.schema_name {
        Some(schema) => format!("{}.{}", schema, model.table_name),
        None => model.table_name.clone(),
    }
}

fn row_key(model: &ResourceModel, key: &Value) -> Result<RowKey, GatewayError> {
    KeyParam::from_json(model, key).map(RowKey::from)
}

/// Query-string filters arrive as strings; compare scalars by their text form.
fn loose_eq(actual: &Value, wanted: &Value) -> bool {
    if actual == wanted {
        return true;
    }
    match (actual, wanted) {
        (Value::Number(n), Value::String(s)) => n.to_string() == *s,
        (Value::Bool(b), Value::String(s)) => b.to_string() == *s,
        _ => false,
    }
}

impl MemoryGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of rows currently stored for the model's table.
    pub async fn len(&self, model: &ResourceModel) -> usize {
        self.tables
            .read()
            .await
            .get(&table_id(model))
            .map(BTreeMap::len)
            .unwrap_or(0)
    }

    fn next_key(model: &ResourceModel, table: &Table) -> Result<Value, GatewayError> {
        match model.key_type {
            KeyType::Int | KeyType::BigInt => {
                let max = table
                    .keys()
                    .filter_map(|k| match k {
                        RowKey::Int(n) => Some(*n),
                        RowKey::Text(_) => None,
                    })
                    .max()
                    .unwrap_or(0);
                Ok(Value::from(max + 1))
            }
            KeyType::Uuid => Ok(Value::String(uuid::Uuid::new_v4().to_string())),
            KeyType::Text => Err(GatewayError::InvalidKey {
                table: model.table_name.clone(),
                message: format!("{} is required", model.key_column),
            }),
        }
    }
}

#[async_trait]
impl ModelGateway for MemoryGateway {
    async fn find_by_key(&self, model: &ResourceModel, key: &Value) -> Result<Option<Value>, GatewayError> {
        let key = row_key(model, key)?;
        let tables = self.tables.read().await;
        Ok(tables
            .get(&table_id(model))
            .and_then(|t| t.get(&key))
            .map(|row| Value::Object(row.clone())))
    }

    async fn destroy(&self, model: &ResourceModel, key: &Value) -> Result<i64, GatewayError> {
        let key = row_key(model, key)?;
        let mut tables = self.tables.write().await;
        let removed = tables
            .get_mut(&table_id(model))
            .and_then(|t| t.remove(&key))
            .is_some();
        Ok(i64::from(removed))
    }

    async fn search(&self, model: &ResourceModel, query: &SearchQuery) -> Result<Vec<Value>, GatewayError> {
        let tables = self.tables.read().await;
        let Some(table) = tables.get(&table_id(model)) else {
            return Ok(Vec::new());
        };
        Ok(table
            .values()
            .filter(|row| {
                query
                    .filters
                    .iter()
                    .all(|(col, wanted)| row.get(col).is_some_and(|actual| loose_eq(actual, wanted)))
            })
            .skip(query.offset as usize)
            .take(query.limit as usize)
            .map(|row| Value::Object(row.clone()))
            .collect())
    }

    async fn insert(&self, model: &ResourceModel, body: &Map<String, Value>) -> Result<Value, GatewayError> {
        let mut tables = self.tables.write().await;
        let table = tables.entry(table_id(model)).or_default();
        let mut row = body.clone();
        let key_value = match row.get(&model.key_column) {
            Some(v) if !v.is_null() => v.clone(),
            _ => Self::next_key(model, table)?,
        };
        let key = row_key(model, &key_value)?;
        if table.contains_key(&key) {
            return Err(GatewayError::Backend(format!(
                "duplicate key {} in {}",
                key_value, model.table_name
            )));
        }
        row.insert(model.key_column.clone(), key_value);
        table.insert(key, row.clone());
        Ok(Value::Object(row))
    }

    async fn update(
        &self,
        model: &ResourceModel,
        key: &Value,
        body: &Map<String, Value>,
    ) -> Result<Option<Value>, GatewayError> {
        let key = row_key(model, key)?;
        let mut tables = self.tables.write().await;
        let Some(row) = tables.get_mut(&table_id(model)).and_then(|t| t.get_mut(&key)) else {
            return Ok(None);
        };
        for (col, v) in body {
            if *col != model.key_column {
                row.insert(col.clone(), v.clone());
            }
        }
        Ok(Some(Value::Object(row.clone())))
    }

    async fn ping(&self) -> Result<(), GatewayError> {
        Ok(())
    }
}
