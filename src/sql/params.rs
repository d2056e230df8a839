//! Key parameters bound with the column's native type so index lookups stay typed.

use crate::config::{KeyType, ResourceModel};
use crate::error::GatewayError;
use serde_json::Value;
use sqlx::postgres::{PgArguments, Postgres};
use sqlx::query::Query;

#[derive(Clone, Debug, PartialEq)]
pub enum KeyParam {
    Int(i32),
    BigInt(i64),
    Uuid(uuid::Uuid),
    Text(String),
}

impl KeyParam {
    pub fn from_json(model: &ResourceModel, v: &Value) -> Result<Self, GatewayError> {
        let invalid = |message: &str| GatewayError::InvalidKey {
            table: model.table_name.clone(),
            message: message.to_string(),
        };
        Ok(match model.key_type {
            KeyType::Int => {
                let n = v.as_i64().ok_or_else(|| invalid("expected integer"))?;
                KeyParam::Int(i32::try_from(n).map_err(|_| invalid("integer out of range"))?)
            }
            KeyType::BigInt => KeyParam::BigInt(v.as_i64().ok_or_else(|| invalid("expected integer"))?),
            KeyType::Uuid => {
                let s = v.as_str().ok_or_else(|| invalid("expected uuid string"))?;
                KeyParam::Uuid(uuid::Uuid::parse_str(s).map_err(|_| invalid("expected uuid string"))?)
            }
            KeyType::Text => match v {
                Value::String(s) => KeyParam::Text(s.clone()),
                other => KeyParam::Text(other.to_string()),
            },
        })
    }

    pub fn bind<'q>(self, query: Query<'q, Postgres, PgArguments>) -> Query<'q, Postgres, PgArguments> {
        match self {
            KeyParam::Int(n) => query.bind(n),
            KeyParam::BigInt(n) => query.bind(n),
            KeyParam::Uuid(u) => query.bind(u),
            KeyParam::Text(s) => query.bind(s),
        }
    }
}
