//! Resolved resource model: descriptor validated and flattened for runtime use.

use crate::case::to_snake_case;
use crate::config::{KeyType, ValidationRule};
use crate::error::AppError;
use serde_json::Value;
use std::collections::HashMap;

#[derive(Clone, Debug, PartialEq)]
pub struct ResourceModel {
    pub resource: String,
    pub path_segment: String,
    pub schema_name: Option<String>,
    pub table_name: String,
    pub key_column: String,
    pub key_type: KeyType,
    pub columns: Vec<String>,
    pub validation: HashMap<String, ValidationRule>,
}

impl ResourceModel {
    /// Conventional model for a resource with no descriptor: table and path are
    /// the snake_case name, key is an integer `id`.
    pub fn for_resource(resource: &str) -> Self {
        let snake = to_snake_case(resource);
        ResourceModel {
            resource: resource.to_string(),
            path_segment: snake.clone(),
            schema_name: None,
            table_name: snake,
            key_column: "id".into(),
            key_type: KeyType::Int,
            columns: Vec::new(),
            validation: HashMap::new(),
        }
    }

    pub fn allows_column(&self, column: &str) -> bool {
        self.columns.is_empty() || self.columns.iter().any(|c| c == column)
    }

    /// Parse a raw path segment into a key value of this model's key type.
    pub fn parse_key(&self, raw: &str) -> Result<Value, AppError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(AppError::BadRequest(format!("{} is required", self.key_column)));
        }
        Ok(match self.key_type {
            KeyType::Uuid => {
                let u = uuid::Uuid::parse_str(raw)
                    .map_err(|_| AppError::BadRequest(format!("{} must be a uuid", self.key_column)))?;
                Value::String(u.to_string())
            }
            KeyType::BigInt | KeyType::Int => {
                let n: i64 = raw
                    .parse()
                    .map_err(|_| AppError::BadRequest(format!("{} must be an integer", self.key_column)))?;
                if self.key_type == KeyType::Int && i32::try_from(n).is_err() {
                    return Err(AppError::BadRequest(format!("{} is out of range", self.key_column)));
                }
                Value::Number(n.into())
            }
            KeyType::Text => Value::String(raw.to_string()),
        })
    }
}
