//! Raw action descriptor types matching the on-disk JSON artifacts.
//!
//! One descriptor lives at `<root>/<Resource>/<Resource><Kind>Action.json`:
//!
//! ```json
//! { "resource": "Widget", "action": "delete", "table": "widget", "key": "id", "key_type": "int" }
//! ```

use crate::actions::ActionKind;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Key type for parsing path ids.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyType {
    #[default]
    Int,
    BigInt,
    Uuid,
    Text,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidationRule {
    #[serde(default)]
    pub required: Option<bool>,
    #[serde(default)]
    pub format: Option<String>,
    #[serde(default)]
    pub max_length: Option<u32>,
    #[serde(default)]
    pub min_length: Option<u32>,
    #[serde(default)]
    pub pattern: Option<String>,
    #[serde(default)]
    pub allowed: Option<Vec<serde_json::Value>>,
    #[serde(default)]
    pub minimum: Option<f64>,
    #[serde(default)]
    pub maximum: Option<f64>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ActionDescriptor {
    /// Must equal the resource directory name.
    pub resource: String,
    pub action: ActionKind,
    pub table: String,
    #[serde(default)]
    pub schema: Option<String>,
    #[serde(default = "default_key")]
    pub key: String,
    #[serde(default)]
    pub key_type: KeyType,
    /// Route segment under the versioned prefix. Defaults to snake_case of `resource`.
    #[serde(default)]
    pub path: Option<String>,
    /// Allow-list for search filters and write bodies. Empty means unrestricted.
    #[serde(default)]
    pub columns: Vec<String>,
    #[serde(default)]
    pub validation: HashMap<String, ValidationRule>,
}

fn default_key() -> String {
    "id".into()
}
