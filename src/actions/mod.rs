//! Action contract: every resource action is invoked the same way by the dispatcher,
//! whatever the shape of the underlying record.

mod crud;

pub use crud::{CreateAction, DeleteAction, ReadAction, SearchAction, UpdateAction};

use crate::config::ResourceModel;
use crate::error::AppError;
use crate::gateway::ModelGateway;
use crate::response::ResponseBody;
use async_trait::async_trait;
use axum::http::Method;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Path parameter holding the record key.
pub const KEY_PARAM: &str = "id";

/// Extension of on-disk action artifacts.
pub const ARTIFACT_EXTENSION: &str = "json";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionKind {
    Create,
    Read,
    Update,
    Delete,
    Search,
}

impl ActionKind {
    pub const ALL: [ActionKind; 5] = [
        ActionKind::Create,
        ActionKind::Read,
        ActionKind::Update,
        ActionKind::Delete,
        ActionKind::Search,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ActionKind::Create => "create",
            ActionKind::Read => "read",
            ActionKind::Update => "update",
            ActionKind::Delete => "delete",
            ActionKind::Search => "search",
        }
    }

    /// Class-name suffix, e.g. `SearchAction` in `WidgetSearchAction`.
    pub fn class_suffix(&self) -> &'static str {
        match self {
            ActionKind::Create => "CreateAction",
            ActionKind::Read => "ReadAction",
            ActionKind::Update => "UpdateAction",
            ActionKind::Delete => "DeleteAction",
            ActionKind::Search => "SearchAction",
        }
    }

    pub fn method(&self) -> Method {
        match self {
            ActionKind::Create => Method::POST,
            ActionKind::Read => Method::GET,
            ActionKind::Update => Method::PATCH,
            ActionKind::Delete => Method::DELETE,
            ActionKind::Search => Method::GET,
        }
    }

    /// Route pattern relative to the versioned prefix.
    pub fn path_for(&self, segment: &str) -> String {
        match self {
            ActionKind::Create | ActionKind::Search => format!("/{}", segment),
            ActionKind::Read | ActionKind::Update | ActionKind::Delete => {
                format!("/{}/:{}", segment, KEY_PARAM)
            }
        }
    }

    /// Statically-typed handler bound to this kind.
    pub fn handler(&self) -> Arc<dyn Action> {
        match self {
            ActionKind::Create => Arc::new(CreateAction),
            ActionKind::Read => Arc::new(ReadAction),
            ActionKind::Update => Arc::new(UpdateAction),
            ActionKind::Delete => Arc::new(DeleteAction),
            ActionKind::Search => Arc::new(SearchAction),
        }
    }

    /// `WidgetSearchAction.json` for resource `Widget`.
    pub fn artifact_file_name(&self, resource: &str) -> String {
        format!("{}{}.{}", resource, self.class_suffix(), ARTIFACT_EXTENSION)
    }

    /// Inverse of [`artifact_file_name`](Self::artifact_file_name).
    pub fn from_artifact_name(resource: &str, file_name: &str) -> Option<ActionKind> {
        let stem = file_name.strip_suffix(ARTIFACT_EXTENSION)?.strip_suffix('.')?;
        let suffix = stem.strip_prefix(resource)?;
        ActionKind::ALL.into_iter().find(|k| k.class_suffix() == suffix)
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ActionKind::ALL
            .into_iter()
            .find(|k| k.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown action '{}' (expected create, read, update, delete or search)", s))
    }
}

/// Per-request state handed to an action. Owned by exactly one in-flight request.
#[derive(Clone, Debug)]
pub struct RequestContext {
    pub resource: String,
    pub model: Arc<ResourceModel>,
    pub method: Method,
    pub params: HashMap<String, String>,
    /// Parsed `:id`, present when the route has one and it validated.
    pub key: Option<Value>,
    pub query: HashMap<String, String>,
    /// JSON object body, present for writes.
    pub body: Option<Map<String, Value>>,
}

impl RequestContext {
    pub fn new(resource: &str, model: Arc<ResourceModel>, method: Method) -> Self {
        RequestContext {
            resource: resource.to_string(),
            model,
            method,
            params: HashMap::new(),
            key: None,
            query: HashMap::new(),
            body: None,
        }
    }

    pub fn require_key(&self) -> Result<&Value, AppError> {
        self.key
            .as_ref()
            .ok_or_else(|| AppError::BadRequest(format!("{} is required", self.model.key_column)))
    }

    pub fn require_body(&self) -> Result<&Map<String, Value>, AppError> {
        self.body
            .as_ref()
            .ok_or_else(|| AppError::BadRequest("body must be a JSON object".into()))
    }
}

/// The uniform shape every action satisfies. The envelope arrives initialized
/// by the pipeline; the action fills it and hands it back.
#[async_trait]
pub trait Action: Send + Sync {
    async fn handle(
        &self,
        ctx: RequestContext,
        envelope: ResponseBody,
        gateway: &dyn ModelGateway,
    ) -> Result<ResponseBody, AppError>;
}
