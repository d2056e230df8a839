//! Route registry: every (method, path) claimed by exactly one action.

use crate::actions::{Action, ActionKind};
use crate::config::ResourceModel;
use crate::discovery::{self, DiscoveredResource};
use crate::error::ConfigError;
use axum::http::Method;
use axum::routing::MethodFilter;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

/// Label of an action in route tables. Discovered kinds use their name.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ActionLabel {
    Kind(ActionKind),
    Custom(String),
}

impl std::fmt::Display for ActionLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ActionLabel::Kind(kind) => write!(f, "{}", kind),
            ActionLabel::Custom(name) => write!(f, "custom:{}", name),
        }
    }
}

#[derive(Clone)]
pub struct RouteBinding {
    pub resource: String,
    pub label: ActionLabel,
    pub method: Method,
    /// Relative to the versioned prefix, e.g. `/widget/:id`.
    pub path: String,
    pub action: Arc<dyn Action>,
    pub model: Arc<ResourceModel>,
}

impl std::fmt::Debug for RouteBinding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RouteBinding")
            .field("resource", &self.resource)
            .field("label", &self.label)
            .field("method", &self.method)
            .field("path", &self.path)
            .finish()
    }
}

/// One resource and the actions it exposes, in registration order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResourceSummary {
    pub name: String,
    pub actions: Vec<ActionLabel>,
}

/// `/widget/:id` and `/widget/:key` claim the same route.
fn normalize_path(path: &str) -> String {
    path.split('/')
        .map(|seg| if seg.starts_with(':') || seg.starts_with('*') { ":_" } else { seg })
        .collect::<Vec<_>>()
        .join("/")
}

#[derive(Default, Debug)]
pub struct ResourceRegistry {
    bindings: Vec<RouteBinding>,
    claimed: HashMap<(Method, String), String>,
    /// Normalized path to the literal pattern first registered for it.
    shapes: HashMap<String, String>,
}

impl ResourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scan `root` and register everything found, in discovery order.
    pub fn from_root(root: &Path) -> Result<Self, ConfigError> {
        Self::from_discovered(&discovery::discover(root)?)
    }

    pub fn from_discovered(resources: &[DiscoveredResource]) -> Result<Self, ConfigError> {
        let mut registry = Self::new();
        for resource in resources {
            resource.register(&mut registry)?;
        }
        Ok(registry)
    }

    /// Bind a generic action kind for a resource model.
    pub fn register(&mut self, kind: ActionKind, model: ResourceModel) -> Result<(), ConfigError> {
        let path = kind.path_for(&model.path_segment);
        self.insert(RouteBinding {
            resource: model.resource.clone(),
            label: ActionLabel::Kind(kind),
            method: kind.method(),
            path,
            action: kind.handler(),
            model: Arc::new(model),
        })
    }

    /// Bind a hand-written action. It obeys the same collision rule as discovered ones.
    pub fn register_custom(
        &mut self,
        name: &str,
        method: Method,
        path: &str,
        model: ResourceModel,
        action: Arc<dyn Action>,
    ) -> Result<(), ConfigError> {
        if MethodFilter::try_from(method.clone()).is_err() {
            return Err(ConfigError::UnsupportedMethod(method.to_string()));
        }
        let path = if path.starts_with('/') {
            path.to_string()
        } else {
            format!("/{}", path)
        };
        self.insert(RouteBinding {
            resource: model.resource.clone(),
            label: ActionLabel::Custom(name.to_string()),
            method,
            path,
            action,
            model: Arc::new(model),
        })
    }

    fn insert(&mut self, binding: RouteBinding) -> Result<(), ConfigError> {
        let normalized = normalize_path(&binding.path);
        if let Some(existing) = self.shapes.get(&normalized) {
            if *existing != binding.path {
                return Err(ConfigError::RouteShape {
                    path: binding.path.clone(),
                    existing: existing.clone(),
                });
            }
        }
        let claim = (binding.method.clone(), normalized.clone());
        let owner = format!("{}:{}", binding.resource, binding.label);
        if let Some(first) = self.claimed.get(&claim) {
            return Err(ConfigError::DuplicateRoute {
                method: binding.method.to_string(),
                path: binding.path.clone(),
                first: first.clone(),
                second: owner,
            });
        }
        tracing::debug!(method = %binding.method, path = %binding.path, owner = %owner, "route bound");
        self.claimed.insert(claim, owner);
        self.shapes.insert(normalized, binding.path.clone());
        self.bindings.push(binding);
        Ok(())
    }

    pub fn bindings(&self) -> &[RouteBinding] {
        &self.bindings
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Resources in first-registration order with the actions each exposes.
    pub fn resources(&self) -> Vec<ResourceSummary> {
        let mut out: Vec<ResourceSummary> = Vec::new();
        for b in &self.bindings {
            match out.iter_mut().find(|r| r.name == b.resource) {
                Some(r) => r.actions.push(b.label.clone()),
                None => out.push(ResourceSummary {
                    name: b.resource.clone(),
                    actions: vec![b.label.clone()],
                }),
            }
        }
        out
    }
}
