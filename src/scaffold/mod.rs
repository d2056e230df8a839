//! Scaffolding: render action artifacts from templates into the discovery layout.
//!
//! Each job writes `<root>/<Entity>/<Entity><Kind>Action.json` through a temp file
//! in the same directory followed by a rename, so a reader never sees a torn file
//! and a failed job leaves any earlier artifact as it was.

mod templates;

use crate::actions::{ActionKind, KEY_PARAM};
use crate::case::{to_pascal_case, to_table_name};
use crate::config::{validate_descriptor, ActionDescriptor};
use crate::error::ScaffoldError;
use handlebars::Handlebars;
use serde_json::json;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// What to do when the target artifact already exists.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OverwritePolicy {
    #[default]
    Reject,
    Overwrite,
}

/// Result of one (entity, kind) job in a batch.
#[derive(Debug)]
pub struct ForgeOutcome {
    pub entity: String,
    pub kind: ActionKind,
    pub result: Result<PathBuf, ScaffoldError>,
}

pub struct Scaffolder {
    root: PathBuf,
    handlebars: Handlebars<'static>,
    policy: OverwritePolicy,
}

impl Scaffolder {
    pub fn new(root: impl Into<PathBuf>) -> Result<Self, ScaffoldError> {
        let mut handlebars = Handlebars::new();
        handlebars.set_strict_mode(true);
        handlebars.register_escape_fn(handlebars::no_escape);
        for kind in ActionKind::ALL {
            handlebars
                .register_template_string(kind.as_str(), templates::source(kind))
                .map_err(|e| ScaffoldError::Template(format!("{}: {}", kind, e)))?;
        }
        Ok(Scaffolder {
            root: root.into(),
            handlebars,
            policy: OverwritePolicy::default(),
        })
    }

    pub fn with_policy(mut self, policy: OverwritePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Render the artifact text for one job and check it loads as a descriptor.
    /// The table keeps the entity name as typed; only the class name is PascalCase.
    pub fn render(&self, class_name: &str, table_name: &str, kind: ActionKind) -> Result<String, ScaffoldError> {
        let data = json!({
            "class_name": class_name,
            "path_segment": table_name.to_ascii_lowercase(),
            "table_name": table_name,
            "action": kind.as_str(),
            "key": KEY_PARAM,
        });
        let text = self
            .handlebars
            .render(kind.as_str(), &data)
            .map_err(|e| ScaffoldError::Template(e.to_string()))?;

        let artifact = PathBuf::from(kind.artifact_file_name(class_name));
        let descriptor: ActionDescriptor =
            serde_json::from_str(&text).map_err(|e| ScaffoldError::Template(format!("{}: {}", kind, e)))?;
        validate_descriptor(&descriptor, class_name, kind, &artifact)
            .map_err(|e| ScaffoldError::Template(e.to_string()))?;
        Ok(text)
    }

    pub fn forge_action(&self, entity: &str, kind: ActionKind) -> Result<PathBuf, ScaffoldError> {
        let class_name = to_pascal_case(entity).ok_or_else(|| ScaffoldError::InvalidName(entity.to_string()))?;
        let text = self.render(&class_name, &to_table_name(entity), kind)?;

        let dir = self.root.join(&class_name);
        std::fs::create_dir_all(&dir).map_err(|source| ScaffoldError::CreateDir {
            path: dir.clone(),
            source,
        })?;

        let target = dir.join(kind.artifact_file_name(&class_name));
        if self.policy == OverwritePolicy::Reject && target.exists() {
            return Err(ScaffoldError::AlreadyExists { path: target });
        }

        let write_err = |source: std::io::Error| ScaffoldError::Write {
            path: target.clone(),
            source,
        };
        let mut tmp = NamedTempFile::new_in(&dir).map_err(write_err)?;
        tmp.write_all(text.as_bytes()).map_err(write_err)?;
        tmp.as_file().sync_all().map_err(write_err)?;

        match self.policy {
            OverwritePolicy::Overwrite => {
                tmp.persist(&target).map_err(|e| write_err(e.error))?;
            }
            OverwritePolicy::Reject => {
                tmp.persist_noclobber(&target).map_err(|e| {
                    if e.error.kind() == std::io::ErrorKind::AlreadyExists {
                        ScaffoldError::AlreadyExists { path: target.clone() }
                    } else {
                        write_err(e.error)
                    }
                })?;
            }
        }
        tracing::info!(entity = %class_name, action = %kind, path = %target.display(), "artifact written");
        Ok(target)
    }

    /// Every requested kind for one entity. A failed kind does not stop the others.
    pub fn forge_resource(&self, entity: &str, kinds: &[ActionKind]) -> Vec<ForgeOutcome> {
        kinds
            .iter()
            .map(|&kind| ForgeOutcome {
                entity: entity.to_string(),
                kind,
                result: self.forge_action(entity, kind),
            })
            .collect()
    }

    pub fn forge_batch<S: AsRef<str>>(&self, entities: &[S], kinds: &[ActionKind]) -> Vec<ForgeOutcome> {
        entities
            .iter()
            .flat_map(|entity| self.forge_resource(entity.as_ref(), kinds))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::load_descriptor;
    use tempfile::TempDir;

    #[test]
    fn renders_loadable_descriptors_for_every_kind() {
        let root = TempDir::new().unwrap();
        let scaffolder = Scaffolder::new(root.path()).unwrap();
        for kind in ActionKind::ALL {
            let path = scaffolder.forge_action("order_item", kind).unwrap();
            let descriptor = load_descriptor(&path, "OrderItem", kind).unwrap();
            assert_eq!(descriptor.table, "order_item");
            assert_eq!(descriptor.path.as_deref(), Some("order_item"));
        }
    }

    #[test]
    fn table_keeps_the_entity_name() {
        let root = TempDir::new().unwrap();
        let scaffolder = Scaffolder::new(root.path()).unwrap();

        let path = scaffolder.forge_action("widget_2", ActionKind::Search).unwrap();
        let descriptor = load_descriptor(&path, "Widget2", ActionKind::Search).unwrap();
        assert_eq!(descriptor.table, "widget_2");
        assert_eq!(descriptor.path.as_deref(), Some("widget_2"));

        let path = scaffolder.forge_action("USERS", ActionKind::Read).unwrap();
        assert!(path.ends_with("USERS/USERSReadAction.json"));
        let descriptor = load_descriptor(&path, "USERS", ActionKind::Read).unwrap();
        assert_eq!(descriptor.table, "USERS");
        assert_eq!(descriptor.path.as_deref(), Some("users"));

        let path = scaffolder.forge_action(" line-item ", ActionKind::Delete).unwrap();
        let descriptor = load_descriptor(&path, "LineItem", ActionKind::Delete).unwrap();
        assert_eq!(descriptor.table, "line_item");
    }

    #[test]
    fn rejects_invalid_names() {
        let root = TempDir::new().unwrap();
        let scaffolder = Scaffolder::new(root.path()).unwrap();
        assert!(matches!(
            scaffolder.forge_action("../etc", ActionKind::Search),
            Err(ScaffoldError::InvalidName(_))
        ));
        assert!(matches!(
            scaffolder.forge_action("", ActionKind::Search),
            Err(ScaffoldError::InvalidName(_))
        ));
    }

    #[test]
    fn batch_reports_each_job() {
        let root = TempDir::new().unwrap();
        std::fs::write(root.path().join("Gadget"), "in the way").unwrap();
        let scaffolder = Scaffolder::new(root.path()).unwrap();

        let outcomes = scaffolder.forge_batch(&["widget", "gadget"], &[ActionKind::Read, ActionKind::Delete]);
        assert_eq!(outcomes.len(), 4);
        assert!(outcomes[0].result.is_ok());
        assert!(outcomes[1].result.is_ok());
        for outcome in &outcomes[2..] {
            let err = outcome.result.as_ref().unwrap_err();
            assert_eq!(err.path(), Some(&root.path().join("Gadget")));
        }
    }
}
