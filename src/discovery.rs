//! Resource discovery: `<root>/<Resource>/<Resource><Kind>Action.json`.
//!
//! Every directory under the root is a candidate resource. Inside it, only files
//! whose name is the directory name plus a known action suffix are bound; anything
//! else is ignored. Enumeration follows the order the filesystem returns.

use crate::actions::ActionKind;
use crate::config::{load_descriptor, resolve, ResourceModel};
use crate::error::ConfigError;
use crate::registry::ResourceRegistry;
use std::path::{Path, PathBuf};

#[derive(Clone, Debug)]
pub struct DiscoveredResource {
    pub name: String,
    pub dir: PathBuf,
    pub bindings: Vec<(ActionKind, ResourceModel)>,
}

impl DiscoveredResource {
    pub fn kinds(&self) -> Vec<ActionKind> {
        self.bindings.iter().map(|(k, _)| *k).collect()
    }

    pub fn register(&self, registry: &mut ResourceRegistry) -> Result<(), ConfigError> {
        for (kind, model) in &self.bindings {
            registry.register(*kind, model.clone())?;
        }
        Ok(())
    }
}

fn read_dir(path: &Path) -> Result<std::fs::ReadDir, ConfigError> {
    std::fs::read_dir(path).map_err(|source| ConfigError::UnreadableRoot {
        path: path.to_path_buf(),
        source,
    })
}

pub fn discover(root: &Path) -> Result<Vec<DiscoveredResource>, ConfigError> {
    let mut resources = Vec::new();

    for entry in read_dir(root)? {
        let entry = entry.map_err(|source| ConfigError::UnreadableRoot {
            path: root.to_path_buf(),
            source,
        })?;
        let dir = entry.path();
        if !dir.is_dir() {
            continue;
        }
        let Some(name) = entry.file_name().to_str().map(str::to_string) else {
            tracing::warn!(path = %dir.display(), "skipping resource directory with non-UTF-8 name");
            continue;
        };

        let mut bindings = Vec::new();
        for file in read_dir(&dir)? {
            let file = file.map_err(|source| ConfigError::UnreadableRoot {
                path: dir.clone(),
                source,
            })?;
            let path = file.path();
            if !path.is_file() {
                continue;
            }
            let Some(kind) = file
                .file_name()
                .to_str()
                .and_then(|f| ActionKind::from_artifact_name(&name, f))
            else {
                continue;
            };
            let descriptor = load_descriptor(&path, &name, kind)?;
            bindings.push((kind, resolve(&descriptor)));
        }

        if bindings.is_empty() {
            tracing::warn!(resource = %name, path = %dir.display(), "no action artifacts, skipping");
            continue;
        }
        tracing::debug!(resource = %name, actions = bindings.len(), "resource discovered");
        resources.push(DiscoveredResource { name, dir, bindings });
    }

    Ok(resources)
}
