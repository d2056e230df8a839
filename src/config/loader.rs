//! Load action descriptors from disk and resolve them into runtime models.

use crate::actions::ActionKind;
use crate::case::to_snake_case;
use crate::config::resolved::ResourceModel;
use crate::config::types::ActionDescriptor;
use crate::config::validate_descriptor;
use crate::error::ConfigError;
use std::path::Path;

/// Read, parse and validate one descriptor. `resource` is the directory the
/// file was found in; `kind` is the action its file name claims.
pub fn load_descriptor(path: &Path, resource: &str, kind: ActionKind) -> Result<ActionDescriptor, ConfigError> {
    let text = std::fs::read_to_string(path).map_err(|e| ConfigError::InvalidDescriptor {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    let descriptor: ActionDescriptor = serde_json::from_str(&text).map_err(|e| ConfigError::InvalidDescriptor {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    validate_descriptor(&descriptor, resource, kind, path)?;
    Ok(descriptor)
}

/// Build the runtime model from a validated descriptor.
pub fn resolve(descriptor: &ActionDescriptor) -> ResourceModel {
    ResourceModel {
        resource: descriptor.resource.clone(),
        path_segment: descriptor
            .path
            .clone()
            .unwrap_or_else(|| to_snake_case(&descriptor.resource)),
        schema_name: descriptor.schema.clone(),
        table_name: descriptor.table.clone(),
        key_column: descriptor.key.clone(),
        key_type: descriptor.key_type,
        columns: descriptor.columns.clone(),
        validation: descriptor.validation.clone(),
    }
}
