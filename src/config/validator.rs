//! Descriptor validation: naming consistency and rule sanity, checked once at boot.

use crate::actions::ActionKind;
use crate::config::ActionDescriptor;
use crate::error::ConfigError;
use regex::Regex;
use std::path::Path;

fn is_identifier(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn is_path_segment(s: &str) -> bool {
    !s.is_empty()
        && s
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' || c == '-')
}

pub fn validate_descriptor(
    descriptor: &ActionDescriptor,
    resource: &str,
    kind: ActionKind,
    path: &Path,
) -> Result<(), ConfigError> {
    let invalid = |message: String| ConfigError::InvalidDescriptor {
        path: path.to_path_buf(),
        message,
    };

    if descriptor.resource != resource {
        return Err(invalid(format!(
            "resource '{}' does not match directory '{}'",
            descriptor.resource, resource
        )));
    }
    if descriptor.action != kind {
        return Err(invalid(format!(
            "action '{}' does not match file name ({})",
            descriptor.action, kind
        )));
    }
    if !is_identifier(&descriptor.table) {
        return Err(invalid(format!("invalid table name '{}'", descriptor.table)));
    }
    if let Some(schema) = &descriptor.schema {
        if !is_identifier(schema) {
            return Err(invalid(format!("invalid schema name '{}'", schema)));
        }
    }
    if !is_identifier(&descriptor.key) {
        return Err(invalid(format!("invalid key column '{}'", descriptor.key)));
    }
    if let Some(segment) = &descriptor.path {
        if !is_path_segment(segment) {
            return Err(invalid(format!("invalid path segment '{}'", segment)));
        }
    }
    for column in &descriptor.columns {
        if !is_identifier(column) {
            return Err(invalid(format!("invalid column name '{}'", column)));
        }
    }
    for (column, rule) in &descriptor.validation {
        if let Some(pattern) = &rule.pattern {
            Regex::new(pattern).map_err(|e| invalid(format!("invalid pattern for {}: {}", column, e)))?;
        }
    }
    Ok(())
}
