//! Body validation against the per-column rules of an action descriptor.

use crate::config::{ResourceModel, ValidationRule};
use crate::error::AppError;
use regex::Regex;
use serde_json::{Map, Value};
use std::collections::HashMap;

pub struct RequestValidator;

impl RequestValidator {
    /// Validate a full record (create). Every required column must be present and non-null.
    pub fn validate(body: &Map<String, Value>, rules: &HashMap<String, ValidationRule>) -> Result<(), AppError> {
        let mut columns: Vec<&String> = rules.keys().collect();
        columns.sort();
        for col in columns {
            let rule = &rules[col];
            let val = body.get(col.as_str());
            if rule.required == Some(true) && val.map_or(true, Value::is_null) {
                return Err(AppError::Validation(format!("{} is required", col)));
            }
            if let Some(v) = val {
                validate_field(col, v, rule)?;
            }
        }
        Ok(())
    }

    /// Validate only the columns present (update). Missing required columns are fine.
    pub fn validate_partial(
        body: &Map<String, Value>,
        rules: &HashMap<String, ValidationRule>,
    ) -> Result<(), AppError> {
        for (col, v) in body {
            if let Some(rule) = rules.get(col) {
                if rule.required == Some(true) && v.is_null() {
                    return Err(AppError::Validation(format!("{} cannot be null", col)));
                }
                validate_field(col, v, rule)?;
            }
        }
        Ok(())
    }

    /// Reject body columns outside the model's allow-list. The key column is always accepted.
    pub fn check_columns(body: &Map<String, Value>, model: &ResourceModel) -> Result<(), AppError> {
        match body
            .keys()
            .find(|col| **col != model.key_column && !model.allows_column(col))
        {
            Some(col) => Err(AppError::Validation(format!("unknown column {}", col))),
            None => Ok(()),
        }
    }

    /// `limit` and `offset` from a search query. Present but not a non-negative integer is a 400.
    pub fn paging(query: &HashMap<String, String>) -> Result<(Option<u32>, Option<u32>), AppError> {
        let parse = |name: &str| {
            query
                .get(name)
                .map(|raw| {
                    raw.trim()
                        .parse::<u32>()
                        .map_err(|_| AppError::BadRequest(format!("{} must be a non-negative integer, got '{}'", name, raw)))
                })
                .transpose()
        };
        Ok((parse("limit")?, parse("offset")?))
    }
}

fn validate_field(col: &str, v: &Value, rule: &ValidationRule) -> Result<(), AppError> {
    if v.is_null() {
        return Ok(());
    }
    if let Some(format) = &rule.format {
        validate_format(col, v, format)?;
    }
    if let Some(s) = v.as_str() {
        let len = s.chars().count();
        if let Some(max) = rule.max_length {
            if len > max as usize {
                return Err(AppError::Validation(format!("{} must be at most {} characters", col, max)));
            }
        }
        if let Some(min) = rule.min_length {
            if len < min as usize {
                return Err(AppError::Validation(format!("{} must be at least {} characters", col, min)));
            }
        }
        if let Some(pattern) = &rule.pattern {
            let re = Regex::new(pattern).map_err(|e| AppError::Internal(format!("pattern for {}: {}", col, e)))?;
            if !re.is_match(s) {
                return Err(AppError::Validation(format!("{} does not match required pattern", col)));
            }
        }
    }
    if let Some(allowed) = &rule.allowed {
        if !allowed.iter().any(|a| value_eq(v, a)) {
            return Err(AppError::Validation(format!(
                "{} must be one of: {:?}",
                col,
                allowed.iter().take(5).collect::<Vec<_>>()
            )));
        }
    }
    if let Some(n) = v.as_f64() {
        if let Some(min) = rule.minimum {
            if n < min {
                return Err(AppError::Validation(format!("{} must be at least {}", col, min)));
            }
        }
        if let Some(max) = rule.maximum {
            if n > max {
                return Err(AppError::Validation(format!("{} must be at most {}", col, max)));
            }
        }
    }
    Ok(())
}

fn value_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(n), Value::Number(m)) => n.as_f64() == m.as_f64(),
        _ => a == b,
    }
}

fn validate_format(col: &str, v: &Value, format: &str) -> Result<(), AppError> {
    let Some(s) = v.as_str() else {
        return Ok(());
    };
    match format.to_lowercase().as_str() {
        "email" => {
            let valid = s
                .split_once('@')
                .is_some_and(|(local, domain)| !local.is_empty() && !domain.is_empty());
            if !valid {
                return Err(AppError::Validation(format!("{} must be a valid email", col)));
            }
        }
        "uuid" => {
            if uuid::Uuid::parse_str(s).is_err() {
                return Err(AppError::Validation(format!("{} must be a valid UUID", col)));
            }
        }
        _ => {}
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn query(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn paging_must_be_numeric_when_present() {
        assert_eq!(RequestValidator::paging(&query(&[])).unwrap(), (None, None));
        assert_eq!(
            RequestValidator::paging(&query(&[("limit", "10"), ("offset", "20"), ("name", "x")])).unwrap(),
            (Some(10), Some(20))
        );
        assert!(matches!(
            RequestValidator::paging(&query(&[("limit", "abc")])),
            Err(AppError::BadRequest(_))
        ));
        assert!(matches!(
            RequestValidator::paging(&query(&[("offset", "-1")])),
            Err(AppError::BadRequest(_))
        ));
    }

    fn rules() -> HashMap<String, ValidationRule> {
        let mut rules = HashMap::new();
        rules.insert(
            "name".to_string(),
            ValidationRule {
                required: Some(true),
                max_length: Some(5),
                ..Default::default()
            },
        );
        rules.insert(
            "color".to_string(),
            ValidationRule {
                allowed: Some(vec![json!("red"), json!("blue")]),
                ..Default::default()
            },
        );
        rules.insert(
            "qty".to_string(),
            ValidationRule {
                minimum: Some(1.0),
                ..Default::default()
            },
        );
        rules
    }

    fn body(v: Value) -> Map<String, Value> {
        v.as_object().cloned().unwrap()
    }

    #[test]
    fn full_validation_requires_fields() {
        let err = RequestValidator::validate(&body(json!({ "color": "red" })), &rules()).unwrap_err();
        assert_eq!(err.to_string(), "validation: name is required");
        assert!(RequestValidator::validate(&body(json!({ "name": "bolt", "qty": 2 })), &rules()).is_ok());
    }

    #[test]
    fn partial_validation_checks_present_fields_only() {
        assert!(RequestValidator::validate_partial(&body(json!({ "color": "red" })), &rules()).is_ok());
        assert!(RequestValidator::validate_partial(&body(json!({ "color": "green" })), &rules()).is_err());
        assert!(RequestValidator::validate_partial(&body(json!({ "qty": 0 })), &rules()).is_err());
        assert!(RequestValidator::validate_partial(&body(json!({ "name": "toolong" })), &rules()).is_err());
    }

    #[test]
    fn formats() {
        let mut rules = HashMap::new();
        rules.insert(
            "email".to_string(),
            ValidationRule {
                format: Some("email".into()),
                ..Default::default()
            },
        );
        assert!(RequestValidator::validate(&body(json!({ "email": "a@b" })), &rules).is_ok());
        assert!(RequestValidator::validate(&body(json!({ "email": "@b" })), &rules).is_err());
    }

    #[test]
    fn column_allow_list() {
        let mut model = ResourceModel::for_resource("Widget");
        model.columns = vec!["name".into()];
        assert!(RequestValidator::check_columns(&body(json!({ "id": 1, "name": "x" })), &model).is_ok());
        assert!(RequestValidator::check_columns(&body(json!({ "secret": 1 })), &model).is_err());
    }
}
