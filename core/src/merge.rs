//! Structural deep merge of configuration values.
//!
//! For every key of the override: when both sides hold objects they are
//! merged recursively, otherwise the override value replaces the base value
//! wholesale. Arrays are never concatenated. Keys only present in the base are
//! kept. Both inputs are left untouched; the result is a fresh value.

use serde_json::{Map, Value};

use crate::config::RequestConfig;
use crate::error::{ClientError, Result};

/// Merge two JSON objects. Fails with `InvalidConfig` unless both are objects.
pub fn merge(base: &Value, overrides: &Value) -> Result<Value> {
    match (base, overrides) {
        (Value::Object(base), Value::Object(overrides)) => {
            Ok(Value::Object(merge_objects(base, overrides)))
        }
        (Value::Object(_), other) => Err(ClientError::invalid_config(format!(
            "override must be a JSON object, got {other}"
        ))),
        (other, _) => Err(ClientError::invalid_config(format!(
            "base must be a JSON object, got {other}"
        ))),
    }
}

fn merge_objects(base: &Map<String, Value>, overrides: &Map<String, Value>) -> Map<String, Value> {
    let mut merged = base.clone();
    for (key, value) in overrides {
        let next = match (merged.get(key), value) {
            (Some(Value::Object(inner)), Value::Object(over)) => {
                Value::Object(merge_objects(inner, over))
            }
            _ => value.clone(),
        };
        merged.insert(key.clone(), next);
    }
    merged
}

/// Merge two configs through their JSON shape.
///
/// The override's cancellation handle wins when present, otherwise the base's
/// handle is carried over.
pub fn merge_config(base: &RequestConfig, overrides: &RequestConfig) -> Result<RequestConfig> {
    let merged = merge(&base.to_value()?, &overrides.to_value()?)?;
    let mut config = RequestConfig::from_value(merged)?;
    config.cancel = overrides.cancel.clone().or_else(|| base.cancel.clone());
    Ok(config)
}
