//! Release values: parsing YAML overrides and deep merging

use serde_json::{Map, Value};

use crate::error::{BackendError, BackendResult};

/// Parse a raw YAML document into a values object
///
/// An empty document yields an empty object. Anything other than a mapping
/// at the top level is rejected.
pub fn parse(raw: &str) -> BackendResult<Value> {
    if raw.trim().is_empty() {
        return Ok(Value::Object(Map::new()));
    }

    let yaml: serde_yaml::Value = serde_yaml::from_str(raw)
        .map_err(|e| BackendError::InvalidRequest(format!("invalid values: {}", e)))?;

    match serde_json::to_value(yaml) {
        Ok(Value::Null) => Ok(Value::Object(Map::new())),
        Ok(value @ Value::Object(_)) => Ok(value),
        Ok(_) => Err(BackendError::InvalidRequest(
            "invalid values: expected a mapping at the top level".to_string(),
        )),
        Err(e) => Err(BackendError::InvalidRequest(format!("invalid values: {}", e))),
    }
}

/// Deep merge `overlay` into `base`; objects merge key by key, anything else is replaced
pub fn merge(base: &mut Value, overlay: &Value) {
    match (base, overlay) {
        (Value::Object(base_map), Value::Object(overlay_map)) => {
            for (key, overlay_value) in overlay_map {
                match base_map.get_mut(key) {
                    Some(base_value) => merge(base_value, overlay_value),
                    None => {
                        base_map.insert(key.clone(), overlay_value.clone());
                    }
                }
            }
        }
        (base, overlay) => {
            *base = overlay.clone();
        }
    }
}

/// Whether a values object carries no overrides
pub fn is_empty(values: &Value) -> bool {
    match values {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        _ => false,
    }
}
