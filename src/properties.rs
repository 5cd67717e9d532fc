//! Typed accessors over the HMC's free-form JSON property bags.
//!
//! HMC resources are fundamentally dynamic property dictionaries keyed
//! by server-defined names (`"object-uri"`, `"next-activation-profile-name"`, ...).
//! Rather than re-deriving a free-form dictionary type, this module
//! layers typed, fallible accessors on top of `serde_json::Map`, so
//! call sites get `Result` instead of panics on a type mismatch while
//! the raw map stays available for pass-through.

use crate::error::HmcError;

/// A sparse or full HMC property bag.
pub type Properties = serde_json::Map<String, serde_json::Value>;

/// Typed, fallible accessors over [`Properties`].
pub trait PropertiesExt {
    fn get_str(&self, key: &str) -> Result<&str, HmcError>;
    fn get_i64(&self, key: &str) -> Result<i64, HmcError>;
    fn get_f64(&self, key: &str) -> Result<f64, HmcError>;
    fn get_bool(&self, key: &str) -> Result<bool, HmcError>;
    fn get_array(&self, key: &str) -> Result<&Vec<serde_json::Value>, HmcError>;
    fn get_object(&self, key: &str) -> Result<&Properties, HmcError>;
}

fn missing(key: &str) -> HmcError {
    HmcError::ConsistencyError(format!("property {key:?} is not present"))
}

fn wrong_type(key: &str, expected: &str, value: &serde_json::Value) -> HmcError {
    HmcError::ConsistencyError(format!(
        "property {key:?} expected to be {expected}, found {value:?}"
    ))
}

impl PropertiesExt for Properties {
    fn get_str(&self, key: &str) -> Result<&str, HmcError> {
        let value = self.get(key).ok_or_else(|| missing(key))?;
        value.as_str().ok_or_else(|| wrong_type(key, "a string", value))
    }

    fn get_i64(&self, key: &str) -> Result<i64, HmcError> {
        let value = self.get(key).ok_or_else(|| missing(key))?;
        value.as_i64().ok_or_else(|| wrong_type(key, "an integer", value))
    }

    fn get_f64(&self, key: &str) -> Result<f64, HmcError> {
        let value = self.get(key).ok_or_else(|| missing(key))?;
        value.as_f64().ok_or_else(|| wrong_type(key, "a float", value))
    }

    fn get_bool(&self, key: &str) -> Result<bool, HmcError> {
        let value = self.get(key).ok_or_else(|| missing(key))?;
        value.as_bool().ok_or_else(|| wrong_type(key, "a bool", value))
    }

    fn get_array(&self, key: &str) -> Result<&Vec<serde_json::Value>, HmcError> {
        let value = self.get(key).ok_or_else(|| missing(key))?;
        value.as_array().ok_or_else(|| wrong_type(key, "an array", value))
    }

    fn get_object(&self, key: &str) -> Result<&Properties, HmcError> {
        let value = self.get(key).ok_or_else(|| missing(key))?;
        value.as_object().ok_or_else(|| wrong_type(key, "an object", value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn props() -> Properties {
        json!({
            "name": "CPC1",
            "count": 3,
            "ratio": 1.5,
            "enabled": true,
            "tags": ["a", "b"],
            "nested": {"x": 1},
        })
        .as_object()
        .cloned()
        .unwrap_or_default()
    }

    #[test]
    fn typed_accessors_succeed() {
        let p = props();
        assert_eq!(p.get_str("name").unwrap(), "CPC1");
        assert_eq!(p.get_i64("count").unwrap(), 3);
        assert!((p.get_f64("ratio").unwrap() - 1.5).abs() < f64::EPSILON);
        assert!(p.get_bool("enabled").unwrap());
        assert_eq!(p.get_array("tags").unwrap().len(), 2);
        assert_eq!(p.get_object("nested").unwrap().get_i64("x").unwrap(), 1);
    }

    #[test]
    fn missing_and_wrong_type_are_distinguishable() {
        let p = props();
        assert!(matches!(p.get_str("nope"), Err(HmcError::ConsistencyError(_))));
        assert!(matches!(p.get_str("count"), Err(HmcError::ConsistencyError(_))));
    }
}
