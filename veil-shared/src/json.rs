//! Building object graphs from JSON fixtures

use crate::object::ObjectRef;
use crate::value::Value;
use serde_json::Value as Json;

impl Value {
    /// Deep-convert a JSON document into fresh objects and arrays
    pub fn from_json(json: &Json) -> Value {
        match json {
            Json::Null => Value::Null,
            Json::Bool(b) => Value::Bool(*b),
            Json::Number(n) => Value::Number(n.as_f64().unwrap_or(f64::NAN)),
            Json::String(s) => Value::from(s.as_str()),
            Json::Array(items) => Value::array(items.iter().map(Value::from_json).collect()),
            Json::Object(map) => Value::Object(ObjectRef::from_entries(
                map.iter().map(|(k, v)| (k.as_str(), Value::from_json(v))),
            )),
        }
    }
}

impl From<&Json> for Value {
    fn from(json: &Json) -> Self {
        Value::from_json(json)
    }
}
