//! Raw event bodies as they come off the bus.

use serde_json::{Map, Value};

use crate::error::FunnelError;

/// A raw event body: parsed JSON, guaranteed to be an object.
#[derive(Debug, Clone)]
pub struct RawEvent {
    body: Map<String, Value>,
}

impl RawEvent {
    pub fn parse(raw: &str) -> Result<Self, FunnelError> {
        let value: Value = serde_json::from_str(raw)
            .map_err(|e| FunnelError::InvalidMessage(format!("invalid JSON: {}", e)))?;
        Self::from_value(value)
    }

    pub fn from_value(value: Value) -> Result<Self, FunnelError> {
        match value {
            Value::Object(body) => Ok(Self { body }),
            other => Err(FunnelError::InvalidMessage(format!(
                "event body must be a JSON object, got {}",
                type_name(&other)
            ))),
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.body.get(key)
    }

    /// The object under `key`, when present and actually an object.
    pub fn nested_object(&self, key: &str) -> Option<&Map<String, Value>> {
        self.body.get(key).and_then(Value::as_object)
    }

    pub fn as_object(&self) -> &Map<String, Value> {
        &self.body
    }
}

fn type_name(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
