use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

/// Typed field values. Scalars keep their JSON type; documents never nest.
///
/// Serialized untagged, so a [`Document`] round-trips as the flat JSON
/// object the store holds.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum FieldValue {
    Text(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
    Null,
}

impl FieldValue {
    /// Convert a JSON [`Value`] to a typed field value.
    /// Arrays and objects are flattened to their JSON text.
    pub fn from_json(v: &Value) -> FieldValue {
        match v {
            Value::String(s) => FieldValue::Text(s.clone()),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    FieldValue::Integer(i)
                } else if let Some(f) = n.as_f64() {
                    FieldValue::Float(f)
                } else {
                    // Fallback: render as text
                    FieldValue::Text(n.to_string())
                }
            }
            Value::Bool(b) => FieldValue::Boolean(*b),
            Value::Null => FieldValue::Null,
            other => FieldValue::Text(other.to_string()),
        }
    }

    /// Extract as string, returning None for everything else.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            FieldValue::Integer(i) => Some(*i),
            _ => None,
        }
    }

    fn to_json(&self) -> Value {
        match self {
            FieldValue::Text(s) => Value::String(s.clone()),
            FieldValue::Integer(i) => Value::Number((*i).into()),
            FieldValue::Float(f) => Number::from_f64(*f).map_or(Value::Null, Value::Number),
            FieldValue::Boolean(b) => Value::Bool(*b),
            FieldValue::Null => Value::Null,
        }
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::Text(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::Text(s)
    }
}

impl From<i64> for FieldValue {
    fn from(i: i64) -> Self {
        FieldValue::Integer(i)
    }
}

/// A document is a flat key-value map. Key order is insertion order and
/// survives serialization, so merged output reads the way it was built.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct Document {
    fields: IndexMap<String, FieldValue>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from a JSON object, flattening nested values to text.
    /// Returns None when the value is not an object.
    pub fn from_json_object(value: &Value) -> Option<Self> {
        let obj = value.as_object()?;
        let mut doc = Document::new();
        for (k, v) in obj {
            doc.insert(k.clone(), FieldValue::from_json(v));
        }
        Some(doc)
    }

    pub fn to_json(&self) -> Value {
        let mut obj = Map::with_capacity(self.fields.len());
        for (k, v) in &self.fields {
            obj.insert(k.clone(), v.to_json());
        }
        Value::Object(obj)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<FieldValue>) {
        self.fields.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.fields.get(key)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.fields.get(key).and_then(FieldValue::as_str)
    }

    pub fn get_i64(&self, key: &str) -> Option<i64> {
        self.fields.get(key).and_then(FieldValue::as_i64)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    pub fn remove(&mut self, key: &str) -> Option<FieldValue> {
        self.fields.shift_remove(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_json_scalar_mapping() {
        assert_eq!(FieldValue::from_json(&json!("x")), FieldValue::Text("x".into()));
        assert_eq!(FieldValue::from_json(&json!(42)), FieldValue::Integer(42));
        assert_eq!(FieldValue::from_json(&json!(1.5)), FieldValue::Float(1.5));
        assert_eq!(FieldValue::from_json(&json!(true)), FieldValue::Boolean(true));
        assert_eq!(FieldValue::from_json(&json!(null)), FieldValue::Null);
        // Arrays and objects flatten to their JSON text
        assert_eq!(FieldValue::from_json(&json!([1, 2])), FieldValue::Text("[1,2]".into()));
    }

    #[test]
    fn test_document_serializes_flat() {
        let mut doc = Document::new();
        doc.insert("owner", "jdoe");
        doc.insert("state", 2i64);
        doc.insert("timestamp", 1483228800000i64);
        let json = serde_json::to_value(&doc).unwrap();
        assert_eq!(json, json!({"owner": "jdoe", "state": 2, "timestamp": 1483228800000i64}));
    }

    #[test]
    fn test_from_json_object_rejects_non_objects() {
        assert!(Document::from_json_object(&json!([1, 2])).is_none());
        assert!(Document::from_json_object(&json!("flat")).is_none());
        let doc = Document::from_json_object(&json!({"k": 1})).unwrap();
        assert_eq!(doc.get_i64("k"), Some(1));
    }
}
