//! Lead payload
//!
//! A [`Payload`] is the remote-visible part of a lead: an ordered mapping of
//! sheet column names to JSON values. The sync engine treats it as opaque;
//! only the capture use case knows which keys exist.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::errors::DomainError;

/// Ordered mapping of named fields sent to the remote endpoint
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Payload(Map<String, Value>);

impl Payload {
    /// Creates an empty payload
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts (or replaces) a field, keeping first-insertion order
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(key.into(), value.into());
    }

    /// Builder-style variant of [`insert`](Payload::insert)
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Returns the field as a string slice if it holds a JSON string
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.0.keys()
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Converts the payload into a JSON object value
    pub fn to_value(&self) -> Value {
        Value::Object(self.0.clone())
    }
}

impl From<Map<String, Value>> for Payload {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl TryFrom<Value> for Payload {
    type Error = DomainError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            other => Err(DomainError::ValidationFailed(format!(
                "payload must be a JSON object, got {}",
                json_kind(&other)
            ))),
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_insertion_order_is_preserved() {
        let payload = Payload::new()
            .with("timestamp", "2026-10-19T10:00:00Z")
            .with("fullName", "Asha")
            .with("email", "a@x.com");

        let keys: Vec<_> = payload.keys().cloned().collect();
        assert_eq!(keys, vec!["timestamp", "fullName", "email"]);
        assert_eq!(
            serde_json::to_string(&payload).unwrap(),
            r#"{"timestamp":"2026-10-19T10:00:00Z","fullName":"Asha","email":"a@x.com"}"#
        );
    }

    #[test]
    fn test_get_str() {
        let payload = Payload::new().with("fullName", "Asha").with("count", 3);
        assert_eq!(payload.get_str("fullName"), Some("Asha"));
        assert_eq!(payload.get_str("count"), None);
        assert_eq!(payload.get("count"), Some(&json!(3)));
        assert!(payload.get("missing").is_none());
    }

    #[test]
    fn test_try_from_value() {
        let payload = Payload::try_from(json!({"name": "Asha", "email": "a@x.com"})).unwrap();
        assert_eq!(payload.len(), 2);
        assert_eq!(payload.to_value(), json!({"name": "Asha", "email": "a@x.com"}));

        let err = Payload::try_from(json!([1, 2])).unwrap_err();
        assert_eq!(
            err,
            DomainError::ValidationFailed("payload must be a JSON object, got array".to_string())
        );
    }
}
