//! Template data and outbound message types.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::Serialize;

/// Key-value data handed to the template renderer.
///
/// Keys are unique; inserting an existing key replaces its value.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct RenderModel {
    values: BTreeMap<String, serde_json::Value>,
}

impl RenderModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a value.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) {
        self.values.insert(key.into(), value.into());
    }

    /// Builder-style [`insert`](Self::insert).
    pub fn with(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
        self.values.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// The single file attached to an outbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageAttachment {
    /// Name shown to the recipient.
    pub file_name: String,
    /// File read when the message is composed.
    pub path: PathBuf,
    /// MIME type, e.g. `application/zip`.
    pub content_type: String,
}

/// A fully composed message, ready for a mail transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMessage {
    pub from: String,
    pub to: String,
    pub subject: String,
    /// Rendered HTML body.
    pub html_body: String,
    pub attachment: MessageAttachment,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_replaces_existing_key() {
        let mut model = RenderModel::new().with("to", "a@example.com");
        model.insert("to", "b@example.com");
        assert_eq!(model.len(), 1);
        assert_eq!(model.get("to").and_then(|v| v.as_str()), Some("b@example.com"));
    }

    #[test]
    fn test_serializes_as_flat_map() {
        let model = RenderModel::new().with("to", "a@example.com").with("count", 2);
        let json = serde_json::to_value(&model).unwrap();
        assert_eq!(json, serde_json::json!({"to": "a@example.com", "count": 2}));
    }
}
