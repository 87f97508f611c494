//! The pipeline message envelopes the component exchanges with its host.

use serde_json::Value;
use std::collections::HashMap;

/// One flat row: attribute id to nullable scalar value.
#[derive(Debug, Clone, Default)]
pub struct EntityData(pub HashMap<String, Value>);

impl EntityData {
    pub fn new() -> Self {
        EntityData(HashMap::new())
    }

    pub fn set(&mut self, attribute_id: impl Into<String>, value: Value) -> &mut Self {
        self.0.insert(attribute_id.into(), value);
        self
    }

    /// Distinguishes three states per attribute id:
    /// `None` = not present in the row (leave the target untouched),
    /// `Some(None)` = present but null (clear the target),
    /// `Some(Some(text))` = present with a value.
    pub fn value(&self, attribute_id: &str) -> Option<Option<String>> {
        let value = self.0.get(attribute_id)?;
        Some(match value {
            Value::Null => None,
            Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        })
    }

    pub fn attribute_ids(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }
}

/// An inbound batch of rows.
#[derive(Debug, Clone)]
pub struct Message {
    pub sequence_number: u64,
    pub rows: Vec<EntityData>,
    pub end_of_stream: bool,
}

/// An outbound rendered document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextMessage {
    pub sequence_number: u64,
    pub payload: String,
    pub end_of_stream: bool,
}

/// Where the component sends its output. The host runtime provides the real
/// sink; tests collect into a `Vec`.
pub trait MessageTarget {
    fn send(&mut self, message: TextMessage);
}

impl MessageTarget for Vec<TextMessage> {
    fn send(&mut self, message: TextMessage) {
        self.push(message);
    }
}

/// Inbound/outbound counters owned by the host, incremented by the adapter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ComponentStatistics {
    pub messages_received: u64,
    pub messages_emitted: u64,
}
