//! Shared fixtures for the formatter integration tests.

use serde_json::Value;
use xmlflow::{
    AttributePathSetting, EntityData, EntityPathSetting, FormatterSettings, Message, Model,
    ModelAttribute, RepeatScope,
};

pub fn init_logs() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// The Order/Item model: `a-sku` and `a-qty` belong to the `item` entity,
/// `a-status` to the `order` entity.
pub fn order_model() -> Model {
    Model {
        attributes: vec![
            ModelAttribute {
                id: "a-sku".to_string(),
                entity_id: "item".to_string(),
                name: "sku".to_string(),
            },
            ModelAttribute {
                id: "a-qty".to_string(),
                entity_id: "item".to_string(),
                name: "qty".to_string(),
            },
            ModelAttribute {
                id: "a-status".to_string(),
                entity_id: "order".to_string(),
                name: "status".to_string(),
            },
        ],
    }
}

pub fn order_settings(template: &str, item_path: &str, scope: RepeatScope) -> FormatterSettings {
    FormatterSettings {
        template: template.to_string(),
        repeat_scope: scope,
        entity_paths: vec![EntityPathSetting {
            entity_id: "item".to_string(),
            path: item_path.to_string(),
        }],
        attribute_paths: vec![
            AttributePathSetting {
                attribute_id: "a-sku".to_string(),
                path: "@sku".to_string(),
            },
            AttributePathSetting {
                attribute_id: "a-qty".to_string(),
                path: "@qty".to_string(),
            },
        ],
        ..FormatterSettings::default()
    }
}

pub fn row(pairs: &[(&str, &str)]) -> EntityData {
    let mut row = EntityData::new();
    for (id, value) in pairs {
        row.set(*id, Value::String(value.to_string()));
    }
    row
}

pub fn message(sequence_number: u64, rows: Vec<EntityData>, end_of_stream: bool) -> Message {
    Message {
        sequence_number,
        rows,
        end_of_stream,
    }
}

/// Strips the pretty-printer's indentation so assertions compare markup.
pub fn squish(s: &str) -> String {
    s.lines().map(str::trim).collect()
}
