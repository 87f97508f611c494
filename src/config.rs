//! Start-up settings for the formatter component.

use serde::Deserialize;

/// Binds a model entity to the template element its rows populate.
#[derive(Debug, Clone, Deserialize)]
pub struct EntityPathSetting {
    pub entity_id: String,
    pub path: String,
}

/// Binds a model attribute to the element or attribute its value is written
/// into. Paths are evaluated relative to the owning entity's anchor element,
/// or against the whole document when the attribute is global.
#[derive(Debug, Clone, Deserialize)]
pub struct AttributePathSetting {
    pub attribute_id: String,
    pub path: String,
}

/// Lifetime of the per-entity "anchor already populated in place" flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RepeatScope {
    /// Flags reset at the start of every message, so each rendered document
    /// populates its anchors in place before cloning repeats.
    #[default]
    PerMessage,
    /// Flags persist for the life of the component: only the very first
    /// message populates anchors in place, every later row clones.
    ComponentLifetime,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FormatterSettings {
    /// The XML document to populate, parsed once at start-up.
    pub template: String,
    /// When true (the default) template namespaces are stripped around path
    /// evaluation so expressions can be written without prefixes.
    pub ignore_namespace: bool,
    pub entity_paths: Vec<EntityPathSetting>,
    pub attribute_paths: Vec<AttributePathSetting>,
    pub repeat_scope: RepeatScope,
}

impl Default for FormatterSettings {
    fn default() -> Self {
        FormatterSettings {
            template: String::new(),
            ignore_namespace: true,
            entity_paths: vec![],
            attribute_paths: vec![],
            repeat_scope: RepeatScope::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn settings_deserialize_with_defaults() {
        let settings: FormatterSettings = serde_json::from_str(
            r#"{
                "template": "<Order/>",
                "entity_paths": [{"entity_id": "item", "path": "/Order/Item"}],
                "attribute_paths": [{"attribute_id": "sku", "path": "@sku"}]
            }"#,
        )
        .unwrap();
        assert!(settings.ignore_namespace);
        assert_eq!(settings.repeat_scope, RepeatScope::PerMessage);
        assert_eq!(settings.entity_paths.len(), 1);
        assert_eq!(settings.attribute_paths[0].attribute_id, "sku");
    }

    #[test]
    fn repeat_scope_parses_snake_case() {
        let settings: FormatterSettings =
            serde_json::from_str(r#"{"repeat_scope": "component_lifetime"}"#).unwrap();
        assert_eq!(settings.repeat_scope, RepeatScope::ComponentLifetime);
    }
}
