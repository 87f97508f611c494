//! The slice of model metadata the formatter needs: which entity owns each
//! attribute id. The full model lives with the host platform.

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct ModelAttribute {
    pub id: String,
    pub entity_id: String,
    pub name: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Model {
    pub attributes: Vec<ModelAttribute>,
}

impl Model {
    pub fn attribute_by_id(&self, id: &str) -> Option<&ModelAttribute> {
        self.attributes.iter().find(|a| a.id == id)
    }

    /// The owning entity of an attribute id, or `None` when the id is not
    /// part of this model.
    pub fn entity_of(&self, attribute_id: &str) -> Option<&str> {
        self.attribute_by_id(attribute_id)
            .map(|a| a.entity_id.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attribute_lookup() {
        let model = Model {
            attributes: vec![ModelAttribute {
                id: "a1".to_string(),
                entity_id: "item".to_string(),
                name: "sku".to_string(),
            }],
        };
        assert_eq!(model.entity_of("a1"), Some("item"));
        assert_eq!(model.entity_of("missing"), None);
    }
}
