//! Start-up binding of configured path expressions to template locations.
//!
//! Runs exactly once. Entity paths are resolved against the template to find
//! each entity's anchor element; attribute paths are compiled and partitioned
//! into entity-owned bindings (applied per repeating row) and globals
//! (applied once per document).

use crate::config::FormatterSettings;
use crate::error::FormatterError;
use crate::model::Model;
use log::{debug, warn};
use std::collections::HashMap;
use xmlflow_dom::{Document, NodeId};
use xmlflow_xpath::{CompiledPath, NodeKind, TreeNode};

#[derive(Debug)]
pub struct AttributeBinding {
    pub attribute_id: String,
    pub path: CompiledPath,
}

#[derive(Debug)]
pub struct EntityBinding {
    pub entity_id: String,
    pub path: CompiledPath,
    /// The first matched element in the template, used as the cloning
    /// source for repeat rows.
    pub template_element: NodeId,
    pub attributes: Vec<AttributeBinding>,
}

/// The static binding table. Entities keep their declaration order, which
/// fixes the sibling order of output when several entities share a parent.
#[derive(Debug, Default)]
pub struct Bindings {
    pub entities: Vec<EntityBinding>,
    by_entity_id: HashMap<String, usize>,
    pub globals: Vec<AttributeBinding>,
}

impl Bindings {
    pub fn entity_index(&self, entity_id: &str) -> Option<usize> {
        self.by_entity_id.get(entity_id).copied()
    }

    /// Resolves all configured paths against the parsed template. Compile
    /// failures are fatal; zero-match entity paths are warnings and leave
    /// that entity unbound, demoting its attributes to globals.
    pub fn bind(
        template: &mut Document,
        settings: &FormatterSettings,
        model: &Model,
    ) -> Result<Bindings, FormatterError> {
        let mut bindings = Bindings::default();

        let removed = settings
            .ignore_namespace
            .then(|| template.strip_namespaces());

        for setting in &settings.entity_paths {
            let path = CompiledPath::compile(&setting.path)?;
            let anchor = first_element(template, &path)?;
            match anchor {
                Some(template_element) => {
                    bindings
                        .by_entity_id
                        .insert(setting.entity_id.clone(), bindings.entities.len());
                    bindings.entities.push(EntityBinding {
                        entity_id: setting.entity_id.clone(),
                        path,
                        template_element,
                        attributes: vec![],
                    });
                }
                None => warn!(
                    "entity path '{}' for entity '{}' matched nothing in the template",
                    setting.path, setting.entity_id
                ),
            }
        }

        if let Some(removed) = &removed {
            template.restore_namespaces(removed);
        }

        for setting in &settings.attribute_paths {
            let path = CompiledPath::compile(&setting.path)?;
            let binding = AttributeBinding {
                attribute_id: setting.attribute_id.clone(),
                path,
            };
            let owner = model
                .entity_of(&setting.attribute_id)
                .and_then(|entity_id| bindings.entity_index(entity_id));
            match owner {
                Some(index) => bindings.entities[index].attributes.push(binding),
                None => bindings.globals.push(binding),
            }
        }

        debug!(
            "bound {} entities and {} global attribute paths",
            bindings.entities.len(),
            bindings.globals.len()
        );
        Ok(bindings)
    }
}

/// The first element node a path matches, in document order.
pub(crate) fn first_element(
    doc: &Document,
    path: &CompiledPath,
) -> Result<Option<NodeId>, FormatterError> {
    let matches = path.matches(doc.root_element_ref())?;
    Ok(matches
        .into_iter()
        .find(|m| m.kind() == NodeKind::Element)
        .map(|m| m.id()))
}
