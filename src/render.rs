//! Per-message rendering: clone the template, write row values into it,
//! grow repeating groups, serialize.
//!
//! The template is never mutated here. Each render works on an independent
//! clone, and repeat rows are staged in a second scratch clone before being
//! copied across, so state from one message can never leak into the next.

use crate::binder::{AttributeBinding, Bindings, EntityBinding};
use crate::config::FormatterSettings;
use crate::error::FormatterError;
use crate::message::EntityData;
use crate::model::Model;
use log::warn;
use std::collections::BTreeSet;
use xmlflow_dom::{Document, NodeId};
use xmlflow_xpath::{NodeKind, TreeNode};

/// An entity's anchor location re-resolved inside the working clone.
struct Anchor {
    element: NodeId,
    parent: NodeId,
}

pub struct RenderPass<'a> {
    template: &'a Document,
    bindings: &'a Bindings,
    settings: &'a FormatterSettings,
    model: &'a Model,
}

impl<'a> RenderPass<'a> {
    pub fn new(
        template: &'a Document,
        bindings: &'a Bindings,
        settings: &'a FormatterSettings,
        model: &'a Model,
    ) -> Self {
        RenderPass {
            template,
            bindings,
            settings,
            model,
        }
    }

    /// Renders one batch of rows into a serialized document.
    ///
    /// `applied` holds one flag per entity binding; a set flag means the
    /// entity's anchor has already been populated in place, so further rows
    /// for it clone a fresh copy instead. The caller owns the flags and
    /// decides their lifetime.
    pub fn render(
        &self,
        rows: &[EntityData],
        applied: &mut [bool],
    ) -> Result<String, FormatterError> {
        let mut working = self.template.clone();
        let root_namespace = working.namespace(working.root_element()).cloned();
        let removed = self
            .settings
            .ignore_namespace
            .then(|| working.strip_namespaces());

        let anchors = self.resolve_anchors(&working)?;

        // Cloning preserves node ids, so each binding's template_element
        // addresses the same subtree in this scratch arena. Repeat rows are
        // staged here and copied into the working tree once populated.
        let mut scratch = self.template.clone();

        for row in rows {
            self.apply_globals(&mut working, row)?;
            for index in self.relevant_entities(row) {
                let binding = &self.bindings.entities[index];
                let anchor = &anchors[index];
                if !applied[index] {
                    self.apply_attributes(&mut working, anchor.element, &binding.attributes, row)?;
                    applied[index] = true;
                } else {
                    self.append_repeat(&mut working, &mut scratch, binding, anchor, row)?;
                }
            }
        }

        if let Some(removed) = &removed {
            working.restore_namespaces(removed);
        }
        // the root must keep its declared namespace even after repeated
        // strip/restore cycles
        working.set_namespace(working.root_element(), root_namespace);

        working
            .to_string_pretty()
            .map_err(|e| FormatterError::Render(e.to_string()))
    }

    /// Finds each entity's anchor element in the working clone. The clone
    /// has its own node ids, so the startup binding cannot be reused
    /// directly. A bound path that no longer matches means the document no
    /// longer agrees with its bindings, which is fatal for this message.
    fn resolve_anchors(&self, working: &Document) -> Result<Vec<Anchor>, FormatterError> {
        let mut anchors = Vec::with_capacity(self.bindings.entities.len());
        for binding in &self.bindings.entities {
            let mut anchor = None;
            for m in binding.path.matches(working.root_element_ref())? {
                if m.kind() == NodeKind::Element {
                    anchor = Some(m.id());
                }
            }
            let element = anchor.ok_or_else(|| {
                FormatterError::Render(format!(
                    "entity path '{}' no longer matches the working document",
                    binding.path.source()
                ))
            })?;
            let parent = working.parent(element).ok_or_else(|| {
                FormatterError::Render(format!(
                    "anchor for entity '{}' has no parent",
                    binding.entity_id
                ))
            })?;
            anchors.push(Anchor { element, parent });
        }
        Ok(anchors)
    }

    fn apply_globals(
        &self,
        working: &mut Document,
        row: &EntityData,
    ) -> Result<(), FormatterError> {
        for global in &self.bindings.globals {
            let Some(value) = row.value(&global.attribute_id) else {
                continue;
            };
            let targets = matched_targets(working, working.root_element(), global)?;
            if targets.is_empty() {
                warn!(
                    "attribute path '{}' matched nothing in the document",
                    global.path.source()
                );
            }
            for (id, kind) in targets {
                write_value(working, id, kind, value.as_deref());
            }
        }
        Ok(())
    }

    /// Writes a row's values through an entity's attribute bindings,
    /// evaluated relative to `context`. Absent attributes leave their
    /// targets untouched; explicit nulls clear them.
    fn apply_attributes(
        &self,
        doc: &mut Document,
        context: NodeId,
        attributes: &[AttributeBinding],
        row: &EntityData,
    ) -> Result<(), FormatterError> {
        for attribute in attributes {
            let Some(value) = row.value(&attribute.attribute_id) else {
                continue;
            };
            let targets = matched_targets(doc, context, attribute)?;
            if targets.is_empty() {
                warn!(
                    "attribute path '{}' matched nothing under its entity anchor",
                    attribute.path.source()
                );
            }
            for (id, kind) in targets {
                write_value(doc, id, kind, value.as_deref());
            }
        }
        Ok(())
    }

    /// A repeat occurrence: populate the entity's subtree in the scratch
    /// clone, then copy it into the working tree after the anchor. Values
    /// the row does not carry keep whatever the previous repeat wrote, which
    /// is the behavior templates with partially-filled rows rely on.
    fn append_repeat(
        &self,
        working: &mut Document,
        scratch: &mut Document,
        binding: &EntityBinding,
        anchor: &Anchor,
        row: &EntityData,
    ) -> Result<(), FormatterError> {
        if anchor.parent == working.root() {
            return Err(FormatterError::Render(format!(
                "entity '{}' is anchored at the document element and cannot repeat",
                binding.entity_id
            )));
        }

        let removed = self
            .settings
            .ignore_namespace
            .then(|| scratch.strip_namespaces());
        self.apply_attributes(scratch, binding.template_element, &binding.attributes, row)?;
        if let Some(removed) = &removed {
            scratch.restore_namespaces(removed);
        }

        let copied = working.copy_subtree_from(scratch, binding.template_element);
        working.append_child(anchor.parent, copied);
        Ok(())
    }

    /// Entity bindings this row carries values for, in declaration order.
    fn relevant_entities(&self, row: &EntityData) -> BTreeSet<usize> {
        let mut relevant = BTreeSet::new();
        for attribute_id in row.attribute_ids() {
            if let Some(index) = self
                .model
                .entity_of(attribute_id)
                .and_then(|entity_id| self.bindings.entity_index(entity_id))
            {
                relevant.insert(index);
            }
        }
        relevant
    }
}

/// Evaluates a binding's path and returns the matched node ids with their
/// kinds, so writes can happen after the evaluation borrow ends.
fn matched_targets(
    doc: &Document,
    context: NodeId,
    binding: &AttributeBinding,
) -> Result<Vec<(NodeId, NodeKind)>, FormatterError> {
    Ok(binding
        .path
        .matches(doc.node_ref(context))?
        .into_iter()
        .map(|m| (m.id(), m.kind()))
        .collect())
}

/// The write operation is selected by the matched node's kind: element
/// matches replace text content, attribute matches replace the value.
fn write_value(doc: &mut Document, id: NodeId, kind: NodeKind, value: Option<&str>) {
    match kind {
        NodeKind::Element => doc.set_element_text(id, value),
        NodeKind::Attribute => doc.set_attribute_value(id, value),
        _ => {}
    }
}
