//! Path-expression evaluation over the arena tree.
//!
//! `NodeRef` is the cheap handle the `xmlflow-xpath` engine navigates; it
//! borrows the document and carries a `NodeId`, so a match result converts
//! straight back into an arena id.

use crate::document::{Document, NodeId};
use std::cmp::Ordering;
use std::hash::{Hash, Hasher};
use xmlflow_xpath::{NodeKind, TreeNode};

/// A borrowed handle to one node of a [`Document`].
#[derive(Debug, Clone, Copy)]
pub struct NodeRef<'a> {
    doc: &'a Document,
    id: NodeId,
}

impl<'a> NodeRef<'a> {
    pub fn id(&self) -> NodeId {
        self.id
    }
}

impl PartialEq for NodeRef<'_> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.doc, other.doc) && self.id == other.id
    }
}
impl Eq for NodeRef<'_> {}
impl PartialOrd for NodeRef<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for NodeRef<'_> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.id.cmp(&other.id)
    }
}
impl Hash for NodeRef<'_> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl Document {
    /// A handle to an arbitrary node, for evaluation rooted anywhere.
    pub fn node_ref(&self, id: NodeId) -> NodeRef<'_> {
        NodeRef { doc: self, id }
    }

    /// A handle to the document element.
    pub fn root_element_ref(&self) -> NodeRef<'_> {
        self.node_ref(self.root_element())
    }
}

impl<'a> TreeNode<'a> for NodeRef<'a> {
    fn kind(&self) -> NodeKind {
        self.doc.kind(self.id)
    }

    fn prefix(&self) -> Option<&'a str> {
        match self.kind() {
            NodeKind::Element => self
                .doc
                .namespace(self.id)
                .and_then(|ns| ns.prefix.as_deref()),
            // Attribute names are stored as written, prefix included.
            NodeKind::Attribute => self
                .doc
                .name(self.id)
                .and_then(|name| name.split_once(':'))
                .map(|(prefix, _)| prefix),
            _ => None,
        }
    }

    fn local_name(&self) -> Option<&'a str> {
        let name = self.doc.name(self.id)?;
        if self.kind() == NodeKind::Attribute {
            return Some(name.split_once(':').map_or(name, |(_, local)| local));
        }
        Some(name)
    }

    fn string_value(&self) -> String {
        self.doc.text_content(self.id)
    }

    fn attributes(&self) -> Box<dyn Iterator<Item = Self> + 'a> {
        let doc = self.doc;
        Box::new(
            doc.attributes(self.id)
                .iter()
                .map(move |&id| NodeRef { doc, id }),
        )
    }

    fn children(&self) -> Box<dyn Iterator<Item = Self> + 'a> {
        let doc = self.doc;
        Box::new(
            doc.children(self.id)
                .iter()
                .map(move |&id| NodeRef { doc, id }),
        )
    }

    fn parent(&self) -> Option<Self> {
        let doc = self.doc;
        doc.parent(self.id).map(|id| NodeRef { doc, id })
    }
}
