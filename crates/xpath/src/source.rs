//! The navigable, read-only node contract the evaluation engine is written
//! against. A concrete tree (such as the `xmlflow-dom` arena) implements
//! `TreeNode` for a cheap handle type and the engine never sees the storage.

use std::hash::Hash;

/// The type of a node, aligned with the XPath 1.0 data model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Root,
    Element,
    Attribute,
    Text,
    Comment,
}

/// A node handle in a read-only, hierarchical tree.
///
/// `'a` is the lifetime of the underlying tree storage. Handles are expected
/// to be cheap to copy; equality and ordering must reflect node identity in
/// document order.
pub trait TreeNode<'a>: std::fmt::Debug + Clone + Copy + PartialEq + Eq + Hash + Ord {
    /// The kind of the node.
    fn kind(&self) -> NodeKind;

    /// The namespace prefix of the node name, if any.
    fn prefix(&self) -> Option<&'a str>;

    /// The local part of the node name. `None` for unnamed node kinds
    /// (root, text, comments).
    fn local_name(&self) -> Option<&'a str>;

    /// The string value of the node as defined by XPath 1.0 `string()`:
    /// the text content for a text node, the concatenated descendant text
    /// for an element, the value for an attribute.
    fn string_value(&self) -> String;

    /// The attribute nodes of this node. Empty for non-elements.
    fn attributes(&self) -> Box<dyn Iterator<Item = Self> + 'a>;

    /// The child nodes of this node, in document order.
    fn children(&self) -> Box<dyn Iterator<Item = Self> + 'a>;

    /// The parent node. `None` for the root. Attribute nodes report their
    /// owning element.
    fn parent(&self) -> Option<Self>;

    /// The qualified name (`prefix:local` or bare local part).
    fn qualified_name(&self) -> Option<String> {
        let local = self.local_name()?;
        Some(match self.prefix() {
            Some(prefix) => format!("{}:{}", prefix, local),
            None => local.to_string(),
        })
    }
}
