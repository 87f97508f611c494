//! An owned, arena-based XML document tree.
//!
//! Nodes live in a flat arena addressed by stable `NodeId` indices, so a
//! template document and its per-render working clones never share mutable
//! state: `Document::clone` produces a fully independent arena with the
//! same ids, and `copy_subtree_from` grafts a subtree from one arena into
//! another. Attributes are arena nodes in their own right, which lets a
//! path-expression match carry a single `NodeId` whose kind selects the
//! write operation.

use std::collections::HashMap;
use xmlflow_xpath::NodeKind;

/// A stable index into a document's node arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) usize);

/// An XML namespace: an optional prefix bound to a URI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Namespace {
    pub prefix: Option<String>,
    pub uri: String,
}

/// The removals recorded by `strip_namespaces`, keyed by element id.
/// "No namespace" is a valid recorded state, so restore puts back exactly
/// what strip took away.
pub type NamespaceMap = HashMap<NodeId, Option<Namespace>>;

#[derive(Debug, Clone)]
pub(crate) struct ElementData {
    pub(crate) name: String,
    pub(crate) namespace: Option<Namespace>,
    pub(crate) attributes: Vec<NodeId>,
    pub(crate) children: Vec<NodeId>,
}

#[derive(Debug, Clone)]
pub(crate) enum Kind {
    Root { children: Vec<NodeId> },
    Element(ElementData),
    Attribute { name: String, value: String },
    Text(String),
    Comment(String),
}

#[derive(Debug, Clone)]
pub(crate) struct Node {
    pub(crate) kind: Kind,
    pub(crate) parent: Option<NodeId>,
}

/// An XML document. Node 0 is a synthetic root whose element child is the
/// document element.
#[derive(Debug, Clone)]
pub struct Document {
    pub(crate) nodes: Vec<Node>,
    root_element: NodeId,
}

impl Document {
    pub(crate) fn empty() -> Self {
        Document {
            nodes: vec![Node {
                kind: Kind::Root { children: vec![] },
                parent: None,
            }],
            root_element: NodeId(0),
        }
    }

    pub(crate) fn set_root_element(&mut self, id: NodeId) {
        self.root_element = id;
    }

    pub(crate) fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub(crate) fn push_node(&mut self, kind: Kind, parent: Option<NodeId>) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node { kind, parent });
        id
    }

    /// The synthetic root node above the document element.
    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    /// The document element.
    pub fn root_element(&self) -> NodeId {
        self.root_element
    }

    pub fn kind(&self, id: NodeId) -> NodeKind {
        match &self.node(id).kind {
            Kind::Root { .. } => NodeKind::Root,
            Kind::Element(_) => NodeKind::Element,
            Kind::Attribute { .. } => NodeKind::Attribute,
            Kind::Text(_) => NodeKind::Text,
            Kind::Comment(_) => NodeKind::Comment,
        }
    }

    /// The local name of an element, or the name of an attribute as written
    /// (possibly prefixed). `None` for unnamed node kinds.
    pub fn name(&self, id: NodeId) -> Option<&str> {
        match &self.node(id).kind {
            Kind::Element(el) => Some(&el.name),
            Kind::Attribute { name, .. } => Some(name),
            _ => None,
        }
    }

    /// The qualified name of an element (`prefix:local` when the element's
    /// namespace carries a prefix).
    pub fn qualified_name(&self, id: NodeId) -> Option<String> {
        match &self.node(id).kind {
            Kind::Element(el) => Some(match el.namespace.as_ref().and_then(|ns| ns.prefix.as_deref()) {
                Some(prefix) => format!("{}:{}", prefix, el.name),
                None => el.name.clone(),
            }),
            Kind::Attribute { name, .. } => Some(name.clone()),
            _ => None,
        }
    }

    pub fn namespace(&self, id: NodeId) -> Option<&Namespace> {
        match &self.node(id).kind {
            Kind::Element(el) => el.namespace.as_ref(),
            _ => None,
        }
    }

    pub fn set_namespace(&mut self, id: NodeId, namespace: Option<Namespace>) {
        if let Kind::Element(el) = &mut self.nodes[id.0].kind {
            el.namespace = namespace;
        }
    }

    pub fn attribute_value(&self, id: NodeId) -> Option<&str> {
        match &self.node(id).kind {
            Kind::Attribute { value, .. } => Some(value),
            _ => None,
        }
    }

    pub fn attributes(&self, id: NodeId) -> &[NodeId] {
        match &self.node(id).kind {
            Kind::Element(el) => &el.attributes,
            _ => &[],
        }
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        match &self.node(id).kind {
            Kind::Root { children } => children,
            Kind::Element(el) => &el.children,
            _ => &[],
        }
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).parent
    }

    /// The concatenated text of all descendant text nodes (the XPath 1.0
    /// string value of an element), or the content/value of leaf nodes.
    pub fn text_content(&self, id: NodeId) -> String {
        match &self.node(id).kind {
            Kind::Text(text) => text.clone(),
            Kind::Comment(text) => text.clone(),
            Kind::Attribute { value, .. } => value.clone(),
            Kind::Root { .. } | Kind::Element(_) => {
                let mut out = String::new();
                self.collect_text(id, &mut out);
                out
            }
        }
    }

    fn collect_text(&self, id: NodeId, out: &mut String) {
        for &child in self.children(id) {
            match &self.node(child).kind {
                Kind::Text(text) => out.push_str(text),
                Kind::Element(_) => self.collect_text(child, out),
                _ => {}
            }
        }
    }

    /// Replaces the entire content of an element with a single text node,
    /// or clears it when `text` is `None`. Detached nodes stay in the arena
    /// as garbage; they are unreachable and die with the document.
    pub fn set_element_text(&mut self, id: NodeId, text: Option<&str>) {
        let detached: Vec<NodeId> = match &mut self.nodes[id.0].kind {
            Kind::Element(el) => el.children.drain(..).collect(),
            _ => return,
        };
        for child in detached {
            self.nodes[child.0].parent = None;
        }
        if let Some(text) = text {
            let text_id = self.push_node(Kind::Text(text.to_string()), Some(id));
            if let Kind::Element(el) = &mut self.nodes[id.0].kind {
                el.children.push(text_id);
            }
        }
    }

    /// Sets an attribute node's value; `None` clears it to the empty string.
    pub fn set_attribute_value(&mut self, id: NodeId, new_value: Option<&str>) {
        if let Kind::Attribute { value, .. } = &mut self.nodes[id.0].kind {
            *value = new_value.unwrap_or("").to_string();
        }
    }

    /// Appends an existing node as the last child of `parent`.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        match &mut self.nodes[parent.0].kind {
            Kind::Root { children } => children.push(child),
            Kind::Element(el) => el.children.push(child),
            _ => return,
        }
        self.nodes[child.0].parent = Some(parent);
    }

    /// Deep-copies a subtree from another document's arena into this one.
    /// The copied root has no parent until it is appended somewhere.
    pub fn copy_subtree_from(&mut self, src: &Document, src_id: NodeId) -> NodeId {
        let kind = match &src.node(src_id).kind {
            Kind::Element(el) => Kind::Element(ElementData {
                name: el.name.clone(),
                namespace: el.namespace.clone(),
                attributes: vec![],
                children: vec![],
            }),
            Kind::Attribute { name, value } => Kind::Attribute {
                name: name.clone(),
                value: value.clone(),
            },
            Kind::Text(text) => Kind::Text(text.clone()),
            Kind::Comment(text) => Kind::Comment(text.clone()),
            Kind::Root { .. } => Kind::Root { children: vec![] },
        };
        let copied = self.push_node(kind, None);

        let src_attrs: Vec<NodeId> = src.attributes(src_id).to_vec();
        for attr in src_attrs {
            let attr_copy = self.copy_subtree_from(src, attr);
            self.nodes[attr_copy.0].parent = Some(copied);
            if let Kind::Element(el) = &mut self.nodes[copied.0].kind {
                el.attributes.push(attr_copy);
            }
        }
        let src_children: Vec<NodeId> = src.children(src_id).to_vec();
        for child in src_children {
            let child_copy = self.copy_subtree_from(src, child);
            self.append_child(copied, child_copy);
        }
        copied
    }

    /// All element ids reachable from the document element, in document
    /// order (the document element first).
    pub fn element_ids(&self) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![self.root_element];
        while let Some(id) = stack.pop() {
            if self.kind(id) == NodeKind::Element {
                out.push(id);
            }
            for &child in self.children(id).iter().rev() {
                stack.push(child);
            }
        }
        out
    }

    /// Removes the namespace of the document element and of every
    /// descendant element, recording each removal so `restore_namespaces`
    /// can put them back exactly. "No namespace" is recorded too.
    pub fn strip_namespaces(&mut self) -> NamespaceMap {
        let mut removed = NamespaceMap::new();
        for id in self.element_ids() {
            let taken = match &mut self.nodes[id.0].kind {
                Kind::Element(el) => el.namespace.take(),
                _ => None,
            };
            removed.insert(id, taken);
        }
        removed
    }

    /// Restores namespaces previously removed by `strip_namespaces`.
    pub fn restore_namespaces(&mut self, removed: &NamespaceMap) {
        for (&id, namespace) in removed {
            self.set_namespace(id, namespace.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clone_is_fully_independent() {
        let doc = Document::parse("<Order><Item sku=\"\"/></Order>").unwrap();
        let mut working = doc.clone();
        let item = working.children(working.root_element())[0];
        working.set_element_text(item, Some("changed"));

        let template_item = doc.children(doc.root_element())[0];
        assert_eq!(doc.text_content(template_item), "");
        assert_eq!(working.text_content(item), "changed");
    }

    #[test]
    fn clone_preserves_node_ids() {
        let doc = Document::parse("<Order><Item/><Item/></Order>").unwrap();
        let working = doc.clone();
        assert_eq!(doc.root_element(), working.root_element());
        assert_eq!(
            doc.children(doc.root_element()),
            working.children(working.root_element())
        );
    }

    #[test]
    fn set_element_text_replaces_content_and_clears() {
        let mut doc = Document::parse("<a><b>old</b></a>").unwrap();
        let b = doc.children(doc.root_element())[0];
        doc.set_element_text(b, Some("new"));
        assert_eq!(doc.text_content(b), "new");
        doc.set_element_text(b, None);
        assert_eq!(doc.text_content(b), "");
    }

    #[test]
    fn set_attribute_value_and_clear() {
        let mut doc = Document::parse("<a x=\"1\"/>").unwrap();
        let attr = doc.attributes(doc.root_element())[0];
        doc.set_attribute_value(attr, Some("2"));
        assert_eq!(doc.attribute_value(attr), Some("2"));
        doc.set_attribute_value(attr, None);
        assert_eq!(doc.attribute_value(attr), Some(""));
    }

    #[test]
    fn copy_subtree_between_documents() {
        let src = Document::parse("<a><b k=\"v\">text</b></a>").unwrap();
        let mut dst = Document::parse("<out/>").unwrap();
        let b = src.children(src.root_element())[0];
        let copied = dst.copy_subtree_from(&src, b);
        dst.append_child(dst.root_element(), copied);

        assert_eq!(dst.name(copied), Some("b"));
        assert_eq!(dst.text_content(copied), "text");
        let attr = dst.attributes(copied)[0];
        assert_eq!(dst.name(attr), Some("k"));
        assert_eq!(dst.attribute_value(attr), Some("v"));
        assert_eq!(dst.parent(copied), Some(dst.root_element()));
    }

    #[test]
    fn strip_and_restore_namespaces_round_trip() {
        let xml = "<ns:Order xmlns:ns=\"urn:orders\"><ns:Item/><Plain/></ns:Order>";
        let mut doc = Document::parse(xml).unwrap();
        let root = doc.root_element();
        let item = doc.children(root)[0];
        let plain = doc.children(root)[1];

        let original_root_ns = doc.namespace(root).cloned();
        assert!(original_root_ns.is_some());

        let removed = doc.strip_namespaces();
        assert!(doc.namespace(root).is_none());
        assert!(doc.namespace(item).is_none());
        // "no namespace" is recorded as a removal state too
        assert_eq!(removed.get(&plain), Some(&None));

        doc.restore_namespaces(&removed);
        assert_eq!(doc.namespace(root).cloned(), original_root_ns);
        assert!(doc.namespace(item).is_some());
        assert!(doc.namespace(plain).is_none());
    }

    #[test]
    fn qualified_name_includes_prefix() {
        let xml = "<ns:Order xmlns:ns=\"urn:orders\"/>";
        let doc = Document::parse(xml).unwrap();
        assert_eq!(
            doc.qualified_name(doc.root_element()),
            Some("ns:Order".to_string())
        );
        assert_eq!(doc.name(doc.root_element()), Some("Order"));
    }
}
