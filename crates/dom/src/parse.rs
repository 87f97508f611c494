//! Namespace-aware, non-validating XML parsing into the arena.

use crate::document::{Document, ElementData, Kind, Namespace, NodeId};
use crate::error::XmlError;
use quick_xml::events::{BytesStart, Event};
use quick_xml::name::ResolveResult;
use quick_xml::reader::NsReader;
use xmlflow_xpath::NodeKind;

impl Document {
    /// Parses a template or document string. Text, CDATA and general
    /// references (`&amp;`, `&#65;`) are gathered into single text nodes;
    /// whitespace-only runs between elements are dropped so the pretty
    /// serializer owns all structural whitespace. `xmlns`/`xmlns:*`
    /// declarations become resolved `Namespace` values on elements rather
    /// than ordinary attributes.
    pub fn parse(input: &str) -> Result<Document, XmlError> {
        let mut reader = NsReader::from_str(input);

        let mut doc = Document::empty();
        let mut stack: Vec<NodeId> = vec![doc.root()];
        let mut text = TextRun::default();

        loop {
            match reader.read_resolved_event() {
                Ok((resolve, Event::Start(e))) => {
                    text.flush(&mut doc, &stack)?;
                    let parent = top(&stack)?;
                    let id = push_element(&mut doc, parent, &e, resolve)?;
                    stack.push(id);
                }
                Ok((resolve, Event::Empty(e))) => {
                    text.flush(&mut doc, &stack)?;
                    let parent = top(&stack)?;
                    push_element(&mut doc, parent, &e, resolve)?;
                }
                Ok((_, Event::End(_))) => {
                    text.flush(&mut doc, &stack)?;
                    stack.pop();
                }
                Ok((_, Event::Text(e))) => {
                    let raw = utf8(e.as_ref())?;
                    let piece = quick_xml::escape::unescape(raw)
                        .map_err(|e| XmlError::Parse(e.to_string()))?;
                    text.push(&piece);
                }
                Ok((_, Event::GeneralRef(e))) => {
                    let name = utf8(e.as_ref())?;
                    let resolved = match e
                        .resolve_char_ref()
                        .map_err(|e| XmlError::Parse(e.to_string()))?
                    {
                        Some(ch) => ch.to_string(),
                        None => quick_xml::escape::resolve_xml_entity(name)
                            .ok_or_else(|| {
                                XmlError::Parse(format!("unknown entity reference '&{};'", name))
                            })?
                            .to_string(),
                    };
                    text.push_significant(&resolved);
                }
                Ok((_, Event::CData(e))) => {
                    text.push_significant(utf8(e.as_ref())?);
                }
                Ok((_, Event::Comment(e))) => {
                    text.flush(&mut doc, &stack)?;
                    let comment = utf8(e.as_ref())?.to_string();
                    let parent = top(&stack)?;
                    let id = doc.push_node(Kind::Comment(comment), Some(parent));
                    doc.append_child(parent, id);
                }
                Ok((_, Event::Eof)) => break,
                // XML declaration, processing instructions, doctype
                Ok(_) => {}
                Err(e) => return Err(XmlError::Parse(e.to_string())),
            }
        }

        let root_element = doc
            .children(doc.root())
            .iter()
            .copied()
            .find(|&id| doc.kind(id) == NodeKind::Element)
            .ok_or_else(|| XmlError::Parse("document has no root element".to_string()))?;
        doc.set_root_element(root_element);
        Ok(doc)
    }
}

/// Consecutive text, CDATA and reference events gathered into one run.
/// A run that is pure inter-element whitespace is dropped on flush; a run
/// touched by a reference or CDATA keeps its whitespace intact.
#[derive(Default)]
struct TextRun {
    buffer: String,
    significant: bool,
}

impl TextRun {
    fn push(&mut self, piece: &str) {
        if piece.chars().any(|c| !c.is_whitespace()) {
            self.significant = true;
        }
        self.buffer.push_str(piece);
    }

    fn push_significant(&mut self, piece: &str) {
        self.significant = true;
        self.buffer.push_str(piece);
    }

    fn flush(&mut self, doc: &mut Document, stack: &[NodeId]) -> Result<(), XmlError> {
        if self.significant {
            let parent = top(stack)?;
            let id = doc.push_node(Kind::Text(std::mem::take(&mut self.buffer)), Some(parent));
            doc.append_child(parent, id);
        } else {
            self.buffer.clear();
        }
        self.significant = false;
        Ok(())
    }
}

fn top(stack: &[NodeId]) -> Result<NodeId, XmlError> {
    stack
        .last()
        .copied()
        .ok_or_else(|| XmlError::Parse("content after the root element closed".to_string()))
}

fn utf8(bytes: &[u8]) -> Result<&str, XmlError> {
    std::str::from_utf8(bytes).map_err(|e| XmlError::Parse(e.to_string()))
}

fn is_xmlns(key: &[u8]) -> bool {
    key == b"xmlns" || key.starts_with(b"xmlns:")
}

fn push_element(
    doc: &mut Document,
    parent: NodeId,
    e: &BytesStart<'_>,
    resolve: ResolveResult<'_>,
) -> Result<NodeId, XmlError> {
    let local = utf8(e.local_name().as_ref())?.to_string();
    let prefix = match e.name().prefix() {
        Some(p) => Some(utf8(p.as_ref())?.to_string()),
        None => None,
    };
    let namespace = match resolve {
        ResolveResult::Bound(ns) => Some(Namespace {
            prefix,
            uri: utf8(ns.as_ref())?.to_string(),
        }),
        _ => None,
    };

    let id = doc.push_node(
        Kind::Element(ElementData {
            name: local,
            namespace,
            attributes: vec![],
            children: vec![],
        }),
        Some(parent),
    );
    doc.append_child(parent, id);

    for attr in e.attributes() {
        let attr = attr.map_err(|e| XmlError::Parse(e.to_string()))?;
        if is_xmlns(attr.key.as_ref()) {
            continue;
        }
        let name = utf8(attr.key.as_ref())?.to_string();
        let value = attr
            .unescape_value()
            .map_err(|e| XmlError::Parse(e.to_string()))?
            .into_owned();
        let attr_id = doc.push_node(Kind::Attribute { name, value }, Some(id));
        if let Kind::Element(el) = &mut doc.nodes[id.0].kind {
            el.attributes.push(attr_id);
        }
    }
    Ok(id)
}
