//! Pretty serialization of the arena tree through quick-xml's writer.

use crate::document::{Document, Kind, NodeId};
use crate::error::XmlError;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::writer::Writer;
use std::collections::HashMap;

/// Namespace prefixes currently in scope, mapped to their URIs.
type Scope = HashMap<Option<String>, String>;

impl Document {
    /// Serializes the document with an XML declaration and 2-space
    /// indentation. Serializing the same tree twice yields identical text.
    pub fn to_string_pretty(&self) -> Result<String, XmlError> {
        let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
        writer
            .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
            .map_err(write_err)?;

        let scope = Scope::new();
        for &child in self.children(self.root()) {
            self.write_node(child, &mut writer, &scope)?;
        }

        let mut out = String::from_utf8(writer.into_inner())
            .map_err(|e| XmlError::Write(e.to_string()))?;
        out.push('\n');
        Ok(out)
    }

    fn write_node(
        &self,
        id: NodeId,
        writer: &mut Writer<Vec<u8>>,
        in_scope: &Scope,
    ) -> Result<(), XmlError> {
        match &self.node(id).kind {
            Kind::Element(_) => self.write_element(id, writer, in_scope),
            Kind::Text(text) => writer
                .write_event(Event::Text(BytesText::new(text)))
                .map_err(write_err),
            Kind::Comment(text) => writer
                .write_event(Event::Comment(BytesText::from_escaped(text.as_str())))
                .map_err(write_err),
            // Attributes are written with their element; a root inside the
            // tree cannot occur below node 0.
            Kind::Attribute { .. } | Kind::Root { .. } => Ok(()),
        }
    }

    fn write_element(
        &self,
        id: NodeId,
        writer: &mut Writer<Vec<u8>>,
        in_scope: &Scope,
    ) -> Result<(), XmlError> {
        let qname = match self.qualified_name(id) {
            Some(name) => name,
            None => return Ok(()),
        };
        let mut scope = in_scope.clone();
        let mut start = BytesStart::new(qname.clone());

        match self.namespace(id) {
            Some(ns) if scope.get(&ns.prefix) != Some(&ns.uri) => {
                let decl = match &ns.prefix {
                    Some(prefix) => format!("xmlns:{}", prefix),
                    None => "xmlns".to_string(),
                };
                start.push_attribute((decl.as_str(), ns.uri.as_str()));
                scope.insert(ns.prefix.clone(), ns.uri.clone());
            }
            // An element without a namespace under an inherited default
            // namespace must cancel it, or a reparse would rebind it.
            None if scope.get(&None).is_some_and(|uri| !uri.is_empty()) => {
                start.push_attribute(("xmlns", ""));
                scope.insert(None, String::new());
            }
            _ => {}
        }

        for &attr in self.attributes(id) {
            if let Kind::Attribute { name, value } = &self.node(attr).kind {
                start.push_attribute((name.as_str(), value.as_str()));
            }
        }

        let children = self.children(id);
        if children.is_empty() {
            writer
                .write_event(Event::Empty(start))
                .map_err(write_err)?;
        } else {
            writer.write_event(Event::Start(start)).map_err(write_err)?;
            for &child in children {
                self.write_node(child, writer, &scope)?;
            }
            writer
                .write_event(Event::End(BytesEnd::new(qname)))
                .map_err(write_err)?;
        }
        Ok(())
    }
}

fn write_err(e: impl std::fmt::Display) -> XmlError {
    XmlError::Write(e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Collapses the serializer's structural whitespace so assertions are
    /// about markup, not indentation.
    fn squish(s: &str) -> String {
        s.lines().map(str::trim).collect()
    }

    #[test]
    fn serialize_simple_document() {
        let doc = Document::parse("<Order><Item sku=\"A1\" qty=\"2\"/></Order>").unwrap();
        let out = doc.to_string_pretty().unwrap();
        assert_eq!(
            squish(&out),
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?><Order><Item sku=\"A1\" qty=\"2\"/></Order>"
        );
    }

    #[test]
    fn serialize_is_idempotent() {
        let doc =
            Document::parse("<Order status=\"new\"><Item>5</Item><note>n</note></Order>").unwrap();
        let first = doc.to_string_pretty().unwrap();
        let second = doc.to_string_pretty().unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn serialize_escapes_text_and_attributes() {
        let mut doc = Document::parse("<a x=\"\"><b/></a>").unwrap();
        let b = doc.children(doc.root_element())[0];
        doc.set_element_text(b, Some("1 < 2 & 3"));
        let attr = doc.attributes(doc.root_element())[0];
        doc.set_attribute_value(attr, Some("\"quoted\""));
        let out = doc.to_string_pretty().unwrap();
        assert!(out.contains("1 &lt; 2 &amp; 3"));
        assert!(!out.contains("1 < 2"));
    }

    #[test]
    fn serialize_declares_namespaces_once() {
        let xml = "<ns:Order xmlns:ns=\"urn:orders\"><ns:Item/></ns:Order>";
        let doc = Document::parse(xml).unwrap();
        let out = doc.to_string_pretty().unwrap();
        assert_eq!(out.matches("xmlns:ns=\"urn:orders\"").count(), 1);
        assert!(out.contains("<ns:Order"));
        assert!(out.contains("<ns:Item/>"));
    }

    #[test]
    fn serialize_round_trips_through_parse() {
        let xml = "<Order xmlns=\"urn:orders\" status=\"x\"><Item qty=\"1\">v</Item></Order>";
        let doc = Document::parse(xml).unwrap();
        let out = doc.to_string_pretty().unwrap();
        let reparsed = Document::parse(&out).unwrap();
        assert_eq!(
            reparsed.namespace(reparsed.root_element()).unwrap().uri,
            "urn:orders"
        );
        let item = reparsed.children(reparsed.root_element())[0];
        assert_eq!(reparsed.text_content(item), "v");
    }
}
