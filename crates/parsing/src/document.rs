//! Owned document tree.
//!
//! `roxmltree` borrows its input, which would tie every navigator and node to the lifetime
//! of the source text. The parsed tree is copied into a flat arena instead: node ids are
//! assigned in document order, comments and processing instructions are dropped, text is
//! kept as-is (whitespace included) with entity references already expanded.

use crate::error::{ParsingError, ParsingErrorExt};
use crate::schema::{Doctype, EntityResolver, scan_doctype};
use roxmltree::{NodeType, ParsingOptions};
use tracing::debug;

pub type NodeId = usize;

pub(crate) const ROOT: NodeId = 0;

#[derive(Debug)]
enum NodeKind {
    Root,
    Element { name: String, attributes: Vec<(String, String)> },
    Text(String),
}

#[derive(Debug)]
struct NodeData {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// Options applied while turning text into a [`Document`].
#[derive(Debug, Clone, Copy)]
pub struct ParseOptions<'r> {
    /// Validate against the grammar named by the document type declaration.
    pub validation: bool,
    pub resolver: &'r dyn EntityResolver,
}

/// A parsed, immutable document.
#[derive(Debug)]
pub struct Document {
    nodes: Vec<NodeData>,
    doctype: Option<Doctype>,
}

impl Document {
    /// Parses `text`.
    ///
    /// # Errors
    /// * [`ParsingError::Xml`] when the text is not well-formed.
    /// * [`ParsingError::Entity`] when validation is requested and the declared grammar is
    ///   not bundled, or no grammar is declared at all.
    /// * [`ParsingError::Validation`] when the tree does not satisfy the grammar.
    pub fn parse(text: &str, options: ParseOptions<'_>) -> Result<Self, ParsingError> {
        let parsing = ParsingOptions { allow_dtd: true, ..ParsingOptions::default() };
        let parsed =
            roxmltree::Document::parse_with_options(text, parsing).context("parsing document")?;

        let mut document = Self {
            nodes: vec![NodeData { kind: NodeKind::Root, parent: None, children: Vec::new() }],
            doctype: scan_doctype(text),
        };
        document.append_children(parsed.root(), ROOT);
        debug!(nodes = document.nodes.len(), "Parsed document");

        if options.validation {
            document.validate(options.resolver)?;
        }
        Ok(document)
    }

    fn append_children(&mut self, source: roxmltree::Node<'_, '_>, parent: NodeId) {
        for child in source.children() {
            let kind = match child.node_type() {
                NodeType::Element => NodeKind::Element {
                    name: child.tag_name().name().to_owned(),
                    attributes: child
                        .attributes()
                        .map(|attr| (attr.name().to_owned(), attr.value().to_owned()))
                        .collect(),
                },
                NodeType::Text => NodeKind::Text(child.text().unwrap_or_default().to_owned()),
                NodeType::Root | NodeType::Comment | NodeType::PI => continue,
            };

            let id = self.nodes.len();
            self.nodes.push(NodeData { kind, parent: Some(parent), children: Vec::new() });
            self.nodes[parent].children.push(id);

            if child.is_element() {
                self.append_children(child, id);
            }
        }
    }

    fn validate(&self, resolver: &dyn EntityResolver) -> Result<(), ParsingError> {
        let doctype = self.doctype.as_ref().ok_or_else(|| ParsingError::Entity {
            message: "no grammar found, the document declares no DOCTYPE".into(),
            context: None,
        })?;
        let schema = resolver.resolve(doctype).ok_or_else(|| ParsingError::Entity {
            message: format!(
                "no bundled grammar for PUBLIC {:?} SYSTEM {:?}",
                doctype.public_id, doctype.system_id
            )
            .into(),
            context: Some("external grammars are never fetched".into()),
        })?;
        if doctype.name != schema.root {
            return Err(ParsingError::Validation {
                message: format!("DOCTYPE names \"{}\", expected \"{}\"", doctype.name, schema.root)
                    .into(),
                context: None,
            });
        }
        schema.validate(self)
    }

    #[must_use]
    pub const fn doctype(&self) -> Option<&Doctype> {
        self.doctype.as_ref()
    }

    #[must_use]
    pub fn root_element(&self) -> Option<NodeId> {
        self.element_children(ROOT).next()
    }

    #[must_use]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(id).and_then(|node| node.parent)
    }

    #[must_use]
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.nodes.get(id).map_or(&[], |node| node.children.as_slice())
    }

    pub fn element_children(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.children(id).iter().copied().filter(|&child| self.is_element(child))
    }

    #[must_use]
    pub fn is_element(&self, id: NodeId) -> bool {
        matches!(self.nodes.get(id).map(|n| &n.kind), Some(NodeKind::Element { .. }))
    }

    #[must_use]
    pub fn is_text(&self, id: NodeId) -> bool {
        matches!(self.nodes.get(id).map(|n| &n.kind), Some(NodeKind::Text(_)))
    }

    /// Element name; `None` for the root and for text nodes.
    #[must_use]
    pub fn name(&self, id: NodeId) -> Option<&str> {
        match &self.nodes.get(id)?.kind {
            NodeKind::Element { name, .. } => Some(name),
            _ => None,
        }
    }

    #[must_use]
    pub fn text(&self, id: NodeId) -> Option<&str> {
        match &self.nodes.get(id)?.kind {
            NodeKind::Text(text) => Some(text),
            _ => None,
        }
    }

    #[must_use]
    pub fn attributes(&self, id: NodeId) -> &[(String, String)] {
        match self.nodes.get(id).map(|n| &n.kind) {
            Some(NodeKind::Element { attributes, .. }) => attributes,
            _ => &[],
        }
    }

    #[must_use]
    pub fn attribute(&self, id: NodeId, name: &str) -> Option<&str> {
        self.attributes(id).iter().find(|(key, _)| key == name).map(|(_, value)| value.as_str())
    }

    /// Concatenated text of all descendant text nodes.
    #[must_use]
    pub fn string_value(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.collect_text(id, &mut out);
        out
    }

    fn collect_text(&self, id: NodeId, out: &mut String) {
        if let Some(text) = self.text(id) {
            out.push_str(text);
            return;
        }
        for &child in self.children(id) {
            self.collect_text(child, out);
        }
    }

    /// All nodes below `id`, in document order.
    pub(crate) fn descendants(&self, id: NodeId, out: &mut Vec<NodeId>) {
        for &child in self.children(id) {
            out.push(child);
            self.descendants(child, out);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::BundledEntityResolver;

    fn parse(text: &str) -> Document {
        Document::parse(text, ParseOptions { validation: false, resolver: &BundledEntityResolver })
            .expect("document should parse")
    }

    #[test]
    fn comments_are_dropped_and_whitespace_kept() {
        let doc = parse("<a><!-- note --><b> x </b></a>");
        let a = doc.root_element().expect("root");
        let children: Vec<_> = doc.element_children(a).collect();
        assert_eq!(children.len(), 1);
        assert_eq!(doc.children(a).len(), 1);
        assert_eq!(doc.string_value(children[0]), " x ");
    }

    #[test]
    fn internal_entities_are_expanded() {
        let doc = parse(
            r#"<!DOCTYPE a [ <!ENTITY host "db.local"> ]><a url="jdbc://&host;/x">&host;</a>"#,
        );
        let a = doc.root_element().expect("root");
        assert_eq!(doc.attribute(a, "url"), Some("jdbc://db.local/x"));
        assert_eq!(doc.string_value(a), "db.local");
    }

    #[test]
    fn malformed_input_is_an_xml_error() {
        let err = Document::parse(
            "<a><b></a>",
            ParseOptions { validation: false, resolver: &BundledEntityResolver },
        )
        .expect_err("mismatched tags");
        assert!(matches!(err, ParsingError::Xml { .. }));
    }

    #[test]
    fn validation_requires_a_doctype() {
        let err = Document::parse(
            "<configuration/>",
            ParseOptions { validation: true, resolver: &BundledEntityResolver },
        )
        .expect_err("no grammar");
        assert!(matches!(err, ParsingError::Entity { .. }));
    }

    #[test]
    fn validation_rejects_duplicate_sections() {
        let text = r#"<!DOCTYPE configuration PUBLIC "-//mapr//DTD Config 1.0//EN" "mapr-config.dtd">
<configuration><mappers/><mappers/></configuration>"#;
        let err = Document::parse(text, ParseOptions { validation: true, resolver: &BundledEntityResolver })
            .expect_err("two mappers sections");
        assert!(matches!(err, ParsingError::Validation { .. }));
    }
}
