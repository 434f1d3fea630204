//! Bundled document grammars and the resolver that maps document type declarations onto them.
//!
//! Declared grammars are never fetched. A `<!DOCTYPE ...>` is matched against the bundled
//! identifiers instead, so validation works offline and a hostile document cannot make the
//! parser reach the network.

use crate::document::{Document, NodeId};
use crate::error::ParsingError;
use std::fmt::Debug;

pub const CONFIG_PUBLIC_ID: &str = "-//mapr//DTD Config 1.0//EN";
pub const CONFIG_SYSTEM_ID: &str = "https://mapr.rs/dtd/mapr-config.dtd";

const LEGACY_CONFIG_PUBLIC_ID: &str = "-//mybatis.org//DTD Config 3.0//EN";
const CONFIG_DTD_FILES: &[&str] = &["mapr-config.dtd", "mybatis-3-config.dtd"];

/// How many times a child element may appear.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Occurs {
    Optional,
    ZeroOrMore,
    OneOrMore,
}

/// Content rules for one element.
#[derive(Debug)]
pub struct ElementRule {
    pub name: &'static str,
    pub children: &'static [(&'static str, Occurs)],
    pub required_attributes: &'static [&'static str],
}

/// A bundled grammar.
#[derive(Debug)]
pub struct Schema {
    pub root: &'static str,
    pub elements: &'static [ElementRule],
}

/// The `<!DOCTYPE name PUBLIC "pub" "sys">` header of a document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Doctype {
    pub name: String,
    pub public_id: Option<String>,
    pub system_id: Option<String>,
}

/// Maps a document type declaration onto a bundled [`Schema`].
pub trait EntityResolver: Debug + Send + Sync {
    fn resolve(&self, doctype: &Doctype) -> Option<&'static Schema>;
}

/// Resolves the configuration grammar from its public or system identifier.
#[derive(Debug, Default, Clone, Copy)]
pub struct BundledEntityResolver;

impl EntityResolver for BundledEntityResolver {
    fn resolve(&self, doctype: &Doctype) -> Option<&'static Schema> {
        let public = doctype
            .public_id
            .as_deref()
            .is_some_and(|id| id == CONFIG_PUBLIC_ID || id == LEGACY_CONFIG_PUBLIC_ID);
        let system = doctype.system_id.as_deref().is_some_and(|id| {
            id == CONFIG_SYSTEM_ID || CONFIG_DTD_FILES.iter().any(|file| id.ends_with(file))
        });
        (public || system).then_some(&CONFIG_SCHEMA)
    }
}

const PROPERTY_LIST: &[(&str, Occurs)] = &[("property", Occurs::ZeroOrMore)];

pub static CONFIG_SCHEMA: Schema = Schema {
    root: "configuration",
    elements: &[
        ElementRule {
            name: "configuration",
            children: &[
                ("properties", Occurs::Optional),
                ("settings", Occurs::Optional),
                ("typeAliases", Occurs::Optional),
                ("typeHandlers", Occurs::Optional),
                ("objectFactory", Occurs::Optional),
                ("objectWrapperFactory", Occurs::Optional),
                ("reflectionFactory", Occurs::Optional),
                ("plugins", Occurs::Optional),
                ("environments", Occurs::Optional),
                ("databaseIdProvider", Occurs::Optional),
                ("mappers", Occurs::Optional),
            ],
            required_attributes: &[],
        },
        ElementRule { name: "properties", children: PROPERTY_LIST, required_attributes: &[] },
        ElementRule { name: "property", children: &[], required_attributes: &["name", "value"] },
        ElementRule {
            name: "settings",
            children: &[("setting", Occurs::OneOrMore)],
            required_attributes: &[],
        },
        ElementRule { name: "setting", children: &[], required_attributes: &["name", "value"] },
        ElementRule {
            name: "typeAliases",
            children: &[("typeAlias", Occurs::ZeroOrMore), ("package", Occurs::ZeroOrMore)],
            required_attributes: &[],
        },
        ElementRule { name: "typeAlias", children: &[], required_attributes: &["type"] },
        ElementRule {
            name: "typeHandlers",
            children: &[("typeHandler", Occurs::ZeroOrMore), ("package", Occurs::ZeroOrMore)],
            required_attributes: &[],
        },
        ElementRule { name: "typeHandler", children: &[], required_attributes: &["handler"] },
        ElementRule { name: "package", children: &[], required_attributes: &["name"] },
        ElementRule { name: "objectFactory", children: PROPERTY_LIST, required_attributes: &["type"] },
        ElementRule {
            name: "objectWrapperFactory",
            children: &[],
            required_attributes: &["type"],
        },
        ElementRule { name: "reflectionFactory", children: &[], required_attributes: &["type"] },
        ElementRule {
            name: "plugins",
            children: &[("plugin", Occurs::OneOrMore)],
            required_attributes: &[],
        },
        ElementRule { name: "plugin", children: PROPERTY_LIST, required_attributes: &["interceptor"] },
        ElementRule {
            name: "environments",
            children: &[("environment", Occurs::OneOrMore)],
            required_attributes: &[],
        },
        ElementRule {
            name: "environment",
            children: &[("transactionManager", Occurs::Optional), ("dataSource", Occurs::Optional)],
            required_attributes: &[],
        },
        ElementRule {
            name: "transactionManager",
            children: PROPERTY_LIST,
            required_attributes: &["type"],
        },
        ElementRule { name: "dataSource", children: PROPERTY_LIST, required_attributes: &["type"] },
        ElementRule {
            name: "databaseIdProvider",
            children: PROPERTY_LIST,
            required_attributes: &["type"],
        },
        ElementRule {
            name: "mappers",
            children: &[("mapper", Occurs::ZeroOrMore), ("package", Occurs::ZeroOrMore)],
            required_attributes: &[],
        },
        ElementRule { name: "mapper", children: &[], required_attributes: &[] },
    ],
};

impl Schema {
    fn rule(&self, name: &str) -> Option<&ElementRule> {
        self.elements.iter().find(|rule| rule.name == name)
    }

    /// Checks the element tree of `document` against this grammar.
    ///
    /// # Errors
    /// Returns [`ParsingError::Validation`] naming the first offending element.
    pub fn validate(&self, document: &Document) -> Result<(), ParsingError> {
        let root = document.root_element().ok_or_else(|| invalid("document has no root element"))?;
        let root_name = document.name(root).unwrap_or_default();
        if root_name != self.root {
            return Err(invalid(format!(
                "root element \"{root_name}\" must match DOCTYPE root \"{}\"",
                self.root
            )));
        }
        self.validate_element(document, root)
    }

    fn validate_element(&self, document: &Document, id: NodeId) -> Result<(), ParsingError> {
        let name = document.name(id).unwrap_or_default();
        let rule = self
            .rule(name)
            .ok_or_else(|| invalid(format!("element type \"{name}\" must be declared")))?;

        for attribute in rule.required_attributes {
            if document.attribute(id, attribute).is_none() {
                return Err(invalid(format!(
                    "attribute \"{attribute}\" is required for element type \"{name}\""
                )));
            }
        }

        let children: Vec<NodeId> = document.element_children(id).collect();
        for &child in &children {
            let child_name = document.name(child).unwrap_or_default();
            if !rule.children.iter().any(|(allowed, _)| *allowed == child_name) {
                return Err(invalid(format!(
                    "element \"{child_name}\" is not allowed inside \"{name}\""
                )));
            }
        }

        for (child_name, occurs) in rule.children {
            let count = children
                .iter()
                .filter(|&&child| document.name(child).is_some_and(|n| n == *child_name))
                .count();
            let ok = match occurs {
                Occurs::Optional => count <= 1,
                Occurs::ZeroOrMore => true,
                Occurs::OneOrMore => count >= 1,
            };
            if !ok {
                return Err(invalid(format!(
                    "element \"{name}\" contains {count} \"{child_name}\" element(s), expected {occurs:?}"
                )));
            }
        }

        children.into_iter().try_for_each(|child| self.validate_element(document, child))
    }
}

fn invalid(message: impl Into<std::borrow::Cow<'static, str>>) -> ParsingError {
    ParsingError::Validation { message: message.into(), context: None }
}

/// Extracts the `<!DOCTYPE ...>` header from the document prolog, if any.
#[must_use]
pub fn scan_doctype(text: &str) -> Option<Doctype> {
    let mut rest = prolog_tail(text)?.strip_prefix("<!DOCTYPE")?.trim_start();
    let name_end = rest.find(|c: char| c.is_whitespace() || c == '>' || c == '[')?;
    let name = rest[..name_end].to_owned();
    rest = rest[name_end..].trim_start();

    let mut doctype = Doctype { name, public_id: None, system_id: None };
    if let Some(after) = rest.strip_prefix("PUBLIC") {
        let (public_id, after) = quoted(after)?;
        doctype.public_id = Some(public_id);
        doctype.system_id = quoted(after).map(|(sys, _)| sys);
    } else if let Some(after) = rest.strip_prefix("SYSTEM") {
        doctype.system_id = quoted(after).map(|(sys, _)| sys);
    }
    Some(doctype)
}

/// Skips the XML declaration, processing instructions and comments that may precede the
/// document type declaration. `None` when one of them is unterminated.
fn prolog_tail(text: &str) -> Option<&str> {
    let mut rest = text.trim_start_matches('\u{feff}').trim_start();
    loop {
        if let Some(body) = rest.strip_prefix("<?") {
            rest = &body[body.find("?>")? + 2..];
        } else if let Some(body) = rest.strip_prefix("<!--") {
            rest = &body[body.find("-->")? + 3..];
        } else {
            return Some(rest);
        }
        rest = rest.trim_start();
    }
}

fn quoted(text: &str) -> Option<(String, &str)> {
    let text = text.trim_start();
    let quote = text.chars().next().filter(|c| *c == '"' || *c == '\'')?;
    let body = &text[1..];
    let end = body.find(quote)?;
    Some((body[..end].to_owned(), &body[end + 1..]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scans_public_doctype() {
        let text = r#"<?xml version="1.0"?>
<!DOCTYPE configuration PUBLIC "-//mapr//DTD Config 1.0//EN" "https://mapr.rs/dtd/mapr-config.dtd">
<configuration/>"#;
        let doctype = scan_doctype(text).expect("doctype");
        assert_eq!(doctype.name, "configuration");
        assert_eq!(doctype.public_id.as_deref(), Some(CONFIG_PUBLIC_ID));
        assert_eq!(doctype.system_id.as_deref(), Some(CONFIG_SYSTEM_ID));
        assert!(BundledEntityResolver.resolve(&doctype).is_some());
    }

    #[test]
    fn scans_system_doctype_with_internal_subset() {
        let text = r#"<!DOCTYPE configuration SYSTEM 'mybatis-3-config.dtd' [ <!ENTITY x "y"> ]><configuration/>"#;
        let doctype = scan_doctype(text).expect("doctype");
        assert_eq!(doctype.public_id, None);
        assert_eq!(doctype.system_id.as_deref(), Some("mybatis-3-config.dtd"));
        assert!(BundledEntityResolver.resolve(&doctype).is_some());
    }

    #[test]
    fn no_doctype() {
        assert_eq!(scan_doctype("<configuration/>"), None);
        assert_eq!(scan_doctype("<configuration><!DOCTYPE configuration SYSTEM \"x.dtd\"></configuration>"), None);
    }

    #[test]
    fn doctype_inside_comment_or_instruction_is_ignored() {
        let commented = r#"<?xml version="1.0"?>
<!-- <!DOCTYPE configuration PUBLIC "-//mapr//DTD Config 1.0//EN" "https://mapr.rs/dtd/mapr-config.dtd"> -->
<configuration/>"#;
        assert_eq!(scan_doctype(commented), None);

        let instruction = r#"<?note <!DOCTYPE configuration SYSTEM "x.dtd"> ?><configuration/>"#;
        assert_eq!(scan_doctype(instruction), None);
    }

    #[test]
    fn doctype_after_comments_and_instructions() {
        let text = "\u{feff}<?xml version=\"1.0\"?>\n<!-- header -->\n<?style kind=\"plain\"?>\n\
            <!DOCTYPE configuration SYSTEM \"https://mapr.rs/dtd/mapr-config.dtd\">\n<configuration/>";
        let doctype = scan_doctype(text).expect("doctype");
        assert_eq!(doctype.name, "configuration");
        assert_eq!(doctype.public_id, None);
        assert_eq!(doctype.system_id.as_deref(), Some(CONFIG_SYSTEM_ID));
    }

    #[test]
    fn unknown_grammar_is_not_resolved() {
        let doctype = Doctype {
            name: "configuration".into(),
            public_id: Some("-//acme//DTD Other//EN".into()),
            system_id: Some("http://acme.example/other.dtd".into()),
        };
        assert!(BundledEntityResolver.resolve(&doctype).is_none());
    }
}
