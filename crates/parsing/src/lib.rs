//! # Parsing
//!
//! Low-level text handling for configuration documents.
//!
//! * [`TokenScanner`] extracts `open ... close` delimited expressions with backslash escaping.
//! * [`VariableResolver`] substitutes `${key}` placeholders (and `#{name}` markers) from a
//!   [`Properties`] table, leaving unknown keys untouched.
//! * [`DocumentNavigator`] parses an XML document, optionally validates it against the
//!   bundled grammar and answers path queries whose string results are substituted.
//!
//! ## Example
//!
//! ```rust
//! use mapr_parsing::{DocumentNavigator, NavigatorOptions, Properties};
//!
//! let xml = r#"<configuration><properties><property name="db" value="orders"/></properties>
//!   <environments default="dev"><environment id="dev"/></environments></configuration>"#;
//! let nav = DocumentNavigator::parse(xml, NavigatorOptions::default())?;
//!
//! let props = nav.eval_node("/configuration/properties")?.map(|n| n.children_as_properties());
//! assert_eq!(props.unwrap_or_default().get("db"), Some("orders"));
//! assert_eq!(nav.eval_string("/configuration/environments/@default")?, "dev");
//! # Ok::<(), mapr_parsing::ParsingError>(())
//! ```

mod document;
mod error;
mod navigator;
mod node;
pub mod schema;
mod token;
mod variables;
mod xpath;

pub use crate::document::{Document, NodeId, ParseOptions};
pub use crate::error::{ParsingError, ParsingErrorExt};
pub use crate::navigator::{DocumentNavigator, NavigatorOptions};
pub use crate::node::XNode;
pub use crate::schema::{BundledEntityResolver, Doctype, EntityResolver};
pub use crate::token::TokenScanner;
pub use crate::variables::{
    PARAMETER_DELIMITERS, Properties, VARIABLE_DELIMITERS, VariableResolver, resolve_variables,
};
pub use crate::xpath::{Item, PathExpr};
