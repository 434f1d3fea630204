//! # Parsing Errors
//!
//! Every failure raised while reading a document, validating it or evaluating a
//! path query is reported as a [`ParsingError`].

use std::borrow::Cow;

/// A specialized [`ParsingError`] enum of this crate.
#[mapr_derive::mapr_error]
pub enum ParsingError {
    /// The input is not well-formed XML.
    #[error("Error creating document instance{}: {source}", format_context(.context))]
    Xml { source: roxmltree::Error, context: Option<Cow<'static, str>> },

    /// The input could not be read.
    #[error("Error reading document{}: {source}", format_context(.context))]
    Io { source: std::io::Error, context: Option<Cow<'static, str>> },

    /// A path expression is syntactically invalid.
    #[error("Error evaluating path expression{}: {message}", format_context(.context))]
    Expression { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// An evaluated value cannot be converted to the requested type.
    #[error("Invalid value{}: {message}", format_context(.context))]
    Value { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// The document does not satisfy its declared schema.
    #[error("Document is invalid{}: {message}", format_context(.context))]
    Validation { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// A document type declaration references a grammar that is not bundled.
    #[error("Unresolvable document type{}: {message}", format_context(.context))]
    Entity { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Internal parsing error{}: {message}", format_context(.context))]
    Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}
