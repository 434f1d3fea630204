//! Path queries over a parsed document with variable substitution.

use crate::document::{Document, NodeId, ParseOptions, ROOT};
use crate::error::{ParsingError, ParsingErrorExt};
use crate::node::XNode;
use crate::schema::{BundledEntityResolver, EntityResolver};
use crate::variables::{Properties, resolve_variables};
use crate::xpath::{Item, PathExpr};
use parking_lot::RwLock;
use std::io::Read;
use std::str::FromStr;
use std::sync::Arc;

#[derive(Debug)]
pub(crate) struct Shared {
    pub(crate) document: Document,
    variables: RwLock<Arc<Properties>>,
}

impl Shared {
    pub(crate) fn variables(&self) -> Arc<Properties> {
        Arc::clone(&*self.variables.read())
    }

    pub(crate) fn evaluate(&self, expression: &str, context: NodeId) -> Result<Vec<Item>, ParsingError> {
        Ok(PathExpr::parse(expression)?.evaluate(&self.document, context))
    }

    pub(crate) fn eval_string(&self, expression: &str, context: NodeId) -> Result<String, ParsingError> {
        let raw = self
            .evaluate(expression, context)?
            .first()
            .map(|item| item.string_value(&self.document))
            .unwrap_or_default();
        Ok(resolve_variables(&raw, Some(&self.variables())))
    }

    pub(crate) fn eval_parsed<T>(&self, expression: &str, context: NodeId) -> Result<T, ParsingError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        let value = self.eval_string(expression, context)?;
        parse_value(&value, expression)
    }
}

pub(crate) fn parse_value<T>(value: &str, origin: &str) -> Result<T, ParsingError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value.trim().parse().map_err(|err: T::Err| ParsingError::Value {
        message: format!("cannot convert \"{value}\" to {}: {err}", std::any::type_name::<T>())
            .into(),
        context: Some(origin.to_owned().into()),
    })
}

/// Options for [`DocumentNavigator::parse`].
#[derive(Debug, Clone)]
pub struct NavigatorOptions {
    validation: bool,
    variables: Properties,
    resolver: Arc<dyn EntityResolver>,
}

impl Default for NavigatorOptions {
    fn default() -> Self {
        Self { validation: false, variables: Properties::new(), resolver: Arc::new(BundledEntityResolver) }
    }
}

impl NavigatorOptions {
    #[must_use]
    pub const fn validation(mut self, enabled: bool) -> Self {
        self.validation = enabled;
        self
    }

    #[must_use]
    pub fn variables(mut self, variables: Properties) -> Self {
        self.variables = variables;
        self
    }

    #[must_use]
    pub fn resolver(mut self, resolver: Arc<dyn EntityResolver>) -> Self {
        self.resolver = resolver;
        self
    }
}

/// A parsed document plus the variable table used to substitute every string it yields.
///
/// Cloning is cheap; clones share the document and the variable table.
///
/// ```rust
/// use mapr_parsing::{DocumentNavigator, NavigatorOptions, Properties};
///
/// let vars: Properties = [("env", "dev")].into_iter().collect();
/// let nav = DocumentNavigator::parse(
///     r#"<environments default="${env}"/>"#,
///     NavigatorOptions::default().variables(vars),
/// )?;
/// assert_eq!(nav.eval_string("/environments/@default")?, "dev");
/// # Ok::<(), mapr_parsing::ParsingError>(())
/// ```
#[derive(Debug, Clone)]
pub struct DocumentNavigator {
    shared: Arc<Shared>,
}

impl DocumentNavigator {
    /// Parses a document from text.
    ///
    /// # Errors
    /// Any parse or validation failure, see [`Document::parse`].
    pub fn parse(text: &str, options: NavigatorOptions) -> Result<Self, ParsingError> {
        let document = Document::parse(
            text,
            ParseOptions { validation: options.validation, resolver: options.resolver.as_ref() },
        )?;
        Ok(Self {
            shared: Arc::new(Shared {
                document,
                variables: RwLock::new(Arc::new(options.variables)),
            }),
        })
    }

    /// Reads `reader` to the end and parses the result.
    ///
    /// # Errors
    /// [`ParsingError::Io`] when reading fails, otherwise as [`Self::parse`].
    pub fn read(mut reader: impl Read, options: NavigatorOptions) -> Result<Self, ParsingError> {
        let mut text = String::new();
        reader.read_to_string(&mut text).context("reading document source")?;
        Self::parse(&text, options)
    }

    /// Replaces the variable table used by subsequent evaluations.
    ///
    /// Nodes produced earlier keep the table that was active when they were produced.
    pub fn set_variables(&self, variables: Properties) {
        *self.shared.variables.write() = Arc::new(variables);
    }

    #[must_use]
    pub fn variables(&self) -> Arc<Properties> {
        self.shared.variables()
    }

    #[must_use]
    pub fn document(&self) -> &Document {
        &self.shared.document
    }

    /// String value of the first match, `""` when nothing matches, after substitution.
    ///
    /// # Errors
    /// [`ParsingError::Expression`] for an invalid expression.
    pub fn eval_string(&self, expression: &str) -> Result<String, ParsingError> {
        self.shared.eval_string(expression, ROOT)
    }

    /// Whether the expression matches anything.
    ///
    /// # Errors
    /// [`ParsingError::Expression`] for an invalid expression.
    pub fn eval_boolean(&self, expression: &str) -> Result<bool, ParsingError> {
        Ok(!self.shared.evaluate(expression, ROOT)?.is_empty())
    }

    /// # Errors
    /// [`ParsingError::Value`] when the substituted string is not a valid number.
    pub fn eval_short(&self, expression: &str) -> Result<i16, ParsingError> {
        self.shared.eval_parsed(expression, ROOT)
    }

    /// # Errors
    /// [`ParsingError::Value`] when the substituted string is not a valid number.
    pub fn eval_int(&self, expression: &str) -> Result<i32, ParsingError> {
        self.shared.eval_parsed(expression, ROOT)
    }

    /// # Errors
    /// [`ParsingError::Value`] when the substituted string is not a valid number.
    pub fn eval_long(&self, expression: &str) -> Result<i64, ParsingError> {
        self.shared.eval_parsed(expression, ROOT)
    }

    /// # Errors
    /// [`ParsingError::Value`] when the substituted string is not a valid number.
    pub fn eval_float(&self, expression: &str) -> Result<f32, ParsingError> {
        self.shared.eval_parsed(expression, ROOT)
    }

    /// # Errors
    /// [`ParsingError::Value`] when the substituted string is not a valid number.
    pub fn eval_double(&self, expression: &str) -> Result<f64, ParsingError> {
        self.shared.eval_parsed(expression, ROOT)
    }

    /// First matching node.
    ///
    /// # Errors
    /// [`ParsingError::Expression`] for an invalid expression.
    pub fn eval_node(&self, expression: &str) -> Result<Option<XNode>, ParsingError> {
        Ok(self.eval_nodes(expression)?.into_iter().next())
    }

    /// All matching nodes in document order. Attribute matches are skipped.
    ///
    /// # Errors
    /// [`ParsingError::Expression`] for an invalid expression.
    pub fn eval_nodes(&self, expression: &str) -> Result<Vec<XNode>, ParsingError> {
        Ok(nodes_of(&self.shared, self.shared.evaluate(expression, ROOT)?))
    }

    /// The document element.
    #[must_use]
    pub fn root(&self) -> Option<XNode> {
        self.shared
            .document
            .root_element()
            .map(|id| XNode::new(Arc::clone(&self.shared), id))
    }
}

pub(crate) fn nodes_of(shared: &Arc<Shared>, items: Vec<Item>) -> Vec<XNode> {
    items
        .into_iter()
        .filter_map(|item| match item {
            Item::Node(id) => Some(XNode::new(Arc::clone(shared), id)),
            Item::Attribute(..) => None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const XML: &str = r#"<settings>
  <setting name="defaultStatementTimeout" value="${timeout}"/>
  <setting name="cacheEnabled" value="true"/>
  <limits short="12" long="9000000000" ratio="0.5" bad="ten"/>
</settings>"#;

    fn nav() -> DocumentNavigator {
        let vars: Properties = [("timeout", "25")].into_iter().collect();
        DocumentNavigator::parse(XML, NavigatorOptions::default().variables(vars))
            .expect("fixture parses")
    }

    #[test]
    fn strings_are_substituted() {
        let nav = nav();
        assert_eq!(nav.eval_string("/settings/setting[1]/@value").unwrap(), "25");
        assert_eq!(nav.eval_string("/settings/nothing/@value").unwrap(), "");
    }

    #[test]
    fn numbers_parse_after_substitution() {
        let nav = nav();
        assert_eq!(nav.eval_int("/settings/setting[1]/@value").unwrap(), 25);
        assert_eq!(nav.eval_short("/settings/limits/@short").unwrap(), 12);
        assert_eq!(nav.eval_long("/settings/limits/@long").unwrap(), 9_000_000_000);
        assert!((nav.eval_double("/settings/limits/@ratio").unwrap() - 0.5).abs() < f64::EPSILON);
        assert!((nav.eval_float("/settings/limits/@ratio").unwrap() - 0.5).abs() < f32::EPSILON);
        let err = nav.eval_int("/settings/limits/@bad").unwrap_err();
        assert_eq!(err.kind(), "value");
    }

    #[test]
    fn boolean_means_non_empty() {
        let nav = nav();
        assert!(nav.eval_boolean("/settings/setting").unwrap());
        assert!(!nav.eval_boolean("/settings/mapper").unwrap());
    }

    #[test]
    fn replacing_variables_affects_later_queries() {
        let nav = nav();
        nav.set_variables([("timeout", "40")].into_iter().collect());
        assert_eq!(nav.eval_string("/settings/setting[1]/@value").unwrap(), "40");
        assert_eq!(nav.variables().get("timeout"), Some("40"));
    }

    #[test]
    fn read_consumes_a_reader() {
        let nav = DocumentNavigator::read(XML.as_bytes(), NavigatorOptions::default())
            .expect("reader parses");
        assert_eq!(nav.eval_nodes("/settings/setting").unwrap().len(), 2);
        assert_eq!(nav.root().map(|n| n.name().to_owned()), Some("settings".to_owned()));
    }
}
