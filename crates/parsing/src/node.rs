use crate::document::NodeId;
use crate::error::ParsingError;
use crate::navigator::{Shared, nodes_of, parse_value};
use crate::variables::{Properties, resolve_variables};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// A node handle bound to the variable table that was active when it was produced.
///
/// Attribute values and body text are substituted with that table. Path queries issued
/// from a node use the navigator's current table instead.
#[derive(Clone)]
pub struct XNode {
    shared: Arc<Shared>,
    id: NodeId,
    variables: Arc<Properties>,
}

impl fmt::Debug for XNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("XNode").field("path", &self.path()).finish_non_exhaustive()
    }
}

impl XNode {
    pub(crate) fn new(shared: Arc<Shared>, id: NodeId) -> Self {
        let variables = shared.variables();
        Self { shared, id, variables }
    }

    fn resolve(&self, text: &str) -> String {
        resolve_variables(text, Some(&self.variables))
    }

    /// Element name, empty for non-element nodes.
    #[must_use]
    pub fn name(&self) -> &str {
        self.shared.document.name(self.id).unwrap_or_default()
    }

    /// Location for diagnostics, e.g. `configuration/environments/environment[@id="dev"]`.
    #[must_use]
    pub fn path(&self) -> String {
        let document = &self.shared.document;
        let mut segments = Vec::new();
        let mut current = Some(self.id);
        while let Some(id) = current {
            if let Some(name) = document.name(id) {
                let segment = ["id", "value", "property"]
                    .iter()
                    .find_map(|key| document.attribute(id, key).map(|v| format!("[@{key}=\"{v}\"]")))
                    .map_or_else(|| name.to_owned(), |hint| format!("{name}{hint}"));
                segments.push(segment);
            }
            current = document.parent(id);
        }
        segments.reverse();
        segments.join("/")
    }

    /// Text body after substitution: the node's own text, or the first text child of an element.
    #[must_use]
    pub fn body(&self) -> Option<String> {
        let document = &self.shared.document;
        let raw = document.text(self.id).or_else(|| {
            document.children(self.id).iter().find_map(|&child| document.text(child))
        })?;
        Some(self.resolve(raw))
    }

    /// Substituted attribute value.
    #[must_use]
    pub fn string_attribute(&self, name: &str) -> Option<String> {
        self.shared.document.attribute(self.id, name).map(|value| self.resolve(value))
    }

    #[must_use]
    pub fn string_attribute_or(&self, name: &str, default: &str) -> String {
        self.string_attribute(name).unwrap_or_else(|| default.to_owned())
    }

    /// Substituted attribute value converted with [`FromStr`]; `None` when absent.
    ///
    /// # Errors
    /// [`ParsingError::Value`] when the value does not parse.
    pub fn parsed_attribute<T>(&self, name: &str) -> Result<Option<T>, ParsingError>
    where
        T: FromStr,
        T::Err: fmt::Display,
    {
        self.string_attribute(name)
            .map(|value| parse_value(&value, &format!("{}/@{name}", self.path())))
            .transpose()
    }

    /// # Errors
    /// [`ParsingError::Value`] unless the value is `true` or `false`.
    pub fn bool_attribute(&self, name: &str) -> Result<Option<bool>, ParsingError> {
        self.parsed_attribute(name)
    }

    /// # Errors
    /// [`ParsingError::Value`] when the value is not an integer.
    pub fn int_attribute(&self, name: &str) -> Result<Option<i32>, ParsingError> {
        self.parsed_attribute(name)
    }

    /// # Errors
    /// [`ParsingError::Value`] when the value is not an integer.
    pub fn long_attribute(&self, name: &str) -> Result<Option<i64>, ParsingError> {
        self.parsed_attribute(name)
    }

    /// # Errors
    /// [`ParsingError::Value`] when the value is not a number.
    pub fn float_attribute(&self, name: &str) -> Result<Option<f32>, ParsingError> {
        self.parsed_attribute(name)
    }

    /// # Errors
    /// [`ParsingError::Value`] when the value is not a number.
    pub fn double_attribute(&self, name: &str) -> Result<Option<f64>, ParsingError> {
        self.parsed_attribute(name)
    }

    /// All attributes, substituted, in document order.
    #[must_use]
    pub fn attributes(&self) -> Vec<(String, String)> {
        self.shared
            .document
            .attributes(self.id)
            .iter()
            .map(|(name, value)| (name.clone(), self.resolve(value)))
            .collect()
    }

    /// Element children in document order.
    #[must_use]
    pub fn children(&self) -> Vec<Self> {
        self.shared
            .document
            .element_children(self.id)
            .map(|child| Self { shared: Arc::clone(&self.shared), id: child, variables: Arc::clone(&self.variables) })
            .collect()
    }

    /// Projects `<x name=".." value=".."/>` children into a table.
    ///
    /// Children missing either attribute are ignored. Later duplicates win.
    #[must_use]
    pub fn children_as_properties(&self) -> Properties {
        self.children()
            .into_iter()
            .filter_map(|child| Some((child.string_attribute("name")?, child.string_attribute("value")?)))
            .collect()
    }

    #[must_use]
    pub fn parent(&self) -> Option<Self> {
        let parent = self.shared.document.parent(self.id)?;
        Some(Self { shared: Arc::clone(&self.shared), id: parent, variables: Arc::clone(&self.variables) })
    }

    /// # Errors
    /// [`ParsingError::Expression`] for an invalid expression.
    pub fn eval_string(&self, expression: &str) -> Result<String, ParsingError> {
        self.shared.eval_string(expression, self.id)
    }

    /// # Errors
    /// [`ParsingError::Expression`] for an invalid expression.
    pub fn eval_boolean(&self, expression: &str) -> Result<bool, ParsingError> {
        Ok(!self.shared.evaluate(expression, self.id)?.is_empty())
    }

    /// # Errors
    /// [`ParsingError::Value`] when the substituted string is not a valid number.
    pub fn eval_short(&self, expression: &str) -> Result<i16, ParsingError> {
        self.shared.eval_parsed(expression, self.id)
    }

    /// # Errors
    /// [`ParsingError::Value`] when the substituted string is not a valid number.
    pub fn eval_int(&self, expression: &str) -> Result<i32, ParsingError> {
        self.shared.eval_parsed(expression, self.id)
    }

    /// # Errors
    /// [`ParsingError::Value`] when the substituted string is not a valid number.
    pub fn eval_long(&self, expression: &str) -> Result<i64, ParsingError> {
        self.shared.eval_parsed(expression, self.id)
    }

    /// # Errors
    /// [`ParsingError::Value`] when the substituted string is not a valid number.
    pub fn eval_float(&self, expression: &str) -> Result<f32, ParsingError> {
        self.shared.eval_parsed(expression, self.id)
    }

    /// # Errors
    /// [`ParsingError::Value`] when the substituted string is not a valid number.
    pub fn eval_double(&self, expression: &str) -> Result<f64, ParsingError> {
        self.shared.eval_parsed(expression, self.id)
    }

    /// # Errors
    /// [`ParsingError::Expression`] for an invalid expression.
    pub fn eval_node(&self, expression: &str) -> Result<Option<Self>, ParsingError> {
        Ok(self.eval_nodes(expression)?.into_iter().next())
    }

    /// # Errors
    /// [`ParsingError::Expression`] for an invalid expression.
    pub fn eval_nodes(&self, expression: &str) -> Result<Vec<Self>, ParsingError> {
        Ok(nodes_of(&self.shared, self.shared.evaluate(expression, self.id)?))
    }
}

impl fmt::Display for XNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}
