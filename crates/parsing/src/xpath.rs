//! A small path-query language over [`Document`].
//!
//! Supported syntax: absolute (`/a/b`) and relative (`a/b`) paths, `//` for
//! descendant-or-self, the steps `name`, `*`, `.`, `..`, `text()` and `@attr` / `@*`,
//! and the predicates `[n]` (1-based), `[@attr]` and `[@attr='value']`.
//! An attribute step may only appear last.

use crate::document::{Document, NodeId, ROOT};
use crate::error::ParsingError;
use std::borrow::Cow;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Axis {
    Child,
    /// Child step applied to every descendant-or-self of the context (`//step`).
    Descendant,
    SelfNode,
    Parent,
    Attribute,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum NodeTest {
    Name(String),
    Any,
    Text,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Predicate {
    Position(usize),
    HasAttribute(String),
    AttributeEquals(String, String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Step {
    axis: Axis,
    test: NodeTest,
    predicates: Vec<Predicate>,
}

/// A matched item: a tree node, or the `index`-th attribute of an element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Item {
    Node(NodeId),
    Attribute(NodeId, usize),
}

impl Item {
    #[must_use]
    pub fn string_value(self, document: &Document) -> String {
        match self {
            Self::Node(id) => document.string_value(id),
            Self::Attribute(id, index) => {
                document.attributes(id).get(index).map(|(_, value)| value.clone()).unwrap_or_default()
            },
        }
    }
}

/// A compiled path expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathExpr {
    absolute: bool,
    steps: Vec<Step>,
}

impl PathExpr {
    /// Compiles `expression`.
    ///
    /// # Errors
    /// Returns [`ParsingError::Expression`] on any syntax error.
    pub fn parse(expression: &str) -> Result<Self, ParsingError> {
        Parser { source: expression, rest: expression.trim() }.parse()
    }

    /// Evaluates the expression with `context` as the context node.
    ///
    /// The result is in document order without duplicates.
    #[must_use]
    pub fn evaluate(&self, document: &Document, context: NodeId) -> Vec<Item> {
        let mut current = vec![if self.absolute { ROOT } else { context }];

        for step in &self.steps {
            if step.axis == Axis::Attribute {
                let mut items = Vec::new();
                for &id in &current {
                    for (index, (name, _)) in document.attributes(id).iter().enumerate() {
                        if matches!(&step.test, NodeTest::Any)
                            || matches!(&step.test, NodeTest::Name(wanted) if wanted == name)
                        {
                            items.push(Item::Attribute(id, index));
                        }
                    }
                }
                return items;
            }

            let mut next = Vec::new();
            for &id in &current {
                next.extend(apply_step(document, step, id));
            }
            next.sort_unstable();
            next.dedup();
            current = next;
        }

        current.into_iter().map(Item::Node).collect()
    }
}

fn apply_step(document: &Document, step: &Step, context: NodeId) -> Vec<NodeId> {
    let candidates: Vec<NodeId> = match step.axis {
        Axis::SelfNode => vec![context],
        Axis::Parent => document.parent(context).into_iter().collect(),
        Axis::Child => matching_children(document, &step.test, context),
        Axis::Descendant => {
            let mut scope = vec![context];
            document.descendants(context, &mut scope);
            let mut out = Vec::new();
            for id in scope {
                out.extend(filter_predicates(
                    document,
                    &step.predicates,
                    matching_children(document, &step.test, id),
                ));
            }
            return out;
        },
        Axis::Attribute => Vec::new(),
    };
    filter_predicates(document, &step.predicates, candidates)
}

fn matching_children(document: &Document, test: &NodeTest, parent: NodeId) -> Vec<NodeId> {
    document
        .children(parent)
        .iter()
        .copied()
        .filter(|&child| match test {
            NodeTest::Any => document.is_element(child),
            NodeTest::Text => document.is_text(child),
            NodeTest::Name(name) => document.name(child) == Some(name.as_str()),
        })
        .collect()
}

fn filter_predicates(
    document: &Document,
    predicates: &[Predicate],
    mut nodes: Vec<NodeId>,
) -> Vec<NodeId> {
    for predicate in predicates {
        nodes = match predicate {
            Predicate::Position(n) => nodes.get(n - 1).copied().into_iter().collect(),
            Predicate::HasAttribute(name) => {
                nodes.into_iter().filter(|&id| document.attribute(id, name).is_some()).collect()
            },
            Predicate::AttributeEquals(name, value) => nodes
                .into_iter()
                .filter(|&id| document.attribute(id, name) == Some(value.as_str()))
                .collect(),
        };
    }
    nodes
}

struct Parser<'a> {
    source: &'a str,
    rest: &'a str,
}

impl Parser<'_> {
    fn error(&self, message: impl Into<Cow<'static, str>>) -> ParsingError {
        ParsingError::Expression {
            message: message.into(),
            context: Some(format!("in \"{}\"", self.source).into()),
        }
    }

    fn parse(mut self) -> Result<PathExpr, ParsingError> {
        if self.rest.is_empty() {
            return Err(self.error("empty expression"));
        }

        let mut expr = PathExpr { absolute: false, steps: Vec::new() };
        let mut descendant = false;
        if let Some(rest) = self.rest.strip_prefix("//") {
            expr.absolute = true;
            descendant = true;
            self.rest = rest;
        } else if let Some(rest) = self.rest.strip_prefix('/') {
            expr.absolute = true;
            self.rest = rest;
            if self.rest.is_empty() {
                return Ok(expr);
            }
        }

        loop {
            let mut step = self.step()?;
            if descendant {
                if step.axis != Axis::Child {
                    return Err(self.error("'//' must be followed by a name, '*' or text()"));
                }
                step.axis = Axis::Descendant;
            }
            if expr.steps.last().is_some_and(|last| last.axis == Axis::Attribute) {
                return Err(self.error("an attribute step must be the last step"));
            }
            expr.steps.push(step);

            if self.rest.is_empty() {
                return Ok(expr);
            }
            if let Some(rest) = self.rest.strip_prefix("//") {
                descendant = true;
                self.rest = rest;
            } else if let Some(rest) = self.rest.strip_prefix('/') {
                descendant = false;
                self.rest = rest;
            } else {
                return Err(self.error(format!("unexpected \"{}\"", self.rest)));
            }
            if self.rest.is_empty() {
                return Err(self.error("expression ends with '/'"));
            }
        }
    }

    fn step(&mut self) -> Result<Step, ParsingError> {
        if let Some(rest) = self.rest.strip_prefix("..") {
            self.rest = rest;
            return Ok(Step { axis: Axis::Parent, test: NodeTest::Any, predicates: Vec::new() });
        }
        if let Some(rest) = self.rest.strip_prefix('.') {
            self.rest = rest;
            return Ok(Step { axis: Axis::SelfNode, test: NodeTest::Any, predicates: Vec::new() });
        }
        if let Some(rest) = self.rest.strip_prefix("text()") {
            self.rest = rest;
            let predicates = self.predicates()?;
            return Ok(Step { axis: Axis::Child, test: NodeTest::Text, predicates });
        }

        let (axis, rest) = match self.rest.strip_prefix('@') {
            Some(rest) => (Axis::Attribute, rest),
            None => (Axis::Child, self.rest),
        };
        self.rest = rest;

        let test = if let Some(rest) = self.rest.strip_prefix('*') {
            self.rest = rest;
            NodeTest::Any
        } else {
            NodeTest::Name(self.name()?.to_owned())
        };

        let predicates = self.predicates()?;
        if axis == Axis::Attribute && !predicates.is_empty() {
            return Err(self.error("predicates are not supported on attribute steps"));
        }
        Ok(Step { axis, test, predicates })
    }

    fn name(&mut self) -> Result<&str, ParsingError> {
        let end = self
            .rest
            .find(|c: char| !(c.is_alphanumeric() || matches!(c, '_' | '-' | '.' | ':')))
            .unwrap_or(self.rest.len());
        if end == 0 {
            return Err(self.error(format!("expected a name at \"{}\"", self.rest)));
        }
        let (name, rest) = self.rest.split_at(end);
        self.rest = rest;
        Ok(name)
    }

    fn predicates(&mut self) -> Result<Vec<Predicate>, ParsingError> {
        let mut predicates = Vec::new();
        while let Some(rest) = self.rest.strip_prefix('[') {
            self.rest = rest.trim_start();
            predicates.push(self.predicate()?);
            self.rest = self.rest.trim_start();
            self.rest = self.rest.strip_prefix(']').ok_or_else(|| self.error("unclosed '['"))?;
        }
        Ok(predicates)
    }

    fn predicate(&mut self) -> Result<Predicate, ParsingError> {
        if let Some(rest) = self.rest.strip_prefix('@') {
            self.rest = rest;
            let name = self.name()?.to_owned();
            self.rest = self.rest.trim_start();
            let Some(rest) = self.rest.strip_prefix('=') else {
                return Ok(Predicate::HasAttribute(name));
            };
            self.rest = rest.trim_start();
            let quote = self
                .rest
                .chars()
                .next()
                .filter(|c| *c == '\'' || *c == '"')
                .ok_or_else(|| self.error("expected a quoted value"))?;
            let body = &self.rest[1..];
            let end = body.find(quote).ok_or_else(|| self.error("unterminated string literal"))?;
            let value = body[..end].to_owned();
            self.rest = &body[end + 1..];
            return Ok(Predicate::AttributeEquals(name, value));
        }

        let end = self.rest.find(|c: char| !c.is_ascii_digit()).unwrap_or(self.rest.len());
        let position: usize = self.rest[..end]
            .parse()
            .map_err(|_| self.error(format!("unsupported predicate at \"{}\"", self.rest)))?;
        if position == 0 {
            return Err(self.error("positions start at 1"));
        }
        self.rest = &self.rest[end..];
        Ok(Predicate::Position(position))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::ParseOptions;
    use crate::schema::BundledEntityResolver;

    const XML: &str = r#"<configuration>
  <environments default="dev">
    <environment id="dev"><dataSource type="POOLED"/></environment>
    <environment id="prod"><dataSource type="JNDI"/></environment>
  </environments>
  <mappers><mapper resource="a.xml"/><mapper class="app::B"/></mappers>
</configuration>"#;

    fn doc() -> Document {
        Document::parse(XML, ParseOptions { validation: false, resolver: &BundledEntityResolver })
            .expect("fixture parses")
    }

    fn values(document: &Document, expr: &str) -> Vec<String> {
        PathExpr::parse(expr)
            .expect("expression compiles")
            .evaluate(document, ROOT)
            .into_iter()
            .map(|item| item.string_value(document))
            .collect()
    }

    #[test]
    fn absolute_attribute_path() {
        let doc = doc();
        assert_eq!(values(&doc, "/configuration/environments/@default"), vec!["dev"]);
    }

    #[test]
    fn predicates_select_by_attribute_and_position() {
        let doc = doc();
        assert_eq!(
            values(&doc, "/configuration/environments/environment[@id='prod']/dataSource/@type"),
            vec!["JNDI"]
        );
        assert_eq!(values(&doc, "/configuration/environments/environment[2]/@id"), vec!["prod"]);
        assert_eq!(values(&doc, "//mapper[@class]/@class"), vec!["app::B"]);
    }

    #[test]
    fn descendant_and_parent_steps() {
        let doc = doc();
        assert_eq!(values(&doc, "//dataSource/@type"), vec!["POOLED", "JNDI"]);
        assert_eq!(values(&doc, "//dataSource/../@id"), vec!["dev", "prod"]);
        assert_eq!(values(&doc, "/configuration/*/mapper/@*").len(), 2);
    }

    #[test]
    fn missing_paths_match_nothing() {
        let doc = doc();
        assert!(values(&doc, "/configuration/settings/setting").is_empty());
    }

    #[test]
    fn syntax_errors() {
        for bad in ["", "/a/", "a[", "a[0]", "@x/y", "a[@x=unquoted]", "a!b"] {
            let err = PathExpr::parse(bad).expect_err(bad);
            assert!(matches!(err, ParsingError::Expression { .. }), "{bad}");
        }
    }
}
