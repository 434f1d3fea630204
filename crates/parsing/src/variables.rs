//! Variable tables and placeholder substitution.

use crate::token::TokenScanner;
use fxhash::FxHashMap;
use serde::{Deserialize, Serialize};

/// Delimiters of variable placeholders (`${key}`).
pub const VARIABLE_DELIMITERS: (&str, &str) = ("${", "}");
/// Delimiters of parameter markers (`#{name}`).
pub const PARAMETER_DELIMITERS: (&str, &str) = ("#{", "}");

/// A flat string table. Merging is last-writer-wins.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Properties(FxHashMap<String, String>);

impl Properties {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    #[must_use]
    pub fn get_or<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.get(key).unwrap_or(default)
    }

    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.0.insert(key.into(), value.into())
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.0.remove(key)
    }

    /// Copies every entry of `other` over this table.
    pub fn merge(&mut self, other: &Self) {
        self.0.extend(other.0.iter().map(|(k, v)| (k.clone(), v.clone())));
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Entries ordered by key, for stable output.
    #[must_use]
    pub fn sorted(&self) -> Vec<(&str, &str)> {
        let mut entries: Vec<_> = self.iter().collect();
        entries.sort_unstable_by(|a, b| a.0.cmp(b.0));
        entries
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Properties {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

impl<K: Into<String>, V: Into<String>> Extend<(K, V)> for Properties {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        self.0.extend(iter.into_iter().map(|(k, v)| (k.into(), v.into())));
    }
}

impl IntoIterator for Properties {
    type Item = (String, String);
    type IntoIter = std::collections::hash_map::IntoIter<String, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

/// Resolves placeholders against a [`Properties`] table.
///
/// Known keys are replaced by their value, which is not scanned again. Unknown keys are
/// emitted unchanged, delimiters included, so later stages can still see them.
#[derive(Debug, Clone, Copy)]
pub struct VariableResolver<'a> {
    scanner: TokenScanner<'static>,
    variables: Option<&'a Properties>,
}

impl<'a> VariableResolver<'a> {
    /// Resolver for `${key}` placeholders.
    #[must_use]
    pub const fn new(variables: Option<&'a Properties>) -> Self {
        let (open, close) = VARIABLE_DELIMITERS;
        Self { scanner: TokenScanner::new(open, close), variables }
    }

    /// Resolver for `#{name}` parameter markers.
    #[must_use]
    pub const fn parameters(variables: Option<&'a Properties>) -> Self {
        let (open, close) = PARAMETER_DELIMITERS;
        Self { scanner: TokenScanner::new(open, close), variables }
    }

    #[must_use]
    pub fn resolve(&self, text: &str) -> String {
        self.scanner.scan(text, |key| match self.variables.and_then(|vars| vars.get(key)) {
            Some(value) => value.to_owned(),
            None => format!("{}{key}{}", self.scanner.open(), self.scanner.close()),
        })
    }
}

/// Substitutes `${key}` placeholders in `text`.
///
/// ```rust
/// use mapr_parsing::{Properties, resolve_variables};
///
/// let vars: Properties = [("db", "orders")].into_iter().collect();
/// assert_eq!(resolve_variables("${db}/${schema}", Some(&vars)), "orders/${schema}");
/// ```
#[must_use]
pub fn resolve_variables(text: &str, variables: Option<&Properties>) -> String {
    VariableResolver::new(variables).resolve(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(entries: &[(&str, &str)]) -> Properties {
        entries.iter().copied().collect()
    }

    #[test]
    fn known_key_is_substituted() {
        assert_eq!(resolve_variables("${a}", Some(&table(&[("a", "x")]))), "x");
    }

    #[test]
    fn unknown_key_passes_through() {
        assert_eq!(resolve_variables("${a}", Some(&Properties::new())), "${a}");
        assert_eq!(resolve_variables("${a}", None), "${a}");
    }

    #[test]
    fn substituted_values_are_not_rescanned() {
        let vars = table(&[("a", "${b}"), ("b", "nope")]);
        assert_eq!(resolve_variables("${a}", Some(&vars)), "${b}");
    }

    #[test]
    fn adjacent_placeholders_resolve_independently() {
        let vars = table(&[("a", "1"), ("b", "2")]);
        assert_eq!(resolve_variables("${a}${b}", Some(&vars)), "12");
        assert_eq!(resolve_variables("${a}${missing}${b}", Some(&vars)), "1${missing}2");
    }

    #[test]
    fn text_without_delimiters_is_identical() {
        let vars = table(&[("a", "1")]);
        assert_eq!(resolve_variables("plain text {a} $a", Some(&vars)), "plain text {a} $a");
    }

    #[test]
    fn parameter_markers_keep_their_delimiters() {
        let vars = table(&[("id", "7")]);
        let resolver = VariableResolver::parameters(Some(&vars));
        assert_eq!(resolver.resolve("#{id} #{name} ${id}"), "7 #{name} ${id}");
    }

    #[test]
    fn merge_is_last_writer_wins() {
        let mut base = table(&[("k", "1"), ("only", "base")]);
        base.merge(&table(&[("k", "2")]));
        assert_eq!(base.get("k"), Some("2"));
        assert_eq!(base.get("only"), Some("base"));
        assert_eq!(base.get_or("missing", "dflt"), "dflt");
    }
}
