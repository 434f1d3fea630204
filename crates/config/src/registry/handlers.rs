use crate::jdbc::JdbcType;
use crate::registry::types::TYPE_HANDLERS;
use fxhash::FxHashMap;
use tracing::debug;

/// Type handlers keyed by value type and optional JDBC type.
#[derive(Debug, Clone)]
pub struct TypeHandlerRegistry {
    handlers: FxHashMap<String, FxHashMap<Option<JdbcType>, String>>,
    unmapped: Vec<String>,
}

impl Default for TypeHandlerRegistry {
    fn default() -> Self {
        let mut registry = Self::empty();
        for (handler, value_type) in TYPE_HANDLERS {
            registry.register(value_type, None, handler);
        }
        registry
    }
}

impl TypeHandlerRegistry {
    #[must_use]
    pub fn empty() -> Self {
        Self { handlers: FxHashMap::default(), unmapped: Vec::new() }
    }

    /// Maps `(value_type, jdbc_type)` to `handler`, replacing any earlier handler for the key.
    pub fn register(&mut self, value_type: &str, jdbc_type: Option<JdbcType>, handler: &str) {
        debug!(value_type, jdbc_type = ?jdbc_type, handler, "Registering type handler");
        self.handlers
            .entry(value_type.to_owned())
            .or_default()
            .insert(jdbc_type, handler.to_owned());
    }

    /// Records a handler that declares no value type.
    pub fn register_unmapped(&mut self, handler: &str) {
        debug!(handler, "Registering type handler without value type");
        if !self.unmapped.iter().any(|known| known == handler) {
            self.unmapped.push(handler.to_owned());
        }
    }

    /// Exact `(value_type, jdbc_type)` match, falling back to the handler registered without a
    /// JDBC type.
    #[must_use]
    pub fn get(&self, value_type: &str, jdbc_type: Option<JdbcType>) -> Option<&str> {
        let by_jdbc = self.handlers.get(value_type)?;
        by_jdbc.get(&jdbc_type).or_else(|| by_jdbc.get(&None)).map(String::as_str)
    }

    #[must_use]
    pub fn has_handler(&self, value_type: &str) -> bool {
        self.handlers.contains_key(value_type)
    }

    #[must_use]
    pub fn unmapped(&self) -> &[String] {
        &self.unmapped
    }

    /// All `(value type, jdbc type, handler)` triples, ordered.
    #[must_use]
    pub fn entries(&self) -> Vec<(&str, Option<JdbcType>, &str)> {
        let mut entries: Vec<_> = self
            .handlers
            .iter()
            .flat_map(|(value_type, by_jdbc)| {
                by_jdbc.iter().map(move |(jdbc, handler)| (value_type.as_str(), *jdbc, handler.as_str()))
            })
            .collect();
        entries.sort_unstable();
        entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn jdbc_specific_handler_falls_back_to_generic() {
        let mut registry = TypeHandlerRegistry::default();
        registry.register("std::string::String", Some(JdbcType::Clob), "app::ClobHandler");

        assert_eq!(registry.get("std::string::String", Some(JdbcType::Clob)), Some("app::ClobHandler"));
        assert_eq!(
            registry.get("std::string::String", Some(JdbcType::Varchar)),
            Some("mapr::type_handlers::StringTypeHandler")
        );
        assert_eq!(registry.get("app::Money", None), None);
    }

    #[test]
    fn unmapped_handlers_are_kept_once() {
        let mut registry = TypeHandlerRegistry::empty();
        registry.register_unmapped("app::AnyHandler");
        registry.register_unmapped("app::AnyHandler");
        assert_eq!(registry.unmapped(), ["app::AnyHandler".to_owned()]);
    }
}
