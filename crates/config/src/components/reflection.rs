use mapr_parsing::Properties;
use serde_json::Value;
use std::fmt::Debug;

/// Creates result objects by type name.
pub trait ObjectFactory: Debug + Send + Sync {
    fn set_properties(&mut self, _properties: Properties) {}

    /// Whether values of `type_name` hold many elements.
    fn is_collection(&self, type_name: &str) -> bool;

    /// An empty instance of `type_name`, when the factory knows how to make one.
    fn create(&self, type_name: &str) -> Option<Value>;
}

const COLLECTION_TYPES: &[&str] = &[
    "std::vec::Vec",
    "std::collections::VecDeque",
    "std::collections::LinkedList",
    "std::collections::HashSet",
    "std::collections::BTreeSet",
];

const MAP_TYPES: &[&str] = &["std::collections::HashMap", "std::collections::BTreeMap"];

#[derive(Debug, Clone, Default)]
pub struct DefaultObjectFactory {
    properties: Properties,
}

impl DefaultObjectFactory {
    pub const TYPE_NAME: &'static str = "mapr::reflection::DefaultObjectFactory";

    #[must_use]
    pub const fn properties(&self) -> &Properties {
        &self.properties
    }
}

impl ObjectFactory for DefaultObjectFactory {
    fn set_properties(&mut self, properties: Properties) {
        self.properties = properties;
    }

    fn is_collection(&self, type_name: &str) -> bool {
        COLLECTION_TYPES.contains(&type_name)
    }

    fn create(&self, type_name: &str) -> Option<Value> {
        match type_name {
            name if COLLECTION_TYPES.contains(&name) => Some(Value::Array(Vec::new())),
            name if MAP_TYPES.contains(&name) || name == "serde_json::Value" => {
                Some(Value::Object(serde_json::Map::new()))
            },
            "std::string::String" => Some(Value::String(String::new())),
            "bool" => Some(Value::Bool(false)),
            "i8" | "i16" | "i32" | "i64" => Some(Value::from(0)),
            "f32" | "f64" => Some(Value::from(0.0)),
            _ => None,
        }
    }
}

/// Decides whether a result value gets a custom wrapper.
pub trait ObjectWrapperFactory: Debug + Send + Sync {
    fn has_wrapper_for(&self, value: &Value) -> bool;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultObjectWrapperFactory;

impl DefaultObjectWrapperFactory {
    pub const TYPE_NAME: &'static str = "mapr::reflection::DefaultObjectWrapperFactory";
}

impl ObjectWrapperFactory for DefaultObjectWrapperFactory {
    fn has_wrapper_for(&self, _value: &Value) -> bool {
        false
    }
}

/// Produces type metadata, optionally cached per type.
pub trait ReflectorFactory: Debug + Send + Sync {
    fn is_class_cache_enabled(&self) -> bool;

    fn set_class_cache_enabled(&mut self, enabled: bool);
}

#[derive(Debug, Clone, Copy)]
pub struct DefaultReflectorFactory {
    class_cache_enabled: bool,
}

impl Default for DefaultReflectorFactory {
    fn default() -> Self {
        Self { class_cache_enabled: true }
    }
}

impl DefaultReflectorFactory {
    pub const TYPE_NAME: &'static str = "mapr::reflection::DefaultReflectorFactory";
}

impl ReflectorFactory for DefaultReflectorFactory {
    fn is_class_cache_enabled(&self) -> bool {
        self.class_cache_enabled
    }

    fn set_class_cache_enabled(&mut self, enabled: bool) {
        self.class_cache_enabled = enabled;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_object_factory_knows_collections() {
        let factory = DefaultObjectFactory::default();
        assert!(factory.is_collection("std::vec::Vec"));
        assert!(!factory.is_collection("std::collections::HashMap"));
        assert_eq!(factory.create("std::collections::HashMap"), Some(Value::Object(serde_json::Map::new())));
        assert_eq!(factory.create("app::Blog"), None);
    }

    #[test]
    fn reflector_cache_is_on_by_default() {
        let mut factory = DefaultReflectorFactory::default();
        assert!(factory.is_class_cache_enabled());
        factory.set_class_cache_enabled(false);
        assert!(!factory.is_class_cache_enabled());
    }
}
