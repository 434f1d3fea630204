use crate::components::extensions::{
    NO_LOGGING_LOG_IMPL, RAW_LANGUAGE_DRIVER, TRACING_LOG_IMPL, XML_LANGUAGE_DRIVER,
};
use crate::components::{
    FileSystemLoader, JdbcTransactionFactory, JndiDataSourceFactory, ManagedTransactionFactory,
    PooledDataSourceFactory, UnpooledDataSourceFactory, VendorDatabaseIdProvider,
};
use fxhash::FxHashMap;
use tracing::{debug, warn};

const BUILTIN_ALIASES: &[(&str, &str)] = &[
    ("string", "std::string::String"),
    ("byte", "i8"),
    ("long", "i64"),
    ("short", "i16"),
    ("int", "i32"),
    ("integer", "i32"),
    ("double", "f64"),
    ("float", "f32"),
    ("boolean", "bool"),
    ("_byte", "i8"),
    ("_long", "i64"),
    ("_short", "i16"),
    ("_int", "i32"),
    ("_integer", "i32"),
    ("_double", "f64"),
    ("_float", "f32"),
    ("_boolean", "bool"),
    ("date", "std::time::SystemTime"),
    ("decimal", "rust_decimal::Decimal"),
    ("bigdecimal", "rust_decimal::Decimal"),
    ("object", "serde_json::Value"),
    ("map", "std::collections::HashMap"),
    ("hashmap", "std::collections::HashMap"),
    ("list", "std::vec::Vec"),
    ("arraylist", "std::vec::Vec"),
    ("collection", "std::vec::Vec"),
    ("iterator", "std::vec::IntoIter"),
    ("JDBC", JdbcTransactionFactory::TYPE_NAME),
    ("MANAGED", ManagedTransactionFactory::TYPE_NAME),
    ("UNPOOLED", UnpooledDataSourceFactory::TYPE_NAME),
    ("POOLED", PooledDataSourceFactory::TYPE_NAME),
    ("JNDI", JndiDataSourceFactory::TYPE_NAME),
    ("DB_VENDOR", VendorDatabaseIdProvider::TYPE_NAME),
    ("XML", XML_LANGUAGE_DRIVER),
    ("RAW", RAW_LANGUAGE_DRIVER),
    ("TRACING", TRACING_LOG_IMPL),
    ("NO_LOGGING", NO_LOGGING_LOG_IMPL),
    ("FILESYSTEM", FileSystemLoader::TYPE_NAME),
];

/// Case-insensitive alias table: alias to fully-qualified type name.
#[derive(Debug, Clone)]
pub struct TypeAliasRegistry {
    aliases: FxHashMap<String, String>,
}

impl Default for TypeAliasRegistry {
    fn default() -> Self {
        let mut registry = Self::empty();
        for (alias, type_name) in BUILTIN_ALIASES {
            registry.aliases.insert(alias.to_lowercase(), (*type_name).to_owned());
        }
        registry
    }
}

impl TypeAliasRegistry {
    #[must_use]
    pub fn empty() -> Self {
        Self { aliases: FxHashMap::default() }
    }

    /// Maps `alias` to `type_name`, replacing an earlier mapping.
    pub fn register(&mut self, alias: &str, type_name: &str) {
        let key = alias.to_lowercase();
        match self.aliases.insert(key, type_name.to_owned()) {
            Some(previous) if previous != type_name => {
                warn!(alias, previous = %previous, type_name, "Type alias remapped");
            },
            _ => debug!(alias, type_name, "Registered type alias"),
        }
    }

    #[must_use]
    pub fn get(&self, alias: &str) -> Option<&str> {
        self.aliases.get(&alias.to_lowercase()).map(String::as_str)
    }

    #[must_use]
    pub fn contains(&self, alias: &str) -> bool {
        self.aliases.contains_key(&alias.to_lowercase())
    }

    /// Aliases ordered by name.
    #[must_use]
    pub fn sorted(&self) -> Vec<(&str, &str)> {
        let mut entries: Vec<_> = self.aliases.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect();
        entries.sort_unstable();
        entries
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.aliases.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.aliases.is_empty()
    }
}
