//! Type registry: the table of every type a configuration document may name.
//!
//! There is no runtime class loading. A type is known only when it is registered here, and a
//! component type carries the constructor used to instantiate it.

use crate::components::extensions::{
    DEFAULT_PROXY_FACTORY, NO_LOGGING_LOG_IMPL, RAW_LANGUAGE_DRIVER, TRACING_LOG_IMPL,
    XML_LANGUAGE_DRIVER,
};
use crate::components::{
    DataSourceFactory, DatabaseIdProvider, DefaultObjectFactory, DefaultObjectWrapperFactory,
    DefaultReflectorFactory, FileSystemLoader, JdbcTransactionFactory, JndiDataSourceFactory,
    ManagedTransactionFactory, ObjectFactory, ObjectWrapperFactory, PooledDataSourceFactory,
    ReflectorFactory, ResourceLoader, TransactionFactory, UnpooledDataSourceFactory,
    VendorDatabaseIdProvider,
};
use crate::plugin::Interceptor;
use fxhash::FxHashMap;
use std::fmt;
use std::sync::Arc;
use strum_macros::{Display, IntoStaticStr};
use tracing::debug;

pub type Constructor<T> = Arc<dyn Fn() -> Box<T> + Send + Sync>;

/// What a registered type is used for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, IntoStaticStr)]
pub enum ComponentKind {
    Value,
    Mapper,
    TypeHandler,
    Interceptor,
    ObjectFactory,
    ObjectWrapperFactory,
    ReflectorFactory,
    TransactionFactory,
    DataSourceFactory,
    DatabaseIdProvider,
    ResourceLoader,
    ProxyFactory,
    LanguageDriver,
    LogImpl,
    ConfigurationFactory,
}

/// A registered type's role, with a constructor for instantiable components.
#[derive(Clone)]
pub enum Component {
    /// Types that are referenced by name only.
    Named(ComponentKind),
    Interceptor(Constructor<dyn Interceptor>),
    ObjectFactory(Constructor<dyn ObjectFactory>),
    ObjectWrapperFactory(Constructor<dyn ObjectWrapperFactory>),
    ReflectorFactory(Constructor<dyn ReflectorFactory>),
    TransactionFactory(Constructor<dyn TransactionFactory>),
    DataSourceFactory(Constructor<dyn DataSourceFactory>),
    DatabaseIdProvider(Constructor<dyn DatabaseIdProvider>),
    ResourceLoader(Constructor<dyn ResourceLoader>),
}

impl fmt::Debug for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Component({})", self.kind())
    }
}

macro_rules! default_constructor {
    ($name:ident, $variant:ident, $trait:ident) => {
        #[doc = concat!("Constructor for a `", stringify!($trait), "` built with `Default`.")]
        #[must_use]
        pub fn $name<T: $trait + Default + 'static>() -> Self {
            Self::$variant(Arc::new(|| -> Box<dyn $trait> { Box::new(T::default()) }))
        }
    };
}

impl Component {
    #[must_use]
    pub const fn kind(&self) -> ComponentKind {
        match self {
            Self::Named(kind) => *kind,
            Self::Interceptor(_) => ComponentKind::Interceptor,
            Self::ObjectFactory(_) => ComponentKind::ObjectFactory,
            Self::ObjectWrapperFactory(_) => ComponentKind::ObjectWrapperFactory,
            Self::ReflectorFactory(_) => ComponentKind::ReflectorFactory,
            Self::TransactionFactory(_) => ComponentKind::TransactionFactory,
            Self::DataSourceFactory(_) => ComponentKind::DataSourceFactory,
            Self::DatabaseIdProvider(_) => ComponentKind::DatabaseIdProvider,
            Self::ResourceLoader(_) => ComponentKind::ResourceLoader,
        }
    }

    default_constructor!(interceptor, Interceptor, Interceptor);
    default_constructor!(object_factory, ObjectFactory, ObjectFactory);
    default_constructor!(object_wrapper_factory, ObjectWrapperFactory, ObjectWrapperFactory);
    default_constructor!(reflector_factory, ReflectorFactory, ReflectorFactory);
    default_constructor!(transaction_factory, TransactionFactory, TransactionFactory);
    default_constructor!(data_source_factory, DataSourceFactory, DataSourceFactory);
    default_constructor!(database_id_provider, DatabaseIdProvider, DatabaseIdProvider);
    default_constructor!(resource_loader, ResourceLoader, ResourceLoader);
}

/// A registered type.
#[derive(Debug, Clone)]
pub struct TypeDescriptor {
    name: String,
    component: Component,
    alias: Option<String>,
    mapped_types: Vec<String>,
}

impl TypeDescriptor {
    #[must_use]
    pub fn new(name: impl Into<String>, component: Component) -> Self {
        Self { name: name.into(), component, alias: None, mapped_types: Vec::new() }
    }

    /// Alias applied when the type is registered without an explicit one.
    #[must_use]
    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    /// Value types a type handler converts.
    #[must_use]
    pub fn with_mapped_types<I, S>(mut self, types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.mapped_types.extend(types.into_iter().map(Into::into));
        self
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub const fn component(&self) -> &Component {
        &self.component
    }

    #[must_use]
    pub const fn kind(&self) -> ComponentKind {
        self.component.kind()
    }

    #[must_use]
    pub fn alias(&self) -> Option<&str> {
        self.alias.as_deref()
    }

    #[must_use]
    pub fn mapped_types(&self) -> &[String] {
        &self.mapped_types
    }

    /// Last path segment: `app::model::Blog` is `Blog`.
    #[must_use]
    pub fn simple_name(&self) -> &str {
        self.name.rsplit("::").next().unwrap_or(&self.name)
    }

    /// The alias used when none is given explicitly.
    #[must_use]
    pub fn default_alias(&self) -> &str {
        self.alias().unwrap_or_else(|| self.simple_name())
    }
}

/// Value types with built-in aliases.
pub(crate) const VALUE_TYPES: &[&str] = &[
    "std::string::String",
    "i8",
    "i16",
    "i32",
    "i64",
    "f32",
    "f64",
    "bool",
    "std::time::SystemTime",
    "rust_decimal::Decimal",
    "serde_json::Value",
    "std::collections::HashMap",
    "std::vec::Vec",
    "std::vec::IntoIter",
];

/// Built-in type handlers and the value type each converts.
pub(crate) const TYPE_HANDLERS: &[(&str, &str)] = &[
    ("mapr::type_handlers::StringTypeHandler", "std::string::String"),
    ("mapr::type_handlers::ByteTypeHandler", "i8"),
    ("mapr::type_handlers::ShortTypeHandler", "i16"),
    ("mapr::type_handlers::IntegerTypeHandler", "i32"),
    ("mapr::type_handlers::LongTypeHandler", "i64"),
    ("mapr::type_handlers::FloatTypeHandler", "f32"),
    ("mapr::type_handlers::DoubleTypeHandler", "f64"),
    ("mapr::type_handlers::BooleanTypeHandler", "bool"),
    ("mapr::type_handlers::DateTypeHandler", "std::time::SystemTime"),
    ("mapr::type_handlers::DecimalTypeHandler", "rust_decimal::Decimal"),
];

/// All types known to a configuration build.
///
/// ```rust
/// use mapr_config::{Component, ComponentKind, TypeDescriptor, TypeRegistry};
///
/// let mut types = TypeRegistry::default();
/// types.register(TypeDescriptor::new("app::mappers::BlogMapper", Component::Named(ComponentKind::Mapper)));
///
/// assert_eq!(types.in_package("app::mappers", ComponentKind::Mapper).count(), 1);
/// assert!(types.get("mapr::transaction::JdbcTransactionFactory").is_some());
/// ```
#[derive(Debug, Clone)]
pub struct TypeRegistry {
    types: FxHashMap<String, TypeDescriptor>,
}

impl Default for TypeRegistry {
    fn default() -> Self {
        let mut registry = Self::empty();
        registry.register_builtins();
        registry
    }
}

impl TypeRegistry {
    /// A registry without the built-in types.
    #[must_use]
    pub fn empty() -> Self {
        Self { types: FxHashMap::default() }
    }

    fn register_builtins(&mut self) {
        for name in VALUE_TYPES {
            self.register(TypeDescriptor::new(*name, Component::Named(ComponentKind::Value)));
        }
        for (handler, value_type) in TYPE_HANDLERS {
            self.register(
                TypeDescriptor::new(*handler, Component::Named(ComponentKind::TypeHandler))
                    .with_mapped_types([*value_type]),
            );
        }

        self.register(TypeDescriptor::new(
            JdbcTransactionFactory::TYPE_NAME,
            Component::transaction_factory::<JdbcTransactionFactory>(),
        ));
        self.register(TypeDescriptor::new(
            ManagedTransactionFactory::TYPE_NAME,
            Component::transaction_factory::<ManagedTransactionFactory>(),
        ));
        self.register(TypeDescriptor::new(
            UnpooledDataSourceFactory::TYPE_NAME,
            Component::data_source_factory::<UnpooledDataSourceFactory>(),
        ));
        self.register(TypeDescriptor::new(
            PooledDataSourceFactory::TYPE_NAME,
            Component::data_source_factory::<PooledDataSourceFactory>(),
        ));
        self.register(TypeDescriptor::new(
            JndiDataSourceFactory::TYPE_NAME,
            Component::data_source_factory::<JndiDataSourceFactory>(),
        ));
        self.register(TypeDescriptor::new(
            VendorDatabaseIdProvider::TYPE_NAME,
            Component::database_id_provider::<VendorDatabaseIdProvider>(),
        ));
        self.register(TypeDescriptor::new(
            DefaultObjectFactory::TYPE_NAME,
            Component::object_factory::<DefaultObjectFactory>(),
        ));
        self.register(TypeDescriptor::new(
            DefaultObjectWrapperFactory::TYPE_NAME,
            Component::object_wrapper_factory::<DefaultObjectWrapperFactory>(),
        ));
        self.register(TypeDescriptor::new(
            DefaultReflectorFactory::TYPE_NAME,
            Component::reflector_factory::<DefaultReflectorFactory>(),
        ));
        self.register(TypeDescriptor::new(
            FileSystemLoader::TYPE_NAME,
            Component::resource_loader::<FileSystemLoader>(),
        ));

        for (name, kind) in [
            (XML_LANGUAGE_DRIVER, ComponentKind::LanguageDriver),
            (RAW_LANGUAGE_DRIVER, ComponentKind::LanguageDriver),
            (TRACING_LOG_IMPL, ComponentKind::LogImpl),
            (NO_LOGGING_LOG_IMPL, ComponentKind::LogImpl),
            (DEFAULT_PROXY_FACTORY, ComponentKind::ProxyFactory),
        ] {
            self.register(TypeDescriptor::new(name, Component::Named(kind)));
        }
    }

    /// Registers `descriptor`, replacing any type of the same name.
    pub fn register(&mut self, descriptor: TypeDescriptor) -> &mut Self {
        debug!(name = descriptor.name(), kind = %descriptor.kind(), "Registering type");
        self.types.insert(descriptor.name.clone(), descriptor);
        self
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&TypeDescriptor> {
        self.types.get(name)
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.types.contains_key(name)
    }

    /// Types of `kind` declared under `package` (`package::...`, any depth), sorted by name.
    pub fn in_package<'a>(
        &'a self,
        package: &str,
        kind: ComponentKind,
    ) -> impl Iterator<Item = &'a TypeDescriptor> + use<'a> {
        let prefix = format!("{}::", package.trim_end_matches("::"));
        let mut found: Vec<&TypeDescriptor> = self
            .types
            .values()
            .filter(|descriptor| descriptor.kind() == kind && descriptor.name.starts_with(&prefix))
            .collect();
        found.sort_unstable_by(|a, b| a.name.cmp(&b.name));
        found.into_iter()
    }

    /// Every type under `package`, whatever its kind, sorted by name.
    pub fn all_in_package<'a>(
        &'a self,
        package: &str,
    ) -> impl Iterator<Item = &'a TypeDescriptor> + use<'a> {
        let prefix = format!("{}::", package.trim_end_matches("::"));
        let mut found: Vec<&TypeDescriptor> =
            self.types.values().filter(|descriptor| descriptor.name.starts_with(&prefix)).collect();
        found.sort_unstable_by(|a, b| a.name.cmp(&b.name));
        found.into_iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.types.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}
