//! The assembled configuration graph.

use crate::components::{
    DataSource, DataSourceFactory, DefaultObjectFactory, DefaultObjectWrapperFactory,
    DefaultReflectorFactory, FileSystemLoader, ObjectFactory, ObjectWrapperFactory, ReflectorFactory,
    ResourceLoader, TransactionFactory,
};
use crate::error::BuilderError;
use crate::plugin::{InterceptorChain, Target};
use crate::registry::{MapperRegistry, TypeAliasRegistry, TypeHandlerRegistry, TypeRegistry};
use crate::settings::Settings;
use fxhash::FxHashMap;
use mapr_parsing::Properties;
use std::sync::Arc;

/// The active environment: its id and the components built for it.
#[derive(Debug)]
pub struct Environment {
    id: String,
    transaction_factory: Box<dyn TransactionFactory>,
    data_source_factory: Box<dyn DataSourceFactory>,
    data_source: DataSource,
}

impl Environment {
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        transaction_factory: Box<dyn TransactionFactory>,
        data_source_factory: Box<dyn DataSourceFactory>,
    ) -> Self {
        let data_source = data_source_factory.data_source();
        Self { id: id.into(), transaction_factory, data_source_factory, data_source }
    }

    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[must_use]
    pub fn transaction_factory(&self) -> &dyn TransactionFactory {
        self.transaction_factory.as_ref()
    }

    #[must_use]
    pub fn data_source_factory(&self) -> &dyn DataSourceFactory {
        self.data_source_factory.as_ref()
    }

    #[must_use]
    pub const fn data_source(&self) -> &DataSource {
        &self.data_source
    }
}

/// Root aggregate produced by [`ConfigurationBuilder`](crate::ConfigurationBuilder).
///
/// Mutated only while a build runs; shared read-only afterwards.
#[derive(Debug)]
pub struct Configuration {
    variables: Properties,
    types: Arc<TypeRegistry>,
    type_aliases: TypeAliasRegistry,
    type_handlers: TypeHandlerRegistry,
    interceptor_chain: InterceptorChain,
    environment: Option<Environment>,
    database_id: Option<String>,
    mapper_registry: MapperRegistry,
    mapped_statements: FxHashMap<String, String>,
    settings: Settings,
    object_factory: Box<dyn ObjectFactory>,
    object_wrapper_factory: Box<dyn ObjectWrapperFactory>,
    reflector_factory: Box<dyn ReflectorFactory>,
    resource_loader: Box<dyn ResourceLoader>,
}

impl Default for Configuration {
    fn default() -> Self {
        Self::new(Arc::new(TypeRegistry::default()))
    }
}

impl Configuration {
    /// An empty configuration with built-in aliases, handlers and default strategies.
    #[must_use]
    pub fn new(types: Arc<TypeRegistry>) -> Self {
        Self {
            variables: Properties::new(),
            types,
            type_aliases: TypeAliasRegistry::default(),
            type_handlers: TypeHandlerRegistry::default(),
            interceptor_chain: InterceptorChain::default(),
            environment: None,
            database_id: None,
            mapper_registry: MapperRegistry::default(),
            mapped_statements: FxHashMap::default(),
            settings: Settings::default(),
            object_factory: Box::new(DefaultObjectFactory::default()),
            object_wrapper_factory: Box::new(DefaultObjectWrapperFactory),
            reflector_factory: Box::new(DefaultReflectorFactory::default()),
            resource_loader: Box::new(FileSystemLoader::default()),
        }
    }

    #[must_use]
    pub const fn variables(&self) -> &Properties {
        &self.variables
    }

    pub fn set_variables(&mut self, variables: Properties) {
        self.variables = variables;
    }

    #[must_use]
    pub fn type_registry(&self) -> &TypeRegistry {
        &self.types
    }

    #[must_use]
    pub const fn type_aliases(&self) -> &TypeAliasRegistry {
        &self.type_aliases
    }

    pub const fn type_aliases_mut(&mut self) -> &mut TypeAliasRegistry {
        &mut self.type_aliases
    }

    #[must_use]
    pub const fn type_handlers(&self) -> &TypeHandlerRegistry {
        &self.type_handlers
    }

    pub const fn type_handlers_mut(&mut self) -> &mut TypeHandlerRegistry {
        &mut self.type_handlers
    }

    #[must_use]
    pub const fn interceptor_chain(&self) -> &InterceptorChain {
        &self.interceptor_chain
    }

    pub const fn interceptor_chain_mut(&mut self) -> &mut InterceptorChain {
        &mut self.interceptor_chain
    }

    /// Wraps `target` with every interceptor, last declared outermost.
    #[must_use]
    pub fn plugin_all(&self, target: Arc<dyn Target>) -> Arc<dyn Target> {
        self.interceptor_chain.plugin_all(target)
    }

    #[must_use]
    pub const fn environment(&self) -> Option<&Environment> {
        self.environment.as_ref()
    }

    pub fn set_environment(&mut self, environment: Environment) {
        self.environment = Some(environment);
    }

    #[must_use]
    pub fn database_id(&self) -> Option<&str> {
        self.database_id.as_deref()
    }

    pub fn set_database_id(&mut self, database_id: Option<String>) {
        self.database_id = database_id;
    }

    #[must_use]
    pub const fn mapper_registry(&self) -> &MapperRegistry {
        &self.mapper_registry
    }

    pub const fn mapper_registry_mut(&mut self) -> &mut MapperRegistry {
        &mut self.mapper_registry
    }

    /// Records a statement id and the resource that declared it.
    ///
    /// # Errors
    /// [`BuilderError::Duplicate`] when the id is already taken.
    pub fn add_mapped_statement(&mut self, id: String, resource: &str) -> Result<(), BuilderError> {
        if let Some(previous) = self.mapped_statements.get(&id) {
            return Err(BuilderError::Duplicate {
                message: format!("Mapped statement {id} already declared in {previous}").into(),
                context: Some(resource.to_owned().into()),
            });
        }
        self.mapped_statements.insert(id, resource.to_owned());
        Ok(())
    }

    #[must_use]
    pub fn has_statement(&self, id: &str) -> bool {
        self.mapped_statements.contains_key(id)
    }

    /// Statement ids, sorted.
    #[must_use]
    pub fn mapped_statements(&self) -> Vec<&str> {
        let mut ids: Vec<_> = self.mapped_statements.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    #[must_use]
    pub const fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn set_settings(&mut self, settings: Settings) {
        self.settings = settings;
    }

    #[must_use]
    pub fn object_factory(&self) -> &dyn ObjectFactory {
        self.object_factory.as_ref()
    }

    pub fn set_object_factory(&mut self, factory: Box<dyn ObjectFactory>) {
        self.object_factory = factory;
    }

    #[must_use]
    pub fn object_wrapper_factory(&self) -> &dyn ObjectWrapperFactory {
        self.object_wrapper_factory.as_ref()
    }

    pub fn set_object_wrapper_factory(&mut self, factory: Box<dyn ObjectWrapperFactory>) {
        self.object_wrapper_factory = factory;
    }

    #[must_use]
    pub fn reflector_factory(&self) -> &dyn ReflectorFactory {
        self.reflector_factory.as_ref()
    }

    pub fn set_reflector_factory(&mut self, factory: Box<dyn ReflectorFactory>) {
        self.reflector_factory = factory;
    }

    #[must_use]
    pub fn resource_loader(&self) -> &dyn ResourceLoader {
        self.resource_loader.as_ref()
    }

    pub fn set_resource_loader(&mut self, loader: Box<dyn ResourceLoader>) {
        self.resource_loader = loader;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statements_are_unique() {
        let mut configuration = Configuration::default();
        configuration.add_mapped_statement("app.BlogMapper.select".to_owned(), "a.xml").unwrap();
        let err = configuration
            .add_mapped_statement("app.BlogMapper.select".to_owned(), "b.xml")
            .unwrap_err();
        assert_eq!(err.kind(), "duplicate");
        assert!(err.to_string().contains("a.xml"));
        assert_eq!(configuration.mapped_statements(), vec!["app.BlogMapper.select"]);
    }

    #[test]
    fn defaults_are_installed() {
        let configuration = Configuration::default();
        assert!(configuration.environment().is_none());
        assert!(configuration.interceptor_chain().is_empty());
        assert!(configuration.type_aliases().contains("POOLED"));
        assert!(configuration.reflector_factory().is_class_cache_enabled());
    }

    #[test]
    fn configuration_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Configuration>();
    }
}
