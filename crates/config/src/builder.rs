//! # Configuration Builder
//!
//! Walks the sections of a configuration document in a fixed order and assembles one
//! [`Configuration`]. The order matters: variables are installed before any value that may
//! reference them is read, aliases before anything that names a type, and the environment
//! before the database id provider that classifies it.
//!
//! A builder is single-use. The first [`ConfigurationBuilder::build`] call consumes the parsed
//! document whether it succeeds or fails; any later call returns [`BuilderError::Reuse`].

use crate::components::{FileSystemLoader, ResourceLoader};
use crate::configuration::{Configuration, Environment};
use crate::error::{BuilderError, BuilderErrorExt, Stage};
use crate::jdbc::JdbcType;
use crate::properties::parse_property_source;
use crate::registry::{ComponentKind, MapperParser, NamespaceMapperParser, TypeRegistry};
use crate::resolver::{ComponentResolver, provider_alias};
use crate::settings::{Settings, resource_loader_name};
use mapr_parsing::{DocumentNavigator, NavigatorOptions, Properties, XNode};
use std::io::Read;
use std::mem;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info};
use url::Url;

/// Inputs of a build besides the document itself.
#[derive(Debug)]
pub struct BuilderOptions {
    environment: Option<String>,
    variables: Option<Properties>,
    types: Arc<TypeRegistry>,
    base_dir: PathBuf,
    validation: bool,
    resource_loader: Option<Box<dyn ResourceLoader>>,
    mapper_parser: Arc<dyn MapperParser>,
}

impl Default for BuilderOptions {
    fn default() -> Self {
        Self {
            environment: None,
            variables: None,
            types: Arc::new(TypeRegistry::default()),
            base_dir: PathBuf::from("."),
            validation: true,
            resource_loader: None,
            mapper_parser: Arc::new(NamespaceMapperParser),
        }
    }
}

impl BuilderOptions {
    /// Selects this environment instead of the document's `default`.
    #[must_use]
    pub fn environment(mut self, id: impl Into<String>) -> Self {
        self.environment = Some(id.into());
        self
    }

    /// Caller variables. They take precedence over every document source.
    #[must_use]
    pub fn variables(mut self, variables: Properties) -> Self {
        self.variables = Some(variables);
        self
    }

    #[must_use]
    pub fn types(mut self, types: Arc<TypeRegistry>) -> Self {
        self.types = types;
        self
    }

    /// Directory relative resource names are resolved against.
    #[must_use]
    pub fn base_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.base_dir = dir.into();
        self
    }

    /// Validation against the bundled grammar. On by default.
    #[must_use]
    pub const fn validation(mut self, enabled: bool) -> Self {
        self.validation = enabled;
        self
    }

    /// Loader used until `vfsImpl` names another. Defaults to a [`FileSystemLoader`] rooted at
    /// the base directory.
    #[must_use]
    pub fn resource_loader(mut self, loader: Box<dyn ResourceLoader>) -> Self {
        self.resource_loader = Some(loader);
        self
    }

    #[must_use]
    pub fn mapper_parser(mut self, parser: Arc<dyn MapperParser>) -> Self {
        self.mapper_parser = parser;
        self
    }
}

#[derive(Debug)]
struct Pending {
    navigator: DocumentNavigator,
    options: BuilderOptions,
}

#[derive(Debug)]
enum BuildState {
    Unbuilt(Box<Pending>),
    Built,
}

/// One-shot assembler of a [`Configuration`].
///
/// ```rust
/// use mapr_config::{BuilderOptions, ConfigurationBuilder};
///
/// let xml = r#"
///   <configuration>
///     <environments default="dev">
///       <environment id="dev">
///         <transactionManager type="JDBC"/>
///         <dataSource type="UNPOOLED">
///           <property name="url" value="jdbc:h2:mem:test"/>
///         </dataSource>
///       </environment>
///     </environments>
///   </configuration>"#;
///
/// let mut builder = ConfigurationBuilder::parse(xml, BuilderOptions::default().validation(false))?;
/// let configuration = builder.build()?;
/// assert_eq!(configuration.environment().map(|env| env.id()), Some("dev"));
/// assert!(builder.build().is_err());
/// # Ok::<(), mapr_config::BuilderError>(())
/// ```
#[derive(Debug)]
pub struct ConfigurationBuilder {
    state: BuildState,
}

impl ConfigurationBuilder {
    /// # Errors
    /// [`BuilderError::Document`] when the text does not parse or validate.
    pub fn parse(text: &str, options: BuilderOptions) -> Result<Self, BuilderError> {
        let navigator = DocumentNavigator::parse(text, Self::navigator_options(&options))?;
        Ok(Self::pending(navigator, options))
    }

    /// # Errors
    /// [`BuilderError::Document`] when reading, parsing or validation fails.
    pub fn read(reader: impl Read, options: BuilderOptions) -> Result<Self, BuilderError> {
        let navigator = DocumentNavigator::read(reader, Self::navigator_options(&options))?;
        Ok(Self::pending(navigator, options))
    }

    /// Builds from an already parsed document. Caller variables replace the navigator's table.
    #[must_use]
    pub fn from_navigator(navigator: DocumentNavigator, options: BuilderOptions) -> Self {
        if let Some(variables) = &options.variables {
            navigator.set_variables(variables.clone());
        }
        Self::pending(navigator, options)
    }

    fn navigator_options(options: &BuilderOptions) -> NavigatorOptions {
        NavigatorOptions::default()
            .validation(options.validation)
            .variables(options.variables.clone().unwrap_or_default())
    }

    fn pending(navigator: DocumentNavigator, options: BuilderOptions) -> Self {
        Self { state: BuildState::Unbuilt(Box::new(Pending { navigator, options })) }
    }

    /// Whether [`Self::build`] has been called.
    #[must_use]
    pub const fn is_built(&self) -> bool {
        matches!(self.state, BuildState::Built)
    }

    /// Assembles the configuration.
    ///
    /// # Errors
    /// [`BuilderError::Reuse`] on every call after the first. Otherwise the failure of the first
    /// section that failed, wrapped in [`BuilderError::Build`] naming that section.
    pub fn build(&mut self) -> Result<Configuration, BuilderError> {
        let BuildState::Unbuilt(pending) = mem::replace(&mut self.state, BuildState::Built) else {
            return Err(BuilderError::Reuse { context: None });
        };
        let Pending { navigator, options } = *pending;
        Assembly::new(navigator, options).run()
    }
}

/// State of a build in progress.
struct Assembly {
    navigator: DocumentNavigator,
    configuration: Configuration,
    types: Arc<TypeRegistry>,
    environment: Option<String>,
    variables: Option<Properties>,
    base_dir: PathBuf,
    mapper_parser: Arc<dyn MapperParser>,
}

impl Assembly {
    fn new(navigator: DocumentNavigator, options: BuilderOptions) -> Self {
        let mut configuration = Configuration::new(Arc::clone(&options.types));
        let loader = options
            .resource_loader
            .unwrap_or_else(|| Box::new(FileSystemLoader::new(options.base_dir.clone())));
        configuration.set_resource_loader(loader);

        Self {
            navigator,
            configuration,
            types: options.types,
            environment: options.environment,
            variables: options.variables,
            base_dir: options.base_dir,
            mapper_parser: options.mapper_parser,
        }
    }

    fn run(mut self) -> Result<Configuration, BuilderError> {
        info!("Building configuration");
        self.stage(Stage::Configuration, |this| match this.navigator.eval_node("/configuration")? {
            Some(_) => Ok(()),
            None => Err(BuilderError::missing("the document has no <configuration> root element")),
        })?;

        self.stage(Stage::SettingsKeys, |this| Settings::validate_keys(&this.settings()?))?;
        self.stage(Stage::Properties, Self::properties_element)?;
        let settings = self.settings()?;
        self.stage(Stage::ResourceLoader, |this| this.resource_loader_element(&settings))?;
        self.stage(Stage::TypeAliases, Self::type_aliases_element)?;
        self.stage(Stage::Plugins, Self::plugins_element)?;
        self.stage(Stage::ObjectFactory, Self::object_factory_element)?;
        self.stage(Stage::ObjectWrapperFactory, Self::object_wrapper_factory_element)?;
        self.stage(Stage::ReflectionFactory, Self::reflection_factory_element)?;
        self.stage(Stage::Settings, |this| this.settings_element(&settings))?;
        self.stage(Stage::Environments, Self::environments_element)?;
        self.stage(Stage::DatabaseIdProvider, Self::database_id_provider_element)?;
        self.stage(Stage::TypeHandlers, Self::type_handlers_element)?;
        self.stage(Stage::Mappers, Self::mappers_element)?;

        info!(
            environment = self.configuration.environment().map(Environment::id),
            database_id = self.configuration.database_id(),
            interceptors = self.configuration.interceptor_chain().len(),
            mappers = self.configuration.mapper_registry().mappers().len(),
            statements = self.configuration.mapped_statements().len(),
            "Configuration built"
        );
        Ok(self.configuration)
    }

    fn stage<T>(
        &mut self,
        stage: Stage,
        step: impl FnOnce(&mut Self) -> Result<T, BuilderError>,
    ) -> Result<T, BuilderError> {
        debug!(%stage, "Processing section");
        step(self).map_err(|err| err.at(stage))
    }

    /// A top-level section, evaluated against the current variable table.
    fn section(&self, name: &str) -> Result<Option<XNode>, BuilderError> {
        Ok(self.navigator.eval_node(&format!("/configuration/{name}"))?)
    }

    fn resolver(&self) -> ComponentResolver<'_> {
        ComponentResolver::new(self.configuration.type_aliases(), &self.types)
    }

    fn settings(&self) -> Result<Properties, BuilderError> {
        Ok(self.section("settings")?.map(|node| node.children_as_properties()).unwrap_or_default())
    }

    fn properties_element(&mut self) -> Result<(), BuilderError> {
        let mut variables = Properties::new();
        if let Some(node) = self.section("properties")? {
            variables = node.children_as_properties();
            let file = match (node.string_attribute("resource"), node.string_attribute("url")) {
                (Some(_), Some(_)) => {
                    return Err(BuilderError::AmbiguousSource {
                        message: "The properties element cannot specify both a URL and a resource based property file reference. Please specify one or the other.".into(),
                        context: None,
                    });
                },
                (Some(resource), None) => {
                    let text = self.configuration.resource_loader().read(&resource)?;
                    Some(parse_property_source(&resource, &text)?)
                },
                (None, Some(url)) => {
                    let parsed = Url::parse(&url).context(url.clone())?;
                    let text = self.configuration.resource_loader().read_url(&parsed)?;
                    Some(parse_property_source(parsed.path(), &text)?)
                },
                (None, None) => None,
            };
            if let Some(file) = file {
                variables.merge(&file);
            }
        }
        if let Some(caller) = &self.variables {
            variables.merge(caller);
        }

        debug!(count = variables.len(), "Installing variables");
        self.navigator.set_variables(variables.clone());
        self.configuration.set_variables(variables);
        Ok(())
    }

    fn resource_loader_element(&mut self, settings: &Properties) -> Result<(), BuilderError> {
        let Some(name) = resource_loader_name(settings) else {
            return Ok(());
        };
        let mut loader = self.resolver().resource_loader(name)?;
        loader.set_base_dir(&self.base_dir);
        info!(loader = name, "Resource loader overridden");
        self.configuration.set_resource_loader(loader);
        Ok(())
    }

    fn type_aliases_element(&mut self) -> Result<(), BuilderError> {
        let Some(node) = self.section("typeAliases")? else {
            return Ok(());
        };
        let types = Arc::clone(&self.types);
        for child in node.children() {
            if child.name() == "package" {
                let package = required(&child, "name")?;
                let aliases = self.configuration.type_aliases_mut();
                for descriptor in types.all_in_package(&package) {
                    if descriptor.kind() != ComponentKind::Mapper {
                        aliases.register(descriptor.default_alias(), descriptor.name());
                    }
                }
            } else {
                let type_name = required(&child, "type")?;
                let descriptor = types.get(&type_name).ok_or_else(|| {
                    BuilderError::resolution(&type_name, "Error registering typeAlias: type is not registered")
                })?;
                let alias = child.string_attribute("alias");
                let alias = alias.as_deref().unwrap_or_else(|| descriptor.default_alias());
                self.configuration.type_aliases_mut().register(alias, descriptor.name());
            }
        }
        Ok(())
    }

    fn plugins_element(&mut self) -> Result<(), BuilderError> {
        let Some(node) = self.section("plugins")? else {
            return Ok(());
        };
        for plugin in node.children() {
            let name = required(&plugin, "interceptor")?;
            let mut interceptor = self.resolver().interceptor(&name)?;
            interceptor.set_properties(plugin.children_as_properties());
            debug!(interceptor = %name, position = self.configuration.interceptor_chain().len(), "Registered interceptor");
            self.configuration.interceptor_chain_mut().add(Arc::from(interceptor));
        }
        Ok(())
    }

    fn object_factory_element(&mut self) -> Result<(), BuilderError> {
        let Some(node) = self.section("objectFactory")? else {
            return Ok(());
        };
        let mut factory = self.resolver().object_factory(&required(&node, "type")?)?;
        factory.set_properties(node.children_as_properties());
        self.configuration.set_object_factory(factory);
        Ok(())
    }

    fn object_wrapper_factory_element(&mut self) -> Result<(), BuilderError> {
        let Some(node) = self.section("objectWrapperFactory")? else {
            return Ok(());
        };
        let factory = self.resolver().object_wrapper_factory(&required(&node, "type")?)?;
        self.configuration.set_object_wrapper_factory(factory);
        Ok(())
    }

    fn reflection_factory_element(&mut self) -> Result<(), BuilderError> {
        let Some(node) = self.section("reflectionFactory")? else {
            return Ok(());
        };
        let factory = self.resolver().reflector_factory(&required(&node, "type")?)?;
        self.configuration.set_reflector_factory(factory);
        Ok(())
    }

    fn settings_element(&mut self, settings: &Properties) -> Result<(), BuilderError> {
        let settings = Settings::from_properties(settings, &self.resolver())?;
        self.configuration.set_settings(settings);
        Ok(())
    }

    fn environments_element(&mut self) -> Result<(), BuilderError> {
        let Some(node) = self.section("environments")? else {
            return Ok(());
        };
        let requested = match self.environment.clone().or_else(|| node.string_attribute("default")) {
            Some(id) => id,
            None => return Err(BuilderError::missing("No environment specified.")),
        };

        let mut selected = None;
        for environment in node.children() {
            let id = environment
                .string_attribute("id")
                .ok_or_else(|| BuilderError::missing("Environment requires an id attribute."))?;
            if id == requested && selected.is_none() {
                selected = Some(self.build_environment(&environment, id)?);
            }
        }

        let environment = selected.ok_or_else(|| {
            BuilderError::missing(format!("Environment \"{requested}\" is not declared."))
        })?;
        info!(environment = environment.id(), kind = %environment.data_source().kind, "Environment selected");
        self.configuration.set_environment(environment);
        Ok(())
    }

    fn build_environment(&self, node: &XNode, id: String) -> Result<Environment, BuilderError> {
        let resolver = self.resolver();

        let transaction = node.eval_node("transactionManager")?.ok_or_else(|| {
            BuilderError::missing("Environment declaration requires a TransactionFactory.")
        })?;
        let mut transaction_factory = resolver.transaction_factory(&required(&transaction, "type")?)?;
        transaction_factory
            .set_properties(&transaction.children_as_properties())
            .context(transaction.path())?;

        let data_source = node.eval_node("dataSource")?.ok_or_else(|| {
            BuilderError::missing("Environment declaration requires a DataSource.")
        })?;
        let mut data_source_factory = resolver.data_source_factory(&required(&data_source, "type")?)?;
        data_source_factory
            .set_properties(&data_source.children_as_properties())
            .context(data_source.path())?;

        Ok(Environment::new(id, transaction_factory, data_source_factory))
    }

    fn database_id_provider_element(&mut self) -> Result<(), BuilderError> {
        let Some(node) = self.section("databaseIdProvider")? else {
            return Ok(());
        };
        let name = required(&node, "type")?;
        let mut provider = self.resolver().database_id_provider(provider_alias(&name))?;
        provider.set_properties(node.children_as_properties());
        let Some(environment) = self.configuration.environment() else {
            debug!("No environment, database id provider skipped");
            return Ok(());
        };
        let database_id = provider.database_id(environment.data_source())?;

        info!(database_id = database_id.as_deref(), "Database id resolved");
        self.configuration.set_database_id(database_id);
        Ok(())
    }

    fn type_handlers_element(&mut self) -> Result<(), BuilderError> {
        let Some(node) = self.section("typeHandlers")? else {
            return Ok(());
        };
        let types = Arc::clone(&self.types);
        for child in node.children() {
            if child.name() == "package" {
                let package = required(&child, "name")?;
                for descriptor in types.in_package(&package, ComponentKind::TypeHandler) {
                    self.register_handler(descriptor.name(), descriptor.mapped_types(), None);
                }
                continue;
            }

            let handler = required(&child, "handler")?;
            let handler = self.resolver().resolve_kind(&handler, ComponentKind::TypeHandler)?.clone();
            let jdbc_type = child.string_attribute("jdbcType").map(|token| JdbcType::resolve(&token)).transpose()?;
            match child.string_attribute("javaType") {
                Some(value_type) => {
                    let value_type = self.resolver().resolve(&value_type)?.name().to_owned();
                    self.configuration.type_handlers_mut().register(&value_type, jdbc_type, handler.name());
                },
                None => self.register_handler(handler.name(), handler.mapped_types(), jdbc_type),
            }
        }
        Ok(())
    }

    fn register_handler(&mut self, handler: &str, mapped_types: &[String], jdbc_type: Option<JdbcType>) {
        let handlers = self.configuration.type_handlers_mut();
        if mapped_types.is_empty() {
            handlers.register_unmapped(handler);
        }
        for value_type in mapped_types {
            handlers.register(value_type, jdbc_type, handler);
        }
    }

    fn mappers_element(&mut self) -> Result<(), BuilderError> {
        let Some(node) = self.section("mappers")? else {
            return Ok(());
        };
        let types = Arc::clone(&self.types);
        for child in node.children() {
            if child.name() == "package" {
                let package = required(&child, "name")?;
                for descriptor in types.in_package(&package, ComponentKind::Mapper) {
                    self.add_mapper_type(descriptor.name())?;
                }
                continue;
            }

            let source = (
                child.string_attribute("resource"),
                child.string_attribute("url"),
                child.string_attribute("class"),
            );
            match source {
                (Some(resource), None, None) => {
                    let text = self.configuration.resource_loader().read(&resource)?;
                    self.load_mapper_resource(&resource, &text)?;
                },
                (None, Some(url), None) => {
                    let parsed = Url::parse(&url).context(url.clone())?;
                    let text = self.configuration.resource_loader().read_url(&parsed)?;
                    self.load_mapper_resource(&url, &text)?;
                },
                (None, None, Some(class)) => {
                    let name = self.resolver().resolve_kind(&class, ComponentKind::Mapper)?.name().to_owned();
                    self.add_mapper_type(&name)?;
                },
                _ => {
                    return Err(BuilderError::AmbiguousSource {
                        message: "A mapper element may only specify a url, resource or class, but not more than one.".into(),
                        context: Some(child.path().into()),
                    });
                },
            }
        }
        Ok(())
    }

    /// Registers a mapper type together with its companion document (`app/BlogMapper.xml` for
    /// `app::BlogMapper`) when one exists.
    fn add_mapper_type(&mut self, type_name: &str) -> Result<(), BuilderError> {
        self.configuration.mapper_registry_mut().add_mapper(type_name)?;
        let companion = format!("{}.xml", type_name.replace("::", "/"));
        if !self.configuration.mapper_registry().is_resource_loaded(&companion)
            && self.configuration.resource_loader().exists(&companion)
        {
            let text = self.configuration.resource_loader().read(&companion)?;
            self.load_mapper_resource(&companion, &text)?;
        }
        Ok(())
    }

    fn load_mapper_resource(&mut self, resource: &str, text: &str) -> Result<(), BuilderError> {
        if !self.configuration.mapper_registry_mut().mark_resource_loaded(resource) {
            debug!(resource, "Mapper resource already loaded");
            return Ok(());
        }
        debug!(resource, "Parsing mapper resource");
        let parser = Arc::clone(&self.mapper_parser);
        parser.parse(resource, text, &mut self.configuration).context(resource.to_owned())
    }
}

fn required(node: &XNode, attribute: &str) -> Result<String, BuilderError> {
    node.string_attribute(attribute).ok_or_else(|| {
        BuilderError::missing(format!("attribute \"{attribute}\" is required on {}", node.path()))
    })
}
