use crate::configuration::Configuration;
use crate::error::BuilderError;
use crate::registry::types::ComponentKind;
use fxhash::FxHashSet;
use mapr_parsing::{DocumentNavigator, NavigatorOptions};
use std::fmt::Debug;
use tracing::debug;

const STATEMENT_ELEMENTS: &[&str] = &["select", "insert", "update", "delete"];

/// Registered mapper types and the resources already loaded.
#[derive(Debug, Clone, Default)]
pub struct MapperRegistry {
    mappers: Vec<String>,
    known: FxHashSet<String>,
    loaded_resources: FxHashSet<String>,
}

impl MapperRegistry {
    /// # Errors
    /// [`BuilderError::Duplicate`] when the type is already registered.
    pub fn add_mapper(&mut self, type_name: &str) -> Result<(), BuilderError> {
        if !self.known.insert(type_name.to_owned()) {
            return Err(BuilderError::Duplicate {
                message: format!("Type {type_name} is already known to the MapperRegistry").into(),
                context: None,
            });
        }
        debug!(mapper = type_name, "Registered mapper");
        self.mappers.push(type_name.to_owned());
        Ok(())
    }

    #[must_use]
    pub fn has_mapper(&self, type_name: &str) -> bool {
        self.known.contains(type_name)
    }

    /// Mapper types in registration order.
    #[must_use]
    pub fn mappers(&self) -> &[String] {
        &self.mappers
    }

    #[must_use]
    pub fn is_resource_loaded(&self, resource: &str) -> bool {
        self.loaded_resources.contains(resource)
    }

    /// Returns `false` when the resource was already marked.
    pub fn mark_resource_loaded(&mut self, resource: &str) -> bool {
        self.loaded_resources.insert(resource.to_owned())
    }

    #[must_use]
    pub fn loaded_resources(&self) -> Vec<&str> {
        let mut resources: Vec<_> = self.loaded_resources.iter().map(String::as_str).collect();
        resources.sort_unstable();
        resources
    }
}

/// Turns a mapper document into registrations on the configuration under construction.
pub trait MapperParser: Debug + Send + Sync {
    /// # Errors
    /// Any failure aborts the build.
    fn parse(
        &self,
        resource: &str,
        source: &str,
        configuration: &mut Configuration,
    ) -> Result<(), BuilderError>;
}

/// Reads `<mapper namespace="...">` documents.
///
/// Records every `select`, `insert`, `update` and `delete` id as `namespace.id`, and registers
/// the namespace as a mapper type when a mapper type of that name is known.
#[derive(Debug, Default, Clone, Copy)]
pub struct NamespaceMapperParser;

impl MapperParser for NamespaceMapperParser {
    fn parse(
        &self,
        resource: &str,
        source: &str,
        configuration: &mut Configuration,
    ) -> Result<(), BuilderError> {
        let options = NavigatorOptions::default().variables(configuration.variables().clone());
        let navigator = DocumentNavigator::parse(source, options)?;
        let mapper = navigator
            .eval_node("/mapper")?
            .ok_or_else(|| BuilderError::missing(format!("{resource} has no <mapper> root")))?;

        let namespace = mapper
            .string_attribute("namespace")
            .filter(|ns| !ns.is_empty())
            .ok_or_else(|| BuilderError::missing("Mapper's namespace cannot be empty"))?;

        for statement in mapper.children() {
            if !STATEMENT_ELEMENTS.contains(&statement.name()) {
                continue;
            }
            let id = statement.string_attribute("id").ok_or_else(|| {
                BuilderError::missing(format!("<{}> in {resource} has no id", statement.name()))
            })?;
            configuration.add_mapped_statement(format!("{namespace}.{id}"), resource)?;
        }

        let binds_type = configuration
            .type_registry()
            .get(&namespace)
            .is_some_and(|descriptor| descriptor.kind() == ComponentKind::Mapper);
        if binds_type && !configuration.mapper_registry().has_mapper(&namespace) {
            configuration.mapper_registry_mut().add_mapper(&namespace)?;
        }
        Ok(())
    }
}
