//! Facade crate for the configuration engine.
//! Re-exports the parsing and assembly crates and offers the session factory entry point.
//! Keep this crate thin: it composes other crates, it does not implement assembly logic.
//!
//! ## Usage
//! ```rust
//! use mapr::SessionFactoryBuilder;
//!
//! let xml = r#"<configuration>
//!   <environments default="dev">
//!     <environment id="dev">
//!       <transactionManager type="JDBC"/>
//!       <dataSource type="UNPOOLED"><property name="url" value="${url}"/></dataSource>
//!     </environment>
//!   </environments>
//! </configuration>"#;
//!
//! let vars = [("url", "jdbc:h2:mem:app")].into_iter().collect();
//! let factory = SessionFactoryBuilder::new()
//!     .validation(false)
//!     .build(xml.as_bytes(), None, Some(vars))?;
//! let url = factory.configuration().environment().and_then(|env| env.data_source().url.as_deref());
//! assert_eq!(url, Some("jdbc:h2:mem:app"));
//! # Ok::<(), mapr::config::BuilderError>(())
//! ```

use mapr_config::{BuilderError, BuilderOptions, Configuration, ConfigurationBuilder, TypeRegistry};
use mapr_parsing::Properties;
use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

pub use mapr_config as config;
pub use mapr_parsing as parsing;

/// Shares one assembled configuration read-only.
#[derive(Debug, Clone)]
pub struct SessionFactory {
    configuration: Arc<Configuration>,
}

impl SessionFactory {
    #[must_use]
    pub fn new(configuration: Configuration) -> Self {
        Self { configuration: Arc::new(configuration) }
    }

    #[must_use]
    pub fn configuration(&self) -> &Configuration {
        &self.configuration
    }

    /// A shared handle to the configuration.
    #[must_use]
    pub fn shared(&self) -> Arc<Configuration> {
        Arc::clone(&self.configuration)
    }
}

/// Entry point: reads a configuration document and wraps the result in a [`SessionFactory`].
#[derive(Debug, Clone)]
pub struct SessionFactoryBuilder {
    types: Arc<TypeRegistry>,
    base_dir: Option<PathBuf>,
    validation: bool,
}

impl Default for SessionFactoryBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionFactoryBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self { types: Arc::new(TypeRegistry::default()), base_dir: None, validation: true }
    }

    /// Types the document may name. Start from `TypeRegistry::default()` to keep the built-ins.
    #[must_use]
    pub fn types(mut self, types: Arc<TypeRegistry>) -> Self {
        self.types = types;
        self
    }

    #[must_use]
    pub fn base_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.base_dir = Some(dir.into());
        self
    }

    #[must_use]
    pub const fn validation(mut self, enabled: bool) -> Self {
        self.validation = enabled;
        self
    }

    /// Builds a factory from `reader`, optionally selecting an environment and supplying
    /// caller variables.
    ///
    /// # Errors
    /// Any [`BuilderError`] raised while reading or assembling the document.
    pub fn build(
        &self,
        reader: impl Read,
        environment: Option<&str>,
        variables: Option<Properties>,
    ) -> Result<SessionFactory, BuilderError> {
        let mut options =
            BuilderOptions::default().types(Arc::clone(&self.types)).validation(self.validation);
        if let Some(environment) = environment {
            options = options.environment(environment);
        }
        if let Some(variables) = variables {
            options = options.variables(variables);
        }
        if let Some(dir) = &self.base_dir {
            options = options.base_dir(dir.clone());
        }

        let configuration = ConfigurationBuilder::read(reader, options)?.build()?;
        info!(
            environment = configuration.environment().map(|env| env.id()),
            "Session factory ready"
        );
        Ok(SessionFactory::new(configuration))
    }
}
