//! Assembles one immutable data-access configuration from an XML document.
//!
//! The [`ConfigurationBuilder`] walks the document sections in a fixed order: variables,
//! resource loader, type aliases, plugins, object strategies, settings, environment, database
//! id, type handlers and mappers. Names written in the document are turned into components
//! through the [`ComponentResolver`], which looks them up as aliases first and then as
//! fully-qualified names in the [`TypeRegistry`]. There is no runtime class loading: every type
//! a document may name is registered up front, together with its constructor.
//!
//! ## Variable Precedence
//!
//! `${key}` placeholders are resolved against one merged table, lowest to highest:
//!
//! ```text
//! <property> children  <  resource/url property file  <  caller variables
//! ```
//!
//! ## Example
//!
//! ```rust
//! use mapr_config::prelude::*;
//! use mapr_parsing::Properties;
//!
//! let xml = r#"
//!   <configuration>
//!     <properties>
//!       <property name="env" value="dev"/>
//!     </properties>
//!     <settings>
//!       <setting name="defaultExecutorType" value="${executor}"/>
//!     </settings>
//!     <environments default="${env}">
//!       <environment id="dev">
//!         <transactionManager type="MANAGED"/>
//!         <dataSource type="POOLED">
//!           <property name="url" value="jdbc:postgresql://localhost/app"/>
//!         </dataSource>
//!       </environment>
//!     </environments>
//!     <databaseIdProvider type="DB_VENDOR"/>
//!   </configuration>"#;
//!
//! let vars: Properties = [("executor", "REUSE")].into_iter().collect();
//! let options = BuilderOptions::default().validation(false).variables(vars);
//! let configuration = ConfigurationBuilder::parse(xml, options)?.build()?;
//!
//! assert_eq!(configuration.settings().default_executor_type, ExecutorType::Reuse);
//! assert_eq!(configuration.database_id(), Some("postgresql"));
//! # Ok::<(), BuilderError>(())
//! ```

mod builder;
mod components;
mod configuration;
mod error;
mod jdbc;
pub mod plugin;
mod properties;
mod registry;
mod resolver;
mod settings;

pub use builder::{BuilderOptions, ConfigurationBuilder};
pub use components::extensions;
pub use components::{
    DataSource, DataSourceFactory, DataSourceKind, DatabaseIdProvider, DefaultObjectFactory,
    DefaultObjectWrapperFactory, DefaultReflectorFactory, FileSystemLoader, JdbcTransactionFactory,
    JndiDataSourceFactory, JndiSettings, ManagedTransactionFactory, ObjectFactory,
    ObjectWrapperFactory, PoolSettings, PooledDataSourceFactory, ReflectorFactory, ResourceLoader,
    TransactionFactory, UnpooledDataSourceFactory, VendorDatabaseIdProvider, file_url_path,
};
pub use configuration::{Configuration, Environment};
pub use error::{BuilderError, BuilderErrorExt, Stage};
pub use jdbc::JdbcType;
pub use properties::{collect_properties, format_for, parse_property_source};
pub use registry::{
    Component, ComponentKind, Constructor, MapperParser, MapperRegistry, NamespaceMapperParser,
    TypeAliasRegistry, TypeDescriptor, TypeHandlerRegistry, TypeRegistry,
};
pub use resolver::{ComponentResolver, provider_alias};
pub use settings::{
    AutoMappingBehavior, ExecutorType, KNOWN_SETTINGS, LocalCacheScope, Settings,
    resource_loader_name,
};

pub mod prelude {
    pub use crate::builder::{BuilderOptions, ConfigurationBuilder};
    pub use crate::configuration::{Configuration, Environment};
    pub use crate::error::{BuilderError, BuilderErrorExt, Stage};
    pub use crate::jdbc::JdbcType;
    pub use crate::plugin::{Interceptor, InterceptorChain, Invocation, Signature, Target, TargetKind};
    pub use crate::registry::{Component, ComponentKind, TypeDescriptor, TypeRegistry};
    pub use crate::settings::{AutoMappingBehavior, ExecutorType, LocalCacheScope, Settings};
}
