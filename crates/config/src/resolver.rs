//! Resolution of type names written in a configuration document.

use crate::components::{
    DataSourceFactory, DatabaseIdProvider, ObjectFactory, ObjectWrapperFactory, ReflectorFactory,
    ResourceLoader, TransactionFactory,
};
use crate::error::BuilderError;
use crate::plugin::Interceptor;
use crate::registry::{Component, ComponentKind, Constructor, TypeAliasRegistry, TypeDescriptor, TypeRegistry};

const LEGACY_VENDOR_PROVIDER: &str = "VENDOR";
const VENDOR_PROVIDER: &str = "DB_VENDOR";

/// `VENDOR` is the legacy name of the `DB_VENDOR` database id provider.
#[must_use]
pub fn provider_alias(name: &str) -> &str {
    if name == LEGACY_VENDOR_PROVIDER { VENDOR_PROVIDER } else { name }
}

/// Looks names up as aliases first, then as fully-qualified type names.
#[derive(Debug, Clone, Copy)]
pub struct ComponentResolver<'a> {
    aliases: &'a TypeAliasRegistry,
    types: &'a TypeRegistry,
}

macro_rules! instantiate {
    ($(#[$doc:meta])* $name:ident, $variant:ident, $trait:ident) => {
        $(#[$doc])*
        ///
        /// # Errors
        /// [`BuilderError::Resolution`] when the name is unknown or names another kind of type.
        pub fn $name(&self, name: &str) -> Result<Box<dyn $trait>, BuilderError> {
            self.instantiate(name, ComponentKind::$variant, |component| match component {
                Component::$variant(construct) => Some(construct),
                _ => None,
            })
        }
    };
}

impl<'a> ComponentResolver<'a> {
    #[must_use]
    pub const fn new(aliases: &'a TypeAliasRegistry, types: &'a TypeRegistry) -> Self {
        Self { aliases, types }
    }

    /// # Errors
    /// [`BuilderError::Resolution`] when neither an alias nor a registered type matches.
    pub fn resolve(&self, name: &str) -> Result<&'a TypeDescriptor, BuilderError> {
        let type_name = self.aliases.get(name).unwrap_or(name);
        self.types.get(type_name).ok_or_else(|| {
            let message = if type_name == name {
                "no alias or registered type has this name".to_owned()
            } else {
                format!("alias resolves to unregistered type {type_name}")
            };
            BuilderError::resolution(name, message)
        })
    }

    /// Resolves `name` and requires it to be a `kind` type.
    ///
    /// # Errors
    /// [`BuilderError::Resolution`] for an unknown name or a kind mismatch.
    pub fn resolve_kind(&self, name: &str, kind: ComponentKind) -> Result<&'a TypeDescriptor, BuilderError> {
        let descriptor = self.resolve(name)?;
        if descriptor.kind() != kind {
            return Err(BuilderError::resolution(
                name,
                format!("{} is a {}, expected a {kind}", descriptor.name(), descriptor.kind()),
            ));
        }
        Ok(descriptor)
    }

    fn instantiate<T: ?Sized + 'a>(
        &self,
        name: &str,
        kind: ComponentKind,
        select: impl FnOnce(&'a Component) -> Option<&'a Constructor<T>>,
    ) -> Result<Box<T>, BuilderError> {
        let descriptor = self.resolve_kind(name, kind)?;
        let construct = select(descriptor.component()).ok_or_else(|| {
            BuilderError::resolution(name, format!("{} has no constructor", descriptor.name()))
        })?;
        Ok(construct())
    }

    instantiate!(interceptor, Interceptor, Interceptor);
    instantiate!(object_factory, ObjectFactory, ObjectFactory);
    instantiate!(object_wrapper_factory, ObjectWrapperFactory, ObjectWrapperFactory);
    instantiate!(reflector_factory, ReflectorFactory, ReflectorFactory);
    instantiate!(transaction_factory, TransactionFactory, TransactionFactory);
    instantiate!(data_source_factory, DataSourceFactory, DataSourceFactory);
    instantiate!(
        /// `VENDOR` is accepted as the legacy name of `DB_VENDOR`.
        database_id_provider,
        DatabaseIdProvider,
        DatabaseIdProvider
    );
    instantiate!(resource_loader, ResourceLoader, ResourceLoader);
}
