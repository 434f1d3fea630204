mod aliases;
mod handlers;
mod mappers;
pub(crate) mod types;

pub use aliases::TypeAliasRegistry;
pub use handlers::TypeHandlerRegistry;
pub use mappers::{MapperParser, MapperRegistry, NamespaceMapperParser};
pub use types::{Component, ComponentKind, Constructor, TypeDescriptor, TypeRegistry};
