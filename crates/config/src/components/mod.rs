mod database_id;
mod datasource;
pub mod extensions;
mod io;
mod reflection;
mod transaction;

pub use database_id::{DatabaseIdProvider, VendorDatabaseIdProvider};
pub use datasource::{
    DataSource, DataSourceFactory, DataSourceKind, JndiDataSourceFactory, JndiSettings, PoolSettings,
    PooledDataSourceFactory, UnpooledDataSourceFactory,
};
pub use io::{FileSystemLoader, ResourceLoader, file_url_path};
pub use reflection::{
    DefaultObjectFactory, DefaultObjectWrapperFactory, DefaultReflectorFactory, ObjectFactory,
    ObjectWrapperFactory, ReflectorFactory,
};
pub use transaction::{JdbcTransactionFactory, ManagedTransactionFactory, TransactionFactory};

use crate::error::BuilderError;
use std::fmt::Display;
use std::str::FromStr;

/// Strict boolean: `true` or `false`, any case.
pub(crate) fn parse_bool(key: &str, value: &str) -> Result<bool, BuilderError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(BuilderError::invalid_property(format!("{key}: \"{value}\" is not a boolean"))),
    }
}

pub(crate) fn parse_number<T>(key: &str, value: &str) -> Result<T, BuilderError>
where
    T: FromStr,
    T::Err: Display,
{
    value
        .trim()
        .parse()
        .map_err(|err| BuilderError::invalid_property(format!("{key}: \"{value}\" {err}")))
}
