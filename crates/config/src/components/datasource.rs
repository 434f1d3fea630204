//! Data-source factories.
//!
//! Factories validate their properties and describe the data source they would open. No
//! connection is made while the configuration is assembled.

use super::{parse_bool, parse_number};
use crate::error::BuilderError;
use mapr_parsing::Properties;
use serde::Serialize;
use std::fmt::{self, Debug};
use strum_macros::{Display, IntoStaticStr};

const DRIVER_PREFIX: &str = "driver.";
const ENV_PREFIX: &str = "env.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, IntoStaticStr, Serialize)]
#[strum(serialize_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum DataSourceKind {
    Unpooled,
    Pooled,
    Jndi,
}

/// Pool sizing and health-check settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PoolSettings {
    pub maximum_active_connections: u32,
    pub maximum_idle_connections: u32,
    pub maximum_checkout_time_ms: u64,
    pub time_to_wait_ms: u64,
    pub ping_query: Option<String>,
    pub ping_enabled: bool,
    pub ping_connections_not_used_for_ms: u64,
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self {
            maximum_active_connections: 10,
            maximum_idle_connections: 5,
            maximum_checkout_time_ms: 20_000,
            time_to_wait_ms: 20_000,
            ping_query: None,
            ping_enabled: false,
            ping_connections_not_used_for_ms: 0,
        }
    }
}

/// Where a JNDI data source would be looked up.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct JndiSettings {
    pub initial_context: Option<String>,
    pub data_source: String,
    pub environment: Properties,
}

/// The data source of the active environment.
#[derive(Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DataSource {
    pub kind: DataSourceKind,
    pub driver: Option<String>,
    pub url: Option<String>,
    pub username: Option<String>,
    #[serde(skip)]
    pub password: Option<String>,
    pub auto_commit: Option<bool>,
    pub default_transaction_isolation_level: Option<i32>,
    pub driver_properties: Properties,
    pub pool: Option<PoolSettings>,
    pub jndi: Option<JndiSettings>,
}

impl Debug for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DataSource")
            .field("kind", &self.kind)
            .field("driver", &self.driver)
            .field("url", &self.url)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .field("auto_commit", &self.auto_commit)
            .field("default_transaction_isolation_level", &self.default_transaction_isolation_level)
            .field("driver_properties", &self.driver_properties)
            .field("pool", &self.pool)
            .field("jndi", &self.jndi)
            .finish()
    }
}

impl DataSource {
    fn empty(kind: DataSourceKind) -> Self {
        Self {
            kind,
            driver: None,
            url: None,
            username: None,
            password: None,
            auto_commit: None,
            default_transaction_isolation_level: None,
            driver_properties: Properties::new(),
            pool: None,
            jndi: None,
        }
    }
}

/// Builds a [`DataSource`] description from `<dataSource>` properties.
pub trait DataSourceFactory: Debug + Send + Sync {
    /// # Errors
    /// [`BuilderError::InvalidProperty`] for an unknown key or a malformed value.
    fn set_properties(&mut self, properties: &Properties) -> Result<(), BuilderError>;

    fn data_source(&self) -> DataSource;
}

#[derive(Debug, Clone)]
pub struct UnpooledDataSourceFactory {
    data_source: DataSource,
}

impl Default for UnpooledDataSourceFactory {
    fn default() -> Self {
        Self { data_source: DataSource::empty(DataSourceKind::Unpooled) }
    }
}

impl UnpooledDataSourceFactory {
    pub const TYPE_NAME: &'static str = "mapr::datasource::UnpooledDataSourceFactory";
}

/// Applies a connection-level key. `Ok(false)` means the key is not a connection key.
fn apply_connection_key(ds: &mut DataSource, key: &str, value: &str) -> Result<bool, BuilderError> {
    if let Some(driver_key) = key.strip_prefix(DRIVER_PREFIX) {
        ds.driver_properties.insert(driver_key, value);
        return Ok(true);
    }
    match key {
        "driver" => ds.driver = Some(value.to_owned()),
        "url" => ds.url = Some(value.to_owned()),
        "username" => ds.username = Some(value.to_owned()),
        "password" => ds.password = Some(value.to_owned()),
        "autoCommit" => ds.auto_commit = Some(parse_bool(key, value)?),
        "defaultTransactionIsolationLevel" => {
            ds.default_transaction_isolation_level = Some(parse_number(key, value)?);
        },
        _ => return Ok(false),
    }
    Ok(true)
}

fn unknown(key: &str) -> BuilderError {
    BuilderError::invalid_property(format!("Unknown DataSource property: {key}"))
}

impl DataSourceFactory for UnpooledDataSourceFactory {
    fn set_properties(&mut self, properties: &Properties) -> Result<(), BuilderError> {
        for (key, value) in properties.sorted() {
            if !apply_connection_key(&mut self.data_source, key, value)? {
                return Err(unknown(key));
            }
        }
        Ok(())
    }

    fn data_source(&self) -> DataSource {
        self.data_source.clone()
    }
}

#[derive(Debug, Clone)]
pub struct PooledDataSourceFactory {
    data_source: DataSource,
    pool: PoolSettings,
}

impl Default for PooledDataSourceFactory {
    fn default() -> Self {
        Self { data_source: DataSource::empty(DataSourceKind::Pooled), pool: PoolSettings::default() }
    }
}

impl PooledDataSourceFactory {
    pub const TYPE_NAME: &'static str = "mapr::datasource::PooledDataSourceFactory";
}

impl DataSourceFactory for PooledDataSourceFactory {
    fn set_properties(&mut self, properties: &Properties) -> Result<(), BuilderError> {
        for (key, value) in properties.sorted() {
            if apply_connection_key(&mut self.data_source, key, value)? {
                continue;
            }
            let pool = &mut self.pool;
            match key {
                "poolMaximumActiveConnections" => {
                    pool.maximum_active_connections = parse_number(key, value)?;
                },
                "poolMaximumIdleConnections" => pool.maximum_idle_connections = parse_number(key, value)?,
                "poolMaximumCheckoutTime" => pool.maximum_checkout_time_ms = parse_number(key, value)?,
                "poolTimeToWait" => pool.time_to_wait_ms = parse_number(key, value)?,
                "poolPingQuery" => pool.ping_query = Some(value.to_owned()),
                "poolPingEnabled" => pool.ping_enabled = parse_bool(key, value)?,
                "poolPingConnectionsNotUsedFor" => {
                    pool.ping_connections_not_used_for_ms = parse_number(key, value)?;
                },
                _ => return Err(unknown(key)),
            }
        }
        Ok(())
    }

    fn data_source(&self) -> DataSource {
        DataSource { pool: Some(self.pool.clone()), ..self.data_source.clone() }
    }
}

#[derive(Debug, Clone, Default)]
pub struct JndiDataSourceFactory {
    jndi: JndiSettings,
}

impl JndiDataSourceFactory {
    pub const TYPE_NAME: &'static str = "mapr::datasource::JndiDataSourceFactory";
}

impl DataSourceFactory for JndiDataSourceFactory {
    fn set_properties(&mut self, properties: &Properties) -> Result<(), BuilderError> {
        let mut jndi = JndiSettings::default();
        for (key, value) in properties.iter() {
            if let Some(env_key) = key.strip_prefix(ENV_PREFIX) {
                jndi.environment.insert(env_key, value);
            }
        }
        jndi.initial_context = properties.get("initial_context").map(str::to_owned);
        jndi.data_source = properties
            .get("data_source")
            .ok_or_else(|| BuilderError::invalid_property("JNDI data source requires 'data_source'"))?
            .to_owned();
        self.jndi = jndi;
        Ok(())
    }

    fn data_source(&self) -> DataSource {
        DataSource { jndi: Some(self.jndi.clone()), ..DataSource::empty(DataSourceKind::Jndi) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn props(entries: &[(&str, &str)]) -> Properties {
        entries.iter().copied().collect()
    }

    #[test]
    fn pooled_defaults() {
        let mut factory = PooledDataSourceFactory::default();
        factory.set_properties(&props(&[("url", "jdbc:h2:mem:test")])).unwrap();
        let ds = factory.data_source();
        assert_eq!(ds.kind, DataSourceKind::Pooled);
        assert_eq!(ds.pool, Some(PoolSettings::default()));
        let pool = ds.pool.unwrap();
        assert_eq!(pool.maximum_active_connections, 10);
        assert_eq!(pool.maximum_idle_connections, 5);
        assert_eq!(pool.maximum_checkout_time_ms, 20_000);
        assert_eq!(pool.time_to_wait_ms, 20_000);
        assert!(!pool.ping_enabled);
    }

    #[test]
    fn driver_prefixed_keys_become_driver_properties() {
        let mut factory = UnpooledDataSourceFactory::default();
        factory
            .set_properties(&props(&[("driver", "pg::Driver"), ("driver.sslmode", "require")]))
            .unwrap();
        let ds = factory.data_source();
        assert_eq!(ds.driver.as_deref(), Some("pg::Driver"));
        assert_eq!(ds.driver_properties.get("sslmode"), Some("require"));
    }

    #[test]
    fn unknown_and_malformed_properties_are_rejected() {
        let mut unpooled = UnpooledDataSourceFactory::default();
        let err = unpooled.set_properties(&props(&[("poolMaximumActiveConnections", "3")]));
        assert!(matches!(err, Err(BuilderError::InvalidProperty { .. })));

        let mut pooled = PooledDataSourceFactory::default();
        let err = pooled.set_properties(&props(&[("poolTimeToWait", "soon")]));
        assert!(matches!(err, Err(BuilderError::InvalidProperty { .. })));
    }

    #[test]
    fn password_is_redacted() {
        let mut factory = UnpooledDataSourceFactory::default();
        factory.set_properties(&props(&[("password", "hunter2")])).unwrap();
        assert!(!format!("{:?}", factory.data_source()).contains("hunter2"));
    }

    #[test]
    fn jndi_requires_a_name() {
        let mut factory = JndiDataSourceFactory::default();
        assert!(factory.set_properties(&Properties::new()).is_err());
        factory
            .set_properties(&props(&[("data_source", "java:comp/env/db"), ("env.encoding", "UTF8")]))
            .unwrap();
        let jndi = factory.data_source().jndi.unwrap();
        assert_eq!(jndi.data_source, "java:comp/env/db");
        assert_eq!(jndi.environment.get("encoding"), Some("UTF8"));
    }
}
