use super::datasource::DataSource;
use crate::error::BuilderError;
use mapr_parsing::Properties;
use std::fmt::Debug;
use tracing::{debug, warn};

/// Classifies the active data source into a database id used to select vendor-specific
/// statements.
pub trait DatabaseIdProvider: Debug + Send + Sync {
    fn set_properties(&mut self, _properties: Properties) {}

    /// # Errors
    /// Any failure is fatal to the build.
    fn database_id(&self, data_source: &DataSource) -> Result<Option<String>, BuilderError>;
}

/// Derives the product name from the data-source URL.
///
/// Without properties the product name is the id. With properties, the longest key contained
/// in the product name (ignoring case) selects its value; no match means no id. A data source
/// without a URL the product name can be read from (JNDI lookups among them) also has no id.
#[derive(Debug, Clone, Default)]
pub struct VendorDatabaseIdProvider {
    properties: Properties,
}

impl VendorDatabaseIdProvider {
    pub const TYPE_NAME: &'static str = "mapr::mapping::VendorDatabaseIdProvider";

    /// `jdbc:postgresql://host/db` and `postgresql://host/db` both name `postgresql`.
    fn product_name(url: &str) -> Option<&str> {
        let rest = url.strip_prefix("jdbc:").unwrap_or(url);
        let end = rest.find(':')?;
        Some(&rest[..end]).filter(|name| !name.is_empty())
    }
}

impl DatabaseIdProvider for VendorDatabaseIdProvider {
    fn set_properties(&mut self, properties: Properties) {
        self.properties = properties;
    }

    fn database_id(&self, data_source: &DataSource) -> Result<Option<String>, BuilderError> {
        let Some(url) = data_source.url.as_deref() else {
            warn!(kind = %data_source.kind, "Data source has no url, database id left unset");
            return Ok(None);
        };
        let Some(product) = Self::product_name(url) else {
            warn!(url, "Cannot derive a database product name, database id left unset");
            return Ok(None);
        };
        debug!(product, "Derived database product name");

        if self.properties.is_empty() {
            return Ok(Some(product.to_owned()));
        }

        let product = product.to_lowercase();
        let mut candidates: Vec<(&str, &str)> = self
            .properties
            .iter()
            .filter(|(key, _)| product.contains(&key.to_lowercase()))
            .collect();
        candidates.sort_unstable_by(|a, b| b.0.len().cmp(&a.0.len()).then(a.0.cmp(b.0)));
        Ok(candidates.first().map(|(_, id)| (*id).to_owned()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::{DataSourceFactory, UnpooledDataSourceFactory};

    fn data_source(url: &str) -> DataSource {
        let mut factory = UnpooledDataSourceFactory::default();
        factory.set_properties(&[("url", url)].into_iter().collect()).unwrap();
        factory.data_source()
    }

    #[test]
    fn product_name_without_properties() {
        let provider = VendorDatabaseIdProvider::default();
        assert_eq!(
            provider.database_id(&data_source("jdbc:postgresql://localhost/app")).unwrap().as_deref(),
            Some("postgresql")
        );
        assert_eq!(provider.database_id(&data_source("mysql://localhost/app")).unwrap().as_deref(), Some("mysql"));
    }

    #[test]
    fn properties_map_products_to_ids() {
        let mut provider = VendorDatabaseIdProvider::default();
        provider.set_properties([("SQL", "generic"), ("MySQL", "mysql"), ("Oracle", "oracle")].into_iter().collect());
        assert_eq!(provider.database_id(&data_source("jdbc:mysql://h/db")).unwrap().as_deref(), Some("mysql"));
        assert_eq!(provider.database_id(&data_source("jdbc:h2:mem:db")).unwrap(), None);
    }

    #[test]
    fn undetectable_product_yields_no_id() {
        let provider = VendorDatabaseIdProvider::default();
        assert_eq!(provider.database_id(&UnpooledDataSourceFactory::default().data_source()).unwrap(), None);
        assert_eq!(provider.database_id(&data_source("localhost")).unwrap(), None);

        let mut jndi = crate::components::JndiDataSourceFactory::default();
        jndi.set_properties(&[("data_source", "java:comp/env/jdbc/app")].into_iter().collect()).unwrap();
        assert_eq!(provider.database_id(&jndi.data_source()).unwrap(), None);
    }
}
