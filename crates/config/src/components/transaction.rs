use crate::error::BuilderError;
use mapr_parsing::Properties;
use std::fmt::Debug;

/// Produces transactions for an environment. No connection is opened while configuring.
pub trait TransactionFactory: Debug + Send + Sync {
    /// # Errors
    /// [`BuilderError::InvalidProperty`] for a malformed property value.
    fn set_properties(&mut self, _properties: &Properties) -> Result<(), BuilderError> {
        Ok(())
    }

    /// Whether transactions commit and roll back through the connection itself.
    fn manages_commits(&self) -> bool;

    /// Whether closing a transaction closes its connection.
    fn closes_connection(&self) -> bool {
        true
    }
}

/// Commits and rolls back through the connection.
#[derive(Debug, Default, Clone, Copy)]
pub struct JdbcTransactionFactory;

impl JdbcTransactionFactory {
    pub const TYPE_NAME: &'static str = "mapr::transaction::JdbcTransactionFactory";
}

impl TransactionFactory for JdbcTransactionFactory {
    fn manages_commits(&self) -> bool {
        true
    }
}

/// Leaves the transaction lifecycle to a container.
#[derive(Debug, Clone, Copy)]
pub struct ManagedTransactionFactory {
    close_connection: bool,
}

impl Default for ManagedTransactionFactory {
    fn default() -> Self {
        Self { close_connection: true }
    }
}

impl ManagedTransactionFactory {
    pub const TYPE_NAME: &'static str = "mapr::transaction::ManagedTransactionFactory";
}

impl TransactionFactory for ManagedTransactionFactory {
    fn set_properties(&mut self, properties: &Properties) -> Result<(), BuilderError> {
        if let Some(value) = properties.get("closeConnection") {
            self.close_connection = super::parse_bool("closeConnection", value)?;
        }
        Ok(())
    }

    fn manages_commits(&self) -> bool {
        false
    }

    fn closes_connection(&self) -> bool {
        self.close_connection
    }
}
