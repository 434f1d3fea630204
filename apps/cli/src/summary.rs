//! Human and JSON views of an assembled configuration.

use mapr::config::{Configuration, DataSource, Settings};
use serde::Serialize;
use std::fmt::{self, Display};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary<'a> {
    pub environment: Option<&'a str>,
    pub data_source: Option<&'a DataSource>,
    pub database_id: Option<&'a str>,
    pub variables: usize,
    pub interceptors: usize,
    pub type_aliases: usize,
    pub type_handlers: usize,
    pub mappers: &'a [String],
    pub mapped_statements: Vec<&'a str>,
    pub settings: &'a Settings,
}

impl<'a> From<&'a Configuration> for Summary<'a> {
    fn from(configuration: &'a Configuration) -> Self {
        let environment = configuration.environment();
        Self {
            environment: environment.map(|env| env.id()),
            data_source: environment.map(|env| env.data_source()),
            database_id: configuration.database_id(),
            variables: configuration.variables().len(),
            interceptors: configuration.interceptor_chain().len(),
            type_aliases: configuration.type_aliases().len(),
            type_handlers: configuration.type_handlers().entries().len(),
            mappers: configuration.mapper_registry().mappers(),
            mapped_statements: configuration.mapped_statements(),
            settings: configuration.settings(),
        }
    }
}

impl Display for Summary<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.environment, self.data_source) {
            (Some(id), Some(data_source)) => {
                writeln!(f, "environment: {id} ({})", data_source.kind)?;
                if let Some(url) = &data_source.url {
                    writeln!(f, "  url: {url}")?;
                }
            },
            _ => writeln!(f, "environment: none")?,
        }
        writeln!(f, "database id: {}", self.database_id.unwrap_or("none"))?;
        writeln!(f, "executor: {}", self.settings.default_executor_type)?;
        writeln!(f, "variables: {}", self.variables)?;
        writeln!(f, "interceptors: {}", self.interceptors)?;
        writeln!(f, "type aliases: {}", self.type_aliases)?;
        writeln!(f, "type handlers: {}", self.type_handlers)?;
        writeln!(f, "mappers: {}", self.mappers.len())?;
        for mapper in self.mappers {
            writeln!(f, "  {mapper}")?;
        }
        writeln!(f, "mapped statements: {}", self.mapped_statements.len())?;
        for statement in &self.mapped_statements {
            writeln!(f, "  {statement}")?;
        }
        Ok(())
    }
}
