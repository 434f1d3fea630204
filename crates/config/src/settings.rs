//! Behavior flags read from the `<settings>` section.

use crate::error::BuilderError;
use crate::jdbc::JdbcType;
use crate::registry::ComponentKind;
use crate::resolver::ComponentResolver;
use mapr_parsing::Properties;
use serde::Serialize;
use std::collections::BTreeSet;
use std::str::FromStr;
use strum_macros::{Display, EnumString, IntoStaticStr};

/// Every key accepted inside `<settings>`.
pub const KNOWN_SETTINGS: &[&str] = &[
    "autoMappingBehavior",
    "cacheEnabled",
    "proxyFactory",
    "lazyLoadingEnabled",
    "aggressiveLazyLoading",
    "multipleResultSetsEnabled",
    "useColumnLabel",
    "useGeneratedKeys",
    "defaultExecutorType",
    "defaultStatementTimeout",
    "defaultFetchSize",
    "mapUnderscoreToCamelCase",
    "safeRowBoundsEnabled",
    "localCacheScope",
    "jdbcTypeForNull",
    "lazyLoadTriggerMethods",
    "safeResultHandlerEnabled",
    "defaultScriptingLanguage",
    "callSettersOnNulls",
    "logPrefix",
    "logImpl",
    "configurationFactory",
    "vfsImpl",
];

const DEFAULT_LAZY_LOAD_TRIGGERS: &str = "equals,clone,hashCode,toString";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, IntoStaticStr, Serialize)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AutoMappingBehavior {
    None,
    Partial,
    Full,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, IntoStaticStr, Serialize)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExecutorType {
    Simple,
    Reuse,
    Batch,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, IntoStaticStr, Serialize)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LocalCacheScope {
    Session,
    Statement,
}

/// The settings table of a configuration.
///
/// Type-valued settings hold the fully-qualified name their alias resolved to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    pub auto_mapping_behavior: AutoMappingBehavior,
    pub cache_enabled: bool,
    pub proxy_factory: Option<String>,
    pub lazy_loading_enabled: bool,
    pub aggressive_lazy_loading: bool,
    pub multiple_result_sets_enabled: bool,
    pub use_column_label: bool,
    pub use_generated_keys: bool,
    pub default_executor_type: ExecutorType,
    pub default_statement_timeout: Option<i32>,
    pub default_fetch_size: Option<i32>,
    pub map_underscore_to_camel_case: bool,
    pub safe_row_bounds_enabled: bool,
    pub local_cache_scope: LocalCacheScope,
    pub jdbc_type_for_null: JdbcType,
    pub lazy_load_trigger_methods: BTreeSet<String>,
    pub safe_result_handler_enabled: bool,
    pub default_scripting_language: Option<String>,
    pub call_setters_on_nulls: bool,
    pub log_prefix: Option<String>,
    pub log_impl: Option<String>,
    pub configuration_factory: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            auto_mapping_behavior: AutoMappingBehavior::Partial,
            cache_enabled: true,
            proxy_factory: None,
            lazy_loading_enabled: false,
            aggressive_lazy_loading: true,
            multiple_result_sets_enabled: true,
            use_column_label: true,
            use_generated_keys: false,
            default_executor_type: ExecutorType::Simple,
            default_statement_timeout: None,
            default_fetch_size: None,
            map_underscore_to_camel_case: false,
            safe_row_bounds_enabled: false,
            local_cache_scope: LocalCacheScope::Session,
            jdbc_type_for_null: JdbcType::Other,
            lazy_load_trigger_methods: comma_set(DEFAULT_LAZY_LOAD_TRIGGERS),
            safe_result_handler_enabled: true,
            default_scripting_language: None,
            call_setters_on_nulls: false,
            log_prefix: None,
            log_impl: None,
            configuration_factory: None,
        }
    }
}

impl Settings {
    /// Rejects the first unknown key, in lexical order.
    ///
    /// # Errors
    /// [`BuilderError::UnknownSetting`].
    pub fn validate_keys(properties: &Properties) -> Result<(), BuilderError> {
        let mut unknown: Vec<&str> =
            properties.keys().filter(|key| !KNOWN_SETTINGS.contains(key)).collect();
        unknown.sort_unstable();
        match unknown.first() {
            Some(key) => Err(BuilderError::UnknownSetting { key: (*key).to_owned(), context: None }),
            None => Ok(()),
        }
    }

    /// Builds the table from raw values, falling back to defaults for absent keys only.
    ///
    /// # Errors
    /// [`BuilderError::EnumMismatch`], [`BuilderError::InvalidSetting`] or, for type-valued
    /// settings, [`BuilderError::Resolution`].
    pub fn from_properties(
        properties: &Properties,
        resolver: &ComponentResolver<'_>,
    ) -> Result<Self, BuilderError> {
        let defaults = Self::default();
        let flag = |key: &str, default: bool| boolean(properties, key, default);
        let type_name = |key: &str, kind: ComponentKind| -> Result<Option<String>, BuilderError> {
            properties
                .get(key)
                .map(|name| resolver.resolve_kind(name, kind).map(|descriptor| descriptor.name().to_owned()))
                .transpose()
        };

        Ok(Self {
            auto_mapping_behavior: enumeration(properties, "autoMappingBehavior", "AutoMappingBehavior")?
                .unwrap_or(defaults.auto_mapping_behavior),
            cache_enabled: flag("cacheEnabled", defaults.cache_enabled)?,
            proxy_factory: type_name("proxyFactory", ComponentKind::ProxyFactory)?,
            lazy_loading_enabled: flag("lazyLoadingEnabled", defaults.lazy_loading_enabled)?,
            aggressive_lazy_loading: flag("aggressiveLazyLoading", defaults.aggressive_lazy_loading)?,
            multiple_result_sets_enabled: flag(
                "multipleResultSetsEnabled",
                defaults.multiple_result_sets_enabled,
            )?,
            use_column_label: flag("useColumnLabel", defaults.use_column_label)?,
            use_generated_keys: flag("useGeneratedKeys", defaults.use_generated_keys)?,
            default_executor_type: enumeration(properties, "defaultExecutorType", "ExecutorType")?
                .unwrap_or(defaults.default_executor_type),
            default_statement_timeout: integer(properties, "defaultStatementTimeout")?,
            default_fetch_size: integer(properties, "defaultFetchSize")?,
            map_underscore_to_camel_case: flag(
                "mapUnderscoreToCamelCase",
                defaults.map_underscore_to_camel_case,
            )?,
            safe_row_bounds_enabled: flag("safeRowBoundsEnabled", defaults.safe_row_bounds_enabled)?,
            local_cache_scope: enumeration(properties, "localCacheScope", "LocalCacheScope")?
                .unwrap_or(defaults.local_cache_scope),
            jdbc_type_for_null: match properties.get("jdbcTypeForNull") {
                Some(token) => JdbcType::resolve(token)?,
                None => defaults.jdbc_type_for_null,
            },
            lazy_load_trigger_methods: properties
                .get("lazyLoadTriggerMethods")
                .map_or(defaults.lazy_load_trigger_methods, comma_set),
            safe_result_handler_enabled: flag(
                "safeResultHandlerEnabled",
                defaults.safe_result_handler_enabled,
            )?,
            default_scripting_language: type_name("defaultScriptingLanguage", ComponentKind::LanguageDriver)?,
            call_setters_on_nulls: flag("callSettersOnNulls", defaults.call_setters_on_nulls)?,
            log_prefix: properties.get("logPrefix").map(str::to_owned),
            log_impl: type_name("logImpl", ComponentKind::LogImpl)?,
            configuration_factory: type_name("configurationFactory", ComponentKind::ConfigurationFactory)?,
        })
    }
}

/// The last entry of the comma-separated `vfsImpl` list.
#[must_use]
pub fn resource_loader_name(properties: &Properties) -> Option<&str> {
    properties
        .get("vfsImpl")?
        .split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .next_back()
}

fn invalid(key: &str, value: &str) -> BuilderError {
    BuilderError::InvalidSetting { key: key.to_owned(), value: value.to_owned(), context: None }
}

fn boolean(properties: &Properties, key: &str, default: bool) -> Result<bool, BuilderError> {
    let Some(value) = properties.get(key) else {
        return Ok(default);
    };
    match value.trim().to_ascii_lowercase().as_str() {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(invalid(key, value)),
    }
}

fn integer(properties: &Properties, key: &str) -> Result<Option<i32>, BuilderError> {
    properties
        .get(key)
        .map(|value| value.trim().parse().map_err(|_| invalid(key, value)))
        .transpose()
}

fn enumeration<T: FromStr>(
    properties: &Properties,
    key: &str,
    enumeration: &'static str,
) -> Result<Option<T>, BuilderError> {
    properties
        .get(key)
        .map(|value| {
            value.parse().map_err(|_| BuilderError::EnumMismatch {
                enumeration,
                value: value.to_owned(),
                context: None,
            })
        })
        .transpose()
}

fn comma_set(value: &str) -> BTreeSet<String> {
    value.split(',').map(str::trim).filter(|method| !method.is_empty()).map(str::to_owned).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::extensions::TRACING_LOG_IMPL;
    use crate::registry::{TypeAliasRegistry, TypeRegistry};

    fn apply(pairs: &[(&str, &str)]) -> Result<Settings, BuilderError> {
        let aliases = TypeAliasRegistry::default();
        let types = TypeRegistry::default();
        let properties: Properties = pairs.iter().copied().collect();
        Settings::from_properties(&properties, &ComponentResolver::new(&aliases, &types))
    }

    #[test]
    fn empty_section_yields_defaults() {
        let settings = apply(&[]).unwrap();
        assert_eq!(settings, Settings::default());
        assert!(settings.lazy_load_trigger_methods.contains("hashCode"));
        assert_eq!(settings.jdbc_type_for_null, JdbcType::Other);
    }

    #[test]
    fn values_are_applied() {
        let settings = apply(&[
            ("autoMappingBehavior", "FULL"),
            ("cacheEnabled", "FALSE"),
            ("defaultExecutorType", "BATCH"),
            ("defaultStatementTimeout", "25"),
            ("localCacheScope", "STATEMENT"),
            ("jdbcTypeForNull", "NULL"),
            ("lazyLoadTriggerMethods", "equals, toString"),
            ("logImpl", "tracing"),
            ("logPrefix", "app."),
        ])
        .unwrap();
        assert_eq!(settings.auto_mapping_behavior, AutoMappingBehavior::Full);
        assert!(!settings.cache_enabled);
        assert_eq!(settings.default_executor_type, ExecutorType::Batch);
        assert_eq!(settings.default_statement_timeout, Some(25));
        assert_eq!(settings.local_cache_scope, LocalCacheScope::Statement);
        assert_eq!(settings.jdbc_type_for_null, JdbcType::Null);
        assert_eq!(settings.lazy_load_trigger_methods.len(), 2);
        assert_eq!(settings.log_impl.as_deref(), Some(TRACING_LOG_IMPL));
        assert_eq!(settings.log_prefix.as_deref(), Some("app."));
    }

    #[test]
    fn enum_values_are_case_sensitive() {
        let err = apply(&[("defaultExecutorType", "simple")]).unwrap_err();
        assert!(matches!(err, BuilderError::EnumMismatch { enumeration: "ExecutorType", .. }));
    }

    #[test]
    fn malformed_values_never_become_defaults() {
        let err = apply(&[("cacheEnabled", "yes")]).unwrap_err();
        assert!(matches!(err, BuilderError::InvalidSetting { ref key, .. } if key == "cacheEnabled"));
        let err = apply(&[("defaultFetchSize", "many")]).unwrap_err();
        assert_eq!(err.kind(), "invalid_setting");
    }

    #[test]
    fn type_settings_must_name_the_right_kind() {
        let err = apply(&[("logImpl", "POOLED")]).unwrap_err();
        assert_eq!(err.kind(), "resolution");
    }

    #[test]
    fn unknown_key_is_reported() {
        let properties: Properties = [("cacheEnabled", "true"), ("bogusSetting", "1")].into_iter().collect();
        let err = Settings::validate_keys(&properties).unwrap_err();
        assert!(matches!(err, BuilderError::UnknownSetting { ref key, .. } if key == "bogusSetting"));
    }

    #[test]
    fn last_resource_loader_wins() {
        let properties: Properties = [("vfsImpl", "app::OldLoader, app::NewLoader,")].into_iter().collect();
        assert_eq!(resource_loader_name(&properties), Some("app::NewLoader"));
        assert_eq!(resource_loader_name(&Properties::new()), None);
    }
}
