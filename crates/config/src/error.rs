//! # Builder Errors
//!
//! Every failure of the assembly pipeline is a [`BuilderError`]. Failures inside a section are
//! wrapped once in [`BuilderError::Build`], which names the [`Stage`] that failed.

use mapr_parsing::ParsingError;
use std::borrow::Cow;
use strum_macros::{Display, IntoStaticStr};

/// Sections of the configuration document, in processing order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, IntoStaticStr)]
#[strum(serialize_all = "camelCase")]
pub enum Stage {
    /// The `configuration` root element.
    Configuration,
    /// Validation of the `settings` keys.
    SettingsKeys,
    Properties,
    /// The resource loader named by `vfsImpl`.
    ResourceLoader,
    TypeAliases,
    Plugins,
    ObjectFactory,
    ObjectWrapperFactory,
    ReflectionFactory,
    Settings,
    Environments,
    DatabaseIdProvider,
    TypeHandlers,
    Mappers,
}

#[mapr_derive::mapr_error]
pub enum BuilderError {
    #[error("Each ConfigurationBuilder can only be used once{}", format_context(.context))]
    Reuse { context: Option<Cow<'static, str>> },

    #[error("The setting {key} is not known{}", format_context(.context))]
    UnknownSetting { key: String, context: Option<Cow<'static, str>> },

    #[error("Cannot resolve type \"{name}\"{}: {message}", format_context(.context))]
    Resolution { name: String, message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Ambiguous source{}: {message}", format_context(.context))]
    AmbiguousSource { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Missing required element or attribute{}: {message}", format_context(.context))]
    MissingRequired { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Document error{}: {source}", format_context(.context))]
    Document { source: ParsingError, context: Option<Cow<'static, str>> },

    #[error("\"{value}\" is not a valid {enumeration}{}", format_context(.context))]
    EnumMismatch { enumeration: &'static str, value: String, context: Option<Cow<'static, str>> },

    #[error("Invalid value \"{value}\" for setting {key}{}", format_context(.context))]
    InvalidSetting { key: String, value: String, context: Option<Cow<'static, str>> },

    #[error("Invalid property{}: {message}", format_context(.context))]
    InvalidProperty { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Duplicate registration{}: {message}", format_context(.context))]
    Duplicate { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("IO error{}: {source}", format_context(.context))]
    Io { source: std::io::Error, context: Option<Cow<'static, str>> },

    #[error("Property source error{}: {source}", format_context(.context))]
    PropertySource { source: config::ConfigError, context: Option<Cow<'static, str>> },

    #[error("Invalid URL{}: {source}", format_context(.context))]
    Url { source: url::ParseError, context: Option<Cow<'static, str>> },

    #[error("Error building configuration at {stage}{}: {source}", format_context(.context))]
    Build { stage: Stage, source: Box<BuilderError>, context: Option<Cow<'static, str>> },

    #[error("Internal builder error{}: {message}", format_context(.context))]
    Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}

impl BuilderError {
    /// Wraps `self` as the failure of `stage`.
    #[must_use]
    pub fn at(self, stage: Stage) -> Self {
        Self::Build { stage, source: Box::new(self), context: None }
    }

    /// The stage named by the outermost [`BuilderError::Build`] wrapper.
    #[must_use]
    pub const fn stage(&self) -> Option<Stage> {
        match self {
            Self::Build { stage, .. } => Some(*stage),
            _ => None,
        }
    }

    /// The innermost error below any stage wrappers.
    #[must_use]
    pub fn root_cause(&self) -> &Self {
        let mut current = self;
        while let Self::Build { source, .. } = current {
            current = source;
        }
        current
    }

    pub(crate) fn resolution(name: impl Into<String>, message: impl Into<Cow<'static, str>>) -> Self {
        Self::Resolution { name: name.into(), message: message.into(), context: None }
    }

    pub(crate) fn missing(message: impl Into<Cow<'static, str>>) -> Self {
        Self::MissingRequired { message: message.into(), context: None }
    }

    pub(crate) fn invalid_property(message: impl Into<Cow<'static, str>>) -> Self {
        Self::InvalidProperty { message: message.into(), context: None }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_cause_unwraps_stages() {
        let err = BuilderError::missing("environment id").at(Stage::Environments);
        assert_eq!(err.stage(), Some(Stage::Environments));
        assert_eq!(err.root_cause().kind(), "missing_required");
        assert_eq!(
            err.to_string(),
            "Error building configuration at environments: Missing required element or attribute: environment id"
        );
    }

    #[test]
    fn context_is_rendered() {
        let result: Result<(), BuilderError> = Err(BuilderError::Reuse { context: None });
        let err = result.context("second call").unwrap_err();
        assert_eq!(err.to_string(), "Each ConfigurationBuilder can only be used once (second call)");
    }

    #[test]
    fn parsing_errors_convert() {
        let err: BuilderError = ParsingError::from("boom").into();
        assert_eq!(err.kind(), "document");
    }
}
