//! Components that are configured by name only.
//!
//! Language drivers, log implementations, proxy factories and configuration factories are
//! selected through settings. The assembled configuration records the resolved type name;
//! instantiating them is up to the runtime.

pub const XML_LANGUAGE_DRIVER: &str = "mapr::scripting::XmlLanguageDriver";
pub const RAW_LANGUAGE_DRIVER: &str = "mapr::scripting::RawLanguageDriver";

pub const TRACING_LOG_IMPL: &str = "mapr::logging::TracingLogImpl";
pub const NO_LOGGING_LOG_IMPL: &str = "mapr::logging::NoLoggingImpl";

pub const DEFAULT_PROXY_FACTORY: &str = "mapr::executor::loader::DefaultProxyFactory";
