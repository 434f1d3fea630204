//! Property files named by `<properties resource|url>`.

use crate::error::{BuilderError, BuilderErrorExt};
use config::{Config, File, FileFormat, Source};
use mapr_parsing::Properties;
use serde_json::Value;
use std::path::Path;

/// Format inferred from the resource extension. `.properties` files are read as INI.
#[must_use]
pub fn format_for(resource: &str) -> FileFormat {
    let extension = Path::new(resource)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);
    match extension.as_deref() {
        Some("toml") => FileFormat::Toml,
        Some("json") => FileFormat::Json,
        Some("yaml" | "yml") => FileFormat::Yaml,
        _ => FileFormat::Ini,
    }
}

/// Parses a property file. Nested tables flatten to dotted keys, array items to their index.
///
/// # Errors
/// [`BuilderError::PropertySource`] when the text does not parse as the inferred format.
pub fn parse_property_source(resource: &str, text: &str) -> Result<Properties, BuilderError> {
    collect_properties(File::from_str(text, format_for(resource)), resource)
}

/// Reads any `config` source into a flat table, e.g. `config::Environment` for prefixed
/// environment variables.
///
/// # Errors
/// [`BuilderError::PropertySource`] when the source cannot be read, with `name` as context.
pub fn collect_properties<S>(source: S, name: &str) -> Result<Properties, BuilderError>
where
    S: Source + Send + Sync + 'static,
{
    let tree: Value = Config::builder()
        .add_source(source)
        .build()
        .and_then(Config::try_deserialize)
        .context(name.to_owned())?;

    let mut properties = Properties::new();
    flatten(None, &tree, &mut properties);
    Ok(properties)
}

fn flatten(prefix: Option<&str>, value: &Value, out: &mut Properties) {
    let key = |name: &str| prefix.map_or_else(|| name.to_owned(), |prefix| format!("{prefix}.{name}"));
    match value {
        Value::Object(map) => {
            for (name, child) in map {
                flatten(Some(&key(name)), child, out);
            }
        },
        Value::Array(items) => {
            for (index, child) in items.iter().enumerate() {
                flatten(Some(&key(&index.to_string())), child, out);
            }
        },
        Value::Null => {},
        Value::String(text) => insert(prefix, text.clone(), out),
        other => insert(prefix, other.to_string(), out),
    }
}

fn insert(key: Option<&str>, value: String, out: &mut Properties) {
    if let Some(key) = key {
        out.insert(key, value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn properties_files_read_as_key_value_pairs() {
        let properties =
            parse_property_source("db.properties", "# connection\ndriver=app.Driver\nusername = sa\n").unwrap();
        assert_eq!(properties.get("driver"), Some("app.Driver"));
        assert_eq!(properties.get("username"), Some("sa"));
    }

    #[test]
    fn nested_tables_flatten_to_dotted_keys() {
        let properties = parse_property_source(
            "db.toml",
            "url = \"jdbc:h2:mem\"\n[pool]\nsize = 10\nhosts = [\"a\", \"b\"]\n",
        )
        .unwrap();
        assert_eq!(properties.get("url"), Some("jdbc:h2:mem"));
        assert_eq!(properties.get("pool.size"), Some("10"));
        assert_eq!(properties.get("pool.hosts.1"), Some("b"));
    }

    #[test]
    fn json_scalars_become_strings() {
        let properties = parse_property_source("db.json", r#"{"enabled": true, "ratio": 0.5}"#).unwrap();
        assert_eq!(properties.get("enabled"), Some("true"));
        assert_eq!(properties.get("ratio"), Some("0.5"));
    }

    #[test]
    fn malformed_file_names_the_resource() {
        let err = parse_property_source("broken.json", "{ not json").unwrap_err();
        assert_eq!(err.kind(), "property_source");
        assert!(err.to_string().contains("broken.json"));
    }

    #[test]
    fn prefixed_environment_variables_flatten() {
        let vars: config::Map<String, String> =
            [("MAPR__DB__URL".to_owned(), "jdbc:h2:mem".to_owned())].into_iter().collect();
        let source = config::Environment::with_prefix("MAPR").separator("__").source(Some(vars));
        let properties = collect_properties(source, "environment").unwrap();
        assert_eq!(properties.get("db.url"), Some("jdbc:h2:mem"));
    }

    #[test]
    fn format_follows_extension() {
        assert_eq!(format_for("a/b.YAML"), FileFormat::Yaml);
        assert_eq!(format_for("plain"), FileFormat::Ini);
    }
}
