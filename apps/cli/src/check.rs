//! The `check` command: assemble a document once and report the outcome.

use crate::args::CheckArgs;
use crate::summary::Summary;
use anyhow::{Context, Result};
use config::Environment;
use mapr::config::{BuilderError, collect_properties, parse_property_source};
use mapr::parsing::Properties;
use mapr::{SessionFactory, SessionFactoryBuilder};
use serde_json::json;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{debug, info};

/// Environment variables named `MAPR__<KEY>` become caller variables (`MAPR__DB__URL` is `db.url`).
pub const ENV_PREFIX: &str = "MAPR";

/// Runs the command and prints the summary or the failure.
///
/// # Errors
/// Only when the report itself cannot be written.
pub fn run(args: &CheckArgs) -> Result<ExitCode> {
    match build(args) {
        Ok(factory) => {
            let summary = Summary::from(factory.configuration());
            if args.json {
                println!("{}", serde_json::to_string_pretty(&json!({ "ok": true, "configuration": summary }))?);
            } else {
                print!("{summary}");
            }
            Ok(ExitCode::SUCCESS)
        },
        Err(err) => {
            report_failure(&err, args.json)?;
            Ok(ExitCode::FAILURE)
        },
    }
}

/// Builds the document named by `args`.
///
/// # Errors
/// Unreadable inputs, malformed variable sources, or any [`BuilderError`].
pub fn build(args: &CheckArgs) -> Result<SessionFactory> {
    let variables = caller_variables(args)?;
    let base_dir = args.base_dir.clone().unwrap_or_else(|| document_dir(&args.config));
    let reader = File::open(&args.config)
        .with_context(|| format!("Failed to open {}", args.config.display()))?;

    info!(config = %args.config.display(), base_dir = %base_dir.display(), "Checking configuration");

    let factory = SessionFactoryBuilder::new()
        .base_dir(base_dir)
        .validation(!args.no_validate)
        .build(reader, args.environment.as_deref(), (!variables.is_empty()).then_some(variables))?;
    Ok(factory)
}

/// Caller variables, lowest precedence first: `MAPR__` environment variables, `--vars-file`, `--var`.
///
/// # Errors
/// An unreadable or malformed variables file.
pub fn caller_variables(args: &CheckArgs) -> Result<Properties> {
    let mut variables = collect_properties(
        Environment::with_prefix(ENV_PREFIX).separator("__"),
        "MAPR__ environment variables",
    )?;

    if let Some(path) = &args.vars_file {
        let resource = path.display().to_string();
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read variables file {resource}"))?;
        variables.merge(&parse_property_source(&resource, &text)?);
    }

    variables.extend(args.vars.iter().cloned());
    debug!(count = variables.len(), "Caller variables collected");
    Ok(variables)
}

fn document_dir(config: &Path) -> PathBuf {
    config
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())
        .map_or_else(|| PathBuf::from("."), Path::to_path_buf)
}

fn report_failure(err: &anyhow::Error, json: bool) -> Result<()> {
    let builder = err.downcast_ref::<BuilderError>();
    if json {
        let report = json!({
            "ok": false,
            "error": {
                "kind": builder.map(|e| e.root_cause().kind()),
                "stage": builder.and_then(BuilderError::stage).map(|stage| stage.to_string()),
                "message": err.to_string(),
            }
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        eprintln!("error: {err}");
        for cause in err.chain().skip(1) {
            eprintln!("  caused by: {cause}");
        }
    }
    Ok(())
}
