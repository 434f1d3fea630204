//! # CLI Argument Definitions

use clap::{ArgAction, Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "mapr")]
#[command(author = env!("CARGO_PKG_AUTHORS"))]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(arg_required_else_help = true)]
#[command(about = "Assembles and checks mapr configuration documents")]
pub struct Cli {
    /// Log verbosity on stderr (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Build a configuration document and print a summary of the result
    Check(CheckArgs),
}

#[derive(Debug, Args)]
pub struct CheckArgs {
    /// Path of the configuration document
    pub config: PathBuf,

    /// Environment to select instead of the declared default
    #[arg(short, long, value_name = "ID")]
    pub environment: Option<String>,

    /// Caller variable, overrides every other source (repeatable)
    #[arg(long = "var", value_name = "KEY=VALUE", value_parser = parse_var)]
    pub vars: Vec<(String, String)>,

    /// Property file with caller variables (.properties, .toml, .json, .yaml)
    #[arg(long, value_name = "PATH")]
    pub vars_file: Option<PathBuf>,

    /// Directory relative resources are read from (defaults to the document's directory)
    #[arg(long, value_name = "DIR")]
    pub base_dir: Option<PathBuf>,

    /// Accept documents without the configuration DOCTYPE
    #[arg(long)]
    pub no_validate: bool,

    /// Print the summary (or the failure) as JSON
    #[arg(long)]
    pub json: bool,
}

fn parse_var(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => Ok((key.trim().to_owned(), value.to_owned())),
        _ => Err(format!("expected KEY=VALUE, got \"{raw}\"")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vars_split_on_first_equals() {
        assert_eq!(parse_var("url=jdbc:h2:mem?a=b"), Ok(("url".to_owned(), "jdbc:h2:mem?a=b".to_owned())));
        assert_eq!(parse_var("empty="), Ok(("empty".to_owned(), String::new())));
        assert!(parse_var("novalue").is_err());
        assert!(parse_var("=value").is_err());
    }

    #[test]
    fn check_arguments_parse() {
        let cli = Cli::try_parse_from([
            "mapr", "-vv", "check", "mapr.xml", "-e", "test", "--var", "a=1", "--var", "b=2", "--json",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        let Commands::Check(args) = cli.command;
        assert_eq!(args.config, PathBuf::from("mapr.xml"));
        assert_eq!(args.environment.as_deref(), Some("test"));
        assert_eq!(args.vars.len(), 2);
        assert!(args.json);
        assert!(!args.no_validate);
    }
}
