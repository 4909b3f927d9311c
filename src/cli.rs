// ABOUTME: Command-line interface definition using clap derive macros.
// ABOUTME: Defines all subcommands and their arguments.

use clap::{Parser, Subcommand};
use radi_handlers::error::Error;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "radi")]
#[command(about = "Run project operations through local, compose, Rancher and UpCloud handlers")]
#[command(version)]
pub struct Cli {
    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Print values only
    #[arg(short, long, global = true, conflicts_with = "json")]
    pub quiet: bool,

    /// Print JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Run as if started in DIR
    #[arg(short = 'C', long, global = true, value_name = "DIR")]
    pub directory: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List the operations the project provides
    List {
        /// Include internal operations
        #[arg(long)]
        all: bool,
    },

    /// Describe an operation and its properties
    Info {
        /// Operation id, e.g. orchestrate.up
        operation: String,
    },

    /// Run an operation
    Run {
        /// Operation id, e.g. setting.get
        operation: String,

        /// Set a property before running
        #[arg(short = 'p', long = "property", value_name = "ID=VALUE", value_parser = parse_assignment)]
        properties: Vec<(String, String)>,
    },

    /// Write a starter .radi/project.yml
    Init {
        /// Project name (defaults to the directory name)
        #[arg(long)]
        name: Option<String>,

        /// Overwrite an existing project file
        #[arg(long)]
        force: bool,
    },
}

/// Split `id=value` at the first `=`; the value may itself contain `=`.
pub fn parse_assignment(input: &str) -> Result<(String, String), Error> {
    match input.split_once('=') {
        Some((id, value)) if !id.trim().is_empty() => Ok((id.trim().to_string(), value.to_string())),
        _ => Err(Error::InvalidAssignment(input.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn assignment_keeps_equals_in_value() {
        assert_eq!(
            parse_assignment("command.env=A=1").unwrap(),
            ("command.env".to_string(), "A=1".to_string())
        );
        assert!(matches!(
            parse_assignment("=x"),
            Err(Error::InvalidAssignment(input)) if input == "=x"
        ));
        assert!(parse_assignment("novalue").is_err());
    }

    #[test]
    fn run_collects_properties() {
        let cli = Cli::parse_from(["radi", "run", "setting.get", "-p", "setting.key=db", "--json"]);
        assert!(cli.json);
        match cli.command {
            Commands::Run {
                operation,
                properties,
            } => {
                assert_eq!(operation, "setting.get");
                assert_eq!(properties, [("setting.key".to_string(), "db".to_string())]);
            }
            _ => panic!("expected run"),
        }
    }
}
