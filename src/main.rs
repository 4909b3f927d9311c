// ABOUTME: Entry point for the radi CLI application.
// ABOUTME: Builds the project's operations and dispatches list/info/run/init.

mod cli;

use clap::Parser;
use cli::{Cli, Commands};
use radi_handlers::config::{self, ProjectConfig};
use radi_handlers::diagnostics::Diagnostics;
use radi_handlers::error::{Error, Result};
use radi_handlers::handler::{BuilderRegistry, ProjectBuild, ProjectBuilder};
use radi_handlers::operation;
use radi_handlers::output::{Output, OutputMode};
use std::env;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // RADI_LOG takes precedence over the verbose flag
    let filter = EnvFilter::try_from_env("RADI_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            EnvFilter::new("debug")
        } else {
            EnvFilter::new("warn")
        }
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let result = run(cli).await;

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let mode = if cli.json {
        OutputMode::Json
    } else if cli.quiet {
        OutputMode::Quiet
    } else {
        OutputMode::Normal
    };
    let mut output = Output::stdout(mode);

    let dir = match cli.directory {
        Some(dir) => dir,
        None => env::current_dir()?,
    };

    match cli.command {
        Commands::Init { name, force } => {
            let path = config::init_project(&dir, name.as_deref(), force)?;
            output.progress(&format!("Created {}", path.display()))?;
            Ok(())
        }
        Commands::List { all } => {
            let build = build(&dir)?;
            let visible = build
                .operations
                .iter()
                .filter(|op| all || !op.internal());
            output.operations(visible)?;
            Ok(())
        }
        Commands::Info { operation } => {
            let build = build(&dir)?;
            let op = build
                .operations
                .get(&operation)
                .ok_or(Error::UnknownOperation(operation.clone()))?;
            output.operation_info(op)?;
            Ok(())
        }
        Commands::Run {
            operation,
            properties,
        } => {
            let mut build = build(&dir)?;
            let mut op = build
                .operations
                .remove(&operation)
                .ok_or(Error::UnknownOperation(operation.clone()))?;

            for (id, value) in &properties {
                op.properties_mut().set_external(id, value)?;
            }

            let result = operation::run(op.as_mut()).await;
            output.result(&result, op.as_ref())?;

            if result.is_success() {
                Ok(())
            } else {
                Err(Error::OperationFailed {
                    operation: result.operation,
                    message: result.errors.join("; "),
                })
            }
        }
    }
}

/// Discover the project above `dir` and activate its builders.
fn build(dir: &Path) -> Result<ProjectBuild> {
    let project = ProjectConfig::discover(&absolute(dir)?)?;
    let registry = BuilderRegistry::default();
    let mut diag = Diagnostics::default();

    let build = ProjectBuilder::new(&registry).build(&project, &mut diag)?;
    for warning in diag.warnings() {
        tracing::warn!(kind = ?warning.kind, "{}", warning.message);
    }
    tracing::debug!(
        builders = ?build.builders,
        operations = build.operations.len(),
        secured = build.secured,
        "project built"
    );

    Ok(build)
}

fn absolute(dir: &Path) -> Result<PathBuf> {
    if dir.is_absolute() {
        Ok(dir.to_path_buf())
    } else {
        Ok(env::current_dir()?.join(dir))
    }
}
