pub mod ast;
pub mod async_runtime;
pub mod cli;
pub mod config;
pub mod directives;
pub mod error;
pub mod fixengine;
pub mod pipeline;
pub mod processors;
pub mod reporter;
pub mod rules;
pub mod semantic;
pub mod source_map;
pub mod util;
pub mod violation;

use std::fs;
use std::sync::Arc;

use cli::{Cli, Commands, OutputFormat};

use crate::async_runtime::Resolver;
use crate::config::Config;

/// Parses CLI args and runs the requested subcommand. Thin by design: the
/// core (`pipeline`, `rules`, `processors`, `fixengine`) does all the real
/// work and has no dependency on `clap` or any of this.
pub async fn run_with_args<I, T>(args: I) -> anyhow::Result<()>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    use clap::Parser;
    let cli = Cli::parse_from(args);

    match cli.command {
        Commands::Lint { path, format, config, no_async } => run_lint(path, format, config, no_async).await,
        Commands::Fix { path, mode, config, no_async } => run_fix(path, mode, config, no_async).await,
    }
}

fn load_config(path: Option<std::path::PathBuf>) -> anyhow::Result<Config> {
    match path {
        None => Ok(Config::default()),
        Some(path) => {
            let raw = fs::read_to_string(&path)?;
            let config: Config = serde_json::from_str(&raw)?;
            Ok(config)
        }
    }
}

async fn run_lint(path: std::path::PathBuf, format: OutputFormat, config_path: Option<std::path::PathBuf>, no_async: bool) -> anyhow::Result<()> {
    let content = fs::read_to_string(&path)?;
    let file = path.display().to_string();
    let mut config = load_config(config_path)?;
    if no_async {
        config.slow_checks.enabled = false;
    }

    let resolvers: Vec<Arc<dyn Resolver>> = default_resolvers();
    let violations = pipeline::lint_async(&file, &content, &config, &resolvers).await?;

    match format {
        OutputFormat::Table => reporter::print_report(&file, &violations),
        OutputFormat::Json => {
            let report = reporter::JsonReport::from_violations(&file, &violations);
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }

    let has_error = violations.iter().any(|v| v.severity == violation::Severity::Error);
    if has_error {
        std::process::exit(1);
    }
    Ok(())
}

async fn run_fix(path: std::path::PathBuf, mode: cli::FixModeArg, config_path: Option<std::path::PathBuf>, no_async: bool) -> anyhow::Result<()> {
    let content = fs::read_to_string(&path)?;
    let file = path.display().to_string();
    let mut config = load_config(config_path)?;
    config.fix_mode = mode.into();
    if no_async {
        config.slow_checks.enabled = false;
    }

    let resolvers: Vec<Arc<dyn Resolver>> = default_resolvers();
    let (outcome, violations) = pipeline::fix(&file, &content, &config, &resolvers).await?;

    fs::write(&path, &outcome.source)?;
    tracing::info!(applied = outcome.applied_count, "applied fixes to {}", file);
    reporter::print_report(&file, &violations);
    Ok(())
}

fn default_resolvers() -> Vec<Arc<dyn Resolver>> {
    vec![Arc::new(async_runtime::HttpResolver::new("https://registry-1.docker.io"))]
}
