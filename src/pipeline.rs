//! Top-level entry points: wires the AST adapter, semantic builder, rule
//! registry, async runtime, processor chain, and fix engine into the two
//! operations an external caller actually wants — `lint` and `fix`.

use std::sync::Arc;

use crate::async_runtime::{self, AsyncConfig, Resolver};
use crate::config::Config;
use crate::directives;
use crate::error::LintError;
use crate::fixengine::{self, FixOutcome};
use crate::processors::{self, Context};
use crate::rules::{self, LintInput};
use crate::semantic;
use crate::violation::Violation;
use crate::{ast, source_map::SourceMap};

/// Parses, builds the semantic model, and runs every sync rule plus the
/// processor chain. Async checks are skipped; use [`lint_async`] when a
/// resolver set is available.
pub fn lint(file: &str, content: &str, config: &Config) -> Result<Vec<Violation>, LintError> {
    let dockerfile = ast::parse(file, content)?;
    let parsed = ast::ParseResult::new(file, &dockerfile);
    let model = semantic::build(&parsed);
    let input = LintInput { file, parsed: &parsed, model: &model };

    let mut violations = model.construction_issues.clone();
    violations.extend(rules::run_sync_rules(&input));

    Ok(run_processors(file, content, violations, config))
}

/// Same as [`lint`] but also plans and runs async checks against the
/// provided resolver set, keeping planning separate from I/O.
pub async fn lint_async(
    file: &str,
    content: &str,
    config: &Config,
    resolvers: &[Arc<dyn Resolver>],
) -> Result<Vec<Violation>, LintError> {
    let dockerfile = ast::parse(file, content)?;
    let parsed = ast::ParseResult::new(file, &dockerfile);
    let model = semantic::build(&parsed);
    let input = LintInput { file, parsed: &parsed, model: &model };

    let mut violations = model.construction_issues.clone();
    violations.extend(rules::run_sync_rules(&input));

    if config.slow_checks.enabled {
        let requests = rules::plan_async_checks(&input);
        let async_config: AsyncConfig = (&config.slow_checks).into();
        violations.extend(async_runtime::run_async_checks(requests, resolvers, &async_config).await);
    }

    Ok(run_processors(file, content, violations, config))
}

fn run_processors(file: &str, content: &str, violations: Vec<Violation>, config: &Config) -> Vec<Violation> {
    let source = SourceMap::new(content);
    let validate = if config.inline_directives.validate_rules {
        Some(rule_code_is_known as &dyn Fn(&str) -> bool)
    } else {
        None
    };
    let directives = directives::parse_directives(&source, validate);
    let ctx = Context { file, config, directives: &directives, source: &source };
    processors::run_chain(violations, &ctx)
}

fn rule_code_is_known(code: &str) -> bool {
    rules::find(code).is_some()
}

/// Lints `content`, then applies whatever fixes the processed diagnostics
/// and the configured fix mode allow. The result is not re-linted;
/// callers re-run the pipeline to see a fixed point.
pub async fn fix(file: &str, content: &str, config: &Config, resolvers: &[Arc<dyn Resolver>]) -> Result<(FixOutcome, Vec<Violation>), LintError> {
    let violations = lint_async(file, content, config, resolvers).await?;
    let outcome = fixengine::apply_fixes(content, &violations, config, resolvers).await;
    Ok((outcome, violations))
}
