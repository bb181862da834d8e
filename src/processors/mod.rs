//! Processor Chain: nine stateless transformers run in a fixed canonical
//! order. Each receives the violation slice from the previous
//! stage and a `Context` carrying per-file config, directives, and the
//! source buffer, and returns the next slice. None of these mutate
//! anything outside their own output `Vec`.

use std::collections::HashSet;

use crate::config::Config;
use crate::directives::{Directive, DirectiveSource, InvalidDirective, ParsedDirectives};
use crate::source_map::SourceMap;
use crate::violation::{Severity, Violation};

pub struct Context<'a> {
    pub file: &'a str,
    pub config: &'a Config,
    pub directives: &'a ParsedDirectives,
    pub source: &'a SourceMap,
}

/// Runs all nine stages in order and returns the final diagnostic list.
pub fn run_chain(violations: Vec<Violation>, ctx: &Context) -> Vec<Violation> {
    let v = path_normalization(violations);
    let v = enable_filter(v, ctx.config);
    let v = severity_override(v, ctx.config);
    let v = path_exclusion_filter(v, ctx.config);
    let v = supersession(v);
    let v = inline_directive_filter(v, ctx);
    let v = deduplication(v);
    let mut v = sorting(v);
    snippet_attachment(&mut v, ctx.source);
    v
}

/// 1. Rewrites `Location.file` backslashes to forward slashes.
pub fn path_normalization(mut violations: Vec<Violation>) -> Vec<Violation> {
    for v in &mut violations {
        v.location.file = crate::violation::normalize_path(&v.location.file);
    }
    violations
}

fn is_enabled(code: &str, config: &Config) -> bool {
    if path_list_matches(code, &config.exclude) {
        return false;
    }
    if !config.include.is_empty() && !path_list_matches(code, &config.include) {
        return false;
    }
    let rule_meta = crate::rules::find(code).map(|r| r.metadata());
    match config.rule_config(code) {
        Some(rc) => {
            if let Some(false) = rc.enabled {
                return false;
            }
            if let Some(crate::config::SeverityConfig::Off) = rc.severity {
                return false;
            }
            true
        }
        None => rule_meta.map(|m| m.default_severity != Severity::Off).unwrap_or(true),
    }
}

fn path_list_matches(code: &str, patterns: &[String]) -> bool {
    patterns.iter().any(|p| crate::util::glob_match(p, code))
}

/// 2. Removes violations whose rule is effectively disabled for the file.
/// Construction issues and directive diagnostics (not backed by a
/// registered `Rule`) are never filtered here.
pub fn enable_filter(violations: Vec<Violation>, config: &Config) -> Vec<Violation> {
    violations.into_iter().filter(|v| is_enabled(&v.rule_code, config)).collect()
}

/// 3. Rewrites severity per per-rule config; a rule whose *default*
/// severity is `Off` is auto-enabled to `Warning` when `options` are set
/// (implicit enable) unless the config also names an explicit severity.
pub fn severity_override(mut violations: Vec<Violation>, config: &Config) -> Vec<Violation> {
    for v in &mut violations {
        let Some(rc) = config.rule_config(&v.rule_code) else { continue };
        if let Some(severity) = rc.severity {
            v.severity = severity.into();
        } else if rc.options.is_some() && v.severity == Severity::Off {
            v.severity = Severity::Warning;
        }
    }
    violations
}

/// 4. Removes violations whose location matches the rule's per-rule path
/// exclusion globs.
pub fn path_exclusion_filter(violations: Vec<Violation>, config: &Config) -> Vec<Violation> {
    violations
        .into_iter()
        .filter(|v| {
            let excluded = config
                .rule_config(&v.rule_code)
                .map(|rc| rc.exclude.iter().any(|p| crate::util::glob_match(p, &v.location.file)))
                .unwrap_or(false);
            !excluded
        })
        .collect()
}

/// 5. If an `Error` exists at `(file, line)`, drop all non-`Error`
/// violations sharing that bucket.
pub fn supersession(violations: Vec<Violation>) -> Vec<Violation> {
    let mut has_error: HashSet<(String, i64)> = HashSet::new();
    for v in &violations {
        if v.severity == Severity::Error {
            has_error.insert((v.location.file.clone(), v.location.start.line));
        }
    }
    violations
        .into_iter()
        .filter(|v| {
            let key = (v.location.file.clone(), v.location.start.line);
            v.severity == Severity::Error || !has_error.contains(&key)
        })
        .collect()
}

/// 6. First-match-wins suppression against the parsed directives, plus
/// `unused-ignore-directive` / `missing-directive-reason` diagnostics.
pub fn inline_directive_filter(violations: Vec<Violation>, ctx: &Context) -> Vec<Violation> {
    if !ctx.config.inline_directives.enabled {
        return violations;
    }

    let mut directives = ctx.directives.directives.clone();
    let mut out = Vec::new();

    for v in violations {
        let line0 = v.location.start.line - 1;
        let hit = directives
            .iter_mut()
            .find(|d| d.covers_line(line0) && d.matches_code(&v.rule_code));
        match hit {
            Some(d) => d.used = true,
            None => out.push(v),
        }
    }

    if ctx.config.inline_directives.warn_unused {
        out.extend(unused_directive_warnings(ctx.file, &directives));
    }
    if ctx.config.inline_directives.require_reason {
        out.extend(missing_reason_warnings(ctx.file, &directives));
    }
    out.extend(invalid_directive_warnings(ctx.file, &ctx.directives.invalid));

    out
}

fn unused_directive_warnings(file: &str, directives: &[Directive]) -> Vec<Violation> {
    directives
        .iter()
        .filter(|d| !d.used)
        .map(|d| {
            Violation::new(
                crate::source_map::Location::point(file, (d.line + 1) as i64, 0),
                "unused-ignore-directive",
                "this ignore directive did not suppress anything",
                Severity::Warning,
            )
        })
        .collect()
}

fn missing_reason_warnings(file: &str, directives: &[Directive]) -> Vec<Violation> {
    directives
        .iter()
        .filter(|d| {
            matches!(d.source, DirectiveSource::Tally | DirectiveSource::Hadolint)
                && d.reason.as_deref().unwrap_or("").is_empty()
        })
        .map(|d| {
            Violation::new(
                crate::source_map::Location::point(file, (d.line + 1) as i64, 0),
                "missing-directive-reason",
                "ignore directive has no reason",
                Severity::Warning,
            )
        })
        .collect()
}

fn invalid_directive_warnings(file: &str, invalid: &[InvalidDirective]) -> Vec<Violation> {
    invalid
        .iter()
        .map(|d| {
            Violation::new(
                crate::source_map::Location::point(file, (d.line + 1) as i64, 0),
                "invalid-ignore-directive",
                d.message.clone(),
                Severity::Warning,
            )
        })
        .collect()
}

/// 7. Keeps the first occurrence per `(normalized_file, line, rule_code)`.
pub fn deduplication(violations: Vec<Violation>) -> Vec<Violation> {
    let mut seen = HashSet::new();
    violations.into_iter().filter(|v| seen.insert(v.dedup_key())).collect()
}

/// 8. Stable sort by `(file, start.line, start.column, rule_code)`.
pub fn sorting(mut violations: Vec<Violation>) -> Vec<Violation> {
    violations.sort_by(|a, b| {
        (
            &a.location.file,
            a.location.start.line,
            a.location.start.column,
            &a.rule_code,
        )
            .cmp(&(&b.location.file, b.location.start.line, b.location.start.column, &b.rule_code))
    });
    violations
}

/// 9. Attaches a source snippet to any violation that doesn't already
/// carry one and isn't file-level; an out-of-range line yields an empty
/// snippet rather than panicking.
pub fn snippet_attachment(violations: &mut [Violation], source: &SourceMap) {
    for v in violations.iter_mut() {
        if v.source_code.is_some() || v.location.is_file_level() {
            continue;
        }
        let start = (v.location.start.line - 1).max(0) as usize;
        let end = (v.location.end.line - 1).max(0) as usize;
        if start >= source.line_count() {
            v.source_code = Some(String::new());
            continue;
        }
        v.source_code = Some(source.snippet(start, end.min(source.line_count().saturating_sub(1))));
    }
}
