//! Inline suppression-comment parsing.
//!
//! Grounded in the pragma scanner pattern used by the hadolint-compatible
//! analyzer in the sibling `syncable-cli` example: a regex per directive
//! shape, scanned line by line over the raw source rather than over the
//! parsed AST, since directives live in comments the Dockerfile parser
//! otherwise discards.

use once_cell_regex::directive_regexes;
use crate::source_map::SourceMap;

/// Where a directive came from; each has slightly different syntax.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectiveSource {
    Tally,
    Hadolint,
    Buildx,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectiveScope {
    NextLine,
    Global,
}

/// A single parsed suppression or shell directive.
#[derive(Debug, Clone)]
pub struct Directive {
    pub scope: DirectiveScope,
    /// Rule codes this directive suppresses; `["all"]` is a wildcard.
    /// Empty for a `shell=` directive.
    pub rules: Vec<String>,
    /// 0-based inclusive line range this directive applies to. `(-1, -1)`
    /// means "never matches" (dangling next-line directive at EOF).
    pub applies_to: (i64, i64),
    /// 0-based line the directive comment itself was found on.
    pub line: usize,
    pub reason: Option<String>,
    pub source: DirectiveSource,
    pub used: bool,
}

impl Directive {
    pub fn is_wildcard(&self) -> bool {
        self.rules.iter().any(|r| r == "all")
    }

    pub fn matches_code(&self, code: &str) -> bool {
        self.is_wildcard() || self.rules.iter().any(|r| r == code)
    }

    pub fn covers_line(&self, line0: i64) -> bool {
        self.applies_to.0 >= 0 && line0 >= self.applies_to.0 && line0 <= self.applies_to.1
    }
}

/// A `shell=` directive, tracked separately since it doesn't suppress
/// anything; it reassigns the active shell for subsequent `RUN`s.
#[derive(Debug, Clone)]
pub struct ShellDirective {
    pub shell: String,
    pub scope: DirectiveScope,
    pub line: usize,
}

/// An invalid directive, reported downstream as `invalid-ignore-directive`.
#[derive(Debug, Clone)]
pub struct InvalidDirective {
    pub line: usize,
    pub message: String,
}

#[derive(Debug, Default)]
pub struct ParsedDirectives {
    pub directives: Vec<Directive>,
    pub shell_directives: Vec<ShellDirective>,
    pub invalid: Vec<InvalidDirective>,
}

fn is_comment_or_blank(line: &str) -> bool {
    let t = line.trim_start();
    t.is_empty() || t.starts_with('#')
}

/// Returns the 0-based inclusive `appliesTo` range for a next-line directive
/// found on 0-based `line`: the next non-blank, non-comment line, or
/// `(-1, -1)` if none exists before EOF.
fn next_target_line(sm: &SourceMap, line: usize) -> (i64, i64) {
    let mut i = line + 1;
    while i < sm.line_count() {
        if !is_comment_or_blank(sm.line(i)) {
            return (i as i64, i as i64);
        }
        i += 1;
    }
    (-1, -1)
}

/// Scans `sm` line by line for directive comments.
pub fn parse_directives(sm: &SourceMap, validate: Option<&dyn Fn(&str) -> bool>) -> ParsedDirectives {
    let mut out = ParsedDirectives::default();
    let re = directive_regexes();

    for i in 0..sm.line_count() {
        let raw = sm.line(i);
        let trimmed = raw.trim_start();
        if !trimmed.starts_with('#') {
            continue;
        }

        if let Some(caps) = re.ignore.captures(trimmed) {
            let source = if caps.name("tally").is_some() {
                DirectiveSource::Tally
            } else {
                DirectiveSource::Hadolint
            };
            let is_global = caps.name("global").is_some();
            let rule_list = caps.name("rules").map(|m| m.as_str()).unwrap_or("");
            let reason = caps.name("reason").map(|m| m.as_str().trim().to_string());
            handle_rule_list(&mut out, sm, i, is_global, rule_list, reason, source, validate);
            continue;
        }

        if let Some(caps) = re.buildx.captures(trimmed) {
            let rule_list = caps.name("rules").map(|m| m.as_str()).unwrap_or("");
            let reason = caps.name("reason").map(|m| m.as_str().trim().to_string());
            handle_rule_list(&mut out, sm, i, true, rule_list, reason, DirectiveSource::Buildx, validate);
            continue;
        }

        if let Some(caps) = re.shell.captures(trimmed) {
            let source_is_global = caps.name("global").is_some();
            let shell = caps.name("shell").map(|m| m.as_str().to_string()).unwrap_or_default();
            out.shell_directives.push(ShellDirective {
                shell,
                scope: if source_is_global { DirectiveScope::Global } else { DirectiveScope::NextLine },
                line: i,
            });
        }
    }

    out
}

#[allow(clippy::too_many_arguments)]
fn handle_rule_list(
    out: &mut ParsedDirectives,
    sm: &SourceMap,
    line: usize,
    is_global: bool,
    rule_list: &str,
    reason: Option<String>,
    source: DirectiveSource,
    validate: Option<&dyn Fn(&str) -> bool>,
) {
    let rules: Vec<String> = rule_list
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();

    if rules.is_empty() {
        out.invalid.push(InvalidDirective {
            line,
            message: "ignore directive names no rule codes".to_string(),
        });
        return;
    }

    if let Some(validate) = validate {
        let unknown: Vec<&String> = rules.iter().filter(|r| *r != "all" && !validate(r)).collect();
        if !unknown.is_empty() {
            let names = unknown.iter().map(|s| s.as_str()).collect::<Vec<_>>().join(", ");
            out.invalid.push(InvalidDirective {
                line,
                message: format!("unknown rule code(s) in directive: {names}"),
            });
            return;
        }
    }

    let (scope, applies_to) = if is_global {
        (DirectiveScope::Global, (0i64, sm.line_count().saturating_sub(1) as i64))
    } else {
        (DirectiveScope::NextLine, next_target_line(sm, line))
    };

    out.directives.push(Directive {
        scope,
        rules,
        applies_to,
        line,
        reason,
        source,
        used: false,
    });
}

mod once_cell_regex {
    use regex::Regex;
    use std::sync::OnceLock;

    pub struct DirectiveRegexes {
        pub ignore: Regex,
        pub buildx: Regex,
        pub shell: Regex,
    }

    static REGEXES: OnceLock<DirectiveRegexes> = OnceLock::new();

    pub fn directive_regexes() -> &'static DirectiveRegexes {
        REGEXES.get_or_init(|| DirectiveRegexes {
            ignore: Regex::new(
                r"(?i)^#\s*(?P<tally>tally\b|hadolint\b)\s*(?P<global>global\s+)?ignore\s*=\s*(?P<rules>[^;]*)(;\s*reason\s*=\s*(?P<reason>.*))?$",
            )
            .expect("static regex"),
            buildx: Regex::new(
                r"(?i)^#\s*check\s*=\s*skip\s*=\s*(?P<rules>[^;]*)(;\s*reason\s*=\s*(?P<reason>.*))?$",
            )
            .expect("static regex"),
            shell: Regex::new(
                r"(?i)^#\s*(tally|hadolint)\s*(?P<global>global\s+)?shell\s*=\s*(?P<shell>\S+)\s*$",
            )
            .expect("static regex"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn next_line_directive_targets_following_code_line() {
        let sm = SourceMap::new("# tally ignore=hadolint/DL3006\nFROM ubuntu\n");
        let parsed = parse_directives(&sm, None);
        assert_eq!(parsed.directives.len(), 1);
        let d = &parsed.directives[0];
        assert_eq!(d.scope, DirectiveScope::NextLine);
        assert_eq!(d.applies_to, (1, 1));
        assert!(d.matches_code("hadolint/DL3006"));
    }

    #[test]
    fn global_directive_covers_whole_file() {
        let sm = SourceMap::new("# tally global ignore=hadolint/DL3006\nFROM ubuntu:22.04\n");
        let parsed = parse_directives(&sm, None);
        assert_eq!(parsed.directives[0].scope, DirectiveScope::Global);
        assert!(parsed.directives[0].covers_line(1));
    }

    #[test]
    fn dangling_next_line_directive_never_matches() {
        let sm = SourceMap::new("FROM ubuntu\n# tally ignore=hadolint/DL3006\n");
        let parsed = parse_directives(&sm, None);
        assert_eq!(parsed.directives[0].applies_to, (-1, -1));
        assert!(!parsed.directives[0].covers_line(1));
    }

    #[test]
    fn empty_rule_list_is_invalid() {
        let sm = SourceMap::new("# tally ignore=\nFROM ubuntu\n");
        let parsed = parse_directives(&sm, None);
        assert!(parsed.directives.is_empty());
        assert_eq!(parsed.invalid.len(), 1);
    }

    #[test]
    fn buildx_skip_is_always_global() {
        let sm = SourceMap::new("# check=skip=hadolint/DL3006\nFROM ubuntu\n");
        let parsed = parse_directives(&sm, None);
        assert_eq!(parsed.directives[0].scope, DirectiveScope::Global);
        assert_eq!(parsed.directives[0].source, DirectiveSource::Buildx);
    }

    #[test]
    fn shell_directive_parsed_separately() {
        let sm = SourceMap::new("# hadolint shell=dash\nRUN echo hi\n");
        let parsed = parse_directives(&sm, None);
        assert!(parsed.directives.is_empty());
        assert_eq!(parsed.shell_directives[0].shell, "dash");
    }
}
