//! `tally/workdir-missing-before-relative-copy` — a `COPY` whose
//! destination is a relative path, reached before any `WORKDIR` has been
//! set in the stage, lands relative to an unstated directory (`/` by
//! default). Original to this engine, not a real hadolint code.

use dockerfile_parser::Instruction;

use crate::ast;
use crate::rules::{Category, LintInput, Rule, RuleMetadata};
use crate::violation::{Severity, Violation};

pub struct WorkdirMissingBeforeRelativeCopy;

impl Rule for WorkdirMissingBeforeRelativeCopy {
    fn metadata(&self) -> RuleMetadata {
        RuleMetadata {
            code: "tally/workdir-missing-before-relative-copy",
            name: "workdir-missing-before-relative-copy",
            description: "COPY with a relative destination before any WORKDIR is set",
            doc_url: "",
            default_severity: Severity::Info,
            category: Category::Style,
            is_experimental: false,
            fix_priority: None,
        }
    }

    fn check(&self, input: &LintInput) -> Vec<Violation> {
        let mut out = Vec::new();
        let content = input.parsed.dockerfile.content.as_str();
        for stage in &input.model.stages {
            let mut workdir_set = false;
            for ins in &stage.instructions {
                if ast::instruction_kind(ins) == "WORKDIR" {
                    workdir_set = true;
                    continue;
                }
                let Instruction::Copy(_) = ins else { continue };
                if workdir_set {
                    continue;
                }
                let text = ast::raw_text(content, ins);
                let Some(dest) = relative_destination(text) else { continue };
                out.push(
                    Violation::new(
                        ast::location_of(input.file, &input.parsed.source, ins),
                        self.metadata().code,
                        format!("COPY destination '{dest}' is relative but no WORKDIR has been set"),
                        self.metadata().default_severity,
                    )
                    .with_stage(stage.stage_index),
                );
            }
        }
        out
    }
}

/// Returns the COPY instruction's destination token if it looks relative
/// (no leading `/`, not a flag, not `--from=...`). Best-effort text split,
/// not a full shell/arg parser.
fn relative_destination(text: &str) -> Option<&str> {
    let tokens: Vec<&str> = text
        .split_whitespace()
        .skip(1)
        .filter(|t| !t.starts_with("--"))
        .collect();
    let dest = *tokens.last()?;
    if dest.starts_with('/') || dest.starts_with('$') {
        None
    } else {
        Some(dest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{parse, ParseResult};
    use crate::semantic;

    #[test]
    fn flags_relative_copy_before_workdir() {
        let content = "FROM ubuntu:22.04\nCOPY app/ app/\n";
        let dockerfile = parse("Dockerfile", content).unwrap();
        let parsed = ParseResult::new("Dockerfile", &dockerfile);
        let model = semantic::build(&parsed);
        let input = LintInput { file: "Dockerfile", parsed: &parsed, model: &model };
        assert_eq!(WorkdirMissingBeforeRelativeCopy.check(&input).len(), 1);
    }

    #[test]
    fn accepts_copy_after_workdir() {
        let content = "FROM ubuntu:22.04\nWORKDIR /app\nCOPY app/ app/\n";
        let dockerfile = parse("Dockerfile", content).unwrap();
        let parsed = ParseResult::new("Dockerfile", &dockerfile);
        let model = semantic::build(&parsed);
        let input = LintInput { file: "Dockerfile", parsed: &parsed, model: &model };
        assert!(WorkdirMissingBeforeRelativeCopy.check(&input).is_empty());
    }

    #[test]
    fn accepts_absolute_destination() {
        let content = "FROM ubuntu:22.04\nCOPY app/ /opt/app/\n";
        let dockerfile = parse("Dockerfile", content).unwrap();
        let parsed = ParseResult::new("Dockerfile", &dockerfile);
        let model = semantic::build(&parsed);
        let input = LintInput { file: "Dockerfile", parsed: &parsed, model: &model };
        assert!(WorkdirMissingBeforeRelativeCopy.check(&input).is_empty());
    }
}
