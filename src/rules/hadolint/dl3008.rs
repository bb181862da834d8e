//! `hadolint/DL3008` — pin versions in `apt-get install` so a rebuild
//! can't silently pull in a newer, untested package. Not auto-fixable:
//! picking a correct version string is not something the engine can infer.

use dockerfile_parser::Instruction;

use crate::ast;
use crate::rules::{Category, LintInput, Rule, RuleMetadata};
use crate::violation::{Severity, Violation};

pub struct AptGetUnpinnedVersion;

impl Rule for AptGetUnpinnedVersion {
    fn metadata(&self) -> RuleMetadata {
        RuleMetadata {
            code: "hadolint/DL3008",
            name: "apt-get-unpinned-version",
            description: "Pin versions in apt-get install",
            doc_url: "https://github.com/hadolint/hadolint/wiki/DL3008",
            default_severity: Severity::Warning,
            category: Category::Style,
            is_experimental: false,
            fix_priority: None,
        }
    }

    fn check(&self, input: &LintInput) -> Vec<Violation> {
        let mut out = Vec::new();
        let content = input.parsed.dockerfile.content.as_str();
        for stage in &input.model.stages {
            for ins in &stage.instructions {
                let Instruction::Run(_) = ins else { continue };
                let text = ast::raw_text(content, ins);
                if has_unpinned_install(text) {
                    out.push(
                        Violation::new(
                            ast::location_of(input.file, &input.parsed.source, ins),
                            self.metadata().code,
                            "apt-get install packages have no pinned version; add =<version>",
                            self.metadata().default_severity,
                        )
                        .with_doc_url(self.metadata().doc_url)
                        .with_stage(stage.stage_index),
                    );
                }
            }
        }
        out
    }
}

/// True iff the line runs `apt-get install` and at least one package token
/// after it has no `=<version>` suffix. Flags are skipped; a heuristic,
/// not a shell parser.
fn has_unpinned_install(text: &str) -> bool {
    let Some(idx) = text.find("apt-get install") else { return false };
    let rest = &text[idx + "apt-get install".len()..];
    let packages: Vec<&str> = rest
        .split_whitespace()
        .take_while(|tok| *tok != "&&" && *tok != "|" && *tok != ";")
        .filter(|tok| !tok.starts_with('-'))
        .collect();
    !packages.is_empty() && packages.iter().any(|p| !p.contains('='))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{parse, ParseResult};
    use crate::semantic;

    #[test]
    fn flags_unpinned_package() {
        let content = "FROM ubuntu:22.04\nRUN apt-get install -y curl\n";
        let dockerfile = parse("Dockerfile", content).unwrap();
        let parsed = ParseResult::new("Dockerfile", &dockerfile);
        let model = semantic::build(&parsed);
        let input = LintInput { file: "Dockerfile", parsed: &parsed, model: &model };
        assert_eq!(AptGetUnpinnedVersion.check(&input).len(), 1);
    }

    #[test]
    fn accepts_pinned_package() {
        let content = "FROM ubuntu:22.04\nRUN apt-get install -y curl=7.81.0-1\n";
        let dockerfile = parse("Dockerfile", content).unwrap();
        let parsed = ParseResult::new("Dockerfile", &dockerfile);
        let model = semantic::build(&parsed);
        let input = LintInput { file: "Dockerfile", parsed: &parsed, model: &model };
        assert!(AptGetUnpinnedVersion.check(&input).is_empty());
    }
}
