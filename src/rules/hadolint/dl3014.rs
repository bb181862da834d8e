//! `hadolint/DL3014` — use the `-y` switch with `apt-get install` so builds
//! don't hang waiting for interactive confirmation. Fixable: inserting the
//! flag cannot change the set of installed packages, so it's `Safe`.

use dockerfile_parser::Instruction;

use crate::ast;
use crate::rules::{Category, LintInput, Rule, RuleMetadata};
use crate::source_map::Location;
use crate::violation::{FixSafety, Severity, SuggestedFix, TextEdit, Violation};

pub struct AptGetMissingYes;

impl Rule for AptGetMissingYes {
    fn metadata(&self) -> RuleMetadata {
        RuleMetadata {
            code: "hadolint/DL3014",
            name: "apt-get-missing-yes",
            description: "Use the -y switch to avoid manual input apt-get install",
            doc_url: "https://github.com/hadolint/hadolint/wiki/DL3014",
            default_severity: Severity::Warning,
            category: Category::Style,
            is_experimental: false,
            fix_priority: Some(95),
        }
    }

    fn check(&self, input: &LintInput) -> Vec<Violation> {
        let mut out = Vec::new();
        let content = input.parsed.dockerfile.content.as_str();
        for stage in &input.model.stages {
            for ins in &stage.instructions {
                let Instruction::Run(_) = ins else { continue };
                let text = ast::raw_text(content, ins);
                let Some(offset) = find_bare_install(text) else { continue };
                let (start, _) = ast::span_of(ins);
                let insert_at = input.parsed.source.position_for_offset(start + offset);
                out.push(
                    Violation::new(
                        ast::location_of(input.file, &input.parsed.source, ins),
                        self.metadata().code,
                        "apt-get install is missing the -y flag",
                        self.metadata().default_severity,
                    )
                    .with_doc_url(self.metadata().doc_url)
                    .with_stage(stage.stage_index)
                    .with_fix(SuggestedFix {
                        description: "add -y to apt-get install".to_string(),
                        safety: FixSafety::Safe,
                        priority: self.metadata().fix_priority.unwrap_or(95),
                        is_preferred: true,
                        edits: vec![TextEdit {
                            location: Location::range(input.file, insert_at, insert_at),
                            new_text: " -y".to_string(),
                        }],
                        needs_resolve: None,
                    }),
                );
            }
        }
        out
    }
}

/// Returns the byte offset just after `install` in an `apt-get install`
/// invocation with no `-y`/`--yes`/`--assume-yes` anywhere in the line.
fn find_bare_install(text: &str) -> Option<usize> {
    let idx = text.find("apt-get install")?;
    let has_yes = text.contains("-y") || text.contains("--yes") || text.contains("--assume-yes");
    if has_yes {
        return None;
    }
    Some(idx + "apt-get install".len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{parse, ParseResult};
    use crate::semantic;

    #[test]
    fn flags_missing_yes_flag() {
        let content = "FROM ubuntu:22.04\nRUN apt-get install curl\n";
        let dockerfile = parse("Dockerfile", content).unwrap();
        let parsed = ParseResult::new("Dockerfile", &dockerfile);
        let model = semantic::build(&parsed);
        let input = LintInput { file: "Dockerfile", parsed: &parsed, model: &model };
        assert_eq!(AptGetMissingYes.check(&input).len(), 1);
    }

    #[test]
    fn accepts_yes_flag() {
        let content = "FROM ubuntu:22.04\nRUN apt-get install -y curl\n";
        let dockerfile = parse("Dockerfile", content).unwrap();
        let parsed = ParseResult::new("Dockerfile", &dockerfile);
        let model = semantic::build(&parsed);
        let input = LintInput { file: "Dockerfile", parsed: &parsed, model: &model };
        assert!(AptGetMissingYes.check(&input).is_empty());
    }
}
