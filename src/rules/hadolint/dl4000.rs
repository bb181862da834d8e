//! `hadolint/DL4000` — `MAINTAINER` is deprecated; use a `LABEL` instead.
//! Fixable: the rewrite is a pure syntactic substitution, so it's `Safe`.

use dockerfile_parser::Instruction;

use crate::ast;
use crate::rules::{Category, LintInput, Rule, RuleMetadata};
use crate::violation::{FixSafety, SuggestedFix, TextEdit, Violation};
use crate::violation::Severity;

pub struct DeprecatedMaintainer;

impl Rule for DeprecatedMaintainer {
    fn metadata(&self) -> RuleMetadata {
        RuleMetadata {
            code: "hadolint/DL4000",
            name: "maintainer-deprecated",
            description: "MAINTAINER is deprecated, use a LABEL instead",
            doc_url: "https://github.com/hadolint/hadolint/wiki/DL4000",
            default_severity: Severity::Warning,
            category: Category::Metadata,
            is_experimental: false,
            fix_priority: Some(100),
        }
    }

    fn check(&self, input: &LintInput) -> Vec<Violation> {
        let mut out = Vec::new();
        let content = input.parsed.dockerfile.content.as_str();
        for stage in &input.model.stages {
            for ins in &stage.instructions {
                let Instruction::Misc(m) = ins else { continue };
                if !m.instruction.content.eq_ignore_ascii_case("maintainer") {
                    continue;
                }
                let location = ast::location_of(input.file, &input.parsed.source, ins);
                let name = m.arguments.to_string().trim().trim_matches('"').to_string();
                let replacement = format!("LABEL maintainer=\"{name}\"");
                let edit = TextEdit {
                    location: crate::source_map::Location::range(
                        input.file,
                        location.start,
                        location.end,
                    ),
                    new_text: replacement,
                };
                let _ = content;
                out.push(
                    Violation::new(
                        location,
                        self.metadata().code,
                        "MAINTAINER is deprecated, use LABEL maintainer=... instead",
                        self.metadata().default_severity,
                    )
                    .with_doc_url(self.metadata().doc_url)
                    .with_stage(stage.stage_index)
                    .with_fix(SuggestedFix {
                        description: "replace MAINTAINER with LABEL maintainer=...".to_string(),
                        safety: FixSafety::Safe,
                        priority: self.metadata().fix_priority.unwrap_or(100),
                        is_preferred: true,
                        edits: vec![edit],
                        needs_resolve: None,
                    }),
                );
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{parse, ParseResult};
    use crate::semantic;

    #[test]
    fn flags_and_fixes_maintainer() {
        let content = "FROM ubuntu:22.04\nMAINTAINER Jane Doe\n";
        let dockerfile = parse("Dockerfile", content).unwrap();
        let parsed = ParseResult::new("Dockerfile", &dockerfile);
        let model = semantic::build(&parsed);
        let input = LintInput { file: "Dockerfile", parsed: &parsed, model: &model };
        let violations = DeprecatedMaintainer.check(&input);
        assert_eq!(violations.len(), 1);
        let fix = violations[0].suggested_fix.as_ref().unwrap();
        assert_eq!(fix.safety, FixSafety::Safe);
        assert!(fix.edits[0].new_text.contains("LABEL maintainer"));
    }
}
