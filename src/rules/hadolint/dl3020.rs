//! `hadolint/DL3020` — use `COPY` instead of `ADD` for plain files and
//! directories; `ADD`'s extra behavior (URL fetch, archive extraction) is
//! only warranted for those cases. Fixable only as a `Suggestion`: textual
//! substitution is easy, but confirming the source isn't secretly a URL
//! or archive needs a human.

use dockerfile_parser::Instruction;

use crate::ast;
use crate::rules::{Category, LintInput, Rule, RuleMetadata};
use crate::source_map::Location;
use crate::violation::{FixSafety, Severity, SuggestedFix, TextEdit, Violation};

pub struct AddInsteadOfCopy;

const ARCHIVE_EXTENSIONS: &[&str] = &[".tar", ".tar.gz", ".tgz", ".tar.bz2", ".tar.xz", ".zip"];

impl Rule for AddInsteadOfCopy {
    fn metadata(&self) -> RuleMetadata {
        RuleMetadata {
            code: "hadolint/DL3020",
            name: "add-instead-of-copy",
            description: "Use COPY instead of ADD for files and folders",
            doc_url: "https://github.com/hadolint/hadolint/wiki/DL3020",
            default_severity: Severity::Error,
            category: Category::Style,
            is_experimental: false,
            fix_priority: Some(110),
        }
    }

    fn check(&self, input: &LintInput) -> Vec<Violation> {
        let mut out = Vec::new();
        for stage in &input.model.stages {
            for ins in &stage.instructions {
                let Instruction::Misc(m) = ins else { continue };
                if !m.instruction.content.eq_ignore_ascii_case("add") {
                    continue;
                }
                let args = m.arguments.to_string();
                let first_source = args.split_whitespace().next().unwrap_or("");
                if is_url(first_source) || is_archive(first_source) {
                    continue;
                }

                let location = ast::location_of(input.file, &input.parsed.source, ins);
                let (start, _) = ast::span_of(ins);
                let keyword_end = input.parsed.source.position_for_offset(start + "ADD".len());
                let keyword_start = input.parsed.source.position_for_offset(start);

                out.push(
                    Violation::new(
                        location,
                        self.metadata().code,
                        "use COPY instead of ADD for plain files and directories",
                        self.metadata().default_severity,
                    )
                    .with_doc_url(self.metadata().doc_url)
                    .with_stage(stage.stage_index)
                    .with_fix(SuggestedFix {
                        description: "replace ADD with COPY".to_string(),
                        safety: FixSafety::Suggestion,
                        priority: self.metadata().fix_priority.unwrap_or(110),
                        is_preferred: true,
                        edits: vec![TextEdit {
                            location: Location::range(input.file, keyword_start, keyword_end),
                            new_text: "COPY".to_string(),
                        }],
                        needs_resolve: None,
                    }),
                );
            }
        }
        out
    }
}

fn is_url(s: &str) -> bool {
    s.starts_with("http://") || s.starts_with("https://")
}

fn is_archive(s: &str) -> bool {
    ARCHIVE_EXTENSIONS.iter().any(|ext| s.ends_with(ext))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{parse, ParseResult};
    use crate::semantic;

    #[test]
    fn flags_plain_add() {
        let content = "FROM ubuntu:22.04\nADD ./app /srv/app\n";
        let dockerfile = parse("Dockerfile", content).unwrap();
        let parsed = ParseResult::new("Dockerfile", &dockerfile);
        let model = semantic::build(&parsed);
        let input = LintInput { file: "Dockerfile", parsed: &parsed, model: &model };
        let violations = AddInsteadOfCopy.check(&input);
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].suggested_fix.as_ref().unwrap().safety, FixSafety::Suggestion);
    }

    #[test]
    fn allows_url_source() {
        let content = "FROM ubuntu:22.04\nADD https://example.com/a.tgz /tmp/\n";
        let dockerfile = parse("Dockerfile", content).unwrap();
        let parsed = ParseResult::new("Dockerfile", &dockerfile);
        let model = semantic::build(&parsed);
        let input = LintInput { file: "Dockerfile", parsed: &parsed, model: &model };
        assert!(AddInsteadOfCopy.check(&input).is_empty());
    }
}
