//! `hadolint/DL3006` — always tag the version of an image explicitly.

use std::sync::OnceLock;

use dockerfile_parser::Instruction;
use regex::Regex;

use crate::ast;
use crate::rules::{Category, LintInput, Rule, RuleMetadata};
use crate::source_map::Location;
use crate::violation::{FixSafety, NeedsResolve, Severity, SuggestedFix, TextEdit, Violation};

fn from_image_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)^FROM\s+(?:--platform=\S+\s+)?(?P<image>\S+)").expect("static regex")
    })
}

/// Locates the byte span of just the image reference within a `FROM`
/// instruction's raw text, skipping the keyword and any `--platform` flag.
fn image_ref_span(raw: &str) -> Option<(usize, usize)> {
    let caps = from_image_regex().captures(raw)?;
    let m = caps.name("image")?;
    Some((m.start(), m.end()))
}

pub struct UntaggedBaseImage;

impl Rule for UntaggedBaseImage {
    fn metadata(&self) -> RuleMetadata {
        RuleMetadata {
            code: "hadolint/DL3006",
            name: "untagged-base-image",
            description: "Always tag the version of an image explicitly",
            doc_url: "https://github.com/hadolint/hadolint/wiki/DL3006",
            default_severity: Severity::Warning,
            category: Category::BaseImage,
            is_experimental: false,
            fix_priority: None,
        }
    }

    fn check(&self, input: &LintInput) -> Vec<Violation> {
        let mut out = Vec::new();
        for stage in &input.model.stages {
            let Some(Instruction::From(from)) = stage.instructions.first().copied() else { continue };
            if from.image_parsed.image.eq_ignore_ascii_case("scratch") {
                continue;
            }
            let untagged = match &from.image_parsed.tag {
                None => true,
                Some(tag) => tag == "latest",
            };
            if untagged {
                let ins = stage.instructions[0];
                let mut violation = Violation::new(
                    ast::location_of(input.file, &input.parsed.source, ins),
                    self.metadata().code,
                    format!(
                        "base image {:?} has no explicit tag, or uses \"latest\"",
                        from.image_parsed.image
                    ),
                    self.metadata().default_severity,
                )
                .with_doc_url(self.metadata().doc_url)
                .with_stage(stage.stage_index);

                let raw = ast::raw_text(input.parsed.source.content(), ins);
                if let Some((rel_start, rel_end)) = image_ref_span(raw) {
                    let (ins_start, _) = ast::span_of(ins);
                    let start = input.parsed.source.position_for_offset(ins_start + rel_start);
                    let end = input.parsed.source.position_for_offset(ins_start + rel_end);
                    let image_ref = format!("{}:latest", from.image_parsed.image);
                    violation = violation.with_fix(SuggestedFix {
                        description: "pin the base image to the digest currently resolved for this tag".to_string(),
                        safety: FixSafety::Unsafe,
                        priority: 120,
                        is_preferred: true,
                        edits: vec![TextEdit {
                            location: Location::range(input.file, start, end),
                            new_text: image_ref.clone(),
                        }],
                        needs_resolve: Some(NeedsResolve {
                            resolver_id: "http-registry".to_string(),
                            resolver_data: image_ref,
                        }),
                    });
                }

                out.push(violation);
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
    fn flags_untagged_base_image() {
        let content = "FROM ubuntu\nRUN echo hi\n";
        let dockerfile = parse("Dockerfile", content).unwrap();
        let parsed = ParseResult::new("Dockerfile", &dockerfile);
        let model = semantic::build(&parsed);
        let input = LintInput { file: "Dockerfile", parsed: &parsed, model: &model };
        let violations = UntaggedBaseImage.check(&input);
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].location.start.line, 1);
    }

    #[test]
    fn allows_pinned_tag() {
        let content = "FROM ubuntu:22.04\n";
        let dockerfile = parse("Dockerfile", content).unwrap();
        let parsed = ParseResult::new("Dockerfile", &dockerfile);
        let model = semantic::build(&parsed);
        let input = LintInput { file: "Dockerfile", parsed: &parsed, model: &model };
        assert!(UntaggedBaseImage.check(&input).is_empty());
    }

    #[test]
    fn allows_scratch() {
        let content = "FROM scratch\n";
        let dockerfile = parse("Dockerfile", content).unwrap();
        let parsed = ParseResult::new("Dockerfile", &dockerfile);
        let model = semantic::build(&parsed);
        let input = LintInput { file: "Dockerfile", parsed: &parsed, model: &model };
        assert!(UntaggedBaseImage.check(&input).is_empty());
    }

    #[test]
    fn untagged_image_carries_a_digest_pinning_fix() {
        let content = "FROM ubuntu\n";
        let dockerfile = parse("Dockerfile", content).unwrap();
        let parsed = ParseResult::new("Dockerfile", &dockerfile);
        let model = semantic::build(&parsed);
        let input = LintInput { file: "Dockerfile", parsed: &parsed, model: &model };
        let violations = UntaggedBaseImage.check(&input);
        let fix = violations[0].suggested_fix.as_ref().expect("fix present");
        assert_eq!(fix.safety, FixSafety::Unsafe);
        assert_eq!(fix.edits[0].new_text, "ubuntu:latest");
        assert_eq!(fix.needs_resolve.as_ref().unwrap().resolver_id, "http-registry");
    }

    #[tokio::test]
    async fn digest_resolution_pins_the_base_image_end_to_end() {
        use crate::async_runtime::{InMemoryResolver, Resolver};
        use crate::config::{Config, FixMode};
        use crate::fixengine::apply_fixes;
        use std::sync::Arc;

        let content = "FROM ubuntu\n";
        let mut config = Config::default();
        config.fix_mode = FixMode::Unsafe;
        let resolver: Arc<dyn Resolver> = Arc::new(InMemoryResolver::with_digest("sha256:deadbeef").as_resolver_id("http-registry"));

        let dockerfile = parse("Dockerfile", content).unwrap();
        let parsed = ParseResult::new("Dockerfile", &dockerfile);
        let model = semantic::build(&parsed);
        let input = LintInput { file: "Dockerfile", parsed: &parsed, model: &model };
        let violations = UntaggedBaseImage.check(&input);

        let outcome = apply_fixes(content, &violations, &config, &[resolver]).await;
        assert_eq!(outcome.applied_count, 1);
        assert!(outcome.source.contains("FROM ubuntu:latest@sha256:deadbeef"));
    }
}
