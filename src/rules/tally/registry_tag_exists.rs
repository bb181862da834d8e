//! `tally/registry-tag-exists` — demonstrates the async check contract end
//! to end. Planning is pure: it only reads the already-built
//! `FromInstruction`s and emits one `CheckRequest` per externally-sourced
//! image, deduplicated on `image:tag` so the runtime probes each image
//! once per run regardless of how many stages reference it.

use std::sync::Arc;

use dockerfile_parser::{Instruction, StageParent};

use crate::ast;
use crate::async_runtime::{CheckHandler, CheckRequest, ResolvedValue};
use crate::error::ResolverError;
use crate::rules::{Category, LintInput, Rule, RuleMetadata};
use crate::source_map::Location;
use crate::violation::{Severity, Violation};

pub struct RegistryTagExists;

struct TagExistsHandler {
    location: Location,
    stage_index: usize,
}

impl CheckHandler for TagExistsHandler {
    fn on_success(&self, request: &CheckRequest, value: &ResolvedValue) -> Vec<Violation> {
        match value {
            ResolvedValue::TagExists(false) => vec![Violation::new(
                self.location.clone(),
                &request.rule_code,
                format!("image {} was not found in the registry", request.opaque_data),
                Severity::Error,
            )
            .with_stage(self.stage_index)],
            _ => Vec::new(),
        }
    }

    fn on_error(&self, _request: &CheckRequest, _err: &ResolverError) -> Option<Violation> {
        // A resolver error during an async check is either translated or
        // dropped; a transport failure here just means we couldn't
        // confirm anything, not that the tag is wrong.
        None
    }
}

impl Rule for RegistryTagExists {
    fn metadata(&self) -> RuleMetadata {
        RuleMetadata {
            code: "tally/registry-tag-exists",
            name: "registry-tag-exists",
            description: "Base image tag must exist in its registry",
            doc_url: "",
            default_severity: Severity::Error,
            category: Category::BaseImage,
            is_experimental: true,
            fix_priority: None,
        }
    }

    fn check(&self, _input: &LintInput) -> Vec<Violation> {
        Vec::new()
    }

    fn plan_async(&self, input: &LintInput) -> Vec<CheckRequest> {
        let mut out = Vec::new();
        for stage in &input.model.stages {
            let Some(Instruction::From(from)) = stage.instructions.first().copied() else { continue };
            if from.image_parsed.image == "scratch" {
                continue;
            }
            if stage_parent_is_previous_stage(stage.stage_index, input) {
                continue;
            }
            let tag = from.image_parsed.tag.clone().unwrap_or_else(|| "latest".to_string());
            let image_ref = format!("{}:{}", from.image_parsed.image, tag);
            out.push(CheckRequest {
                rule_code: self.metadata().code.to_string(),
                category: "registry".to_string(),
                dedup_key: image_ref.clone(),
                resolver_id: "http-registry".to_string(),
                opaque_data: image_ref,
                file: input.file.to_string(),
                stage_index: Some(stage.stage_index),
                handler: Arc::new(TagExistsHandler {
                    location: ast::location_of(input.file, &input.parsed.source, stage.instructions[0]),
                    stage_index: stage.stage_index,
                }),
            });
        }
        out
    }
}

fn stage_parent_is_previous_stage(stage_index: usize, input: &LintInput) -> bool {
    input
        .parsed
        .stages
        .stages
        .get(stage_index)
        .map(|s| matches!(s.parent, StageParent::Stage(_)))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{parse, ParseResult};
    use crate::semantic;

    #[test]
    fn plans_one_request_per_external_image() {
        let content = "FROM alpine:3.19\nFROM scratch\n";
        let dockerfile = parse("Dockerfile", content).unwrap();
        let parsed = ParseResult::new("Dockerfile", &dockerfile);
        let model = semantic::build(&parsed);
        let input = LintInput { file: "Dockerfile", parsed: &parsed, model: &model };
        let requests = RegistryTagExists.plan_async(&input);
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].opaque_data, "alpine:3.19");
    }
}
