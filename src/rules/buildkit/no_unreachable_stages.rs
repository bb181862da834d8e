//! `buildkit/NoUnreachableStages` — a named build stage that nothing in
//! the final stage's dependency chain reaches is dead weight (or a typo in
//! a `COPY --from=`).

use crate::rules::{Category, LintInput, Rule, RuleMetadata};
use crate::source_map::Location;
use crate::violation::{Severity, Violation};

pub struct NoUnreachableStages;

impl Rule for NoUnreachableStages {
    fn metadata(&self) -> RuleMetadata {
        RuleMetadata {
            code: "buildkit/NoUnreachableStages",
            name: "no-unreachable-stages",
            description: "A build stage is never reached from the final stage",
            doc_url: "",
            default_severity: Severity::Info,
            category: Category::Stage,
            is_experimental: false,
            fix_priority: None,
        }
    }

    fn check(&self, input: &LintInput) -> Vec<Violation> {
        input
            .model
            .unreachable_stages
            .iter()
            .filter_map(|&idx| input.model.stage(idx))
            .map(|stage| {
                let line = stage
                    .instructions
                    .first()
                    .map(|ins| crate::ast::start_line(&input.parsed.source, ins))
                    .unwrap_or(1);
                Violation::new(
                    Location::point(input.file, line, 0),
                    self.metadata().code,
                    format!("stage {} is unreachable from the final stage", stage.stage_index),
                    self.metadata().default_severity,
                )
                .with_stage(stage.stage_index)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{parse, ParseResult};
    use crate::semantic;

    #[test]
    fn flags_dead_stage() {
        let content = "FROM alpine AS a\nFROM alpine AS b\nFROM alpine\nCOPY --from=a /x /x\n";
        let dockerfile = parse("Dockerfile", content).unwrap();
        let parsed = ParseResult::new("Dockerfile", &dockerfile);
        let model = semantic::build(&parsed);
        let input = LintInput { file: "Dockerfile", parsed: &parsed, model: &model };
        let violations = NoUnreachableStages.check(&input);
        assert_eq!(violations.len(), 1);
    }
}
