//! `tally/undefined-variable-reference` — surfaces the `undefined_vars`
//! the semantic builder already collected per stage as ordinary
//! violations, including "did you mean" suggestions.

use crate::rules::{Category, LintInput, Rule, RuleMetadata};
use crate::source_map::Location;
use crate::violation::{Severity, Violation};

pub struct UndefinedVariableReference;

impl Rule for UndefinedVariableReference {
    fn metadata(&self) -> RuleMetadata {
        RuleMetadata {
            code: "tally/undefined-variable-reference",
            name: "undefined-variable-reference",
            description: "Referenced $VARIABLE is neither declared nor a BuildKit builtin",
            doc_url: "",
            default_severity: Severity::Warning,
            category: Category::Style,
            is_experimental: false,
            fix_priority: None,
        }
    }

    fn check(&self, input: &LintInput) -> Vec<Violation> {
        let mut out = Vec::new();
        for stage in &input.model.stages {
            for var in &stage.undefined_vars {
                let message = match &var.suggestion {
                    Some(s) => format!("${} is not defined; did you mean ${s}?", var.name),
                    None => format!("${} is not defined", var.name),
                };
                out.push(
                    Violation::new(
                        Location::point(input.file, var.line, 0),
                        self.metadata().code,
                        message,
                        self.metadata().default_severity,
                    )
                    .with_stage(stage.stage_index),
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
    fn flags_undefined_reference() {
        let content = "FROM alpine\nARG VERSION=1\nENV V=${VERSIOn}\n";
        let dockerfile = parse("Dockerfile", content).unwrap();
        let parsed = ParseResult::new("Dockerfile", &dockerfile);
        let model = semantic::build(&parsed);
        let input = LintInput { file: "Dockerfile", parsed: &parsed, model: &model };
        let violations = UndefinedVariableReference.check(&input);
        assert_eq!(violations.len(), 1);
        assert!(violations[0].message.contains("VERSION"));
    }
}
