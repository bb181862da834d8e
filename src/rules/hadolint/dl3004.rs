//! `hadolint/DL3004` — do not use `sudo`, since it leads to unpredictable
//! behavior; use a tool like `gosu` or `su-exec` instead.

use dockerfile_parser::{Instruction, ShellOrExecExpr};

use crate::ast;
use crate::rules::{Category, LintInput, Rule, RuleMetadata};
use crate::violation::{Severity, Violation};

pub struct SudoUsage;

impl Rule for SudoUsage {
    fn metadata(&self) -> RuleMetadata {
        RuleMetadata {
            code: "hadolint/DL3004",
            name: "no-sudo",
            description: "Do not use sudo, as it leads to unpredictable behavior",
            doc_url: "https://github.com/hadolint/hadolint/wiki/DL3004",
            default_severity: Severity::Error,
            category: Category::Security,
            is_experimental: false,
            fix_priority: None,
        }
    }

    fn check(&self, input: &LintInput) -> Vec<Violation> {
        let mut out = Vec::new();
        for stage in &input.model.stages {
            for ins in &stage.instructions {
                let Instruction::Run(run) = ins else { continue };
                let text = match &run.expr {
                    ShellOrExecExpr::Shell(s) => s.to_string(),
                    ShellOrExecExpr::Exec(arr) => arr.as_str_vec().join(" "),
                };
                if text.split_whitespace().any(|tok| tok.trim_matches('"') == "sudo") {
                    out.push(
                        Violation::new(
                            ast::location_of(input.file, &input.parsed.source, ins),
                            self.metadata().code,
                            "avoid sudo; switch users with USER or gosu/su-exec instead",
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{parse, ParseResult};
    use crate::semantic;

    #[test]
    fn flags_sudo_in_run() {
        let content = "FROM ubuntu:22.04\nRUN sudo apt-get update\n";
        let dockerfile = parse("Dockerfile", content).unwrap();
        let parsed = ParseResult::new("Dockerfile", &dockerfile);
        let model = semantic::build(&parsed);
        let input = LintInput { file: "Dockerfile", parsed: &parsed, model: &model };
        assert_eq!(SudoUsage.check(&input).len(), 1);
    }
}
