//! `tally/secret-in-build-arg` — a baked-in `ARG`/`ENV` default whose name
//! looks like a credential is permanently readable from the image layers.

use dockerfile_parser::Instruction;

use crate::ast;
use crate::rules::{Category, LintInput, Rule, RuleMetadata};
use crate::violation::{Severity, Violation};

pub struct SecretInBuildArg;

const SUSPICIOUS_NAME_FRAGMENTS: &[&str] =
    &["password", "secret", "token", "api_key", "apikey", "private_key", "access_key"];

fn looks_like_secret(name: &str) -> bool {
    let lower = name.to_ascii_lowercase();
    SUSPICIOUS_NAME_FRAGMENTS.iter().any(|frag| lower.contains(frag))
}

impl Rule for SecretInBuildArg {
    fn metadata(&self) -> RuleMetadata {
        RuleMetadata {
            code: "tally/secret-in-build-arg",
            name: "secret-in-build-arg",
            description: "ARG/ENV name looks like a credential and will be baked into image layers",
            doc_url: "",
            default_severity: Severity::Warning,
            category: Category::Security,
            is_experimental: false,
            fix_priority: None,
        }
    }

    fn check(&self, input: &LintInput) -> Vec<Violation> {
        let mut out = Vec::new();
        for stage in &input.model.stages {
            for ins in &stage.instructions {
                let name = match ins {
                    Instruction::Arg(a) if a.value.is_some() => Some(a.name.content.clone()),
                    Instruction::Env(e) => e.vars.first().map(|v| v.key.content.clone()),
                    _ => None,
                };
                let Some(name) = name else { continue };
                if !looks_like_secret(&name) {
                    continue;
                }
                out.push(
                    Violation::new(
                        ast::location_of(input.file, &input.parsed.source, ins),
                        self.metadata().code,
                        format!("{name} looks like a secret; pass it at runtime instead of baking it into the image"),
                        self.metadata().default_severity,
                    )
                    .with_stage(stage.stage_index),
                );
            }
        }
        out
    }
}
