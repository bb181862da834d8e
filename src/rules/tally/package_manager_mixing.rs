//! `tally/package-manager-mixing` — using more than one Linux distro
//! package manager in a single stage is almost always an accident (base
//! image changed, a copy-pasted `RUN` line survived).

use crate::rules::{Category, LintInput, Rule, RuleMetadata};
use crate::source_map::Location;
use crate::violation::{Severity, Violation};

pub struct PackageManagerMixing;

impl Rule for PackageManagerMixing {
    fn metadata(&self) -> RuleMetadata {
        RuleMetadata {
            code: "tally/package-manager-mixing",
            name: "package-manager-mixing",
            description: "More than one package manager is used to install packages in one stage",
            doc_url: "",
            default_severity: Severity::Warning,
            category: Category::Style,
            is_experimental: false,
            fix_priority: None,
        }
    }

    fn check(&self, input: &LintInput) -> Vec<Violation> {
        input
            .model
            .stages
            .iter()
            .filter(|stage| stage.package_state.managers_used().len() > 1)
            .map(|stage| {
                let managers: Vec<String> =
                    stage.package_state.managers_used().iter().map(|m| format!("{m:?}")).collect();
                Violation::new(
                    Location::file_level(input.file),
                    self.metadata().code,
                    format!("stage mixes package managers: {}", managers.join(", ")),
                    self.metadata().default_severity,
                )
                .with_stage(stage.stage_index)
            })
            .collect()
    }
}
