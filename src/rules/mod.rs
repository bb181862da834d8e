//! Rule Registry & Sync Runner.
//!
//! The rule set is closed at compile time for built-ins but open to
//! extension: external code can still box up its own `Rule` impl and
//! register it before the first `lint` call. The registry itself is a
//! process-wide, write-once `OnceLock`: initialize once, read many.

pub mod buildkit;
pub mod hadolint;
pub mod tally;

use std::sync::OnceLock;

use crate::ast::ParseResult;
use crate::async_runtime::CheckRequest;
use crate::semantic::SemanticModel;
use crate::violation::{Severity, Violation};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    BaseImage,
    Shell,
    Metadata,
    Stage,
    Security,
    Style,
}

#[derive(Debug, Clone)]
pub struct RuleMetadata {
    pub code: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub doc_url: &'static str,
    pub default_severity: Severity,
    pub category: Category,
    pub is_experimental: bool,
    pub fix_priority: Option<i32>,
}

/// Read-only view of everything a rule may consult. Rules must not mutate
/// anything reachable here; `check` takes `&self` and returns owned
/// violations instead.
pub struct LintInput<'a, 'b> {
    pub file: &'a str,
    pub parsed: &'a ParseResult<'b>,
    pub model: &'a SemanticModel<'b>,
}

/// The capability interface every rule implements. `plan_async` and
/// `schema` have default no-op implementations so a rule only needs to
/// override what it actually uses.
pub trait Rule: Send + Sync {
    fn metadata(&self) -> RuleMetadata;

    fn check(&self, input: &LintInput) -> Vec<Violation>;

    fn plan_async(&self, _input: &LintInput) -> Vec<CheckRequest> {
        Vec::new()
    }

    fn schema(&self) -> Option<serde_json::Value> {
        None
    }
}

fn builtin_rules() -> Vec<Box<dyn Rule>> {
    vec![
        Box::new(hadolint::dl3006::UntaggedBaseImage),
        Box::new(hadolint::dl3004::SudoUsage),
        Box::new(hadolint::dl4000::DeprecatedMaintainer),
        Box::new(hadolint::dl3008::AptGetUnpinnedVersion),
        Box::new(hadolint::dl3014::AptGetMissingYes),
        Box::new(hadolint::dl3020::AddInsteadOfCopy),
        Box::new(buildkit::no_unreachable_stages::NoUnreachableStages),
        Box::new(tally::package_manager_mixing::PackageManagerMixing),
        Box::new(tally::undefined_variable::UndefinedVariableReference),
        Box::new(tally::secret_in_arg::SecretInBuildArg),
        Box::new(tally::workdir_missing_before_copy::WorkdirMissingBeforeRelativeCopy),
        Box::new(tally::registry_tag_exists::RegistryTagExists),
    ]
}

static REGISTRY: OnceLock<Vec<Box<dyn Rule>>> = OnceLock::new();

/// Returns the process-wide rule registry, populating it with the
/// built-in catalog on first access. Registration order is preserved and
/// is also dispatch order.
pub fn registry() -> &'static [Box<dyn Rule>] {
    REGISTRY.get_or_init(builtin_rules)
}

pub fn find(code: &str) -> Option<&'static dyn Rule> {
    registry().iter().find(|r| r.metadata().code == code).map(|b| b.as_ref())
}

/// Dispatches every enabled rule's `check` in registration order.
/// Enablement itself is computed by the `EnableFilter` processor;
/// this runner always invokes every registered rule and lets that
/// processor drop what shouldn't have run — simpler, and equally correct
/// since every rule is required to be pure and side-effect free.
pub fn run_sync_rules(input: &LintInput) -> Vec<Violation> {
    registry().iter().flat_map(|r| r.check(input)).collect()
}

pub fn plan_async_checks(input: &LintInput) -> Vec<CheckRequest> {
    registry().iter().flat_map(|r| r.plan_async(input)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_is_populated_once_and_stable() {
        let a = registry().len();
        let b = registry().len();
        assert_eq!(a, b);
        assert!(a >= 10);
    }

    #[test]
    fn rule_codes_are_unique() {
        let codes: Vec<&str> = registry().iter().map(|r| r.metadata().code).collect();
        let mut sorted = codes.clone();
        sorted.sort();
        sorted.dedup();
        assert_eq!(codes.len(), sorted.len());
    }
}
