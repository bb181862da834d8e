//! Black-box integration tests exercising the linter end to end through
//! its public API, one test per scenario class.

use std::sync::Arc;
use std::time::Duration;

use tally::async_runtime::{InMemoryResolver, Resolver};
use tally::config::{Config, FixMode};
use tally::pipeline;
use tally::violation::Severity;

#[test]
fn untagged_base_image_is_flagged() {
    let config = Config::default();
    let violations = pipeline::lint("Dockerfile", "FROM ubuntu\n", &config).unwrap();
    assert!(violations.iter().any(|v| v.rule_code == "hadolint/DL3006" && v.severity == Severity::Warning));
}

#[test]
fn duplicate_stage_name_is_flagged() {
    let config = Config::default();
    let content = "FROM ubuntu:22.04 AS build\nFROM ubuntu:22.04 AS build\n";
    let violations = pipeline::lint("Dockerfile", content, &config).unwrap();
    assert!(violations.iter().any(|v| v.rule_code == "buildkit/DuplicateStageName"));
}

#[test]
fn next_line_suppression_hides_the_single_following_violation() {
    let config = Config::default();
    let content = "# tally ignore=hadolint/DL3006\nFROM ubuntu\nFROM ubuntu\n";
    let violations = pipeline::lint("Dockerfile", content, &config).unwrap();
    let dl3006: Vec<_> = violations.iter().filter(|v| v.rule_code == "hadolint/DL3006").collect();
    assert_eq!(dl3006.len(), 1, "only the second FROM should still be flagged");
}

#[test]
fn global_suppression_warns_when_unused() {
    let mut config = Config::default();
    config.inline_directives.warn_unused = true;
    let content = "# tally global ignore=hadolint/DL3004\nFROM ubuntu:22.04\n";
    let violations = pipeline::lint("Dockerfile", content, &config).unwrap();
    assert!(violations.iter().any(|v| v.rule_code == "unused-ignore-directive"));
}

#[tokio::test]
async fn fix_priority_conflict_applies_only_the_lower_priority_edit() {
    use tally::source_map::Location;
    use tally::violation::{FixSafety, SuggestedFix, TextEdit, Violation};

    // Both edits replace the whole of line 2 ("RUN old", 7 columns wide),
    // so they overlap and only the lower-priority one should land.
    let low_priority = Violation::new(Location::point("Dockerfile", 2, 0), "test/low", "low", Severity::Warning)
        .with_fix(SuggestedFix { description: "low".into(), safety: FixSafety::Safe, priority: 95, is_preferred: true, edits: vec![TextEdit { location: Location::range("Dockerfile", tally::source_map::Position { line: 2, column: 0 }, tally::source_map::Position { line: 2, column: 7 }), new_text: "RUN low-wins".into() }], needs_resolve: None });
    let high_priority = Violation::new(Location::point("Dockerfile", 2, 0), "test/high", "high", Severity::Warning)
        .with_fix(SuggestedFix { description: "high".into(), safety: FixSafety::Safe, priority: 100, is_preferred: true, edits: vec![TextEdit { location: Location::range("Dockerfile", tally::source_map::Position { line: 2, column: 0 }, tally::source_map::Position { line: 2, column: 7 }), new_text: "RUN high-loses".into() }], needs_resolve: None });

    let mut config = Config::default();
    config.fix_mode = FixMode::Safe;
    let source = "FROM ubuntu:22.04\nRUN old\n";
    let outcome = tally::fixengine::apply_fixes(source, &[low_priority, high_priority], &config, &[]).await;

    assert_eq!(outcome.applied_count, 1);
    assert!(outcome.source.contains("RUN low-wins"));
    assert!(!outcome.source.contains("RUN high-loses"));
}

#[tokio::test]
async fn async_check_cancellation_drops_pending_work_silently() {
    let mut config = Config::default();
    config.slow_checks.timeout = Duration::from_millis(5);
    let resolver: Arc<dyn Resolver> = Arc::new(InMemoryResolver::with_delay(Duration::from_millis(500)));

    let content = "FROM example.com/library/slow-image:latest\n";
    let violations = pipeline::lint_async("Dockerfile", content, &config, &[resolver]).await.unwrap();

    assert!(!violations.iter().any(|v| v.rule_code == "tally/registry-tag-exists"));
}
