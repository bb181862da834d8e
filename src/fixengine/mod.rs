//! Fix Engine: turns a diagnostic list's `suggested_fix`es into a
//! rewritten source buffer. Eligibility, priority-ordered conflict
//! resolution, and application are each their own pass so the merge logic
//! can be unit-tested without touching a real `SourceMap`.

use std::sync::Arc;

use crate::async_runtime::{CheckHandler, CheckRequest, Resolver, ResolvedValue};
use crate::config::{Config, FixMode};
use crate::violation::{FixSafety, SuggestedFix, TextEdit, Violation};

/// Fix resolution never turns a probe result into a violation itself — it
/// only needs the resolved value — so this handler has nothing to do.
struct NoopHandler;

impl CheckHandler for NoopHandler {
    fn on_success(&self, _request: &CheckRequest, _value: &ResolvedValue) -> Vec<Violation> {
        Vec::new()
    }
}

/// Result of a fix run: the rewritten source and how many fixes landed.
pub struct FixOutcome {
    pub source: String,
    pub applied_count: usize,
}

fn safety_allowed(safety: FixSafety, mode: FixMode) -> bool {
    match mode {
        FixMode::Off => false,
        FixMode::Safe => safety == FixSafety::Safe,
        FixMode::Unsafe => true,
    }
}

fn rule_fix_mode(config: &Config, rule_code: &str) -> FixMode {
    config.rule_config(rule_code).and_then(|rc| rc.fix).unwrap_or(config.fix_mode)
}

/// A fix still pending eligibility-filtering, carrying its originating
/// violation's index so merge tie-breaks can use source order.
struct Candidate<'a> {
    source_index: usize,
    fix: &'a SuggestedFix,
}

fn eligible_candidates<'a>(violations: &'a [Violation], config: &Config) -> Vec<Candidate<'a>> {
    violations
        .iter()
        .enumerate()
        .filter_map(|(i, v)| {
            let fix = v.suggested_fix.as_ref()?;
            if fix.edits.is_empty() {
                return None;
            }
            let mode = rule_fix_mode(config, &v.rule_code);
            if !safety_allowed(fix.safety, mode) {
                return None;
            }
            Some(Candidate { source_index: i, fix })
        })
        .collect()
}

/// Resolves every eligible fix's `needs_resolve` edits, dropping any fix
/// whose resolver is missing, errors, or returns a value the fix can't use
/// — a resolver failure just means the fix no longer applies, not that
/// linting failed.
///
/// The only resolved shape fixes currently understand is `Digest`: it gets
/// appended to the edit's replacement text as `@sha256:...`, pinning the
/// image reference to a content digest rather than a guessed tag.
async fn resolve_pending(
    candidates: Vec<Candidate<'_>>,
    resolvers: &[Arc<dyn Resolver>],
) -> Vec<(usize, Vec<TextEdit>, i32)> {
    let mut out = Vec::with_capacity(candidates.len());
    for c in candidates {
        let Some(needs) = c.fix.needs_resolve.as_ref() else {
            out.push((c.source_index, c.fix.edits.clone(), c.fix.priority));
            continue;
        };
        let Some(resolver) = resolvers.iter().find(|r| r.resolver_id() == needs.resolver_id) else {
            continue;
        };
        let request = CheckRequest {
            rule_code: String::new(),
            category: "pin-digest".to_string(),
            dedup_key: needs.resolver_data.clone(),
            resolver_id: needs.resolver_id.clone(),
            opaque_data: needs.resolver_data.clone(),
            file: String::new(),
            stage_index: None,
            handler: Arc::new(NoopHandler),
        };
        let Ok(ResolvedValue::Digest(digest)) = resolver.resolve(&request).await else {
            continue;
        };
        let edits = c
            .fix
            .edits
            .iter()
            .cloned()
            .map(|mut edit| {
                edit.new_text = format!("{}@{digest}", edit.new_text);
                edit
            })
            .collect();
        out.push((c.source_index, edits, c.fix.priority));
    }
    out
}

fn overlaps(a: &TextEdit, b: &TextEdit) -> bool {
    let (a_start, a_end) = edit_bounds(a);
    let (b_start, b_end) = edit_bounds(b);
    a_start <= b_end && b_start <= a_end
}

fn edit_bounds(edit: &TextEdit) -> (i64, i64) {
    (edit.location.start.line, edit.location.end.line)
}

/// Greedy priority-ascending merge: walk candidates in
/// `(priority, source_index)` order, accepting a fix only if none of its
/// edits overlap an already-accepted edit; multi-edit fixes are all-or-none.
fn merge(mut candidates: Vec<(usize, Vec<TextEdit>, i32)>) -> Vec<TextEdit> {
    candidates.sort_by(|a, b| a.2.cmp(&b.2).then(a.0.cmp(&b.0)));

    let mut accepted: Vec<TextEdit> = Vec::new();
    for (_, edits, _) in candidates {
        let conflicts = edits.iter().any(|e| accepted.iter().any(|a| overlaps(e, a)));
        if !conflicts {
            accepted.extend(edits);
        }
    }
    accepted
}

/// Splices accepted edits into `source` by byte offset, applying from the
/// highest offset to the lowest so earlier offsets stay valid as later
/// ones are consumed. Respects each edit's exact `Location` span rather
/// than the whole line it falls on, so point insertions and partial-line
/// replacements land correctly.
fn apply_edits(source: &str, edits: Vec<TextEdit>) -> String {
    let source_map = crate::source_map::SourceMap::new(source);

    let mut spans: Vec<(usize, usize, String)> = edits
        .into_iter()
        .map(|edit| {
            let start = source_map.offset_for_position(edit.location.start);
            let end = source_map.offset_for_position(edit.location.end);
            (start, end, edit.new_text)
        })
        .collect();
    spans.sort_by(|a, b| b.0.cmp(&a.0));

    let mut out = source.to_string();
    for (start, end, new_text) in spans {
        let (start, end) = (start.min(out.len()), end.min(out.len()));
        if start > end {
            continue;
        }
        out.replace_range(start..end, &new_text);
    }
    out
}

/// Runs the full fix pipeline: eligibility, resolution, merge, and apply.
/// `violations` should be the processor chain's output so superseded and
/// deduplicated diagnostics never contribute a fix.
pub async fn apply_fixes(source: &str, violations: &[Violation], config: &Config, resolvers: &[Arc<dyn Resolver>]) -> FixOutcome {
    if config.fix_mode == FixMode::Off {
        return FixOutcome { source: source.to_string(), applied_count: 0 };
    }

    let candidates = eligible_candidates(violations, config);
    let resolved = resolve_pending(candidates, resolvers).await;
    let accepted = merge(resolved);
    let applied_count = accepted.len();
    let fixed = apply_edits(source, accepted);

    FixOutcome { source: fixed, applied_count }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source_map::{Location, Position};
    use crate::violation::Severity;

    /// Builds a whole-line replacement edit: column 0 through the line's
    /// end column, excluding the trailing newline — the same span shape
    /// `ast::location_of` produces for a single-line instruction.
    fn edit(line: i64, end_column: usize, text: &str) -> TextEdit {
        TextEdit {
            location: Location::range("Dockerfile", Position { line, column: 0 }, Position { line, column: end_column }),
            new_text: text.to_string(),
        }
    }

    fn violation_with_fix(code: &str, line: i64, end_column: usize, priority: i32, safety: FixSafety, text: &str) -> Violation {
        Violation::new(Location::point("Dockerfile", line, 0), code, "msg", Severity::Warning).with_fix(SuggestedFix {
            description: "fix".into(),
            safety,
            priority,
            is_preferred: true,
            edits: vec![edit(line, end_column, text)],
            needs_resolve: None,
        })
    }

    #[tokio::test]
    async fn safe_mode_skips_unsafe_fixes() {
        let v = violation_with_fix("a/x", 2, 7, 100, FixSafety::Unsafe, "RUN fixed");
        let config = Config::new().with_fix_mode(FixMode::Safe);
        let outcome = apply_fixes("FROM a\nRUN old\n", &[v], &config, &[]).await;
        assert_eq!(outcome.applied_count, 0);
        assert!(outcome.source.contains("RUN old"));
    }

    #[tokio::test]
    async fn lower_priority_wins_on_overlap() {
        let low = violation_with_fix("a/low", 2, 7, 95, FixSafety::Safe, "RUN low");
        let high = violation_with_fix("a/high", 2, 7, 100, FixSafety::Safe, "RUN high");
        let config = Config::new().with_fix_mode(FixMode::Unsafe);
        let outcome = apply_fixes("FROM a\nRUN old\n", &[low, high], &config, &[]).await;
        assert_eq!(outcome.applied_count, 1);
        assert!(outcome.source.contains("RUN low"));
        assert!(!outcome.source.contains("RUN high"));
    }

    #[tokio::test]
    async fn non_overlapping_fixes_both_apply() {
        let a = violation_with_fix("a/a", 1, 6, 50, FixSafety::Safe, "FROM b");
        let b = violation_with_fix("a/b", 2, 7, 50, FixSafety::Safe, "RUN new");
        let config = Config::new().with_fix_mode(FixMode::Safe);
        let outcome = apply_fixes("FROM a\nRUN old\n", &[a, b], &config, &[]).await;
        assert_eq!(outcome.applied_count, 2);
        assert!(outcome.source.contains("FROM b"));
        assert!(outcome.source.contains("RUN new"));
    }

    #[tokio::test]
    async fn point_insertion_preserves_rest_of_line() {
        let insert_at = "RUN apt-get install".len();
        let v = Violation::new(Location::point("Dockerfile", 2, insert_at), "a/y", "msg", Severity::Warning).with_fix(
            SuggestedFix {
                description: "fix".into(),
                safety: FixSafety::Safe,
                priority: 90,
                is_preferred: true,
                edits: vec![TextEdit {
                    location: Location::range(
                        "Dockerfile",
                        Position { line: 2, column: insert_at },
                        Position { line: 2, column: insert_at },
                    ),
                    new_text: " -y".to_string(),
                }],
                needs_resolve: None,
            },
        );
        let config = Config::new().with_fix_mode(FixMode::Safe);
        let outcome = apply_fixes("FROM a\nRUN apt-get install curl\n", &[v], &config, &[]).await;
        assert_eq!(outcome.applied_count, 1);
        assert!(outcome.source.contains("RUN apt-get install -y curl"));
    }
}
