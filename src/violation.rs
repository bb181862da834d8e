//! The `Violation` and `SuggestedFix` data model shared by every rule,
//! the processor chain, and the fix engine.

use crate::source_map::Location;

/// Violation severity. Ordered `Error > Warning > Info > Style > Off` so
/// that supersession and sorting can compare severities directly; `Off`
/// sorts lowest since an `Off` violation should never be emitted in the
/// first place but the ordering still needs to be total.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Off,
    Style,
    Info,
    Warning,
    Error,
}

impl PartialOrd for Severity {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Severity {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.rank().cmp(&other.rank())
    }
}

impl Severity {
    fn rank(&self) -> u8 {
        match self {
            Severity::Off => 0,
            Severity::Style => 1,
            Severity::Info => 2,
            Severity::Warning => 3,
            Severity::Error => 4,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Off => "off",
            Severity::Style => "style",
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Error => "error",
        }
    }
}

/// Fix safety tier, controlling whether `--fix` mode will apply it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FixSafety {
    Safe,
    Suggestion,
    Unsafe,
}

/// A single text replacement. `start == end` is a pure insertion.
#[derive(Debug, Clone)]
pub struct TextEdit {
    pub location: Location,
    pub new_text: String,
}

/// A fix that may still need to be resolved asynchronously before its
/// edits are known (e.g. pinning a tag requires a registry probe).
#[derive(Debug, Clone)]
pub struct NeedsResolve {
    pub resolver_id: String,
    pub resolver_data: String,
}

#[derive(Debug, Clone)]
pub struct SuggestedFix {
    pub description: String,
    pub safety: FixSafety,
    /// Lower values are applied earlier and win conflicts.
    pub priority: i32,
    pub is_preferred: bool,
    pub edits: Vec<TextEdit>,
    pub needs_resolve: Option<NeedsResolve>,
}

impl SuggestedFix {
    pub fn safe(description: impl Into<String>, priority: i32, edits: Vec<TextEdit>) -> Self {
        SuggestedFix {
            description: description.into(),
            safety: FixSafety::Safe,
            priority,
            is_preferred: true,
            edits,
            needs_resolve: None,
        }
    }
}

/// A single diagnostic produced by a construction check, a rule, or an
/// async check.
#[derive(Debug, Clone)]
pub struct Violation {
    pub location: Location,
    pub rule_code: String,
    pub message: String,
    pub severity: Severity,
    pub doc_url: Option<String>,
    pub detail: Option<String>,
    pub source_code: Option<String>,
    pub suggested_fix: Option<SuggestedFix>,
    pub stage_index: Option<usize>,
}

impl Violation {
    pub fn new(
        location: Location,
        rule_code: impl Into<String>,
        message: impl Into<String>,
        severity: Severity,
    ) -> Self {
        Violation {
            location,
            rule_code: rule_code.into(),
            message: message.into(),
            severity,
            doc_url: None,
            detail: None,
            source_code: None,
            suggested_fix: None,
            stage_index: None,
        }
    }

    pub fn with_fix(mut self, fix: SuggestedFix) -> Self {
        self.suggested_fix = Some(fix);
        self
    }

    pub fn with_stage(mut self, stage_index: usize) -> Self {
        self.stage_index = Some(stage_index);
        self
    }

    pub fn with_doc_url(mut self, url: impl Into<String>) -> Self {
        self.doc_url = Some(url.into());
        self
    }

    /// Normalized dedup key: `(file, line, rule_code)`.
    pub fn dedup_key(&self) -> (String, i64, String) {
        (
            normalize_path(&self.location.file),
            self.location.start.line,
            self.rule_code.clone(),
        )
    }
}

/// Rewrites backslashes to forward slashes, matching `PathNormalization`.
pub fn normalize_path(file: &str) -> String {
    file.replace('\\', "/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severity_ordering_is_total() {
        assert!(Severity::Error > Severity::Warning);
        assert!(Severity::Warning > Severity::Info);
        assert!(Severity::Info > Severity::Style);
        assert!(Severity::Style > Severity::Off);
    }
}
