//! The `SemanticModel`: what the builder produces and every rule consumes.

use dockerfile_parser::Instruction;

use crate::semantic::package_state::PackageState;
use crate::semantic::scope::VariableScope;
use crate::violation::Violation;

/// Active `SHELL` variant for a stage; affects only informational checks
/// since the core never executes shell text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellSetting {
    Bash,
    Sh,
    Dash,
    PowerShell,
    Other(String),
}

impl Default for ShellSetting {
    fn default() -> Self {
        ShellSetting::Bash
    }
}

impl ShellSetting {
    pub fn from_identifier(s: &str) -> Self {
        match s.to_ascii_lowercase().as_str() {
            "bash" => ShellSetting::Bash,
            "sh" => ShellSetting::Sh,
            "dash" => ShellSetting::Dash,
            "powershell" | "pwsh" => ShellSetting::PowerShell,
            other => ShellSetting::Other(other.to_string()),
        }
    }
}

/// A `$NAME` reference with no declaration in scope.
#[derive(Debug, Clone)]
pub struct UndefinedVar {
    pub name: String,
    pub line: i64,
    pub suggestion: Option<String>,
}

/// Per-stage derived state: its variable scope, shell setting, installed
/// packages, and any undefined variable references found in it.
pub struct StageInfo<'a> {
    pub stage_index: usize,
    pub instructions: Vec<&'a Instruction>,
    pub shell_setting: ShellSetting,
    pub variables: VariableScope,
    pub package_state: PackageState,
    pub undefined_vars: Vec<UndefinedVar>,
}

/// The complete semantic view of one Dockerfile: per-stage info, the
/// inter-stage dependency graph, and diagnostics produced purely from
/// building the model (independent of any rule).
pub struct SemanticModel<'a> {
    pub stages: Vec<StageInfo<'a>>,
    /// Adjacency list: `stage_graph[a]` contains `b` for every edge `a -> b`
    /// ("`a` depends on `b`"), via `FROM <stage>` or `COPY --from=<stage>`.
    pub stage_graph: Vec<Vec<usize>>,
    pub construction_issues: Vec<Violation>,
    /// Stages unreachable from the final stage (dead build stages).
    pub unreachable_stages: Vec<usize>,
}

impl<'a> SemanticModel<'a> {
    pub fn stage(&self, index: usize) -> Option<&StageInfo<'a>> {
        self.stages.get(index)
    }
}
