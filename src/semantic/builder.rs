//! Semantic Model Builder: the single-pass algorithm described in the
//! component design. Each numbered step below corresponds to a step in
//! that design.

use std::collections::BTreeMap;
use std::sync::OnceLock;

use dockerfile_parser::{Instruction, ShellOrExecExpr, StageParent};
use regex::Regex;

use crate::ast::{self, ParseResult};
use crate::semantic::model::{SemanticModel, ShellSetting, StageInfo, UndefinedVar};
use crate::semantic::package_state::PackageState;
use crate::semantic::scope::VariableScope;
use crate::source_map::Location;
use crate::violation::{Severity, Violation};

const RESERVED_STAGE_NAMES: &[&str] = &["scratch", "context"];

fn var_ref_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\$\{?(?P<name>[A-Za-z_][A-Za-z0-9_]*)(?P<braced>[:}]?)").expect("static regex")
    })
}

/// Builds the `SemanticModel` from a `ParseResult`. Pure function of its
/// input; never performs I/O.
pub fn build<'a>(parsed: &ParseResult<'a>) -> SemanticModel<'a> {
    let mut issues = Vec::new();

    pre_from_validation(parsed, &mut issues);

    let mut stages = Vec::new();
    let mut name_to_index: BTreeMap<String, usize> = BTreeMap::new();

    for (i, stage) in parsed.stages.iter().enumerate() {
        let filtered: Vec<&Instruction> = stage
            .instructions
            .iter()
            .copied()
            .filter(|ins| !onbuild_sanitization(parsed, ins, &mut issues))
            .collect();

        if let Some(name) = &stage.name {
            if let Some(&first_index) = name_to_index.get(name) {
                issues.push(duplicate_stage_name(parsed, stage, first_index));
            } else {
                name_to_index.insert(name.clone(), i);
            }

            if RESERVED_STAGE_NAMES.contains(&name.as_str()) {
                issues.push(reserved_stage_name(parsed, stage, name));
            }
        }

        let variables = build_variable_scope(&filtered, &stages, stage);
        let shell_setting = resolve_shell_setting(&filtered, &stages, stage);
        let mut package_state = PackageState::new();
        let mut undefined_vars = Vec::new();

        for ins in &filtered {
            collect_package_state(ins, &mut package_state);
            collect_undefined_vars(parsed, ins, &variables, &mut undefined_vars);
        }

        epilogue_checks(parsed, i, &filtered, &mut issues);

        stages.push(StageInfo {
            stage_index: i,
            instructions: filtered,
            shell_setting,
            variables,
            package_state,
            undefined_vars,
        });
    }

    let stage_graph = build_stage_graph(parsed);
    let unreachable_stages = unreachable_from_last(&stage_graph, stages.len());

    SemanticModel { stages, stage_graph, construction_issues: issues, unreachable_stages }
}

/// Step 1: any non-`ARG` instruction before the first `FROM` is a
/// construction issue; a Dockerfile with no `FROM` at all gets the same
/// code since the model then has zero stages to analyze. Unlike the
/// original design note's "inject a synthetic `FROM scratch`", the
/// borrowed third-party AST can't be mutated in place, so an absent `FROM`
/// is represented as an empty stage list plus this diagnostic rather than
/// a literal synthetic instruction.
fn pre_from_validation(parsed: &ParseResult, issues: &mut Vec<Violation>) {
    let mut from_found = false;
    let mut offender_found = false;

    for ins in &parsed.dockerfile.instructions {
        if let Instruction::From(_) = ins {
            from_found = true;
            break;
        }
        if !matches!(ins, Instruction::Arg(_)) {
            offender_found = true;
        }
    }

    if !from_found {
        issues.push(Violation::new(
            Location::file_level(&parsed.file),
            "hadolint/DL3061",
            "Dockerfile contains no FROM instruction",
            Severity::Error,
        ));
    } else if offender_found {
        let line = parsed
            .dockerfile
            .instructions
            .iter()
            .find(|ins| !matches!(ins, Instruction::Arg(_)) && !matches!(ins, Instruction::From(_)))
            .map(|ins| ast::start_line(&parsed.source, ins))
            .unwrap_or(1);
        issues.push(Violation::new(
            Location::point(&parsed.file, line, 0),
            "hadolint/DL3061",
            "instructions before the first FROM must be ARG",
            Severity::Error,
        ));
    }
}

/// Step 2: `ONBUILD ONBUILD`, `ONBUILD FROM`, `ONBUILD MAINTAINER` are
/// dropped from the instruction stream and reported. Returns `true` if
/// `ins` should be dropped.
fn onbuild_sanitization(parsed: &ParseResult, ins: &Instruction, issues: &mut Vec<Violation>) -> bool {
    let Instruction::Misc(m) = ins else { return false };
    if !m.instruction.content.eq_ignore_ascii_case("onbuild") {
        return false;
    }
    let nested = m.arguments.to_string();
    let nested_keyword = nested.split_whitespace().next().unwrap_or("").to_ascii_uppercase();
    if matches!(nested_keyword.as_str(), "ONBUILD" | "FROM" | "MAINTAINER") {
        issues.push(Violation::new(
            ast::location_of(&parsed.file, &parsed.source, ins),
            "buildkit/DL3043",
            format!("ONBUILD {nested_keyword} is not allowed as an ONBUILD trigger"),
            Severity::Error,
        ));
        true
    } else {
        false
    }
}

fn duplicate_stage_name(
    parsed: &ParseResult,
    stage: &dockerfile_parser::Stage,
    first_index: usize,
) -> Violation {
    let line = stage
        .instructions
        .first()
        .map(|ins| ast::start_line(&parsed.source, ins))
        .unwrap_or(1);
    Violation::new(
        Location::point(&parsed.file, line, 0),
        "buildkit/DuplicateStageName",
        format!(
            "stage name {:?} was already used by stage {first_index}; this stage keeps the first occurrence's alias",
            stage.name.as_deref().unwrap_or("")
        ),
        Severity::Error,
    )
    .with_stage(stage.index)
}

fn reserved_stage_name(parsed: &ParseResult, stage: &dockerfile_parser::Stage, name: &str) -> Violation {
    let line = stage
        .instructions
        .first()
        .map(|ins| ast::start_line(&parsed.source, ins))
        .unwrap_or(1);
    Violation::new(
        Location::point(&parsed.file, line, 0),
        "buildkit/ReservedStageName",
        format!("stage name {name:?} shadows a reserved BuildKit name"),
        Severity::Error,
    )
    .with_stage(stage.index)
}

/// Step 5: initializes the stage scope, inheriting `ENV` from a named
/// parent stage, then walks instructions binding `ARG`/`ENV`.
fn build_variable_scope(
    instructions: &[&Instruction],
    built_so_far: &[StageInfo],
    stage: &dockerfile_parser::Stage,
) -> VariableScope {
    let mut scope = match stage.parent {
        StageParent::Stage(parent_index) => built_so_far
            .get(parent_index)
            .map(VariableScope::inheriting_env)
            .unwrap_or_default(),
        _ => VariableScope::new(),
    };

    for ins in instructions {
        match ins {
            Instruction::Arg(arg) => {
                scope.declare_arg(arg.name.content.clone(), arg.value.as_ref().map(|v| v.to_string()));
            }
            Instruction::Env(env) => {
                for var in &env.vars {
                    scope.bind_env(var.key.content.clone(), var.value.to_string());
                }
            }
            _ => {}
        }
    }

    scope
}

/// Step 5 (continued): `SHELL [...]` overrides the active shell variant;
/// an inline `shell=` directive is handled separately by the directive
/// parser and merged in by the caller if present.
fn resolve_shell_setting(
    instructions: &[&Instruction],
    built_so_far: &[StageInfo],
    stage: &dockerfile_parser::Stage,
) -> ShellSetting {
    let inherited = match stage.parent {
        StageParent::Stage(parent_index) => built_so_far
            .get(parent_index)
            .map(|s| s.shell_setting.clone())
            .unwrap_or_default(),
        _ => ShellSetting::default(),
    };

    instructions
        .iter()
        .filter_map(|ins| match ins {
            Instruction::Misc(m) if m.instruction.content.eq_ignore_ascii_case("shell") => {
                let args = m.arguments.to_string();
                let first = args
                    .trim_start_matches('[')
                    .split(',')
                    .next()
                    .unwrap_or("")
                    .trim()
                    .trim_matches('"')
                    .to_string();
                Some(ShellSetting::from_identifier(&first))
            }
            _ => None,
        })
        .last()
        .unwrap_or(inherited)
}

/// Step 7.
fn collect_package_state(ins: &Instruction, package_state: &mut PackageState) {
    if let Instruction::Run(run) = ins {
        let command_str = match &run.expr {
            ShellOrExecExpr::Shell(s) => s.to_string(),
            ShellOrExecExpr::Exec(arr) => arr.as_str_vec().join(" "),
        };
        package_state.observe_run(&command_str);
    }
}

/// Step 6: expands `$NAME` / `${NAME}` references in instructions that
/// carry user-facing text, recording any that resolve to neither a scope
/// binding nor a BuildKit builtin.
fn collect_undefined_vars(
    parsed: &ParseResult,
    ins: &Instruction,
    scope: &VariableScope,
    out: &mut Vec<UndefinedVar>,
) {
    let expandable = matches!(
        ins,
        Instruction::Copy(_) | Instruction::Env(_) | Instruction::Label(_) | Instruction::Run(_)
    ) || matches!(ins, Instruction::Misc(m) if matches!(
        m.instruction.content.to_ascii_uppercase().as_str(),
        "ADD" | "EXPOSE" | "USER" | "WORKDIR"
    ));
    if !expandable {
        return;
    }

    let content = parsed.dockerfile.content.as_str();
    let text = ast::raw_text(content, ins);
    let line = ast::start_line(&parsed.source, ins);

    for caps in var_ref_regex().captures_iter(text) {
        let name = &caps["name"];
        if scope.is_known(name) {
            continue;
        }
        let suggestion = scope
            .known_names()
            .into_iter()
            .map(|candidate| (edit_distance(&candidate, name), candidate))
            .filter(|(d, _)| *d <= 2)
            .min_by_key(|(d, _)| *d)
            .map(|(_, name)| name);
        out.push(UndefinedVar { name: name.to_string(), line, suggestion });
    }
}

/// Step 8: at most one `CMD`/`ENTRYPOINT`/`HEALTHCHECK` per stage, and the
/// canonical relative epilogue order `STOPSIGNAL < HEALTHCHECK <
/// ENTRYPOINT < CMD` (ONBUILD excluded from the order check).
fn epilogue_checks(parsed: &ParseResult, stage_index: usize, instructions: &[&Instruction], issues: &mut Vec<Violation>) {
    let mut seen: BTreeMap<&'static str, usize> = BTreeMap::new();
    let mut order_seen: Vec<(&'static str, i64)> = Vec::new();

    for ins in instructions {
        let kind = match ins {
            Instruction::Cmd(_) => Some("CMD"),
            Instruction::Entrypoint(_) => Some("ENTRYPOINT"),
            Instruction::Misc(m) => match m.instruction.content.to_ascii_uppercase().as_str() {
                "HEALTHCHECK" => Some("HEALTHCHECK"),
                "STOPSIGNAL" => Some("STOPSIGNAL"),
                "ONBUILD" => None,
                _ => None,
            },
            _ => None,
        };
        let Some(kind) = kind else { continue };

        *seen.entry(kind).or_insert(0) += 1;
        order_seen.push((kind, ast::start_line(&parsed.source, ins)));
    }

    for (kind, count) in &seen {
        if *count > 1 {
            issues.push(
                Violation::new(
                    Location::file_level(&parsed.file),
                    "buildkit/MultipleInstructionsDisallowed",
                    format!("stage has {count} {kind} instructions; only one is allowed"),
                    Severity::Error,
                )
                .with_stage(stage_index),
            );
        }
    }

    let rank = |k: &str| match k {
        "STOPSIGNAL" => 0,
        "HEALTHCHECK" => 1,
        "ENTRYPOINT" => 2,
        "CMD" => 3,
        _ => 4,
    };
    for window in order_seen.windows(2) {
        let (prev_kind, _) = window[0];
        let (next_kind, next_line) = window[1];
        if rank(prev_kind) > rank(next_kind) {
            issues.push(
                Violation::new(
                    Location::point(&parsed.file, next_line, 0),
                    "buildkit/InstructionOrder",
                    format!("{next_kind} should not follow {prev_kind} in a stage's epilogue"),
                    Severity::Warning,
                )
                .with_stage(stage_index),
            );
        }
    }
}

/// Step 9: edges for `FROM <stage>` (already modeled by `Stage::parent`)
/// and `COPY --from=<stage>`.
fn build_stage_graph(parsed: &ParseResult) -> Vec<Vec<usize>> {
    let stages = &parsed.stages;
    let mut graph = vec![Vec::new(); stages.stages.len()];
    let content = parsed.dockerfile.content.as_str();

    for stage in stages.iter() {
        if let StageParent::Stage(parent_index) = stage.parent {
            graph[stage.index].push(parent_index);
        }
        for ins in &stage.instructions {
            if let Instruction::Copy(_) = ins {
                let text = ast::raw_text(content, ins);
                if let Some(from) = copy_from_target(text) {
                    if let Some(target) = stages.get(&from) {
                        graph[stage.index].push(target.index);
                    }
                }
            }
        }
    }

    graph
}

fn copy_from_target(text: &str) -> Option<String> {
    copy_from_regex()
        .captures(text)
        .and_then(|caps| caps.name("from"))
        .map(|m| m.as_str().trim_matches('"').to_string())
}

fn copy_from_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"--from=(?P<from>\S+)").expect("static regex"))
}

fn unreachable_from_last(graph: &[Vec<usize>], stage_count: usize) -> Vec<usize> {
    if stage_count == 0 {
        return Vec::new();
    }
    let last = stage_count - 1;
    let mut reachable = vec![false; stage_count];
    let mut stack = vec![last];
    reachable[last] = true;
    while let Some(node) = stack.pop() {
        for &next in &graph[node] {
            if !reachable[next] {
                reachable[next] = true;
                stack.push(next);
            }
        }
    }
    (0..stage_count).filter(|&i| !reachable[i]).collect()
}

fn edit_distance(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let mut dp = vec![vec![0usize; b.len() + 1]; a.len() + 1];
    for (i, row) in dp.iter_mut().enumerate() {
        row[0] = i;
    }
    for j in 0..=b.len() {
        dp[0][j] = j;
    }
    for i in 1..=a.len() {
        for j in 1..=b.len() {
            let cost = if a[i - 1] == b[j - 1] { 0 } else { 1 };
            dp[i][j] = (dp[i - 1][j] + 1).min(dp[i][j - 1] + 1).min(dp[i - 1][j - 1] + cost);
        }
    }
    dp[a.len()][b.len()]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::parse;

    #[test]
    fn duplicate_stage_name_detected() {
        let content = "FROM alpine AS builder\nFROM alpine AS builder\n";
        let dockerfile = parse("Dockerfile", content).unwrap();
        let parsed = ParseResult::new("Dockerfile", &dockerfile);
        let model = build(&parsed);
        assert!(model
            .construction_issues
            .iter()
            .any(|v| v.rule_code == "buildkit/DuplicateStageName"));
    }

    #[test]
    fn no_from_is_reported() {
        let content = "RUN echo hi\n";
        let dockerfile = parse("Dockerfile", content).unwrap();
        let parsed = ParseResult::new("Dockerfile", &dockerfile);
        let model = build(&parsed);
        assert!(model.construction_issues.iter().any(|v| v.rule_code == "hadolint/DL3061"));
        assert!(model.stages.is_empty());
    }

    #[test]
    fn reachability_flags_dead_stage() {
        let content = "FROM alpine AS a\nFROM alpine AS b\nFROM alpine\nCOPY --from=a /x /x\n";
        let dockerfile = parse("Dockerfile", content).unwrap();
        let parsed = ParseResult::new("Dockerfile", &dockerfile);
        let model = build(&parsed);
        assert!(model.unreachable_stages.contains(&1));
    }

    #[test]
    fn undefined_variable_is_flagged_with_suggestion() {
        let content = "FROM alpine\nARG VERSION=1\nENV V=${VERSIOn}\n";
        let dockerfile = parse("Dockerfile", content).unwrap();
        let parsed = ParseResult::new("Dockerfile", &dockerfile);
        let model = build(&parsed);
        let undef = &model.stages[0].undefined_vars;
        assert!(undef.iter().any(|u| u.name == "VERSIOn" && u.suggestion.as_deref() == Some("VERSION")));
    }
}
