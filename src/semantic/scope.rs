//! Per-stage variable scope: `ARG` declarations and `ENV` bindings.

use std::collections::BTreeMap;

/// BuildKit's predefined platform variables, always considered defined.
pub const BUILTIN_VARS: &[&str] = &[
    "BUILDPLATFORM",
    "BUILDOS",
    "BUILDARCH",
    "BUILDVARIANT",
    "TARGETPLATFORM",
    "TARGETOS",
    "TARGETARCH",
    "TARGETVARIANT",
];

#[derive(Debug, Clone)]
pub struct VariableScope {
    /// Declared `ARG` names with their optional default value.
    args: BTreeMap<String, Option<String>>,
    /// Bound `ENV` values.
    envs: BTreeMap<String, String>,
}

impl VariableScope {
    pub fn new() -> Self {
        VariableScope { args: BTreeMap::new(), envs: BTreeMap::new() }
    }

    /// A scope inheriting a parent stage's `ENV` bindings, used when this
    /// stage's `FROM` names a prior stage. `ARG`s are never inherited —
    /// they must be redeclared to come back into scope.
    pub fn inheriting_env(parent: &VariableScope) -> Self {
        VariableScope { args: BTreeMap::new(), envs: parent.envs.clone() }
    }

    pub fn declare_arg(&mut self, name: impl Into<String>, default: Option<String>) {
        self.args.insert(name.into(), default);
    }

    pub fn bind_env(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.envs.insert(name.into(), value.into());
    }

    pub fn has_arg(&self, name: &str) -> bool {
        self.args.contains_key(name)
    }

    pub fn get_env(&self, name: &str) -> Option<&str> {
        self.envs.get(name).map(|s| s.as_str())
    }

    pub fn is_known(&self, name: &str) -> bool {
        self.has_arg(name) || self.envs.contains_key(name) || BUILTIN_VARS.contains(&name)
    }

    /// All names this scope currently knows about, for edit-distance
    /// "did you mean" suggestions.
    pub fn known_names(&self) -> Vec<String> {
        let mut v: Vec<String> = self.args.keys().cloned().collect();
        v.extend(self.envs.keys().cloned());
        v.extend(BUILTIN_VARS.iter().map(|s| s.to_string()));
        v
    }
}

impl Default for VariableScope {
    fn default() -> Self {
        Self::new()
    }
}
