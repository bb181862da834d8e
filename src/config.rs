//! The materialized `Config` the core consumes.
//!
//! The core never parses TOML/YAML itself — that stays an external
//! collaborator's job — but it owns the shape of the value that
//! collaborator must produce: plain builder-style structs with `Default`
//! impls, independent of whoever populates them.

use std::time::Duration;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Per-rule severity override. `Off` disables the rule entirely for a
/// file unless `options` are also present.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeverityConfig {
    Off,
    Error,
    Warning,
    Info,
    Style,
}

impl From<SeverityConfig> for crate::violation::Severity {
    fn from(value: SeverityConfig) -> Self {
        match value {
            SeverityConfig::Off => crate::violation::Severity::Off,
            SeverityConfig::Error => crate::violation::Severity::Error,
            SeverityConfig::Warning => crate::violation::Severity::Warning,
            SeverityConfig::Info => crate::violation::Severity::Info,
            SeverityConfig::Style => crate::violation::Severity::Style,
        }
    }
}

/// Global `--fix` mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FixMode {
    Off,
    Safe,
    Unsafe,
}

/// Settings scoped to one rule code.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RuleConfig {
    pub severity: Option<SeverityConfig>,
    pub enabled: Option<bool>,
    #[serde(default)]
    pub options: Option<serde_json::Value>,
    pub fix: Option<FixMode>,
    #[serde(default)]
    pub exclude: Vec<String>,
}

/// Inline-suppression-comment policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InlineDirectivesConfig {
    pub enabled: bool,
    pub warn_unused: bool,
    pub require_reason: bool,
    pub validate_rules: bool,
}

impl Default for InlineDirectivesConfig {
    fn default() -> Self {
        InlineDirectivesConfig {
            enabled: true,
            warn_unused: false,
            require_reason: false,
            validate_rules: false,
        }
    }
}

/// Async-check policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SlowChecksConfig {
    pub enabled: bool,
    #[serde(with = "duration_secs")]
    pub timeout: Duration,
    #[serde(with = "duration_secs")]
    pub request_timeout: Duration,
    pub max_concurrency: usize,
}

impl Default for SlowChecksConfig {
    fn default() -> Self {
        SlowChecksConfig {
            enabled: true,
            timeout: Duration::from_secs(20),
            request_timeout: Duration::from_secs(5),
            max_concurrency: 8,
        }
    }
}

impl From<&SlowChecksConfig> for crate::async_runtime::AsyncConfig {
    fn from(value: &SlowChecksConfig) -> Self {
        crate::async_runtime::AsyncConfig {
            enabled: value.enabled,
            max_concurrency: value.max_concurrency,
            request_timeout: value.request_timeout,
            global_timeout: value.timeout,
        }
    }
}

mod duration_secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_secs(u64::deserialize(d)?))
    }
}

/// Full configuration the core consumes. Once constructed by an external
/// loader, this value is treated as immutable for the duration of a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Keyed by full rule code (`namespace/name`). `IndexMap` preserves
    /// insertion order, which matters for config files where later
    /// sections are meant to read as overriding earlier, more general ones.
    pub rules: IndexMap<String, RuleConfig>,
    pub exclude: Vec<String>,
    pub include: Vec<String>,
    pub inline_directives: InlineDirectivesConfig,
    pub slow_checks: SlowChecksConfig,
    pub fix_mode: FixMode,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            rules: IndexMap::new(),
            exclude: Vec::new(),
            include: Vec::new(),
            inline_directives: InlineDirectivesConfig::default(),
            slow_checks: SlowChecksConfig::default(),
            fix_mode: FixMode::Off,
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rule_config(&self, code: &str) -> Option<&RuleConfig> {
        self.rules.get(code)
    }

    pub fn with_fix_mode(mut self, mode: FixMode) -> Self {
        self.fix_mode = mode;
        self
    }
}
