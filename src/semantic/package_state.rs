//! Tracks which packages a stage's `RUN` lines are observed installing,
//! so cross-tool rules (e.g. "don't mix curl and wget") have something to
//! look at without re-parsing shell text themselves.

use std::collections::BTreeSet;

/// A package manager invocation recognized in a `RUN` command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum PackageManager {
    AptGet,
    Apk,
    Yum,
    Dnf,
    Pip,
}

impl PackageManager {
    fn detect(tokens: &[&str]) -> Option<(PackageManager, usize)> {
        match tokens {
            [a, b, ..] if *a == "apt-get" && *b == "install" => Some((PackageManager::AptGet, 2)),
            [a, b, ..] if *a == "apk" && *b == "add" => Some((PackageManager::Apk, 2)),
            [a, b, ..] if *a == "yum" && *b == "install" => Some((PackageManager::Yum, 2)),
            [a, b, ..] if *a == "dnf" && *b == "install" => Some((PackageManager::Dnf, 2)),
            [a, b, ..] if *a == "pip" && *b == "install" => Some((PackageManager::Pip, 2)),
            [a, b, c, ..] if *a == "pip3" && *b == "install" => {
                let _ = c;
                Some((PackageManager::Pip, 2))
            }
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct PackageState {
    installed: BTreeSet<String>,
    managers_used: BTreeSet<PackageManager>,
}

impl PackageState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn managers_used(&self) -> &BTreeSet<PackageManager> {
        &self.managers_used
    }

    pub fn has_installed(&self, name: &str) -> bool {
        self.installed.contains(name)
    }

    /// Naively shell-tokenizes a `RUN` command (whitespace split, `&&`
    /// chains already split upstream) and records any recognized
    /// package-manager install invocation.
    pub fn observe_run(&mut self, command_line: &str) {
        for segment in command_line.split("&&") {
            let tokens: Vec<&str> = segment.split_whitespace().collect();
            let Some((manager, skip)) = PackageManager::detect(&tokens) else { continue };
            self.managers_used.insert(manager);
            for tok in tokens.iter().skip(skip) {
                if tok.starts_with('-') {
                    continue;
                }
                self.installed.insert((*tok).to_string());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_apt_get_install_packages() {
        let mut state = PackageState::new();
        state.observe_run("apt-get update && apt-get install -y curl wget");
        assert!(state.has_installed("curl"));
        assert!(state.has_installed("wget"));
        assert!(state.managers_used().contains(&PackageManager::AptGet));
    }

    #[test]
    fn ignores_unrelated_commands() {
        let mut state = PackageState::new();
        state.observe_run("echo hello world");
        assert!(!state.has_installed("hello"));
    }
}
