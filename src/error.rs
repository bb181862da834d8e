//! Core error taxonomy.
//!
//! Per the error handling design, the core treats almost nothing as fatal:
//! a bad directive becomes a `Warning` violation, a bad rule config disables
//! that rule for the file, an async timeout just drops pending work. The
//! handful of conditions that truly cannot produce a partial result live
//! here as typed errors.

use thiserror::Error;

/// Errors that can escape the linting pipeline itself.
///
/// Everything that *can* be expressed as a `Violation` is; this enum only
/// covers the conditions where there is no file to report violations for.
/// A Dockerfile with no `FROM` instruction still parses fine and is
/// reported as a `hadolint/DL3061` violation rather than one of these.
#[derive(Debug, Error)]
pub enum LintError {
    #[error("failed to parse {file}: {source}")]
    Parse {
        file: String,
        #[source]
        source: dockerfile_parser::Error,
    },
}

/// Errors surfaced by a `Resolver` during async checks.
#[derive(Debug, Error)]
pub enum ResolverError {
    #[error("request timed out after {0:?}")]
    Timeout(std::time::Duration),

    #[error("resolver transport error: {0}")]
    Transport(String),

    #[error("no resolver registered for id {0:?}")]
    Unregistered(String),
}
