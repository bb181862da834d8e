//! Builds the `SemanticModel` from a parsed Dockerfile.

pub mod builder;
pub mod model;
pub mod package_state;
pub mod scope;

pub use builder::build;
pub use model::{SemanticModel, ShellSetting, StageInfo, UndefinedVar};
