//! Rules original to this engine, not drawn from hadolint or BuildKit.

pub mod package_manager_mixing;
pub mod registry_tag_exists;
pub mod secret_in_arg;
pub mod undefined_variable;
pub mod workdir_missing_before_copy;
