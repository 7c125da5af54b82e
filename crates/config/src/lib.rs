//! Configuration loading, validation, and env substitution.
//!
//! Config files: `corelink.toml`, `corelink.yaml`, `corelink.yml`, or
//! `corelink.json`. Searched in `./` then the user config directory
//! (`~/.config/corelink/` on Linux).
//!
//! Supports `${ENV_VAR}` substitution in all string values, and
//! `CORELINK_*` environment overrides applied after parsing.

pub mod env_subst;
pub mod error;
pub mod loader;
pub mod schema;
pub mod validate;

pub use {
    error::{Error, Result},
    loader::{apply_env_overrides, config_dir, find_config_file, load_config},
    schema::{BridgeConfig, CoreConfig, CorelinkConfig, PlatformConfig, ReconnectConfig},
    validate::{Diagnostic, Severity, ValidationResult, validate, validate_config, validate_str},
};
