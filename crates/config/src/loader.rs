use std::path::{Path, PathBuf};

use {secrecy::Secret, tracing::debug};

use crate::{
    env_subst::substitute_env,
    error::{Error, Result},
    schema::CorelinkConfig,
};

/// Standard config file names, checked in order.
const CONFIG_FILENAMES: &[&str] = &[
    "corelink.toml",
    "corelink.yaml",
    "corelink.yml",
    "corelink.json",
];

pub const ENV_CORE_URL: &str = "CORELINK_CORE_URL";
pub const ENV_CORE_TOKEN: &str = "CORELINK_CORE_TOKEN";
pub const ENV_PLATFORM_URL: &str = "CORELINK_PLATFORM_URL";

/// Load config from the given path (any supported format).
pub fn load_config(path: &Path) -> Result<CorelinkConfig> {
    let raw = std::fs::read_to_string(path).map_err(|source| Error::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let raw = substitute_env(&raw);
    parse_config(&raw, path)
}

/// Find the first config file in standard locations.
///
/// Search order:
/// 1. `./corelink.{toml,yaml,yml,json}` (project-local)
/// 2. `<user config dir>/corelink.{toml,yaml,yml,json}`
pub fn find_config_file() -> Option<PathBuf> {
    let mut dirs = vec![PathBuf::from(".")];
    dirs.extend(config_dir());
    find_config_in(&dirs)
}

fn find_config_in(dirs: &[PathBuf]) -> Option<PathBuf> {
    dirs.iter()
        .flat_map(|dir| CONFIG_FILENAMES.iter().map(move |name| dir.join(name)))
        .find(|path| path.exists())
}

/// Returns the user-global config directory.
pub fn config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "corelink").map(|d| d.config_dir().to_path_buf())
}

/// Apply `CORELINK_*` environment overrides on top of a loaded config.
pub fn apply_env_overrides(config: &mut CorelinkConfig) {
    apply_env_overrides_with(config, |name| std::env::var(name).ok());
}

pub(crate) fn apply_env_overrides_with(
    config: &mut CorelinkConfig,
    lookup: impl Fn(&str) -> Option<String>,
) {
    if let Some(url) = lookup(ENV_CORE_URL) {
        debug!(var = ENV_CORE_URL, "overriding core.url from environment");
        config.core.url = url;
    }
    if let Some(token) = lookup(ENV_CORE_TOKEN) {
        debug!(var = ENV_CORE_TOKEN, "overriding core.token from environment");
        config.core.token = Secret::new(token);
    }
    if let Some(url) = lookup(ENV_PLATFORM_URL) {
        debug!(var = ENV_PLATFORM_URL, "overriding platform.url from environment");
        config.platform.url = url;
    }
}

pub(crate) fn config_format(path: &Path) -> &str {
    path.extension().and_then(|e| e.to_str()).unwrap_or("toml")
}

fn parse_config(raw: &str, path: &Path) -> Result<CorelinkConfig> {
    match config_format(path) {
        "toml" => toml::from_str(raw).map_err(|e| Error::parse(path, e)),
        "yaml" | "yml" => serde_yaml::from_str(raw).map_err(|e| Error::parse(path, e)),
        "json" => serde_json::from_str(raw).map_err(|e| Error::parse(path, e)),
        ext => Err(Error::UnsupportedFormat {
            extension: ext.to_string(),
        }),
    }
}

/// Parse raw text into a generic JSON tree, used by validation to look
/// for unknown keys.
pub(crate) fn parse_config_value(
    raw: &str,
    format: &str,
) -> std::result::Result<serde_json::Value, String> {
    match format {
        "toml" => {
            let v: toml::Value = toml::from_str(raw).map_err(|e| e.to_string())?;
            serde_json::to_value(v).map_err(|e| e.to_string())
        },
        "yaml" | "yml" => {
            let v: serde_yaml::Value = serde_yaml::from_str(raw).map_err(|e| e.to_string())?;
            serde_json::to_value(v).map_err(|e| e.to_string())
        },
        "json" => serde_json::from_str(raw).map_err(|e| e.to_string()),
        other => Err(format!("unsupported config format: .{other}")),
    }
}
