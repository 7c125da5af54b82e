use std::path::{Path, PathBuf};

use {
    anyhow::{Context, Result},
    clap::Subcommand,
    corelink_config::{CorelinkConfig, Severity, ValidationResult},
    tracing::debug,
};

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Print the effective configuration with secrets redacted.
    Show,
    /// Validate the configuration file and report errors/warnings.
    Check {
        /// Show informational diagnostics in addition to errors and warnings.
        #[arg(long)]
        verbose: bool,
    },
}

pub fn handle_config(action: ConfigAction, path: Option<&Path>) -> Result<()> {
    match action {
        ConfigAction::Show => {
            let config = load_effective(path)?;
            print!("{}", render(&config)?);
            Ok(())
        },
        ConfigAction::Check { verbose } => check(path, verbose),
    }
}

/// Load the config from `path` (or the discovered file) and apply
/// `CORELINK_*` overrides. A file that exists but fails to load is an
/// error; defaults apply only when no file is found.
pub fn load_effective(path: Option<&Path>) -> Result<CorelinkConfig> {
    let found = match path {
        Some(path) => Some(path.to_path_buf()),
        None => corelink_config::find_config_file(),
    };
    let mut config = load_found(found)?;
    corelink_config::apply_env_overrides(&mut config);
    Ok(config)
}

fn load_found(found: Option<PathBuf>) -> Result<CorelinkConfig> {
    match found {
        Some(path) => {
            debug!(path = %path.display(), "loading config");
            corelink_config::load_config(&path)
                .with_context(|| format!("loading {}", path.display()))
        },
        None => {
            debug!("no config file found, using defaults");
            Ok(CorelinkConfig::default())
        },
    }
}

fn render(config: &CorelinkConfig) -> Result<String> {
    toml::to_string_pretty(&config.redacted()).context("serializing config")
}

/// ANSI color codes.
const RED: &str = "\x1b[31m";
const YELLOW: &str = "\x1b[33m";
const CYAN: &str = "\x1b[36m";
const BOLD: &str = "\x1b[1m";
const RESET: &str = "\x1b[0m";

fn check(path: Option<&Path>, verbose: bool) -> Result<()> {
    let result = corelink_config::validate(path);

    if let Some(ref path) = result.config_path {
        eprintln!("Checking {}\n", path.display());
    } else {
        eprintln!("No config file found; checking defaults.\n");
    }

    let lines = diagnostic_lines(&result, verbose);
    for line in &lines {
        eprintln!("  {line}");
    }
    if !lines.is_empty() {
        eprintln!();
    }

    let errors = result.count(Severity::Error);
    let warnings = result.count(Severity::Warning);
    if errors == 0 && warnings == 0 {
        eprintln!("No issues found.");
    } else {
        eprintln!("{errors} error(s), {warnings} warning(s)");
    }

    if errors > 0 {
        std::process::exit(1);
    }
    Ok(())
}

fn diagnostic_lines(result: &ValidationResult, verbose: bool) -> Vec<String> {
    result
        .diagnostics
        .iter()
        .filter(|d| verbose || d.severity != Severity::Info)
        .map(|d| {
            let (color, label) = match d.severity {
                Severity::Error => (RED, "error"),
                Severity::Warning => (YELLOW, "warning"),
                Severity::Info => (CYAN, "info"),
            };
            if d.path.is_empty() {
                format!("{BOLD}{color}{label}{RESET} {}", d.message)
            } else {
                format!("{BOLD}{color}{label}{RESET} {}: {}", d.path, d.message)
            }
        })
        .collect()
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {super::*, std::io::Write};

    fn write_config(ext: &str, body: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new()
            .prefix("corelink")
            .suffix(ext)
            .tempfile()
            .unwrap();
        file.write_all(body.as_bytes()).unwrap();
        file
    }

    #[test]
    fn show_redacts_tokens() {
        let file = write_config(
            ".toml",
            "[core]\ntoken = \"s3cret\"\n[platform]\naccess_token = \"p4ss\"\n",
        );
        let config = load_effective(Some(file.path())).unwrap();
        let shown = render(&config).unwrap();
        assert!(!shown.contains("s3cret"));
        assert!(!shown.contains("p4ss"));
        assert!(shown.contains("[REDACTED]"));
    }

    #[test]
    fn explicit_path_must_load() {
        let file = write_config(".toml", "[core\nurl = ");
        assert!(load_effective(Some(file.path())).is_err());
        assert!(load_effective(Some(Path::new("/nonexistent/corelink.toml"))).is_err());
    }

    #[test]
    fn broken_discovered_file_is_an_error() {
        let file = write_config(".toml", "[core\nurl = ");
        let err = load_found(Some(file.path().to_path_buf())).unwrap_err();
        assert!(err.to_string().contains("loading"));
    }

    #[test]
    fn no_file_means_defaults() {
        let config = load_found(None).unwrap();
        assert_eq!(config.core.url, CorelinkConfig::default().core.url);
    }

    #[test]
    fn info_diagnostics_need_verbose() {
        let file = write_config(
            ".toml",
            "[core]\nurl = \"ws://127.0.0.1:8765\"\n[core.reconnect]\nenabled = false\nmax_attempts = 3\n",
        );
        let result = corelink_config::validate(Some(file.path()));
        assert!(!result.has_errors());
        assert!(result.count(Severity::Info) > 0);
        assert!(diagnostic_lines(&result, false).is_empty());
        assert!(!diagnostic_lines(&result, true).is_empty());
    }

    #[test]
    fn error_lines_name_the_field() {
        let file = write_config(".toml", "[core]\nurl = \"http://example.com\"\n");
        let result = corelink_config::validate(Some(file.path()));
        assert!(result.has_errors());
        let lines = diagnostic_lines(&result, false);
        assert!(lines.iter().any(|l| l.contains("error") && l.contains("core.url")));
    }
}
