//! Configuration validation.
//!
//! Reports syntax errors, unknown or misspelled keys, type errors, and
//! semantic problems (unusable URLs, reconnect settings that spin).

use std::path::{Path, PathBuf};

use {secrecy::ExposeSecret, serde_json::Value};

use crate::{
    env_subst::substitute_env,
    loader::{config_format, find_config_file, parse_config_value},
    schema::CorelinkConfig,
};

/// Severity level for a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Error,
    Warning,
    Info,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Error => write!(f, "error"),
            Self::Warning => write!(f, "warning"),
            Self::Info => write!(f, "info"),
        }
    }
}

/// A single validation diagnostic.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub severity: Severity,
    /// Category: "syntax", "unknown-field", "type-error", "url",
    /// "reconnect", "security", "file-ref"
    pub category: &'static str,
    /// Dotted path, e.g. "core.reconnect.interval_ms"
    pub path: String,
    pub message: String,
}

impl Diagnostic {
    fn new(
        severity: Severity,
        category: &'static str,
        path: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            severity,
            category,
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Result of validating a configuration.
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    pub diagnostics: Vec<Diagnostic>,
    pub config_path: Option<PathBuf>,
}

impl ValidationResult {
    /// Returns `true` if any diagnostic is an error.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.severity == Severity::Error)
    }

    /// Count diagnostics by severity.
    #[must_use]
    pub fn count(&self, severity: Severity) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == severity)
            .count()
    }
}

// ── Known keys ──────────────────────────────────────────────────────────────

const TOP_LEVEL_KEYS: &[&str] = &["core", "platform", "bridge"];

/// Allowed keys per table, by dotted path.
const TABLE_KEYS: &[(&str, &[&str])] = &[
    ("core", &["url", "token", "reconnect"]),
    ("core.reconnect", &["enabled", "interval_ms", "max_attempts"]),
    ("platform", &[
        "url",
        "access_token",
        "reconnect_interval_ms",
        "action_timeout_ms",
    ]),
    ("bridge", &["enrich_replies"]),
];

fn known_keys(path: &str) -> Option<&'static [&'static str]> {
    if path.is_empty() {
        return Some(TOP_LEVEL_KEYS);
    }
    TABLE_KEYS
        .iter()
        .find(|(table, _)| *table == path)
        .map(|(_, keys)| *keys)
}

// ── Levenshtein distance ────────────────────────────────────────────────────

fn levenshtein(a: &str, b: &str) -> usize {
    let b_chars: Vec<char> = b.chars().collect();
    let mut prev: Vec<usize> = (0..=b_chars.len()).collect();
    let mut curr = vec![0; b_chars.len() + 1];

    for (i, ca) in a.chars().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b_chars.iter().enumerate() {
            let cost = usize::from(ca != *cb);
            curr[j + 1] = (prev[j] + cost).min(prev[j + 1] + 1).min(curr[j] + 1);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b_chars.len()]
}

/// Closest candidate within `max_distance` edits.
fn suggest<'a>(needle: &str, candidates: &[&'a str], max_distance: usize) -> Option<&'a str> {
    candidates
        .iter()
        .map(|&candidate| (candidate, levenshtein(needle, candidate)))
        .filter(|&(_, d)| d > 0 && d <= max_distance)
        .min_by_key(|&(_, d)| d)
        .map(|(candidate, _)| candidate)
}

// ── Core validation ─────────────────────────────────────────────────────────

/// Validate a config file at the given path, or the discovered one if
/// `path` is `None`.
#[must_use]
pub fn validate(path: Option<&Path>) -> ValidationResult {
    let Some(config_path) = path.map(Path::to_path_buf).or_else(find_config_file) else {
        return ValidationResult {
            diagnostics: vec![Diagnostic::new(
                Severity::Info,
                "file-ref",
                "",
                "no config file found; using defaults",
            )],
            config_path: None,
        };
    };

    let mut result = match std::fs::read_to_string(&config_path) {
        Ok(raw) => validate_str(&substitute_env(&raw), config_format(&config_path)),
        Err(e) => ValidationResult {
            diagnostics: vec![Diagnostic::new(
                Severity::Error,
                "syntax",
                "",
                format!("failed to read config file: {e}"),
            )],
            config_path: None,
        },
    };
    result.config_path = Some(config_path);
    result
}

/// Validate raw config text in the given format (`toml`, `yaml`, `yml`,
/// `json`) without touching the file system.
#[must_use]
pub fn validate_str(raw: &str, format: &str) -> ValidationResult {
    let mut diagnostics = Vec::new();

    let value = match parse_config_value(raw, format) {
        Ok(v) => v,
        Err(e) => {
            diagnostics.push(Diagnostic::new(
                Severity::Error,
                "syntax",
                "",
                format!("{format} syntax error: {e}"),
            ));
            return ValidationResult {
                diagnostics,
                config_path: None,
            };
        },
    };

    check_unknown_fields(&value, "", &mut diagnostics);

    match serde_json::from_value::<CorelinkConfig>(normalize_empty(value)) {
        Ok(config) => diagnostics.extend(validate_config(&config).diagnostics),
        Err(e) => diagnostics.push(Diagnostic::new(
            Severity::Error,
            "type-error",
            "",
            format!("type error: {e}"),
        )),
    }

    ValidationResult {
        diagnostics,
        config_path: None,
    }
}

/// An empty YAML document parses to null; treat it like an empty table.
fn normalize_empty(value: Value) -> Value {
    if value.is_null() {
        Value::Object(serde_json::Map::new())
    } else {
        value
    }
}

fn check_unknown_fields(value: &Value, prefix: &str, diagnostics: &mut Vec<Diagnostic>) {
    let (Value::Object(table), Some(known)) = (value, known_keys(prefix)) else {
        return;
    };
    for (key, child) in table {
        let path = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{prefix}.{key}")
        };
        if known.contains(&key.as_str()) {
            check_unknown_fields(child, &path, diagnostics);
            continue;
        }
        let level = if prefix.is_empty() {
            " at top level"
        } else {
            ""
        };
        let message = match suggest(key, known, 3) {
            Some(s) => format!("unknown field{level} (did you mean \"{s}\"?)"),
            None => format!("unknown field{level}"),
        };
        diagnostics.push(Diagnostic::new(
            Severity::Error,
            "unknown-field",
            path,
            message,
        ));
    }
}

/// Semantic checks on an already-parsed config.
#[must_use]
pub fn validate_config(config: &CorelinkConfig) -> ValidationResult {
    let mut diagnostics = Vec::new();

    check_ws_url(&config.core.url, "core.url", &mut diagnostics);
    check_ws_url(&config.platform.url, "platform.url", &mut diagnostics);

    let reconnect = &config.core.reconnect;
    if reconnect.enabled && reconnect.interval_ms == 0 {
        diagnostics.push(Diagnostic::new(
            Severity::Warning,
            "reconnect",
            "core.reconnect.interval_ms",
            "reconnect is enabled with a zero interval; a down engine will be retried in a tight loop",
        ));
    }
    if !reconnect.enabled && reconnect.max_attempts > 0 {
        diagnostics.push(Diagnostic::new(
            Severity::Info,
            "reconnect",
            "core.reconnect.max_attempts",
            "max_attempts has no effect while reconnect is disabled",
        ));
    }
    if config.platform.reconnect_interval_ms == 0 {
        diagnostics.push(Diagnostic::new(
            Severity::Warning,
            "reconnect",
            "platform.reconnect_interval_ms",
            "zero platform reconnect interval; a down platform will be retried in a tight loop",
        ));
    }
    if config.platform.action_timeout_ms == 0 {
        diagnostics.push(Diagnostic::new(
            Severity::Error,
            "type-error",
            "platform.action_timeout_ms",
            "action timeout must be greater than zero",
        ));
    }

    if !config.core.token.expose_secret().is_empty() && is_remote_cleartext(&config.core.url) {
        diagnostics.push(Diagnostic::new(
            Severity::Warning,
            "security",
            "core.token",
            "token is sent in cleartext over ws:// to a non-loopback host",
        ));
    }

    ValidationResult {
        diagnostics,
        config_path: None,
    }
}

fn check_ws_url(raw: &str, path: &str, diagnostics: &mut Vec<Diagnostic>) {
    if raw.trim().is_empty() {
        diagnostics.push(Diagnostic::new(Severity::Error, "url", path, "URL is empty"));
        return;
    }
    match url::Url::parse(raw) {
        Ok(url) if matches!(url.scheme(), "ws" | "wss") => {},
        Ok(url) => diagnostics.push(Diagnostic::new(
            Severity::Error,
            "url",
            path,
            format!("unsupported scheme \"{}\" (expected ws or wss)", url.scheme()),
        )),
        Err(e) => diagnostics.push(Diagnostic::new(
            Severity::Error,
            "url",
            path,
            format!("invalid URL: {e}"),
        )),
    }
}

fn is_remote_cleartext(raw: &str) -> bool {
    let Ok(url) = url::Url::parse(raw) else {
        return false;
    };
    let loopback = match url.host() {
        Some(url::Host::Domain(host)) => host == "localhost",
        Some(url::Host::Ipv4(ip)) => ip.is_loopback(),
        Some(url::Host::Ipv6(ip)) => ip.is_loopback(),
        None => true,
    };
    url.scheme() == "ws" && !loopback
}
