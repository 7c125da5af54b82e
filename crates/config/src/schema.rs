//! Config schema: the remote engine connection, the OneBot platform
//! connection, and bridge behaviour.

use {
    secrecy::{ExposeSecret, Secret},
    serde::{Deserialize, Serialize},
};

const REDACTED: &str = "[REDACTED]";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CorelinkConfig {
    pub core: CoreConfig,
    pub platform: PlatformConfig,
    pub bridge: BridgeConfig,
}

impl CorelinkConfig {
    /// Copy with every non-empty secret replaced by a placeholder, safe to
    /// print.
    #[must_use]
    pub fn redacted(&self) -> Self {
        let mut copy = self.clone();
        copy.core.token = redact(&copy.core.token);
        copy.platform.access_token = redact(&copy.platform.access_token);
        copy
    }
}

/// Remote automation engine connection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CoreConfig {
    /// Engine WebSocket URL. `/ws/corelink` is appended when the path has
    /// no `/ws/` segment.
    pub url: String,
    /// Sent as the `token` query parameter; empty disables it.
    #[serde(serialize_with = "serialize_secret")]
    pub token: Secret<String>,
    pub reconnect: ReconnectConfig,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            url: "ws://127.0.0.1:8765".into(),
            token: empty_secret(),
            reconnect: ReconnectConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconnectConfig {
    pub enabled: bool,
    pub interval_ms: u64,
    /// 0 retries forever.
    pub max_attempts: u32,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_ms: 5000,
            max_attempts: 0,
        }
    }
}

/// OneBot v11 forward WebSocket.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlatformConfig {
    pub url: String,
    /// Sent as `Authorization: Bearer <token>`; empty disables it.
    #[serde(serialize_with = "serialize_secret")]
    pub access_token: Secret<String>,
    pub reconnect_interval_ms: u64,
    /// How long an action call waits for its echo-matched response.
    pub action_timeout_ms: u64,
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self {
            url: "ws://127.0.0.1:3001".into(),
            access_token: empty_secret(),
            reconnect_interval_ms: 5000,
            action_timeout_ms: 10_000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Look up quoted messages and forward their images.
    pub enrich_replies: bool,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            enrich_replies: true,
        }
    }
}

fn empty_secret() -> Secret<String> {
    Secret::new(String::new())
}

fn redact(secret: &Secret<String>) -> Secret<String> {
    if secret.expose_secret().is_empty() {
        empty_secret()
    } else {
        Secret::new(REDACTED.into())
    }
}

// ── Serde helpers for Secret<String> ────────────────────────────────────────

fn serialize_secret<S: serde::Serializer>(
    secret: &Secret<String>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(secret.expose_secret())
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_yields_defaults() {
        let cfg: CorelinkConfig = toml::from_str("").unwrap();
        assert_eq!(cfg.core.url, "ws://127.0.0.1:8765");
        assert_eq!(cfg.core.reconnect, ReconnectConfig::default());
        assert!(cfg.core.token.expose_secret().is_empty());
        assert_eq!(cfg.platform.action_timeout_ms, 10_000);
        assert!(cfg.bridge.enrich_replies);
    }

    #[test]
    fn partial_sections_keep_defaults() {
        let cfg: CorelinkConfig = toml::from_str(
            r#"
            [core]
            token = "s3cret"
            [core.reconnect]
            max_attempts = 3
            "#,
        )
        .unwrap();
        assert_eq!(cfg.core.token.expose_secret(), "s3cret");
        assert_eq!(cfg.core.reconnect.max_attempts, 3);
        assert_eq!(cfg.core.reconnect.interval_ms, 5000);
        assert!(cfg.core.reconnect.enabled);
    }

    #[test]
    fn debug_does_not_leak_tokens() {
        let mut cfg = CorelinkConfig::default();
        cfg.core.token = Secret::new("s3cret".into());
        let dbg = format!("{cfg:?}");
        assert!(!dbg.contains("s3cret"));
    }

    #[test]
    fn redacted_masks_only_non_empty_secrets() {
        let mut cfg = CorelinkConfig::default();
        cfg.core.token = Secret::new("s3cret".into());
        let shown = toml::to_string_pretty(&cfg.redacted()).unwrap();
        assert!(shown.contains(REDACTED));
        assert!(!shown.contains("s3cret"));
        assert!(shown.contains("access_token = \"\""));
    }
}
