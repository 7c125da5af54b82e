use std::time::Duration;

use {
    corelink_config::{CoreConfig, ReconnectConfig},
    secrecy::{ExposeSecret, Secret},
    url::Url,
};

use crate::{endpoint::derive_socket_url, error::Result};

/// Fixed-interval reconnect policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconnectPolicy {
    pub enabled: bool,
    pub interval_ms: u64,
    /// 0 retries forever.
    pub max_attempts: u32,
}

impl ReconnectPolicy {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    /// Whether `attempts` reconnects have used up the budget.
    pub fn exhausted(&self, attempts: u32) -> bool {
        self.max_attempts > 0 && attempts >= self.max_attempts
    }
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self::from(&ReconnectConfig::default())
    }
}

impl From<&ReconnectConfig> for ReconnectPolicy {
    fn from(cfg: &ReconnectConfig) -> Self {
        Self {
            enabled: cfg.enabled,
            interval_ms: cfg.interval_ms,
            max_attempts: cfg.max_attempts,
        }
    }
}

/// Connection parameters snapshot handed to `connect`.
#[derive(Clone)]
pub struct ConnectionConfig {
    pub url: String,
    pub token: Secret<String>,
    pub reconnect: ReconnectPolicy,
}

impl ConnectionConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            token: Secret::new(String::new()),
            reconnect: ReconnectPolicy::default(),
        }
    }

    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Secret::new(token.into());
        self
    }

    #[must_use]
    pub fn with_reconnect(mut self, reconnect: ReconnectPolicy) -> Self {
        self.reconnect = reconnect;
        self
    }

    /// The socket URL these parameters resolve to.
    pub fn endpoint(&self) -> Result<Url> {
        derive_socket_url(&self.url, self.token.expose_secret())
    }
}

impl std::fmt::Debug for ConnectionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionConfig")
            .field("url", &self.url)
            .field("token", &"[REDACTED]")
            .field("reconnect", &self.reconnect)
            .finish()
    }
}

impl From<&CoreConfig> for ConnectionConfig {
    fn from(cfg: &CoreConfig) -> Self {
        Self {
            url: cfg.url.clone(),
            token: cfg.token.clone(),
            reconnect: ReconnectPolicy::from(&cfg.reconnect),
        }
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {super::*, rstest::rstest};

    #[rstest]
    #[case(0, 0, false)]
    #[case(0, 1000, false)]
    #[case(3, 2, false)]
    #[case(3, 3, true)]
    #[case(3, 4, true)]
    fn exhaustion(#[case] max_attempts: u32, #[case] attempts: u32, #[case] expected: bool) {
        let policy = ReconnectPolicy {
            enabled: true,
            interval_ms: 10,
            max_attempts,
        };
        assert_eq!(policy.exhausted(attempts), expected);
    }

    #[test]
    fn from_core_config() {
        let mut core = CoreConfig::default();
        core.token = Secret::new("tok".into());
        core.reconnect.max_attempts = 7;
        let cfg = ConnectionConfig::from(&core);
        assert_eq!(cfg.reconnect.max_attempts, 7);
        assert_eq!(
            cfg.endpoint().unwrap().as_str(),
            "ws://127.0.0.1:8765/ws/corelink?token=tok"
        );
    }

    #[test]
    fn debug_redacts_token() {
        let cfg = ConnectionConfig::new("ws://h").with_token("hidden");
        assert!(!format!("{cfg:?}").contains("hidden"));
    }
}
