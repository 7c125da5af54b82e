//! Diagnostic envelopes: the engine sends `log_<level>` items to surface
//! its own log lines on the bridge side.

use {
    corelink_protocol::{ContentItem, ContentKind},
    serde_json::Value,
    tracing::{debug, error, info, warn},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteLogLevel {
    Info,
    Warn,
    Error,
    Success,
    Debug,
}

impl RemoteLogLevel {
    fn from_suffix(suffix: &str) -> Self {
        match suffix {
            "info" => Self::Info,
            "warning" => Self::Warn,
            "error" => Self::Error,
            "success" => Self::Success,
            _ => Self::Debug,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteLog {
    pub level: RemoteLogLevel,
    pub message: String,
}

impl RemoteLog {
    /// Write the line through `tracing` under the `corelink::remote` target.
    pub fn emit(&self) {
        let message = self.message.as_str();
        match self.level {
            RemoteLogLevel::Info => info!(target: "corelink::remote", "{message}"),
            RemoteLogLevel::Success => {
                info!(target: "corelink::remote", success = true, "{message}")
            },
            RemoteLogLevel::Warn => warn!(target: "corelink::remote", "{message}"),
            RemoteLogLevel::Error => error!(target: "corelink::remote", "{message}"),
            RemoteLogLevel::Debug => debug!(target: "corelink::remote", "{message}"),
        }
    }
}

/// `Some` when the envelope is diagnostic, decided by its first item only.
pub fn remote_log(items: &[ContentItem]) -> Option<RemoteLog> {
    let first = items.first()?;
    let ContentKind::Log(suffix) = first.content_kind() else {
        return None;
    };
    let message = match &first.data {
        Value::String(text) => text.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    };
    Some(RemoteLog {
        level: RemoteLogLevel::from_suffix(suffix),
        message,
    })
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {super::*, rstest::rstest, serde_json::json};

    #[rstest]
    #[case("log_info", RemoteLogLevel::Info)]
    #[case("log_warning", RemoteLogLevel::Warn)]
    #[case("log_error", RemoteLogLevel::Error)]
    #[case("log_success", RemoteLogLevel::Success)]
    #[case("log_trace", RemoteLogLevel::Debug)]
    #[case("log_", RemoteLogLevel::Debug)]
    fn level_from_kind(#[case] kind: &str, #[case] level: RemoteLogLevel) {
        let log = remote_log(&[ContentItem::new(kind, "boom")]).unwrap();
        assert_eq!(log.level, level);
        assert_eq!(log.message, "boom");
    }

    #[test]
    fn only_first_item_decides() {
        let items = vec![ContentItem::text("hi"), ContentItem::new("log_error", "x")];
        assert!(remote_log(&items).is_none());
        assert!(remote_log(&[]).is_none());
    }

    #[test]
    fn structured_payload_is_stringified() {
        let log = remote_log(&[ContentItem::new("log_info", json!({"a": 1}))]).unwrap();
        assert_eq!(log.message, r#"{"a":1}"#);
        log.emit();
    }
}
