use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error("platform not connected")]
    NotConnected,

    #[error("action {action} timed out after {timeout_ms}ms")]
    Timeout { action: String, timeout_ms: u64 },

    #[error("action {action} failed (retcode {retcode}): {message}")]
    ActionFailed {
        action: String,
        retcode: i64,
        message: String,
    },

    #[error("{message}")]
    Message { message: String },
}

impl Error {
    #[must_use]
    pub fn message(message: impl Into<String>) -> Self {
        Self::Message {
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

impl From<Error> for corelink_platform::Error {
    fn from(err: Error) -> Self {
        match err {
            Error::NotConnected => Self::unavailable("OneBot connection is down"),
            Error::ActionFailed {
                action, message, ..
            } => Self::rejected(action, message),
            Error::Json(e) => Self::SerdeJson(e),
            other => Self::external("onebot", other),
        }
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_into_platform_errors() {
        assert!(matches!(
            corelink_platform::Error::from(Error::NotConnected),
            corelink_platform::Error::Unavailable { .. }
        ));
        assert!(matches!(
            corelink_platform::Error::from(Error::ActionFailed {
                action: "send_group_msg".into(),
                retcode: 100,
                message: "no such group".into(),
            }),
            corelink_platform::Error::Rejected { action, .. } if action == "send_group_msg"
        ));
        assert!(matches!(
            corelink_platform::Error::from(Error::Timeout {
                action: "get_msg".into(),
                timeout_ms: 10,
            }),
            corelink_platform::Error::External { .. }
        ));
    }
}
