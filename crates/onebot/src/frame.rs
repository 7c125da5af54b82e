//! OneBot v11 frame shapes.

use {
    corelink_platform::MessageEvent,
    serde::{Deserialize, Serialize},
    serde_json::Value,
};

use crate::error::Result;

/// Outgoing action call.
#[derive(Debug, Clone, Serialize)]
pub struct ActionRequest<'a> {
    pub action: &'a str,
    pub params: Value,
    pub echo: String,
}

/// Reply to an action call, matched by `echo`.
#[derive(Debug, Clone, Deserialize)]
pub struct ActionResponse {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub retcode: i64,
    #[serde(default)]
    pub data: Value,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub wording: Option<String>,
    #[serde(default)]
    pub echo: Option<Value>,
}

impl ActionResponse {
    pub fn is_ok(&self) -> bool {
        self.status == "ok" || (self.status.is_empty() && self.retcode == 0)
    }

    /// Echo as a string, whatever JSON type the implementation used.
    pub fn echo_key(&self) -> Option<String> {
        match self.echo.as_ref()? {
            Value::String(s) => Some(s.clone()),
            Value::Null => None,
            other => Some(other.to_string()),
        }
    }

    pub fn error_message(&self) -> String {
        self.wording
            .as_deref()
            .or(self.message.as_deref())
            .filter(|m| !m.is_empty())
            .unwrap_or(self.status.as_str())
            .to_string()
    }
}

/// A classified inbound frame.
#[derive(Debug)]
pub enum Inbound {
    Response(ActionResponse),
    Message(Box<MessageEvent>),
    /// Meta events, notices, requests: not bridged.
    Other { post_type: String },
}

/// Classify a raw inbound frame.
pub fn classify(bytes: &[u8]) -> Result<Inbound> {
    let value: Value = serde_json::from_slice(bytes)?;
    if let Some(post_type) = value.get("post_type").and_then(Value::as_str) {
        if post_type == "message" {
            let event: MessageEvent = serde_json::from_value(value)?;
            return Ok(Inbound::Message(Box::new(event)));
        }
        return Ok(Inbound::Other {
            post_type: post_type.to_string(),
        });
    }
    Ok(Inbound::Response(serde_json::from_value(value)?))
}

/// OneBot implementations expect integer ids; keep anything non-numeric as
/// a string.
pub fn numeric_id(id: &str) -> Value {
    id.parse::<i64>().map_or_else(|_| Value::from(id), Value::from)
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {super::*, rstest::rstest, serde_json::json};

    #[rstest]
    #[case("12345", json!(12345))]
    #[case("-7", json!(-7))]
    #[case("abc", json!("abc"))]
    #[case("99999999999999999999", json!("99999999999999999999"))]
    fn numeric_ids(#[case] id: &str, #[case] expected: Value) {
        assert_eq!(numeric_id(id), expected);
    }

    #[test]
    fn classifies_message_event() {
        let raw = json!({
            "post_type": "message",
            "message_type": "private",
            "message_id": 1,
            "user_id": 2,
            "self_id": 3,
            "message": [{ "type": "text", "data": { "text": "hi" } }],
        });
        let Inbound::Message(event) = classify(raw.to_string().as_bytes()).unwrap() else {
            panic!("expected message");
        };
        assert_eq!(event.user_id.as_str(), "2");
    }

    #[rstest]
    #[case("meta_event")]
    #[case("notice")]
    #[case("request")]
    fn other_post_types_are_not_bridged(#[case] post_type: &str) {
        let raw = json!({ "post_type": post_type, "time": 1 });
        assert!(matches!(
            classify(raw.to_string().as_bytes()).unwrap(),
            Inbound::Other { post_type: p } if p == post_type
        ));
    }

    #[test]
    fn classifies_response_with_numeric_echo() {
        let raw = br#"{"status":"ok","retcode":0,"data":{"message_id":5},"echo":17}"#;
        let Inbound::Response(resp) = classify(raw).unwrap() else {
            panic!("expected response");
        };
        assert!(resp.is_ok());
        assert_eq!(resp.echo_key().as_deref(), Some("17"));
        assert_eq!(resp.data["message_id"], 5);
    }

    #[test]
    fn failed_response_message_prefers_wording() {
        let raw = br#"{"status":"failed","retcode":100,"message":"ERR","wording":"group not found","echo":"e"}"#;
        let Inbound::Response(resp) = classify(raw).unwrap() else {
            panic!("expected response");
        };
        assert!(!resp.is_ok());
        assert_eq!(resp.error_message(), "group not found");
    }

    #[test]
    fn malformed_message_event_is_error() {
        let raw = br#"{"post_type":"message","message_type":"group"}"#;
        assert!(classify(raw).is_err());
        assert!(classify(b"[1,2").is_err());
    }
}
