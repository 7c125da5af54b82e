use {
    serde::{Deserialize, Deserializer, Serialize},
    serde_json::{Map, Value},
};

use crate::Segment;

/// Platform identifier, normalized to a string.
///
/// OneBot implementations emit ids as integers, some forks as strings; the
/// Core Protocol wants strings everywhere.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct PlatformId(pub String);

impl PlatformId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for PlatformId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PlatformId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl<'de> Deserialize<'de> for PlatformId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match Value::deserialize(deserializer)? {
            Value::String(s) => Ok(Self(s)),
            Value::Number(n) => Ok(Self(n.to_string())),
            other => Err(serde::de::Error::custom(format!(
                "expected string or number id, got {other}"
            ))),
        }
    }
}

/// Conversation type of a message event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageType {
    Private,
    Group,
    #[serde(other)]
    Other,
}

/// Sender role inside a group.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Role {
    Owner,
    Admin,
    #[default]
    Member,
}

impl Role {
    pub fn parse(role: &str) -> Self {
        match role {
            "owner" => Self::Owner,
            "admin" => Self::Admin,
            _ => Self::Member,
        }
    }
}

/// Sender attributes as reported by the platform (`nickname`, `card`,
/// `role`, ...). Forwarded upstream verbatim.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Sender {
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

impl Sender {
    pub fn role(&self) -> Role {
        self.attributes
            .get("role")
            .and_then(Value::as_str)
            .map(Role::parse)
            .unwrap_or_default()
    }

    pub fn nickname(&self) -> Option<&str> {
        self.attributes.get("nickname").and_then(Value::as_str)
    }
}

/// Message content: structured segments, or a CQ-code string when the
/// platform runs with `message_format = "string"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageBody {
    Segments(Vec<Segment>),
    Text(String),
}

impl Default for MessageBody {
    fn default() -> Self {
        Self::Segments(Vec::new())
    }
}

impl MessageBody {
    /// Structured segments; empty for the string form.
    pub fn segments(&self) -> &[Segment] {
        match self {
            Self::Segments(segments) => segments,
            Self::Text(_) => &[],
        }
    }
}

/// An inbound `post_type = "message"` event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageEvent {
    pub message_type: MessageType,
    #[serde(default)]
    pub sub_type: Option<String>,
    pub message_id: PlatformId,
    pub user_id: PlatformId,
    #[serde(default)]
    pub group_id: Option<PlatformId>,
    pub self_id: PlatformId,
    #[serde(default)]
    pub raw_message: String,
    #[serde(default)]
    pub message: MessageBody,
    #[serde(default)]
    pub sender: Sender,
}

impl MessageEvent {
    pub fn is_group(&self) -> bool {
        self.message_type == MessageType::Group
    }

    /// Plain-text fallback: `raw_message`, else the string-form body.
    pub fn raw_text(&self) -> &str {
        if !self.raw_message.is_empty() {
            return &self.raw_message;
        }
        match &self.message {
            MessageBody::Text(text) => text,
            MessageBody::Segments(_) => "",
        }
    }
}

/// A stored message returned by a lookup (`get_msg`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MessageRecord {
    #[serde(default)]
    pub message_id: Option<PlatformId>,
    #[serde(default)]
    pub message: MessageBody,
    #[serde(default)]
    pub sender: Sender,
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {super::*, rstest::rstest, serde_json::json};

    #[test]
    fn parses_group_event_with_numeric_ids() {
        let event: MessageEvent = serde_json::from_value(json!({
            "post_type": "message",
            "message_type": "group",
            "sub_type": "normal",
            "message_id": 1234,
            "user_id": 42,
            "group_id": 900,
            "self_id": 10001,
            "raw_message": "hello",
            "message": [{ "type": "text", "data": { "text": "hello" } }],
            "sender": { "user_id": 42, "nickname": "alice", "role": "admin" },
        }))
        .unwrap();

        assert!(event.is_group());
        assert_eq!(event.message_id.as_str(), "1234");
        assert_eq!(event.group_id, Some(PlatformId::from("900")));
        assert_eq!(event.sender.role(), Role::Admin);
        assert_eq!(event.sender.nickname(), Some("alice"));
        assert_eq!(event.message.segments().len(), 1);
    }

    #[test]
    fn string_body_has_no_segments() {
        let event: MessageEvent = serde_json::from_value(json!({
            "message_type": "private",
            "message_id": "m1",
            "user_id": "u1",
            "self_id": "s1",
            "message": "plain [CQ:face,id=1]",
        }))
        .unwrap();

        assert!(event.message.segments().is_empty());
        assert_eq!(event.raw_text(), "plain [CQ:face,id=1]");
    }

    #[test]
    fn unknown_message_type_is_other() {
        let event: MessageEvent = serde_json::from_value(json!({
            "message_type": "guild",
            "message_id": 1,
            "user_id": 2,
            "self_id": 3,
        }))
        .unwrap();
        assert_eq!(event.message_type, MessageType::Other);
    }

    #[test]
    fn rejects_object_id() {
        let res = serde_json::from_value::<PlatformId>(json!({ "id": 1 }));
        assert!(res.is_err());
    }

    #[rstest]
    #[case("owner", Role::Owner)]
    #[case("admin", Role::Admin)]
    #[case("member", Role::Member)]
    #[case("", Role::Member)]
    fn role_parse(#[case] raw: &str, #[case] expected: Role) {
        assert_eq!(Role::parse(raw), expected);
    }
}
