//! Core Protocol wire definitions.
//!
//! The remote automation engine speaks JSON envelopes over a single
//! WebSocket. Frame types:
//! - `MessageReceive`: bridge → engine, one per platform message
//! - `MessageSend`: engine → bridge, content to deliver on the platform
//!
//! Both directions carry a sequence of `ContentItem` (`{ "type", "data" }`).

use serde::{Deserialize, Deserializer, Serialize};

// ── Constants ────────────────────────────────────────────────────────────────

/// Platform identity reported in every upstream envelope.
pub const BOT_ID: &str = "onebot";
/// Routing suffix appended to the engine URL (`/ws/<BRIDGE_ID>`).
pub const BRIDGE_ID: &str = "corelink";
/// Path segment that marks an engine URL as already routed.
pub const WS_PATH_SEGMENT: &str = "/ws/";
/// Query parameter carrying the engine access token.
pub const TOKEN_QUERY_KEY: &str = "token";

// ── Permission levels ────────────────────────────────────────────────────────

pub mod permission {
    pub const OWNER: i64 = 2;
    pub const ADMIN: i64 = 3;
    pub const MEMBER: i64 = 6;
}

// ── Content kinds ────────────────────────────────────────────────────────────

pub mod kinds {
    pub const TEXT: &str = "text";
    pub const IMAGE: &str = "image";
    pub const AT: &str = "at";
    pub const REPLY: &str = "reply";
    pub const RECORD: &str = "record";
    pub const FILE: &str = "file";
    pub const NODE: &str = "node";
    pub const MARKDOWN: &str = "markdown";
    pub const IMAGE_SIZE: &str = "image_size";
    pub const BUTTONS: &str = "buttons";
    pub const TEMPLATE_BUTTONS: &str = "template_buttons";
    pub const TEMPLATE_MARKDOWN: &str = "template_markdown";
    pub const GROUP: &str = "group";
    /// Prefix of diagnostic kinds (`log_info`, `log_error`, ...).
    pub const LOG_PREFIX: &str = "log_";
}

// ── Target types ─────────────────────────────────────────────────────────────

pub mod target_types {
    pub const DIRECT: &str = "direct";
    pub const GROUP: &str = "group";
    pub const CHANNEL: &str = "channel";
    pub const SUB_CHANNEL: &str = "sub_channel";
}

// ── Content items ────────────────────────────────────────────────────────────

/// One unit of message content, `{ "type": ..., "data": ... }` on the wire.
///
/// `data` stays a raw JSON value: most kinds carry a string, `node` carries
/// an array of nested items, and the engine may send shapes this bridge does
/// not understand. Interpretation happens in the codec.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentItem {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub data: serde_json::Value,
}

impl ContentItem {
    pub fn new(kind: impl Into<String>, data: impl Into<serde_json::Value>) -> Self {
        Self {
            kind: kind.into(),
            data: data.into(),
        }
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self::new(kinds::TEXT, text.into())
    }

    pub fn image(source: impl Into<String>) -> Self {
        Self::new(kinds::IMAGE, source.into())
    }

    pub fn at(target: impl Into<String>) -> Self {
        Self::new(kinds::AT, target.into())
    }

    pub fn reply(message_id: impl Into<String>) -> Self {
        Self::new(kinds::REPLY, message_id.into())
    }

    pub fn record(source: impl Into<String>) -> Self {
        Self::new(kinds::RECORD, source.into())
    }

    /// File items are encoded as `"<name>|<url>"`.
    pub fn file(name: &str, url: &str) -> Self {
        Self::new(kinds::FILE, format!("{name}|{url}"))
    }

    pub fn node(items: Vec<ContentItem>) -> Self {
        let data = items
            .into_iter()
            .map(|item| serde_json::json!({ "type": item.kind, "data": item.data }))
            .collect::<Vec<_>>();
        Self::new(kinds::NODE, data)
    }

    /// Read one item from an arbitrary JSON value.
    ///
    /// Never fails: a non-string `type` or a non-object entry yields an
    /// item with an empty kind, which downstream code skips.
    pub fn from_value(value: &serde_json::Value) -> Self {
        let Some(entry) = value.as_object() else {
            return Self::new("", serde_json::Value::Null);
        };
        let kind = entry
            .get("type")
            .and_then(serde_json::Value::as_str)
            .unwrap_or_default();
        let data = entry.get("data").cloned().unwrap_or_default();
        Self::new(kind, data)
    }

    /// The payload as a string slice, if it is one.
    pub fn as_str(&self) -> Option<&str> {
        self.data.as_str()
    }

    pub fn content_kind(&self) -> ContentKind<'_> {
        ContentKind::parse(&self.kind)
    }
}

/// Interpreted view of `ContentItem::kind`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentKind<'a> {
    Text,
    Image,
    At,
    Reply,
    Record,
    File,
    Node,
    Markdown,
    /// Engine-side kinds with no platform representation.
    Unsupported,
    /// `log_<level>` diagnostic item; carries the level suffix.
    Log(&'a str),
    /// Missing or empty `type`.
    Empty,
    Other(&'a str),
}

impl<'a> ContentKind<'a> {
    pub fn parse(kind: &'a str) -> Self {
        match kind {
            "" => Self::Empty,
            kinds::TEXT => Self::Text,
            kinds::IMAGE => Self::Image,
            kinds::AT => Self::At,
            kinds::REPLY => Self::Reply,
            kinds::RECORD => Self::Record,
            kinds::FILE => Self::File,
            kinds::NODE => Self::Node,
            kinds::MARKDOWN => Self::Markdown,
            kinds::IMAGE_SIZE
            | kinds::BUTTONS
            | kinds::TEMPLATE_BUTTONS
            | kinds::TEMPLATE_MARKDOWN
            | kinds::GROUP => Self::Unsupported,
            other => match other.strip_prefix(kinds::LOG_PREFIX) {
                Some(level) => Self::Log(level),
                None => Self::Other(other),
            },
        }
    }
}

// ── Envelopes ────────────────────────────────────────────────────────────────

/// Conversation type of an upstream message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserType {
    Group,
    Direct,
}

/// Bridge → engine: one received platform message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageReceive {
    pub bot_id: String,
    pub bot_self_id: String,
    pub msg_id: String,
    pub user_type: UserType,
    pub group_id: Option<String>,
    pub user_id: String,
    pub sender: serde_json::Map<String, serde_json::Value>,
    pub user_pm: i64,
    pub content: Vec<ContentItem>,
}

impl MessageReceive {
    /// Serialize to the UTF-8 JSON bytes sent as one binary frame.
    pub fn to_bytes(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec(self)
    }
}

/// Engine → bridge: content to deliver on the platform.
///
/// Identifier fields accept strings or numbers; everything is optional on
/// the wire so that a partially-formed frame still parses and can be
/// rejected with a precise log line downstream.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MessageSend {
    #[serde(default, deserialize_with = "lenient_id")]
    pub bot_id: String,
    #[serde(default, deserialize_with = "lenient_id")]
    pub bot_self_id: String,
    #[serde(default, deserialize_with = "lenient_id")]
    pub msg_id: String,
    #[serde(default, deserialize_with = "lenient_opt_id")]
    pub target_type: Option<String>,
    #[serde(default, deserialize_with = "lenient_opt_id")]
    pub target_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_content")]
    pub content: Option<Vec<ContentItem>>,
}

impl MessageSend {
    /// Parse a frame payload (text or binary, both UTF-8 JSON).
    pub fn from_slice(bytes: &[u8]) -> serde_json::Result<Self> {
        serde_json::from_slice(bytes)
    }

    /// Content items, treating a null list as empty.
    pub fn items(&self) -> &[ContentItem] {
        self.content.as_deref().unwrap_or_default()
    }
}

fn lenient_opt_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| id_to_string(&v)))
}

/// Content list parsed item by item, so one malformed entry cannot reject
/// the whole frame. A non-array `content` reads as absent.
fn lenient_content<'de, D>(deserializer: D) -> Result<Option<Vec<ContentItem>>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value
        .as_ref()
        .and_then(serde_json::Value::as_array)
        .map(|entries| entries.iter().map(ContentItem::from_value).collect()))
}

fn lenient_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    lenient_opt_id(deserializer).map(Option::unwrap_or_default)
}

/// Stringify an identifier that may arrive as a JSON string or number.
pub fn id_to_string(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
